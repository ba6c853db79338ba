/// Cave data: the binary record format, its decoder, and the built-in
/// cave set.
///
/// ## Record format (222 bytes per cave):
///   byte 0     miner start row
///   byte 1     miner start column
///   bytes 2..  220 packed cell bytes: row-major, two cells per byte,
///              high nibble first (10 bytes per row, 22 rows)
///
/// ## Nibble codes:
///   0 blank          1 rock           2-5 corner rock NW/NE/SW/SE
///   6 unstable       7 ladder         8 spikes-up    9 spikes-down
///   10-12 diamond facets              13 broken rock, first stage
///   14 generic diamond (counted, facet cycled)
///   15 generic broken rock
///
/// ## Authoring legend:
///   ' ' blank   '#' rock   '1'..'4' corner NW/NE/SW/SE   'U' unstable
///   'H' ladder  '^' spikes up   'v' spikes down   '*' diamond
///   'x' broken rock   '@' miner start (cell decodes as blank)
///
/// Built-in caves are authored as diagrams, packed into genuine records
/// at startup and decoded through the same path the shipped data file
/// took on the original hardware, so the wire format stays exercised.

use crate::config::SpeedProfile;
use crate::domain::element::{Element, DIAMOND_FACETS};
use crate::domain::miner::Miner;
use crate::sim::world::{CaveWorld, HEIGHT, WIDTH};

/// 2 start bytes + 20*22 cells at two per byte.
pub const RECORD_LEN: usize = 2 + WIDTH * HEIGHT / 2;

pub type CaveRecord = [u8; RECORD_LEN];

const NIBBLE_DIAMOND: u8 = 14;
const NIBBLE_BROKEN: u8 = 15;

// ══════════════════════════════════════════════════════════════
// Decoding
// ══════════════════════════════════════════════════════════════

/// Decode one cave record into a fresh world: populated grid, zeroed
/// decay counters, miner at the start cell, diamonds counted.
pub fn decode(record: &CaveRecord, speed: SpeedProfile) -> CaveWorld {
    let start_y = record[0] as usize;
    let start_x = record[1] as usize;
    assert!(
        start_x < WIDTH && start_y < HEIGHT,
        "cave record start position ({start_x},{start_y}) out of range"
    );

    let mut world = CaveWorld::new(speed);
    world.miner = Miner::new(start_x, start_y);

    let mut diamonds: u8 = 0;
    for y in 0..HEIGHT {
        for pair in 0..WIDTH / 2 {
            let byte = record[2 + y * (WIDTH / 2) + pair];
            world.cells[y][pair * 2] = expand(byte >> 4, &mut diamonds);
            world.cells[y][pair * 2 + 1] = expand(byte & 0x0F, &mut diamonds);
        }
    }
    world.diamonds_total = diamonds;
    world
}

/// Expand one nibble. The generic diamond code picks the next facet in
/// raster order (first occurrence gets the first facet) and counts
/// toward the cave total; everything else maps straight through.
fn expand(code: u8, diamonds: &mut u8) -> Element {
    match code {
        0 => Element::Blank,
        1 => Element::Rock,
        2 => Element::RockNw,
        3 => Element::RockNe,
        4 => Element::RockSw,
        5 => Element::RockSe,
        6 => Element::Unstable,
        7 => Element::Ladder,
        8 => Element::SpikesUp,
        9 => Element::SpikesDown,
        10..=12 => Element::Diamond(code - 10),
        13 => Element::Broken(0),
        NIBBLE_DIAMOND => {
            let facet = *diamonds % DIAMOND_FACETS;
            *diamonds += 1;
            Element::Diamond(facet)
        }
        NIBBLE_BROKEN => Element::Broken(0),
        _ => Element::Blank,
    }
}

// ══════════════════════════════════════════════════════════════
// Packing (authoring diagrams → records)
// ══════════════════════════════════════════════════════════════

/// Pack a 22-row, 20-column diagram into a cave record. Malformed
/// diagrams are data bugs, so this fails fast.
pub fn pack(rows: &[&str]) -> CaveRecord {
    assert_eq!(rows.len(), HEIGHT, "cave diagram must have {HEIGHT} rows");

    let mut nibbles = [[0u8; WIDTH]; HEIGHT];
    let mut start: Option<(u8, u8)> = None;

    for (y, row) in rows.iter().enumerate() {
        assert_eq!(
            row.chars().count(),
            WIDTH,
            "cave diagram row {y} must have {WIDTH} cells"
        );
        for (x, ch) in row.chars().enumerate() {
            nibbles[y][x] = match ch {
                ' ' => 0,
                '#' => 1,
                '1' => 2,
                '2' => 3,
                '3' => 4,
                '4' => 5,
                'U' => 6,
                'H' => 7,
                '^' => 8,
                'v' => 9,
                '*' => NIBBLE_DIAMOND,
                'x' => NIBBLE_BROKEN,
                '@' => {
                    assert!(start.is_none(), "cave diagram has two start markers");
                    start = (y as u8, x as u8).into();
                    0
                }
                other => panic!("unknown cave legend char {other:?} at ({x},{y})"),
            };
        }
    }

    let (sy, sx) = match start {
        Some(pos) => pos,
        None => panic!("cave diagram has no start marker"),
    };

    let mut record = [0u8; RECORD_LEN];
    record[0] = sy;
    record[1] = sx;
    for y in 0..HEIGHT {
        for pair in 0..WIDTH / 2 {
            record[2 + y * (WIDTH / 2) + pair] =
                (nibbles[y][pair * 2] << 4) | nibbles[y][pair * 2 + 1];
        }
    }
    record
}

// ══════════════════════════════════════════════════════════════
// The built-in cave set
// ══════════════════════════════════════════════════════════════

/// The shipped caves: the last record is the training cave, everything
/// before it is the normal progression.
pub struct CaveSet {
    records: Vec<CaveRecord>,
}

impl CaveSet {
    pub fn builtin() -> Self {
        CaveSet {
            records: builtin_diagrams().iter().map(|rows| pack(rows)).collect(),
        }
    }

    /// Number of caves in the normal progression.
    pub fn normal_count(&self) -> usize {
        self.records.len() - 1
    }

    /// Index of the training cave (one past the last normal cave).
    pub fn training_index(&self) -> usize {
        self.normal_count()
    }

    /// Record for a cave index. An index outside the set is a caller
    /// bug, not a runtime condition.
    pub fn record(&self, index: usize) -> &CaveRecord {
        assert!(
            index < self.records.len(),
            "cave index {index} out of range (have {})",
            self.records.len()
        );
        &self.records[index]
    }
}

#[rustfmt::skip]
fn builtin_diagrams() -> Vec<&'static [&'static str]> {
    vec![
        // Cave 1: ladders and one crumbling bridge, no traps yet.
        &[
            "####################",
            "#                  #",
            "#                  #",
            "#                  #",
            "#  *               #",
            "######H########    #",
            "#     H            #",
            "#     H            #",
            "#     H   *        #",
            "#    #######xxx##H##",
            "#                H #",
            "#                H #",
            "#       *        H #",
            "###H###########    #",
            "#  H               #",
            "#  H               #",
            "#  H *             #",
            "###############H####",
            "#              H   #",
            "#              H   #",
            "# @            H  *#",
            "####################",
        ],
        // Cave 2: spike runs on the top floor, an unstable trapdoor in
        // the middle one.
        &[
            "####################",
            "#                  #",
            "#                  #",
            "#      *     *     #",
            "#                  #",
            "#                  #",
            "#*                *#",
            "####^^####^^####H###",
            "#               H  #",
            "#               H  #",
            "#               H  #",
            "# *             H  #",
            "#######UU#########H#",
            "#                 H#",
            "#      *          H#",
            "#                 H#",
            "#            *    H#",
            "####H#########^^####",
            "#   H              #",
            "#   H              #",
            "# @ H     *      * #",
            "####################",
        ],
        // Cave 3: crumbling ledges up top, a baited ladder with ceiling
        // spikes, a shaft with a rest shelf.
        &[
            "####################",
            "#                  #",
            "# *              * #",
            "#xxx#####H######xx##",
            "#        H         #",
            "#        H         #",
            "#        H         #",
            "#        H *       #",
            "##############v##H##",
            "#             H  H #",
            "#             H  H #",
            "#             H  H #",
            "#             H  H #",
            "######xxx###H#######",
            "#           H      #",
            "#           H      #",
            "#      *    H      #",
            "#    3###4  H      #",
            "#           H      #",
            "#           H      #",
            "#  * @      H   *  #",
            "####################",
        ],
        // Cave 4: high-jump pedestals, paired decoy ladders, deeper
        // drops.
        &[
            "####################",
            "#    *        *    #",
            "#   1#2     xxx    #",
            "#                  #",
            "#                  #",
            "#########H##########",
            "#        H         #",
            "#        H         #",
            "# *      H      *  #",
            "####v####H####v##H##",
            "#   H            H #",
            "#   H      *     H #",
            "#   H            H #",
            "#   H            H #",
            "#######UU######H####",
            "#              H   #",
            "#      *       H   #",
            "#     ####     H   #",
            "#              H   #",
            "#              H   #",
            "#  @      *    H  *#",
            "####################",
        ],
        // Cave 5: the long ladder spine, two six-row drop shafts, spikes
        // guarding the last stretch.
        &[
            "####################",
            "# *      H       * #",
            "####x####H####x#####",
            "#        H         #",
            "######U##H###x##   #",
            "#        H         #",
            "# *      H         #",
            "#        H      *  #",
            "#        H         #",
            "#        H  *      #",
            "#####H###H##########",
            "#    H             #",
            "#    H             #",
            "#    H   *         #",
            "#    H             #",
            "#    H             #",
            "#    H        *    #",
            "########H######^^###",
            "#       H          #",
            "#       H          #",
            "# @     H  *    *  #",
            "####################",
        ],
        // Training cave: every mechanic once, close to the ground.
        &[
            "####################",
            "#                  #",
            "#   *              #",
            "#         *        #",
            "#                  #",
            "# @              * #",
            "#########  ####H####",
            "#              H   #",
            "#              H   #",
            "#              H   #",
            "#              H   #",
            "##H##xx####v########",
            "# H        H       #",
            "# H        H       #",
            "# H        H       #",
            "# H        H *     #",
            "######U#^#########H#",
            "#                 H#",
            "#                 H#",
            "#     *           H#",
            "#                 H#",
            "####################",
        ],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Difficulty;
    use crate::sim::world::{HEIGHT, WIDTH};

    fn speed() -> SpeedProfile {
        Difficulty::Normal.profile()
    }

    /// A minimal bordered diagram for decoder tests.
    fn frame_with(mid_rows: &[&str]) -> Vec<String> {
        let mut rows = vec!["####################".to_string()];
        for r in mid_rows {
            rows.push(r.to_string());
        }
        while rows.len() < HEIGHT - 1 {
            rows.push("#                  #".to_string());
        }
        rows.push("####################".to_string());
        rows
    }

    fn pack_frame(mid_rows: &[&str]) -> CaveRecord {
        let rows = frame_with(mid_rows);
        let refs: Vec<&str> = rows.iter().map(|s| s.as_str()).collect();
        pack(&refs)
    }

    #[test]
    fn record_layout_is_start_then_packed_nibbles() {
        let rec = pack_frame(&["#@                 #"]);
        // Start row 1, column 1.
        assert_eq!(rec[0], 1);
        assert_eq!(rec[1], 1);
        assert_eq!(rec.len(), RECORD_LEN);
        // Row 0 is all rock: nibble 1 packed twice per byte.
        for byte in &rec[2..2 + WIDTH / 2] {
            assert_eq!(*byte, 0x11);
        }
    }

    #[test]
    fn high_nibble_is_the_even_column() {
        let rec = pack_frame(&["#H @               #"]);
        // Row 1, byte 0 holds columns 0 and 1: rock then ladder.
        let byte = rec[2 + WIDTH / 2];
        assert_eq!(byte >> 4, 1);
        assert_eq!(byte & 0x0F, 7);
        let world = decode(&rec, speed());
        assert_eq!(world.at(1, 1), Element::Ladder);
        assert_eq!(world.at(0, 1), Element::Rock);
    }

    #[test]
    fn diamonds_count_and_cycle_facets_in_raster_order() {
        let rec = pack_frame(&[
            "#@ * *             #",
            "#     *  *         #",
            "#  *               #",
        ]);
        let world = decode(&rec, speed());
        assert_eq!(world.diamonds_total, 5);
        // Raster order: (3,1), (5,1), (6,2), (9,2), (3,3).
        assert_eq!(world.at(3, 1), Element::Diamond(0));
        assert_eq!(world.at(5, 1), Element::Diamond(1));
        assert_eq!(world.at(6, 2), Element::Diamond(2));
        assert_eq!(world.at(9, 2), Element::Diamond(0));
        assert_eq!(world.at(3, 3), Element::Diamond(1));
    }

    #[test]
    fn broken_rock_decodes_to_first_stage_with_zero_counter() {
        let rec = pack_frame(&["#@x                #"]);
        let world = decode(&rec, speed());
        assert_eq!(world.at(2, 1), Element::Broken(0));
        for row in &world.decay {
            assert!(row.iter().all(|&c| c == 0));
        }
    }

    #[test]
    fn traps_corners_and_unstable_decode() {
        let rec = pack_frame(&["#@^v1234U          #"]);
        let world = decode(&rec, speed());
        assert_eq!(world.at(2, 1), Element::SpikesUp);
        assert_eq!(world.at(3, 1), Element::SpikesDown);
        assert_eq!(world.at(4, 1), Element::RockNw);
        assert_eq!(world.at(5, 1), Element::RockNe);
        assert_eq!(world.at(6, 1), Element::RockSw);
        assert_eq!(world.at(7, 1), Element::RockSe);
        assert_eq!(world.at(8, 1), Element::Unstable);
    }

    #[test]
    fn builtin_caves_are_well_formed() {
        let set = CaveSet::builtin();
        assert_eq!(set.normal_count(), 5);
        assert_eq!(set.training_index(), 5);
        for index in 0..=set.training_index() {
            let world = decode(set.record(index), speed());
            assert!(world.diamonds_total > 0, "cave {index} has no diamonds");
            let m = &world.miner;
            assert_eq!(world.at(m.x, m.y), Element::Blank, "cave {index} start not blank");
            // The start cell must be supported: standing on something
            // solid or on a ladder, never spawning mid-air.
            let below = world.at(m.x, m.y + 1);
            assert!(
                !below.is_passable() || below == Element::Ladder,
                "cave {index} start is unsupported"
            );
        }
    }

    #[test]
    #[should_panic(expected = "cave index")]
    fn out_of_range_cave_index_is_a_contract_violation() {
        let set = CaveSet::builtin();
        let _ = set.record(99);
    }

    #[test]
    #[should_panic(expected = "no start marker")]
    fn diagram_without_start_fails_fast() {
        let rows = frame_with(&[]);
        let refs: Vec<&str> = rows.iter().map(|s| s.as_str()).collect();
        let _ = pack(&refs);
    }
}
