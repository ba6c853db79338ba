/// CaveWorld: the complete state of the cave in play.
///
/// Two parallel 20×22 layers:
///   - `cells`: the element grid, mutated only through `set()` so every
///     change reaches the renderer as a paint event.
///   - `decay`: per-cell erosion counters, zeroed on load. Only the cell
///     directly below the miner ever accumulates.
///
/// The scheduler's tick state (frame gate, control-repeat countdown, fall
/// bookkeeping, latched command, active jump sequence) lives here too, so
/// one context object travels through every pass.

use crate::config::SpeedProfile;
use crate::domain::controls::Command;
use crate::domain::element::Element;
use crate::domain::miner::Miner;
use crate::sim::event::GameEvent;
use crate::sim::step::Sequence;

pub const WIDTH: usize = 20;
pub const HEIGHT: usize = 22;

/// Longest survivable fall. The row counter is checked right after each
/// fallen row, so the fall turns fatal mid-air on row seven.
pub const MAX_FALL_ROWS: u8 = 6;

/// Why the cave loop ended, in precedence order.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CaveOutcome {
    Quit,
    AllPicked,
    Death,
}

pub struct CaveWorld {
    // ── Grid layers ──
    pub cells: [[Element; WIDTH]; HEIGHT],
    pub decay: [[u8; WIDTH]; HEIGHT],

    // ── Actor ──
    pub miner: Miner,

    // ── Cave counters ──
    pub diamonds_total: u8,
    pub diamonds_collected: u8,

    // ── Terminal flags ──
    pub stay: bool,
    pub death: bool,
    pub all_picked: bool,
    pub quit: bool,

    // ── Scheduler state ──
    pub speed: SpeedProfile,
    pub last_frame: Option<u64>,
    /// Control-repeat countdown; controls are sampled only at zero.
    pub mv_delay: u8,
    /// Ticks accumulated toward the next one-row fall.
    pub fall_ticks: u8,
    /// Rows fallen since the fall began.
    pub fall_length: u8,
    pub paused: bool,
    pub pending: Command,
    pub seq: Option<Sequence>,
}

impl CaveWorld {
    pub fn new(speed: SpeedProfile) -> Self {
        CaveWorld {
            cells: [[Element::Blank; WIDTH]; HEIGHT],
            decay: [[0; WIDTH]; HEIGHT],
            miner: Miner::new(0, 0),
            diamonds_total: 0,
            diamonds_collected: 0,
            stay: true,
            death: false,
            all_picked: false,
            quit: false,
            speed,
            last_frame: None,
            mv_delay: 0,
            fall_ticks: 0,
            fall_length: 0,
            paused: false,
            pending: Command::None,
            seq: None,
        }
    }

    /// Element at (x, y). Out of range reads answer full rock, so border
    /// probes are total and the bottom row never falls through.
    #[inline]
    pub fn at(&self, x: usize, y: usize) -> Element {
        if x < WIDTH && y < HEIGHT {
            self.cells[y][x]
        } else {
            Element::Rock
        }
    }

    /// Element below the miner (the most probed cell in the game).
    #[inline]
    pub fn below_miner(&self) -> Element {
        self.at(self.miner.x, self.miner.y + 1)
    }

    /// Mutate a cell and emit the paint for it. In-range only; the
    /// callers all probe first.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, elem: Element, events: &mut Vec<GameEvent>) {
        if x < WIDTH && y < HEIGHT {
            self.cells[y][x] = elem;
            events.push(GameEvent::Paint { x, y, elem });
        }
    }

    /// Latch death and end the cave loop. Idempotent.
    #[inline]
    pub fn flag_death(&mut self) {
        self.death = true;
        self.stay = false;
    }

    /// Outcome of the finished cave; `None` while the loop still runs.
    /// Quit wins over all-picked wins over death.
    pub fn outcome(&self) -> Option<CaveOutcome> {
        if self.stay {
            return None;
        }
        if self.quit {
            Some(CaveOutcome::Quit)
        } else if self.all_picked {
            Some(CaveOutcome::AllPicked)
        } else if self.death {
            Some(CaveOutcome::Death)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Difficulty;

    fn world() -> CaveWorld {
        CaveWorld::new(Difficulty::Normal.profile())
    }

    #[test]
    fn out_of_range_probes_answer_rock() {
        let w = world();
        assert_eq!(w.at(0, HEIGHT), Element::Rock);
        assert_eq!(w.at(WIDTH, 0), Element::Rock);
        assert_eq!(w.at(usize::MAX, usize::MAX), Element::Rock);
        assert_eq!(w.at(0, 0), Element::Blank);
    }

    #[test]
    fn below_miner_on_bottom_row_is_rock() {
        let mut w = world();
        w.miner.y = HEIGHT - 1;
        assert_eq!(w.below_miner(), Element::Rock);
    }

    #[test]
    fn set_paints_the_cell() {
        let mut w = world();
        let mut events = Vec::new();
        w.set(4, 9, Element::Ladder, &mut events);
        assert_eq!(w.at(4, 9), Element::Ladder);
        assert!(matches!(
            events.as_slice(),
            [GameEvent::Paint { x: 4, y: 9, elem: Element::Ladder }]
        ));
    }

    #[test]
    fn outcome_precedence_is_quit_allpicked_death() {
        let mut w = world();
        assert_eq!(w.outcome(), None);
        w.stay = false;
        w.death = true;
        assert_eq!(w.outcome(), Some(CaveOutcome::Death));
        w.all_picked = true;
        assert_eq!(w.outcome(), Some(CaveOutcome::AllPicked));
        w.quit = true;
        assert_eq!(w.outcome(), Some(CaveOutcome::Quit));
    }

    #[test]
    fn flag_death_is_idempotent() {
        let mut w = world();
        w.flag_death();
        let snap = (w.death, w.stay);
        w.flag_death();
        assert_eq!((w.death, w.stay), snap);
        assert_eq!(w.outcome(), Some(CaveOutcome::Death));
    }
}
