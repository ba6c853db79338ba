/// Game session controller: one run through the caves.
///
/// A session owns the lives counter, the current cave index and the
/// unlock high-water mark. Each cave plays to an outcome; `resolve`
/// maps that outcome to the next transition. Lives are a per-session
/// resource, never refilled on advance.

use crate::config::Difficulty;
use crate::domain::element::Element;
use crate::sim::cave::CaveSet;
use crate::sim::event::GameEvent;
use crate::sim::world::{CaveOutcome, CaveWorld};

/// Lives at session start. The count is checked before it is burned,
/// so four lives allow five attempts.
pub const STARTING_LIVES: u8 = 4;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mode {
    Normal,
    Training,
}

/// How a session ends.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Ending {
    /// Every normal cave cleared.
    Success,
    /// Death with no lives left.
    GameOver,
    /// Left by choice (the training cave always ends this way).
    Quit,
}

/// What to do after a cave reaches its outcome.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CaveTransition {
    /// Same cave again; a life has been burned.
    Reload,
    /// The next cave; the index has already advanced.
    Next,
    Finished(Ending),
}

pub struct Session {
    pub mode: Mode,
    pub cave: usize,
    pub lives: u8,
    /// Highest cave index ever unlocked; the menu may start there.
    pub max_reached: usize,
    pub difficulty: Difficulty,
}

impl Session {
    pub fn normal(starting_cave: usize, max_reached: usize, difficulty: Difficulty) -> Session {
        Session {
            mode: Mode::Normal,
            cave: starting_cave,
            lives: STARTING_LIVES,
            max_reached,
            difficulty,
        }
    }

    pub fn training(caves: &CaveSet, difficulty: Difficulty) -> Session {
        Session {
            mode: Mode::Training,
            cave: caves.training_index(),
            lives: STARTING_LIVES,
            max_reached: 0,
            difficulty,
        }
    }

    /// Decode the current cave into a fresh world.
    pub fn load(&self, caves: &CaveSet) -> CaveWorld {
        crate::sim::cave::decode(caves.record(self.cave), self.difficulty.profile())
    }

    /// Map a finished cave to the session's next move.
    pub fn resolve(&mut self, outcome: CaveOutcome, caves: &CaveSet) -> CaveTransition {
        match outcome {
            CaveOutcome::Quit => CaveTransition::Finished(Ending::Quit),
            CaveOutcome::AllPicked => {
                if self.mode == Mode::Training {
                    return CaveTransition::Finished(Ending::Quit);
                }
                self.cave += 1;
                if self.cave == caves.normal_count() {
                    return CaveTransition::Finished(Ending::Success);
                }
                if self.cave > self.max_reached {
                    self.max_reached = self.cave;
                }
                CaveTransition::Next
            }
            CaveOutcome::Death => {
                if self.lives == 0 {
                    CaveTransition::Finished(Ending::GameOver)
                } else {
                    self.lives -= 1;
                    CaveTransition::Reload
                }
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Death presentation
// ══════════════════════════════════════════════════════════════

/// Drop a dead miner through blank cells until something stops him,
/// one event per row so the front-end can animate the settle. Only a
/// miner who died mid-fall settles; the grid's bottom border stops
/// the walk at the last row.
pub fn settle_dead_miner(world: &mut CaveWorld) -> Vec<GameEvent> {
    let mut events = Vec::new();
    if !world.miner.fall.falling {
        return events;
    }
    while world.at(world.miner.x, world.miner.y + 1) == Element::Blank {
        world.miner.y += 1;
        events.push(GameEvent::MinerMoved {
            x: world.miner.x,
            y: world.miner.y,
        });
    }
    events
}

/// The blinking skull shown where the miner died, in display order.
/// Display-only; the grid keeps its real cell underneath.
pub const SKULL_BLINK: [Element; 3] = [Element::Skull, Element::SkullWink, Element::Skull];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::miner::Miner;
    use crate::sim::world::{HEIGHT, WIDTH};

    fn caves() -> CaveSet {
        CaveSet::builtin()
    }

    #[test]
    fn a_fresh_session_starts_with_four_lives() {
        let s = Session::normal(0, 0, Difficulty::Normal);
        assert_eq!(s.lives, STARTING_LIVES);
        assert_eq!(s.cave, 0);
        assert_eq!(s.mode, Mode::Normal);
    }

    #[test]
    fn death_burns_a_life_and_reloads_the_same_cave() {
        let caves = caves();
        let mut s = Session::normal(2, 2, Difficulty::Normal);
        for expected in (0..STARTING_LIVES).rev() {
            assert_eq!(s.resolve(CaveOutcome::Death, &caves), CaveTransition::Reload);
            assert_eq!(s.lives, expected);
            assert_eq!(s.cave, 2, "death never moves the cave index");
        }
        // Out of lives: the check comes before the burn.
        assert_eq!(
            s.resolve(CaveOutcome::Death, &caves),
            CaveTransition::Finished(Ending::GameOver)
        );
        assert_eq!(s.lives, 0);
    }

    #[test]
    fn clearing_a_cave_advances_and_raises_the_high_water() {
        let caves = caves();
        let mut s = Session::normal(0, 0, Difficulty::Normal);
        assert_eq!(s.resolve(CaveOutcome::AllPicked, &caves), CaveTransition::Next);
        assert_eq!(s.cave, 1);
        assert_eq!(s.max_reached, 1);

        // Replaying an early cave never lowers the mark.
        let mut s = Session::normal(0, 3, Difficulty::Normal);
        assert_eq!(s.resolve(CaveOutcome::AllPicked, &caves), CaveTransition::Next);
        assert_eq!(s.max_reached, 3);
    }

    #[test]
    fn clearing_the_last_cave_wins_the_session() {
        let caves = caves();
        let last = caves.normal_count() - 1;
        let mut s = Session::normal(last, last, Difficulty::Normal);
        assert_eq!(
            s.resolve(CaveOutcome::AllPicked, &caves),
            CaveTransition::Finished(Ending::Success)
        );
    }

    #[test]
    fn training_plays_the_training_cave_and_clears_back_to_the_menu() {
        let caves = caves();
        let mut s = Session::training(&caves, Difficulty::Slow);
        assert_eq!(s.cave, caves.training_index());

        let world = s.load(&caves);
        assert!(world.diamonds_total > 0);

        assert_eq!(
            s.resolve(CaveOutcome::AllPicked, &caves),
            CaveTransition::Finished(Ending::Quit)
        );
    }

    #[test]
    fn quitting_ends_the_session_immediately() {
        let caves = caves();
        let mut s = Session::normal(1, 1, Difficulty::Normal);
        s.lives = 2;
        assert_eq!(
            s.resolve(CaveOutcome::Quit, &caves),
            CaveTransition::Finished(Ending::Quit)
        );
        assert_eq!(s.lives, 2, "quit burns nothing");
    }

    #[test]
    fn a_dead_falling_miner_settles_through_blank_cells() {
        let mut w = CaveWorld::new(Difficulty::Normal.profile());
        for x in 0..WIDTH {
            w.cells[12][x] = Element::Rock;
        }
        w.miner = Miner::new(4, 8);
        w.miner.fall.falling = true;
        w.flag_death();

        let events = settle_dead_miner(&mut w);
        assert_eq!(w.miner.y, 11, "rests on the rock shelf");
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], GameEvent::MinerMoved { x: 4, y: 9 }));
        assert!(matches!(events[2], GameEvent::MinerMoved { x: 4, y: 11 }));
    }

    #[test]
    fn settle_stops_at_the_bottom_row_and_skips_non_fallers() {
        // Blank all the way down: the border stops the walk.
        let mut w = CaveWorld::new(Difficulty::Normal.profile());
        w.miner = Miner::new(7, 18);
        w.miner.fall.falling = true;
        w.flag_death();
        settle_dead_miner(&mut w);
        assert_eq!(w.miner.y, HEIGHT - 1);

        // A miner who died standing does not move.
        let mut w = CaveWorld::new(Difficulty::Normal.profile());
        w.miner = Miner::new(7, 18);
        w.flag_death();
        let events = settle_dead_miner(&mut w);
        assert!(events.is_empty());
        assert_eq!(w.miner.y, 18);
    }

    #[test]
    fn the_skull_winks_mid_blink() {
        assert_eq!(SKULL_BLINK[0], Element::Skull);
        assert_eq!(SKULL_BLINK[1], Element::SkullWink);
        assert_eq!(SKULL_BLINK[2], Element::Skull);
    }
}
