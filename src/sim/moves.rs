/// Primitive miner moves and probes.
///
/// Conventions shared by all of them:
///   - A move happens only into a passable cell; everything else is a
///     silent no-op, never an error.
///   - Every successful walk step (left, right, down, ladder up) lands
///     on `check_treasure` and re-arms the control-repeat countdown.
///   - A fall row also collects treasure but leaves the countdown
///     alone, so steering stays responsive mid-air.
///   - Death is latched through `kill`, which emits the `Died` event
///     exactly once per cave.

use crate::domain::element::Element;
use crate::sim::event::GameEvent;
use crate::sim::world::CaveWorld;

/// What one upward jump row did.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum JumpOutcome {
    Moved,
    Blocked,
    Death,
}

impl JumpOutcome {
    /// Anything but a clean row ends the jump choreography.
    pub fn stops_sequence(self) -> bool {
        !matches!(self, JumpOutcome::Moved)
    }
}

/// Latch death and end the cave. Safe to call from several probes in
/// one pass; only the first emits the event.
pub fn kill(world: &mut CaveWorld, events: &mut Vec<GameEvent>) {
    if !world.death {
        world.flag_death();
        events.push(GameEvent::Died);
    }
}

pub fn move_left(world: &mut CaveWorld, events: &mut Vec<GameEvent>) -> bool {
    let (x, y) = (world.miner.x, world.miner.y);
    if x == 0 || !world.at(x - 1, y).is_passable() {
        return false;
    }
    world.miner.x = x - 1;
    events.push(GameEvent::MinerMoved { x: x - 1, y });
    check_treasure(world, events);
    world.mv_delay = world.speed.control_delay;
    true
}

pub fn move_right(world: &mut CaveWorld, events: &mut Vec<GameEvent>) -> bool {
    let (x, y) = (world.miner.x, world.miner.y);
    if !world.at(x + 1, y).is_passable() {
        return false;
    }
    world.miner.x = x + 1;
    events.push(GameEvent::MinerMoved { x: x + 1, y });
    check_treasure(world, events);
    world.mv_delay = world.speed.control_delay;
    true
}

/// Step down into a passable cell, effectively ladder descent: anywhere
/// else a passable cell below means gravity already owns the miner.
pub fn move_down(world: &mut CaveWorld, events: &mut Vec<GameEvent>) {
    let (x, y) = (world.miner.x, world.miner.y);
    if !world.at(x, y + 1).is_passable() {
        return;
    }
    world.miner.y = y + 1;
    events.push(GameEvent::MinerMoved { x, y: y + 1 });
    check_treasure(world, events);
    world.mv_delay = world.speed.control_delay;
}

/// One row of gravity. Same motion as `move_down` minus the countdown.
pub fn fall_down(world: &mut CaveWorld, events: &mut Vec<GameEvent>) {
    let (x, y) = (world.miner.x, world.miner.y);
    if !world.at(x, y + 1).is_passable() {
        return;
    }
    world.miner.y = y + 1;
    events.push(GameEvent::MinerMoved { x, y: y + 1 });
    check_treasure(world, events);
}

/// Climb one row. Only works from a ladder cell; climbing into ceiling
/// spikes kills instead of moving.
pub fn move_up(world: &mut CaveWorld, events: &mut Vec<GameEvent>) {
    let (x, y) = (world.miner.x, world.miner.y);
    if y == 0 || world.at(x, y) != Element::Ladder {
        return;
    }
    let above = world.at(x, y - 1);
    if above == Element::SpikesDown {
        kill(world, events);
        return;
    }
    if !above.is_passable() {
        return;
    }
    world.miner.y = y - 1;
    events.push(GameEvent::MinerMoved { x, y: y - 1 });
    check_treasure(world, events);
    world.mv_delay = world.speed.control_delay;
}

/// One upward jump row. Ceiling spikes kill; any other solid cell (or
/// the top row) blocks. A clean row moves and collects.
pub fn jump_up(world: &mut CaveWorld, events: &mut Vec<GameEvent>) -> JumpOutcome {
    let (x, y) = (world.miner.x, world.miner.y);
    if y == 0 {
        return JumpOutcome::Blocked;
    }
    let above = world.at(x, y - 1);
    if above == Element::SpikesDown {
        kill(world, events);
        return JumpOutcome::Death;
    }
    if !above.is_passable() {
        return JumpOutcome::Blocked;
    }
    world.miner.y = y - 1;
    events.push(GameEvent::MinerMoved { x, y: y - 1 });
    check_treasure(world, events);
    JumpOutcome::Moved
}

/// Collect the diamond in the miner's cell, if any. Picking the last
/// one ends the cave in the same pass.
pub fn check_treasure(world: &mut CaveWorld, events: &mut Vec<GameEvent>) {
    let (x, y) = (world.miner.x, world.miner.y);
    if !world.at(x, y).is_diamond() {
        return;
    }
    world.set(x, y, Element::Blank, events);
    world.diamonds_collected += 1;
    events.push(GameEvent::DiamondPicked {
        collected: world.diamonds_collected,
        total: world.diamonds_total,
    });
    if world.diamonds_collected == world.diamonds_total {
        world.all_picked = true;
        world.stay = false;
        events.push(GameEvent::CaveCleared);
    }
}

/// The landing probe: floor spikes under the miner kill.
pub fn check_death(world: &mut CaveWorld, events: &mut Vec<GameEvent>) {
    if world.below_miner() == Element::SpikesUp {
        kill(world, events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Difficulty;
    use crate::domain::miner::Miner;
    use crate::sim::world::{HEIGHT, WIDTH};

    /// Empty world with a solid floor on the bottom row.
    fn world() -> CaveWorld {
        let mut w = CaveWorld::new(Difficulty::Normal.profile());
        for x in 0..WIDTH {
            w.cells[HEIGHT - 1][x] = Element::Rock;
        }
        w.miner = Miner::new(5, HEIGHT - 2);
        w
    }

    fn moved_events(events: &[GameEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, GameEvent::MinerMoved { .. }))
            .count()
    }

    #[test]
    fn walking_respects_solids_and_borders() {
        let mut w = world();
        let mut ev = Vec::new();

        w.cells[w.miner.y][6] = Element::Rock;
        assert!(!move_right(&mut w, &mut ev));
        assert_eq!(w.miner.x, 5);

        w.miner.x = 0;
        assert!(!move_left(&mut w, &mut ev));
        assert_eq!(w.miner.x, 0);

        w.miner.x = WIDTH - 1;
        assert!(!move_right(&mut w, &mut ev));
        assert_eq!(w.miner.x, WIDTH - 1);

        assert_eq!(moved_events(&ev), 0);
        assert_eq!(w.mv_delay, 0);
    }

    #[test]
    fn successful_step_arms_the_countdown_but_a_fall_row_does_not() {
        let mut w = world();
        let mut ev = Vec::new();

        assert!(move_right(&mut w, &mut ev));
        assert_eq!(w.mv_delay, w.speed.control_delay);

        w.mv_delay = 0;
        w.miner.y -= 3;
        fall_down(&mut w, &mut ev);
        assert_eq!(w.mv_delay, 0);
        assert_eq!(moved_events(&ev), 2);
    }

    #[test]
    fn walking_onto_a_diamond_collects_it() {
        let mut w = world();
        w.diamonds_total = 2;
        w.cells[w.miner.y][6] = Element::Diamond(1);
        let mut ev = Vec::new();

        assert!(move_right(&mut w, &mut ev));
        assert_eq!(w.at(6, w.miner.y), Element::Blank);
        assert_eq!(w.diamonds_collected, 1);
        assert!(w.stay, "one diamond left, cave still runs");
        assert!(ev
            .iter()
            .any(|e| matches!(e, GameEvent::DiamondPicked { collected: 1, total: 2 })));
    }

    #[test]
    fn picking_the_last_diamond_ends_the_cave_in_the_same_pass() {
        let mut w = world();
        w.diamonds_total = 1;
        w.cells[w.miner.y][4] = Element::Diamond(0);
        let mut ev = Vec::new();

        assert!(move_left(&mut w, &mut ev));
        assert!(w.all_picked);
        assert!(!w.stay);
        assert!(ev.iter().any(|e| matches!(e, GameEvent::CaveCleared)));
    }

    #[test]
    fn climbing_needs_a_ladder_underfoot() {
        let mut w = world();
        let mut ev = Vec::new();
        let y = w.miner.y;

        move_up(&mut w, &mut ev);
        assert_eq!(w.miner.y, y, "no ladder, no climb");

        w.cells[y][5] = Element::Ladder;
        move_up(&mut w, &mut ev);
        assert_eq!(w.miner.y, y - 1);
        assert_eq!(w.mv_delay, w.speed.control_delay);
    }

    #[test]
    fn climbing_into_ceiling_spikes_kills_without_moving() {
        let mut w = world();
        let y = w.miner.y;
        w.cells[y][5] = Element::Ladder;
        w.cells[y - 1][5] = Element::SpikesDown;
        let mut ev = Vec::new();

        move_up(&mut w, &mut ev);
        assert_eq!(w.miner.y, y);
        assert!(w.death);
        assert!(!w.stay);
        assert_eq!(
            ev.iter().filter(|e| matches!(e, GameEvent::Died)).count(),
            1
        );
    }

    #[test]
    fn jump_rows_report_moved_blocked_or_death() {
        let mut w = world();
        let y = w.miner.y;
        let mut ev = Vec::new();

        assert_eq!(jump_up(&mut w, &mut ev), JumpOutcome::Moved);
        assert_eq!(w.miner.y, y - 1);

        w.cells[w.miner.y - 1][5] = Element::Rock;
        assert_eq!(jump_up(&mut w, &mut ev), JumpOutcome::Blocked);
        assert_eq!(w.miner.y, y - 1);

        w.cells[w.miner.y - 1][5] = Element::SpikesDown;
        assert_eq!(jump_up(&mut w, &mut ev), JumpOutcome::Death);
        assert_eq!(w.miner.y, y - 1);
        assert!(w.death);

        assert!(JumpOutcome::Blocked.stops_sequence());
        assert!(JumpOutcome::Death.stops_sequence());
        assert!(!JumpOutcome::Moved.stops_sequence());
    }

    #[test]
    fn floor_spikes_kill_on_the_landing_probe_once() {
        let mut w = world();
        w.cells[w.miner.y + 1][5] = Element::SpikesUp;
        let mut ev = Vec::new();

        check_death(&mut w, &mut ev);
        check_death(&mut w, &mut ev);
        assert!(w.death);
        assert_eq!(
            ev.iter().filter(|e| matches!(e, GameEvent::Died)).count(),
            1
        );
    }

    #[test]
    fn top_row_jump_is_blocked_not_fatal() {
        let mut w = world();
        w.miner.y = 0;
        let mut ev = Vec::new();
        assert_eq!(jump_up(&mut w, &mut ev), JumpOutcome::Blocked);
        assert!(!w.death);
    }
}
