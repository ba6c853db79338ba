/// The step function: runs one simulation pass when the frame advances.
///
/// Pass order:
///   1. Command latch (always, even between frames)
///   2. Frame gate, one pass per distinct frame value
///   3. Pause gate
///   4. Control-repeat countdown tick
///   5. Jump choreography service (owns the whole pass while active)
///   6. Command intake (quit / suicide / pause)
///   7. Probe snapshot (miner cell + cell below)
///   8. Gravity
///   9. Floor erosion below the miner
///  10. Unstable rock below the miner
///  11. Control dispatch
///
/// The probe snapshot is taken once and shared by gravity, erosion and
/// the jump-launch checks, so a cell changed mid-pass is not re-read
/// until the next pass.

use crate::domain::controls::{AxisPos, Command, ControlFrame, Dir};
use crate::domain::element::Element;
use crate::domain::miner::Look;
use crate::sim::event::GameEvent;
use crate::sim::moves::{
    check_death, fall_down, jump_up, kill, move_down, move_left, move_right, move_up,
};
use crate::sim::world::{CaveWorld, MAX_FALL_ROWS};

/// Ticks between the scripted beats of a jump choreography.
pub const SEQ_STEP_TICKS: u8 = 5;

/// Upward rows in a high jump.
const HIGH_JUMP_POWER: u8 = 3;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum JumpDir {
    Left,
    Right,
}

/// A jump choreography in flight. While one is active it owns every
/// pass; gravity, erosion and command intake all wait until it resolves.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sequence {
    /// The arc jump: a second row up, then three sideways steps, one
    /// beat apart.
    Long { dir: JumpDir, step: u8, delay: u8 },
    /// The straight jump: remaining rows fire when the steering window
    /// between them runs out.
    High { window_left: u8, nudge_used: bool },
}

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut CaveWorld, frame: u64, controls: ControlFrame) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();
    if !world.stay {
        return events;
    }

    // Latch commands before the frame gate so a press between frames
    // is never lost; the next normal pass consumes it.
    if controls.command != Command::None {
        world.pending = controls.command;
    }

    if world.last_frame == Some(frame) {
        return events;
    }
    world.last_frame = Some(frame);

    if world.paused {
        if world.pending == Command::Pause {
            world.pending = Command::None;
            world.paused = false;
            events.push(GameEvent::Paused(false));
        }
        return events;
    }

    // The countdown ticks once per pass, jump passes included.
    if world.mv_delay > 0 {
        world.mv_delay -= 1;
    }

    if world.seq.is_some() {
        service_sequence(world, controls, &mut events);
        return events;
    }

    if resolve_command(world, &mut events) {
        return events;
    }

    let probe_miner = world.at(world.miner.x, world.miner.y);
    let probe_below = world.below_miner();

    if resolve_gravity(world, probe_miner, probe_below, &mut events) {
        return events;
    }
    resolve_decay(world, probe_below, &mut events);
    resolve_unstable(world, probe_below, &mut events);
    resolve_controls(world, controls, probe_below, &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Commands
// ══════════════════════════════════════════════════════════════

/// Consume the latched command, if any. Returns true when the command
/// took the pass.
fn resolve_command(world: &mut CaveWorld, events: &mut Vec<GameEvent>) -> bool {
    let pending = world.pending;
    world.pending = Command::None;
    match pending {
        Command::None => false,
        Command::Quit => {
            world.quit = true;
            world.stay = false;
            events.push(GameEvent::MinerHidden);
            true
        }
        Command::Suicide => {
            kill(world, events);
            true
        }
        Command::Pause => {
            world.paused = true;
            events.push(GameEvent::Paused(true));
            true
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Gravity
// ══════════════════════════════════════════════════════════════

/// The miner is airborne when the cell below is passable and neither
/// his own cell nor the one below is a ladder. Returns true when a
/// too-long fall ended the cave this pass.
fn resolve_gravity(
    world: &mut CaveWorld,
    probe_miner: Element,
    probe_below: Element,
    events: &mut Vec<GameEvent>,
) -> bool {
    let airborne = probe_below.is_passable()
        && probe_miner != Element::Ladder
        && probe_below != Element::Ladder;

    if airborne {
        world.fall_ticks += 1;
        if world.fall_ticks == world.speed.fall_speed {
            fall_down(world, events);
            world.fall_length += 1;
            check_death(world, events);
            world.fall_ticks = 0;
            if world.fall_length > MAX_FALL_ROWS {
                kill(world, events);
                return true;
            }
        }
        world.miner.fall.falling = true;
        world.miner.land_lock = 0;
    } else {
        // Landing. A fall that steered both ways arms the lock that
        // swallows the next two held-direction samples.
        if world.miner.fall.dual_nudge() {
            world.miner.land_lock = 2;
        }
        world.fall_ticks = 0;
        world.fall_length = 0;
        world.miner.fall.clear();
    }
    false
}

// ══════════════════════════════════════════════════════════════
// Floor erosion
// ══════════════════════════════════════════════════════════════

fn resolve_decay(world: &mut CaveWorld, probe_below: Element, events: &mut Vec<GameEvent>) {
    if !probe_below.is_decaying() {
        return;
    }
    let (x, by) = (world.miner.x, world.miner.y + 1);
    world.decay[by][x] += 1;
    if world.decay[by][x] == world.speed.decay_speed {
        world.decay[by][x] = 0;
        let next = world.at(x, by).decayed();
        world.set(x, by, next, events);
    }
}

fn resolve_unstable(world: &mut CaveWorld, probe_below: Element, events: &mut Vec<GameEvent>) {
    if probe_below == Element::Unstable {
        let (x, by) = (world.miner.x, world.miner.y + 1);
        world.set(x, by, Element::Blank, events);
    }
}

// ══════════════════════════════════════════════════════════════
// Controls
// ══════════════════════════════════════════════════════════════

fn resolve_controls(
    world: &mut CaveWorld,
    controls: ControlFrame,
    probe_below: Element,
    events: &mut Vec<GameEvent>,
) {
    if world.mv_delay != 0 {
        return;
    }
    match controls.direction() {
        Dir::Right | Dir::UpRight => {
            resolve_side(world, JumpDir::Right, controls.trigger, probe_below, events)
        }
        Dir::Left | Dir::UpLeft => {
            resolve_side(world, JumpDir::Left, controls.trigger, probe_below, events)
        }
        Dir::Down => {
            move_down(world, events);
            check_death(world, events);
        }
        Dir::Up => {
            if controls.trigger {
                if !probe_below.blocks_jump() {
                    start_high_jump(world, events);
                }
            } else {
                move_up(world, events);
                check_death(world, events);
            }
        }
        Dir::Center | Dir::DownLeft | Dir::DownRight => {
            world.miner.land_lock = 0;
        }
    }
}

/// Held left/right: an arc jump with the trigger and solid footing, a
/// single steering nudge while falling, otherwise a plain step (or a
/// swallowed sample while the land lock holds).
fn resolve_side(
    world: &mut CaveWorld,
    dir: JumpDir,
    trigger: bool,
    probe_below: Element,
    events: &mut Vec<GameEvent>,
) {
    if trigger && !probe_below.blocks_jump() {
        start_long_jump(world, dir, events);
        return;
    }
    if world.miner.fall.falling {
        let nudged = match dir {
            JumpDir::Left => world.miner.fall.nudged_left,
            JumpDir::Right => world.miner.fall.nudged_right,
        };
        if !nudged && side_move(world, dir, events) {
            match dir {
                JumpDir::Left => world.miner.fall.nudged_left = true,
                JumpDir::Right => world.miner.fall.nudged_right = true,
            }
        }
    } else if world.miner.land_lock == 0 {
        side_move(world, dir, events);
    } else {
        world.miner.land_lock -= 1;
        world.mv_delay = world.speed.control_delay;
    }
    check_death(world, events);
}

fn side_move(world: &mut CaveWorld, dir: JumpDir, events: &mut Vec<GameEvent>) -> bool {
    match dir {
        JumpDir::Left => move_left(world, events),
        JumpDir::Right => move_right(world, events),
    }
}

// ══════════════════════════════════════════════════════════════
// Jump choreographies
// ══════════════════════════════════════════════════════════════

fn start_long_jump(world: &mut CaveWorld, dir: JumpDir, events: &mut Vec<GameEvent>) {
    events.push(GameEvent::Jumped);
    set_look(world, Look::Jumping, events);
    world.fall_length = 0;
    // First row fires on the spot; a blocked or fatal row ends the
    // jump before it schedules.
    if jump_up(world, events).stops_sequence() {
        finish_sequence(world, events);
        return;
    }
    world.seq = Some(Sequence::Long {
        dir,
        step: 0,
        delay: SEQ_STEP_TICKS,
    });
}

fn start_high_jump(world: &mut CaveWorld, events: &mut Vec<GameEvent>) {
    events.push(GameEvent::Jumped);
    set_look(world, Look::Jumping, events);
    world.fall_length = 0;
    world.mv_delay = 0;
    world.miner.jump_power = HIGH_JUMP_POWER;
    if jump_up(world, events).stops_sequence() {
        finish_sequence(world, events);
        return;
    }
    world.miner.jump_power -= 1;
    world.seq = Some(Sequence::High {
        window_left: world.speed.hijump_window_a,
        nudge_used: false,
    });
}

/// Advance the active choreography by one pass.
fn service_sequence(world: &mut CaveWorld, controls: ControlFrame, events: &mut Vec<GameEvent>) {
    match world.seq {
        Some(Sequence::Long { dir, step, delay }) => {
            let delay = delay - 1;
            if delay > 0 {
                world.seq = Some(Sequence::Long { dir, step, delay });
                return;
            }
            // Beat. Steps 1..=3 are sideways; a blocked side step is
            // quietly skipped, a blocked rise ends the jump.
            if step == 0 {
                if jump_up(world, events).stops_sequence() {
                    finish_sequence(world, events);
                    return;
                }
            } else if step <= 3 {
                side_move(world, dir, events);
            } else {
                finish_sequence(world, events);
                return;
            }
            world.seq = Some(Sequence::Long {
                dir,
                step: step + 1,
                delay: SEQ_STEP_TICKS,
            });
        }
        Some(Sequence::High { window_left, nudge_used }) => {
            let mut nudge_used = nudge_used;
            // One sideways nudge for the whole jump, sampled whenever
            // the countdown is open.
            if world.mv_delay == 0 && !nudge_used {
                let nudged = match controls.horizontal {
                    AxisPos::Negative => side_move(world, JumpDir::Left, events),
                    AxisPos::Positive => side_move(world, JumpDir::Right, events),
                    AxisPos::Center => false,
                };
                if nudged {
                    nudge_used = true;
                }
            }
            let window_left = window_left - 1;
            if window_left > 0 {
                world.seq = Some(Sequence::High { window_left, nudge_used });
                return;
            }
            if world.miner.jump_power == 0 {
                finish_sequence(world, events);
                return;
            }
            if jump_up(world, events).stops_sequence() {
                finish_sequence(world, events);
                return;
            }
            world.miner.jump_power -= 1;
            // The steering window after the last row is the long one.
            let span = if world.miner.jump_power == 0 {
                world.speed.hijump_window_b
            } else {
                world.speed.hijump_window_a
            };
            world.seq = Some(Sequence::High {
                window_left: span,
                nudge_used,
            });
        }
        None => {}
    }
}

/// Common tail for a finished or aborted jump: drop the sequence, run
/// the landing probe, put the normal face back on.
fn finish_sequence(world: &mut CaveWorld, events: &mut Vec<GameEvent>) {
    world.seq = None;
    world.miner.jump_power = 0;
    check_death(world, events);
    set_look(world, Look::Normal, events);
}

fn set_look(world: &mut CaveWorld, look: Look, events: &mut Vec<GameEvent>) {
    if world.miner.look != look {
        world.miner.look = look;
        events.push(GameEvent::LookChanged(look));
    }
}
