/// The miner: the single actor in a cave.
/// Only transient, per-cave physics state lives here; lives and cave
/// progress belong to the session.

/// Sprite face shown by the renderer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Look {
    Normal,
    Jumping,
}

/// Bookkeeping for the fall currently in progress.
/// Each horizontal direction may be used for one successful mid-air
/// nudge per fall; both reset when the miner lands.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct FallState {
    pub falling: bool,
    pub nudged_left: bool,
    pub nudged_right: bool,
}

impl FallState {
    /// Did this fall use both horizontal nudges?
    pub fn dual_nudge(self) -> bool {
        self.nudged_left && self.nudged_right
    }

    pub fn clear(&mut self) {
        *self = FallState::default();
    }
}

#[derive(Clone, Debug)]
pub struct Miner {
    pub x: usize,
    pub y: usize,
    pub look: Look,
    pub fall: FallState,
    /// Pending control samples to swallow after landing from a
    /// dual-nudge fall (consumed instead of a horizontal move).
    pub land_lock: u8,
    /// Remaining high-jump power units, 0 outside a high jump.
    pub jump_power: u8,
}

impl Miner {
    pub fn new(x: usize, y: usize) -> Self {
        Miner {
            x,
            y,
            look: Look::Normal,
            fall: FallState::default(),
            land_lock: 0,
            jump_power: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_miner_is_grounded_and_unlocked() {
        let m = Miner::new(3, 7);
        assert_eq!((m.x, m.y), (3, 7));
        assert_eq!(m.look, Look::Normal);
        assert!(!m.fall.falling);
        assert_eq!(m.land_lock, 0);
        assert_eq!(m.jump_power, 0);
    }

    #[test]
    fn dual_nudge_requires_both_directions() {
        let mut f = FallState { falling: true, nudged_left: true, nudged_right: false };
        assert!(!f.dual_nudge());
        f.nudged_right = true;
        assert!(f.dual_nudge());
        f.clear();
        assert!(!f.falling && !f.dual_nudge());
    }
}
