/// Cave element types and their rule attributes.
/// Attributes are queried via methods, not stored as flags,
/// so element semantics are centralized here.

/// Visual facets a diamond cycles through (rendering variety only).
pub const DIAMOND_FACETS: u8 = 3;

/// Decay stages of breakable rock; the last stage crumbles to blank.
pub const BROKEN_STAGES: u8 = 8;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Element {
    Blank,
    Rock,         // Full solid block
    RockNw,       // Corner blocks, solid
    RockNe,
    RockSw,
    RockSe,
    Unstable,     // Destroyed the moment the miner stands above it
    Ladder,       // Climbable
    SpikesUp,     // Kills on downward contact from above
    SpikesDown,   // Kills on upward contact from below
    Diamond(u8),  // Pickup target; facet 0..DIAMOND_FACETS
    Broken(u8),   // Breakable rock; stage 0..BROKEN_STAGES
    Skull,        // Death presentation only, never stored in the grid
    SkullWink,
}

impl Element {
    /// Can the miner occupy this cell?
    pub fn is_passable(self) -> bool {
        matches!(self, Element::Blank | Element::Ladder | Element::Diamond(_))
    }

    /// Does standing above this cell forbid jumping?
    /// (Queried on the cell below the miner: no jumping off thin air
    /// or off a diamond; anything solid, the ladder included, is a
    /// valid launch point.)
    pub fn blocks_jump(self) -> bool {
        matches!(self, Element::Blank | Element::Diamond(_))
    }

    /// Does this cell erode while the miner stands on it?
    pub fn is_decaying(self) -> bool {
        matches!(self, Element::Broken(_))
    }

    /// Is this a collectible diamond (any facet)?
    pub fn is_diamond(self) -> bool {
        matches!(self, Element::Diamond(_))
    }

    /// The element one decay step further along. Meaningful only for
    /// decaying cells; everything else is returned unchanged.
    pub fn decayed(self) -> Element {
        match self {
            Element::Broken(stage) if stage + 1 < BROKEN_STAGES => Element::Broken(stage + 1),
            Element::Broken(_) => Element::Blank,
            other => other,
        }
    }
}

impl Default for Element {
    fn default() -> Self {
        Element::Blank
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passable_is_blank_ladder_and_diamonds() {
        assert!(Element::Blank.is_passable());
        assert!(Element::Ladder.is_passable());
        for facet in 0..DIAMOND_FACETS {
            assert!(Element::Diamond(facet).is_passable());
        }
        for e in [
            Element::Rock,
            Element::RockNw,
            Element::RockNe,
            Element::RockSw,
            Element::RockSe,
            Element::Unstable,
            Element::SpikesUp,
            Element::SpikesDown,
            Element::Broken(0),
            Element::Skull,
            Element::SkullWink,
        ] {
            assert!(!e.is_passable(), "{e:?} must not be passable");
        }
    }

    #[test]
    fn jump_is_blocked_over_air_and_diamonds_only() {
        assert!(Element::Blank.blocks_jump());
        assert!(Element::Diamond(2).blocks_jump());
        // Ladder, traps, unstable and broken rock are all launch points.
        for e in [
            Element::Rock,
            Element::Ladder,
            Element::SpikesUp,
            Element::SpikesDown,
            Element::Unstable,
            Element::Broken(5),
        ] {
            assert!(!e.blocks_jump(), "{e:?} must allow jumping");
        }
    }

    #[test]
    fn broken_rock_decays_through_all_stages_then_blanks() {
        let mut e = Element::Broken(0);
        for stage in 1..BROKEN_STAGES {
            e = e.decayed();
            assert_eq!(e, Element::Broken(stage));
        }
        assert_eq!(e.decayed(), Element::Blank);
    }

    #[test]
    fn only_broken_rock_decays() {
        assert!(Element::Broken(7).is_decaying());
        assert!(!Element::Unstable.is_decaying());
        assert!(!Element::Rock.is_decaying());
        assert_eq!(Element::Ladder.decayed(), Element::Ladder);
    }
}
