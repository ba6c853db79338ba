/// Control-source contract: two analog axes, one trigger, one command
/// stream. Device specifics (keyboard, gamepad) live in `ui`; the
/// simulation only ever sees a classified `ControlFrame` per pass.

/// A third of full deflection, the classification threshold the
/// original analog stick used on both axes.
const AXIS_THRESHOLD: f32 = 1.0 / 3.0;

/// One axis classified into three bands. Negative is left/up.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum AxisPos {
    #[default]
    Center,
    Negative,
    Positive,
}

impl AxisPos {
    /// Classify a raw deflection in -1.0..=1.0.
    pub fn classify(value: f32) -> AxisPos {
        if value < -AXIS_THRESHOLD {
            AxisPos::Negative
        } else if value > AXIS_THRESHOLD {
            AxisPos::Positive
        } else {
            AxisPos::Center
        }
    }
}

/// Discrete out-of-band commands. Latched by the scheduler until a
/// normal pass consumes them.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Command {
    #[default]
    None,
    Quit,
    Suicide,
    Pause,
}

/// The 9 logical stick directions. Up-diagonals act as pure
/// left/right for movement purposes; down-diagonals act as center.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Dir {
    Center,
    Left,
    Right,
    Up,
    Down,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

/// Everything the scheduler reads from the controls in one pass.
#[derive(Clone, Copy, Debug, Default)]
pub struct ControlFrame {
    pub horizontal: AxisPos,
    pub vertical: AxisPos,
    pub trigger: bool,
    pub command: Command,
}

impl ControlFrame {
    pub fn neutral() -> Self {
        ControlFrame::default()
    }

    pub fn direction(&self) -> Dir {
        match (self.horizontal, self.vertical) {
            (AxisPos::Center, AxisPos::Center) => Dir::Center,
            (AxisPos::Negative, AxisPos::Center) => Dir::Left,
            (AxisPos::Positive, AxisPos::Center) => Dir::Right,
            (AxisPos::Center, AxisPos::Negative) => Dir::Up,
            (AxisPos::Center, AxisPos::Positive) => Dir::Down,
            (AxisPos::Negative, AxisPos::Negative) => Dir::UpLeft,
            (AxisPos::Positive, AxisPos::Negative) => Dir::UpRight,
            (AxisPos::Negative, AxisPos::Positive) => Dir::DownLeft,
            (AxisPos::Positive, AxisPos::Positive) => Dir::DownRight,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_bands_split_at_one_third() {
        assert_eq!(AxisPos::classify(0.0), AxisPos::Center);
        assert_eq!(AxisPos::classify(0.33), AxisPos::Center);
        assert_eq!(AxisPos::classify(-0.33), AxisPos::Center);
        assert_eq!(AxisPos::classify(0.4), AxisPos::Positive);
        assert_eq!(AxisPos::classify(-0.4), AxisPos::Negative);
        assert_eq!(AxisPos::classify(1.0), AxisPos::Positive);
        assert_eq!(AxisPos::classify(-1.0), AxisPos::Negative);
    }

    #[test]
    fn nine_directions_from_two_axes() {
        let mut f = ControlFrame::neutral();
        assert_eq!(f.direction(), Dir::Center);
        f.horizontal = AxisPos::Positive;
        assert_eq!(f.direction(), Dir::Right);
        f.vertical = AxisPos::Negative;
        assert_eq!(f.direction(), Dir::UpRight);
        f.horizontal = AxisPos::Center;
        assert_eq!(f.direction(), Dir::Up);
        f.horizontal = AxisPos::Negative;
        assert_eq!(f.direction(), Dir::UpLeft);
        f.vertical = AxisPos::Positive;
        assert_eq!(f.direction(), Dir::DownLeft);
    }
}
