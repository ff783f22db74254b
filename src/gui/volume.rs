use crate::encoder::types::Direction;

/// Volume in percent as driven by the rotary encoder. Turning past either end wraps around to
/// the other one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeKnob {
    percent: u8,
    step: u8,
}

impl VolumeKnob {
    pub fn new(percent: u8, step: u8) -> Self {
        VolumeKnob {
            percent: percent.min(100),
            step: step.clamp(1, 100),
        }
    }

    /// `level` in [0.0, 1.0], rounded to whole percents.
    pub fn from_level(level: f64, step: u8) -> Self {
        let percent = if level.is_nan() { 0.0 } else { (level * 100.0).round().clamp(0.0, 100.0) };
        VolumeKnob::new(percent as u8, step)
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn level(&self) -> f64 {
        self.percent as f64 / 100.0
    }

    pub fn set_percent(&mut self, percent: u8) {
        self.percent = percent.min(100);
    }

    /// Applies one detent and returns the new percentage.
    pub fn turn(&mut self, direction: Direction) -> u8 {
        self.percent = match direction {
            Direction::Clockwise if self.percent >= 100 => 0,
            Direction::Clockwise => (self.percent + self.step).min(100),
            Direction::CounterClockwise if self.percent == 0 => 100,
            Direction::CounterClockwise => self.percent.saturating_sub(self.step),
        };

        self.percent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clockwise_wraps_to_zero() {
        let mut knob = VolumeKnob::new(90, 5);

        assert_eq!(knob.turn(Direction::Clockwise), 95);
        assert_eq!(knob.turn(Direction::Clockwise), 100);
        assert_eq!(knob.turn(Direction::Clockwise), 0);
        assert_eq!(knob.turn(Direction::Clockwise), 5);
    }

    #[test]
    fn counter_clockwise_wraps_to_full() {
        let mut knob = VolumeKnob::new(5, 5);

        assert_eq!(knob.turn(Direction::CounterClockwise), 0);
        assert_eq!(knob.turn(Direction::CounterClockwise), 100);
        assert_eq!(knob.turn(Direction::CounterClockwise), 95);
    }

    #[test]
    fn uneven_steps_stop_at_the_ends_first() {
        let mut knob = VolumeKnob::new(97, 5);
        assert_eq!(knob.turn(Direction::Clockwise), 100);

        let mut knob = VolumeKnob::new(3, 5);
        assert_eq!(knob.turn(Direction::CounterClockwise), 0);
    }

    #[test]
    fn level_conversion() {
        assert_eq!(VolumeKnob::from_level(0.5, 5).percent(), 50);
        assert_eq!(VolumeKnob::from_level(1.7, 5).percent(), 100);
        assert_eq!(VolumeKnob::from_level(f64::NAN, 5).percent(), 0);
        assert_eq!(VolumeKnob::new(250, 0), VolumeKnob::new(100, 1));
        assert_eq!(VolumeKnob::new(40, 5).level(), 0.4);
    }
}
