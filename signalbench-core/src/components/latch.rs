//! Three-state latch shared by the threshold strategies.
//!
//! A latch remembers which side last fired so a condition that stays true
//! across many bars yields one signal, not one per bar.
//!
//! | state | input            | next  | emits |
//! |-------|------------------|-------|-------|
//! | Flat  | Enter(Long)      | Long  | Long  |
//! | Flat  | Enter(Short)     | Short | Short |
//! | Long  | Enter(Long)      | Long  | —     |
//! | Long  | Enter(Short)     | Short | Short |
//! | Short | Enter(Short)     | Short | —     |
//! | Short | Enter(Long)      | Long  | Long  |
//! | Long  | ClearLong        | Flat  | —     |
//! | Short | ClearShort       | Flat  | —     |
//! | any   | other clear/Hold | same  | —     |

use crate::domain::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Latch {
    #[default]
    Flat,
    Long,
    Short,
}

/// What the strategy observed on the current bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatchInput {
    /// Entry condition for this side holds.
    Enter(Direction),
    /// Long exit condition holds (price back at the middle band from below).
    ClearLong,
    /// Short exit condition holds.
    ClearShort,
    Hold,
}

impl Latch {
    /// Apply one observation. Returns the next state and the direction to
    /// emit, if any. Clearing never emits.
    pub fn step(self, input: LatchInput) -> (Latch, Option<Direction>) {
        match (self, input) {
            (Latch::Long, LatchInput::Enter(Direction::Long)) => (self, None),
            (Latch::Short, LatchInput::Enter(Direction::Short)) => (self, None),
            (_, LatchInput::Enter(dir)) => (Latch::from(dir), Some(dir)),
            (Latch::Long, LatchInput::ClearLong) => (Latch::Flat, None),
            (Latch::Short, LatchInput::ClearShort) => (Latch::Flat, None),
            _ => (self, None),
        }
    }

    /// In-place form of [`Latch::step`].
    pub fn apply(&mut self, input: LatchInput) -> Option<Direction> {
        let (next, emitted) = self.step(input);
        *self = next;
        emitted
    }
}

impl From<Direction> for Latch {
    fn from(dir: Direction) -> Self {
        match dir {
            Direction::Long => Latch::Long,
            Direction::Short => Latch::Short,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG: LatchInput = LatchInput::Enter(Direction::Long);
    const SHORT: LatchInput = LatchInput::Enter(Direction::Short);

    #[test]
    fn flat_emits_either_side() {
        assert_eq!(Latch::Flat.step(LONG), (Latch::Long, Some(Direction::Long)));
        assert_eq!(Latch::Flat.step(SHORT), (Latch::Short, Some(Direction::Short)));
    }

    #[test]
    fn repeated_entry_is_suppressed() {
        let mut latch = Latch::Flat;
        let emitted: Vec<_> = [LONG, LONG, LONG].iter().filter_map(|&i| latch.apply(i)).collect();
        assert_eq!(emitted, vec![Direction::Long]);
        assert_eq!(latch, Latch::Long);
    }

    #[test]
    fn reversal_emits_immediately() {
        assert_eq!(Latch::Long.step(SHORT), (Latch::Short, Some(Direction::Short)));
        assert_eq!(Latch::Short.step(LONG), (Latch::Long, Some(Direction::Long)));
    }

    #[test]
    fn clears_are_side_specific_and_silent() {
        assert_eq!(Latch::Long.step(LatchInput::ClearLong), (Latch::Flat, None));
        assert_eq!(Latch::Short.step(LatchInput::ClearShort), (Latch::Flat, None));
        assert_eq!(Latch::Long.step(LatchInput::ClearShort), (Latch::Long, None));
        assert_eq!(Latch::Flat.step(LatchInput::ClearLong), (Latch::Flat, None));
    }

    #[test]
    fn clear_then_reenter_fires_again() {
        let mut latch = Latch::Flat;
        assert_eq!(latch.apply(LONG), Some(Direction::Long));
        assert_eq!(latch.apply(LatchInput::ClearLong), None);
        assert_eq!(latch.apply(LONG), Some(Direction::Long));
    }

    #[test]
    fn hold_keeps_state() {
        for state in [Latch::Flat, Latch::Long, Latch::Short] {
            assert_eq!(state.step(LatchInput::Hold), (state, None));
        }
    }
}
