//! Bollinger mean reversion.
//!
//! LONG when close ≤ lower band, SHORT when close ≥ upper band, latched.
//! The latch clears silently once price gets back to the middle band.

use super::SignalGenerator;
use crate::components::latch::{Latch, LatchInput};
use crate::domain::{Bar, Direction, Signal};
use crate::indicators::Bollinger;

#[derive(Debug, Clone)]
pub struct MeanReversion {
    period: usize,
    k: f64,
}

impl MeanReversion {
    pub fn new(period: usize, k: f64) -> Self {
        Self { period, k }
    }
}

impl SignalGenerator for MeanReversion {
    fn name(&self) -> &str {
        "mean_reversion"
    }

    fn generate(&self, bars: &[Bar], asset_id: &str) -> Vec<Signal> {
        let bands = Bollinger::bands(self.period, self.k, bars);
        let mut latch = Latch::Flat;
        let mut signals = Vec::new();

        for (i, bar) in bars.iter().enumerate() {
            let (upper, middle, lower) = (bands.upper[i], bands.middle[i], bands.lower[i]);
            if middle.is_nan() {
                continue;
            }
            let close = bar.close;
            let input = if close <= lower && latch != Latch::Long {
                LatchInput::Enter(Direction::Long)
            } else if close >= upper && latch != Latch::Short {
                LatchInput::Enter(Direction::Short)
            } else if latch == Latch::Long && close >= middle {
                LatchInput::ClearLong
            } else if latch == Latch::Short && close <= middle {
                LatchInput::ClearShort
            } else {
                LatchInput::Hold
            };

            if let Some(direction) = latch.apply(input) {
                let width = upper - lower;
                let position = if width == 0.0 {
                    0.0
                } else {
                    (close - lower) / width
                };
                signals.push(
                    Signal::new(bar.timestamp, asset_id, direction, close)
                        .with_field("bb_upper", upper)
                        .with_field("bb_middle", middle)
                        .with_field("bb_lower", lower)
                        .with_field("bb_position", position),
                );
            }
        }
        signals
    }
}
