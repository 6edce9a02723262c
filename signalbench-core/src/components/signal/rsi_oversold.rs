//! RSI oversold/overbought with a latch.

use super::SignalGenerator;
use crate::components::indicator::Indicator;
use crate::components::latch::{Latch, LatchInput};
use crate::domain::{Bar, Direction, Signal};
use crate::indicators::Rsi;

/// LONG when RSI < oversold, SHORT when RSI > overbought, each only once
/// until the opposite side fires.
#[derive(Debug, Clone)]
pub struct RsiOversold {
    rsi: Rsi,
    oversold: f64,
    overbought: f64,
}

impl RsiOversold {
    pub fn new(period: usize, oversold: f64, overbought: f64) -> Self {
        Self {
            rsi: Rsi::new(period),
            oversold,
            overbought,
        }
    }
}

impl SignalGenerator for RsiOversold {
    fn name(&self) -> &str {
        "rsi_oversold"
    }

    fn generate(&self, bars: &[Bar], asset_id: &str) -> Vec<Signal> {
        let rsi = self.rsi.compute(bars);
        let mut latch = Latch::Flat;
        let mut signals = Vec::new();

        for (bar, &value) in bars.iter().zip(&rsi) {
            if value.is_nan() {
                continue;
            }
            let input = if value < self.oversold {
                LatchInput::Enter(Direction::Long)
            } else if value > self.overbought {
                LatchInput::Enter(Direction::Short)
            } else {
                LatchInput::Hold
            };
            if let Some(direction) = latch.apply(input) {
                signals.push(
                    Signal::new(bar.timestamp, asset_id, direction, bar.close)
                        .with_field("rsi", value),
                );
            }
        }
        signals
    }
}
