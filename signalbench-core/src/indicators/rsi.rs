//! Relative Strength Index (RSI), Wilder smoothing.
//!
//! Seeded with the plain mean of the first `period` gains/losses, then
//! avg = avg + (x - avg) / period. First valid value at index `period`.
//!
//! Degenerate cases: no movement at all → 50; avg_loss == 0 → 100;
//! avg_gain == 0 → 0.

use crate::components::indicator::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut out = vec![f64::NAN; n];
        if n <= self.period {
            return out;
        }

        let p = self.period as f64;
        let (mut avg_gain, mut avg_loss) = (0.0, 0.0);

        for i in 1..n {
            let change = bars[i].close - bars[i - 1].close;
            if change.is_nan() {
                // A gap in the data ends the series; nothing after it is trusted.
                break;
            }
            let gain = change.max(0.0);
            let loss = (-change).max(0.0);

            if i <= self.period {
                avg_gain += gain / p;
                avg_loss += loss / p;
                if i < self.period {
                    continue;
                }
            } else {
                avg_gain += (gain - avg_gain) / p;
                avg_loss += (loss - avg_loss) / p;
            }
            out[i] = rsi_from_averages(avg_gain, avg_loss);
        }
        out
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    match (avg_gain == 0.0, avg_loss == 0.0) {
        (true, true) => 50.0,
        (_, true) => 100.0,
        (true, _) => 0.0,
        _ => 100.0 - 100.0 / (1.0 + avg_gain / avg_loss),
    }
}
