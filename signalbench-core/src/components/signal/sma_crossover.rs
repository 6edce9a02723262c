//! SMA crossover — edge-triggered on the fast/slow ordering.
//!
//! state[i] = 1 when fast > slow, else 0 (warmup NaN counts as 0).
//! LONG fires on a 0→1 edge, SHORT on 1→0. Bar 0 never fires.

use super::SignalGenerator;
use crate::components::indicator::Indicator;
use crate::domain::{Bar, Direction, Signal};
use crate::indicators::Sma;

#[derive(Debug, Clone)]
pub struct SmaCrossover {
    fast: Sma,
    slow: Sma,
}

impl SmaCrossover {
    /// Callers (the registry) guarantee `fast < slow`.
    pub fn new(fast_period: usize, slow_period: usize) -> Self {
        debug_assert!(fast_period < slow_period);
        Self {
            fast: Sma::new(fast_period),
            slow: Sma::new(slow_period),
        }
    }
}

impl SignalGenerator for SmaCrossover {
    fn name(&self) -> &str {
        "sma_crossover"
    }

    fn generate(&self, bars: &[Bar], asset_id: &str) -> Vec<Signal> {
        let fast = self.fast.compute(bars);
        let slow = self.slow.compute(bars);
        // NaN comparisons are false, so warmup reads as state 0.
        let state: Vec<bool> = fast.iter().zip(&slow).map(|(f, s)| f > s).collect();

        (1..bars.len())
            .filter_map(|i| {
                let direction = match (state[i - 1], state[i]) {
                    (false, true) => Direction::Long,
                    (true, false) => Direction::Short,
                    _ => return None,
                };
                let bar = &bars[i];
                Some(
                    Signal::new(bar.timestamp, asset_id, direction, bar.close)
                        .with_field("sma_fast", fast[i])
                        .with_field("sma_slow", slow[i]),
                )
            })
            .collect()
    }
}
