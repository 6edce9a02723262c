//! Signal generation — turns a bar history into timestamped directional events.
//!
//! Generators are pure: parameters are bound at construction, and
//! `generate` holds no state between calls. The same bars and asset id
//! always produce the same signals, in timestamp order.

pub mod mean_reversion;
pub mod rsi_oversold;
pub mod session;
pub mod sma_crossover;
pub mod validated;
pub mod vwap_ib;

pub use mean_reversion::MeanReversion;
pub use rsi_oversold::RsiOversold;
pub use session::{SessionSlice, SessionWindows};
pub use sma_crossover::SmaCrossover;
pub use validated::{ValidatedSignalGenerator, ValidationConfig, ValidationStats};
pub use vwap_ib::VwapInitialBalance;

use crate::domain::{Bar, Signal};

/// Trait for signal generators.
///
/// An empty bar series yields an empty signal list, never an error.
pub trait SignalGenerator: Send + Sync {
    /// Registry id of the strategy (e.g., "vwap_ib").
    fn name(&self) -> &str;

    /// Emit every signal for `bars`, ordered by timestamp.
    fn generate(&self, bars: &[Bar], asset_id: &str) -> Vec<Signal>;
}

/// Build bars from (timestamp, close) pairs with a fixed ±0.5 range.
#[cfg(test)]
pub(crate) fn bars_at(points: &[(chrono::NaiveDateTime, f64)]) -> Vec<Bar> {
    points
        .iter()
        .map(|&(ts, close)| Bar::new(ts, close, close + 0.5, close - 0.5, close, 100.0))
        .collect()
}
