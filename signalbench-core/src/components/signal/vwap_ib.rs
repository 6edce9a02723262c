//! VWAP + Initial Balance breakout.
//!
//! Per session: the IB range is max(high)/min(low) over [ib_start, ib_end).
//! The trading window [ib_end, session_end) carries its own anchored VWAP.
//! The first trading-window bar closing above both IB high and VWAP is a
//! LONG; the first closing below both IB low and VWAP is a SHORT. At most
//! one signal per session.

use tracing::debug;

use super::session::SessionWindows;
use super::SignalGenerator;
use crate::components::indicator::Indicator;
use crate::domain::{Bar, Direction, Signal};
use crate::indicators::Vwap;

#[derive(Debug, Clone)]
pub struct VwapInitialBalance {
    windows: SessionWindows,
}

impl VwapInitialBalance {
    pub fn new(windows: SessionWindows) -> Self {
        Self { windows }
    }

    pub fn windows(&self) -> &SessionWindows {
        &self.windows
    }
}

impl SignalGenerator for VwapInitialBalance {
    fn name(&self) -> &str {
        "vwap_ib"
    }

    fn generate(&self, bars: &[Bar], asset_id: &str) -> Vec<Signal> {
        let mut signals = Vec::new();

        for session in self.windows.split(bars) {
            if session.initial_balance.is_empty() || session.trading.is_empty() {
                debug!(
                    asset_id,
                    session = %session.key,
                    "skipping session without IB or trading bars"
                );
                continue;
            }
            let ib_high = session
                .initial_balance
                .iter()
                .map(|b| b.high)
                .fold(f64::NEG_INFINITY, f64::max);
            let ib_low = session
                .initial_balance
                .iter()
                .map(|b| b.low)
                .fold(f64::INFINITY, f64::min);

            let trading: Vec<Bar> = session.trading.iter().map(|b| **b).collect();
            let vwap = Vwap::new().compute(&trading);

            let hit = trading.iter().zip(&vwap).find_map(|(bar, &v)| {
                if bar.close > ib_high && bar.close > v {
                    Some((bar, v, Direction::Long))
                } else if bar.close < ib_low && bar.close < v {
                    Some((bar, v, Direction::Short))
                } else {
                    None
                }
            });

            if let Some((bar, v, direction)) = hit {
                signals.push(
                    Signal::new(bar.timestamp, asset_id, direction, bar.close)
                        .with_field("vwap", v)
                        .with_field("ib_high", ib_high)
                        .with_field("ib_low", ib_low),
                );
            }
        }

        debug!(asset_id, count = signals.len(), "vwap_ib signals generated");
        signals
    }
}
