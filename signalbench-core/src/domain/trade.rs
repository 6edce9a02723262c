//! Trade — a completed, simulated round trip.

use super::signal::Direction;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a simulated trade was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    EndOfData,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TakeProfit => "take_profit",
            ExitReason::EndOfData => "end_of_data",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One simulated trade: a single signal's worth of capital exposure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub asset_id: String,
    pub entry_time: NaiveDateTime,
    pub exit_time: NaiveDateTime,
    pub direction: Direction,
    pub entry_price: f64,
    /// Exit price after slippage.
    pub exit_price: f64,
    pub exit_reason: ExitReason,
    pub pnl: f64,
    /// Net return on the position (after round-trip commission).
    pub pnl_pct: f64,
    /// Running capital once this trade is closed.
    pub capital_after: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ml_confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ml_validated: Option<bool>,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }

    pub fn is_loser(&self) -> bool {
        self.pnl < 0.0
    }

    /// Capital the trade was sized from.
    pub fn capital_before(&self) -> f64 {
        self.capital_after - self.pnl
    }

    /// Holding time in seconds.
    pub fn duration_secs(&self) -> f64 {
        (self.exit_time - self.entry_time).num_seconds() as f64
    }
}
