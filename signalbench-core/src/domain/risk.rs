//! Per-backtest risk rules.

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};

/// Sizing, exit and friction settings for one backtest call.
///
/// Passed by reference into the simulator; never stored on an engine object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Fraction of current capital committed per trade, in (0, 1].
    pub position_size: f64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    /// Charged twice per trade (entry + exit) against pnl_pct.
    pub commission_pct: f64,
    /// Applied to the exit price against the position.
    pub slippage_pct: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            position_size: 0.1,
            stop_loss_pct: 0.005,
            take_profit_pct: 0.01,
            commission_pct: 0.001,
            slippage_pct: 0.0,
        }
    }
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let fields = [
            ("position_size", self.position_size),
            ("stop_loss_pct", self.stop_loss_pct),
            ("take_profit_pct", self.take_profit_pct),
            ("commission_pct", self.commission_pct),
            ("slippage_pct", self.slippage_pct),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(invalid(field, value, "must be finite"));
            }
            if value < 0.0 {
                return Err(invalid(field, value, "must not be negative"));
            }
        }
        if self.position_size <= 0.0 || self.position_size > 1.0 {
            return Err(invalid(
                "position_size",
                self.position_size,
                "must be in (0, 1]",
            ));
        }
        for (field, value) in [
            ("stop_loss_pct", self.stop_loss_pct),
            ("take_profit_pct", self.take_profit_pct),
            ("slippage_pct", self.slippage_pct),
        ] {
            if value >= 1.0 {
                return Err(invalid(field, value, "must be below 1"));
            }
        }
        Ok(())
    }
}

fn invalid(field: &'static str, value: f64, reason: &'static str) -> ConfigurationError {
    ConfigurationError::InvalidRisk {
        field,
        value,
        reason,
    }
}
