//! Trade simulator — one independent trade per signal, compounding capital.
//!
//! Signals are processed in timestamp order (stable for ties). Each trade
//! is sized from the capital left by the previous trade, scans the bars
//! strictly after its entry, and exits on the first stop or target touch.
//! The stop is checked before the target on every bar, so a bar whose range
//! covers both resolves as a stop-loss.

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::domain::{first_index_after, Bar, Direction, ExitReason, RiskConfig, Signal, Trade};
use crate::error::ConfigurationError;

/// Raw result of a simulation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Simulation {
    pub trades: Vec<Trade>,
    pub final_capital: f64,
    /// Signals with no bar after their timestamp or without a positive
    /// finite entry price.
    pub discarded: usize,
}

/// Where and why a position closed, before slippage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitFill {
    pub time: NaiveDateTime,
    pub price: f64,
    pub reason: ExitReason,
}

/// (stop, target) price levels for an entry.
pub fn stop_and_target(direction: Direction, entry: f64, risk: &RiskConfig) -> (f64, f64) {
    match direction {
        Direction::Long => (
            entry * (1.0 - risk.stop_loss_pct),
            entry * (1.0 + risk.take_profit_pct),
        ),
        Direction::Short => (
            entry * (1.0 + risk.stop_loss_pct),
            entry * (1.0 - risk.take_profit_pct),
        ),
    }
}

/// Scan `later` bars in order for the first stop or target breach.
///
/// Returns `None` only when `later` is empty.
pub fn find_exit(
    direction: Direction,
    entry: f64,
    later: &[Bar],
    risk: &RiskConfig,
) -> Option<ExitFill> {
    let (stop, target) = stop_and_target(direction, entry, risk);
    for bar in later {
        let (stop_hit, target_hit) = match direction {
            Direction::Long => (bar.low <= stop, bar.high >= target),
            Direction::Short => (bar.high >= stop, bar.low <= target),
        };
        if stop_hit {
            return Some(ExitFill {
                time: bar.timestamp,
                price: stop,
                reason: ExitReason::StopLoss,
            });
        }
        if target_hit {
            return Some(ExitFill {
                time: bar.timestamp,
                price: target,
                reason: ExitReason::TakeProfit,
            });
        }
    }
    later.last().map(|bar| ExitFill {
        time: bar.timestamp,
        price: bar.close,
        reason: ExitReason::EndOfData,
    })
}

/// Slippage always moves the exit against the position.
pub fn apply_slippage(direction: Direction, price: f64, slippage_pct: f64) -> f64 {
    match direction {
        Direction::Long => price * (1.0 - slippage_pct),
        Direction::Short => price * (1.0 + slippage_pct),
    }
}

/// Net return on the position after round-trip commission.
pub fn net_return(direction: Direction, entry: f64, exit: f64, commission_pct: f64) -> f64 {
    let gross = match direction {
        Direction::Long => (exit - entry) / entry,
        Direction::Short => (entry - exit) / entry,
    };
    gross - 2.0 * commission_pct
}

pub fn simulate(
    signals: &[Signal],
    bars: &[Bar],
    risk: &RiskConfig,
    starting_capital: f64,
) -> Result<Simulation, ConfigurationError> {
    risk.validate()?;
    if !starting_capital.is_finite() || starting_capital <= 0.0 {
        return Err(ConfigurationError::InvalidCapital(starting_capital));
    }

    let mut ordered: Vec<&Signal> = signals.iter().collect();
    ordered.sort_by_key(|s| s.timestamp);

    let mut capital = starting_capital;
    let mut trades = Vec::with_capacity(ordered.len());
    let mut discarded = 0;

    for signal in ordered {
        // Returns are relative to the entry, so it must be a usable price.
        if !signal.price.is_finite() || signal.price <= 0.0 {
            warn!(
                asset_id = %signal.asset_id,
                timestamp = %signal.timestamp,
                price = signal.price,
                "non-positive entry price, discarding"
            );
            discarded += 1;
            continue;
        }
        let later = &bars[first_index_after(bars, signal.timestamp)..];
        let Some(fill) = find_exit(signal.direction, signal.price, later, risk) else {
            warn!(
                asset_id = %signal.asset_id,
                timestamp = %signal.timestamp,
                "no bars after signal, discarding"
            );
            discarded += 1;
            continue;
        };

        let exit_price = apply_slippage(signal.direction, fill.price, risk.slippage_pct);
        let pnl_pct = net_return(signal.direction, signal.price, exit_price, risk.commission_pct);
        let pnl = capital * risk.position_size * pnl_pct;
        capital += pnl;

        trades.push(Trade {
            asset_id: signal.asset_id.clone(),
            entry_time: signal.timestamp,
            exit_time: fill.time,
            direction: signal.direction,
            entry_price: signal.price,
            exit_price,
            exit_reason: fill.reason,
            pnl,
            pnl_pct,
            capital_after: capital,
            ml_confidence: signal.ml_confidence,
            ml_validated: signal.ml_validated,
        });
    }

    debug!(
        trades = trades.len(),
        discarded,
        final_capital = capital,
        "simulation complete"
    );
    Ok(Simulation {
        trades,
        final_capital: capital,
        discarded,
    })
}
