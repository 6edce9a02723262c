//! Performance metrics — pure functions over a completed trade list.
//!
//! Every metric is a pure function: trades in, scalar out. Degenerate inputs
//! resolve to fixed sentinels rather than NaN: empty lists give zeros, a
//! profit factor with no losing trades is `+inf`, and a zero-variance Sharpe
//! is 0. Infinite sentinels serialize as JSON `null` and read back as `+inf`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use signalbench_core::domain::{ExitReason, Trade};

const SECONDS_PER_YEAR: f64 = 365.25 * 24.0 * 60.0 * 60.0;

/// Aggregate performance metrics for one backtest.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub trade_count: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    /// Mean pnl of winners, 0 when there are none.
    pub avg_win: f64,
    /// Mean pnl of losers (negative), 0 when there are none.
    pub avg_loss: f64,
    #[serde(with = "infinite_as_null")]
    pub profit_factor: f64,
    pub total_pnl: f64,
    /// Relative to the capital the first trade was sized from.
    pub total_return_pct: f64,
    pub expectancy: f64,
    #[serde(with = "infinite_as_null")]
    pub risk_reward_ratio: f64,
    /// Positive fraction of the running peak.
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    /// Seconds.
    pub avg_trade_duration: f64,
    pub best_trade: f64,
    pub worst_trade: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
    pub exit_reasons: BTreeMap<ExitReason, usize>,
}

impl PerformanceMetrics {
    /// Summarize a trade list in simulation order.
    pub fn summarize(trades: &[Trade]) -> Self {
        if trades.is_empty() {
            return Self::default();
        }
        let curve = capital_curve(trades);
        Self {
            trade_count: trades.len(),
            winning_trades: trades.iter().filter(|t| t.is_winner()).count(),
            losing_trades: trades.iter().filter(|t| t.is_loser()).count(),
            win_rate: win_rate(trades),
            avg_win: avg_win(trades),
            avg_loss: avg_loss(trades),
            profit_factor: profit_factor(trades),
            total_pnl: trades.iter().map(|t| t.pnl).sum(),
            total_return_pct: total_return(&curve),
            expectancy: expectancy(trades),
            risk_reward_ratio: risk_reward_ratio(trades),
            max_drawdown: max_drawdown(&curve),
            sharpe_ratio: sharpe_ratio(trades),
            avg_trade_duration: avg_trade_duration(trades),
            best_trade: trades.iter().map(|t| t.pnl).fold(f64::NEG_INFINITY, f64::max),
            worst_trade: trades.iter().map(|t| t.pnl).fold(f64::INFINITY, f64::min),
            max_consecutive_wins: max_consecutive(trades, true),
            max_consecutive_losses: max_consecutive(trades, false),
            exit_reasons: exit_reason_counts(trades),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Starting capital of the first trade, then every `capital_after`.
pub fn capital_curve(trades: &[Trade]) -> Vec<f64> {
    let Some(first) = trades.first() else {
        return Vec::new();
    };
    std::iter::once(first.capital_before())
        .chain(trades.iter().map(|t| t.capital_after))
        .collect()
}

/// (final - initial) / initial over a capital curve.
pub fn total_return(curve: &[f64]) -> f64 {
    match (curve.first(), curve.last()) {
        (Some(&initial), Some(&last)) if curve.len() >= 2 && initial > 0.0 => {
            (last - initial) / initial
        }
        _ => 0.0,
    }
}

pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().filter(|t| t.is_winner()).count() as f64 / trades.len() as f64
}

pub fn avg_win(trades: &[Trade]) -> f64 {
    let wins: Vec<f64> = trades.iter().filter(|t| t.is_winner()).map(|t| t.pnl).collect();
    mean_f64(&wins)
}

pub fn avg_loss(trades: &[Trade]) -> f64 {
    let losses: Vec<f64> = trades.iter().filter(|t| t.is_loser()).map(|t| t.pnl).collect();
    mean_f64(&losses)
}

/// |gross profit / gross loss|.
///
/// `+inf` when there are winners but no losers; 0 when there are neither.
pub fn profit_factor(trades: &[Trade]) -> f64 {
    let gross_profit: f64 = trades.iter().filter(|t| t.is_winner()).map(|t| t.pnl).sum();
    let gross_loss: f64 = trades.iter().filter(|t| t.is_loser()).map(|t| t.pnl).sum();

    if gross_loss == 0.0 {
        return if gross_profit > 0.0 { f64::INFINITY } else { 0.0 };
    }
    (gross_profit / gross_loss).abs()
}

/// Mean pnl per trade.
pub fn expectancy(trades: &[Trade]) -> f64 {
    let pnls: Vec<f64> = trades.iter().map(|t| t.pnl).collect();
    mean_f64(&pnls)
}

/// avg_win / |avg_loss|, `+inf` when there are wins but no losses.
pub fn risk_reward_ratio(trades: &[Trade]) -> f64 {
    let win = avg_win(trades);
    let loss = avg_loss(trades).abs();
    if loss == 0.0 {
        return if win > 0.0 { f64::INFINITY } else { 0.0 };
    }
    win / loss
}

/// Largest peak-to-trough decline as a positive fraction of the peak.
///
/// Returns 0.0 for flat or monotonically rising capital.
pub fn max_drawdown(curve: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for &capital in curve {
        peak = peak.max(capital);
        if peak > 0.0 {
            max_dd = max_dd.max((peak - capital) / peak);
        }
    }
    max_dd
}

/// Per-trade Sharpe annualized by observed trade frequency.
///
/// mean(pnl_pct) / std(pnl_pct) * sqrt(trades per year), where the year count
/// spans the first entry to the last exit. 0.0 with fewer than 2 trades, a
/// zero span, or zero variance.
pub fn sharpe_ratio(trades: &[Trade]) -> f64 {
    if trades.len() < 2 {
        return 0.0;
    }
    let (Some(first_entry), Some(last_exit)) = (
        trades.iter().map(|t| t.entry_time).min(),
        trades.iter().map(|t| t.exit_time).max(),
    ) else {
        return 0.0;
    };
    let span = (last_exit - first_entry).num_seconds() as f64;
    if span <= 0.0 {
        return 0.0;
    }
    let returns: Vec<f64> = trades.iter().map(|t| t.pnl_pct).collect();
    let std = std_dev(&returns);
    if std < 1e-15 {
        return 0.0;
    }
    let trades_per_year = trades.len() as f64 / (span / SECONDS_PER_YEAR);
    mean_f64(&returns) / std * trades_per_year.sqrt()
}

/// Mean holding time in seconds.
pub fn avg_trade_duration(trades: &[Trade]) -> f64 {
    let durations: Vec<f64> = trades.iter().map(Trade::duration_secs).collect();
    mean_f64(&durations)
}

pub fn exit_reason_counts(trades: &[Trade]) -> BTreeMap<ExitReason, usize> {
    let mut counts = BTreeMap::new();
    for trade in trades {
        *counts.entry(trade.exit_reason).or_insert(0) += 1;
    }
    counts
}

// ─── Helpers ────────────────────────────────────────────────────────

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation.
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

fn max_consecutive(trades: &[Trade], winners: bool) -> usize {
    let mut max_streak = 0;
    let mut current = 0;

    for trade in trades {
        let hit = if winners { trade.is_winner() } else { trade.is_loser() };
        if hit {
            current += 1;
            max_streak = max_streak.max(current);
        } else {
            current = 0;
        }
    }
    max_streak
}

/// Serde adapter: non-finite floats go out as `null`, `null` comes back as
/// `+inf` (the only non-finite value a metric can hold).
pub mod infinite_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use signalbench_core::domain::Direction;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + chrono::Duration::hours(hour as i64)
    }

    /// Build a chain of trades with compounding capital from `pnls`.
    fn chain(pnls: &[f64]) -> Vec<Trade> {
        let mut capital = 10_000.0;
        pnls.iter()
            .enumerate()
            .map(|(i, &pnl)| {
                capital += pnl;
                Trade {
                    asset_id: "XAUUSD".into(),
                    entry_time: at(2 * i as u32),
                    exit_time: at(2 * i as u32 + 1),
                    direction: Direction::Long,
                    entry_price: 100.0,
                    exit_price: 100.0,
                    exit_reason: if pnl > 0.0 {
                        ExitReason::TakeProfit
                    } else {
                        ExitReason::StopLoss
                    },
                    pnl,
                    pnl_pct: pnl / 1_000.0,
                    capital_after: capital,
                    ml_confidence: None,
                    ml_validated: None,
                }
            })
            .collect()
    }

    #[test]
    fn empty_trades_give_zero_metrics() {
        let m = PerformanceMetrics::summarize(&[]);
        assert_eq!(m, PerformanceMetrics::default());
        assert_eq!(m.profit_factor, 0.0);
        assert_eq!(m.sharpe_ratio, 0.0);
    }

    #[test]
    fn all_winners_profit_factor_is_infinite() {
        let m = PerformanceMetrics::summarize(&chain(&[50.0, 20.0]));
        assert!(m.profit_factor.is_infinite());
        assert!(m.risk_reward_ratio.is_infinite());
        assert_eq!(m.avg_loss, 0.0);
        assert_eq!(m.max_drawdown, 0.0);
    }

    #[test]
    fn profit_factor_mixed() {
        let trades = chain(&[100.0, -50.0, 50.0]);
        assert!((profit_factor(&trades) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn breakeven_only_profit_factor_is_zero() {
        assert_eq!(profit_factor(&chain(&[0.0, 0.0])), 0.0);
    }

    #[test]
    fn win_rate_and_averages() {
        let m = PerformanceMetrics::summarize(&chain(&[100.0, -40.0, 60.0, -20.0]));
        assert_eq!(m.trade_count, 4);
        assert_eq!(m.winning_trades, 2);
        assert_eq!(m.losing_trades, 2);
        assert!((m.win_rate - 0.5).abs() < 1e-12);
        assert!((m.avg_win - 80.0).abs() < 1e-12);
        assert!((m.avg_loss + 30.0).abs() < 1e-12);
        assert!((m.expectancy - 25.0).abs() < 1e-12);
        assert!((m.risk_reward_ratio - 80.0 / 30.0).abs() < 1e-12);
        assert_eq!(m.best_trade, 100.0);
        assert_eq!(m.worst_trade, -40.0);
    }

    #[test]
    fn drawdown_from_capital_curve() {
        // 10000 -> 11000 -> 9900 -> 10400
        let trades = chain(&[1_000.0, -1_100.0, 500.0]);
        let curve = capital_curve(&trades);
        assert_eq!(curve, vec![10_000.0, 11_000.0, 9_900.0, 10_400.0]);
        assert!((max_drawdown(&curve) - 0.1).abs() < 1e-12);
        assert!((total_return(&curve) - 0.04).abs() < 1e-12);
    }

    #[test]
    fn drawdown_on_flat_capital_is_zero() {
        assert_eq!(max_drawdown(&[10_000.0, 10_000.0, 10_000.0]), 0.0);
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    #[test]
    fn sharpe_needs_two_trades_and_variance() {
        assert_eq!(sharpe_ratio(&chain(&[10.0])), 0.0);
        assert_eq!(sharpe_ratio(&chain(&[10.0, 10.0, 10.0])), 0.0);
    }

    #[test]
    fn sharpe_annualizes_by_trade_frequency() {
        let trades = chain(&[10.0, -5.0, 20.0]);
        let returns = [0.01, -0.005, 0.02];
        let mean = returns.iter().sum::<f64>() / 3.0;
        let std = std_dev(&returns);
        // First entry at hour 0, last exit at hour 5.
        let per_year = 3.0 / (5.0 * 3600.0 / SECONDS_PER_YEAR);
        let expected = mean / std * per_year.sqrt();
        assert!((sharpe_ratio(&trades) - expected).abs() < 1e-9 * expected.abs());
    }

    #[test]
    fn streaks_count_strict_wins_and_losses() {
        let trades = chain(&[1.0, 1.0, 0.0, -1.0, -1.0, -1.0, 1.0]);
        assert_eq!(max_consecutive(&trades, true), 2);
        assert_eq!(max_consecutive(&trades, false), 3);
    }

    #[test]
    fn exit_reasons_are_counted() {
        let m = PerformanceMetrics::summarize(&chain(&[5.0, -5.0, 5.0]));
        assert_eq!(m.exit_reasons.get(&ExitReason::TakeProfit), Some(&2));
        assert_eq!(m.exit_reasons.get(&ExitReason::StopLoss), Some(&1));
        assert_eq!(m.exit_reasons.get(&ExitReason::EndOfData), None);
    }

    #[test]
    fn duration_is_mean_seconds() {
        assert_eq!(avg_trade_duration(&chain(&[1.0, 2.0])), 3600.0);
    }

    #[test]
    fn infinite_profit_factor_serializes_as_null() {
        let m = PerformanceMetrics::summarize(&chain(&[50.0]));
        let json = serde_json::to_string(&m).unwrap();
        assert!(json.contains("\"profit_factor\":null"));
        assert!(!json.contains("inf"));

        let back: PerformanceMetrics = serde_json::from_str(&json).unwrap();
        assert!(back.profit_factor.is_infinite());
        assert_eq!(back.trade_count, 1);
    }

    #[test]
    fn no_metric_is_nan() {
        let m = PerformanceMetrics::summarize(&chain(&[0.0, 0.0, 0.0]));
        for v in [
            m.win_rate,
            m.avg_win,
            m.avg_loss,
            m.profit_factor,
            m.total_return_pct,
            m.expectancy,
            m.risk_reward_ratio,
            m.max_drawdown,
            m.sharpe_ratio,
            m.avg_trade_duration,
        ] {
            assert!(!v.is_nan());
        }
    }
}
