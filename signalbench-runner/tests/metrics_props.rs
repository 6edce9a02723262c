//! Property tests for the metrics calculator over simulated trades.
//!
//! Uses proptest to verify:
//! 1. Finiteness: no metric is ever NaN; only the ratio sentinels may be infinite
//! 2. Bounds: win rate in [0, 1], drawdown in [0, 1), counts add up
//! 3. Serialization: every summary serializes to JSON without error

use chrono::NaiveDate;
use proptest::prelude::*;
use signalbench_core::domain::{Bar, Direction, RiskConfig, Signal};
use signalbench_core::engine::simulate;
use signalbench_runner::PerformanceMetrics;

fn bars_from_returns(returns: &[f64]) -> Vec<Bar> {
    let start = NaiveDate::from_ymd_opt(2024, 6, 3)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let mut close = 50.0;
    returns
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let open = close;
            close *= 1.0 + r;
            Bar::new(
                start + chrono::Duration::minutes(5 * i as i64),
                open,
                open.max(close) * 1.001,
                open.min(close) * 0.999,
                close,
                100.0,
            )
        })
        .collect()
}

fn arb_case() -> impl Strategy<Value = (Vec<f64>, Vec<(usize, bool)>, f64)> {
    (
        prop::collection::vec(-0.015..0.015_f64, 20..150),
        prop::collection::vec((0usize..150, any::<bool>()), 0..30),
        0.05..1.0_f64,
    )
}

proptest! {
    #[test]
    fn metrics_are_never_nan((returns, picks, size) in arb_case()) {
        let bars = bars_from_returns(&returns);
        let signals: Vec<Signal> = picks
            .iter()
            .filter(|(i, _)| *i < bars.len())
            .map(|&(i, long)| {
                let dir = if long { Direction::Long } else { Direction::Short };
                Signal::new(bars[i].timestamp, "P", dir, bars[i].close)
            })
            .collect();
        let risk = RiskConfig { position_size: size, ..RiskConfig::default() };
        let sim = simulate(&signals, &bars, &risk, 10_000.0).unwrap();
        let m = PerformanceMetrics::summarize(&sim.trades);

        for v in [
            m.win_rate, m.avg_win, m.avg_loss, m.total_pnl, m.total_return_pct,
            m.expectancy, m.max_drawdown, m.sharpe_ratio, m.avg_trade_duration,
            m.best_trade, m.worst_trade,
        ] {
            prop_assert!(v.is_finite());
        }
        prop_assert!(!m.profit_factor.is_nan() && m.profit_factor >= 0.0);
        prop_assert!(!m.risk_reward_ratio.is_nan() && m.risk_reward_ratio >= 0.0);

        prop_assert!((0.0..=1.0).contains(&m.win_rate));
        prop_assert!((0.0..1.0).contains(&m.max_drawdown));
        prop_assert!(m.winning_trades + m.losing_trades <= m.trade_count);
        prop_assert_eq!(m.exit_reasons.values().sum::<usize>(), m.trade_count);
        prop_assert!(serde_json::to_string(&m).is_ok());
    }
}
