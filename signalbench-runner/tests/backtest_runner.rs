//! Integration tests for the runner: registry strategies on CSV-loaded bars.
//!
//! Synthetic bars are written to a temporary CSV directory so the full path
//! (TOML config -> data source -> generator -> simulator -> metrics -> export)
//! is exercised.

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use signalbench_core::components::{RegistryError, StrategyRegistry};
use signalbench_core::domain::Bar;
use signalbench_runner::export::export_json;
use signalbench_runner::{
    generate_synthetic_bars, load_predictor, run, run_backtest, run_backtest_from_bars,
    write_bars_csv, BacktestConfig, BacktestOutcome, BacktestResult, CsvDataSource, RunError,
};

// ── Fixtures ─────────────────────────────────────────────────────────

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 4)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn write_csv(dir: &Path, asset: &str, bars: &[Bar]) {
    write_bars_csv(&dir.join(format!("{asset}_5M.csv")), bars).unwrap();
}

/// Temp data dir holding XAUUSD and BTCUSD, plus a config pointing at it.
fn setup(strategy_toml: &str) -> (tempfile::TempDir, BacktestConfig) {
    let dir = tempfile::tempdir().unwrap();
    for asset in ["XAUUSD", "BTCUSD"] {
        write_csv(dir.path(), asset, &generate_synthetic_bars(asset, start(), 3_000));
    }
    let toml = format!(
        "[backtest]\nasset = \"XAUUSD\"\ndata_dir = {:?}\nstarting_capital = 10000.0\n\n{strategy_toml}",
        dir.path().display().to_string()
    );
    let config = BacktestConfig::from_toml(&toml).unwrap();
    (dir, config)
}

fn completed(outcome: BacktestOutcome) -> BacktestResult {
    match outcome {
        BacktestOutcome::Completed(r) => *r,
        BacktestOutcome::NoSignals => panic!("expected a completed run"),
    }
}

fn run_from_config(config: &BacktestConfig) -> Result<BacktestOutcome, RunError> {
    let source = CsvDataSource::new(&config.backtest.data_dir);
    run_backtest(config, &StrategyRegistry::with_defaults(), &source)
}

// ── End to end ───────────────────────────────────────────────────────

#[test]
fn csv_run_matches_in_memory_run() {
    let (_dir, config) = setup("[strategy]\nid = \"sma_crossover\"\n");
    let from_csv = completed(run_from_config(&config).unwrap());

    let bars = generate_synthetic_bars("XAUUSD", start(), 3_000);
    let predictor = load_predictor(&config.validation).unwrap();
    let registry = StrategyRegistry::with_defaults();
    let in_memory =
        completed(run_backtest_from_bars(&config, &registry, predictor, "XAUUSD", &bars).unwrap());

    assert_eq!(from_csv, in_memory);
    assert_eq!(from_csv.bar_count, 3_000);
    assert!(!from_csv.trades.is_empty());
}

#[test]
fn result_is_internally_consistent() {
    let (_dir, config) = setup("[strategy]\nid = \"sma_crossover\"\n");
    let result = completed(run_from_config(&config).unwrap());

    assert_eq!(result.trades.len() + result.discarded_signals, result.signal_count);
    assert_eq!(result.metrics.trade_count, result.trades.len());
    let last = result.trades.last().map_or(10_000.0, |t| t.capital_after);
    assert_eq!(result.final_capital, last);
    assert!((result.trades[0].capital_before() - 10_000.0).abs() < 1e-9);
    for pair in result.trades.windows(2) {
        assert!(pair[1].entry_time >= pair[0].entry_time);
        assert!((pair[1].capital_before() - pair[0].capital_after).abs() < 1e-6);
    }
}

#[test]
fn every_builtin_strategy_runs() {
    for id in ["vwap_ib", "sma_crossover", "rsi_oversold", "mean_reversion"] {
        let (_dir, config) = setup(&format!("[strategy]\nid = \"{id}\"\n"));
        let outcome = run_from_config(&config).unwrap();
        if let Some(result) = outcome.result() {
            assert_eq!(result.strategy_id, id);
            assert!(result.final_capital.is_finite());
        }
    }
}

#[test]
fn repeated_runs_serialize_identically() {
    let (_dir, config) = setup("[strategy]\nid = \"mean_reversion\"\n");
    let a = run_from_config(&config).unwrap();
    let b = run_from_config(&config).unwrap();
    match (a.result(), b.result()) {
        (Some(a), Some(b)) => {
            assert_eq!(a.run_id, b.run_id);
            assert_eq!(export_json(a).unwrap(), export_json(b).unwrap());
        }
        (None, None) => {}
        _ => panic!("runs disagree on whether signals were produced"),
    }
}

// ── Configuration and errors ─────────────────────────────────────────

#[test]
fn parameter_overrides_change_the_run() {
    let (_dir, base) = setup("[strategy]\nid = \"sma_crossover\"\n");
    let (_dir2, tuned) = setup(
        "[strategy]\nid = \"sma_crossover\"\n[strategy.params]\nfast_period = 5\nslow_period = 50\n",
    );
    let a = completed(run_from_config(&base).unwrap());
    let b = completed(run_from_config(&tuned).unwrap());
    assert_ne!(a.signal_count, b.signal_count);
    assert_ne!(a.run_id, b.run_id);
}

#[test]
fn cross_parameter_rule_is_configuration_error() {
    let (_dir, config) = setup(
        "[strategy]\nid = \"sma_crossover\"\n[strategy.params]\nfast_period = 30\nslow_period = 20\n",
    );
    let err = run_from_config(&config).unwrap_err();
    assert!(matches!(err, RunError::Registry(RegistryError::Configuration(_))));
}

#[test]
fn unknown_strategy_is_not_found() {
    let (_dir, config) = setup("[strategy]\nid = \"breakout_9000\"\n");
    let err = run_from_config(&config).unwrap_err();
    assert!(matches!(err, RunError::Registry(RegistryError::StrategyNotFound(_))));
}

#[test]
fn missing_asset_is_data_error() {
    let (_dir, mut config) = setup("[strategy]\nid = \"sma_crossover\"\n");
    config.backtest.asset = "EURUSD".into();
    assert!(matches!(run_from_config(&config), Err(RunError::Data(_))));
}

#[test]
fn per_asset_risk_override_is_used() {
    let (_dir, mut config) = setup(
        "[strategy]\nid = \"sma_crossover\"\n\n[risk.assets.BTCUSD]\ncommission_pct = 0.0\nposition_size = 0.5\n",
    );
    config.backtest.asset = "BTCUSD".into();
    let result = completed(run_from_config(&config).unwrap());
    assert_eq!(result.risk.position_size, 0.5);
    assert_eq!(result.risk.commission_pct, 0.0);
    assert_eq!(result.risk.stop_loss_pct, 0.005);
}

// ── ML validation ────────────────────────────────────────────────────

fn write_model(dir: &Path, intercept: f64) -> String {
    let path = dir.join("model.json");
    let json = format!(r#"{{"intercept": {intercept}, "weights": {{"volume_ratio": 0.0}}}}"#);
    std::fs::write(&path, json).unwrap();
    path.display().to_string()
}

#[test]
fn accepting_model_keeps_every_signal() {
    let (dir, _) = setup("[strategy]\nid = \"sma_crossover\"\n");
    let model = write_model(dir.path(), 10.0);
    let (_d, config) = setup(&format!(
        "[strategy]\nid = \"sma_crossover\"\n\n[validation]\nenabled = true\nmodel_path = {model:?}\n"
    ));
    let (_d2, plain) = setup("[strategy]\nid = \"sma_crossover\"\n");

    let validated = completed(run_from_config(&config).unwrap());
    let raw = completed(run_from_config(&plain).unwrap());

    let stats = validated.validation.expect("validation stats");
    assert_eq!(stats.total, raw.signal_count);
    assert_eq!(stats.accepted, stats.total);
    assert_eq!(validated.signal_count, raw.signal_count);
    assert!(validated.trades.iter().all(|t| t.ml_validated == Some(true)));
}

#[test]
fn rejecting_model_leaves_no_signals() {
    let (dir, _) = setup("[strategy]\nid = \"sma_crossover\"\n");
    let model = write_model(dir.path(), -10.0);
    let (_d, config) = setup(&format!(
        "[strategy]\nid = \"sma_crossover\"\n\n[validation]\nenabled = true\nmodel_path = {model:?}\n"
    ));
    assert_eq!(run_from_config(&config).unwrap(), BacktestOutcome::NoSignals);
}

#[test]
fn untrained_fallback_passes_raw_signals() {
    let (_d, config) = setup("[strategy]\nid = \"sma_crossover\"\n\n[validation]\nenabled = true\n");
    let (_d2, plain) = setup("[strategy]\nid = \"sma_crossover\"\n");
    let validated = completed(run_from_config(&config).unwrap());
    let raw = completed(run_from_config(&plain).unwrap());
    assert!(validated.validation.is_none());
    assert_eq!(validated.signal_count, raw.signal_count);
    assert_eq!(validated.final_capital, raw.final_capital);
}

#[test]
fn untrained_without_fallback_drops_everything() {
    let (_d, config) = setup(
        "[strategy]\nid = \"sma_crossover\"\n\n[validation]\nenabled = true\nfallback_to_original = false\n",
    );
    assert_eq!(run_from_config(&config).unwrap(), BacktestOutcome::NoSignals);
}

// ── Degenerate prices ────────────────────────────────────────────────

/// Every float is finite; only the two ratio sentinels may be +inf.
fn assert_finite_or_sentinel(r: &BacktestResult) {
    let risk = &r.risk;
    let scalars = [
        r.starting_capital,
        r.final_capital,
        r.total_return,
        risk.position_size,
        risk.stop_loss_pct,
        risk.take_profit_pct,
        risk.commission_pct,
        risk.slippage_pct,
    ];
    assert!(scalars.iter().all(|v| v.is_finite()), "{scalars:?}");
    for t in &r.trades {
        let values = [t.entry_price, t.exit_price, t.pnl, t.pnl_pct, t.capital_after];
        assert!(values.iter().all(|v| v.is_finite()), "{t:?}");
    }
    let m = &r.metrics;
    let finite = [
        m.win_rate,
        m.avg_win,
        m.avg_loss,
        m.total_pnl,
        m.total_return_pct,
        m.expectancy,
        m.max_drawdown,
        m.sharpe_ratio,
        m.avg_trade_duration,
        m.best_trade,
        m.worst_trade,
    ];
    assert!(finite.iter().all(|v| v.is_finite()), "{m:?}");
    for ratio in [m.profit_factor, m.risk_reward_ratio] {
        assert!(ratio.is_finite() || ratio == f64::INFINITY, "{m:?}");
    }
}

fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let t = start() + chrono::Duration::minutes(5 * i as i64);
            Bar::new(t, c, c + 0.1, c, c, 100.0)
        })
        .collect()
}

#[test]
fn zero_close_signal_is_discarded_and_result_stays_finite() {
    use signalbench_core::components::signal::SmaCrossover;
    use signalbench_core::components::SignalGenerator;

    let bars = bars_from_closes(&[1.0, 2.0, 3.0, 4.0, 0.0, 0.5, 0.5, 0.5]);
    let signals = SmaCrossover::new(1, 3).generate(&bars, "XAUUSD");
    assert!(signals.iter().any(|s| s.price == 0.0));

    let risk = signalbench_core::domain::RiskConfig::default();
    let outcome = run("XAUUSD", "sma_crossover", &signals, &bars, &risk, 10_000.0).unwrap();
    let result = completed(outcome);

    assert!(result.trades.iter().all(|t| t.entry_price > 0.0));
    assert_eq!(result.trades.len() + result.discarded_signals, result.signal_count);
    assert!(result.discarded_signals >= 1);
    assert_finite_or_sentinel(&result);

    let json = export_json(&result).unwrap();
    assert!(!json.contains("\"final_capital\": null"));
    assert!(!json.contains("\"total_pnl\": null"));
}

#[test]
fn csv_with_zero_close_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let bars = bars_from_closes(&[1.0, 2.0, 0.0, 1.0]);
    write_csv(dir.path(), "XAUUSD", &bars);
    let (_d, mut config) = setup("[strategy]\nid = \"sma_crossover\"\n");
    config.backtest.data_dir = dir.path().to_path_buf();
    assert!(matches!(run_from_config(&config), Err(RunError::Data(_))));
}

#[test]
fn generated_runs_have_no_nan() {
    for id in ["vwap_ib", "sma_crossover", "rsi_oversold", "mean_reversion"] {
        let (_dir, config) = setup(&format!("[strategy]\nid = \"{id}\"\n"));
        if let Some(result) = run_from_config(&config).unwrap().result() {
            assert_finite_or_sentinel(result);
        }
    }
}
