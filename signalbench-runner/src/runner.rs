//! Backtest runner — wires together registry, generator, simulator and metrics.
//!
//! Entry points:
//! - `run()`: signals + bars in, result out. No I/O, no strategy lookup.
//! - `run_backtest()`: loads bars from a `DataSource`, then runs. Used by CLI.
//! - `run_backtest_from_bars()`: takes pre-loaded bars. Used by batch mode.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use signalbench_core::components::{
    RegistryError, SignalGenerator, StrategyRegistry, ValidatedSignalGenerator, ValidationStats,
};
use signalbench_core::domain::{Bar, RiskConfig, Signal, Trade};
use signalbench_core::engine::simulate;
use signalbench_core::predictor::{
    ConfidencePredictor, LinearPredictor, PredictorError, UntrainedPredictor,
};
use signalbench_core::ConfigurationError;

use crate::config::{BacktestConfig, ConfigError, ValidationSection};
use crate::data_loader::{DataSource, LoadError};
use crate::metrics::PerformanceMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("predictor error: {0}")]
    Predictor(#[from] PredictorError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// BLAKE3 over the run inputs; equal inputs give equal ids.
    pub run_id: String,
    pub asset_id: String,
    pub strategy_id: String,
    pub starting_capital: f64,
    pub final_capital: f64,
    /// (final - starting) / starting.
    pub total_return: f64,
    pub risk: RiskConfig,
    pub signal_count: usize,
    pub bar_count: usize,
    /// Signals with no later bar to exit on.
    pub discarded_signals: usize,
    pub trades: Vec<Trade>,
    pub metrics: PerformanceMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationStats>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Outcome of a run: zero signals is an explicit empty result, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum BacktestOutcome {
    NoSignals,
    Completed(Box<BacktestResult>),
}

impl BacktestOutcome {
    pub fn result(&self) -> Option<&BacktestResult> {
        match self {
            BacktestOutcome::NoSignals => None,
            BacktestOutcome::Completed(r) => Some(&**r),
        }
    }

    pub fn into_result(self) -> Option<BacktestResult> {
        match self {
            BacktestOutcome::NoSignals => None,
            BacktestOutcome::Completed(r) => Some(*r),
        }
    }
}

/// Simulate `signals` over `bars` and summarize.
///
/// Signals may arrive in any order; the simulator sorts them stably.
pub fn run(
    asset_id: &str,
    strategy_id: &str,
    signals: &[Signal],
    bars: &[Bar],
    risk: &RiskConfig,
    starting_capital: f64,
) -> Result<BacktestOutcome, RunError> {
    if signals.is_empty() {
        info!(asset_id, strategy_id, "no signals generated");
        return Ok(BacktestOutcome::NoSignals);
    }

    let sim = simulate(signals, bars, risk, starting_capital)?;
    if sim.discarded > 0 {
        warn!(asset_id, discarded = sim.discarded, "signals without a later bar were skipped");
    }
    let metrics = PerformanceMetrics::summarize(&sim.trades);
    let total_return = (sim.final_capital - starting_capital) / starting_capital;
    let run_id = run_id(asset_id, strategy_id, signals, bars, risk, starting_capital);

    info!(
        asset_id,
        strategy_id,
        trades = sim.trades.len(),
        final_capital = sim.final_capital,
        win_rate = metrics.win_rate,
        "backtest complete"
    );

    Ok(BacktestOutcome::Completed(Box::new(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        asset_id: asset_id.to_string(),
        strategy_id: strategy_id.to_string(),
        starting_capital,
        final_capital: sim.final_capital,
        total_return,
        risk: *risk,
        signal_count: signals.len(),
        bar_count: bars.len(),
        discarded_signals: sim.discarded,
        trades: sim.trades,
        metrics,
        validation: None,
    })))
}

/// Run the configured backtest, loading bars for `config.backtest.asset`.
pub fn run_backtest(
    config: &BacktestConfig,
    registry: &StrategyRegistry,
    source: &dyn DataSource,
) -> Result<BacktestOutcome, RunError> {
    config.validate()?;
    let asset_id = &config.backtest.asset;
    let bars = source.load(asset_id)?;
    let predictor = load_predictor(&config.validation)?;
    run_backtest_from_bars(config, registry, predictor, asset_id, &bars)
}

/// Run the configured strategy on pre-loaded bars without any I/O.
///
/// `predictor` is only consulted when validation is enabled.
pub fn run_backtest_from_bars(
    config: &BacktestConfig,
    registry: &StrategyRegistry,
    predictor: Arc<dyn ConfidencePredictor>,
    asset_id: &str,
    bars: &[Bar],
) -> Result<BacktestOutcome, RunError> {
    let strategy_id = config.strategy.id.as_str();
    let inner = registry.get(strategy_id, &config.strategy.params)?;

    let (signals, validation) = if config.validation.enabled {
        let wrapper =
            ValidatedSignalGenerator::new(inner, predictor, config.validation.to_config());
        match wrapper.score(bars, asset_id) {
            Some(scored) => {
                let stats = ValidationStats::from_signals(&scored);
                let kept: Vec<Signal> = scored
                    .into_iter()
                    .filter(|s| s.ml_validated == Some(true))
                    .collect();
                (kept, Some(stats))
            }
            None => (wrapper.generate(bars, asset_id), None),
        }
    } else {
        (inner.generate(bars, asset_id), None)
    };

    let risk = config.risk_for(asset_id);
    let outcome = run(
        asset_id,
        strategy_id,
        &signals,
        bars,
        &risk,
        config.backtest.starting_capital,
    )?;
    Ok(match outcome {
        BacktestOutcome::Completed(mut result) => {
            result.validation = validation;
            BacktestOutcome::Completed(result)
        }
        BacktestOutcome::NoSignals => BacktestOutcome::NoSignals,
    })
}

/// Linear model from `model_path`, or the untrained stand-in when unset.
pub fn load_predictor(
    validation: &ValidationSection,
) -> Result<Arc<dyn ConfidencePredictor>, RunError> {
    match &validation.model_path {
        Some(path) if validation.enabled => Ok(Arc::new(LinearPredictor::load(path)?)),
        _ => Ok(Arc::new(UntrainedPredictor)),
    }
}

/// Deterministic run id: BLAKE3 over the run inputs.
pub fn run_id(
    asset_id: &str,
    strategy_id: &str,
    signals: &[Signal],
    bars: &[Bar],
    risk: &RiskConfig,
    starting_capital: f64,
) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(asset_id.as_bytes());
    hasher.update(&[0]);
    hasher.update(strategy_id.as_bytes());
    hasher.update(&[0]);
    hasher.update(&starting_capital.to_le_bytes());
    for v in [
        risk.position_size,
        risk.stop_loss_pct,
        risk.take_profit_pct,
        risk.commission_pct,
        risk.slippage_pct,
    ] {
        hasher.update(&v.to_le_bytes());
    }
    hasher.update(dataset_hash(bars).as_bytes());
    for s in signals {
        hasher.update(&s.timestamp.and_utc().timestamp().to_le_bytes());
        hasher.update(&s.direction.sign().to_le_bytes());
        hasher.update(&s.price.to_le_bytes());
        hasher.update(&s.ml_confidence.unwrap_or(-1.0).to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// BLAKE3 over every bar's timestamp and OHLCV.
pub fn dataset_hash(bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(&bar.timestamp.and_utc().timestamp().to_le_bytes());
        for v in [bar.open, bar.high, bar.low, bar.close, bar.volume] {
            hasher.update(&v.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}
