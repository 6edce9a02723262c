//! Multi-asset batch runs and cross-asset comparison.
//!
//! Each asset is an independent job: it owns its bars, builds its own
//! generator from the shared registry, and resolves its own risk rules.
//! Jobs fan out across the rayon pool; results come back in asset order.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use signalbench_core::components::StrategyRegistry;

use crate::config::BacktestConfig;
use crate::data_loader::DataSource;
use crate::metrics::infinite_as_null;
use crate::runner::{load_predictor, run_backtest_from_bars, BacktestOutcome, RunError};

/// One asset's outcome within a batch.
#[derive(Debug)]
pub struct AssetRun {
    pub asset_id: String,
    pub outcome: Result<BacktestOutcome, RunError>,
}

/// Run `config`'s strategy on every asset in `assets`, in parallel.
///
/// `config.backtest.asset` is ignored; per-asset risk overrides apply. A
/// failure on one asset does not stop the others.
pub fn run_batch(
    config: &BacktestConfig,
    registry: &StrategyRegistry,
    source: &dyn DataSource,
    assets: &[String],
) -> Result<Vec<AssetRun>, RunError> {
    config.validate()?;
    let predictor = load_predictor(&config.validation)?;

    let runs = assets
        .par_iter()
        .map(|asset_id| {
            let outcome = source.load(asset_id).map_err(RunError::from).and_then(|bars| {
                run_backtest_from_bars(config, registry, predictor.clone(), asset_id, &bars)
            });
            if let Err(e) = &outcome {
                warn!(asset_id = %asset_id, error = %e, "asset run failed");
            }
            AssetRun {
                asset_id: asset_id.clone(),
                outcome,
            }
        })
        .collect();
    Ok(runs)
}

/// One row of a cross-asset comparison table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetComparison {
    pub asset_id: String,
    pub trade_count: usize,
    pub total_return: f64,
    pub win_rate: f64,
    #[serde(with = "infinite_as_null")]
    pub profit_factor: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub final_capital: f64,
}

/// Summarize completed runs, best total return first.
///
/// Assets that failed or produced no trades are left out.
pub fn compare_assets(runs: &[AssetRun]) -> Vec<AssetComparison> {
    let mut rows: Vec<AssetComparison> = runs
        .iter()
        .filter_map(|run| {
            let result = run.outcome.as_ref().ok()?.result()?;
            if result.trades.is_empty() {
                debug!(asset_id = %run.asset_id, "skipping asset without trades");
                return None;
            }
            Some(AssetComparison {
                asset_id: run.asset_id.clone(),
                trade_count: result.metrics.trade_count,
                total_return: result.total_return,
                win_rate: result.metrics.win_rate,
                profit_factor: result.metrics.profit_factor,
                sharpe_ratio: result.metrics.sharpe_ratio,
                max_drawdown: result.metrics.max_drawdown,
                final_capital: result.final_capital,
            })
        })
        .collect();
    rows.sort_by(|a, b| {
        b.total_return
            .total_cmp(&a.total_return)
            .then_with(|| a.asset_id.cmp(&b.asset_id))
    });
    rows
}
