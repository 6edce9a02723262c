//! SignalBench Runner — backtest orchestration, metrics, and I/O.
//!
//! This crate builds on `signalbench-core` to provide:
//! - TOML backtest configuration with per-asset risk overrides
//! - A `DataSource` seam with CSV and synthetic implementations
//! - Single-backtest runner producing `BacktestResult` with metrics
//! - Parallel multi-asset batches and cross-asset comparison
//! - JSON / CSV / Markdown export

pub mod batch;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;
pub mod synthetic;

pub use batch::{compare_assets, run_batch, AssetComparison, AssetRun};
pub use config::{BacktestConfig, ConfigError, RiskOverride, ValidationSection};
pub use data_loader::{read_bars_csv, write_bars_csv, CsvDataSource, DataSource, LoadError};
pub use metrics::PerformanceMetrics;
pub use runner::{
    load_predictor, run, run_backtest, run_backtest_from_bars, BacktestOutcome, BacktestResult,
    RunError, SCHEMA_VERSION,
};
pub use synthetic::{generate_synthetic_bars, SyntheticDataSource};
