//! Reporting and export — JSON, CSV, and Markdown artifact generation.
//!
//! All persisted artifacts include a `schema_version` field. Unknown versions
//! are rejected on load. Non-finite floats never reach the output: JSON
//! writes them as `null` and CSV leaves the cell empty.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use signalbench_core::domain::{Signal, Trade};

use crate::batch::AssetComparison;
use crate::runner::{BacktestResult, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

/// Signals as pretty JSON, in generation order.
pub fn export_signals_json(signals: &[Signal]) -> Result<String> {
    serde_json::to_string_pretty(signals).context("failed to serialize signals to JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

fn cell(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.6}")
    } else {
        String::new()
    }
}

fn opt_cell(v: Option<f64>) -> String {
    v.map(cell).unwrap_or_default()
}

/// Export a trade tape as CSV.
///
/// Columns: asset_id, direction, entry_time, exit_time, entry_price,
/// exit_price, exit_reason, pnl, pnl_pct, capital_after, ml_confidence,
/// ml_validated
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "asset_id",
        "direction",
        "entry_time",
        "exit_time",
        "entry_price",
        "exit_price",
        "exit_reason",
        "pnl",
        "pnl_pct",
        "capital_after",
        "ml_confidence",
        "ml_validated",
    ])?;

    for t in trades {
        wtr.write_record([
            t.asset_id.clone(),
            t.direction.to_string(),
            t.entry_time.to_string(),
            t.exit_time.to_string(),
            cell(t.entry_price),
            cell(t.exit_price),
            t.exit_reason.to_string(),
            cell(t.pnl),
            cell(t.pnl_pct),
            cell(t.capital_after),
            opt_cell(t.ml_confidence),
            t.ml_validated.map(|v| v.to_string()).unwrap_or_default(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Cross-asset comparison table as CSV. Infinite profit factors are empty cells.
pub fn export_comparison_csv(rows: &[AssetComparison]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "asset_id",
        "trade_count",
        "total_return",
        "win_rate",
        "profit_factor",
        "sharpe_ratio",
        "max_drawdown",
        "final_capital",
    ])?;
    for r in rows {
        wtr.write_record([
            r.asset_id.clone(),
            r.trade_count.to_string(),
            cell(r.total_return),
            cell(r.win_rate),
            cell(r.profit_factor),
            cell(r.sharpe_ratio),
            cell(r.max_drawdown),
            cell(r.final_capital),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the artifact set for a single run.
///
/// Creates `{asset}_{strategy}_{run_id prefix}/` under `output_dir` holding
/// `result.json` and `trades.csv`. The name depends only on the inputs, so a
/// repeated run overwrites its own artifacts.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let prefix = result.run_id.get(..12).unwrap_or(&result.run_id);
    let dirname = format!("{}_{}_{}", result.asset_id, result.strategy_id, prefix);
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let json = export_json(result)?;
    std::fs::write(run_dir.join("result.json"), json)
        .with_context(|| format!("failed to write result.json in {}", run_dir.display()))?;

    let trades_csv = export_trades_csv(&result.trades)?;
    std::fs::write(run_dir.join("trades.csv"), trades_csv)
        .with_context(|| format!("failed to write trades.csv in {}", run_dir.display()))?;

    Ok(run_dir)
}

/// Load a `BacktestResult` from an artifact directory's result.json.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let path = dir.join("result.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

// ─── Markdown report ────────────────────────────────────────────────

fn ratio(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.2}")
    } else {
        "inf".to_string()
    }
}

/// Markdown summary of a single run.
pub fn generate_report(result: &BacktestResult) -> String {
    let m = &result.metrics;
    let mut md = String::with_capacity(1024);

    md.push_str("# Backtest Report\n\n");
    md.push_str("| Field | Value |\n| --- | --- |\n");
    md.push_str(&format!("| Asset | {} |\n", result.asset_id));
    md.push_str(&format!("| Strategy | {} |\n", result.strategy_id));
    md.push_str(&format!("| Run | {} |\n", result.run_id));
    md.push_str(&format!("| Bars | {} |\n", result.bar_count));
    md.push_str(&format!(
        "| Signals | {} ({} discarded) |\n",
        result.signal_count, result.discarded_signals
    ));
    md.push_str(&format!(
        "| Capital | {:.2} -> {:.2} |\n",
        result.starting_capital, result.final_capital
    ));
    md.push('\n');

    md.push_str("## Performance\n\n");
    md.push_str("| Metric | Value |\n| --- | --- |\n");
    md.push_str(&format!("| Total Return | {:.2}% |\n", result.total_return * 100.0));
    md.push_str(&format!("| Trades | {} |\n", m.trade_count));
    md.push_str(&format!("| Win Rate | {:.1}% |\n", m.win_rate * 100.0));
    md.push_str(&format!("| Profit Factor | {} |\n", ratio(m.profit_factor)));
    md.push_str(&format!("| Risk/Reward | {} |\n", ratio(m.risk_reward_ratio)));
    md.push_str(&format!("| Sharpe | {:.3} |\n", m.sharpe_ratio));
    md.push_str(&format!("| Max Drawdown | {:.2}% |\n", m.max_drawdown * 100.0));
    md.push_str(&format!("| Expectancy | {:.2} |\n", m.expectancy));
    md.push_str(&format!(
        "| Avg Duration | {:.0} min |\n",
        m.avg_trade_duration / 60.0
    ));
    md.push_str(&format!(
        "| Streaks (W/L) | {} / {} |\n",
        m.max_consecutive_wins, m.max_consecutive_losses
    ));
    for (reason, count) in &m.exit_reasons {
        md.push_str(&format!("| Exits: {reason} | {count} |\n"));
    }
    md.push('\n');

    if let Some(v) = &result.validation {
        md.push_str("## ML Validation\n\n");
        md.push_str(&format!(
            "{} of {} signals accepted ({:.1}%), mean confidence {:.3}\n\n",
            v.accepted,
            v.total,
            v.acceptance_rate * 100.0,
            v.avg_confidence
        ));
    }

    md
}
