//! SignalBench CLI for backtesting and comparing strategies.
//!
//! Commands:
//! - `run`: backtest one strategy on one asset (TOML config and/or flags)
//! - `compare`: run one strategy across many assets in parallel
//! - `strategies list` / `strategies info <id>`: registry schemas as JSON
//! - `synth`: write deterministic synthetic bars as CSV

mod obs;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};

use signalbench_core::components::{ParamValue, StrategyRegistry};
use signalbench_runner::export::{
    export_comparison_csv, export_json, generate_report, save_artifacts,
};
use signalbench_runner::{
    compare_assets, generate_synthetic_bars, run_backtest, run_batch, write_bars_csv,
    BacktestConfig, BacktestOutcome, BacktestResult, CsvDataSource, DataSource,
    SyntheticDataSource,
};

#[derive(Parser)]
#[command(
    name = "signalbench",
    about = "SignalBench CLI — rule-based strategy backtesting"
)]
struct Cli {
    /// Log filter (overridden by SIGNALBENCH_LOG).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log format: text or json.
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by `run` and `compare`; each overrides the config file.
#[derive(clap::Args)]
struct RunArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Strategy id (see `strategies list`).
    #[arg(long)]
    strategy: Option<String>,

    /// Strategy parameter override, repeatable (e.g. --param fast_period=5).
    #[arg(long = "param", value_name = "NAME=VALUE")]
    params: Vec<String>,

    /// Directory of <ASSET>.csv / <ASSET>_5M.csv files.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Starting capital.
    #[arg(long)]
    capital: Option<f64>,

    /// Use deterministic synthetic bars instead of CSV files.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Bars per asset in synthetic mode.
    #[arg(long, default_value_t = 5_000)]
    bars: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest one strategy on one asset.
    Run {
        #[command(flatten)]
        args: RunArgs,

        /// Asset id (e.g. XAUUSD).
        #[arg(long)]
        asset: Option<String>,

        /// Write result.json and trades.csv under this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print the full result as JSON instead of a summary.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Print a Markdown report.
        #[arg(long, default_value_t = false)]
        report: bool,
    },
    /// Run one strategy across several assets and rank them.
    Compare {
        #[command(flatten)]
        args: RunArgs,

        /// Assets to compare; defaults to every asset in the data source.
        #[arg(long, value_delimiter = ',')]
        assets: Vec<String>,

        /// Print CSV instead of a table.
        #[arg(long, default_value_t = false)]
        csv: bool,
    },
    /// Inspect the strategy registry.
    Strategies {
        #[command(subcommand)]
        action: StrategiesAction,
    },
    /// Write deterministic synthetic 5-minute bars as CSV.
    Synth {
        /// Assets to generate.
        #[arg(required = true)]
        assets: Vec<String>,

        /// Number of bars per asset.
        #[arg(long, default_value_t = 5_000)]
        bars: usize,

        /// First bar timestamp (YYYY-MM-DDTHH:MM:SS).
        #[arg(long, default_value = "2024-01-01T00:00:00")]
        start: String,

        /// Output directory.
        #[arg(long, default_value = "data")]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum StrategiesAction {
    /// List every registered strategy with its parameter schema.
    List,
    /// Show one strategy's schema.
    Info { id: String },
}

const SYNTHETIC_ASSETS: [&str; 4] = ["BTCUSD", "ETHUSD", "EURUSD", "XAUUSD"];

fn main() -> Result<()> {
    let cli = Cli::parse();
    obs::init_tracing(&cli.log_level, &cli.log_format)?;

    match cli.command {
        Commands::Run {
            args,
            asset,
            output_dir,
            json,
            report,
        } => run_cmd(args, asset, output_dir, json, report),
        Commands::Compare { args, assets, csv } => compare_cmd(args, assets, csv),
        Commands::Strategies { action } => strategies_cmd(action),
        Commands::Synth {
            assets,
            bars,
            start,
            out,
        } => synth_cmd(&assets, bars, &start, out),
    }
}

/// Config file (if any) with command-line flags applied on top.
fn build_config(args: &RunArgs, asset: Option<&str>) -> Result<BacktestConfig> {
    let mut config = match &args.config {
        Some(path) => BacktestConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => {
            let Some(strategy) = &args.strategy else {
                bail!("one of --config or --strategy is required");
            };
            BacktestConfig::new(asset.unwrap_or("XAUUSD"), strategy)
        }
    };

    if let Some(strategy) = &args.strategy {
        if *strategy != config.strategy.id {
            config.strategy.params.clear();
        }
        config.strategy.id = strategy.clone();
    }
    if let Some(asset) = asset {
        config.backtest.asset = asset.to_string();
    }
    if let Some(dir) = &args.data_dir {
        config.backtest.data_dir = dir.clone();
    }
    if let Some(capital) = args.capital {
        config.backtest.starting_capital = capital;
    }
    for raw in &args.params {
        let Some((name, value)) = raw.split_once('=') else {
            bail!("--param expects NAME=VALUE, got '{raw}'");
        };
        config
            .strategy
            .params
            .insert(name.trim().to_string(), ParamValue::parse(value.trim()));
    }
    config.validate()?;
    tracing::debug!(
        asset = %config.backtest.asset,
        strategy = %config.strategy.id,
        params = config.strategy.params.len(),
        "configuration resolved"
    );
    Ok(config)
}

fn data_source(args: &RunArgs, config: &BacktestConfig) -> Result<Box<dyn DataSource>> {
    if args.synthetic {
        let start = parse_start("2024-01-01T00:00:00")?;
        let mut assets: Vec<String> = SYNTHETIC_ASSETS.iter().map(|s| s.to_string()).collect();
        assets.push(config.backtest.asset.clone());
        return Ok(Box::new(SyntheticDataSource::new(assets, start, args.bars)));
    }
    Ok(Box::new(CsvDataSource::new(&config.backtest.data_dir)))
}

fn run_cmd(
    args: RunArgs,
    asset: Option<String>,
    output_dir: Option<PathBuf>,
    json: bool,
    report: bool,
) -> Result<()> {
    let config = build_config(&args, asset.as_deref())?;
    let source = data_source(&args, &config)?;
    let registry = StrategyRegistry::with_defaults();

    let result = match run_backtest(&config, &registry, source.as_ref())? {
        BacktestOutcome::NoSignals => {
            println!(
                "No signals: {} produced nothing on {}",
                config.strategy.id, config.backtest.asset
            );
            return Ok(());
        }
        BacktestOutcome::Completed(result) => result,
    };

    if json {
        println!("{}", export_json(&result)?);
    } else if report {
        print!("{}", generate_report(&result));
    } else {
        print_summary(&result);
    }

    if let Some(dir) = output_dir {
        let run_dir = save_artifacts(&result, &dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn compare_cmd(args: RunArgs, assets: Vec<String>, csv: bool) -> Result<()> {
    let config = build_config(&args, None)?;
    let source = data_source(&args, &config)?;
    let assets = if assets.is_empty() {
        source.assets().context("listing assets")?
    } else {
        assets
    };
    if assets.is_empty() {
        bail!("no assets found in {}", config.backtest.data_dir.display());
    }

    let registry = StrategyRegistry::with_defaults();
    let runs = run_batch(&config, &registry, source.as_ref(), &assets)?;
    for run in &runs {
        match &run.outcome {
            Err(e) => eprintln!("{}: {e}", run.asset_id),
            Ok(BacktestOutcome::NoSignals) => eprintln!("{}: no signals", run.asset_id),
            Ok(BacktestOutcome::Completed(_)) => {}
        }
    }
    let rows = compare_assets(&runs);

    if csv {
        print!("{}", export_comparison_csv(&rows)?);
        return Ok(());
    }

    println!(
        "{:<10} {:>7} {:>10} {:>8} {:>8} {:>8} {:>8}",
        "asset", "trades", "return", "win", "pf", "sharpe", "max_dd"
    );
    for r in &rows {
        println!(
            "{:<10} {:>7} {:>9.2}% {:>7.1}% {:>8} {:>8.3} {:>7.2}%",
            r.asset_id,
            r.trade_count,
            r.total_return * 100.0,
            r.win_rate * 100.0,
            fmt_ratio(r.profit_factor),
            r.sharpe_ratio,
            r.max_drawdown * 100.0
        );
    }
    Ok(())
}

fn strategies_cmd(action: StrategiesAction) -> Result<()> {
    let registry = StrategyRegistry::with_defaults();
    let json = match action {
        StrategiesAction::List => serde_json::to_string_pretty(&registry.list())?,
        StrategiesAction::Info { id } => serde_json::to_string_pretty(registry.info(&id)?)?,
    };
    println!("{json}");
    Ok(())
}

fn synth_cmd(assets: &[String], bars: usize, start: &str, out: PathBuf) -> Result<()> {
    let start = parse_start(start)?;
    std::fs::create_dir_all(&out)
        .with_context(|| format!("failed to create {}", out.display()))?;

    for asset in assets {
        let path = out.join(format!("{asset}.csv"));
        write_bars_csv(&path, &generate_synthetic_bars(asset, start, bars))
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Wrote {bars} bars to {}", path.display());
    }
    Ok(())
}

fn parse_start(raw: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .with_context(|| format!("invalid --start '{raw}', expected YYYY-MM-DDTHH:MM:SS"))
}

fn fmt_ratio(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.2}")
    } else {
        "inf".to_string()
    }
}

fn print_summary(result: &BacktestResult) {
    let m = &result.metrics;
    println!("=== Backtest: {} on {} ===", result.strategy_id, result.asset_id);
    println!("Run id:          {}", result.run_id);
    println!("Bars / signals:  {} / {}", result.bar_count, result.signal_count);
    println!(
        "Capital:         {:.2} -> {:.2} ({:+.2}%)",
        result.starting_capital,
        result.final_capital,
        result.total_return * 100.0
    );
    println!("Trades:          {}", m.trade_count);
    println!("Win rate:        {:.1}%", m.win_rate * 100.0);
    println!("Profit factor:   {}", fmt_ratio(m.profit_factor));
    println!("Sharpe:          {:.3}", m.sharpe_ratio);
    println!("Max drawdown:    {:.2}%", m.max_drawdown * 100.0);
    println!("Avg duration:    {:.0} min", m.avg_trade_duration / 60.0);
    if let Some(v) = &result.validation {
        println!(
            "ML validation:   {}/{} accepted (mean confidence {:.3})",
            v.accepted, v.total, v.avg_confidence
        );
    }
}
