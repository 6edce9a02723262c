//! Bar loading for the runner.
//!
//! The core never reads files; it receives `&[Bar]`. This module supplies the
//! [`DataSource`] seam and one concrete implementation reading per-asset CSV
//! files from a directory:
//!
//! ```text
//! datetime,open,high,low,close,volume
//! 2024-01-02 13:30:00,2061.1,2062.4,2060.8,2062.0,1834
//! ```
//!
//! A file is looked up as `<dir>/<ASSET>.csv`, then `<dir>/<ASSET>_5M.csv`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use signalbench_core::domain::Bar;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no data for asset '{0}'")]
    AssetNotFound(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("{path}, row {row}: {reason}")]
    Malformed {
        path: String,
        row: usize,
        reason: String,
    },
}

/// Read-only source of per-asset bar histories.
pub trait DataSource: Send + Sync {
    /// Bars for `asset_id`, strictly increasing by timestamp.
    fn load(&self, asset_id: &str) -> Result<Vec<Bar>, LoadError>;

    /// Every asset this source can load, sorted.
    fn assets(&self) -> Result<Vec<String>, LoadError>;
}

/// Directory of `<ASSET>.csv` / `<ASSET>_5M.csv` files.
#[derive(Debug, Clone)]
pub struct CsvDataSource {
    dir: PathBuf,
}

const TIMEFRAME_SUFFIX: &str = "_5M";

#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    #[serde(alias = "timestamp", alias = "date")]
    datetime: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl CsvDataSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn resolve(&self, asset_id: &str) -> Option<PathBuf> {
        [
            format!("{asset_id}.csv"),
            format!("{asset_id}{TIMEFRAME_SUFFIX}.csv"),
        ]
        .into_iter()
        .map(|name| self.dir.join(name))
        .find(|p| p.is_file())
    }
}

impl DataSource for CsvDataSource {
    fn load(&self, asset_id: &str) -> Result<Vec<Bar>, LoadError> {
        let path = self
            .resolve(asset_id)
            .ok_or_else(|| LoadError::AssetNotFound(asset_id.to_string()))?;
        let bars = read_bars_csv(&path)?;
        tracing::debug!(asset_id, path = %path.display(), bars = bars.len(), "bars loaded");
        Ok(bars)
    }

    fn assets(&self) -> Result<Vec<String>, LoadError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|source| LoadError::Io {
            path: self.dir.display().to_string(),
            source,
        })?;
        let mut assets: Vec<String> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "csv"))
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .map(|stem| match stem.strip_suffix(TIMEFRAME_SUFFIX) {
                Some(asset) => asset.to_string(),
                None => stem,
            })
            .collect();
        assets.sort();
        assets.dedup();
        Ok(assets)
    }
}

/// Parse one CSV file into validated bars.
///
/// Rejects non-finite values, non-positive prices, bars whose high/low do not
/// bracket open and close, and timestamps that do not strictly increase.
pub fn read_bars_csv(path: &Path) -> Result<Vec<Bar>, LoadError> {
    let display = path.display().to_string();
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| LoadError::Csv {
            path: display.clone(),
            source,
        })?;

    let mut bars: Vec<Bar> = Vec::new();
    for (i, record) in reader.deserialize::<CsvRow>().enumerate() {
        // Header is row 1.
        let row = i + 2;
        let malformed = |reason: String| LoadError::Malformed {
            path: display.clone(),
            row,
            reason,
        };
        let r = record.map_err(|source| LoadError::Csv {
            path: display.clone(),
            source,
        })?;
        let timestamp = parse_datetime(&r.datetime)
            .ok_or_else(|| malformed(format!("unrecognized datetime '{}'", r.datetime)))?;
        let bar = Bar::new(timestamp, r.open, r.high, r.low, r.close, r.volume);
        if !bar.is_finite() {
            return Err(malformed("non-finite value".into()));
        }
        if [bar.open, bar.high, bar.low, bar.close].iter().any(|&p| p <= 0.0) {
            return Err(malformed("non-positive price".into()));
        }
        if !bar.is_sane() {
            return Err(malformed("inconsistent OHLC or negative volume".into()));
        }
        if let Some(prev) = bars.last() {
            if bar.timestamp <= prev.timestamp {
                return Err(malformed(format!(
                    "timestamp {} does not follow {}",
                    bar.timestamp, prev.timestamp
                )));
            }
        }
        bars.push(bar);
    }
    Ok(bars)
}

/// Write bars in the layout `read_bars_csv` accepts.
pub fn write_bars_csv(path: &Path, bars: &[Bar]) -> Result<(), LoadError> {
    let display = path.display().to_string();
    let csv_err = |source| LoadError::Csv {
        path: display.clone(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    for b in bars {
        writer
            .serialize(CsvRow {
                datetime: b.timestamp.format(DATETIME_FORMAT).to_string(),
                open: b.open,
                high: b.high,
                low: b.low,
                close: b.close,
                volume: b.volume,
            })
            .map_err(csv_err)?;
    }
    writer.flush().map_err(|source| LoadError::Io {
        path: display.clone(),
        source,
    })
}

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// `%Y-%m-%d %H:%M:%S`, `%Y-%m-%dT%H:%M:%S`, or RFC 3339 (converted to UTC).
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    [DATETIME_FORMAT, "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_utc()))
}
