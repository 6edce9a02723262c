//! TOML backtest configuration.
//!
//! ```toml
//! [backtest]
//! asset = "XAUUSD"
//! data_dir = "data"
//! starting_capital = 10000.0
//!
//! [strategy]
//! id = "vwap_ib"
//! [strategy.params]
//! ib_start = "13:30"
//!
//! [risk]
//! position_size = 0.1
//! [risk.assets.BTCUSD]
//! commission_pct = 0.002
//!
//! [validation]
//! enabled = true
//! model_path = "models/vwap_ib.json"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use signalbench_core::components::{Overrides, ValidationConfig};
use signalbench_core::domain::RiskConfig;
use signalbench_core::ConfigurationError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error(transparent)]
    Risk(#[from] ConfigurationError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    pub strategy: StrategySection,
    #[serde(default)]
    pub risk: RiskSection,
    #[serde(default)]
    pub validation: ValidationSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSection {
    pub asset: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_starting_capital")]
    pub starting_capital: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySection {
    pub id: String,
    #[serde(default)]
    pub params: Overrides,
}

/// Default risk rules plus per-asset overrides.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RiskSection {
    #[serde(flatten)]
    pub defaults: RiskConfig,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub assets: BTreeMap<String, RiskOverride>,
}

/// Fields left unset fall back to the section defaults.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RiskOverride {
    pub position_size: Option<f64>,
    pub stop_loss_pct: Option<f64>,
    pub take_profit_pct: Option<f64>,
    pub commission_pct: Option<f64>,
    pub slippage_pct: Option<f64>,
}

impl RiskOverride {
    pub fn apply(&self, base: RiskConfig) -> RiskConfig {
        RiskConfig {
            position_size: self.position_size.unwrap_or(base.position_size),
            stop_loss_pct: self.stop_loss_pct.unwrap_or(base.stop_loss_pct),
            take_profit_pct: self.take_profit_pct.unwrap_or(base.take_profit_pct),
            commission_pct: self.commission_pct.unwrap_or(base.commission_pct),
            slippage_pct: self.slippage_pct.unwrap_or(base.slippage_pct),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSection {
    pub enabled: bool,
    pub confidence_threshold: f64,
    pub fallback_to_original: bool,
    /// JSON weights for the linear predictor; none means untrained.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_path: Option<PathBuf>,
}

impl Default for ValidationSection {
    fn default() -> Self {
        let base = ValidationConfig::default();
        Self {
            enabled: false,
            confidence_threshold: base.confidence_threshold,
            fallback_to_original: base.fallback_to_original,
            model_path: None,
        }
    }
}

impl ValidationSection {
    pub fn to_config(&self) -> ValidationConfig {
        ValidationConfig {
            confidence_threshold: self.confidence_threshold,
            fallback_to_original: self.fallback_to_original,
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_starting_capital() -> f64 {
    10_000.0
}

impl BacktestConfig {
    /// Minimal config for `asset` and `strategy_id` with every default.
    pub fn new(asset: &str, strategy_id: &str) -> Self {
        Self {
            backtest: BacktestSection {
                asset: asset.to_string(),
                data_dir: default_data_dir(),
                starting_capital: default_starting_capital(),
            },
            strategy: StrategySection {
                id: strategy_id.to_string(),
                params: Overrides::new(),
            },
            risk: RiskSection::default(),
            validation: ValidationSection::default(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Risk rules for `asset`: defaults with that asset's overrides applied.
    pub fn risk_for(&self, asset: &str) -> RiskConfig {
        match self.risk.assets.get(asset) {
            Some(o) => o.apply(self.risk.defaults),
            None => self.risk.defaults,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backtest.asset.trim().is_empty() {
            return Err(ConfigError::Invalid("backtest.asset must not be empty".into()));
        }
        if self.strategy.id.trim().is_empty() {
            return Err(ConfigError::Invalid("strategy.id must not be empty".into()));
        }
        let capital = self.backtest.starting_capital;
        if !capital.is_finite() || capital <= 0.0 {
            return Err(ConfigurationError::InvalidCapital(capital).into());
        }
        self.risk.defaults.validate()?;
        for asset in self.risk.assets.keys() {
            self.risk_for(asset).validate()?;
        }
        let threshold = self.validation.confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::Invalid(format!(
                "validation.confidence_threshold must be in [0, 1], got {threshold}"
            )));
        }
        Ok(())
    }
}
