//! Strategy registry — maps a strategy id to its parameter schema and a
//! constructor producing a boxed `SignalGenerator`.
//!
//! Constructors receive fully resolved [`Params`]; they only enforce rules
//! that span more than one parameter (fast < slow and the like).

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use super::params::{Overrides, ParamSchema, ParamSpec, Params};
use super::signal::{
    MeanReversion, RsiOversold, SessionWindows, SignalGenerator, SmaCrossover, VwapInitialBalance,
};
use crate::error::ConfigurationError;

// ─── Error type ──────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("strategy `{0}` not found")]
    StrategyNotFound(String),
    #[error("strategy `{0}` is already registered")]
    AlreadyRegistered(String),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

// ─── Types ───────────────────────────────────────────────────────────

pub type Constructor =
    Box<dyn Fn(&Params) -> Result<Box<dyn SignalGenerator>, ConfigurationError> + Send + Sync>;

/// Public description of a registered strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub parameters: ParamSchema,
}

struct Entry {
    info: StrategyInfo,
    constructor: Constructor,
}

#[derive(Default)]
pub struct StrategyRegistry {
    entries: BTreeMap<String, Entry>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with `vwap_ib`, `sma_crossover`, `rsi_oversold`
    /// and `mean_reversion`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for (info, constructor) in builtin_strategies() {
            registry
                .insert(info, constructor)
                .expect("built-in strategy ids are unique");
        }
        registry
    }

    pub fn register(
        &mut self,
        id: &str,
        constructor: Constructor,
        name: &str,
        description: &str,
        parameters: ParamSchema,
    ) -> Result<(), RegistryError> {
        let info = StrategyInfo {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            parameters,
        };
        self.insert(info, constructor)
    }

    fn insert(
        &mut self,
        info: StrategyInfo,
        constructor: Constructor,
    ) -> Result<(), RegistryError> {
        if self.entries.contains_key(&info.id) {
            return Err(RegistryError::AlreadyRegistered(info.id));
        }
        tracing::debug!(strategy = %info.id, "strategy registered");
        self.entries
            .insert(info.id.clone(), Entry { info, constructor });
        Ok(())
    }

    /// Build a generator with `overrides` merged onto the declared defaults.
    pub fn get(
        &self,
        id: &str,
        overrides: &Overrides,
    ) -> Result<Box<dyn SignalGenerator>, RegistryError> {
        let entry = self
            .entries
            .get(id)
            .ok_or_else(|| RegistryError::StrategyNotFound(id.to_string()))?;
        let params = Params::resolve(id, &entry.info.parameters, overrides)?;
        Ok((entry.constructor)(&params)?)
    }

    pub fn info(&self, id: &str) -> Result<&StrategyInfo, RegistryError> {
        self.entries
            .get(id)
            .map(|e| &e.info)
            .ok_or_else(|| RegistryError::StrategyNotFound(id.to_string()))
    }

    /// All strategies, ordered by id.
    pub fn list(&self) -> Vec<&StrategyInfo> {
        self.entries.values().map(|e| &e.info).collect()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }
}

// ─── Built-in strategies ─────────────────────────────────────────────

fn schema(entries: Vec<(&str, ParamSpec)>) -> ParamSchema {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

fn info(id: &str, name: &str, description: &str, parameters: ParamSchema) -> StrategyInfo {
    StrategyInfo {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        parameters,
    }
}

fn builtin_strategies() -> Vec<(StrategyInfo, Constructor)> {
    vec![
        entry(
            info(
                "vwap_ib",
                "VWAP + Initial Balance",
                "Breakout of the session's initial balance confirmed by trading-window VWAP",
                schema(vec![
                    ("ib_start", ParamSpec::time("13:30", "Initial Balance start (UTC)")),
                    ("ib_end", ParamSpec::time("14:30", "Initial Balance end (UTC)")),
                    ("session_start", ParamSpec::time("22:00", "Session start (UTC)")),
                    ("session_end", ParamSpec::time("20:00", "Session end (UTC)")),
                ]),
            ),
            Box::new(build_vwap_ib),
        ),
        entry(
            info(
                "sma_crossover",
                "SMA Crossover",
                "Fast SMA crossing the slow SMA",
                schema(vec![
                    ("fast_period", ParamSpec::integer(10, 5, 50, "Fast SMA window")),
                    ("slow_period", ParamSpec::integer(20, 10, 100, "Slow SMA window")),
                ]),
            ),
            Box::new(build_sma_crossover),
        ),
        entry(
            info(
                "rsi_oversold",
                "RSI Oversold/Overbought",
                "RSI extremes with a latch against repeated entries",
                schema(vec![
                    ("rsi_period", ParamSpec::integer(14, 7, 21, "RSI period")),
                    ("oversold", ParamSpec::number(30.0, 20.0, 40.0, "Oversold level")),
                    ("overbought", ParamSpec::number(70.0, 60.0, 80.0, "Overbought level")),
                ]),
            ),
            Box::new(build_rsi_oversold),
        ),
        entry(
            info(
                "mean_reversion",
                "Bollinger Mean Reversion",
                "Fade closes outside the Bollinger bands until price returns to the middle",
                schema(vec![
                    ("bb_period", ParamSpec::integer(20, 10, 50, "Bollinger window")),
                    (
                        "std_dev",
                        ParamSpec::number(2.0, 1.5, 3.0, "Band width in standard deviations"),
                    ),
                ]),
            ),
            Box::new(build_mean_reversion),
        ),
    ]
}

fn entry(info: StrategyInfo, constructor: Constructor) -> (StrategyInfo, Constructor) {
    (info, constructor)
}

fn build_vwap_ib(p: &Params) -> Result<Box<dyn SignalGenerator>, ConfigurationError> {
    let windows = SessionWindows {
        session_start: p.time("session_start")?,
        session_end: p.time("session_end")?,
        ib_start: p.time("ib_start")?,
        ib_end: p.time("ib_end")?,
    };
    let ib_from = windows.offset(windows.ib_start);
    let ib_to = windows.offset(windows.ib_end);
    if !windows.in_session(windows.ib_start) || ib_to <= ib_from {
        return Err(ConfigurationError::Constraint(
            "initial balance must be a non-empty window starting inside the session".into(),
        ));
    }
    Ok(Box::new(VwapInitialBalance::new(windows)))
}

fn build_sma_crossover(p: &Params) -> Result<Box<dyn SignalGenerator>, ConfigurationError> {
    let (fast, slow) = (p.integer("fast_period")?, p.integer("slow_period")?);
    if fast >= slow {
        return Err(ConfigurationError::Constraint(format!(
            "fast_period ({fast}) must be less than slow_period ({slow})"
        )));
    }
    Ok(Box::new(SmaCrossover::new(fast, slow)))
}

fn build_rsi_oversold(p: &Params) -> Result<Box<dyn SignalGenerator>, ConfigurationError> {
    let (oversold, overbought) = (p.number("oversold")?, p.number("overbought")?);
    if oversold >= overbought {
        return Err(ConfigurationError::Constraint(format!(
            "oversold ({oversold}) must be less than overbought ({overbought})"
        )));
    }
    Ok(Box::new(RsiOversold::new(
        p.integer("rsi_period")?,
        oversold,
        overbought,
    )))
}

fn build_mean_reversion(p: &Params) -> Result<Box<dyn SignalGenerator>, ConfigurationError> {
    Ok(Box::new(MeanReversion::new(
        p.integer("bb_period")?,
        p.number("std_dev")?,
    )))
}
