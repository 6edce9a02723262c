//! Strategy parameter schema and override resolution.
//!
//! A schema declares each parameter's kind, default and optional bounds.
//! Resolution merges caller overrides onto the defaults and type-checks them,
//! so constructors only ever see a complete, validated [`Params`].

use crate::error::ConfigurationError;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A raw parameter value as it arrives from TOML, JSON or the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl ParamValue {
    fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Bool(_) => "bool",
            ParamValue::Number(_) => "number",
            ParamValue::Text(_) => "string",
        }
    }

    /// Parse a CLI-style `value` string: bool, then number, then text.
    pub fn parse(raw: &str) -> Self {
        if let Ok(b) = raw.parse::<bool>() {
            ParamValue::Bool(b)
        } else if let Ok(n) = raw.parse::<f64>() {
            ParamValue::Number(n)
        } else {
            ParamValue::Text(raw.to_string())
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Number(n) => write!(f, "{n}"),
            ParamValue::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Number(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Number,
    Integer,
    Percent,
    /// Time of day, "HH:MM".
    Time,
    Bool,
}

impl ParamKind {
    fn expected(self) -> &'static str {
        match self {
            ParamKind::Number => "number",
            ParamKind::Integer => "integer",
            ParamKind::Percent => "percent",
            ParamKind::Time => "time (HH:MM)",
            ParamKind::Bool => "bool",
        }
    }
}

/// One entry of a strategy's parameter schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    #[serde(rename = "type")]
    pub kind: ParamKind,
    pub default: ParamValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    pub description: String,
}

impl ParamSpec {
    pub fn integer(default: usize, min: usize, max: usize, description: &str) -> Self {
        Self {
            kind: ParamKind::Integer,
            default: ParamValue::Number(default as f64),
            min: Some(min as f64),
            max: Some(max as f64),
            description: description.to_string(),
        }
    }

    pub fn number(default: f64, min: f64, max: f64, description: &str) -> Self {
        Self {
            kind: ParamKind::Number,
            default: ParamValue::Number(default),
            min: Some(min),
            max: Some(max),
            description: description.to_string(),
        }
    }

    pub fn time(default: &str, description: &str) -> Self {
        Self {
            kind: ParamKind::Time,
            default: ParamValue::Text(default.to_string()),
            min: None,
            max: None,
            description: description.to_string(),
        }
    }

    /// Type- and range-check a value against this spec.
    fn check(&self, name: &str, value: &ParamValue) -> Result<(), ConfigurationError> {
        let wrong_type = || ConfigurationError::WrongType {
            name: name.to_string(),
            expected: self.kind.expected(),
            got: format!("{} {value}", value.type_name()),
        };

        match (self.kind, value) {
            (ParamKind::Bool, ParamValue::Bool(_)) => Ok(()),
            (ParamKind::Time, ParamValue::Text(s)) => parse_time(name, s).map(|_| ()),
            (ParamKind::Number | ParamKind::Percent | ParamKind::Integer, ParamValue::Number(n)) => {
                if !n.is_finite() || (self.kind == ParamKind::Integer && n.fract() != 0.0) {
                    return Err(wrong_type());
                }
                let min = self.min.unwrap_or(f64::NEG_INFINITY);
                let max = self.max.unwrap_or(f64::INFINITY);
                if *n < min || *n > max {
                    return Err(ConfigurationError::OutOfRange {
                        name: name.to_string(),
                        value: *n,
                        min,
                        max,
                    });
                }
                Ok(())
            }
            _ => Err(wrong_type()),
        }
    }
}

/// Declared parameters of one strategy, keyed by name.
pub type ParamSchema = BTreeMap<String, ParamSpec>;

/// Caller-supplied overrides, keyed by name.
pub type Overrides = BTreeMap<String, ParamValue>;

/// A complete, validated parameter set.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Params {
    values: BTreeMap<String, ParamValue>,
}

impl Params {
    /// Merge `overrides` onto the schema defaults.
    ///
    /// Unknown names, wrong types and out-of-range values are rejected; the
    /// defaults themselves are trusted.
    pub fn resolve(
        strategy: &str,
        schema: &ParamSchema,
        overrides: &Overrides,
    ) -> Result<Self, ConfigurationError> {
        let mut values: BTreeMap<String, ParamValue> = schema
            .iter()
            .map(|(name, spec)| (name.clone(), spec.default.clone()))
            .collect();

        for (name, value) in overrides {
            let spec = schema
                .get(name)
                .ok_or_else(|| ConfigurationError::UnknownParameter {
                    strategy: strategy.to_string(),
                    name: name.clone(),
                })?;
            spec.check(name, value)?;
            values.insert(name.clone(), value.clone());
        }
        Ok(Self { values })
    }

    fn get(&self, name: &str) -> Result<&ParamValue, ConfigurationError> {
        self.values
            .get(name)
            .ok_or_else(|| ConfigurationError::Constraint(format!("missing parameter `{name}`")))
    }

    pub fn number(&self, name: &str) -> Result<f64, ConfigurationError> {
        match self.get(name)? {
            ParamValue::Number(n) => Ok(*n),
            other => Err(ConfigurationError::WrongType {
                name: name.to_string(),
                expected: "number",
                got: other.to_string(),
            }),
        }
    }

    pub fn integer(&self, name: &str) -> Result<usize, ConfigurationError> {
        let n = self.number(name)?;
        if n < 0.0 || n.fract() != 0.0 {
            return Err(ConfigurationError::WrongType {
                name: name.to_string(),
                expected: "integer",
                got: n.to_string(),
            });
        }
        Ok(n as usize)
    }

    pub fn time(&self, name: &str) -> Result<NaiveTime, ConfigurationError> {
        match self.get(name)? {
            ParamValue::Text(s) => parse_time(name, s),
            other => Err(ConfigurationError::WrongType {
                name: name.to_string(),
                expected: "time (HH:MM)",
                got: other.to_string(),
            }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.values.iter()
    }
}

/// Parse "HH:MM" (or "HH:MM:SS") into a time of day.
pub fn parse_time(name: &str, raw: &str) -> Result<NaiveTime, ConfigurationError> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| ConfigurationError::InvalidTime {
            name: name.to_string(),
            value: raw.to_string(),
        })
}
