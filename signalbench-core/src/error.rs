//! Configuration error shared by the registry, the parameter layer and the
//! trade simulator.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("unknown parameter `{name}` for strategy `{strategy}`")]
    UnknownParameter { strategy: String, name: String },

    #[error("parameter `{name}` expects a {expected} value, got {got}")]
    WrongType {
        name: String,
        expected: &'static str,
        got: String,
    },

    #[error("parameter `{name}` = {value} is outside [{min}, {max}]")]
    OutOfRange {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("parameter `{name}`: invalid time of day `{value}` (expected HH:MM)")]
    InvalidTime { name: String, value: String },

    #[error("{0}")]
    Constraint(String),

    #[error("risk config `{field}` = {value}: {reason}")]
    InvalidRisk {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("starting capital must be positive and finite, got {0}")]
    InvalidCapital(f64),
}
