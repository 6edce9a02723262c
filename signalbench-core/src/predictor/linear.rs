//! Logistic-regression predictor over the engineered features.
//!
//! The model file is JSON:
//!
//! ```json
//! { "intercept": -0.2, "weights": { "volume_ratio": 0.8, "rsi_extremeness": 1.1 } }
//! ```
//!
//! Features the model names but the signal lacks contribute 0.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::features::signal_features;
use super::{clamp_confidence, ConfidencePredictor};
use crate::domain::{Bar, Signal};

#[derive(Debug, Error)]
pub enum PredictorError {
    #[error("failed to read model file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid model JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("model weight `{0}` is not finite")]
    NonFiniteWeight(String),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LinearModel {
    #[serde(default)]
    pub intercept: f64,
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default)]
pub struct LinearPredictor {
    model: LinearModel,
}

impl LinearPredictor {
    pub fn new(model: LinearModel) -> Result<Self, PredictorError> {
        if !model.intercept.is_finite() {
            return Err(PredictorError::NonFiniteWeight("intercept".into()));
        }
        if let Some((name, _)) = model.weights.iter().find(|(_, w)| !w.is_finite()) {
            return Err(PredictorError::NonFiniteWeight(name.clone()));
        }
        Ok(Self { model })
    }

    pub fn from_json(json: &str) -> Result<Self, PredictorError> {
        Self::new(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PredictorError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| PredictorError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn model(&self) -> &LinearModel {
        &self.model
    }
}

impl ConfidencePredictor for LinearPredictor {
    /// A model with no weights is treated as untrained.
    fn is_trained(&self) -> bool {
        !self.model.weights.is_empty()
    }

    fn predict(&self, signal: &Signal, context: &[Bar], strategy_type: &str) -> f64 {
        let features = signal_features(signal, context, strategy_type);
        let z = self.model.weights.iter().fold(self.model.intercept, |acc, (name, w)| {
            acc + w * features.get(name).copied().unwrap_or(0.0)
        });
        clamp_confidence(1.0 / (1.0 + (-z).exp()))
    }
}
