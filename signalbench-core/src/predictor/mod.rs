//! Confidence predictors consumed by the ML-validated wrapper.
//!
//! Only inference lives here. Models are trained elsewhere and handed in as
//! serialized weights.

pub mod features;
pub mod linear;

pub use features::{market_context_features, signal_features, strategy_features, FeatureMap};
pub use linear::{LinearModel, LinearPredictor, PredictorError};

use crate::domain::{Bar, Signal};

/// Scores how likely a signal is to be profitable, in [0, 1].
pub trait ConfidencePredictor: Send + Sync {
    /// False when no model is loaded; callers then apply their fallback policy.
    fn is_trained(&self) -> bool;

    /// `context` holds the bars up to and including the signal's bar.
    fn predict(&self, signal: &Signal, context: &[Bar], strategy_type: &str) -> f64;
}

/// Stand-in predictor with no model: never trained, always 0.5.
#[derive(Debug, Clone, Copy, Default)]
pub struct UntrainedPredictor;

impl ConfidencePredictor for UntrainedPredictor {
    fn is_trained(&self) -> bool {
        false
    }

    fn predict(&self, _signal: &Signal, _context: &[Bar], _strategy_type: &str) -> f64 {
        0.5
    }
}

/// Clamp a raw prediction into [0, 1]; NaN maps to the neutral 0.5.
pub fn clamp_confidence(raw: f64) -> f64 {
    if raw.is_nan() {
        0.5
    } else {
        raw.clamp(0.0, 1.0)
    }
}
