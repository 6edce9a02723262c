//! ML-validated wrapper around any signal generator.
//!
//! The inner generator and the predictor are injected at construction. Each
//! inner signal is scored against the bars up to its timestamp (at most
//! [`CONTEXT_BARS`]) and kept only if the confidence clears the threshold.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::SignalGenerator;
use crate::domain::{first_index_after, Bar, Signal};
use crate::predictor::{clamp_confidence, ConfidencePredictor};

/// Bars of history handed to the predictor per signal.
pub const CONTEXT_BARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub confidence_threshold: f64,
    /// With no trained model: pass raw signals through (true) or drop them all.
    pub fallback_to_original: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.65,
            fallback_to_original: true,
        }
    }
}

pub struct ValidatedSignalGenerator {
    inner: Box<dyn SignalGenerator>,
    predictor: Arc<dyn ConfidencePredictor>,
    config: ValidationConfig,
}

impl ValidatedSignalGenerator {
    pub fn new(
        inner: Box<dyn SignalGenerator>,
        predictor: Arc<dyn ConfidencePredictor>,
        config: ValidationConfig,
    ) -> Self {
        Self {
            inner,
            predictor,
            config,
        }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Every inner signal with its verdict attached, rejected ones included.
    ///
    /// Returns `None` when the predictor has no trained model.
    pub fn score(&self, bars: &[Bar], asset_id: &str) -> Option<Vec<Signal>> {
        if !self.predictor.is_trained() {
            return None;
        }
        Some(self.annotate(self.inner.generate(bars, asset_id), bars))
    }

    fn annotate(&self, raw: Vec<Signal>, bars: &[Bar]) -> Vec<Signal> {
        let strategy = self.inner.name();
        raw.iter()
            .map(|signal| {
                let end = first_index_after(bars, signal.timestamp);
                let context = &bars[end.saturating_sub(CONTEXT_BARS)..end];
                let confidence =
                    clamp_confidence(self.predictor.predict(signal, context, strategy));
                signal.validated(confidence, confidence >= self.config.confidence_threshold)
            })
            .collect()
    }
}

impl SignalGenerator for ValidatedSignalGenerator {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn generate(&self, bars: &[Bar], asset_id: &str) -> Vec<Signal> {
        let raw = self.inner.generate(bars, asset_id);
        let strategy = self.inner.name();

        if !self.predictor.is_trained() {
            if self.config.fallback_to_original {
                warn!(strategy, "no trained model, passing raw signals through");
                return raw;
            }
            warn!(strategy, dropped = raw.len(), "no trained model and fallback disabled");
            return Vec::new();
        }

        let total = raw.len();
        let kept: Vec<Signal> = self
            .annotate(raw, bars)
            .into_iter()
            .filter(|s| s.ml_validated == Some(true))
            .collect();
        debug!(
            asset_id,
            strategy,
            total,
            accepted = kept.len(),
            threshold = self.config.confidence_threshold,
            "ml validation applied"
        );
        kept
    }
}

/// Summary of one validation pass.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationStats {
    pub total: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub avg_confidence: f64,
    pub acceptance_rate: f64,
}

impl ValidationStats {
    /// Tally scored signals. Signals without a verdict count toward `total`
    /// only.
    pub fn from_signals(signals: &[Signal]) -> Self {
        let total = signals.len();
        let accepted = signals.iter().filter(|s| s.ml_validated == Some(true)).count();
        let rejected = signals.iter().filter(|s| s.ml_validated == Some(false)).count();
        let confidences: Vec<f64> = signals.iter().filter_map(|s| s.ml_confidence).collect();
        let avg_confidence = if confidences.is_empty() {
            0.0
        } else {
            confidences.iter().sum::<f64>() / confidences.len() as f64
        };
        let acceptance_rate = if total == 0 {
            0.0
        } else {
            accepted as f64 / total as f64
        };
        Self {
            total,
            accepted,
            rejected,
            avg_confidence,
            acceptance_rate,
        }
    }
}
