//! Signal — an immutable, timestamped directional event.
//!
//! Signals describe a market event, not a downstream decision. The only
//! post-creation change allowed is the ML validation wrapper attaching its
//! confidence fields, which it does by building a new value.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Directional intent of a signal or trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1.0 for long, -1.0 for short.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

/// A strategy signal at a single bar.
///
/// `fields` carries strategy-specific numeric context (vwap, ib_high, rsi, ...).
/// It is a `BTreeMap` so serialization order is stable across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub timestamp: NaiveDateTime,
    pub asset_id: String,
    pub direction: Direction,
    pub price: f64,
    #[serde(default)]
    pub fields: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ml_confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ml_validated: Option<bool>,
}

impl Signal {
    pub fn new(
        timestamp: NaiveDateTime,
        asset_id: impl Into<String>,
        direction: Direction,
        price: f64,
    ) -> Self {
        Self {
            timestamp,
            asset_id: asset_id.into(),
            direction,
            price,
            fields: BTreeMap::new(),
            ml_confidence: None,
            ml_validated: None,
        }
    }

    /// Builder-style helper for attaching a strategy field.
    pub fn with_field(mut self, name: &str, value: f64) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    pub fn field(&self, name: &str) -> Option<f64> {
        self.fields.get(name).copied()
    }

    /// Copy of this signal carrying the validation wrapper's verdict.
    pub fn validated(&self, confidence: f64, accepted: bool) -> Self {
        Self {
            ml_confidence: Some(confidence),
            ml_validated: Some(accepted),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(15, 5, 0)
            .unwrap()
    }

    #[test]
    fn direction_serializes_upper_case() {
        assert_eq!(serde_json::to_string(&Direction::Long).unwrap(), "\"LONG\"");
        assert_eq!(serde_json::to_string(&Direction::Short).unwrap(), "\"SHORT\"");
        assert_eq!(Direction::Short.to_string(), "SHORT");
    }

    #[test]
    fn ml_fields_omitted_until_validated() {
        let signal =
            Signal::new(ts(), "XAUUSD", Direction::Long, 2001.5).with_field("vwap", 1999.0);
        let json = serde_json::to_string(&signal).unwrap();
        assert!(!json.contains("ml_confidence"));

        let validated = signal.validated(0.8, true);
        assert_eq!(validated.ml_confidence, Some(0.8));
        assert_eq!(validated.ml_validated, Some(true));
        assert_eq!(validated.field("vwap"), Some(1999.0));
        // The original stays untouched.
        assert!(signal.ml_confidence.is_none());
    }

    #[test]
    fn signal_deserializes_without_optional_fields() {
        let json = r#"{"timestamp":"2024-03-15T15:05:00","asset_id":"BTCUSD","direction":"SHORT","price":42000.0}"#;
        let signal: Signal = serde_json::from_str(json).unwrap();
        assert_eq!(signal.direction, Direction::Short);
        assert!(signal.fields.is_empty());
        assert!(signal.ml_validated.is_none());
    }
}
