//! Integration tests for the built-in strategies, driven through the registry.
//!
//! Tests:
//! 1. Every strategy fires on four days of synthetic 5-minute data.
//! 2. Look-ahead: truncating the series never changes earlier signals.
//! 3. Determinism: repeated runs serialize to identical JSON.
//! 4. Empty input yields no signals.
//! 5. The ML wrapper filters with an injected model.

use std::sync::Arc;

use chrono::NaiveDate;
use signalbench_core::components::{
    Overrides, SignalGenerator, StrategyRegistry, ValidatedSignalGenerator, ValidationConfig,
    ValidationStats,
};
use signalbench_core::domain::Bar;
use signalbench_core::predictor::{LinearPredictor, UntrainedPredictor};

// ──────────────────────────────────────────────
// Helpers
// ──────────────────────────────────────────────

const BARS_PER_DAY: usize = 288;

/// 12-hour sine around 100 with bar-to-bar chop and a spike every 211 bars.
fn session_bars(days: usize) -> Vec<Bar> {
    let start = NaiveDate::from_ymd_opt(2024, 3, 4)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let mut prev = 100.0;
    (0..days * BARS_PER_DAY)
        .map(|i| {
            let wave = 3.0 * (2.0 * std::f64::consts::PI * i as f64 / 144.0).sin();
            let chop = if i % 2 == 0 { 0.05 } else { -0.05 };
            let spike = if i % 211 == 105 { 6.0 } else { 0.0 };
            let close = 100.0 + wave + chop + spike;
            let open = prev;
            prev = close;
            Bar::new(
                start + chrono::Duration::minutes(5 * i as i64),
                open,
                open.max(close) + 0.3,
                open.min(close) - 0.3,
                close,
                1000.0 + (i % 7) as f64 * 100.0,
            )
        })
        .collect()
}

fn build(id: &str) -> Box<dyn SignalGenerator> {
    StrategyRegistry::with_defaults()
        .get(id, &Overrides::new())
        .unwrap()
}

const ALL: [&str; 4] = ["vwap_ib", "sma_crossover", "rsi_oversold", "mean_reversion"];

// ──────────────────────────────────────────────
// 1. Every strategy fires
// ──────────────────────────────────────────────

#[test]
fn every_strategy_fires_on_synthetic_data() {
    let bars = session_bars(4);
    for id in ALL {
        let signals = build(id).generate(&bars, "XAUUSD");
        assert!(!signals.is_empty(), "{id} produced no signals");
        assert!(
            signals.windows(2).all(|w| w[0].timestamp <= w[1].timestamp),
            "{id} signals out of order"
        );
        assert!(signals.iter().all(|s| s.asset_id == "XAUUSD"));
    }
}

#[test]
fn vwap_ib_fires_at_most_once_per_session() {
    let bars = session_bars(4);
    let signals = build("vwap_ib").generate(&bars, "XAUUSD");
    assert!(signals.len() <= 5);
    let mut sessions: Vec<_> = signals
        .iter()
        .map(|s| (s.timestamp - chrono::Duration::hours(22)).date())
        .collect();
    let before = sessions.len();
    sessions.dedup();
    assert_eq!(before, sessions.len());
    for s in &signals {
        for key in ["vwap", "ib_high", "ib_low"] {
            assert!(s.field(key).is_some(), "missing {key}");
        }
    }
}

#[test]
fn sma_crossover_alternates() {
    let signals = build("sma_crossover").generate(&session_bars(2), "BTCUSD");
    for pair in signals.windows(2) {
        assert_ne!(pair[0].direction, pair[1].direction);
    }
}

#[test]
fn rsi_latch_alternates_sides() {
    let signals = build("rsi_oversold").generate(&session_bars(4), "ETHUSD");
    assert!(signals.len() >= 2);
    for pair in signals.windows(2) {
        assert_ne!(pair[0].direction, pair[1].direction);
    }
}

// ──────────────────────────────────────────────
// 2. Look-ahead
// ──────────────────────────────────────────────

#[test]
fn truncation_never_changes_earlier_signals() {
    let bars = session_bars(3);
    for id in ALL {
        let strategy = build(id);
        let full = strategy.generate(&bars, "XAUUSD");
        for cut in [300, 450, 577, 700] {
            let cutoff = bars[cut].timestamp;
            let partial = strategy.generate(&bars[..cut], "XAUUSD");
            let expected: Vec<_> = full.iter().filter(|s| s.timestamp < cutoff).cloned().collect();
            assert_eq!(partial, expected, "{id} changed when truncated at {cut}");
        }
    }
}

// ──────────────────────────────────────────────
// 3. Determinism
// ──────────────────────────────────────────────

#[test]
fn repeated_generation_is_byte_identical() {
    let bars = session_bars(2);
    for id in ALL {
        let a = serde_json::to_string(&build(id).generate(&bars, "XAUUSD")).unwrap();
        let b = serde_json::to_string(&build(id).generate(&bars, "XAUUSD")).unwrap();
        assert_eq!(a, b, "{id} is not deterministic");
    }
}

// ──────────────────────────────────────────────
// 4. Empty input
// ──────────────────────────────────────────────

#[test]
fn empty_series_yields_no_signals() {
    for id in ALL {
        assert!(build(id).generate(&[], "XAUUSD").is_empty());
    }
}

// ──────────────────────────────────────────────
// 5. ML wrapper
// ──────────────────────────────────────────────

#[test]
fn wrapper_with_model_keeps_a_subset() {
    let bars = session_bars(4);
    let raw = build("rsi_oversold").generate(&bars, "XAUUSD");

    // Strongly favour extreme RSI readings.
    let model = LinearPredictor::from_json(
        r#"{"intercept": -2.0, "weights": {"rsi_extremeness": 5.0}}"#,
    )
    .unwrap();
    let wrapper = ValidatedSignalGenerator::new(
        build("rsi_oversold"),
        Arc::new(model),
        ValidationConfig::default(),
    );

    let kept = wrapper.generate(&bars, "XAUUSD");
    assert!(kept.len() <= raw.len());
    assert!(kept.iter().all(|s| s.ml_confidence.unwrap() >= 0.65));

    let stats = ValidationStats::from_signals(&wrapper.score(&bars, "XAUUSD").unwrap());
    assert_eq!(stats.total, raw.len());
    assert_eq!(stats.accepted, kept.len());
    assert_eq!(stats.accepted + stats.rejected, stats.total);
}

#[test]
fn wrapper_without_model_falls_back() {
    let bars = session_bars(2);
    let raw = build("sma_crossover").generate(&bars, "XAUUSD");
    let wrapper = ValidatedSignalGenerator::new(
        build("sma_crossover"),
        Arc::new(UntrainedPredictor),
        ValidationConfig::default(),
    );
    assert_eq!(wrapper.generate(&bars, "XAUUSD"), raw);
}
