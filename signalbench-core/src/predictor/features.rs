//! Feature extraction for confidence models.
//!
//! Market features describe the context window (up to 100 bars of 5-minute
//! data ending at the signal). Strategy features are read off the signal's
//! own fields. Every value is finite; degenerate inputs fall back to a
//! neutral constant instead of NaN.

use std::collections::BTreeMap;

use chrono::Timelike;

use crate::domain::{Bar, Direction, Signal};

pub type FeatureMap = BTreeMap<String, f64>;

/// Fewer context bars than this produce no market features at all.
pub const MIN_CONTEXT_BARS: usize = 20;

/// Bars per hour at 5-minute resolution.
const HOUR: usize = 12;
const FOUR_HOURS: usize = 48;
const DAY: usize = 288;

pub fn market_context_features(context: &[Bar]) -> FeatureMap {
    let n = context.len();
    let mut f = FeatureMap::new();
    if n < MIN_CONTEXT_BARS {
        return f;
    }
    let closes: Vec<f64> = context.iter().map(|b| b.close).collect();
    let volumes: Vec<f64> = context.iter().map(|b| b.volume).collect();
    let returns: Vec<f64> = closes
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect();
    let current = closes[n - 1];

    f.insert("volatility_1h".into(), sample_std(tail(&returns, HOUR)));
    f.insert("volatility_4h".into(), sample_std(tail(&returns, FOUR_HOURS)));

    f.insert("trend_strength_short".into(), trend_strength(tail(&closes, 6)));
    f.insert("trend_strength_medium".into(), trend_strength(tail(&closes, 24)));
    f.insert("trend_strength_long".into(), trend_strength(tail(&closes, 96)));

    let recent_vol = mean(tail(&volumes, HOUR));
    let hist_vol = mean(tail(&volumes, 96));
    f.insert(
        "volume_ratio".into(),
        if hist_vol > 0.0 { recent_vol / hist_vol } else { 1.0 },
    );
    let hist_vol_trend = mean(tail(&volumes, FOUR_HOURS));
    f.insert(
        "volume_trend".into(),
        if hist_vol_trend > 0.0 {
            mean(tail(&volumes, 6)) / hist_vol_trend - 1.0
        } else {
            0.0
        },
    );

    let window = &context[n.saturating_sub(DAY)..];
    let high = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let low = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    f.insert(
        "price_position_24h".into(),
        if high > low {
            (current - low) / (high - low)
        } else {
            0.5
        },
    );

    let ma = mean(tail(&closes, 20));
    f.insert(
        "price_vs_ma".into(),
        if ma != 0.0 { current / ma - 1.0 } else { 0.0 },
    );
    f.insert("bollinger_position".into(), bollinger_position(tail(&closes, 20)));

    f.insert("momentum_1h".into(), momentum(&closes, HOUR));
    f.insert("momentum_4h".into(), momentum(&closes, FOUR_HOURS));

    let hour = context[n - 1].timestamp.hour();
    f.insert("is_london_session".into(), flag((8..16).contains(&hour)));
    f.insert("is_ny_session".into(), flag((13..21).contains(&hour)));
    f.insert("is_asia_session".into(), flag(hour >= 22 || hour < 6));

    f
}

/// Features derived from the strategy-specific fields on the signal.
pub fn strategy_features(signal: &Signal, strategy_type: &str) -> FeatureMap {
    let mut f = FeatureMap::new();
    let price = signal.price;
    let field = |name: &str| signal.field(name).filter(|v| v.is_finite());

    match strategy_type {
        "vwap_ib" => {
            let vwap_distance = match field("vwap") {
                Some(v) if v > 0.0 => (price - v) / v,
                _ => 0.0,
            };
            f.insert("vwap_distance".into(), vwap_distance);

            let (width, strength) = match (field("ib_high"), field("ib_low")) {
                (Some(hi), Some(lo)) if lo > 0.0 => {
                    let level = match signal.direction {
                        Direction::Long => hi,
                        Direction::Short => lo,
                    };
                    let strength = if level > 0.0 {
                        (price - level).abs() / level
                    } else {
                        0.0
                    };
                    ((hi - lo) / lo, strength)
                }
                _ => (0.0, 0.0),
            };
            f.insert("ib_range_width".into(), width);
            f.insert("breakout_strength".into(), strength);
        }
        "sma_crossover" => {
            let fast = field("sma_fast").filter(|v| *v > 0.0);
            let slow = field("sma_slow").filter(|v| *v > 0.0);
            let spread = match (field("sma_fast"), slow) {
                (Some(fa), Some(sl)) => (fa - sl) / sl,
                _ => 0.0,
            };
            f.insert("sma_spread".into(), spread);
            f.insert("price_vs_sma_fast".into(), fast.map_or(0.0, |v| price / v - 1.0));
            f.insert("price_vs_sma_slow".into(), slow.map_or(0.0, |v| price / v - 1.0));
        }
        "rsi_oversold" => {
            let rsi = field("rsi").unwrap_or(50.0);
            f.insert("rsi_value".into(), rsi);
            f.insert("rsi_extremeness".into(), (rsi - 50.0).abs() / 50.0);
        }
        _ => {}
    }
    f
}

/// Market and strategy features merged; strategy keys win on collision.
pub fn signal_features(signal: &Signal, context: &[Bar], strategy_type: &str) -> FeatureMap {
    let mut f = market_context_features(context);
    f.extend(strategy_features(signal, strategy_type));
    f
}

// ── numeric helpers ──

fn tail(xs: &[f64], n: usize) -> &[f64] {
    &xs[xs.len().saturating_sub(n)..]
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

fn sample_std(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let m = mean(xs);
    let var = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (xs.len() - 1) as f64;
    var.sqrt()
}

/// |least-squares slope| normalised by the mean level.
fn trend_strength(ys: &[f64]) -> f64 {
    let n = ys.len();
    if n < 2 {
        return 0.0;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(ys);
    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (i, y) in ys.iter().enumerate() {
        let dx = i as f64 - x_mean;
        sxy += dx * (y - y_mean);
        sxx += dx * dx;
    }
    if sxx == 0.0 || y_mean == 0.0 {
        return 0.0;
    }
    (sxy / sxx).abs() / y_mean
}

/// Position inside ±2σ bands of the window, clamped to [0, 1].
fn bollinger_position(window: &[f64]) -> f64 {
    if window.len() < 20 {
        return 0.5;
    }
    let sd = sample_std(window);
    if sd == 0.0 {
        return 0.5;
    }
    let m = mean(window);
    let (lower, upper) = (m - 2.0 * sd, m + 2.0 * sd);
    let current = window[window.len() - 1];
    ((current - lower) / (upper - lower)).clamp(0.0, 1.0)
}

fn momentum(closes: &[f64], bars: usize) -> f64 {
    let n = closes.len();
    if n < bars {
        return 0.0;
    }
    let base = closes[n - bars];
    if base == 0.0 {
        0.0
    } else {
        closes[n - 1] / base - 1.0
    }
}

fn flag(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}
