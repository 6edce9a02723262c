//! Anchored cumulative VWAP.
//!
//! VWAP[i] = Σ(typical_price · volume) / Σ(volume) over bars[0..=i]. The
//! anchor is the first bar of the slice, so a session strategy passes in only
//! its trading window to get a per-window reset. While cumulative volume is
//! still zero the bar's own typical price stands in.

use crate::components::indicator::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone, Default)]
pub struct Vwap;

impl Vwap {
    pub fn new() -> Self {
        Self
    }
}

impl Indicator for Vwap {
    fn name(&self) -> &str {
        "vwap"
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let mut pv = 0.0;
        let mut vol = 0.0;
        bars.iter()
            .map(|bar| {
                let tp = bar.typical_price();
                pv += tp * bar.volume;
                vol += bar.volume;
                if vol > 0.0 {
                    pv / vol
                } else {
                    tp
                }
            })
            .collect()
    }
}
