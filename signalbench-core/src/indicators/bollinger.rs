//! Bollinger Bands over close prices.
//!
//! - Middle: SMA(close, period)
//! - Upper/Lower: middle ± k · sample stddev(close, period)
//!
//! The stddev divides by (period - 1), so `period` must be at least 2.

use crate::components::indicator::Indicator;
use crate::domain::Bar;

/// Which band a `Bollinger` indicator instance emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
}

/// All three bands computed in one pass.
#[derive(Debug, Clone, Default)]
pub struct BollingerBands {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    k: f64,
    band: BollingerBand,
    name: String,
}

impl Bollinger {
    pub fn new(period: usize, k: f64, band: BollingerBand) -> Self {
        assert!(period >= 2, "Bollinger period must be >= 2");
        let label = match band {
            BollingerBand::Upper => "upper",
            BollingerBand::Middle => "middle",
            BollingerBand::Lower => "lower",
        };
        Self {
            period,
            k,
            band,
            name: format!("bb_{label}_{period}_{k}"),
        }
    }

    /// Compute upper, middle and lower in a single sweep.
    pub fn bands(period: usize, k: f64, bars: &[Bar]) -> BollingerBands {
        assert!(period >= 2, "Bollinger period must be >= 2");
        let n = bars.len();
        let mut bands = BollingerBands {
            upper: vec![f64::NAN; n],
            middle: vec![f64::NAN; n],
            lower: vec![f64::NAN; n],
        };
        if n < period {
            return bands;
        }

        for end in (period - 1)..n {
            let window = &bars[end + 1 - period..=end];
            if window.iter().any(|b| b.close.is_nan()) {
                continue;
            }
            let mean = window.iter().map(|b| b.close).sum::<f64>() / period as f64;
            let ss: f64 = window.iter().map(|b| (b.close - mean).powi(2)).sum();
            let sd = (ss / (period - 1) as f64).sqrt();

            bands.middle[end] = mean;
            bands.upper[end] = mean + k * sd;
            bands.lower[end] = mean - k * sd;
        }
        bands
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let bands = Self::bands(self.period, self.k, bars);
        match self.band {
            BollingerBand::Upper => bands.upper,
            BollingerBand::Middle => bands.middle,
            BollingerBand::Lower => bands.lower,
        }
    }
}
