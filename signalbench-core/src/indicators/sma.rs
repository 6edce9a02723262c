//! Simple Moving Average (SMA) of close prices.
//!
//! Output at index i is the mean of closes (i+1-period)..=i; the first
//! `period - 1` values are NaN. A NaN close poisons every window it sits in.

use crate::components::indicator::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        rolling_mean(bars.iter().map(|b| b.close), bars.len(), self.period)
    }
}

/// Windowed mean over an iterator of values.
///
/// Keeps a running sum plus a count of NaNs inside the window, so each step
/// is O(1) and a NaN leaving the window clears the poison.
pub(crate) fn rolling_mean(values: impl Iterator<Item = f64>, n: usize, period: usize) -> Vec<f64> {
    let values: Vec<f64> = values.collect();
    let mut out = vec![f64::NAN; n];
    let mut sum = 0.0;
    let mut nans = 0usize;

    for i in 0..n {
        let entering = values[i];
        if entering.is_nan() {
            nans += 1;
        } else {
            sum += entering;
        }
        if i >= period {
            let leaving = values[i - period];
            if leaving.is_nan() {
                nans -= 1;
            } else {
                sum -= leaving;
            }
        }
        if i + 1 >= period && nans == 0 {
            out[i] = sum / period as f64;
        }
    }
    out
}
