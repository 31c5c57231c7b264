//! Batch indicator implementations.
//!
//! All indicators operate on a slice of closing prices and return
//! full-length output vectors with NaN in warmup positions. They are
//! recomputed from the rolling window snapshot once per final candle,
//! which keeps every value derivable from the window alone — there is
//! no incremental state to drift out of sync after a restart.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod range;
pub mod rsi;

pub use bollinger::{bollinger, Bands};
pub use ema::ema;
pub use macd::{macd, Macd};
pub use range::{range_stats, RangeStats};
pub use rsi::rsi;

use serde::{Deserialize, Serialize};

/// Periods and multipliers for every indicator the engine consults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorParams {
    pub rsi_period: usize,
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub signal_period: usize,
    pub bollinger_period: usize,
    pub bollinger_mult: f64,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            rsi_period: 21,
            ema_fast: 12,
            ema_slow: 26,
            signal_period: 9,
            bollinger_period: 20,
            bollinger_mult: 2.0,
        }
    }
}

impl IndicatorParams {
    /// Minimum number of closes before every indicator has a valid last
    /// value.
    ///
    /// RSI needs period + 1 closes, the MACD signal line needs
    /// ema_slow + signal_period - 1, Bollinger needs its own period.
    pub fn min_samples(&self) -> usize {
        let rsi_needs = self.rsi_period + 1;
        let macd_needs = self.ema_slow + self.signal_period - 1;
        let bollinger_needs = self.bollinger_period;
        rsi_needs.max(macd_needs).max(bollinger_needs)
    }
}

/// Latest value of every indicator, taken at the same close.
///
/// A snapshot is all-or-nothing: it exists only when every field is a
/// real number, so downstream votes never see NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    pub rsi: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub bollinger_upper: f64,
    pub bollinger_middle: f64,
    pub bollinger_lower: f64,
    pub range_min: f64,
    pub range_max: f64,
    pub range_avg: f64,
}

impl IndicatorSnapshot {
    /// Close broke above the upper Bollinger band. Strict: touching the
    /// band is not a break.
    pub fn crossed_upper(&self, close: f64) -> bool {
        close > self.bollinger_upper
    }

    /// Close broke below the lower Bollinger band.
    pub fn crossed_lower(&self, close: f64) -> bool {
        close < self.bollinger_lower
    }

    fn has_nan(&self) -> bool {
        self.rsi.is_nan()
            || self.ema_fast.is_nan()
            || self.ema_slow.is_nan()
            || self.macd.is_nan()
            || self.macd_signal.is_nan()
            || self.bollinger_upper.is_nan()
            || self.bollinger_middle.is_nan()
            || self.bollinger_lower.is_nan()
            || self.range_min.is_nan()
            || self.range_max.is_nan()
            || self.range_avg.is_nan()
    }
}

/// Computes a coherent snapshot of every configured indicator.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSet {
    params: IndicatorParams,
}

impl IndicatorSet {
    pub fn new(params: IndicatorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &IndicatorParams {
        &self.params
    }

    /// Computes the latest value of every indicator over the window.
    ///
    /// Returns None until the window holds `min_samples` closes, and
    /// whenever any indicator's last value is NaN.
    pub fn compute(&self, closes: &[f64]) -> Option<IndicatorSnapshot> {
        if closes.len() < self.params.min_samples() {
            return None;
        }

        let rsi_series = rsi(closes, self.params.rsi_period);
        let macd_out = macd(
            closes,
            self.params.ema_fast,
            self.params.ema_slow,
            self.params.signal_period,
        );
        let bands = bollinger(
            closes,
            self.params.bollinger_period,
            self.params.bollinger_mult,
        );
        let range = range_stats(closes)?;

        let last = closes.len() - 1;
        let snapshot = IndicatorSnapshot {
            rsi: rsi_series[last],
            ema_fast: macd_out.ema_fast[last],
            ema_slow: macd_out.ema_slow[last],
            macd: macd_out.macd[last],
            macd_signal: macd_out.signal[last],
            bollinger_upper: bands.upper[last],
            bollinger_middle: bands.middle[last],
            bollinger_lower: bands.lower[last],
            range_min: range.min,
            range_max: range.max,
            range_avg: range.avg,
        };

        if snapshot.has_nan() {
            return None;
        }
        Some(snapshot)
    }
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_min_samples() {
        // MACD signal dominates: 26 + 9 - 1 = 34
        assert_eq!(IndicatorParams::default().min_samples(), 34);
    }

    #[test]
    fn snapshot_none_below_min_samples() {
        let set = IndicatorSet::new(IndicatorParams::default());
        let closes: Vec<f64> = (0..33).map(|i| 100.0 + i as f64).collect();
        assert!(set.compute(&closes).is_none());
    }

    #[test]
    fn snapshot_present_at_min_samples() {
        let set = IndicatorSet::new(IndicatorParams::default());
        let closes: Vec<f64> = (0..34).map(|i| 100.0 + (i as f64 * 0.3).sin()).collect();
        let snapshot = set.compute(&closes).unwrap();

        assert!((0.0..=100.0).contains(&snapshot.rsi));
        assert!(snapshot.bollinger_lower <= snapshot.bollinger_middle);
        assert!(snapshot.bollinger_middle <= snapshot.bollinger_upper);
        assert!(snapshot.range_min <= snapshot.range_avg);
        assert!(snapshot.range_avg <= snapshot.range_max);
    }

    #[test]
    fn snapshot_none_when_window_has_nan() {
        let set = IndicatorSet::new(IndicatorParams::default());
        let mut closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        closes[38] = f64::NAN;
        assert!(set.compute(&closes).is_none());
    }

    #[test]
    fn band_cross_is_strict() {
        let snapshot = IndicatorSnapshot {
            rsi: 50.0,
            ema_fast: 100.0,
            ema_slow: 100.0,
            macd: 0.0,
            macd_signal: 0.0,
            bollinger_upper: 105.0,
            bollinger_middle: 100.0,
            bollinger_lower: 95.0,
            range_min: 90.0,
            range_max: 110.0,
            range_avg: 100.0,
        };
        assert!(!snapshot.crossed_upper(105.0));
        assert!(snapshot.crossed_upper(105.01));
        assert!(!snapshot.crossed_lower(95.0));
        assert!(snapshot.crossed_lower(94.99));
    }
}
