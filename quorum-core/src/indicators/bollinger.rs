//! Bollinger Bands — moving average +/- standard deviation multiplier.
//!
//! - Middle: SMA(close, period)
//! - Upper: middle + mult * stddev(close, period)
//! - Lower: middle - mult * stddev(close, period)
//!
//! Uses population stddev (divide by N). A NaN close makes every window
//! containing it NaN without poisoning later windows.

/// All three bands, each the input's length with NaN before index period - 1.
#[derive(Debug, Clone)]
pub struct Bands {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

/// Computes Bollinger bands over closing prices.
pub fn bollinger(closes: &[f64], period: usize, multiplier: f64) -> Bands {
    let n = closes.len();
    let mut bands = Bands {
        upper: vec![f64::NAN; n],
        middle: vec![f64::NAN; n],
        lower: vec![f64::NAN; n],
    };

    if period == 0 || n < period {
        return bands;
    }

    for i in (period - 1)..n {
        let start = i + 1 - period;
        let window = &closes[start..=i];

        // Check for NaN in window
        let mut has_nan = false;
        let mut sum = 0.0;
        for &close in window {
            if close.is_nan() {
                has_nan = true;
                break;
            }
            sum += close;
        }

        if has_nan {
            continue;
        }

        let mean = sum / period as f64;

        // Population stddev
        let variance: f64 = window
            .iter()
            .map(|&close| {
                let diff = close - mean;
                diff * diff
            })
            .sum::<f64>()
            / period as f64;
        let stddev = variance.sqrt();

        bands.middle[i] = mean;
        bands.upper[i] = mean + multiplier * stddev;
        bands.lower[i] = mean - multiplier * stddev;
    }

    bands
}
