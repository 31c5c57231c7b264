//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * value[t] + (1 - alpha) * EMA[t-1]
//! Seed: EMA at the end of the first `period` valid values = their SMA.
//! A NaN warmup prefix (e.g. the head of a derived series like the MACD
//! line) is skipped; a NaN after the seed poisons the rest of the output.

/// Computes EMA over a series, returning a vec the same length as the input.
///
/// Output is NaN before the seed index. The seed is placed at
/// `first_valid + period - 1`; if fewer than `period` valid values exist,
/// the whole output is NaN.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 {
        return result;
    }

    // Skip the NaN warmup prefix, if any.
    let start = match values.iter().position(|v| !v.is_nan()) {
        Some(idx) => idx,
        None => return result,
    };

    if n - start < period {
        return result;
    }

    let alpha = 2.0 / (period as f64 + 1.0);

    // Seed: SMA of the first `period` valid values
    let mut sum = 0.0;
    for &v in &values[start..start + period] {
        if v.is_nan() {
            return result; // NaN inside the seed window → all NaN
        }
        sum += v;
    }
    let seed = sum / period as f64;
    let seed_idx = start + period - 1;
    result[seed_idx] = seed;

    // Recursive EMA
    let mut prev = seed;
    for i in (seed_idx + 1)..n {
        if values[i].is_nan() {
            // NaN propagates: once we see NaN, subsequent values are tainted
            for val in result.iter_mut().skip(i) {
                *val = f64::NAN;
            }
            return result;
        }
        let ema = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = ema;
        prev = ema;
    }

    result
}
