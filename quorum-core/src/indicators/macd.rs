//! Moving Average Convergence Divergence (MACD).
//!
//! MACD line = EMA(close, fast) - EMA(close, slow)
//! Signal line = EMA(MACD line, signal_period)
//! The MACD line is valid from index slow - 1; the signal line from
//! index slow + signal_period - 2.

use crate::indicators::ema::ema;

/// Full MACD output. All four series have the input's length, NaN where
/// not yet valid.
#[derive(Debug, Clone)]
pub struct Macd {
    pub ema_fast: Vec<f64>,
    pub ema_slow: Vec<f64>,
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
}

/// Computes MACD over closing prices.
pub fn macd(closes: &[f64], fast: usize, slow: usize, signal_period: usize) -> Macd {
    let ema_fast = ema(closes, fast);
    let ema_slow = ema(closes, slow);

    let n = closes.len();
    let mut line = vec![f64::NAN; n];
    for i in 0..n {
        if !ema_fast[i].is_nan() && !ema_slow[i].is_nan() {
            line[i] = ema_fast[i] - ema_slow[i];
        }
    }

    // The MACD line carries a NaN warmup prefix of slow - 1 values;
    // `ema` seeds past it.
    let signal = ema(&line, signal_period);

    Macd {
        ema_fast,
        ema_slow,
        macd: line,
        signal,
    }
}
