//! Candle — the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::interval::CandleInterval;

/// OHLCV candle for a single symbol over a single interval.
///
/// `is_final` distinguishes a closed candle from an in-progress update: a
/// streaming feed emits many updates per interval and exactly one final
/// candle when the interval closes. Only final candles drive decisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub close_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub is_final: bool,
}

impl Candle {
    /// Returns true if any OHLCV field is NaN (void candle).
    pub fn is_void(&self) -> bool {
        self.open.is_nan()
            || self.high.is_nan()
            || self.low.is_nan()
            || self.close.is_nan()
            || self.volume.is_nan()
    }

    /// Basic OHLCV sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }
}

/// A candle tagged with the symbol and interval it belongs to.
///
/// This is what a market data stream yields; the engine checks the tag
/// against its configured instrument before consuming the candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandleEvent {
    pub symbol: String,
    pub interval: CandleInterval,
    pub candle: Candle,
}
