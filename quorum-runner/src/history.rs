//! Historical candle loading for replays.
//!
//! Reads kline CSV exports (epoch-millisecond timestamps, one row per
//! candle) and replays them through the `CandleStream` trait, so the
//! engine cannot tell a replay from a live feed.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::vec;

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use quorum_core::domain::{Candle, CandleEvent, CandleInterval};
use quorum_core::gateway::{CandleStream, ExchangeError, StreamEvent};

/// Errors from the history loading layer.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to read history file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("bad candle at line {line}: {reason}")]
    BadRow { line: usize, reason: String },
}

/// One CSV row of a kline export.
///
/// Columns: open_time, open, high, low, close, volume, close_time, with
/// both timestamps in epoch milliseconds.
#[derive(Debug, Deserialize)]
struct HistoryRow {
    open_time: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    close_time: i64,
}

impl HistoryRow {
    fn into_candle(self) -> Result<Candle, String> {
        Ok(Candle {
            open_time: parse_millis(self.open_time)?,
            close_time: parse_millis(self.close_time)?,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
            // History files only contain closed candles.
            is_final: true,
        })
    }
}

fn parse_millis(millis: i64) -> Result<DateTime<Utc>, String> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| format!("timestamp {millis} out of range"))
}

/// Loads and validates every candle in a kline CSV file.
///
/// Rows are checked as they are read; the first malformed or insane row
/// fails the whole load with its line number, because silently skipping
/// bad candles would shift every indicator after it.
pub fn load_candles(path: &Path) -> Result<Vec<Candle>, HistoryError> {
    let file = File::open(path).map_err(|source| HistoryError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::Reader::from_reader(file);

    let mut candles = Vec::new();
    for (i, row) in reader.deserialize::<HistoryRow>().enumerate() {
        // Header occupies line 1
        let line = i + 2;
        let candle = row?
            .into_candle()
            .map_err(|reason| HistoryError::BadRow { line, reason })?;
        if !candle.is_sane() {
            return Err(HistoryError::BadRow {
                line,
                reason: format!(
                    "inconsistent ohlc (o={} h={} l={} c={})",
                    candle.open, candle.high, candle.low, candle.close
                ),
            });
        }
        candles.push(candle);
    }

    info!("loaded {} candles from {}", candles.len(), path.display());
    Ok(candles)
}

/// Replays a candle list through the stream interface.
///
/// Every candle is tagged with the configured symbol and interval; the
/// stream closes after the last one. `reconnect` is a no-op so a driver
/// written for a flaky live feed runs unchanged.
pub struct HistoryStream {
    symbol: String,
    interval: CandleInterval,
    iter: vec::IntoIter<Candle>,
}

impl HistoryStream {
    pub fn new(
        symbol: impl Into<String>,
        interval: CandleInterval,
        candles: Vec<Candle>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            interval,
            iter: candles.into_iter(),
        }
    }
}

impl CandleStream for HistoryStream {
    fn next_event(&mut self) -> Result<StreamEvent, ExchangeError> {
        match self.iter.next() {
            Some(candle) => Ok(StreamEvent::Candle(CandleEvent {
                symbol: self.symbol.clone(),
                interval: self.interval,
                candle,
            })),
            None => Ok(StreamEvent::Closed),
        }
    }

    fn reconnect(&mut self) -> Result<(), ExchangeError> {
        Ok(())
    }
}
