//! Replay driver — runs the engine over a candle stream to completion.
//!
//! The driver owns none of the trading logic. It pulls stream events,
//! hands candles to the engine, pairs fills into completed trades, and
//! reconnects on transport errors the same way a live runner would.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use quorum_core::domain::{OrderResolution, OrderSide, OrderStatus};
use quorum_core::engine::{Engine, EngineError, EngineStats};
use quorum_core::gateway::{CandleStream, ExchangeError, ExchangeGateway, StreamEvent};
use quorum_core::notify::Notifier;
use quorum_core::position::{PositionState, StateStore};

/// Errors that abort a replay.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The stream broke and could not be reconnected.
    #[error("stream failed: {0}")]
    StreamFailed(ExchangeError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// One completed entry/exit round trip.
#[derive(Debug, Clone, Serialize)]
pub struct TradeRecord {
    pub symbol: String,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,
    pub entry_quantity: f64,
    pub exit_time: DateTime<Utc>,
    pub exit_price: f64,
    pub exit_quantity: f64,
    pub pnl: f64,
}

/// Everything a replay produces.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub symbol: String,
    /// Final candles the engine consumed.
    pub candles: u64,
    pub stats: EngineStats,
    pub trades: Vec<TradeRecord>,
    /// Sum of completed-trade pnl. An open position at the end of the
    /// run is not included.
    pub realized_pnl: f64,
    pub final_state: PositionState,
    pub config_fingerprint: String,
}

/// A buy fill waiting for its matching sell.
struct OpenEntry {
    time: DateTime<Utc>,
    price: f64,
    quantity: f64,
}

/// Drives the engine until the stream closes.
///
/// Transport errors trigger one reconnect attempt each; a reconnect
/// failure ends the replay. Engine persistence errors are fatal, as they
/// are in a live run.
pub fn drive(
    engine: &mut Engine,
    stream: &mut dyn CandleStream,
    gateway: &mut dyn ExchangeGateway,
    store: &mut dyn StateStore,
    notifier: &mut dyn Notifier,
) -> Result<RunSummary, ReplayError> {
    let mut trades = Vec::new();
    let mut open_entry: Option<OpenEntry> = None;

    loop {
        match stream.next_event() {
            Ok(StreamEvent::Candle(event)) => {
                let report = engine.on_candle(&event, gateway, store, notifier)?;
                if let Some(resolution) = &report.resolution {
                    pair_fill(
                        &mut trades,
                        &mut open_entry,
                        &event.symbol,
                        event.candle.close_time,
                        resolution,
                    );
                }
            }
            Ok(StreamEvent::TransportError(message)) => {
                warn!("stream transport error, reconnecting: {}", message);
                stream.reconnect().map_err(ReplayError::StreamFailed)?;
            }
            Ok(StreamEvent::Closed) => break,
            Err(e) => {
                warn!("stream read failed, reconnecting: {}", e);
                stream.reconnect().map_err(ReplayError::StreamFailed)?;
            }
        }
    }

    let stats = *engine.stats();
    let realized_pnl = trades.iter().map(|t| t.pnl).sum();
    let summary = RunSummary {
        symbol: engine.config().symbol.clone(),
        candles: stats.cycles,
        stats,
        trades,
        realized_pnl,
        final_state: engine.state().clone(),
        config_fingerprint: engine.config().fingerprint(),
    };

    info!(
        "replay finished: {} candles, {} trades, realized pnl {:.2}",
        summary.candles,
        summary.trades.len(),
        summary.realized_pnl
    );
    Ok(summary)
}

/// Folds a resolved order into the trade tape.
///
/// A buy fill opens a pending trade, the next sell fill completes it. A
/// sell fill with no recorded entry happens when the run started inside
/// a position; its pnl belongs to an earlier run, so it is skipped.
fn pair_fill(
    trades: &mut Vec<TradeRecord>,
    open_entry: &mut Option<OpenEntry>,
    symbol: &str,
    at: DateTime<Utc>,
    resolution: &OrderResolution,
) {
    if resolution.status != OrderStatus::Filled {
        return;
    }

    match resolution.side {
        OrderSide::Buy => {
            *open_entry = Some(OpenEntry {
                time: at,
                price: resolution.fill_price,
                quantity: resolution.fill_quantity,
            });
        }
        OrderSide::Sell => match open_entry.take() {
            Some(entry) => {
                let pnl = resolution.fill_price * resolution.fill_quantity
                    - entry.price * entry.quantity;
                trades.push(TradeRecord {
                    symbol: symbol.to_string(),
                    entry_time: entry.time,
                    entry_price: entry.price,
                    entry_quantity: entry.quantity,
                    exit_time: at,
                    exit_price: resolution.fill_price,
                    exit_quantity: resolution.fill_quantity,
                    pnl,
                });
            }
            None => {
                debug!("sell fill with no recorded entry, skipping trade record");
            }
        },
    }
}
