//! Exchange-facing traits and structured error types.
//!
//! `CandleStream` abstracts over market data sources (live websocket,
//! CSV replay) and `ExchangeGateway` over order endpoints (live REST,
//! paper exchange) so we can swap implementations and mock for tests.

use thiserror::Error;

use crate::domain::{Candle, CandleEvent, OrderAck, OrderRequest, OrderResolution};

/// Structured error types for exchange operations.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by exchange (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("order rejected: {0}")]
    OrderRejected(String),

    #[error("unknown order id: {0}")]
    UnknownOrder(String),

    #[error("response format changed: {0}")]
    MalformedResponse(String),

    #[error("exchange error: {0}")]
    Other(String),
}

/// One message from a market data stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A candle update. `candle.is_final` says whether the interval closed.
    Candle(CandleEvent),
    /// The transport reported an error in-band. The connection may still
    /// be alive; the driver decides whether to reconnect.
    TransportError(String),
    /// The stream ended and will produce nothing more.
    Closed,
}

/// Source of candle events for one symbol and interval.
///
/// `next_event` blocks until something happens. A transport failure
/// surfaces either as `Ok(StreamEvent::TransportError)` when the stream
/// reported it in-band, or as `Err` when the transport itself broke;
/// either way the driver calls `reconnect` and carries on.
pub trait CandleStream: Send {
    fn next_event(&mut self) -> Result<StreamEvent, ExchangeError>;
    fn reconnect(&mut self) -> Result<(), ExchangeError>;
}

/// Order endpoint of an exchange.
pub trait ExchangeGateway: Send {
    /// Places an order. An `Ok` means the exchange accepted it, not that
    /// it filled.
    fn submit_order(&mut self, request: &OrderRequest) -> Result<OrderAck, ExchangeError>;

    /// Queries what became of a previously acknowledged order.
    fn order_status(&mut self, order_id: &str) -> Result<OrderResolution, ExchangeError>;

    /// Hook called once per final candle before any orders are handled.
    ///
    /// Live gateways ignore it; the paper exchange uses it as its clock
    /// to decide which resting orders have crossed.
    fn on_market_data(&mut self, _candle: &Candle) {}
}
