//! Order types shared between the engine and exchange gateways.

use serde::{Deserialize, Serialize};

/// Direction of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        }
    }
}

/// What kind of order and its price parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OrderType {
    /// Fill at whatever the exchange gives us.
    Market,
    /// Fill at limit price or better, good-til-cancelled.
    Limit { limit_price: f64 },
}

/// Order lifecycle states as reported by the exchange.
///
/// The engine never invents a status; it only records what the gateway
/// reports when a pending order is queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Accepted by the exchange, not yet filled.
    New,
    /// Completely filled.
    Filled,
    /// Cancelled before filling (timeout, user cancel, exchange purge).
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Cancelled)
    }
}

/// An order the engine wants placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: f64,
}

/// Exchange acknowledgement of a submitted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAck {
    pub order_id: String,
}

/// The exchange's answer to "what happened to order X?".
///
/// `side` comes from the exchange's own record, not from local state: when
/// the two disagree the exchange record wins, so a fill is always applied
/// in the direction the exchange says it executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResolution {
    pub order_id: String,
    pub status: OrderStatus,
    pub side: OrderSide,
    pub fill_price: f64,
    pub fill_quantity: f64,
}

/// The single in-flight order the engine is allowed to have.
///
/// Persisted alongside the position so a restart resumes tracking the same
/// exchange order instead of submitting a duplicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOrder {
    pub order_id: String,
    pub side: OrderSide,
    pub requested_price: f64,
    pub requested_quantity: f64,
}
