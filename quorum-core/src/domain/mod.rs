//! Domain types for the quorum trading engine.

pub mod candle;
pub mod interval;
pub mod order;

pub use candle::{Candle, CandleEvent};
pub use interval::CandleInterval;
pub use order::{
    OrderAck, OrderRequest, OrderResolution, OrderSide, OrderStatus, OrderType, PendingOrder,
};
