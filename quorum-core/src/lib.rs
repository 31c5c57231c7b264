//! Quorum Core — decision engine, domain types, indicators, position state machine.
//!
//! This crate contains the heart of the trading bot:
//! - Domain types (candles, intervals, orders, resolutions)
//! - Bounded rolling window of closing prices
//! - Batch indicators (RSI, EMA/MACD, Bollinger bands, range stats)
//! - Vote-based signal scorer with a configurable quorum
//! - Position state machine with durable persistence
//! - Pending-order reconciliation against the exchange
//! - Candle-driven decision engine tying it all together

pub mod config;
pub mod domain;
pub mod engine;
pub mod gateway;
pub mod indicators;
pub mod notify;
pub mod position;
pub mod reconcile;
pub mod scorer;
pub mod window;
