//! Replay harness for the decision engine.
//!
//! This crate builds on `quorum-core` to provide:
//! - Kline CSV history loading with per-row validation
//! - A simulated exchange that fills limit orders against later candles
//! - A replay driver that feeds the engine one candle at a time
//! - Run summaries with trade extraction and artifact export

pub mod history;
pub mod paper;
pub mod replay;
pub mod report;

pub use history::{load_candles, HistoryError, HistoryStream};
pub use paper::PaperExchange;
pub use replay::{drive, ReplayError, RunSummary, TradeRecord};
pub use report::{export_summary_json, export_trades_csv, render_summary, save_artifacts};
