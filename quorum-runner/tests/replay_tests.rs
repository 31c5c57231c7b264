//! Integration tests for the replay harness.
//!
//! These cover the whole path a backtest takes: candles loaded from a
//! CSV file, streamed into the engine, limit orders filled by the paper
//! exchange one candle after submission, fills paired into trades, and
//! artifacts written to disk.

use std::collections::VecDeque;
use std::io::Write;

use chrono::{Duration, TimeZone, Utc};

use quorum_core::config::{BotConfig, OrderConfig};
use quorum_core::domain::{Candle, CandleEvent, CandleInterval};
use quorum_core::engine::Engine;
use quorum_core::gateway::{CandleStream, ExchangeError, StreamEvent};
use quorum_core::indicators::IndicatorParams;
use quorum_core::notify::LogNotifier;
use quorum_core::position::{MemoryStateStore, Phase, PositionState, StateStore};
use quorum_core::scorer::{ScorerConfig, VoteKind};
use quorum_runner::{
    drive, load_candles, save_artifacts, HistoryStream, PaperExchange, ReplayError, RunSummary,
};

// ── Helpers ──────────────────────────────────────────────────────────

const SYMBOL: &str = "ETHUSDT";

/// Short indicator periods so twenty candles are enough to warm up,
/// enter, and exit. Warmup is six closes (slow EMA plus signal).
fn trend_config() -> BotConfig {
    BotConfig {
        symbol: SYMBOL.into(),
        interval: CandleInterval::Min5,
        window_capacity: 50,
        indicators: IndicatorParams {
            rsi_period: 3,
            ema_fast: 3,
            ema_slow: 5,
            signal_period: 2,
            bollinger_period: 4,
            bollinger_mult: 2.0,
        },
        scorer: ScorerConfig {
            votes: vec![VoteKind::Trend],
            required_votes: None,
            rsi_oversold: 49.0,
            rsi_overbought: 51.0,
        },
        order: OrderConfig::default(),
        state_path: "state.json".into(),
    }
}

/// Flat warmup, a steady rally, then a rollover.
fn trending_closes() -> Vec<f64> {
    let mut closes = vec![10.0; 6];
    closes.extend((11..=18).map(f64::from));
    closes.extend((12..=17).rev().map(f64::from));
    closes
}

/// Renders closes as the CSV shape `load_candles` expects. Highs and
/// lows sit two units off the close so limit orders placed near one
/// close always cross on the next candle.
fn history_csv(closes: &[f64]) -> String {
    let mut csv = String::from("open_time,open,high,low,close,volume,close_time\n");
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    for (i, &close) in closes.iter().enumerate() {
        let open_time = base + Duration::minutes(5 * i as i64);
        let close_time = open_time + Duration::minutes(5);
        csv.push_str(&format!(
            "{},{close},{},{},{close},1000.0,{}\n",
            open_time.timestamp_millis(),
            close + 2.0,
            close - 2.0,
            close_time.timestamp_millis(),
        ));
    }
    csv
}

fn replay_closes(closes: &[f64]) -> RunSummary {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(history_csv(closes).as_bytes()).unwrap();

    let candles = load_candles(file.path()).unwrap();
    let mut stream = HistoryStream::new(SYMBOL, CandleInterval::Min5, candles);
    let mut gateway = PaperExchange::new(3);
    let mut store = MemoryStateStore::default();
    let mut notifier = LogNotifier::default();
    let mut engine = Engine::new(trend_config(), PositionState::default());

    drive(
        &mut engine,
        &mut stream,
        &mut gateway,
        &mut store,
        &mut notifier,
    )
    .unwrap()
}

// ── Full replay ──────────────────────────────────────────────────────

#[test]
fn full_replay_completes_one_round_trip() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(history_csv(&trending_closes()).as_bytes())
        .unwrap();

    let candles = load_candles(file.path()).unwrap();
    let mut stream = HistoryStream::new(SYMBOL, CandleInterval::Min5, candles);
    let mut gateway = PaperExchange::new(3);
    let mut store = MemoryStateStore::default();
    let mut notifier = LogNotifier::default();
    let mut engine = Engine::new(trend_config(), PositionState::default());

    let summary = drive(
        &mut engine,
        &mut stream,
        &mut gateway,
        &mut store,
        &mut notifier,
    )
    .unwrap();

    assert_eq!(summary.symbol, SYMBOL);
    assert_eq!(summary.candles, 20);
    assert_eq!(summary.stats.not_ready, 5, "five candles short of warmup");
    assert_eq!(summary.stats.decisions, 14);
    assert_eq!(summary.stats.buys_submitted, 1);
    assert_eq!(summary.stats.sells_submitted, 1);
    assert_eq!(summary.stats.fills, 2);
    assert_eq!(summary.stats.cancels, 0);
    assert_eq!(summary.stats.awaiting_fill, 0, "both fills resolve on first query");

    // The buy is signalled on the first rally close (11.0), priced a
    // 0.1% offset below it, and fills on the following candle. The sell
    // mirrors that at the top (close 17.0).
    assert_eq!(summary.trades.len(), 1);
    let trade = &summary.trades[0];
    assert_eq!(trade.symbol, SYMBOL);
    assert_eq!(trade.entry_price, 10.99);
    assert_eq!(trade.entry_quantity, 1.001);
    assert_eq!(
        trade.entry_time,
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 40, 0).unwrap()
    );
    assert_eq!(trade.exit_price, 17.02);
    assert_eq!(trade.exit_quantity, 0.999);
    assert_eq!(
        trade.exit_time,
        Utc.with_ymd_and_hms(2024, 3, 1, 1, 20, 0).unwrap()
    );

    let expected_pnl = 17.02 * 0.999 - 10.99 * 1.001;
    assert!((trade.pnl - expected_pnl).abs() < 1e-9);
    assert!((summary.realized_pnl - expected_pnl).abs() < 1e-9);

    assert_eq!(summary.final_state.phase(), Phase::Flat);
    assert_eq!(store.load(), summary.final_state);
    assert_eq!(summary.config_fingerprint.len(), 64);
}

#[test]
fn flat_history_never_trades() {
    let summary = replay_closes(&[10.0; 30]);

    assert_eq!(summary.candles, 30);
    assert_eq!(summary.stats.decisions, 0);
    assert!(summary.trades.is_empty());
    assert_eq!(summary.realized_pnl, 0.0);
    assert_eq!(summary.final_state.phase(), Phase::Flat);
}

// ── Stream failures ──────────────────────────────────────────────────

struct ScriptedStream {
    events: VecDeque<Result<StreamEvent, ExchangeError>>,
    reconnects: usize,
    fail_reconnect: bool,
}

impl ScriptedStream {
    fn new(events: Vec<Result<StreamEvent, ExchangeError>>) -> Self {
        Self {
            events: events.into(),
            reconnects: 0,
            fail_reconnect: false,
        }
    }
}

impl CandleStream for ScriptedStream {
    fn next_event(&mut self) -> Result<StreamEvent, ExchangeError> {
        self.events.pop_front().unwrap_or(Ok(StreamEvent::Closed))
    }

    fn reconnect(&mut self) -> Result<(), ExchangeError> {
        self.reconnects += 1;
        if self.fail_reconnect {
            Err(ExchangeError::NetworkUnreachable("scripted".into()))
        } else {
            Ok(())
        }
    }
}

fn stream_candle(cycle: usize) -> StreamEvent {
    let open_time =
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + Duration::minutes(5 * cycle as i64);
    StreamEvent::Candle(CandleEvent {
        symbol: SYMBOL.into(),
        interval: CandleInterval::Min5,
        candle: Candle {
            open_time,
            close_time: open_time + Duration::minutes(5),
            open: 10.0,
            high: 12.0,
            low: 8.0,
            close: 10.0,
            volume: 1000.0,
            is_final: true,
        },
    })
}

#[test]
fn transport_errors_reconnect_and_resume() {
    let mut stream = ScriptedStream::new(vec![
        Ok(stream_candle(0)),
        Ok(StreamEvent::TransportError("ws gap".into())),
        Ok(stream_candle(1)),
        Err(ExchangeError::NetworkUnreachable("read failed".into())),
        Ok(stream_candle(2)),
        Ok(StreamEvent::Closed),
    ]);
    let mut gateway = PaperExchange::new(3);
    let mut store = MemoryStateStore::default();
    let mut notifier = LogNotifier::default();
    let mut engine = Engine::new(trend_config(), PositionState::default());

    let summary = drive(
        &mut engine,
        &mut stream,
        &mut gateway,
        &mut store,
        &mut notifier,
    )
    .unwrap();

    assert_eq!(summary.candles, 3, "candles on both sides of the gaps count");
    assert_eq!(stream.reconnects, 2);
}

#[test]
fn reconnect_failure_aborts_the_replay() {
    let mut stream = ScriptedStream::new(vec![
        Ok(stream_candle(0)),
        Ok(StreamEvent::TransportError("ws gap".into())),
        Ok(stream_candle(1)),
    ]);
    stream.fail_reconnect = true;
    let mut gateway = PaperExchange::new(3);
    let mut store = MemoryStateStore::default();
    let mut notifier = LogNotifier::default();
    let mut engine = Engine::new(trend_config(), PositionState::default());

    let err = drive(
        &mut engine,
        &mut stream,
        &mut gateway,
        &mut store,
        &mut notifier,
    )
    .unwrap_err();

    assert!(matches!(err, ReplayError::StreamFailed(_)));
    assert_eq!(engine.stats().cycles, 1, "only the candle before the break ran");
}

// ── Artifacts ────────────────────────────────────────────────────────

#[test]
fn artifacts_reflect_the_run() {
    let summary = replay_closes(&trending_closes());
    let dir = tempfile::tempdir().unwrap();
    let run_dir = save_artifacts(&summary, dir.path()).unwrap();

    let trades_csv = std::fs::read_to_string(run_dir.join("trades.csv")).unwrap();
    assert_eq!(trades_csv.lines().count(), 2, "header plus one trade");
    assert!(trades_csv.contains(SYMBOL));
    assert!(trades_csv.contains("10.99"));
    assert!(trades_csv.contains("17.02"));

    let json = std::fs::read_to_string(run_dir.join("summary.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["symbol"], SYMBOL);
    assert_eq!(value["candles"], 20);
    assert_eq!(value["stats"]["fills"], 2);
    assert_eq!(value["trades"].as_array().unwrap().len(), 1);
}
