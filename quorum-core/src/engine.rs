//! Candle-by-candle decision loop — the heart of the trading engine.
//!
//! Four phases per final candle:
//! 1. Observe: push the close into the rolling window
//! 2. Reconcile: resolve the pending order against the exchange
//! 3. Score: recompute indicators from the window and tally votes
//! 4. Act: submit at most one order, persisting state after every change
//!
//! The engine owns no I/O. Market data, the exchange, the state store,
//! and notifications all arrive through traits, so the same loop runs
//! live, in replays, and under test mocks.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{BotConfig, OrderKind};
use crate::domain::{
    CandleEvent, OrderRequest, OrderResolution, OrderSide, OrderStatus, OrderType, PendingOrder,
};
use crate::gateway::ExchangeGateway;
use crate::indicators::IndicatorSet;
use crate::notify::{Notifier, NotifyCategory, NotifyEvent};
use crate::position::{Phase, PositionState, StateError, StateStore};
use crate::reconcile::{reconcile_pending, ReconcileOutcome};
use crate::scorer::{Decision, SignalScorer};
use crate::window::RollingWindow;

/// Errors that abort a cycle.
///
/// Exchange and notification failures are handled in-cycle; only a
/// failure to persist state is fatal, because continuing would let disk
/// and memory drift apart.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("state persistence failed: {0}")]
    State(#[from] StateError),
}

/// How a cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Event was for another symbol/interval or not a final candle.
    Ignored,
    /// An order is still in flight (or its status query failed); no
    /// decision this cycle.
    AwaitingFill,
    /// The window has not warmed up enough for a full snapshot.
    NotReady,
    /// Scored, but no order went out.
    Held,
    /// An order was submitted and acknowledged.
    Submitted(OrderSide),
    /// The exchange refused the submission; state is unchanged.
    SubmitFailed,
}

/// Everything a driver needs to know about one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    /// Set when this cycle resolved the pending order (fill or cancel).
    pub resolution: Option<OrderResolution>,
}

/// Counters accumulated across cycles, reported in replay summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    /// Final candles consumed.
    pub cycles: u64,
    /// Events dropped by the symbol/interval/final gate.
    pub ignored: u64,
    /// Cycles that ended before scoring for lack of a snapshot.
    pub not_ready: u64,
    /// Cycles skipped because an order was in flight.
    pub awaiting_fill: u64,
    /// Non-hold decisions, before the position guards.
    pub decisions: u64,
    pub buys_submitted: u64,
    pub sells_submitted: u64,
    pub submit_failures: u64,
    pub fills: u64,
    pub cancels: u64,
}

/// Single-instrument decision engine.
///
/// Construct with the state loaded from the store, then feed it every
/// stream event. The engine mutates its own state and persists through
/// the store it is handed; collaborators are passed per call so drivers
/// keep ownership.
#[derive(Debug)]
pub struct Engine {
    config: BotConfig,
    window: RollingWindow,
    indicators: IndicatorSet,
    scorer: SignalScorer,
    state: PositionState,
    stats: EngineStats,
}

impl Engine {
    /// Wires up an engine from a validated config and a bootstrap state.
    ///
    /// The caller decides where the state comes from (usually
    /// `store.load()`), which keeps the restart path explicit.
    pub fn new(config: BotConfig, initial_state: PositionState) -> Self {
        let window = RollingWindow::new(config.window_capacity);
        let indicators = IndicatorSet::new(config.indicators.clone());
        let scorer = SignalScorer::new(config.scorer.clone());
        Self {
            config,
            window,
            indicators,
            scorer,
            state: initial_state,
            stats: EngineStats::default(),
        }
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn state(&self) -> &PositionState {
        &self.state
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Runs one full cycle against a candle event.
    pub fn on_candle(
        &mut self,
        event: &CandleEvent,
        gateway: &mut dyn ExchangeGateway,
        store: &mut dyn StateStore,
        notifier: &mut dyn Notifier,
    ) -> Result<CycleReport, EngineError> {
        // ─── Phase 1: Observe ───
        if event.symbol != self.config.symbol
            || event.interval != self.config.interval
            || !event.candle.is_final
        {
            self.stats.ignored += 1;
            return Ok(CycleReport {
                outcome: CycleOutcome::Ignored,
                resolution: None,
            });
        }

        gateway.on_market_data(&event.candle);
        self.stats.cycles += 1;
        let close = event.candle.close;
        self.window.push(close);

        // ─── Phase 2: Reconcile ───
        let pending_before = self.state.pending.clone();
        let resolution = match reconcile_pending(&mut self.state, gateway) {
            ReconcileOutcome::NoPending => None,
            ReconcileOutcome::Resolved(resolution) => {
                store.save(&self.state)?;
                self.record_resolution(&resolution, pending_before.as_ref(), notifier);
                Some(resolution)
            }
            ReconcileOutcome::StillPending => {
                self.stats.awaiting_fill += 1;
                return Ok(CycleReport {
                    outcome: CycleOutcome::AwaitingFill,
                    resolution: None,
                });
            }
            ReconcileOutcome::QueryFailed(message) => {
                warn!(
                    "{}: order status query failed, retrying next candle: {}",
                    self.config.symbol, message
                );
                self.stats.awaiting_fill += 1;
                return Ok(CycleReport {
                    outcome: CycleOutcome::AwaitingFill,
                    resolution: None,
                });
            }
        };

        // ─── Phase 3: Score ───
        let closes = self.window.snapshot();
        let snapshot = match self.indicators.compute(&closes) {
            Some(snapshot) => snapshot,
            None => {
                self.stats.not_ready += 1;
                return Ok(CycleReport {
                    outcome: CycleOutcome::NotReady,
                    resolution,
                });
            }
        };
        let signal = self.scorer.score(&snapshot, close);
        let decision = self.scorer.decide(&signal);

        // ─── Phase 4: Act ───
        let outcome = match decision {
            Decision::Buy => {
                self.stats.decisions += 1;
                if self.state.phase() == Phase::Flat {
                    self.submit(OrderSide::Buy, close, gateway, store, notifier)?
                } else {
                    debug!(
                        "{}: buy signal while {:?}, holding",
                        self.config.symbol,
                        self.state.phase()
                    );
                    CycleOutcome::Held
                }
            }
            Decision::Sell => {
                self.stats.decisions += 1;
                if self
                    .state
                    .exit_allowed(close, self.config.order.profit_margin)
                {
                    self.submit(OrderSide::Sell, close, gateway, store, notifier)?
                } else {
                    debug!(
                        "{}: sell signal blocked (phase {:?}, close {}, entry {})",
                        self.config.symbol,
                        self.state.phase(),
                        close,
                        self.state.entry_price
                    );
                    CycleOutcome::Held
                }
            }
            Decision::Hold => CycleOutcome::Held,
        };

        Ok(CycleReport {
            outcome,
            resolution,
        })
    }

    fn record_resolution(
        &mut self,
        resolution: &OrderResolution,
        pending_before: Option<&PendingOrder>,
        notifier: &mut dyn Notifier,
    ) {
        match resolution.status {
            OrderStatus::Filled => {
                self.stats.fills += 1;
                info!(
                    "{}: order {} filled, {} {} @ {}",
                    self.config.symbol,
                    resolution.order_id,
                    resolution.side.as_str(),
                    resolution.fill_quantity,
                    resolution.fill_price
                );
                self.send(
                    notifier,
                    NotifyEvent::order(
                        NotifyCategory::filled(resolution.side),
                        &self.config.symbol,
                        resolution.fill_price,
                        resolution.fill_quantity,
                    ),
                );
            }
            OrderStatus::Cancelled => {
                self.stats.cancels += 1;
                // The resolution carries no prices for a cancel; report
                // what we had asked for.
                let (price, quantity) = pending_before
                    .map(|p| (p.requested_price, p.requested_quantity))
                    .unwrap_or((0.0, 0.0));
                info!(
                    "{}: order {} cancelled ({} {} @ {})",
                    self.config.symbol,
                    resolution.order_id,
                    resolution.side.as_str(),
                    quantity,
                    price
                );
                self.send(
                    notifier,
                    NotifyEvent::order(
                        NotifyCategory::cancelled(resolution.side),
                        &self.config.symbol,
                        price,
                        quantity,
                    ),
                );
            }
            OrderStatus::New => {}
        }
    }

    fn submit(
        &mut self,
        side: OrderSide,
        close: f64,
        gateway: &mut dyn ExchangeGateway,
        store: &mut dyn StateStore,
        notifier: &mut dyn Notifier,
    ) -> Result<CycleOutcome, EngineError> {
        let (price, quantity) = self.order_price_quantity(side, close);
        let order_type = match self.config.order.kind {
            OrderKind::Market => OrderType::Market,
            OrderKind::Limit => OrderType::Limit { limit_price: price },
        };
        let request = OrderRequest {
            symbol: self.config.symbol.clone(),
            side,
            order_type,
            quantity,
        };

        match gateway.submit_order(&request) {
            Ok(ack) => {
                self.state.record_submission(PendingOrder {
                    order_id: ack.order_id,
                    side,
                    requested_price: price,
                    requested_quantity: quantity,
                });
                store.save(&self.state)?;
                match side {
                    OrderSide::Buy => self.stats.buys_submitted += 1,
                    OrderSide::Sell => self.stats.sells_submitted += 1,
                }
                info!(
                    "{}: {} submitted, {} @ {}",
                    self.config.symbol,
                    side.as_str(),
                    quantity,
                    price
                );
                self.send(
                    notifier,
                    NotifyEvent::order(
                        NotifyCategory::submitted(side),
                        &self.config.symbol,
                        price,
                        quantity,
                    ),
                );
                Ok(CycleOutcome::Submitted(side))
            }
            Err(e) => {
                self.stats.submit_failures += 1;
                warn!(
                    "{}: {} submission failed: {}",
                    self.config.symbol,
                    side.as_str(),
                    e
                );
                self.send(
                    notifier,
                    NotifyEvent::error(
                        &self.config.symbol,
                        format!("{} submission failed: {e}", side.as_str()),
                    ),
                );
                Ok(CycleOutcome::SubmitFailed)
            }
        }
    }

    /// Rounded price and quantity for a submission at this close.
    ///
    /// Limit orders improve the price by the configured offset (buy
    /// below the close, sell above it) and pad the quantity the opposite
    /// way. Market orders take the close and base quantity as-is.
    fn order_price_quantity(&self, side: OrderSide, close: f64) -> (f64, f64) {
        let order = &self.config.order;
        let (raw_price, raw_quantity) = match order.kind {
            OrderKind::Market => (close, order.base_quantity),
            OrderKind::Limit => match side {
                OrderSide::Buy => (
                    close * (1.0 - order.price_offset),
                    order.base_quantity * (1.0 + order.price_offset),
                ),
                OrderSide::Sell => (
                    close * (1.0 + order.price_offset),
                    order.base_quantity * (1.0 - order.price_offset),
                ),
            },
        };
        (
            round_to(raw_price, order.price_decimals),
            round_to(raw_quantity, order.quantity_decimals),
        )
    }

    fn send(&self, notifier: &mut dyn Notifier, event: NotifyEvent) {
        // Fire-and-forget: a dead notification channel must not stop
        // the engine.
        if let Err(e) = notifier.notify(&event) {
            warn!("{}: notification failed: {}", self.config.symbol, e);
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
