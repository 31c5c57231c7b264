//! Position state machine for a single instrument.

use serde::{Deserialize, Serialize};

use crate::domain::{OrderSide, PendingOrder};

/// Where the engine stands in its entry/exit cycle.
///
/// The phase is derived from state, never stored: a pending buy means
/// Entering, a pending sell means Exiting, otherwise the position flag
/// decides between Flat and Holding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Flat,
    Entering,
    Holding,
    Exiting,
}

/// Everything the engine must remember across restarts.
///
/// The default is the safe starting point: flat, no entry price, nothing
/// in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionState {
    pub in_position: bool,
    pub entry_price: f64,
    pub pending: Option<PendingOrder>,
}

impl Default for PositionState {
    fn default() -> Self {
        Self {
            in_position: false,
            entry_price: 0.0,
            pending: None,
        }
    }
}

impl PositionState {
    pub fn phase(&self) -> Phase {
        match &self.pending {
            Some(order) => match order.side {
                OrderSide::Buy => Phase::Entering,
                OrderSide::Sell => Phase::Exiting,
            },
            None => {
                if self.in_position {
                    Phase::Holding
                } else {
                    Phase::Flat
                }
            }
        }
    }

    /// Records a freshly acknowledged order as the single in-flight order.
    ///
    /// The engine never submits while something is pending, so a second
    /// submission here is a logic bug.
    pub fn record_submission(&mut self, order: PendingOrder) {
        debug_assert!(self.pending.is_none(), "submission while order pending");
        self.pending = Some(order);
    }

    /// Applies a fill in the direction the exchange reported.
    ///
    /// A buy fill opens the position at the fill price; a sell fill
    /// closes it. Either way the pending slot is cleared.
    pub fn apply_fill(&mut self, side: OrderSide, fill_price: f64) {
        match side {
            OrderSide::Buy => {
                self.in_position = true;
                self.entry_price = fill_price;
            }
            OrderSide::Sell => {
                self.in_position = false;
                self.entry_price = 0.0;
            }
        }
        self.pending = None;
    }

    /// Clears the pending order without touching the position.
    ///
    /// A cancelled entry leaves us Flat, a cancelled exit leaves us
    /// Holding at the original entry price.
    pub fn apply_cancel(&mut self) {
        self.pending = None;
    }

    /// Whether a sell decision may actually go out.
    ///
    /// Only a held position exits, and only at a close above the entry
    /// price plus the configured margin. This is the loss guard: the
    /// engine never sells below what it paid.
    pub fn exit_allowed(&self, close: f64, profit_margin: f64) -> bool {
        self.phase() == Phase::Holding && close > self.entry_price + profit_margin
    }
}
