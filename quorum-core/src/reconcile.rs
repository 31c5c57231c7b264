//! Pending-order reconciliation.
//!
//! Before acting on a new candle the engine asks the exchange what became
//! of its one in-flight order. The exchange's record is authoritative:
//! fills are applied in the direction the exchange reports, and a local
//! pending slot that disagrees is corrected, not defended.

use tracing::warn;

use crate::domain::{OrderResolution, OrderStatus};
use crate::gateway::ExchangeGateway;
use crate::position::PositionState;

/// What reconciliation found this cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    /// Nothing in flight; no query was made.
    NoPending,
    /// The order reached a terminal status and state was updated.
    Resolved(OrderResolution),
    /// The order is still open at the exchange.
    StillPending,
    /// The status query itself failed; the pending slot is untouched and
    /// will be retried next cycle.
    QueryFailed(String),
}

/// Queries the pending order, if any, and folds the answer into state.
///
/// Terminal resolutions clear the pending slot, so a resolved order is
/// never queried again.
pub fn reconcile_pending(
    state: &mut PositionState,
    gateway: &mut dyn ExchangeGateway,
) -> ReconcileOutcome {
    let pending = match &state.pending {
        Some(pending) => pending.clone(),
        None => return ReconcileOutcome::NoPending,
    };

    let resolution = match gateway.order_status(&pending.order_id) {
        Ok(resolution) => resolution,
        Err(e) => return ReconcileOutcome::QueryFailed(e.to_string()),
    };

    match resolution.status {
        OrderStatus::New => ReconcileOutcome::StillPending,
        OrderStatus::Filled => {
            if resolution.side != pending.side {
                warn!(
                    "order {} filled as {} but was tracked as {}; applying the exchange's record",
                    resolution.order_id,
                    resolution.side.as_str(),
                    pending.side.as_str()
                );
            }
            state.apply_fill(resolution.side, resolution.fill_price);
            ReconcileOutcome::Resolved(resolution)
        }
        OrderStatus::Cancelled => {
            state.apply_cancel();
            ReconcileOutcome::Resolved(resolution)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OrderAck, OrderRequest, OrderSide, PendingOrder};
    use crate::gateway::ExchangeError;
    use crate::position::Phase;

    /// Gateway that answers every status query the same way.
    enum Script {
        New,
        Filled { side: OrderSide, price: f64 },
        Cancelled,
        Fail,
    }

    struct ScriptedGateway {
        script: Script,
        queries: usize,
    }

    impl ScriptedGateway {
        fn new(script: Script) -> Self {
            Self { script, queries: 0 }
        }
    }

    impl ExchangeGateway for ScriptedGateway {
        fn submit_order(&mut self, _request: &OrderRequest) -> Result<OrderAck, ExchangeError> {
            unreachable!("reconciliation never submits");
        }

        fn order_status(&mut self, order_id: &str) -> Result<OrderResolution, ExchangeError> {
            self.queries += 1;
            match self.script {
                Script::New => Ok(OrderResolution {
                    order_id: order_id.to_string(),
                    status: OrderStatus::New,
                    side: OrderSide::Buy,
                    fill_price: 0.0,
                    fill_quantity: 0.0,
                }),
                Script::Filled { side, price } => Ok(OrderResolution {
                    order_id: order_id.to_string(),
                    status: OrderStatus::Filled,
                    side,
                    fill_price: price,
                    fill_quantity: 1.0,
                }),
                Script::Cancelled => Ok(OrderResolution {
                    order_id: order_id.to_string(),
                    status: OrderStatus::Cancelled,
                    side: OrderSide::Buy,
                    fill_price: 0.0,
                    fill_quantity: 0.0,
                }),
                Script::Fail => Err(ExchangeError::NetworkUnreachable("test".into())),
            }
        }
    }

    fn pending(side: OrderSide) -> PendingOrder {
        PendingOrder {
            order_id: "42".into(),
            side,
            requested_price: 100.0,
            requested_quantity: 1.0,
        }
    }

    #[test]
    fn no_pending_skips_query() {
        let mut state = PositionState::default();
        let mut gateway = ScriptedGateway::new(Script::New);

        let outcome = reconcile_pending(&mut state, &mut gateway);

        assert_eq!(outcome, ReconcileOutcome::NoPending);
        assert_eq!(gateway.queries, 0);
    }

    #[test]
    fn open_order_stays_pending() {
        let mut state = PositionState::default();
        state.record_submission(pending(OrderSide::Buy));
        let mut gateway = ScriptedGateway::new(Script::New);

        let outcome = reconcile_pending(&mut state, &mut gateway);

        assert_eq!(outcome, ReconcileOutcome::StillPending);
        assert_eq!(state.phase(), Phase::Entering);
        assert_eq!(gateway.queries, 1);
    }

    #[test]
    fn buy_fill_opens_position() {
        let mut state = PositionState::default();
        state.record_submission(pending(OrderSide::Buy));
        let mut gateway = ScriptedGateway::new(Script::Filled {
            side: OrderSide::Buy,
            price: 100.0,
        });

        let outcome = reconcile_pending(&mut state, &mut gateway);

        match outcome {
            ReconcileOutcome::Resolved(resolution) => {
                assert_eq!(resolution.status, OrderStatus::Filled);
                assert_eq!(resolution.fill_price, 100.0);
            }
            other => panic!("expected Resolved, got {other:?}"),
        }
        assert_eq!(state.phase(), Phase::Holding);
        assert_eq!(state.entry_price, 100.0);
    }

    #[test]
    fn cancelled_exit_keeps_position() {
        let mut state = PositionState {
            in_position: true,
            entry_price: 95.0,
            pending: Some(pending(OrderSide::Sell)),
        };
        let mut gateway = ScriptedGateway::new(Script::Cancelled);

        let outcome = reconcile_pending(&mut state, &mut gateway);

        assert!(matches!(outcome, ReconcileOutcome::Resolved(_)));
        assert_eq!(state.phase(), Phase::Holding);
        assert_eq!(state.entry_price, 95.0);
    }

    #[test]
    fn fill_side_mismatch_trusts_exchange() {
        // Locally tracked as a buy, but the exchange says a sell filled.
        let mut state = PositionState {
            in_position: true,
            entry_price: 95.0,
            pending: Some(pending(OrderSide::Buy)),
        };
        let mut gateway = ScriptedGateway::new(Script::Filled {
            side: OrderSide::Sell,
            price: 99.0,
        });

        reconcile_pending(&mut state, &mut gateway);

        assert_eq!(state.phase(), Phase::Flat);
        assert_eq!(state.entry_price, 0.0);
    }

    #[test]
    fn query_failure_preserves_pending() {
        let mut state = PositionState::default();
        state.record_submission(pending(OrderSide::Buy));
        let mut gateway = ScriptedGateway::new(Script::Fail);

        let outcome = reconcile_pending(&mut state, &mut gateway);

        assert!(matches!(outcome, ReconcileOutcome::QueryFailed(_)));
        assert_eq!(state.phase(), Phase::Entering);
    }

    #[test]
    fn resolved_order_is_not_requeried() {
        let mut state = PositionState::default();
        state.record_submission(pending(OrderSide::Buy));
        let mut gateway = ScriptedGateway::new(Script::Filled {
            side: OrderSide::Buy,
            price: 100.0,
        });

        reconcile_pending(&mut state, &mut gateway);
        assert_eq!(gateway.queries, 1);

        let outcome = reconcile_pending(&mut state, &mut gateway);
        assert_eq!(outcome, ReconcileOutcome::NoPending);
        assert_eq!(gateway.queries, 1);
    }
}
