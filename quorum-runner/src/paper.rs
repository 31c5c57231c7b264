//! Simulated exchange for replays.
//!
//! The exchange keeps every candle the engine has observed and resolves
//! orders lazily when their status is queried. A limit buy fills once a
//! later candle trades at or below the limit price, a limit sell once
//! one trades at or above it; market orders fill at the next observed
//! close. An order that stays open longer than `max_open_candles` comes
//! back cancelled, the way a live venue times out a stale quote.
//!
//! Fills only ever match candles that arrived strictly after the
//! submission. The candle that produced the signal is already over, so
//! letting an order fill against it would be lookahead.

use std::collections::HashMap;

use tracing::debug;

use quorum_core::domain::{
    Candle, OrderAck, OrderRequest, OrderResolution, OrderSide, OrderStatus, OrderType,
};
use quorum_core::gateway::{ExchangeError, ExchangeGateway};

struct PaperOrder {
    request: OrderRequest,
    /// Index into `seen` of the first candle this order may fill against.
    submitted_at: usize,
    /// Cached once terminal, so a resolved order never changes its story.
    resolution: Option<OrderResolution>,
}

/// In-memory exchange that fills orders against replayed candles.
pub struct PaperExchange {
    orders: HashMap<String, PaperOrder>,
    next_id: u64,
    seen: Vec<Candle>,
    max_open_candles: usize,
}

impl PaperExchange {
    pub fn new(max_open_candles: usize) -> Self {
        Self {
            orders: HashMap::new(),
            next_id: 0,
            seen: Vec::new(),
            max_open_candles,
        }
    }

    /// Number of candles observed so far.
    pub fn candles_seen(&self) -> usize {
        self.seen.len()
    }
}

impl ExchangeGateway for PaperExchange {
    fn submit_order(&mut self, request: &OrderRequest) -> Result<OrderAck, ExchangeError> {
        self.next_id += 1;
        let order_id = format!("paper-{}", self.next_id);
        self.orders.insert(
            order_id.clone(),
            PaperOrder {
                request: request.clone(),
                submitted_at: self.seen.len(),
                resolution: None,
            },
        );
        debug!(
            "paper: accepted {} {} {:?} x{}",
            order_id, request.symbol, request.order_type, request.quantity
        );
        Ok(OrderAck { order_id })
    }

    fn order_status(&mut self, order_id: &str) -> Result<OrderResolution, ExchangeError> {
        let order = self
            .orders
            .get_mut(order_id)
            .ok_or_else(|| ExchangeError::UnknownOrder(order_id.to_string()))?;

        if let Some(resolution) = &order.resolution {
            return Ok(resolution.clone());
        }

        let fill_price = match order.request.order_type {
            OrderType::Market => self.seen.get(order.submitted_at).map(|c| c.close),
            OrderType::Limit { limit_price } => self.seen[order.submitted_at..]
                .iter()
                .any(|candle| match order.request.side {
                    OrderSide::Buy => candle.low <= limit_price,
                    OrderSide::Sell => candle.high >= limit_price,
                })
                .then_some(limit_price),
        };

        let open_for = self.seen.len().saturating_sub(order.submitted_at);
        let resolution = if let Some(price) = fill_price {
            debug!("paper: {} filled @ {}", order_id, price);
            OrderResolution {
                order_id: order_id.to_string(),
                status: OrderStatus::Filled,
                side: order.request.side,
                fill_price: price,
                fill_quantity: order.request.quantity,
            }
        } else if open_for > self.max_open_candles {
            debug!("paper: {} cancelled after {} candles", order_id, open_for);
            OrderResolution {
                order_id: order_id.to_string(),
                status: OrderStatus::Cancelled,
                side: order.request.side,
                fill_price: 0.0,
                fill_quantity: 0.0,
            }
        } else {
            OrderResolution {
                order_id: order_id.to_string(),
                status: OrderStatus::New,
                side: order.request.side,
                fill_price: 0.0,
                fill_quantity: 0.0,
            }
        };

        if resolution.status.is_terminal() {
            order.resolution = Some(resolution.clone());
        }
        Ok(resolution)
    }

    fn on_market_data(&mut self, candle: &Candle) {
        self.seen.push(candle.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn candle(close: f64) -> Candle {
        let open_time = Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap();
        Candle {
            open_time,
            close_time: open_time + Duration::minutes(5),
            open: close,
            high: close + 2.0,
            low: close - 2.0,
            close,
            volume: 1000.0,
            is_final: true,
        }
    }

    fn limit_buy(limit_price: f64) -> OrderRequest {
        OrderRequest {
            symbol: "BTCUSDT".into(),
            side: OrderSide::Buy,
            order_type: OrderType::Limit { limit_price },
            quantity: 1.0,
        }
    }

    #[test]
    fn limit_buy_fills_when_low_crosses() {
        let mut exchange = PaperExchange::new(10);
        exchange.on_market_data(&candle(100.0));
        let ack = exchange.submit_order(&limit_buy(99.0)).unwrap();

        // The signal candle itself cannot fill the order.
        let status = exchange.order_status(&ack.order_id).unwrap();
        assert_eq!(status.status, OrderStatus::New);

        // The next candle's low reaches 97: fills at the limit, not the low.
        exchange.on_market_data(&candle(99.0));
        let status = exchange.order_status(&ack.order_id).unwrap();
        assert_eq!(status.status, OrderStatus::Filled);
        assert_eq!(status.fill_price, 99.0);
        assert_eq!(status.fill_quantity, 1.0);
        assert_eq!(status.side, OrderSide::Buy);
    }

    #[test]
    fn limit_sell_fills_when_high_crosses() {
        let mut exchange = PaperExchange::new(10);
        exchange.on_market_data(&candle(100.0));
        let ack = exchange
            .submit_order(&OrderRequest {
                symbol: "BTCUSDT".into(),
                side: OrderSide::Sell,
                order_type: OrderType::Limit { limit_price: 101.5 },
                quantity: 0.5,
            })
            .unwrap();

        exchange.on_market_data(&candle(100.0)); // high 102 >= 101.5
        let status = exchange.order_status(&ack.order_id).unwrap();
        assert_eq!(status.status, OrderStatus::Filled);
        assert_eq!(status.fill_price, 101.5);
        assert_eq!(status.side, OrderSide::Sell);
    }

    #[test]
    fn market_order_fills_at_next_close() {
        let mut exchange = PaperExchange::new(10);
        exchange.on_market_data(&candle(100.0));
        let ack = exchange
            .submit_order(&OrderRequest {
                symbol: "BTCUSDT".into(),
                side: OrderSide::Buy,
                order_type: OrderType::Market,
                quantity: 2.0,
            })
            .unwrap();

        // No later candle yet: still pending.
        let status = exchange.order_status(&ack.order_id).unwrap();
        assert_eq!(status.status, OrderStatus::New);

        exchange.on_market_data(&candle(104.0));
        let status = exchange.order_status(&ack.order_id).unwrap();
        assert_eq!(status.status, OrderStatus::Filled);
        assert_eq!(status.fill_price, 104.0);
    }

    #[test]
    fn stale_order_is_cancelled() {
        let mut exchange = PaperExchange::new(2);
        exchange.on_market_data(&candle(100.0));
        // Limit far below any low: never fills
        let ack = exchange.submit_order(&limit_buy(50.0)).unwrap();

        exchange.on_market_data(&candle(100.0));
        assert_eq!(
            exchange.order_status(&ack.order_id).unwrap().status,
            OrderStatus::New
        );
        exchange.on_market_data(&candle(100.0));
        assert_eq!(
            exchange.order_status(&ack.order_id).unwrap().status,
            OrderStatus::New
        );
        exchange.on_market_data(&candle(100.0));
        assert_eq!(
            exchange.order_status(&ack.order_id).unwrap().status,
            OrderStatus::Cancelled
        );
    }

    #[test]
    fn resolution_is_cached() {
        let mut exchange = PaperExchange::new(2);
        exchange.on_market_data(&candle(100.0));
        let ack = exchange.submit_order(&limit_buy(99.0)).unwrap();
        exchange.on_market_data(&candle(99.0));

        let first = exchange.order_status(&ack.order_id).unwrap();
        assert_eq!(first.status, OrderStatus::Filled);

        // Many candles later (past the timeout) the answer is the same.
        for _ in 0..5 {
            exchange.on_market_data(&candle(200.0));
        }
        let again = exchange.order_status(&ack.order_id).unwrap();
        assert_eq!(again, first);
    }

    #[test]
    fn unknown_order_is_an_error() {
        let mut exchange = PaperExchange::new(2);
        assert!(matches!(
            exchange.order_status("paper-404"),
            Err(ExchangeError::UnknownOrder(_))
        ));
    }

    #[test]
    fn ids_are_unique_and_sequential() {
        let mut exchange = PaperExchange::new(2);
        let a = exchange.submit_order(&limit_buy(99.0)).unwrap();
        let b = exchange.submit_order(&limit_buy(98.0)).unwrap();
        assert_eq!(a.order_id, "paper-1");
        assert_eq!(b.order_id, "paper-2");
    }
}
