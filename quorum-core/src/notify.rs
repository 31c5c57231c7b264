//! Outbound notifications for order lifecycle events.
//!
//! Notifications are fire-and-forget: the engine reports failures to the
//! log and moves on, because a dead mailbox must never stop trading.

use thiserror::Error;
use tracing::info;

use crate::domain::OrderSide;

/// What happened. One category per (event, side) pair plus a catch-all
/// for errors, mirroring the distinct mails a human operator expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyCategory {
    BuySubmitted,
    BuyFilled,
    BuyCancelled,
    SellSubmitted,
    SellFilled,
    SellCancelled,
    Error,
}

impl NotifyCategory {
    pub fn submitted(side: OrderSide) -> Self {
        match side {
            OrderSide::Buy => NotifyCategory::BuySubmitted,
            OrderSide::Sell => NotifyCategory::SellSubmitted,
        }
    }

    pub fn filled(side: OrderSide) -> Self {
        match side {
            OrderSide::Buy => NotifyCategory::BuyFilled,
            OrderSide::Sell => NotifyCategory::SellFilled,
        }
    }

    pub fn cancelled(side: OrderSide) -> Self {
        match side {
            OrderSide::Buy => NotifyCategory::BuyCancelled,
            OrderSide::Sell => NotifyCategory::SellCancelled,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NotifyCategory::BuySubmitted => "buy submitted",
            NotifyCategory::BuyFilled => "buy filled",
            NotifyCategory::BuyCancelled => "buy cancelled",
            NotifyCategory::SellSubmitted => "sell submitted",
            NotifyCategory::SellFilled => "sell filled",
            NotifyCategory::SellCancelled => "sell cancelled",
            NotifyCategory::Error => "error",
        }
    }
}

/// One notification.
#[derive(Debug, Clone, PartialEq)]
pub struct NotifyEvent {
    pub category: NotifyCategory,
    pub symbol: String,
    pub price: f64,
    pub quantity: f64,
    pub detail: Option<String>,
}

impl NotifyEvent {
    pub fn order(category: NotifyCategory, symbol: &str, price: f64, quantity: f64) -> Self {
        Self {
            category,
            symbol: symbol.to_string(),
            price,
            quantity,
            detail: None,
        }
    }

    pub fn error(symbol: &str, message: impl Into<String>) -> Self {
        Self {
            category: NotifyCategory::Error,
            symbol: symbol.to_string(),
            price: 0.0,
            quantity: 0.0,
            detail: Some(message.into()),
        }
    }
}

/// Errors from a notification channel.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification transport failed: {0}")]
    Transport(String),
}

/// Notification sink, so we can swap a mail or chat channel for the log
/// and capture events in tests.
pub trait Notifier: Send {
    fn notify(&mut self, event: &NotifyEvent) -> Result<(), NotifyError>;
}

/// Writes every notification to the log. The default sink, and the
/// fallback wiring when no external channel is configured.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, event: &NotifyEvent) -> Result<(), NotifyError> {
        match &event.detail {
            Some(detail) => info!(
                "[{}] {}: {} (price {}, qty {})",
                event.symbol,
                event.category.as_str(),
                detail,
                event.price,
                event.quantity
            ),
            None => info!(
                "[{}] {}: price {}, qty {}",
                event.symbol,
                event.category.as_str(),
                event.price,
                event.quantity
            ),
        }
        Ok(())
    }
}
