//! Bot configuration: TOML loading, validation, and fingerprinting.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::CandleInterval;
use crate::indicators::IndicatorParams;
use crate::scorer::ScorerConfig;

/// Errors while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Which order type the engine submits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderKind {
    Market,
    Limit,
}

/// Sizing and pricing for submitted orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderConfig {
    /// Quantity before the offset adjustment.
    pub base_quantity: f64,
    pub kind: OrderKind,
    /// Fractional price improvement applied to limit orders: buys bid
    /// below the close by this fraction, sells ask above it. The same
    /// fraction pads the quantity in the opposite direction.
    pub price_offset: f64,
    /// Decimal places prices are rounded to before submission.
    pub price_decimals: i32,
    /// Decimal places quantities are rounded to before submission.
    pub quantity_decimals: i32,
    /// Minimum profit per unit before an exit is allowed. Zero means any
    /// close strictly above the entry price may exit.
    pub profit_margin: f64,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            base_quantity: 1.0,
            kind: OrderKind::Limit,
            price_offset: 0.001,
            price_decimals: 2,
            quantity_decimals: 8,
            profit_margin: 0.0,
        }
    }
}

/// Complete configuration for one bot instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotConfig {
    pub symbol: String,
    pub interval: CandleInterval,
    #[serde(default = "default_window_capacity")]
    pub window_capacity: usize,
    #[serde(default)]
    pub indicators: IndicatorParams,
    #[serde(default)]
    pub scorer: ScorerConfig,
    #[serde(default)]
    pub order: OrderConfig,
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,
}

fn default_window_capacity() -> usize {
    500
}

fn default_state_path() -> PathBuf {
    PathBuf::from("state.json")
}

impl BotConfig {
    /// Reads, parses, and validates a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: BotConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every cross-field constraint the type system cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(msg: impl Into<String>) -> ConfigError {
            ConfigError::Invalid(msg.into())
        }

        if self.symbol.trim().is_empty() {
            return Err(invalid("symbol must not be empty"));
        }

        let ind = &self.indicators;
        if ind.rsi_period < 1
            || ind.ema_fast < 1
            || ind.ema_slow < 1
            || ind.signal_period < 1
            || ind.bollinger_period < 1
        {
            return Err(invalid("indicator periods must be at least 1"));
        }
        if ind.ema_fast >= ind.ema_slow {
            return Err(invalid(format!(
                "ema_fast ({}) must be shorter than ema_slow ({})",
                ind.ema_fast, ind.ema_slow
            )));
        }
        if !ind.bollinger_mult.is_finite() || ind.bollinger_mult <= 0.0 {
            return Err(invalid("bollinger_mult must be a positive finite number"));
        }

        // The window must be able to hold a full warmup, or the engine
        // would never leave NotReady.
        let min_samples = ind.min_samples();
        if self.window_capacity < min_samples {
            return Err(invalid(format!(
                "window_capacity ({}) is below the indicator warmup ({min_samples})",
                self.window_capacity
            )));
        }

        let scorer = &self.scorer;
        if scorer.votes.is_empty() {
            return Err(invalid("at least one vote must be configured"));
        }
        let mut seen = Vec::with_capacity(scorer.votes.len());
        for vote in &scorer.votes {
            if seen.contains(vote) {
                return Err(invalid(format!("duplicate vote: {vote:?}")));
            }
            seen.push(*vote);
        }
        if let Some(required) = scorer.required_votes {
            if required < 1 || required > scorer.votes.len() {
                return Err(invalid(format!(
                    "required_votes ({required}) must be between 1 and {}",
                    scorer.votes.len()
                )));
            }
        }
        if !(0.0..=100.0).contains(&scorer.rsi_oversold)
            || !(0.0..=100.0).contains(&scorer.rsi_overbought)
            || scorer.rsi_oversold >= scorer.rsi_overbought
        {
            return Err(invalid(format!(
                "rsi thresholds must satisfy 0 <= oversold ({}) < overbought ({}) <= 100",
                scorer.rsi_oversold, scorer.rsi_overbought
            )));
        }

        let order = &self.order;
        if !order.base_quantity.is_finite() || order.base_quantity <= 0.0 {
            return Err(invalid("base_quantity must be a positive finite number"));
        }
        if !(0.0..1.0).contains(&order.price_offset) {
            return Err(invalid(format!(
                "price_offset ({}) must be in [0, 1)",
                order.price_offset
            )));
        }
        if !order.profit_margin.is_finite() || order.profit_margin < 0.0 {
            return Err(invalid("profit_margin must be zero or positive"));
        }
        if !(0..=12).contains(&order.price_decimals) || !(0..=12).contains(&order.quantity_decimals)
        {
            return Err(invalid("rounding decimals must be between 0 and 12"));
        }

        Ok(())
    }

    /// Computes a deterministic hash of this configuration.
    ///
    /// Two runs with identical configs share a fingerprint, which ties
    /// replay artifacts back to the exact settings that produced them.
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).expect("BotConfig serialization failed");
        let hash = blake3::hash(json.as_bytes());
        format!("{}", hash.to_hex())
    }
}
