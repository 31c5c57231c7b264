//! Vote-based signal scoring.
//!
//! Each configured vote inspects the indicator snapshot independently and
//! casts buy, sell, or abstain. The scorer tallies the votes and a quorum
//! rule turns the tally into a decision. Abstentions are not neutral
//! no-ops: under the default unanimity rule a single abstention blocks
//! the trade.

use serde::{Deserialize, Serialize};

use crate::indicators::IndicatorSnapshot;

/// The individual opinions the scorer can consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteKind {
    /// MACD line vs its signal line.
    Trend,
    /// Close breaking out of the Bollinger bands.
    Band,
    /// Close in the outer halves of the window's [min, avg, max] range.
    MeanReversion,
    /// RSI beyond the oversold/overbought thresholds.
    Momentum,
}

/// Which votes participate and how many must agree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorerConfig {
    pub votes: Vec<VoteKind>,
    /// How many same-direction votes trigger a decision. None means all
    /// configured votes must agree.
    pub required_votes: Option<usize>,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            votes: vec![VoteKind::Trend, VoteKind::Band, VoteKind::MeanReversion],
            required_votes: None,
            rsi_oversold: 49.0,
            rsi_overbought: 51.0,
        }
    }
}

/// Tally of one scoring pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Signal {
    pub buy_votes: usize,
    pub sell_votes: usize,
    /// Number of votes consulted, including abstentions.
    pub eligible: usize,
}

/// What the engine should do with the current candle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Decision {
    Buy,
    Sell,
    Hold,
}

/// Tallies votes over a snapshot and applies the quorum rule.
#[derive(Debug, Clone)]
pub struct SignalScorer {
    config: ScorerConfig,
}

impl SignalScorer {
    pub fn new(config: ScorerConfig) -> Self {
        Self { config }
    }

    /// Casts every configured vote against the snapshot.
    ///
    /// Every comparison is strict; equality always abstains, so a flat
    /// market never generates a direction out of thin air.
    pub fn score(&self, snapshot: &IndicatorSnapshot, close: f64) -> Signal {
        let mut buy_votes = 0;
        let mut sell_votes = 0;

        for vote in &self.config.votes {
            let opinion = match vote {
                VoteKind::Trend => {
                    if snapshot.macd > snapshot.macd_signal {
                        Some(true)
                    } else if snapshot.macd < snapshot.macd_signal {
                        Some(false)
                    } else {
                        None
                    }
                }
                VoteKind::Band => {
                    if snapshot.crossed_lower(close) {
                        Some(true)
                    } else if snapshot.crossed_upper(close) {
                        Some(false)
                    } else {
                        None
                    }
                }
                VoteKind::MeanReversion => {
                    let lower_half = (snapshot.range_min + snapshot.range_avg) / 2.0;
                    let upper_half = (snapshot.range_avg + snapshot.range_max) / 2.0;
                    if close < lower_half {
                        Some(true)
                    } else if close > upper_half {
                        Some(false)
                    } else {
                        None
                    }
                }
                VoteKind::Momentum => {
                    if snapshot.rsi < self.config.rsi_oversold {
                        Some(true)
                    } else if snapshot.rsi > self.config.rsi_overbought {
                        Some(false)
                    } else {
                        None
                    }
                }
            };

            match opinion {
                Some(true) => buy_votes += 1,
                Some(false) => sell_votes += 1,
                None => {}
            }
        }

        Signal {
            buy_votes,
            sell_votes,
            eligible: self.config.votes.len(),
        }
    }

    /// Applies the quorum rule to a tally.
    ///
    /// If both directions somehow reach quorum at once, the scorer holds
    /// rather than pick a side.
    pub fn decide(&self, signal: &Signal) -> Decision {
        let threshold = self.config.required_votes.unwrap_or(signal.eligible);
        let buy = signal.buy_votes >= threshold;
        let sell = signal.sell_votes >= threshold;

        match (buy, sell) {
            (true, false) => Decision::Buy,
            (false, true) => Decision::Sell,
            _ => Decision::Hold,
        }
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }
}
