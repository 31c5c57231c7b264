//! Candle intervals supported by the engine.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The closed set of candle intervals the engine understands.
///
/// Every supported interval maps to a unique duration in seconds, and
/// every supported duration maps back to exactly one interval. Anything
/// outside this set is rejected at config-load time rather than silently
/// defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandleInterval {
    Min1,
    Min3,
    Min5,
    Min15,
    Min30,
    Hour1,
    Hour4,
    Day1,
}

impl CandleInterval {
    pub const ALL: [CandleInterval; 8] = [
        CandleInterval::Min1,
        CandleInterval::Min3,
        CandleInterval::Min5,
        CandleInterval::Min15,
        CandleInterval::Min30,
        CandleInterval::Hour1,
        CandleInterval::Hour4,
        CandleInterval::Day1,
    ];

    /// Exchange-style label, e.g. "5m" or "1h".
    pub fn as_str(self) -> &'static str {
        match self {
            CandleInterval::Min1 => "1m",
            CandleInterval::Min3 => "3m",
            CandleInterval::Min5 => "5m",
            CandleInterval::Min15 => "15m",
            CandleInterval::Min30 => "30m",
            CandleInterval::Hour1 => "1h",
            CandleInterval::Hour4 => "4h",
            CandleInterval::Day1 => "1d",
        }
    }

    /// Duration of one candle at this interval.
    pub fn seconds(self) -> u64 {
        match self {
            CandleInterval::Min1 => 60,
            CandleInterval::Min3 => 180,
            CandleInterval::Min5 => 300,
            CandleInterval::Min15 => 900,
            CandleInterval::Min30 => 1800,
            CandleInterval::Hour1 => 3600,
            CandleInterval::Hour4 => 14_400,
            CandleInterval::Day1 => 86_400,
        }
    }

    /// Inverse of `seconds`. Returns None for durations outside the
    /// supported set.
    pub fn from_seconds(seconds: u64) -> Option<Self> {
        Self::ALL.iter().copied().find(|i| i.seconds() == seconds)
    }

    /// Parses an exchange-style label such as "15m".
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|i| i.as_str() == label)
    }
}

impl fmt::Display for CandleInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CandleInterval {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Accepts either a label ("5m") or a duration in seconds (300).
///
/// Config files use the label form; upstream exchange payloads sometimes
/// carry raw seconds. Both deserialize to the same closed set, and
/// unsupported values produce an error naming the accepted labels.
impl<'de> Deserialize<'de> for CandleInterval {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IntervalVisitor;

        impl<'de> Visitor<'de> for IntervalVisitor {
            type Value = CandleInterval;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(
                    f,
                    "a candle interval label (one of 1m, 3m, 5m, 15m, 30m, 1h, 4h, 1d) \
                     or its duration in seconds"
                )
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                CandleInterval::from_label(value).ok_or_else(|| {
                    E::custom(format!(
                        "unsupported candle interval '{value}' (expected one of \
                         1m, 3m, 5m, 15m, 30m, 1h, 4h, 1d)"
                    ))
                })
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
                CandleInterval::from_seconds(value).ok_or_else(|| {
                    E::custom(format!("unsupported candle interval: {value} seconds"))
                })
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
                u64::try_from(value)
                    .ok()
                    .and_then(CandleInterval::from_seconds)
                    .ok_or_else(|| {
                        E::custom(format!("unsupported candle interval: {value} seconds"))
                    })
            }
        }

        deserializer.deserialize_any(IntervalVisitor)
    }
}
