//! Window-wide range statistics: min, max, and mean of the closes.

/// Min, max, and mean over an entire close window.
///
/// Unlike the banded indicators these have no warmup; they summarize
/// whatever the window currently holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

/// Computes range statistics over the whole slice.
///
/// Returns None for an empty slice or if any value is NaN, so callers
/// never have to reason about NaN ordering.
pub fn range_stats(closes: &[f64]) -> Option<RangeStats> {
    if closes.is_empty() || closes.iter().any(|v| v.is_nan()) {
        return None;
    }

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    for &close in closes {
        min = min.min(close);
        max = max.max(close);
        sum += close;
    }

    Some(RangeStats {
        min,
        max,
        avg: sum / closes.len() as f64,
    })
}
