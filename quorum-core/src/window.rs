//! Bounded rolling window of closing prices.

use std::collections::VecDeque;

/// Fixed-capacity FIFO of the most recent closing prices.
///
/// Pushing beyond capacity evicts the oldest close first, so the window
/// never holds more than `capacity` values and always holds the most
/// recent ones in arrival order.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    closes: VecDeque<f64>,
    capacity: usize,
}

impl RollingWindow {
    /// Panics if `capacity` is zero; a windowless engine cannot decide anything.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "window capacity must be at least 1");
        Self {
            closes: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, close: f64) {
        self.closes.push_back(close);
        while self.closes.len() > self.capacity {
            self.closes.pop_front();
        }
    }

    /// Contiguous copy of the window contents, oldest first.
    ///
    /// Indicators operate on slices; the window hands them one per cycle.
    pub fn snapshot(&self) -> Vec<f64> {
        self.closes.iter().copied().collect()
    }

    pub fn last(&self) -> Option<f64> {
        self.closes.back().copied()
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_up_to_capacity() {
        let mut window = RollingWindow::new(3);
        assert!(window.is_empty());
        window.push(1.0);
        window.push(2.0);
        assert_eq!(window.len(), 2);
        assert_eq!(window.snapshot(), vec![1.0, 2.0]);
    }

    #[test]
    fn evicts_oldest_beyond_capacity() {
        let mut window = RollingWindow::new(3);
        for close in [1.0, 2.0, 3.0, 4.0, 5.0] {
            window.push(close);
        }
        assert_eq!(window.len(), 3);
        assert_eq!(window.snapshot(), vec![3.0, 4.0, 5.0]);
        assert_eq!(window.last(), Some(5.0));
    }

    #[test]
    #[should_panic(expected = "capacity must be at least 1")]
    fn zero_capacity_panics() {
        RollingWindow::new(0);
    }
}
