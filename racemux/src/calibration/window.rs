//! Fixed-capacity sliding window of observed speeds.

use std::collections::VecDeque;

/// The last `capacity` observed speeds, oldest first.
#[derive(Debug, Clone)]
pub struct SpeedWindow {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl SpeedWindow {
    /// Create an empty window. A zero capacity is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a sample, returning the evicted one when the window was full.
    pub fn push(&mut self, value: f32) -> Option<f32> {
        let evicted = if self.samples.len() == self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(value);
        evicted
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether the window holds `capacity` samples.
    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    /// Arithmetic mean of the window, `None` when empty.
    pub fn mean(&self) -> Option<f32> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: f64 = self.samples.iter().map(|&v| f64::from(v)).sum();
        Some((sum / self.samples.len() as f64) as f32)
    }

    /// Drop every sample.
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_evicts_oldest() {
        let mut window = SpeedWindow::new(3);
        assert_eq!(window.push(1.0), None);
        assert_eq!(window.push(2.0), None);
        assert_eq!(window.push(3.0), None);
        assert!(window.is_full());
        assert_eq!(window.push(4.0), Some(1.0));
        assert_eq!(window.len(), 3);
        assert_eq!(window.mean(), Some(3.0));
    }

    #[test]
    fn test_empty_window_has_no_mean() {
        let window = SpeedWindow::new(4);
        assert!(window.is_empty());
        assert_eq!(window.mean(), None);
    }

    #[test]
    fn test_zero_capacity_is_one() {
        let mut window = SpeedWindow::new(0);
        assert_eq!(window.capacity(), 1);
        window.push(2.5);
        assert!(window.is_full());
        assert_eq!(window.push(3.5), Some(2.5));
    }
}
