// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sliding time series for point-in-time metrics.

use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

/// Fixed-capacity append-only buffer of (timestamp, value) samples.
///
/// Used for stored-message depth history: the owning entity pushes one
/// sample per depth sweep and the oldest sample is evicted once the
/// buffer is full. Single-writer, read-only to observers.
#[derive(Debug, Clone)]
pub struct TimeSeries {
    /// (timestamp ms since epoch, value) pairs, oldest first
    samples: VecDeque<(u64, i64)>,

    /// Maximum number of retained samples
    max_size: usize,

    /// Last raw value seen by push_delta (None until first call)
    last: Option<i64>,
}

/// Default sample capacity, sized for the compact trend charts.
pub const DEFAULT_SERIES_SIZE: usize = 10;

impl TimeSeries {
    /// Create a series retaining at most `max_size` samples.
    pub fn new(max_size: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(max_size),
            max_size: max_size.max(1),
            last: None,
        }
    }

    /// Append a sample taken now, evicting the oldest when over capacity.
    pub fn push(&mut self, value: i64) {
        self.push_at(now_millis(), value);
    }

    /// Append a sample with an explicit timestamp.
    pub fn push_at(&mut self, timestamp_ms: u64, value: i64) {
        if self.samples.len() >= self.max_size {
            self.samples.pop_front();
        }
        self.samples.push_back((timestamp_ms, value));
    }

    /// Append the delta against the previously pushed raw value.
    ///
    /// The first call stores `value` verbatim; subsequent calls push
    /// `value - last`. Deltas may be negative.
    pub fn push_delta(&mut self, value: i64) {
        match self.last {
            None => self.push(value),
            Some(last) => self.push(value - last),
        }
        self.last = Some(value);
    }

    /// Samples in chronological order.
    pub fn samples(&self) -> impl Iterator<Item = (u64, i64)> + '_ {
        self.samples.iter().copied()
    }

    /// Values only, in chronological order.
    pub fn values(&self) -> Vec<i64> {
        self.samples.iter().map(|&(_, v)| v).collect()
    }

    /// Number of retained samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when no samples have been pushed yet.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of retained samples.
    pub fn capacity(&self) -> usize {
        self.max_size
    }
}

impl Default for TimeSeries {
    fn default() -> Self {
        Self::new(DEFAULT_SERIES_SIZE)
    }
}

/// Current time in milliseconds since epoch.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_push_keeps_order() {
        let mut s = TimeSeries::new(5);
        s.push_at(1, 10);
        s.push_at(2, 20);
        s.push_at(3, 30);

        assert_eq!(s.values(), vec![10, 20, 30]);
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn test_series_evicts_oldest_at_capacity() {
        let mut s = TimeSeries::new(3);
        for i in 0..7 {
            s.push_at(i, i as i64);
        }

        // Only the 3 most recent samples survive, in order
        assert_eq!(s.values(), vec![4, 5, 6]);
        assert_eq!(s.len(), 3);
        assert_eq!(s.capacity(), 3);
    }

    #[test]
    fn test_series_push_delta_first_value_verbatim() {
        let mut s = TimeSeries::new(5);
        s.push_delta(100);

        assert_eq!(s.values(), vec![100]);
    }

    #[test]
    fn test_series_push_delta_subsequent_deltas() {
        let mut s = TimeSeries::new(5);
        s.push_delta(100);
        s.push_delta(130);
        s.push_delta(110); // decreasing raw value -> negative delta

        assert_eq!(s.values(), vec![100, 30, -20]);
    }

    #[test]
    fn test_series_timestamps_monotonic() {
        let mut s = TimeSeries::new(4);
        s.push(1);
        s.push(2);

        let ts: Vec<u64> = s.samples().map(|(t, _)| t).collect();
        assert!(ts[0] <= ts[1]);
    }

    #[test]
    fn test_series_zero_capacity_clamped() {
        let mut s = TimeSeries::new(0);
        s.push_at(1, 42);
        s.push_at(2, 43);

        assert_eq!(s.values(), vec![43]);
    }
}
