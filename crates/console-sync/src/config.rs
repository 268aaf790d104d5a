// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Synchronization engine configuration.

use crate::metrics::{DEFAULT_RATE_WINDOW, DEFAULT_SERIES_SIZE};
use std::time::Duration;

/// Configuration for a [`ConsoleService`](crate::ConsoleService).
///
/// Defaults match the cadences the console UI was tuned for: rates are
/// recomputed every 5 s over a 60-slot window (a 5-minute moving window)
/// and depth history is sampled every 30 s.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Cadence of the rate sweep feeding counters into rate windows.
    pub delta_interval: Duration,

    /// Cadence of the depth sweep sampling stored-message depth.
    pub depth_interval: Duration,

    /// Debounce delay for observer notifications.
    pub notify_delay: Duration,

    /// Hard ceiling on notification latency under a steady event stream.
    pub notify_max_delay: Duration,

    /// Samples retained per address depth series.
    pub depth_series_size: usize,

    /// Delta slots per rate window.
    pub rate_window: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            delta_interval: Duration::from_secs(5),
            depth_interval: Duration::from_secs(30),
            notify_delay: Duration::from_millis(10),
            notify_max_delay: Duration::from_millis(500),
            depth_series_size: DEFAULT_SERIES_SIZE,
            rate_window: DEFAULT_RATE_WINDOW,
        }
    }
}

impl SyncConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the rate sweep cadence.
    pub fn with_delta_interval(mut self, interval: Duration) -> Self {
        self.delta_interval = interval;
        self
    }

    /// Builder: set the depth sweep cadence.
    pub fn with_depth_interval(mut self, interval: Duration) -> Self {
        self.depth_interval = interval;
        self
    }

    /// Builder: set the notification debounce delay and ceiling.
    pub fn with_notify_delays(mut self, delay: Duration, max_delay: Duration) -> Self {
        self.notify_delay = delay;
        self.notify_max_delay = max_delay;
        self
    }

    /// Builder: set the depth series capacity.
    pub fn with_depth_series_size(mut self, size: usize) -> Self {
        self.depth_series_size = size;
        self
    }

    /// Builder: set the rate window size.
    pub fn with_rate_window(mut self, window: usize) -> Self {
        self.rate_window = window;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.delta_interval.is_zero() {
            return Err("delta_interval must be > 0");
        }
        if self.depth_interval.is_zero() {
            return Err("depth_interval must be > 0");
        }
        if self.notify_delay > self.notify_max_delay {
            return Err("notify_delay must not exceed notify_max_delay");
        }
        if self.depth_series_size == 0 {
            return Err("depth_series_size must be > 0");
        }
        if self.rate_window == 0 {
            return Err("rate_window must be > 0");
        }
        Ok(())
    }
}
