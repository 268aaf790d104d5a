// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Windowed rate tracking over monotonically increasing counters.

/// Fixed-size circular buffer of per-tick deltas from a cumulative counter.
///
/// Each sweep tick feeds the current counter value into `update()`; the
/// observed delta lands in the current slot and the cursor wraps at the
/// window size. `total()` approximates throughput over the last `window`
/// ticks (60 slots at a 5 s cadence give a 5-minute moving window).
///
/// The window is measured in update calls, not wall-clock time: if the
/// sweep cadence drifts, the window silently covers the last N calls.
#[derive(Debug, Clone)]
pub struct RateWindow {
    /// Per-tick deltas, zero-initialized (warm-up ticks contribute nothing)
    deltas: Vec<u64>,

    /// Next slot to overwrite, wraps at deltas.len()
    cursor: usize,

    /// Last observed counter value (None until the first update)
    last: Option<u64>,
}

/// Default window size (60 slots, 5-minute window at the 5 s sweep cadence).
pub const DEFAULT_RATE_WINDOW: usize = 60;

impl RateWindow {
    /// Create a window of `window` delta slots.
    pub fn new(window: usize) -> Self {
        Self {
            deltas: vec![0; window.max(1)],
            cursor: 0,
            last: None,
        }
    }

    /// Feed the current counter value.
    ///
    /// A non-decreasing value records `value - last` in the current slot.
    /// A decreasing value is a counter reset (source restart): the delta
    /// write is skipped so the window never receives a bogus negative
    /// contribution, but the baseline is resynchronized either way.
    pub fn update(&mut self, value: u64) {
        if let Some(last) = self.last {
            if value >= last {
                self.push(value - last);
            } else {
                log::debug!(
                    "[metrics] counter regression ({} -> {}), resetting baseline",
                    last,
                    value
                );
            }
        }
        self.last = Some(value);
    }

    /// Sum of all slots: the moving-window total.
    ///
    /// Underestimates during warm-up while unwritten slots are still zero.
    pub fn total(&self) -> u64 {
        self.deltas.iter().sum()
    }

    /// Number of delta slots.
    pub fn window(&self) -> usize {
        self.deltas.len()
    }

    /// Last observed counter value, if any.
    pub fn last(&self) -> Option<u64> {
        self.last
    }

    fn push(&mut self, delta: u64) {
        self.deltas[self.cursor] = delta;
        self.cursor = (self.cursor + 1) % self.deltas.len();
    }
}

impl Default for RateWindow {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_WINDOW)
    }
}
