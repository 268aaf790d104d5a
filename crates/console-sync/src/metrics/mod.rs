// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Metric primitives derived from entity update streams.
//!
//! Two shapes cover the console's needs:
//!
//! - [`TimeSeries`]: point-in-time samples (stored-message depth history)
//! - [`RateWindow`]: moving-window totals over cumulative counters
//!   (messages in/out per window)
//!
//! Both are pure in-memory, single-writer structures mutated only by the
//! entity that owns them; the sweep timers in the service layer drive
//! when samples are taken.

mod series;
mod window;

pub use series::{TimeSeries, DEFAULT_SERIES_SIZE};
pub use window::{RateWindow, DEFAULT_RATE_WINDOW};
