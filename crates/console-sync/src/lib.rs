// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # console-sync - Messaging-console state synchronization engine
//!
//! Client-side engine that keeps a management console's view of a
//! messaging cluster (addresses, connections, users) consistent with
//! the remote source of truth, delivered as subject-tagged events over
//! an asynchronous message transport. On top of the synchronized state
//! it derives time-windowed rate metrics from cumulative counters and
//! batches change notifications so observers are never flooded.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use console_sync::{ChannelSink, ConsoleService, Envelope, SyncConfig};
//!
//! fn main() -> console_sync::Result<()> {
//!     let (sink, commands) = ChannelSink::new();
//!     let (events_tx, events_rx) = crossbeam::channel::unbounded::<Envelope>();
//!
//!     let mut service = ConsoleService::new(
//!         SyncConfig::default(),
//!         Box::new(sink),
//!         Box::new(|reason| println!("changed: {}", reason)),
//!     )?;
//!
//!     // The embedding application bridges events_tx and commands to
//!     // its transport; the engine runs until events_tx is dropped.
//!     service.run(events_rx);
//!     # let _ = (events_tx, commands);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! transport -> ConsoleService (dispatch by subject)
//!                |-> EntityIndex mutation (addresses/connections/users)
//!                |     |-> TimeSeries / RateWindow updates
//!                |-> Coalescer -> observer callback (one call per reason)
//!                `-> CommandSink (fire-and-forget commands) -> transport
//!
//! timers: 5 s rate sweep, 30 s depth sweep (independent of events)
//! ```
//!
//! Everything runs sequentially on the thread driving the engine; there
//! is no locking around the index or the metric buffers.

/// Engine configuration (sweep cadences, window sizes, notify delays).
pub mod config;
/// Keyed entity collections and the address-type catalog.
pub mod entity;
/// Error types for the synchronization engine.
pub mod error;
/// Metric primitives (time series, windowed rate tracking).
pub mod metrics;
/// Coalescing change notifications.
pub mod notify;
/// Wire envelopes, outbound commands and notification reasons.
pub mod protocol;
/// The synchronization engine itself.
pub mod service;
/// Outbound command delivery seam.
pub mod transport;

pub use config::SyncConfig;
pub use entity::{Address, AddressPlan, AddressType, Connection, EntityIndex, User};
pub use error::{Error, Result};
pub use metrics::{RateWindow, TimeSeries};
pub use notify::Coalescer;
pub use protocol::{ApplicationProperties, Command, Envelope, Reason};
pub use service::{ConsoleService, Observer};
pub use transport::{ChannelSink, CommandSink};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
