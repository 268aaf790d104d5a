// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for the synchronization engine.
//!
//! The engine absorbs most failure classes internally (unknown subjects,
//! lookup misses, counter regressions, unknown plans) so nothing here
//! ever reaches the rendering layer through the read surface. `Error`
//! covers the crate's genuinely fallible edges: configuration
//! validation, envelope decoding and command delivery.

use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the synchronization engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration failed validation.
    #[error("Configuration error: {0}")]
    Config(&'static str),

    /// Inbound frame could not be decoded into an envelope.
    #[error("Malformed envelope: {0}")]
    Decode(#[from] serde_json::Error),

    /// The outbound command channel is closed.
    #[error("Command channel closed")]
    ChannelClosed,
}
