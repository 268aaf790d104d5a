// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Outbound command delivery.
//!
//! The reconnecting message channel itself lives outside this crate; the
//! engine only needs somewhere to hand fire-and-forget commands. A
//! [`CommandSink`] seam keeps the engine testable and lets the embedding
//! application bridge to whatever transport it runs (typically AMQP
//! over a websocket).

use crate::error::{Error, Result};
use crate::protocol::Command;
use crossbeam::channel::{unbounded, Receiver, Sender};

/// Destination for outbound commands.
///
/// Delivery assurance, retries and reconnection are the transport's
/// concern; implementations should fail fast rather than block the
/// engine thread.
pub trait CommandSink: Send {
    /// Hand a command to the transport.
    fn send(&self, command: Command) -> Result<()>;
}

/// Channel-backed sink bridging commands onto a crossbeam channel.
///
/// The embedding application (or a test) drains the receiving side and
/// forwards frames to the real transport.
pub struct ChannelSink {
    tx: Sender<Command>,
}

impl ChannelSink {
    /// Create a sink and the receiver that drains it.
    pub fn new() -> (Self, Receiver<Command>) {
        let (tx, rx) = unbounded();
        (Self { tx }, rx)
    }
}

impl CommandSink for ChannelSink {
    fn send(&self, command: Command) -> Result<()> {
        self.tx.send(command).map_err(|_| Error::ChannelClosed)
    }
}
