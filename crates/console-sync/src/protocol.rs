// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire envelopes exchanged with the management server.
//!
//! Inbound messages carry a `subject` tag used for dispatch plus a
//! JSON-shaped body; outbound commands use the same envelope shape.
//! Payload fields beyond the ones the engine interprets are passed
//! through untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Inbound event envelope from the transport.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    /// Subject tag identifying the event class (`address`, `connection`, ...)
    pub subject: String,

    /// Event payload; shape depends on the subject
    #[serde(default)]
    pub body: Value,

    /// Space-level flags carried alongside `address_types` events
    #[serde(default)]
    pub application_properties: Option<ApplicationProperties>,
}

impl Envelope {
    /// Build an envelope with just a subject and body.
    pub fn new(subject: impl Into<String>, body: Value) -> Self {
        Self {
            subject: subject.into(),
            body,
            application_properties: None,
        }
    }

    /// Decode an envelope from a JSON frame.
    pub fn from_json(frame: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(frame)?)
    }
}

/// Application properties accompanying catalog events.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationProperties {
    /// Type of the address space the console is attached to
    #[serde(default)]
    pub address_space_type: String,

    /// Whether admin operations are disabled for this space
    #[serde(default)]
    pub disable_admin: bool,
}

/// Outbound command sent to the management server, fire-and-forget.
///
/// Serializes to the same `{subject, body}` envelope shape the server
/// consumes. No acknowledgment is tracked at this layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "subject", content = "body", rename_all = "snake_case")]
pub enum Command {
    /// Request creation of an address (body is the address definition)
    CreateAddress(Value),
    /// Request deletion of an address (body is the full address record)
    DeleteAddress(Value),
    /// Request creation of a user (body is the user record)
    CreateUser(Value),
    /// Request deletion of a user by name
    DeleteUser(String),
}

impl Command {
    /// Subject tag of the command envelope.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::CreateAddress(_) => "create_address",
            Self::DeleteAddress(_) => "delete_address",
            Self::CreateUser(_) => "create_user",
            Self::DeleteUser(_) => "delete_user",
        }
    }
}

/// Change-notification reasons delivered to the registered observer.
///
/// One callback invocation per distinct reason per coalescing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Reason {
    AddressAdded,
    AddressUpdated,
    AddressDeleted,
    AddressTypes,
    ConnectionAdded,
    ConnectionUpdated,
    ConnectionDeleted,
    User,
    UserDeleted,
    UpdateDepthSeries,
    ResetPeriodicDeltas,
}

impl Reason {
    /// Stable string form of the reason, as exposed to observers.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AddressAdded => "address_added",
            Self::AddressUpdated => "address_updated",
            Self::AddressDeleted => "address_deleted",
            Self::AddressTypes => "address_types",
            Self::ConnectionAdded => "connection_added",
            Self::ConnectionUpdated => "connection_updated",
            Self::ConnectionDeleted => "connection_deleted",
            Self::User => "user",
            Self::UserDeleted => "user:deleted",
            Self::UpdateDepthSeries => "update_depth_series",
            Self::ResetPeriodicDeltas => "reset_periodic_deltas",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
