// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! User entities.

use serde_json::{Map, Value};

/// A messaging user record.
///
/// Users live in an ordered sequence rather than a keyed index: updates
/// match by `name`, deletions match by `id` (the server may emit either
/// identifier depending on the operation).
#[derive(Debug, Clone)]
pub struct User {
    fields: Map<String, Value>,
}

impl User {
    /// Create a user from a state message.
    pub fn new(body: &Map<String, Value>) -> Self {
        Self {
            fields: body.clone(),
        }
    }

    /// The user name.
    pub fn name(&self) -> &str {
        self.fields
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// The user id, used to match deletion events.
    pub fn id(&self) -> &str {
        self.fields.get("id").and_then(Value::as_str).unwrap_or("")
    }

    /// Whether the rendering layer has flagged this user selected.
    pub fn is_selected(&self) -> bool {
        self.fields
            .get("selected")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Flag or unflag this user as selected.
    pub fn set_selected(&mut self, selected: bool) {
        self.fields.insert("selected".into(), Value::from(selected));
    }

    /// Raw field access for passthrough data.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}
