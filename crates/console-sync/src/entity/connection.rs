// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Connection entities.

use serde_json::{Map, Value};

/// A live client connection, keyed by its connection id.
///
/// The engine treats connections as opaque records for the rendering
/// layer: updates shallow-merge new fields over the existing record so
/// fields a partial update omits are never discarded.
#[derive(Debug, Clone)]
pub struct Connection {
    fields: Map<String, Value>,
}

impl Connection {
    /// Create a connection from its first observed state message.
    pub fn new(body: &Map<String, Value>) -> Self {
        Self {
            fields: body.clone(),
        }
    }

    /// Shallow-merge an update over the existing record.
    pub fn merge(&mut self, body: &Map<String, Value>) {
        for (key, value) in body {
            self.fields.insert(key.clone(), value.clone());
        }
    }

    /// The connection id, the entity's natural key.
    pub fn id(&self) -> &str {
        self.fields.get("id").and_then(Value::as_str).unwrap_or("")
    }

    /// Raw field access for passthrough data.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The full record as a JSON object.
    pub fn record(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}
