// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-memory index of live entities.
//!
//! The index is the console's local copy of the cluster state: three
//! keyed collections (addresses, connections, users) plus the
//! address-type catalog and space-level flags. It is mutated only by
//! the service's event dispatch and sweep timers, always sequentially
//! on the engine thread, and read by the rendering layer between
//! notifications.

mod address;
mod connection;
mod user;

pub use address::Address;
pub use connection::Connection;
pub use user::User;

use crate::protocol::Reason;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Characters an address name may not contain.
const RESERVED_NAME_CHARS: [char; 5] = ['#', '*', '/', '.', ':'];

/// An address type offered by the space, with its available plans.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressType {
    /// Type name (`queue`, `topic`, ...)
    pub name: String,

    /// Plans available for this type
    #[serde(default)]
    pub plans: Vec<AddressPlan>,

    /// Passthrough fields for the rendering layer
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A plan within an address type.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressPlan {
    /// Plan name, the identifier used on addresses
    pub name: String,

    /// Human-readable label, when the catalog provides one
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,

    /// Passthrough fields for the rendering layer
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Keyed collections of live entities plus the address-type catalog.
#[derive(Debug)]
pub struct EntityIndex {
    addresses: HashMap<String, Address>,
    connections: HashMap<String, Connection>,
    users: Vec<User>,

    address_types: Vec<AddressType>,
    address_space_type: String,
    admin_disabled: bool,

    depth_series_size: usize,
    rate_window: usize,
}

impl EntityIndex {
    /// Create an empty index.
    ///
    /// Admin operations start out disabled until the first catalog event
    /// says otherwise.
    pub fn new(depth_series_size: usize, rate_window: usize) -> Self {
        Self {
            addresses: HashMap::new(),
            connections: HashMap::new(),
            users: Vec::new(),
            address_types: Vec::new(),
            address_space_type: String::new(),
            admin_disabled: true,
            depth_series_size,
            rate_window,
        }
    }

    // ------------------------------------------------------------------
    // Event application
    // ------------------------------------------------------------------

    /// Apply an address state message: create the entity on first sight,
    /// merge fields afterwards. Returns the change reason, or `None` for
    /// a body without an address key.
    pub fn upsert_address(&mut self, body: &Map<String, Value>) -> Option<Reason> {
        let name = body.get("address").and_then(Value::as_str)?;
        match self.addresses.get_mut(name) {
            Some(address) => {
                address.merge(body);
                Some(Reason::AddressUpdated)
            }
            None => {
                let address = Address::new(body, self.depth_series_size, self.rate_window);
                self.addresses.insert(name.to_string(), address);
                Some(Reason::AddressAdded)
            }
        }
    }

    /// Remove an address by key. Returns whether it existed.
    pub fn remove_address(&mut self, name: &str) -> bool {
        self.addresses.remove(name).is_some()
    }

    /// Replace the address-type catalog and space-level flags wholesale.
    pub fn set_address_types(
        &mut self,
        types: Vec<AddressType>,
        address_space_type: String,
        admin_disabled: bool,
    ) {
        self.address_types = types;
        self.address_space_type = address_space_type;
        self.admin_disabled = admin_disabled;
    }

    /// Apply a connection state message. Existing records are updated in
    /// place, never replaced, so partial updates cannot drop fields.
    pub fn upsert_connection(&mut self, body: &Map<String, Value>) -> Option<Reason> {
        let id = body.get("id").and_then(Value::as_str)?;
        match self.connections.get_mut(id) {
            Some(connection) => {
                connection.merge(body);
                Some(Reason::ConnectionUpdated)
            }
            None => {
                self.connections.insert(id.to_string(), Connection::new(body));
                Some(Reason::ConnectionAdded)
            }
        }
    }

    /// Remove a connection by id. Returns whether it existed.
    pub fn remove_connection(&mut self, id: &str) -> bool {
        self.connections.remove(id).is_some()
    }

    /// Upsert a user record, matching by name.
    ///
    /// An unmatched record is inserted rather than dropped: the server
    /// sends user events for records the console has not seen yet (for
    /// instance after a transport gap), and inserting keeps the sequence
    /// consistent with the remote state.
    pub fn upsert_user(&mut self, body: &Map<String, Value>) {
        let user = User::new(body);
        match self.users.iter_mut().find(|u| u.name() == user.name()) {
            Some(existing) => *existing = user,
            None => self.users.push(user),
        }
    }

    /// Remove every user matching the given id. Returns whether any
    /// entry was removed.
    pub fn remove_users_by_id(&mut self, id: &str) -> bool {
        let before = self.users.len();
        self.users.retain(|u| u.id() != id);
        self.users.len() != before
    }

    // ------------------------------------------------------------------
    // Periodic sweeps
    // ------------------------------------------------------------------

    /// Push a depth sample for every depth-tracked address.
    /// Returns whether any series changed.
    pub fn sample_depths(&mut self) -> bool {
        let mut changed = false;
        for address in self.addresses.values_mut() {
            if address.sample_depth() {
                changed = true;
            }
        }
        changed
    }

    /// Feed current counters into every address's rate windows.
    pub fn update_rates(&mut self) {
        for address in self.addresses.values_mut() {
            address.update_rates();
        }
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Remove and return every selected address.
    pub fn take_selected_addresses(&mut self) -> Vec<Address> {
        let names: Vec<String> = self
            .addresses
            .values()
            .filter(|a| a.is_selected())
            .map(|a| a.name().to_string())
            .collect();
        names
            .iter()
            .filter_map(|name| self.addresses.remove(name))
            .collect()
    }

    /// Remove and return every selected user, preserving order.
    pub fn take_selected_users(&mut self) -> Vec<User> {
        let mut selected = Vec::new();
        self.users.retain(|u| {
            if u.is_selected() {
                selected.push(u.clone());
                false
            } else {
                true
            }
        });
        selected
    }

    // ------------------------------------------------------------------
    // Read surface
    // ------------------------------------------------------------------

    /// All live addresses, iteration order unspecified.
    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        self.addresses.values()
    }

    /// Look up an address by name.
    pub fn get_address(&self, name: &str) -> Option<&Address> {
        self.addresses.get(name)
    }

    /// Mutable address lookup (selection flags come from the UI).
    pub fn get_address_mut(&mut self, name: &str) -> Option<&mut Address> {
        self.addresses.get_mut(name)
    }

    /// All live connections, iteration order unspecified.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Look up a connection by id.
    pub fn get_connection(&self, id: &str) -> Option<&Connection> {
        self.connections.get(id)
    }

    /// All known users in sequence order.
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Mutable user lookup by name (selection flags come from the UI).
    pub fn get_user_mut(&mut self, name: &str) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.name() == name)
    }

    /// The address-type catalog.
    pub fn address_types(&self) -> &[AddressType] {
        &self.address_types
    }

    /// The type of the address space the console is attached to.
    pub fn address_space_type(&self) -> &str {
        &self.address_space_type
    }

    /// Whether admin operations are disabled for this space.
    pub fn admin_disabled(&self) -> bool {
        self.admin_disabled
    }

    /// Names of all topic-type addresses.
    pub fn topic_names(&self) -> Vec<String> {
        self.addresses
            .values()
            .filter(|a| a.kind() == Some("topic"))
            .map(|a| a.name().to_string())
            .collect()
    }

    /// Whether `name` is free and contains no reserved characters.
    pub fn is_unique_valid_name(&self, name: &str) -> bool {
        !name.is_empty()
            && !self.addresses.contains_key(name)
            && !name
                .chars()
                .any(|c| c.is_whitespace() || RESERVED_NAME_CHARS.contains(&c))
    }

    /// Display label for a plan, falling back to the plan name.
    ///
    /// Unknown types and plans degrade gracefully: the raw plan name is
    /// returned and a diagnostic is logged, the caller never fails.
    pub fn plan_display_name(&self, kind: &str, plan: &str) -> String {
        match self.address_types.iter().find(|t| t.name == kind) {
            Some(t) => match t.plans.iter().find(|p| p.name == plan) {
                Some(p) => p
                    .display_name
                    .clone()
                    .unwrap_or_else(|| plan.to_string()),
                None => {
                    log::debug!(
                        "[catalog] found no plan called {} for address type {}",
                        plan,
                        kind
                    );
                    plan.to_string()
                }
            },
            None => {
                if !self.address_types.is_empty() {
                    log::debug!("[catalog] found no address type {} in catalog", kind);
                }
                plan.to_string()
            }
        }
    }

    /// Plans valid for a type, or empty for an unknown type.
    pub fn valid_plans(&self, kind: &str) -> &[AddressPlan] {
        self.address_types
            .iter()
            .find(|t| t.name == kind)
            .map(|t| t.plans.as_slice())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("test body must be an object, got {other:?}"),
        }
    }

    fn index() -> EntityIndex {
        EntityIndex::new(4, 8)
    }

    fn catalog() -> Vec<AddressType> {
        serde_json::from_value(json!([
            {"name": "queue", "plans": [
                {"name": "small-queue", "displayName": "Small Queue"},
                {"name": "large-queue"}
            ]},
            {"name": "topic", "plans": []}
        ]))
        .expect("valid catalog")
    }

    #[test]
    fn test_upsert_address_add_then_update() {
        let mut idx = index();

        let reason = idx.upsert_address(&body(json!({"address": "q1", "type": "queue"})));
        assert_eq!(reason, Some(Reason::AddressAdded));

        let reason = idx.upsert_address(&body(json!({"address": "q1", "depth": 2})));
        assert_eq!(reason, Some(Reason::AddressUpdated));

        let a = idx.get_address("q1").expect("address present");
        assert_eq!(a.kind(), Some("queue"));
        assert_eq!(a.depth(), Some(2));
    }

    #[test]
    fn test_upsert_address_without_key_is_ignored() {
        let mut idx = index();
        assert_eq!(idx.upsert_address(&body(json!({"type": "queue"}))), None);
        assert_eq!(idx.addresses().count(), 0);
    }

    #[test]
    fn test_remove_address_miss_is_noop() {
        let mut idx = index();
        assert!(!idx.remove_address("nope"));
    }

    #[test]
    fn test_connection_upsert_and_remove() {
        let mut idx = index();

        let reason = idx.upsert_connection(&body(json!({"id": "c1", "container": "app"})));
        assert_eq!(reason, Some(Reason::ConnectionAdded));

        let reason = idx.upsert_connection(&body(json!({"id": "c1", "senders": 2})));
        assert_eq!(reason, Some(Reason::ConnectionUpdated));

        let c = idx.get_connection("c1").expect("connection present");
        assert_eq!(c.get("container"), Some(&json!("app")));
        assert_eq!(c.get("senders"), Some(&json!(2)));

        assert!(idx.remove_connection("c1"));
        assert!(!idx.remove_connection("c1"));
    }

    #[test]
    fn test_user_upsert_inserts_when_absent() {
        let mut idx = index();

        idx.upsert_user(&body(json!({"name": "alice", "id": "u-1"})));
        idx.upsert_user(&body(json!({"name": "alice", "id": "u-1", "groups": ["ops"]})));
        idx.upsert_user(&body(json!({"name": "bob", "id": "u-2"})));

        assert_eq!(idx.users().len(), 2);
        assert_eq!(idx.users()[0].get("groups"), Some(&json!(["ops"])));
    }

    #[test]
    fn test_remove_users_by_id_removes_all_matches() {
        let mut idx = index();
        idx.upsert_user(&body(json!({"name": "alice", "id": "u-1"})));
        idx.upsert_user(&body(json!({"name": "bob", "id": "u-2"})));

        assert!(idx.remove_users_by_id("u-1"));
        assert_eq!(idx.users().len(), 1);
        assert_eq!(idx.users()[0].name(), "bob");

        assert!(!idx.remove_users_by_id("u-1"));
    }

    #[test]
    fn test_sample_depths_reports_change() {
        let mut idx = index();
        idx.upsert_address(&body(json!({"address": "q1", "type": "queue", "depth": 5})));
        idx.upsert_address(&body(json!({"address": "a1", "type": "anycast"})));

        assert!(idx.sample_depths());

        // Creation seeded one sample, the sweep added another
        let series = idx.get_address("q1").expect("q1 present").depth_series();
        assert_eq!(series.values(), vec![5, 5]);
    }

    #[test]
    fn test_sample_depths_no_tracked_addresses() {
        let mut idx = index();
        idx.upsert_address(&body(json!({"address": "a1", "type": "anycast"})));
        assert!(!idx.sample_depths());
    }

    #[test]
    fn test_take_selected_addresses() {
        let mut idx = index();
        idx.upsert_address(&body(json!({"address": "q1", "type": "queue"})));
        idx.upsert_address(&body(json!({"address": "q2", "type": "queue"})));
        idx.get_address_mut("q2")
            .expect("q2 present")
            .set_selected(true);

        let taken = idx.take_selected_addresses();
        assert_eq!(taken.len(), 1);
        assert_eq!(taken[0].name(), "q2");
        assert!(idx.get_address("q2").is_none());
        assert!(idx.get_address("q1").is_some());
    }

    #[test]
    fn test_take_selected_users_preserves_order() {
        let mut idx = index();
        idx.upsert_user(&body(json!({"name": "alice", "id": "u-1"})));
        idx.upsert_user(&body(json!({"name": "bob", "id": "u-2"})));
        idx.upsert_user(&body(json!({"name": "carol", "id": "u-3"})));
        idx.get_user_mut("alice").expect("present").set_selected(true);
        idx.get_user_mut("carol").expect("present").set_selected(true);

        let taken = idx.take_selected_users();
        let names: Vec<&str> = taken.iter().map(User::name).collect();
        assert_eq!(names, vec!["alice", "carol"]);
        assert_eq!(idx.users().len(), 1);
    }

    #[test]
    fn test_is_unique_valid_name() {
        let mut idx = index();
        assert!(idx.is_unique_valid_name("a"));
        assert!(!idx.is_unique_valid_name("a/b"));
        assert!(!idx.is_unique_valid_name("a b"));
        assert!(!idx.is_unique_valid_name("a.b"));
        assert!(!idx.is_unique_valid_name("a:b"));
        assert!(!idx.is_unique_valid_name("a#b"));
        assert!(!idx.is_unique_valid_name("a*b"));
        assert!(!idx.is_unique_valid_name(""));

        idx.upsert_address(&body(json!({"address": "a", "type": "queue"})));
        assert!(!idx.is_unique_valid_name("a"));
    }

    #[test]
    fn test_plan_display_name_lookup() {
        let mut idx = index();
        idx.set_address_types(catalog(), "standard".into(), false);

        assert_eq!(idx.plan_display_name("queue", "small-queue"), "Small Queue");
        // Plan without a display label falls back to its name
        assert_eq!(idx.plan_display_name("queue", "large-queue"), "large-queue");
        // Unknown plan and unknown type both degrade to the raw name
        assert_eq!(idx.plan_display_name("queue", "huge-queue"), "huge-queue");
        assert_eq!(idx.plan_display_name("mystery", "small-queue"), "small-queue");
    }

    #[test]
    fn test_plan_display_name_empty_catalog() {
        let idx = index();
        assert_eq!(idx.plan_display_name("queue", "small-queue"), "small-queue");
    }

    #[test]
    fn test_valid_plans() {
        let mut idx = index();
        idx.set_address_types(catalog(), "standard".into(), false);

        assert_eq!(idx.valid_plans("queue").len(), 2);
        assert!(idx.valid_plans("topic").is_empty());
        assert!(idx.valid_plans("mystery").is_empty());
    }

    #[test]
    fn test_topic_names() {
        let mut idx = index();
        idx.upsert_address(&body(json!({"address": "t1", "type": "topic"})));
        idx.upsert_address(&body(json!({"address": "q1", "type": "queue"})));

        let mut names = idx.topic_names();
        names.sort();
        assert_eq!(names, vec!["t1"]);
    }

    #[test]
    fn test_catalog_flags() {
        let mut idx = index();
        assert!(idx.admin_disabled());
        assert_eq!(idx.address_space_type(), "");

        idx.set_address_types(catalog(), "brokered".into(), false);
        assert!(!idx.admin_disabled());
        assert_eq!(idx.address_space_type(), "brokered");
        assert_eq!(idx.address_types().len(), 2);
    }
}
