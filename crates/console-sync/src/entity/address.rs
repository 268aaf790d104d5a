// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Address entities and their derived metrics.

use crate::metrics::{RateWindow, TimeSeries};
use serde_json::{Map, Value};

/// Address kinds whose stored-message depth is tracked over time.
const DEPTH_TRACKED_KINDS: [&str; 2] = ["queue", "topic"];

/// A live address as known to the console.
///
/// The record itself is the latest full-state message merged over its
/// predecessors: fields present in an update overwrite, fields absent
/// are retained, and fields the engine never interprets pass through to
/// the rendering layer untouched. On top of the record the entity owns
/// its depth history and the two rate windows the periodic sweeps feed.
#[derive(Debug, Clone)]
pub struct Address {
    fields: Map<String, Value>,
    depth_series: TimeSeries,
    in_rate: RateWindow,
    out_rate: RateWindow,
}

impl Address {
    /// Create an address from its first observed state message.
    ///
    /// Seeds an initial depth sample (when the kind tracks depth) and
    /// the rate baselines from the counters carried by the message, so
    /// the first sweep after creation measures real traffic rather than
    /// the counter's absolute value.
    pub fn new(body: &Map<String, Value>, series_size: usize, rate_window: usize) -> Self {
        let mut address = Self {
            fields: Map::new(),
            depth_series: TimeSeries::new(series_size),
            in_rate: RateWindow::new(rate_window),
            out_rate: RateWindow::new(rate_window),
        };
        address.merge(body);
        address.sample_depth();
        address.update_rates();
        address
    }

    /// Merge an update message into the record.
    ///
    /// Subscription-type updates carry per-shard counters instead of the
    /// aggregate ones: enqueued counts feed `messages_in`, acknowledged
    /// plus killed feed `messages_out`.
    pub fn merge(&mut self, body: &Map<String, Value>) {
        for (key, value) in body {
            self.fields.insert(key.clone(), value.clone());
        }

        if self.kind() == Some("subscription") {
            if let Some(shards) = body.get("shards").and_then(Value::as_array) {
                let (messages_in, messages_out) = shard_totals(shards);
                self.fields
                    .insert("messages_in".into(), Value::from(messages_in));
                self.fields
                    .insert("messages_out".into(), Value::from(messages_out));
            }
        }
    }

    /// The address name, the entity's natural key.
    pub fn name(&self) -> &str {
        self.fields
            .get("address")
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// Address kind (`queue`, `topic`, `subscription`, ...).
    pub fn kind(&self) -> Option<&str> {
        self.fields.get("type").and_then(Value::as_str)
    }

    /// Plan name, if the record carries one.
    pub fn plan(&self) -> Option<&str> {
        self.fields.get("plan").and_then(Value::as_str)
    }

    /// Stored-message depth, if the record carries one.
    pub fn depth(&self) -> Option<u64> {
        self.fields.get("depth").and_then(Value::as_u64)
    }

    /// Cumulative inbound message counter.
    pub fn messages_in(&self) -> Option<u64> {
        self.fields.get("messages_in").and_then(Value::as_u64)
    }

    /// Cumulative outbound message counter.
    pub fn messages_out(&self) -> Option<u64> {
        self.fields.get("messages_out").and_then(Value::as_u64)
    }

    /// Whether the rendering layer has flagged this address selected.
    pub fn is_selected(&self) -> bool {
        self.fields
            .get("selected")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Flag or unflag this address as selected.
    pub fn set_selected(&mut self, selected: bool) {
        self.fields.insert("selected".into(), Value::from(selected));
    }

    /// Raw field access for passthrough data.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The full merged record as a JSON object (delete commands carry it).
    pub fn record(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Push the current depth into the history series.
    ///
    /// Only queue and topic addresses with a defined depth contribute.
    /// Returns whether a sample was taken.
    pub fn sample_depth(&mut self) -> bool {
        let tracked = self
            .kind()
            .is_some_and(|k| DEPTH_TRACKED_KINDS.contains(&k));
        match self.depth() {
            Some(depth) if tracked => {
                self.depth_series.push(depth as i64);
                true
            }
            _ => false,
        }
    }

    /// Feed the current counters into the rate windows.
    ///
    /// Counters the record does not carry leave their window untouched;
    /// a regression inside a window is absorbed there as a counter reset.
    pub fn update_rates(&mut self) {
        if let Some(value) = self.messages_in() {
            self.in_rate.update(value);
        }
        if let Some(value) = self.messages_out() {
            self.out_rate.update(value);
        }
    }

    /// Moving-window total of inbound messages.
    pub fn in_rate(&self) -> u64 {
        self.in_rate.total()
    }

    /// Moving-window total of outbound messages.
    pub fn out_rate(&self) -> u64 {
        self.out_rate.total()
    }

    /// Depth history, oldest sample first.
    pub fn depth_series(&self) -> &TimeSeries {
        &self.depth_series
    }
}

/// Aggregate per-shard counters into (messages_in, messages_out).
fn shard_totals(shards: &[Value]) -> (u64, u64) {
    let mut messages_in = 0;
    let mut messages_out = 0;
    for shard in shards {
        messages_in += shard_field(shard, "enqueued");
        messages_out += shard_field(shard, "acknowledged") + shard_field(shard, "killed");
    }
    (messages_in, messages_out)
}

fn shard_field(shard: &Value, key: &str) -> u64 {
    shard.get(key).and_then(Value::as_u64).unwrap_or(0)
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

    #[test]
    fn test_address_create_seeds_depth_and_baselines() {
        let a = Address::new(
            &body(json!({
                "address": "q1", "type": "queue", "depth": 5,
                "messages_in": 100, "messages_out": 90
            })),
            4,
            4,
        );

        assert_eq!(a.name(), "q1");
        assert_eq!(a.depth_series().values(), vec![5]);
        // Baselines seeded, no deltas yet
        assert_eq!(a.in_rate(), 0);
        assert_eq!(a.out_rate(), 0);
    }

    #[test]
    fn test_address_merge_retains_absent_fields() {
        let mut a = Address::new(
            &body(json!({"address": "q1", "type": "queue", "plan": "small-queue"})),
            4,
            4,
        );
        a.merge(&body(json!({"address": "q1", "depth": 3})));

        assert_eq!(a.plan(), Some("small-queue"));
        assert_eq!(a.kind(), Some("queue"));
        assert_eq!(a.depth(), Some(3));
    }

    #[test]
    fn test_address_passthrough_fields_survive() {
        let mut a = Address::new(
            &body(json!({"address": "q1", "type": "queue", "waypoint": true})),
            4,
            4,
        );
        a.merge(&body(json!({"address": "q1", "depth": 1})));

        assert_eq!(a.get("waypoint"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_subscription_counters_derived_from_shards() {
        let a = Address::new(
            &body(json!({
                "address": "sub1", "type": "subscription",
                "shards": [{"enqueued": 10, "acknowledged": 6, "killed": 1}]
            })),
            4,
            4,
        );

        assert_eq!(a.messages_in(), Some(10));
        assert_eq!(a.messages_out(), Some(7));
    }

    #[test]
    fn test_subscription_counters_sum_across_shards() {
        let a = Address::new(
            &body(json!({
                "address": "sub1", "type": "subscription",
                "shards": [
                    {"enqueued": 10, "acknowledged": 6, "killed": 1},
                    {"enqueued": 5, "acknowledged": 2, "killed": 0}
                ]
            })),
            4,
            4,
        );

        assert_eq!(a.messages_in(), Some(15));
        assert_eq!(a.messages_out(), Some(9));
    }

    #[test]
    fn test_rates_track_counter_growth() {
        let mut a = Address::new(
            &body(json!({"address": "q1", "type": "queue", "messages_in": 100, "messages_out": 50})),
            4,
            8,
        );

        a.merge(&body(json!({"messages_in": 130, "messages_out": 55})));
        a.update_rates();
        a.merge(&body(json!({"messages_in": 150, "messages_out": 70})));
        a.update_rates();

        assert_eq!(a.in_rate(), 50);
        assert_eq!(a.out_rate(), 20);
    }

    #[test]
    fn test_anycast_depth_not_sampled() {
        let mut a = Address::new(
            &body(json!({"address": "a1", "type": "anycast", "depth": 9})),
            4,
            4,
        );

        assert!(!a.sample_depth());
        assert!(a.depth_series().is_empty());
    }

    #[test]
    fn test_queue_without_depth_not_sampled() {
        let mut a = Address::new(&body(json!({"address": "q1", "type": "queue"})), 4, 4);
        assert!(!a.sample_depth());
    }

    #[test]
    fn test_selection_flag() {
        let mut a = Address::new(&body(json!({"address": "q1", "type": "queue"})), 4, 4);
        assert!(!a.is_selected());

        a.set_selected(true);
        assert!(a.is_selected());
        assert_eq!(a.record()["selected"], Value::Bool(true));
    }
}
