// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The synchronization engine.
//!
//! `ConsoleService` owns the entity index and interprets the inbound
//! event stream by subject: address, connection and user state flows
//! into the index, catalog events replace the type catalog, deletions
//! drop entries. Two timer-driven sweeps recompute metrics independent
//! of event arrival, and every change funnels through the coalescer
//! before reaching the single registered observer.
//!
//! All mutation happens sequentially on the thread driving the engine
//! (the `run` loop, or the test calling `handle_message` directly), so
//! the index needs no locking. The transport may stop delivering events
//! at any time; the engine simply resumes applying whatever arrives
//! next, and stale entities persist until their deletion event shows up.

use crate::config::SyncConfig;
use crate::entity::{AddressPlan, EntityIndex};
use crate::error::{Error, Result};
use crate::notify::Coalescer;
use crate::protocol::{Command, Envelope, Reason};
use crate::transport::CommandSink;
use crossbeam::channel::Receiver;
use serde_json::{Map, Value};
use std::time::{Duration, Instant};

/// Select timeout while no notification flush is armed.
const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Observer callback invoked with one reason per change category per
/// coalescing window.
pub type Observer = Box<dyn FnMut(Reason) + Send>;

/// Client-side state-synchronization and metrics-aggregation engine.
pub struct ConsoleService {
    config: SyncConfig,
    index: EntityIndex,
    coalescer: Coalescer,
    sink: Box<dyn CommandSink>,
    observer: Observer,
}

impl ConsoleService {
    /// Create an engine with the given configuration, command sink and
    /// observer. The observer slot is fixed for the engine's lifetime.
    pub fn new(
        config: SyncConfig,
        sink: Box<dyn CommandSink>,
        observer: Observer,
    ) -> Result<Self> {
        config.validate().map_err(Error::Config)?;

        Ok(Self {
            index: EntityIndex::new(config.depth_series_size, config.rate_window),
            coalescer: Coalescer::new(config.notify_delay, config.notify_max_delay),
            config,
            sink,
            observer,
        })
    }

    // ------------------------------------------------------------------
    // Event dispatch
    // ------------------------------------------------------------------

    /// Apply one inbound event to the index.
    ///
    /// Unrecognized subjects and malformed bodies are logged and
    /// ignored; nothing here can fail the caller.
    pub fn handle_message(&mut self, envelope: &Envelope) {
        match envelope.subject.as_str() {
            "address" => {
                if let Some(body) = object_body(envelope) {
                    if let Some(reason) = self.index.upsert_address(body) {
                        self.notify(reason);
                    }
                }
            }
            "address_deleted" => {
                if let Some(name) = string_body(envelope) {
                    if self.index.remove_address(name) {
                        self.notify(Reason::AddressDeleted);
                    }
                }
            }
            "address_types" => self.apply_address_types(envelope),
            "connection" => {
                if let Some(body) = object_body(envelope) {
                    if let Some(reason) = self.index.upsert_connection(body) {
                        self.notify(reason);
                    }
                }
            }
            "connection_deleted" => {
                if let Some(id) = string_body(envelope) {
                    if self.index.remove_connection(id) {
                        self.notify(Reason::ConnectionDeleted);
                    }
                }
            }
            "user" => {
                if let Some(body) = object_body(envelope) {
                    self.index.upsert_user(body);
                    self.notify(Reason::User);
                }
            }
            "user_deleted" => {
                if let Some(id) = string_body(envelope) {
                    if self.index.remove_users_by_id(id) {
                        self.notify(Reason::UserDeleted);
                    }
                }
            }
            other => {
                log::debug!("[sync] ignoring event with unknown subject: {}", other);
            }
        }
    }

    fn apply_address_types(&mut self, envelope: &Envelope) {
        let types = match serde_json::from_value(envelope.body.clone()) {
            Ok(types) => types,
            Err(e) => {
                log::debug!("[sync] malformed address_types catalog, ignoring: {}", e);
                return;
            }
        };
        let props = envelope.application_properties.clone().unwrap_or_default();

        self.index
            .set_address_types(types, props.address_space_type, props.disable_admin);
        self.notify(Reason::AddressTypes);
    }

    // ------------------------------------------------------------------
    // Periodic sweeps
    // ------------------------------------------------------------------

    /// Depth sweep: sample stored-message depth for every tracked
    /// address, notifying once iff anything changed. Runs on the
    /// depth-interval timer, never on event arrival.
    pub fn sweep_depths(&mut self) {
        if self.index.sample_depths() {
            self.notify(Reason::UpdateDepthSeries);
        }
    }

    /// Rate sweep: feed current counters into every rate window.
    ///
    /// Observers are always told to re-read computed rates, even when no
    /// counter moved: a window with fresh zero slots still changes the
    /// displayed rate.
    pub fn sweep_deltas(&mut self) {
        self.index.update_rates();
        self.notify(Reason::ResetPeriodicDeltas);
    }

    // ------------------------------------------------------------------
    // Outbound commands
    // ------------------------------------------------------------------

    /// Ask the server to create an address. Fire-and-forget.
    pub fn create_address(&mut self, definition: Value) {
        self.send(Command::CreateAddress(definition));
    }

    /// Ask the server to create a user. Fire-and-forget.
    pub fn create_user(&mut self, record: Value) {
        log::debug!("[sync] creating user: {}", record);
        self.send(Command::CreateUser(record));
    }

    /// Delete every selected address: one delete command per removal,
    /// batched into a single `address_deleted` notification.
    pub fn delete_selected(&mut self) {
        let removed = self.index.take_selected_addresses();
        if removed.is_empty() {
            return;
        }
        for address in &removed {
            self.send(Command::DeleteAddress(address.record()));
        }
        self.notify(Reason::AddressDeleted);
    }

    /// Delete every selected user, one delete command per removal.
    pub fn delete_selected_users(&mut self) {
        for user in self.index.take_selected_users() {
            self.send(Command::DeleteUser(user.name().to_string()));
        }
    }

    fn send(&mut self, command: Command) {
        let subject = command.subject();
        if let Err(e) = self.sink.send(command) {
            log::warn!("[sync] {} command not delivered: {}", subject, e);
        }
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    fn notify(&mut self, reason: Reason) {
        self.coalescer.notify(reason, Instant::now());
    }

    /// The instant the pending notification flush is armed for, if any.
    pub fn notification_deadline(&self) -> Option<Instant> {
        self.coalescer.deadline()
    }

    /// Flush notifications whose deadline has passed.
    pub fn flush_due_notifications(&mut self) -> bool {
        self.coalescer.flush_due(Instant::now(), self.observer.as_mut())
    }

    /// Flush all pending notifications immediately.
    pub fn flush_notifications(&mut self) {
        self.coalescer.flush(self.observer.as_mut());
    }

    // ------------------------------------------------------------------
    // Read surface
    // ------------------------------------------------------------------

    /// The entity index the rendering layer reads from.
    pub fn index(&self) -> &EntityIndex {
        &self.index
    }

    /// Mutable index access (selection flags come from the UI).
    pub fn index_mut(&mut self) -> &mut EntityIndex {
        &mut self.index
    }

    /// Whether `name` is free and contains no reserved characters.
    pub fn is_unique_valid_name(&self, name: &str) -> bool {
        self.index.is_unique_valid_name(name)
    }

    /// Display label for a plan, falling back to the plan name.
    pub fn plan_display_name(&self, kind: &str, plan: &str) -> String {
        self.index.plan_display_name(kind, plan)
    }

    /// Plans valid for a type, or empty for an unknown type.
    pub fn valid_plans(&self, kind: &str) -> &[AddressPlan] {
        self.index.valid_plans(kind)
    }

    // ------------------------------------------------------------------
    // Run loop
    // ------------------------------------------------------------------

    /// Drive the engine until the event channel disconnects.
    ///
    /// Single-threaded cooperative scheduling: event dispatch, the two
    /// sweep timers and the notification flush all interleave on the
    /// calling thread. Pending notifications are drained on exit.
    pub fn run(&mut self, events: Receiver<Envelope>) {
        let delta_tick = crossbeam::channel::tick(self.config.delta_interval);
        let depth_tick = crossbeam::channel::tick(self.config.depth_interval);

        log::debug!(
            "[sync] engine loop started (delta sweep {:?}, depth sweep {:?})",
            self.config.delta_interval,
            self.config.depth_interval
        );

        loop {
            self.flush_due_notifications();

            let timeout = self.notification_deadline().map_or(IDLE_TIMEOUT, |deadline| {
                deadline.saturating_duration_since(Instant::now())
            });

            crossbeam::select! {
                recv(events) -> event => match event {
                    Ok(envelope) => self.handle_message(&envelope),
                    Err(_) => break,
                },
                recv(delta_tick) -> _ => self.sweep_deltas(),
                recv(depth_tick) -> _ => self.sweep_depths(),
                default(timeout) => {}
            }
        }

        self.flush_notifications();
        log::debug!("[sync] event channel closed, engine loop stopped");
    }
}

/// Body as a JSON object, logging a diagnostic for anything else.
fn object_body(envelope: &Envelope) -> Option<&Map<String, Value>> {
    match envelope.body.as_object() {
        Some(map) => Some(map),
        None => {
            log::debug!(
                "[sync] expected object body for {} event, ignoring",
                envelope.subject
            );
            None
        }
    }
}

/// Body as a string key, logging a diagnostic for anything else.
fn string_body(envelope: &Envelope) -> Option<&str> {
    match envelope.body.as_str() {
        Some(key) => Some(key),
        None => {
            log::debug!(
                "[sync] expected string body for {} event, ignoring",
                envelope.subject
            );
            None
        }
    }
}
