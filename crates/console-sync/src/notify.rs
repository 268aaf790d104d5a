// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Coalescing change notifications.
//!
//! Entity updates arrive in bursts (a catalog refresh easily touches
//! hundreds of addresses) and the observer must not be invoked once per
//! mutation. The coalescer collapses a burst into one flush per distinct
//! reason: each notification re-arms the flush `delay` into the future,
//! bounded by a hard ceiling of `max_delay` after the first pending
//! notification so a steady stream cannot starve the flush indefinitely.
//!
//! The coalescer owns no timer thread. It exposes the armed deadline and
//! the service's single-threaded run loop drives it, the same way the
//! engine's sweep timers interleave on one thread.

use crate::protocol::Reason;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

/// Scheduling state while a flush is armed.
#[derive(Debug, Clone, Copy)]
struct Armed {
    /// Time of the first notification still awaiting flush
    start: Instant,

    /// Time the flush is currently armed for
    scheduled: Instant,
}

/// Debouncing reason collector with a bounded flush latency.
#[derive(Debug)]
pub struct Coalescer {
    delay: Duration,
    max_delay: Duration,

    /// Distinct reasons awaiting flush
    pending: BTreeSet<Reason>,

    armed: Option<Armed>,
}

impl Coalescer {
    /// Create a coalescer flushing `delay` after the last notification,
    /// no later than `max_delay` after the first pending one.
    pub fn new(delay: Duration, max_delay: Duration) -> Self {
        Self {
            delay,
            max_delay,
            pending: BTreeSet::new(),
            armed: None,
        }
    }

    /// Record a reason and (re-)arm the flush.
    ///
    /// Re-arming only extends the deadline while the extension still
    /// lands within `start + max_delay`; past that point the armed time
    /// is left untouched so the flush fires regardless of further calls.
    pub fn notify(&mut self, reason: Reason, now: Instant) {
        self.pending.insert(reason);

        match self.armed {
            None => {
                self.armed = Some(Armed {
                    start: now,
                    scheduled: now + self.delay,
                });
            }
            Some(ref mut armed) => {
                let rearmed = now + self.delay;
                if rearmed <= armed.start + self.max_delay {
                    armed.scheduled = rearmed;
                }
            }
        }
    }

    /// The instant the pending flush is armed for, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.armed.map(|a| a.scheduled)
    }

    /// True when at least one reason awaits flush.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Flush if the armed deadline has passed; returns whether it fired.
    pub fn flush_due(&mut self, now: Instant, observer: &mut dyn FnMut(Reason)) -> bool {
        match self.armed {
            Some(armed) if now >= armed.scheduled => {
                self.flush(observer);
                true
            }
            _ => false,
        }
    }

    /// Flush immediately: invoke the observer once per distinct pending
    /// reason and clear the pending set.
    pub fn flush(&mut self, observer: &mut dyn FnMut(Reason)) {
        self.armed = None;
        for reason in std::mem::take(&mut self.pending) {
            observer(reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(10);
    const MAX_DELAY: Duration = Duration::from_millis(500);

    fn collect(c: &mut Coalescer) -> Vec<Reason> {
        let mut reasons = Vec::new();
        c.flush(&mut |r| reasons.push(r));
        reasons
    }

    #[test]
    fn test_coalescer_dedupes_reasons() {
        let mut c = Coalescer::new(DELAY, MAX_DELAY);
        let now = Instant::now();

        c.notify(Reason::AddressUpdated, now);
        c.notify(Reason::AddressUpdated, now);
        c.notify(Reason::ConnectionAdded, now);

        let reasons = collect(&mut c);
        assert_eq!(reasons.len(), 2);
        assert!(reasons.contains(&Reason::AddressUpdated));
        assert!(reasons.contains(&Reason::ConnectionAdded));
    }

    #[test]
    fn test_coalescer_burst_single_flush_two_reasons() {
        let mut c = Coalescer::new(DELAY, MAX_DELAY);
        let t0 = Instant::now();

        c.notify(Reason::AddressAdded, t0);
        c.notify(Reason::AddressTypes, t0 + Duration::from_millis(2));

        // Deadline extended by the second call, still within the ceiling
        let deadline = c.deadline().expect("flush armed");
        assert_eq!(deadline, t0 + Duration::from_millis(12));
        assert!(deadline <= t0 + MAX_DELAY);

        // Nothing fires before the deadline
        let mut fired = Vec::new();
        assert!(!c.flush_due(t0 + Duration::from_millis(5), &mut |r| fired.push(r)));
        assert!(fired.is_empty());

        // One flush invokes the callback once per reason
        assert!(c.flush_due(deadline, &mut |r| fired.push(r)));
        assert_eq!(fired.len(), 2);
        assert!(!c.has_pending());
        assert!(c.deadline().is_none());
    }

    #[test]
    fn test_coalescer_steady_stream_bounded_by_max_delay() {
        let delay = Duration::from_millis(10);
        let max_delay = Duration::from_millis(50);
        let mut c = Coalescer::new(delay, max_delay);
        let t0 = Instant::now();

        // Notifications every 5 ms forever; without the ceiling the flush
        // would be pushed out on every call.
        let mut t = t0;
        for _ in 0..100 {
            c.notify(Reason::AddressUpdated, t);
            t += Duration::from_millis(5);
        }

        let deadline = c.deadline().expect("flush armed");
        assert!(deadline <= t0 + max_delay);
    }

    #[test]
    fn test_coalescer_rearms_after_flush() {
        let mut c = Coalescer::new(DELAY, MAX_DELAY);
        let t0 = Instant::now();

        c.notify(Reason::User, t0);
        assert_eq!(collect(&mut c), vec![Reason::User]);

        // Next burst starts a fresh window
        let t1 = t0 + Duration::from_secs(1);
        c.notify(Reason::UserDeleted, t1);
        assert_eq!(c.deadline(), Some(t1 + DELAY));
        assert_eq!(collect(&mut c), vec![Reason::UserDeleted]);
    }

    #[test]
    fn test_coalescer_flush_due_without_pending_is_noop() {
        let mut c = Coalescer::new(DELAY, MAX_DELAY);
        let mut fired = Vec::new();
        assert!(!c.flush_due(Instant::now(), &mut |r| fired.push(r)));
        assert!(fired.is_empty());
    }
}
