//! A cancellable delay queue keyed by username.
//!
//! Every tracked player that goes missing from a snapshot gets exactly one
//! pending removal. If the player shows up again, the removal is cancelled
//! by key before anything can observe it. Otherwise
//! [`RemovalQueue::next_expired`] yields the username once its deadline
//! passes.
//!
//! # Integration
//!
//! Designed to sit in a dispatch loop's `tokio::select!`:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(event) = events.recv() => { /* may schedule or cancel */ }
//!         username = queue.next_expired() => { /* confirm departure */ }
//!     }
//! }
//! ```
//!
//! `next_expired` is cancel-safe: the deadline is only removed after the
//! sleep has completed, within the same poll.

use std::collections::HashMap;

use tokio::time::{self, Instant};
use tracing::trace;

/// Pending removal deadlines, at most one per key.
#[derive(Debug, Default)]
pub struct RemovalQueue {
    deadlines: HashMap<String, Instant>,
}

impl RemovalQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `key` to expire at `deadline`.
    ///
    /// Returns `false` (and leaves the existing deadline untouched) if the
    /// key already has a pending removal.
    pub fn schedule(&mut self, key: impl Into<String>, deadline: Instant) -> bool {
        let key = key.into();
        if self.deadlines.contains_key(&key) {
            return false;
        }
        trace!(username = %key, "removal scheduled");
        self.deadlines.insert(key, deadline);
        true
    }

    /// Cancels the pending removal for `key`. Returns `true` if one existed.
    pub fn cancel(&mut self, key: &str) -> bool {
        self.deadlines.remove(key).is_some()
    }

    /// Returns `true` if `key` has a pending removal.
    pub fn contains(&self, key: &str) -> bool {
        self.deadlines.contains_key(key)
    }

    /// The deadline scheduled for `key`, if any.
    pub fn deadline(&self, key: &str) -> Option<Instant> {
        self.deadlines.get(key).copied()
    }

    /// Number of pending removals.
    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    /// Returns `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }

    /// Drops every pending removal.
    pub fn clear(&mut self) {
        self.deadlines.clear();
    }

    /// Waits for the earliest deadline, removes it, and returns its key.
    ///
    /// When the queue is empty this future pends forever, which lets
    /// `select!` keep servicing its other branches.
    pub async fn next_expired(&mut self) -> String {
        let earliest = self
            .deadlines
            .iter()
            .min_by_key(|(_, deadline)| **deadline)
            .map(|(key, deadline)| (key.clone(), *deadline));

        let Some((key, deadline)) = earliest else {
            return std::future::pending::<String>().await;
        };

        time::sleep_until(deadline).await;
        self.deadlines.remove(&key);
        key
    }
}
