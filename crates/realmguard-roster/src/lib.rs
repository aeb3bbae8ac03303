//! Roster diffing for Realmguard.
//!
//! The game session reports *who is visible right now*, over and over.
//! This crate turns that stream of snapshots into presence episodes:
//!
//! 1. **Arrivals**: a username we weren't tracking shows up
//!    ([`RosterTracker::apply_snapshot`] returns an [`Arrival`] that the
//!    caller hands to moderation).
//! 2. **Refreshes**: a tracked username shows up again; its
//!    `last_seen` moves forward and any pending removal is cancelled.
//! 3. **Departures**: a tracked username stays missing for the whole
//!    debounce window ([`RosterTracker::next_departure`]).
//!
//! # How it fits in the stack
//!
//! ```text
//! Dispatch loop (above)  ← turns arrivals/departures into notifications
//!     ↕
//! Roster layer (this crate)  ← owns the tracked-player map
//!     ↕
//! Protocol layer (below)  ← RosterEntry, Platform
//! ```
//!
//! The tracker is not thread-safe and doesn't need to be: exactly one
//! task (the per-session dispatch loop) owns it.

mod error;
mod record;
mod removal;
mod tracker;

pub use error::RosterError;
pub use record::{PlayerRecord, PlayerState, RosterConfig};
pub use removal::RemovalQueue;
pub use tracker::{Arrival, Completion, Departure, Resolution, RosterTracker};
