//! The roster diff engine.
//!
//! [`RosterTracker`] owns every [`PlayerRecord`] for one game session and
//! the [`RemovalQueue`] that debounces departures. It never talks to the
//! network or the moderation layer: it reports [`Arrival`]s and
//! [`Departure`]s, and the dispatch loop decides what to do with them.
//!
//! # Episodes
//!
//! Every arrival gets a fresh episode number. Evaluations run off-task and
//! can finish after the player has already left and rejoined, so
//! [`RosterTracker::complete_evaluation`] only accepts a verdict whose
//! episode still matches the live record. Anything else is
//! [`Completion::Stale`].

use std::collections::{HashMap, HashSet};

use realmguard_protocol::RosterEntry;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::{PlayerRecord, PlayerState, RemovalQueue, RosterConfig, RosterError};

// ---------------------------------------------------------------------------
// Results handed to the dispatch loop
// ---------------------------------------------------------------------------

/// A player the tracker has not seen in this episode. The caller must
/// evaluate it and report back through
/// [`RosterTracker::complete_evaluation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arrival {
    pub entry: RosterEntry,
    pub episode: u64,
}

/// The moderation verdict, as far as presence tracking cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Admit,
    Kick,
}

/// Outcome of [`RosterTracker::complete_evaluation`].
#[derive(Debug, Clone)]
pub enum Completion {
    /// The player is now `PresentTracked`; announce the join.
    Admitted(PlayerRecord),
    /// The record was purged and the name is in kick cooldown; issue the
    /// kick command.
    Kicked(PlayerRecord),
    /// The episode is gone (left, or replaced by a newer one). Do nothing.
    Stale,
}

/// What a fired removal turned out to be.
#[derive(Debug, Clone)]
pub enum Departure {
    /// Absence confirmed for an announced player; announce the leave.
    Left(PlayerRecord),
    /// The player vanished before their verdict came in. Purged silently.
    Abandoned(PlayerRecord),
    /// The record was refreshed after the removal was scheduled.
    StillPresent(String),
    /// No record exists any more.
    Untracked(String),
}

// ---------------------------------------------------------------------------
// RosterTracker
// ---------------------------------------------------------------------------

/// Per-session presence state.
#[derive(Debug)]
pub struct RosterTracker {
    config: RosterConfig,
    players: HashMap<String, PlayerRecord>,
    removals: RemovalQueue,
    /// Recently kicked usernames and when their cooldown ends.
    kicked: HashMap<String, Instant>,
    next_episode: u64,
}

impl RosterTracker {
    pub fn new(config: RosterConfig) -> Self {
        Self {
            config,
            players: HashMap::new(),
            removals: RemovalQueue::new(),
            kicked: HashMap::new(),
            next_episode: 1,
        }
    }

    /// Diffs one snapshot against the tracked map.
    ///
    /// Refreshes and cancellations happen before this returns, so a removal
    /// that fires afterwards always sees the refreshed `last_seen`.
    pub fn apply_snapshot(&mut self, entries: &[RosterEntry]) -> Vec<Arrival> {
        let now = Instant::now();
        self.kicked.retain(|_, until| *until > now);

        let mut seen: HashSet<&str> = HashSet::with_capacity(entries.len());
        let mut arrivals = Vec::new();

        for entry in entries {
            let username = entry.username.as_str();
            if self.is_self(username) || !seen.insert(username) {
                continue;
            }
            if self.kicked.contains_key(username) {
                trace!(%username, "ignored during kick cooldown");
                continue;
            }

            if let Some(record) = self.players.get_mut(username) {
                record.last_seen = now;
                if self.removals.cancel(username) {
                    debug!(%username, "reappeared, removal cancelled");
                }
                continue;
            }

            self.removals.cancel(username);
            let episode = self.next_episode;
            self.next_episode += 1;
            self.players.insert(
                entry.username.clone(),
                PlayerRecord {
                    username: entry.username.clone(),
                    identity_id: entry.identity_id.clone(),
                    platform: entry.platform,
                    last_seen: now,
                    state: PlayerState::Evaluating,
                    episode,
                },
            );
            debug!(%username, episode, "new arrival");
            arrivals.push(Arrival {
                entry: entry.clone(),
                episode,
            });
        }

        let deadline = now + self.config.debounce;
        for username in self.players.keys() {
            if !seen.contains(username.as_str()) && self.removals.schedule(username.clone(), deadline)
            {
                debug!(%username, "missing from snapshot, removal scheduled");
            }
        }

        arrivals
    }

    /// Applies a moderation verdict to the episode it was computed for.
    ///
    /// # Errors
    /// Returns [`RosterError::InvalidTransition`] if the matching record is
    /// not in `Evaluating` (a second verdict for the same episode).
    pub fn complete_evaluation(
        &mut self,
        username: &str,
        episode: u64,
        resolution: Resolution,
    ) -> Result<Completion, RosterError> {
        let Some(record) = self.players.get_mut(username) else {
            return Ok(Completion::Stale);
        };
        if record.episode != episode {
            return Ok(Completion::Stale);
        }

        match resolution {
            Resolution::Admit => {
                record.transition(PlayerState::Admitted)?;
                record.transition(PlayerState::PresentTracked)?;
                Ok(Completion::Admitted(record.clone()))
            }
            Resolution::Kick => {
                record.transition(PlayerState::Kicked)?;
                let record = self.purge(username);
                self.kicked
                    .insert(username.to_string(), Instant::now() + self.config.debounce);
                Ok(record.map_or(Completion::Stale, Completion::Kicked))
            }
        }
    }

    /// Waits for the next pending removal to fire and classifies it.
    ///
    /// Pends forever while nothing is scheduled, so it can sit in a
    /// `select!` arm unconditionally. Cancel-safe.
    pub async fn next_departure(&mut self) -> Departure {
        let username = self.removals.next_expired().await;
        let now = Instant::now();

        let Some(record) = self.players.get_mut(&username) else {
            return Departure::Untracked(username);
        };
        if record.absent_for(now) < self.config.debounce {
            return Departure::StillPresent(username);
        }

        let state = record.state;
        match state {
            PlayerState::PresentTracked => {
                if let Err(e) = record.transition(PlayerState::Left) {
                    // Unreachable by construction; keep the record as is.
                    debug!(error = %e, "departure transition rejected");
                    return Departure::StillPresent(username);
                }
                match self.purge(&username) {
                    Some(record) => Departure::Left(record),
                    None => Departure::Untracked(username),
                }
            }
            _ => match self.purge(&username) {
                Some(record) => Departure::Abandoned(record),
                None => Departure::Untracked(username),
            },
        }
    }

    /// The live record for `username`, if any.
    pub fn get(&self, username: &str) -> Option<&PlayerRecord> {
        self.players.get(username)
    }

    /// Returns `true` if a removal is pending for `username`.
    pub fn is_pending_removal(&self, username: &str) -> bool {
        self.removals.contains(username)
    }

    /// Returns `true` if `username` is in kick cooldown.
    pub fn is_cooling_down(&self, username: &str) -> bool {
        self.kicked
            .get(username)
            .is_some_and(|until| *until > Instant::now())
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn config(&self) -> &RosterConfig {
        &self.config
    }

    fn is_self(&self, username: &str) -> bool {
        self.config.self_username.as_deref() == Some(username)
    }

    fn purge(&mut self, username: &str) -> Option<PlayerRecord> {
        self.removals.cancel(username);
        self.players.remove(username)
    }
}

impl Default for RosterTracker {
    fn default() -> Self {
        Self::new(RosterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use realmguard_protocol::Platform;
    use tokio::time;

    use super::*;

    fn entry(name: &str) -> RosterEntry {
        RosterEntry::new(name, format!("id-{name}"), Platform::Windows)
    }

    fn admit_all(tracker: &mut RosterTracker, arrivals: Vec<Arrival>) {
        for arrival in arrivals {
            tracker
                .complete_evaluation(&arrival.entry.username, arrival.episode, Resolution::Admit)
                .unwrap();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_apply_snapshot_new_player_returns_one_arrival() {
        let mut tracker = RosterTracker::default();

        let arrivals = tracker.apply_snapshot(&[entry("Steve")]);

        assert_eq!(arrivals.len(), 1);
        assert_eq!(arrivals[0].entry.username, "Steve");
        assert_eq!(tracker.get("Steve").unwrap().state, PlayerState::Evaluating);
    }

    #[tokio::test(start_paused = true)]
    async fn test_apply_snapshot_skips_self_and_duplicates() {
        let mut tracker = RosterTracker::new(RosterConfig::for_bridge("RealmBot"));

        let arrivals =
            tracker.apply_snapshot(&[entry("RealmBot"), entry("Steve"), entry("Steve")]);

        assert_eq!(arrivals.len(), 1);
        assert!(tracker.get("RealmBot").is_none());
        assert_eq!(tracker.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_apply_snapshot_tracked_player_is_not_rearrived() {
        let mut tracker = RosterTracker::default();
        let arrivals = tracker.apply_snapshot(&[entry("Steve")]);
        admit_all(&mut tracker, arrivals);

        for _ in 0..5 {
            time::advance(Duration::from_secs(1)).await;
            assert!(tracker.apply_snapshot(&[entry("Steve")]).is_empty());
        }
        assert_eq!(tracker.get("Steve").unwrap().state, PlayerState::PresentTracked);
    }

    #[tokio::test(start_paused = true)]
    async fn test_apply_snapshot_missing_player_schedules_one_removal() {
        let mut tracker = RosterTracker::default();
        let arrivals = tracker.apply_snapshot(&[entry("Steve")]);
        admit_all(&mut tracker, arrivals);

        tracker.apply_snapshot(&[]);
        time::advance(Duration::from_secs(2)).await;
        tracker.apply_snapshot(&[]);

        assert!(tracker.is_pending_removal("Steve"));
        assert_eq!(tracker.removals.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_apply_snapshot_reappearance_cancels_removal() {
        let mut tracker = RosterTracker::default();
        let arrivals = tracker.apply_snapshot(&[entry("Steve")]);
        admit_all(&mut tracker, arrivals);

        tracker.apply_snapshot(&[]);
        time::advance(Duration::from_secs(6)).await;
        tracker.apply_snapshot(&[entry("Steve")]);

        assert!(!tracker.is_pending_removal("Steve"));
        let waited = time::timeout(Duration::from_secs(30), tracker.next_departure()).await;
        assert!(waited.is_err(), "no removal should fire");
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_departure_after_debounce_returns_left_and_purges() {
        let mut tracker = RosterTracker::default();
        let arrivals = tracker.apply_snapshot(&[entry("Steve")]);
        admit_all(&mut tracker, arrivals);
        let start = Instant::now();

        tracker.apply_snapshot(&[]);
        let departure = tracker.next_departure().await;

        assert!(matches!(departure, Departure::Left(ref r) if r.username == "Steve"));
        assert!(Instant::now() - start >= Duration::from_secs(7));
        assert!(tracker.get("Steve").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_departure_evaluating_player_is_abandoned() {
        let mut tracker = RosterTracker::default();
        let arrivals = tracker.apply_snapshot(&[entry("Steve")]);

        tracker.apply_snapshot(&[]);
        let departure = tracker.next_departure().await;

        assert!(matches!(departure, Departure::Abandoned(_)));
        let late = tracker
            .complete_evaluation("Steve", arrivals[0].episode, Resolution::Admit)
            .unwrap();
        assert!(matches!(late, Completion::Stale));
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_evaluation_old_episode_is_stale() {
        let mut tracker = RosterTracker::default();
        let first = tracker.apply_snapshot(&[entry("Steve")]);
        tracker.apply_snapshot(&[]);
        tracker.next_departure().await;
        let second = tracker.apply_snapshot(&[entry("Steve")]);

        assert_ne!(first[0].episode, second[0].episode);
        let result = tracker
            .complete_evaluation("Steve", first[0].episode, Resolution::Kick)
            .unwrap();
        assert!(matches!(result, Completion::Stale));
        assert_eq!(tracker.get("Steve").unwrap().state, PlayerState::Evaluating);
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_evaluation_twice_returns_invalid_transition() {
        let mut tracker = RosterTracker::default();
        let arrivals = tracker.apply_snapshot(&[entry("Steve")]);
        let episode = arrivals[0].episode;

        tracker
            .complete_evaluation("Steve", episode, Resolution::Admit)
            .unwrap();
        let again = tracker.complete_evaluation("Steve", episode, Resolution::Admit);

        assert!(matches!(again, Err(RosterError::InvalidTransition { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_evaluation_kick_purges_and_starts_cooldown() {
        let mut tracker = RosterTracker::default();
        let arrivals = tracker.apply_snapshot(&[entry("Bob")]);

        let result = tracker
            .complete_evaluation("Bob", arrivals[0].episode, Resolution::Kick)
            .unwrap();

        assert!(matches!(result, Completion::Kicked(ref r) if r.state == PlayerState::Kicked));
        assert!(tracker.get("Bob").is_none());
        assert!(tracker.is_cooling_down("Bob"));
        assert!(tracker.apply_snapshot(&[entry("Bob")]).is_empty());

        time::advance(Duration::from_secs(7)).await;
        assert!(!tracker.is_cooling_down("Bob"));
        assert_eq!(tracker.apply_snapshot(&[entry("Bob")]).len(), 1);
    }
}
