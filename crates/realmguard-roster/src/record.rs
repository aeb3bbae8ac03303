//! Presence records: what the bridge knows about one visible player.
//!
//! A record tracks:
//! - WHO the player is (username, identity, claimed platform)
//! - WHERE they are in the moderation lifecycle ([`PlayerState`])
//! - WHEN they were last seen in a snapshot (for leave debouncing)
//! - WHICH presence episode this is (so late verdicts can be discarded)

use std::fmt;
use std::time::Duration;

use realmguard_protocol::{IdentityId, Platform};
use tokio::time::Instant;

use crate::RosterError;

// ---------------------------------------------------------------------------
// RosterConfig
// ---------------------------------------------------------------------------

/// Configuration for presence tracking.
#[derive(Debug, Clone)]
pub struct RosterConfig {
    /// How long a tracked player must be continuously missing before the
    /// departure is confirmed. Snapshots are lossy; one missing snapshot
    /// is not a leave.
    ///
    /// Default: 7 seconds.
    pub debounce: Duration,

    /// The bridge's own username. Entries with this name are skipped
    /// entirely: the bridge never moderates or announces itself.
    pub self_username: Option<String>,
}

impl RosterConfig {
    /// Default debounce window.
    pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(7);

    /// Default config that ignores the given bridge username.
    pub fn for_bridge(username: impl Into<String>) -> Self {
        Self {
            self_username: Some(username.into()),
            ..Self::default()
        }
    }
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            debounce: Self::DEFAULT_DEBOUNCE,
            self_username: None,
        }
    }
}

// ---------------------------------------------------------------------------
// PlayerState
// ---------------------------------------------------------------------------

/// Lifecycle of a tracked player.
///
/// ```text
///   (no record) ──(appears)──→ Evaluating ──(kick)──→ Kicked ──→ purged
///                                  │
///                               (admit)
///                                  ▼
///                              Admitted ──→ PresentTracked ──(absent ≥ debounce)──→ Left ──→ purged
/// ```
///
/// "Unknown" is simply the absence of a record. `Kicked` and `Left` are
/// terminal: the record is removed right after entering them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// Moderation verdict pending (verifier calls may be in flight).
    Evaluating,
    /// Verdict was admit; the join announcement is being emitted.
    Admitted,
    /// Announced and present; refreshed by every snapshot.
    PresentTracked,
    /// Absence confirmed.
    Left,
    /// Verdict was kick.
    Kicked,
}

impl PlayerState {
    /// Returns `true` if moving from `self` to `target` is allowed.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Evaluating, Self::Admitted)
                | (Self::Evaluating, Self::Kicked)
                | (Self::Admitted, Self::PresentTracked)
                | (Self::PresentTracked, Self::Left)
        )
    }

    /// Returns `true` once the join has been announced.
    pub fn is_announced(self) -> bool {
        matches!(self, Self::PresentTracked)
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Evaluating => write!(f, "Evaluating"),
            Self::Admitted => write!(f, "Admitted"),
            Self::PresentTracked => write!(f, "PresentTracked"),
            Self::Left => write!(f, "Left"),
            Self::Kicked => write!(f, "Kicked"),
        }
    }
}

// ---------------------------------------------------------------------------
// PlayerRecord
// ---------------------------------------------------------------------------

/// One tracked player. Keyed by username inside the tracker.
#[derive(Debug, Clone)]
pub struct PlayerRecord {
    pub username: String,
    pub identity_id: IdentityId,
    /// Platform claimed in the roster entry that created this record.
    pub platform: Platform,
    /// Last snapshot that listed this player (Tokio's monotonic clock, so
    /// paused-time tests can drive it).
    pub last_seen: Instant,
    pub state: PlayerState,
    /// Presence episode number, unique per tracker.
    pub episode: u64,
}

impl PlayerRecord {
    /// Moves the record to `target`, enforcing the state machine.
    ///
    /// # Errors
    /// Returns [`RosterError::InvalidTransition`] if the move is not
    /// allowed from the current state.
    pub fn transition(&mut self, target: PlayerState) -> Result<(), RosterError> {
        if !self.state.can_transition_to(target) {
            return Err(RosterError::InvalidTransition {
                username: self.username.clone(),
                from: self.state,
                to: target,
            });
        }
        self.state = target;
        Ok(())
    }

    /// How long ago this player was last seen, measured at `now`.
    pub fn absent_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_seen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(state: PlayerState) -> PlayerRecord {
        PlayerRecord {
            username: "Steve".into(),
            identity_id: IdentityId::from("1"),
            platform: Platform::Windows,
            last_seen: Instant::now(),
            state,
            episode: 1,
        }
    }

    #[test]
    fn test_can_transition_to_follows_lifecycle() {
        use PlayerState::*;
        assert!(Evaluating.can_transition_to(Admitted));
        assert!(Evaluating.can_transition_to(Kicked));
        assert!(Admitted.can_transition_to(PresentTracked));
        assert!(PresentTracked.can_transition_to(Left));

        assert!(!Evaluating.can_transition_to(PresentTracked));
        assert!(!PresentTracked.can_transition_to(Kicked));
        assert!(!Left.can_transition_to(PresentTracked));
        assert!(!Kicked.can_transition_to(Admitted));
    }

    #[test]
    fn test_transition_invalid_returns_error_and_keeps_state() {
        let mut rec = record(PlayerState::PresentTracked);

        let result = rec.transition(PlayerState::Admitted);

        assert!(matches!(
            result,
            Err(RosterError::InvalidTransition {
                from: PlayerState::PresentTracked,
                to: PlayerState::Admitted,
                ..
            })
        ));
        assert_eq!(rec.state, PlayerState::PresentTracked);
    }

    #[test]
    fn test_roster_config_default_debounce_is_seven_seconds() {
        let config = RosterConfig::default();
        assert_eq!(config.debounce, Duration::from_secs(7));
        assert!(config.self_username.is_none());
        assert_eq!(
            RosterConfig::for_bridge("RealmBot").self_username.as_deref(),
            Some("RealmBot")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_absent_for_measures_since_last_seen() {
        let rec = record(PlayerState::PresentTracked);
        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(rec.absent_for(Instant::now()), Duration::from_secs(3));
    }
}
