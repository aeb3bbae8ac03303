//! Moderation configuration and its shared, admin-mutable handle.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

// ---------------------------------------------------------------------------
// AltThresholds
// ---------------------------------------------------------------------------

/// Alt-account detection thresholds.
///
/// A player is flagged if ANY metric is strictly below its threshold.
/// Established accounts rarely have zero friends; throwaways rarely have
/// anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AltThresholds {
    pub max_gamer_score: u64,
    pub max_friends: u64,
    pub max_followers: u64,
}

impl Default for AltThresholds {
    fn default() -> Self {
        Self {
            max_gamer_score: 1000,
            max_friends: 10,
            max_followers: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// ModerationConfig
// ---------------------------------------------------------------------------

/// The policy lists and thresholds.
///
/// Field names match the configuration document (`bannedDevices`,
/// `altSystem`, …). Every field is optional there.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModerationConfig {
    /// Usernames that skip every heuristic check.
    pub whitelist: BTreeSet<String>,

    /// Platform names (matched through `Platform::from_name`).
    pub banned_devices: BTreeSet<String>,

    /// Usernames that are always kicked, whitelist or not.
    pub banned_players: BTreeSet<String>,

    /// Chat-platform user ids or names allowed to run admin operations.
    pub admins: BTreeSet<String>,

    #[serde(rename = "altSystem")]
    pub alt_thresholds: AltThresholds,
}

impl ModerationConfig {
    pub fn is_whitelisted(&self, username: &str) -> bool {
        self.whitelist.contains(username)
    }

    pub fn is_banned(&self, username: &str) -> bool {
        self.banned_players.contains(username)
    }

    /// Returns `true` if `caller` (id or display name) is an admin.
    pub fn is_admin(&self, caller: &str) -> bool {
        self.admins.contains(caller)
    }
}

// ---------------------------------------------------------------------------
// SharedConfig
// ---------------------------------------------------------------------------

/// A cloneable handle to the live configuration.
///
/// Evaluations take a [`snapshot`](Self::snapshot) up front so a verdict
/// is always computed against one consistent view, even if an admin edits
/// the lists while verifier calls are in flight.
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<ModerationConfig>>,
}

impl SharedConfig {
    pub fn new(config: ModerationConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// A copy of the current configuration.
    pub async fn snapshot(&self) -> ModerationConfig {
        self.inner.read().await.clone()
    }

    /// Runs `f` with exclusive access and returns its result.
    pub async fn update<R>(&self, f: impl FnOnce(&mut ModerationConfig) -> R) -> R {
        let mut guard = self.inner.write().await;
        f(&mut guard)
    }
}
