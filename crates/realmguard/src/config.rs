//! The configuration document and where it lives on disk.
//!
//! One flat JSON file, camelCase keys:
//!
//! ```json
//! {
//!   "username": "RealmBot",
//!   "realm": {
//!     "name": "My Realm",
//!     "code": "AbCdEfGh123",
//!     "endpoint": "ws://127.0.0.1:9000",
//!     "logChannels": { "chat": "...", "joinsAndLeaves": "...", "kicks": "..." }
//!   },
//!   "whitelist": [],
//!   "bannedDevices": [],
//!   "bannedPlayers": [],
//!   "admins": [],
//!   "altSystem": { "maxGamerScore": 1000, "maxFriends": 10, "maxFollowers": 10 }
//! }
//! ```
//!
//! Admin operations rewrite the file through [`ConfigStore::save`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use realmguard_moderation::ModerationConfig;
use realmguard_protocol::{ChannelRole, Codec, JsonCodec};
use serde::{Deserialize, Serialize};

use crate::{RealmguardError, ReconnectPolicy};

/// Chat-platform channel ids, one per [`ChannelRole`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogChannels {
    pub chat: String,
    pub joins_and_leaves: String,
    pub kicks: String,
}

impl LogChannels {
    /// The channel id configured for `role`.
    pub fn channel_for(&self, role: ChannelRole) -> &str {
        match role {
            ChannelRole::Chat => &self.chat,
            ChannelRole::JoinsAndLeaves => &self.joins_and_leaves,
            ChannelRole::Kicks => &self.kicks,
        }
    }
}

/// Which realm to join and where its notifications go.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealmConfig {
    #[serde(default)]
    pub name: String,
    /// Invite code handed to the game session on join.
    pub code: String,
    /// Sidecar URL (for example `ws://127.0.0.1:9000`).
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub log_channels: LogChannels,
}

/// The whole configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfig {
    /// The bridge's own in-game name; never moderated or announced.
    pub username: String,
    pub realm: RealmConfig,
    #[serde(flatten)]
    pub moderation: ModerationConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconnect_delay_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verifier_timeout_secs: Option<u64>,
}

impl BridgeConfig {
    /// Fixed reconnect delay from `reconnectDelaySecs`, else the default.
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        self.reconnect_delay_secs
            .map(|secs| ReconnectPolicy::Fixed(Duration::from_secs(secs)))
            .unwrap_or_default()
    }

    /// Verifier timeout from `verifierTimeoutSecs`, if set.
    pub fn verifier_timeout(&self) -> Option<Duration> {
        self.verifier_timeout_secs.map(Duration::from_secs)
    }
}

/// Loads and saves a [`BridgeConfig`] at a fixed path.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    codec: JsonCodec,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            codec: JsonCodec,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and parses the document.
    ///
    /// # Errors
    /// [`RealmguardError::Io`] if the file can't be read,
    /// [`RealmguardError::Protocol`] if it isn't a valid document.
    pub async fn load(&self) -> Result<BridgeConfig, RealmguardError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| self.io_error(source))?;
        Ok(self.codec.decode(&bytes)?)
    }

    /// Writes the document, pretty-printed.
    pub async fn save(&self, config: &BridgeConfig) -> Result<(), RealmguardError> {
        let bytes = self.codec.encode_pretty(config)?;
        tokio::fs::write(&self.path, bytes)
            .await
            .map_err(|source| self.io_error(source))
    }

    fn io_error(&self, source: std::io::Error) -> RealmguardError {
        RealmguardError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
