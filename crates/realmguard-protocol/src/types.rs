//! Core data types shared by every Realmguard layer.
//!
//! Two groups live here:
//!
//! 1. **Sidecar frames**: [`SessionEvent`] (sidecar → bridge) and
//!    [`SessionRequest`] (bridge → sidecar). These travel as JSON over the
//!    WebSocket link to the process that actually speaks the game protocol.
//! 2. **Bridge values**: roster entries, chat messages, and
//!    notifications that flow between the roster engine, the moderation
//!    evaluator, the chat bridge, and the notification sink.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::Platform;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A player's persistent identity (the account id behind the gamertag).
///
/// Usernames can change between sessions; the identity cannot, so it is
/// what the verifier is queried with. Serialized as the bare string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(pub String);

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IdentityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// One visible player in a roster snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Display name, unique within a session.
    pub username: String,

    /// Persistent account identity.
    pub identity_id: IdentityId,

    /// The platform the client *claims* to be running on. A missing or
    /// malformed code decodes as [`Platform::Unknown`].
    #[serde(rename = "build_platform", default)]
    pub platform: Platform,
}

impl RosterEntry {
    /// Convenience constructor, mostly for tests and demos.
    pub fn new(
        username: impl Into<String>,
        identity_id: impl Into<String>,
        platform: Platform,
    ) -> Self {
        Self {
            username: username.into(),
            identity_id: IdentityId(identity_id.into()),
            platform,
        }
    }
}

// ---------------------------------------------------------------------------
// Chat events from the game
// ---------------------------------------------------------------------------

/// How the game tagged a chat payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    /// Plain player chat: `source_name` says who, `text` says what.
    Chat,
    /// Rich-text JSON (`{"rawtext":[…]}`), typically produced by commands.
    #[serde(alias = "json")]
    Structured,
    /// Localization key plus parameters; never player-authored.
    Translation,
    /// Server/system broadcasts.
    System,
}

/// A chat payload observed in the game session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEvent {
    pub kind: ChatKind,
    /// Sender name; empty for structured and system payloads.
    #[serde(default)]
    pub source_name: String,
    pub text: String,
}

// ---------------------------------------------------------------------------
// Sidecar frames
// ---------------------------------------------------------------------------

/// Everything the game session can tell the bridge.
///
/// Internally tagged (`#[serde(tag = "type")]`), so a kick arrives as
/// `{"type":"Kicked","reason":"..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// The bridge's own player spawned into the world.
    Spawned,

    /// The current player list.
    RosterSnapshot { entries: Vec<RosterEntry> },

    /// A chat payload.
    Chat(ChatEvent),

    /// The connection to the game failed.
    Error { message: String },

    /// The bridge's own player was kicked from the game.
    Kicked { reason: String },
}

/// Everything the bridge can ask the sidecar to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionRequest {
    /// First frame on a new link: which realm to join, as whom.
    Join { realm_code: String, username: String },

    /// Run a slash command as the bridge's player.
    Command(GameCommand),
}

/// A fire-and-forget text command for the game.
///
/// The `request_id` exists purely so that sidecar logs and bridge logs
/// can be correlated; nothing waits for an acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameCommand {
    pub request_id: String,
    pub command: String,
}

impl GameCommand {
    /// Wraps a command line with a fresh random request id.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            request_id: generate_request_id(),
            command: command.into(),
        }
    }
}

/// 32 lowercase hex characters (128 random bits).
fn generate_request_id() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// ---------------------------------------------------------------------------
// Chat platform side
// ---------------------------------------------------------------------------

/// A message typed by someone in the chat platform's bridge channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMessage {
    /// Account name of the author.
    pub author: String,
    /// Server-specific nickname, if the author set one.
    #[serde(default)]
    pub display_name: Option<String>,
    pub content: String,
    /// Messages from bots (including ourselves) are never relayed.
    #[serde(default)]
    pub from_bot: bool,
}

impl ChannelMessage {
    /// The name to show in game: nickname if set, else account name.
    pub fn sender_name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.author)
    }
}

/// Which way a relayed chat line travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    GameToChat,
    ChatToGame,
}

/// A chat line after the bridge's filtering and sanitization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub direction: Direction,
    /// Display name of the sender; empty when the sender is embedded in
    /// the text itself (structured `name|message` payloads).
    pub sender: String,
    pub text: String,
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// What kind of event a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Join,
    Leave,
    Kick,
    Chat,
    System,
}

/// Which configured channel a notification is delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChannelRole {
    Chat,
    JoinsAndLeaves,
    Kicks,
}

/// A categorized message for the notification sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub category: Category,
    pub channel_role: ChannelRole,
    /// Short heading ("Player Joined", "Player Kicked", …).
    pub title: String,
    pub text: String,
}

impl Notification {
    pub fn new(
        category: Category,
        channel_role: ChannelRole,
        title: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            category,
            channel_role,
            title: title.into(),
            text: text.into(),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! These tests pin the JSON shapes the sidecar exchanges with us. A
    //! mismatch here means the sidecar silently drops our frames.

    use super::*;

    #[test]
    fn test_roster_snapshot_decodes_build_platform_code() {
        let json = r#"{
            "type": "RosterSnapshot",
            "entries": [
                {"username": "Steve", "identity_id": "2535400000000001", "build_platform": 1},
                {"username": "Alex", "identity_id": "2535400000000002", "build_platform": 42}
            ]
        }"#;
        let event: SessionEvent = serde_json::from_str(json).unwrap();

        let SessionEvent::RosterSnapshot { entries } = event else {
            panic!("expected RosterSnapshot");
        };
        assert_eq!(entries[0].platform, Platform::Android);
        assert_eq!(entries[0].identity_id, IdentityId::from("2535400000000001"));
        assert_eq!(entries[1].platform, Platform::Unknown);
    }

    #[test]
    fn test_roster_snapshot_bad_platform_keeps_other_entries() {
        let json = r#"{
            "type": "RosterSnapshot",
            "entries": [
                {"username": "Steve", "identity_id": "1", "build_platform": 12},
                {"username": "Alex", "identity_id": "2", "build_platform": "weird"},
                {"username": "Sam", "identity_id": "3", "build_platform": 4294967296},
                {"username": "Kai", "identity_id": "4"}
            ]
        }"#;
        let event: SessionEvent = serde_json::from_str(json).unwrap();

        let SessionEvent::RosterSnapshot { entries } = event else {
            panic!("expected RosterSnapshot");
        };
        let platforms: Vec<Platform> = entries.iter().map(|e| e.platform).collect();
        assert_eq!(
            platforms,
            [Platform::Xbox, Platform::Unknown, Platform::Unknown, Platform::Unknown]
        );
    }

    #[test]
    fn test_chat_event_is_flattened_into_tagged_frame() {
        let json = r#"{"type":"Chat","kind":"chat","source_name":"Steve","text":"hi"}"#;
        let event: SessionEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            SessionEvent::Chat(ChatEvent {
                kind: ChatKind::Chat,
                source_name: "Steve".into(),
                text: "hi".into(),
            })
        );
    }

    #[test]
    fn test_chat_kind_accepts_json_alias() {
        let kind: ChatKind = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(kind, ChatKind::Structured);
    }

    #[test]
    fn test_chat_event_without_source_name_defaults_empty() {
        let json = r#"{"type":"Chat","kind":"structured","text":"{}"}"#;
        let event: SessionEvent = serde_json::from_str(json).unwrap();
        let SessionEvent::Chat(chat) = event else {
            panic!("expected Chat");
        };
        assert!(chat.source_name.is_empty());
    }

    #[test]
    fn test_session_request_join_json_format() {
        let req = SessionRequest::Join {
            realm_code: "abc123".into(),
            username: "RealmBot".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&req).unwrap();
        assert_eq!(json["type"], "Join");
        assert_eq!(json["realm_code"], "abc123");
        assert_eq!(json["username"], "RealmBot");
    }

    #[test]
    fn test_session_request_command_json_format() {
        let req = SessionRequest::Command(GameCommand::new("/say hello"));
        let json: serde_json::Value = serde_json::to_value(&req).unwrap();
        assert_eq!(json["type"], "Command");
        assert_eq!(json["command"], "/say hello");
        assert_eq!(json["request_id"].as_str().unwrap().len(), 32);
    }

    #[test]
    fn test_game_command_new_generates_unique_ids() {
        let a = GameCommand::new("/list");
        let b = GameCommand::new("/list");
        assert_ne!(a.request_id, b.request_id);
        assert!(a.request_id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_sender_name_prefers_nickname() {
        let mut msg = ChannelMessage {
            author: "nate#0001".into(),
            display_name: Some("Nate".into()),
            content: "hi".into(),
            from_bot: false,
        };
        assert_eq!(msg.sender_name(), "Nate");

        msg.display_name = Some("   ".into());
        assert_eq!(msg.sender_name(), "nate#0001");

        msg.display_name = None;
        assert_eq!(msg.sender_name(), "nate#0001");
    }

    #[test]
    fn test_channel_role_serializes_camel_case() {
        let json = serde_json::to_string(&ChannelRole::JoinsAndLeaves).unwrap();
        assert_eq!(json, "\"joinsAndLeaves\"");
    }
}
