//! Chat relay rules for Realmguard.
//!
//! Two directions, two pure functions:
//!
//! - [`ChatBridge::filter_game`] decides which game chat events reach the
//!   chat platform, and cleans them up on the way.
//! - [`ChatBridge::render_for_game`] turns a chat-platform message into a
//!   `/tellraw` command for the game.
//!
//! # Loop prevention
//!
//! Every line we send into the game starts with the bridge marker
//! (`§9[Discord]`). The game echoes `/tellraw` output back to us as a
//! structured chat event; [`ChatBridge::filter_game`] drops anything that
//! carries the marker, so a relayed line never bounces back out.
//!
//! The check happens BEFORE formatting codes are stripped: the marker
//! itself contains a formatting code, and stripping first would erase it.

use realmguard_protocol::{
    Category, ChannelMessage, ChannelRole, ChatEvent, ChatKind, ChatMessage, Direction,
    GameCommand, Notification,
};
use serde::Deserialize;
use tracing::{debug, trace, warn};

/// Marker prefixed to every line relayed into the game.
pub const BRIDGE_MARKER: &str = "§9[Discord]";

/// Formatting code introducer in game text.
const SECTION_SIGN: char = '§';

/// Sender names containing this never get relayed (server console output).
const CONSOLE_SOURCE: &str = "CONSOLE";

// ---------------------------------------------------------------------------
// Text helpers
// ---------------------------------------------------------------------------

/// Removes `§x` formatting codes, where `x` is one of `0-9`, `a-f`, `k-o`
/// or `r`. A `§` followed by anything else is kept as is.
pub fn strip_formatting(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == SECTION_SIGN && chars.peek().copied().is_some_and(is_format_code) {
            chars.next();
            continue;
        }
        out.push(c);
    }
    out
}

fn is_format_code(c: char) -> bool {
    matches!(c, '0'..='9' | 'a'..='f' | 'k'..='o' | 'r')
}

/// Drops every character that could break out of a `/tellraw` JSON string
/// or inject formatting: `"`, `\`, `§`, `#` and control characters.
pub fn sanitize_for_command(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '"' | '\\' | '§' | '#') && !c.is_control())
        .collect()
}

/// Wraps a relayed chat line as a notification for the chat channel.
pub fn to_notification(message: &ChatMessage) -> Notification {
    let text = if message.sender.is_empty() {
        message.text.clone()
    } else {
        format!("{}: {}", message.sender, message.text)
    };
    Notification::new(Category::Chat, ChannelRole::Chat, "Minecraft Chat", text)
}

// ---------------------------------------------------------------------------
// Structured payloads
// ---------------------------------------------------------------------------

/// `{"rawtext":[{"text":"..."}, {"translate":"..."}, ...]}`
#[derive(Debug, Deserialize)]
struct RawText {
    #[serde(default)]
    rawtext: Vec<RawTextPart>,
}

#[derive(Debug, Deserialize)]
struct RawTextPart {
    #[serde(default)]
    text: Option<String>,
}

// ---------------------------------------------------------------------------
// ChatBridge
// ---------------------------------------------------------------------------

/// The relay rules, parameterized by the loop-prevention marker.
#[derive(Debug, Clone)]
pub struct ChatBridge {
    marker: String,
}

impl Default for ChatBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatBridge {
    pub fn new() -> Self {
        Self::with_marker(BRIDGE_MARKER)
    }

    pub fn with_marker(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Filters and cleans one game chat event.
    ///
    /// Structured payloads can carry several relayable lines; everything
    /// else yields at most one.
    pub fn filter_game(&self, event: &ChatEvent) -> Vec<ChatMessage> {
        match event.kind {
            ChatKind::Translation | ChatKind::System => Vec::new(),
            ChatKind::Chat => self.player_line(event).into_iter().collect(),
            ChatKind::Structured => self.structured_lines(&event.text),
        }
    }

    fn player_line(&self, event: &ChatEvent) -> Option<ChatMessage> {
        let source = event.source_name.trim();
        if source.is_empty() || source.contains(CONSOLE_SOURCE) {
            trace!(source, "chat without a player source dropped");
            return None;
        }
        if event.text.contains(&self.marker) {
            return None;
        }

        let text = strip_formatting(&event.text);
        if text.trim().is_empty() {
            return None;
        }
        Some(ChatMessage {
            direction: Direction::GameToChat,
            sender: strip_formatting(source),
            text,
        })
    }

    fn structured_lines(&self, payload: &str) -> Vec<ChatMessage> {
        let parsed: RawText = match serde_json::from_str(payload) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "unparseable structured chat dropped");
                return Vec::new();
            }
        };

        parsed
            .rawtext
            .into_iter()
            .filter_map(|part| part.text)
            .filter(|text| !text.contains(&self.marker))
            .map(|text| strip_formatting(&text))
            .filter(|text| text.contains('|') && !text.trim().is_empty())
            .map(|text| ChatMessage {
                direction: Direction::GameToChat,
                sender: String::new(),
                text,
            })
            .collect()
    }

    /// Builds the `/tellraw` command for a chat-platform message, or `None`
    /// if the message must not be relayed.
    pub fn render_for_game(&self, message: &ChannelMessage) -> Option<GameCommand> {
        if message.from_bot {
            return None;
        }

        let text = sanitize_for_command(&message.content);
        let text = text.trim();
        if text.is_empty() {
            debug!(author = %message.author, "nothing left to relay after sanitizing");
            return None;
        }
        let name = sanitize_for_command(message.sender_name());

        let line = format!("{} §f{} §8» §r{}", self.marker, name.trim(), text);
        let payload = serde_json::json!({ "rawtext": [{ "text": line }] });
        Some(GameCommand::new(format!("/tellraw @a {payload}")))
    }
}
