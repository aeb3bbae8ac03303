//! Where categorized notifications go.
//!
//! The chat-platform client lives outside Realmguard. It consumes
//! notifications through the [`NotificationSink`] trait, or simply reads
//! them from a [`ChannelSink`] receiver.

use std::future::Future;

use realmguard_moderation::{Decision, Reason};
use realmguard_protocol::{Category, ChannelRole, Notification};
use realmguard_roster::PlayerRecord;
use tokio::sync::mpsc;
use tracing::info;

use crate::RealmguardError;

/// Delivers notifications to the chat platform.
///
/// Failures are reported, but the bridge only logs them: a missed post is
/// never retried and never stops moderation.
pub trait NotificationSink: Send + Sync + 'static {
    fn post(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<(), RealmguardError>> + Send;
}

/// Forwards notifications into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelSink {
    /// Creates a sink and the receiver that drains it.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelSink {
    async fn post(&self, notification: Notification) -> Result<(), RealmguardError> {
        self.tx
            .send(notification)
            .map_err(|_| RealmguardError::Notify("receiver dropped".into()))
    }
}

/// Writes notifications to the log. Useful when no chat platform is
/// attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    async fn post(&self, notification: Notification) -> Result<(), RealmguardError> {
        info!(
            category = ?notification.category,
            channel = ?notification.channel_role,
            title = %notification.title,
            "{}",
            notification.text
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Notification texts
// ---------------------------------------------------------------------------

pub(crate) fn player_joined(record: &PlayerRecord, decision: &Decision) -> Notification {
    let mut text = format!(
        "{} joined the realm\nDevice: {}",
        record.username, record.platform
    );
    if decision.reason == Reason::Whitelisted {
        text.push_str("\n(whitelisted)");
    }
    Notification::new(Category::Join, ChannelRole::JoinsAndLeaves, "Player Joined", text)
}

pub(crate) fn player_left(record: &PlayerRecord) -> Notification {
    Notification::new(
        Category::Leave,
        ChannelRole::JoinsAndLeaves,
        "Player Left",
        format!("{} left the realm", record.username),
    )
}

pub(crate) fn player_kicked(record: &PlayerRecord, decision: &Decision) -> Notification {
    let mut text = format!(
        "{} was kicked\nReason: {}\nDevice: {}",
        record.username, decision.reason, record.platform
    );
    if let Some(evidence) = decision.evidence_text() {
        text.push('\n');
        text.push_str(&evidence);
    }
    Notification::new(Category::Kick, ChannelRole::Kicks, "Player Kicked", text)
}

pub(crate) fn bridge_connected(realm_name: &str) -> Notification {
    Notification::new(
        Category::System,
        ChannelRole::Chat,
        "Bot Connected",
        format!("Connected to {realm_name}"),
    )
}

pub(crate) fn bridge_kicked(realm_name: &str, reason: &str) -> Notification {
    Notification::new(
        Category::System,
        ChannelRole::Kicks,
        "Realm Kick",
        format!("The bridge was kicked from {realm_name}\nReason: {reason}"),
    )
}

pub(crate) fn bridge_disconnected(realm_name: &str, detail: &str) -> Notification {
    Notification::new(
        Category::System,
        ChannelRole::Chat,
        "Bot Disconnected",
        format!("Lost connection to {realm_name}: {detail}"),
    )
}
