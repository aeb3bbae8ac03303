//! Shared data model for Realmguard.
//!
//! Everything that crosses a boundary between the bridge and its
//! collaborators lives here:
//!
//! - **Identity & platform** ([`IdentityId`], [`Platform`]): who a player
//!   is and which client they claim to run.
//! - **Session traffic** ([`SessionEvent`], [`SessionRequest`],
//!   [`GameCommand`]): what the game-session sidecar sends us and what we
//!   send back.
//! - **Chat platform traffic** ([`ChannelMessage`], [`Notification`]):
//!   inbound chat from moderators and outbound categorized posts.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those values become
//!   bytes (and how the configuration document is read and written).
//!
//! ```text
//! Transport (bytes) → Protocol (SessionEvent) → Roster / Moderation / Chat
//! ```

mod codec;
mod error;
mod platform;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use platform::Platform;
pub use types::{
    Category, ChannelMessage, ChannelRole, ChatEvent, ChatKind, ChatMessage,
    Direction, GameCommand, IdentityId, Notification, RosterEntry,
    SessionEvent, SessionRequest,
};
