//! # Realmguard
//!
//! Moderation and chat bridge between a multiplayer game session and a
//! chat platform.
//!
//! Realmguard watches the live player roster, kicks players who break the
//! moderation policy (ban lists, alt accounts, spoofed devices), posts
//! joins, leaves and kicks to the chat platform, relays chat both ways,
//! and reconnects whenever the game session drops.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use realmguard::prelude::*;
//!
//! # async fn start() -> Result<(), RealmguardError> {
//! let config = ConfigStore::new("config.json").load().await?;
//! let connector = SidecarConnector::websocket(&config);
//! let (handle, task) = RealmBridge::builder(config).build(connector).spawn();
//! # let _ = (handle, task);
//! # Ok(())
//! # }
//! ```

mod bridge;
mod config;
mod error;
mod handler;
mod notify;
mod session;
mod supervisor;

pub use bridge::{BridgeHandle, RealmBridge, RealmBridgeBuilder};
pub use config::{BridgeConfig, ConfigStore, LogChannels, RealmConfig};
pub use error::RealmguardError;
pub use handler::SessionEnd;
pub use notify::{ChannelSink, NotificationSink, TracingSink};
pub use session::{CodecSession, GameSession, SessionConnector, SidecarConnector};
pub use supervisor::{LinkState, ReconnectPolicy};

pub mod prelude {
    pub use crate::{
        BridgeConfig, BridgeHandle, ChannelSink, ConfigStore, GameSession, LinkState,
        NotificationSink, RealmBridge, RealmguardError, ReconnectPolicy, SessionConnector,
        SidecarConnector, TracingSink,
    };
    pub use realmguard_moderation::{
        AccountMetrics, AdminCommand, Caller, DeviceSession, DisabledVerifier, PresenceReport,
        ThresholdField, Verifier, VerifierError,
    };
    pub use realmguard_protocol::{
        ChannelMessage, GameCommand, IdentityId, Notification, Platform, RosterEntry,
        SessionEvent,
    };
}

/// Installs a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
///
/// Does nothing if a global subscriber is already set.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .try_init();
}
