//! Unified error type for Realmguard.

use std::path::PathBuf;

use realmguard_moderation::{ConfigError, VerifierError};
use realmguard_protocol::ProtocolError;
use realmguard_roster::RosterError;
use realmguard_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates a `From` impl, so `?`
/// converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum RealmguardError {
    /// The link to the game session failed (connect, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame or the configuration document didn't (de)serialize.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A presence lifecycle violation.
    #[error(transparent)]
    Roster(#[from] RosterError),

    /// An account lookup failed. Never fatal; surfaced only by callers
    /// that query a verifier directly.
    #[error(transparent)]
    Verifier(#[from] VerifierError),

    /// An admin operation was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Reading or writing the configuration file failed.
    #[error("config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The notification sink refused a message.
    #[error("notification not delivered: {0}")]
    Notify(String),

    /// The bridge's background task is gone.
    #[error("bridge is shut down")]
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let err: RealmguardError = err.into();
        assert!(matches!(err, RealmguardError::Transport(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err: RealmguardError = ProtocolError::InvalidMessage("bad".into()).into();
        assert!(matches!(err, RealmguardError::Protocol(_)));
    }

    #[test]
    fn test_from_config_error() {
        let err: RealmguardError = ConfigError::PermissionDenied("eve".into()).into();
        assert!(matches!(err, RealmguardError::Config(_)));
        assert!(err.to_string().contains("eve"));
    }

    #[test]
    fn test_from_verifier_error() {
        let err: RealmguardError = VerifierError::Unavailable("down".into()).into();
        assert!(matches!(err, RealmguardError::Verifier(_)));
    }
}
