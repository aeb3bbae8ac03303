//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding protocol values.
///
/// Each crate in Realmguard defines its own error enum, so a
/// `ProtocolError` always means the problem is in (de)serialization,
/// never in networking or moderation.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust value).
    ///
    /// Common causes: a sidecar speaking a newer frame format, missing
    /// required fields, or a hand-edited configuration file with a typo.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The value decoded but violates a protocol rule.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
