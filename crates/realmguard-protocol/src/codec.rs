//! Codec trait and implementations for serializing/deserializing values.
//!
//! The bridge never cares HOW a sidecar frame or the configuration
//! document is serialized; it only needs something implementing
//! [`Codec`]. [`JsonCodec`] is the only implementation today because the
//! sidecar protocol and `config.json` are both JSON.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes Rust values to bytes and decodes bytes back.
///
/// `Send + Sync + 'static` because a codec lives inside long-running
/// session tasks that Tokio may move between worker threads.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;

    /// Like [`encode`](Self::encode), but produces human-oriented output.
    ///
    /// Used when the bytes end up in a file an operator may edit by hand.
    /// Defaults to the compact encoding.
    fn encode_pretty<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        self.encode(value)
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// ```rust
/// use realmguard_protocol::{Codec, JsonCodec, SessionEvent};
///
/// let codec = JsonCodec;
/// let event: SessionEvent = codec
///     .decode(br#"{"type":"Kicked","reason":"idle"}"#)
///     .unwrap();
/// assert_eq!(event, SessionEvent::Kicked { reason: "idle".into() });
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }

    fn encode_pretty<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec_pretty(value).map_err(ProtocolError::Encode)
    }
}
