//! Codec trait and implementations for serializing messages.
//!
//! The engine does not care how actions and events are represented on
//! the wire; it hands structured values to whatever implements
//! [`Codec`]. [`JsonCodec`] is the default — human-readable, easy to
//! inspect in logs and the persisted action record. A binary codec can
//! be added later without touching the engine.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Converts between Rust types and raw bytes.
///
/// `Send + Sync + 'static` because the codec is shared by long-lived
/// async tasks. The methods are generic: anything serde-serializable
/// can go through, which covers actions, events, and the persisted
/// action log uniformly.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed,
    /// incomplete, or do not match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// Behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use embers_protocol::{Action, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let action = Action::Play { target: 12 };
///
/// let bytes = codec.encode(&action).unwrap();
/// let decoded: Action = codec.decode(&bytes).unwrap();
/// assert_eq!(action, decoded);
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
}
