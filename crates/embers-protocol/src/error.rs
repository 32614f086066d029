//! Error types for the protocol layer.
//!
//! Each crate in Embers defines its own error enum; a `ProtocolError`
//! always means a serialization problem, never a rules or engine
//! problem.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed. Common causes: malformed JSON, missing
    /// required fields, wrong data types, truncated messages.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message parsed but is invalid at the protocol level —
    /// e.g. a clue value outside any variant's range.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
