//! Error types for the protocol layer.

/// Errors raised while turning frames into envelopes and back.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The frame is not valid JSON or does not have the envelope shape.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame decoded but breaks a protocol rule, such as a client
    /// sending a server-only event.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
