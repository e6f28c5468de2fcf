//! Error types for the session layer.

use turnstile_protocol::PlayerId;

/// Errors raised while delivering events to players.
///
/// Delivery is best effort: callers log these and move on, they never tear
/// down the connection that triggered the send.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The player is not registered with the broadcast groups, either
    /// because it never connected or because it already disconnected.
    #[error("unknown peer {0}")]
    UnknownPeer(PlayerId),

    /// The player's outbound channel is closed (its connection task ended).
    #[error("peer {0} is gone")]
    PeerGone(PlayerId),
}
