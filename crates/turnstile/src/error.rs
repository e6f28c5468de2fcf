//! Unified error type for the Turnstile server.

use turnstile_lobby::{MatchError, RegistryError};
use turnstile_protocol::ProtocolError;
use turnstile_session::SessionError;
use turnstile_transport::TransportError;

/// Top-level error wrapping every layer's error.
///
/// `#[from]` on each variant lets `?` lift sub-crate errors without
/// explicit mapping.
#[derive(Debug, thiserror::Error)]
pub enum TurnstileError {
    /// Binding, accepting, or socket I/O failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// An event could not be delivered to a peer.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A matchmaking call referred to an unknown game.
    #[error(transparent)]
    Match(#[from] MatchError),

    /// The game definitions could not be loaded.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
