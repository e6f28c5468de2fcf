//! Wire protocol for Turnstile.
//!
//! - **Types** ([`Envelope`], [`Payload`], [`ClientRequest`], [`ServerEvent`])
//!   describe every message that crosses the socket.
//! - **Codec** ([`Codec`], [`JsonCodec`]) turns them into bytes.
//! - **Errors** ([`ProtocolError`]) report what went wrong while doing so.
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Session (player identity)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    ClientRequest, Envelope, EventKind, GameId, MoveData, Payload, PeerEntry,
    PlayerId, RoomId, ServerEvent,
};
