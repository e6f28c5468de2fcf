//! Player identity and message fan-out for Turnstile.
//!
//! 1. **Identity** — the [`IdentitySource`] capability every connected player
//!    exposes, wrapped in the cheap [`Player`] handle.
//! 2. **Broadcast groups** — [`BroadcastGroups`], the in-process registry of
//!    named groups (one per room) used to fan events out to members.
//!
//! ```text
//! Lobby layer (above)    ← queues and groups Players, never sees sockets
//!     ↕
//! Session layer (this crate)
//!     ↕
//! Protocol layer (below) ← PlayerId, RoomId, ServerEvent
//! ```

mod error;
mod groups;
mod identity;

pub use error::SessionError;
pub use groups::{BroadcastGroups, PeerHandle, PeerReceiver, PeerSender};
pub use identity::{IdentitySource, Player};
