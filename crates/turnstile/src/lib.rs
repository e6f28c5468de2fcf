//! # Turnstile
//!
//! WebSocket matchmaking server for turn-based web games.
//!
//! Players pick a game, wait in its lobby, and are grouped into a room as
//! soon as enough of them are waiting. Each member gets a turn index, and
//! moves are relayed to the rest of the room tagged with the mover's turn.
//! The server never looks inside a move.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use turnstile::prelude::*;
//!
//! # async fn run() -> Result<(), TurnstileError> {
//! let mut games = GameRegistry::new();
//! games.insert(GameConfig::new("ttt", "Tic Tac Toe", 2, 2))?;
//!
//! let server = TurnstileServer::builder()
//!     .bind("0.0.0.0:3000")
//!     .games(games)
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod clock;
mod error;
mod handler;
mod router;
mod server;

pub use clock::ServerClock;
pub use error::TurnstileError;
pub use router::SessionRouter;
pub use server::{TurnstileServer, TurnstileServerBuilder};

/// Everything needed to configure and run a server, plus the wire types
/// clients exchange with it.
pub mod prelude {
    pub use crate::{SessionRouter, TurnstileError, TurnstileServer, TurnstileServerBuilder};

    pub use turnstile_lobby::{GameConfig, GameRegistry, Matchmaker, MembershipTables};
    pub use turnstile_protocol::{
        ClientRequest, Codec, Envelope, EventKind, GameId, JsonCodec, MoveData, Payload,
        PeerEntry, PlayerId, RoomId, ServerEvent,
    };
    pub use turnstile_session::{IdentitySource, Player};
}
