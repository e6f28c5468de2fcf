//! Matchmaking core for Turnstile.
//!
//! Players join a per-game [`Lobby`]; every successful join triggers a
//! grouping attempt that drains a room's worth of players, names the room,
//! and records each member's room and turn in the shared
//! [`MembershipTables`].
//!
//! # Key types
//!
//! - [`GameRegistry`] — games loaded at startup, each owning one [`Lobby`]
//! - [`Matchmaker`] — queue admission, room formation, disconnect cleanup
//! - [`MembershipTables`] — player → room, (room, player) → turn, room → roster
//! - [`RoomNamer`] — room identifier generation

mod config;
mod error;
mod lobby;
mod matchmaker;
mod membership;
mod naming;
mod registry;

pub use config::{GameConfig, GroupBounds};
pub use error::{MatchError, RegistryError};
pub use lobby::Lobby;
pub use matchmaker::{FormedRoom, Matchmaker};
pub use membership::{Departure, MembershipTables, Relocation, TurnKey};
pub use naming::{RoomNamer, WordNamer};
pub use registry::{Game, GameRegistry};
