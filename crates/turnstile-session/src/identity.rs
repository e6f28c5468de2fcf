//! The identity capability a connection hands to the matchmaking core.
//!
//! The core never touches a socket. It only needs to know who a player is
//! and how to reach them, so that is all [`IdentitySource`] offers. The
//! server implements it over WebSocket channels ([`PeerHandle`]); tests
//! implement it with a recorder.
//!
//! [`PeerHandle`]: crate::PeerHandle

use std::fmt;
use std::sync::Arc;

use turnstile_protocol::{PlayerId, RoomId, ServerEvent};

use crate::SessionError;

/// What a connected participant can do.
pub trait IdentitySource: Send + Sync + 'static {
    /// Stable for the lifetime of the connection.
    fn id(&self) -> &PlayerId;

    /// Adds this participant to the named broadcast group.
    fn join_group(&self, group: &RoomId) -> Result<(), SessionError>;

    /// Removes this participant from the named group. No-op if absent.
    fn leave_group(&self, group: &RoomId);

    /// Sends an event to this participant only.
    fn emit(&self, event: ServerEvent) -> Result<(), SessionError>;

    /// Sends an event to every other member of `group`.
    ///
    /// The sender itself does not receive it, even when it is a member.
    fn broadcast_to(&self, group: &RoomId, event: ServerEvent) -> Result<(), SessionError>;
}

/// Handle to a connected player.
///
/// Cloning is a reference count bump. Two handles are equal when they
/// refer to the same player id.
#[derive(Clone)]
pub struct Player {
    comm: Arc<dyn IdentitySource>,
}

impl Player {
    pub fn new(comm: impl IdentitySource) -> Self {
        Self {
            comm: Arc::new(comm),
        }
    }

    pub fn id(&self) -> &PlayerId {
        self.comm.id()
    }

    pub fn join_group(&self, group: &RoomId) -> Result<(), SessionError> {
        self.comm.join_group(group)
    }

    pub fn leave_group(&self, group: &RoomId) {
        self.comm.leave_group(group);
    }

    pub fn emit(&self, event: ServerEvent) -> Result<(), SessionError> {
        self.comm.emit(event)
    }

    pub fn broadcast_to(&self, group: &RoomId, event: ServerEvent) -> Result<(), SessionError> {
        self.comm.broadcast_to(group, event)
    }
}

impl fmt::Debug for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Player").field(self.id()).finish()
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.id(), f)
    }
}

impl PartialEq for Player {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Player {}
