//! Shared tables binding players to their room and turn.
//!
//! Three independent maps, each behind its own mutex so a room lookup never
//! waits on a turn lookup:
//!
//! - player → room
//! - (room, player) → turn index
//! - room → members in turn order
//!
//! No method holds more than one of these locks at a time.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use turnstile_protocol::{PlayerId, RoomId};

/// Key of the turn table: a player's seat within one room.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TurnKey {
    pub room: RoomId,
    pub player: PlayerId,
}

impl TurnKey {
    pub fn new(room: &RoomId, player: &PlayerId) -> Self {
        Self {
            room: room.clone(),
            player: player.clone(),
        }
    }
}

impl fmt::Display for TurnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.room, self.player)
    }
}

/// Where a disconnecting player was seated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub room: RoomId,
    pub turn: usize,
}

/// A player pulled out of an earlier room while being seated in a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    pub player: PlayerId,
    pub from: Departure,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-wide membership store, shared by every game.
#[derive(Default)]
pub struct MembershipTables {
    rooms: Mutex<HashMap<PlayerId, RoomId>>,
    turns: Mutex<HashMap<TurnKey, usize>>,
    rosters: Mutex<HashMap<RoomId, Vec<PlayerId>>>,
}

impl MembershipTables {
    pub fn new() -> Self {
        Self::default()
    }

    // -- player → room --------------------------------------------------

    pub fn set_room(&self, player: &PlayerId, room: &RoomId) {
        lock(&self.rooms).insert(player.clone(), room.clone());
    }

    pub fn room_of(&self, player: &PlayerId) -> Option<RoomId> {
        lock(&self.rooms).get(player).cloned()
    }

    pub fn delete_room(&self, player: &PlayerId) -> Option<RoomId> {
        lock(&self.rooms).remove(player)
    }

    // -- (room, player) → turn ------------------------------------------

    pub fn set_turn(&self, key: TurnKey, turn: usize) {
        lock(&self.turns).insert(key, turn);
    }

    pub fn turn_of(&self, room: &RoomId, player: &PlayerId) -> Option<usize> {
        lock(&self.turns).get(&TurnKey::new(room, player)).copied()
    }

    pub fn delete_turn(&self, room: &RoomId, player: &PlayerId) -> Option<usize> {
        lock(&self.turns).remove(&TurnKey::new(room, player))
    }

    // -- room → roster --------------------------------------------------

    /// Members of `room` in turn order, or `None` once the room is empty.
    pub fn roster(&self, room: &RoomId) -> Option<Vec<PlayerId>> {
        lock(&self.rosters).get(room).cloned()
    }

    pub fn room_exists(&self, room: &RoomId) -> bool {
        lock(&self.rosters).contains_key(room)
    }

    pub fn room_count(&self) -> usize {
        lock(&self.rosters).len()
    }

    pub fn seated_count(&self) -> usize {
        lock(&self.rooms).len()
    }

    fn drop_from_roster(&self, room: &RoomId, player: &PlayerId) {
        let mut rosters = lock(&self.rosters);
        if let Some(members) = rosters.get_mut(room) {
            members.retain(|id| id != player);
            if members.is_empty() {
                rosters.remove(room);
                tracing::debug!(room_id = %room, "last member left, room dropped");
            }
        }
    }

    // -- compound operations --------------------------------------------

    /// Records a freshly formed room. `members[i]` gets turn `i`.
    ///
    /// A member still bound to an earlier room is unbound from it first,
    /// so each player keeps at most one room and one turn. Those earlier
    /// seats are returned so the old room can be told the player left.
    pub fn seat(&self, room: &RoomId, members: &[PlayerId]) -> Vec<Relocation> {
        let mut relocated = Vec::new();
        for player in members {
            if let Some(previous) = self.unseat(player) {
                tracing::debug!(
                    player_id = %player,
                    room_id = %previous.room,
                    "player moved to a new room"
                );
                relocated.push(Relocation {
                    player: player.clone(),
                    from: previous,
                });
            }
        }

        lock(&self.rosters).insert(room.clone(), members.to_vec());
        for (turn, player) in members.iter().enumerate() {
            self.set_room(player, room);
            self.set_turn(TurnKey::new(room, player), turn);
        }
        relocated
    }

    /// Clears every binding of `player`.
    ///
    /// Returns the room and turn it held, or `None` if it was not seated.
    /// Calling it again for the same player returns `None`.
    pub fn unseat(&self, player: &PlayerId) -> Option<Departure> {
        let room = self.delete_room(player)?;
        let turn = self.delete_turn(&room, player);
        self.drop_from_roster(&room, player);

        match turn {
            Some(turn) => Some(Departure { room, turn }),
            None => {
                tracing::warn!(player_id = %player, room_id = %room, "room binding had no turn");
                None
            }
        }
    }
}
