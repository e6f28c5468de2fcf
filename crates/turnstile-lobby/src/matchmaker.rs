//! Queue admission, room formation, and disconnect cleanup.

use std::sync::Arc;

use turnstile_protocol::{GameId, PlayerId, RoomId};
use turnstile_session::Player;

use crate::{Departure, Game, GameRegistry, MatchError, MembershipTables, Relocation, RoomNamer, WordNamer};

/// Attempts at finding a room name not already in use.
const NAME_ATTEMPTS: usize = 16;

/// A room produced by one grouping attempt.
///
/// `members[i]` holds turn `i`. `relocated` lists members that were
/// still seated elsewhere and have just been pulled out of that room.
#[derive(Debug, Clone)]
pub struct FormedRoom {
    pub room_id: RoomId,
    pub members: Vec<Player>,
    pub relocated: Vec<Relocation>,
}

impl FormedRoom {
    /// Members paired with their turn index.
    pub fn seats(&self) -> impl Iterator<Item = (usize, &Player)> {
        self.members.iter().enumerate()
    }
}

/// Coordinates the game lobbies and the shared membership tables.
///
/// Holds no lock of its own. Every call touches one lobby lock, then one
/// membership table lock at a time, never both at once.
pub struct Matchmaker {
    registry: Arc<GameRegistry>,
    membership: Arc<MembershipTables>,
    namer: Box<dyn RoomNamer>,
}

impl Matchmaker {
    pub fn new(registry: Arc<GameRegistry>, membership: Arc<MembershipTables>) -> Self {
        Self::with_namer(registry, membership, WordNamer::default())
    }

    pub fn with_namer(
        registry: Arc<GameRegistry>,
        membership: Arc<MembershipTables>,
        namer: impl RoomNamer,
    ) -> Self {
        Self {
            registry,
            membership,
            namer: Box::new(namer),
        }
    }

    pub fn registry(&self) -> &GameRegistry {
        &self.registry
    }

    pub fn membership(&self) -> &MembershipTables {
        &self.membership
    }

    fn game(&self, game_id: &GameId) -> Result<&Game, MatchError> {
        self.registry
            .get(game_id)
            .ok_or_else(|| MatchError::UnknownGame(game_id.clone()))
    }

    /// Queues `player` for `game_id` unless it is already waiting there.
    ///
    /// Returns `Ok(false)` for a repeat join; that is not an error.
    ///
    /// # Errors
    /// [`MatchError::UnknownGame`] if the game is not registered.
    pub fn queue_player(&self, game_id: &GameId, player: Player) -> Result<bool, MatchError> {
        let game = self.game(game_id)?;
        let player_id = player.id().clone();
        let joined = game.lobby().enqueue(player);
        if joined {
            tracing::info!(
                %player_id,
                game_id = %game_id,
                queued = game.lobby().size(),
                "player queued"
            );
        } else {
            tracing::debug!(%player_id, game_id = %game_id, "already queued");
        }
        Ok(joined)
    }

    /// Tries to turn waiting players of `game_id` into one room.
    ///
    /// On success the members are gone from the lobby and bound to the new
    /// room with turns `0..n` in queue order. `Ok(None)` leaves the lobby
    /// untouched.
    ///
    /// # Errors
    /// [`MatchError::UnknownGame`] if the game is not registered.
    pub fn try_form_groups(&self, game_id: &GameId) -> Result<Option<FormedRoom>, MatchError> {
        let game = self.game(game_id)?;
        let bounds = game.bounds();

        // The lobby lock is released before any membership table is touched.
        let Some(members) = game.lobby().take_group(|queued| bounds.group_size(queued)) else {
            return Ok(None);
        };

        let room_id = self.fresh_room_name();
        let ids: Vec<PlayerId> = members.iter().map(|p| p.id().clone()).collect();
        let relocated = self.membership.seat(&room_id, &ids);

        tracing::info!(
            game_id = %game_id,
            %room_id,
            members = ?ids,
            "room formed"
        );
        Ok(Some(FormedRoom {
            room_id,
            members,
            relocated,
        }))
    }

    fn fresh_room_name(&self) -> RoomId {
        let mut name = self.namer.generate();
        for _ in 1..NAME_ATTEMPTS {
            if !self.membership.room_exists(&name) {
                return name;
            }
            name = self.namer.generate();
        }
        tracing::warn!(room_id = %name, "could not find an unused room name");
        name
    }

    /// Drops every trace of `player_id`: its place in any lobby and its
    /// room and turn bindings.
    ///
    /// Returns where it was seated so the caller can notify the room.
    /// Calling it again is a no-op returning `None`.
    pub fn remove_player_everywhere(&self, player_id: &PlayerId) -> Option<Departure> {
        for game in self.registry.games() {
            if game.lobby().remove(player_id) {
                tracing::debug!(%player_id, game_id = %game.id(), "removed from lobby");
            }
        }
        self.membership.unseat(player_id)
    }

    pub fn lookup_room(&self, player_id: &PlayerId) -> Option<RoomId> {
        self.membership.room_of(player_id)
    }

    pub fn lookup_turn(&self, room_id: &RoomId, player_id: &PlayerId) -> Option<usize> {
        self.membership.turn_of(room_id, player_id)
    }

    /// Members of `room_id` in turn order.
    pub fn roster(&self, room_id: &RoomId) -> Option<Vec<PlayerId>> {
        self.membership.roster(room_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use turnstile_protocol::ServerEvent;
    use turnstile_session::{IdentitySource, SessionError};

    use crate::GameConfig;

    struct Stub(PlayerId);

    impl IdentitySource for Stub {
        fn id(&self) -> &PlayerId {
            &self.0
        }
        fn join_group(&self, _: &RoomId) -> Result<(), SessionError> {
            Ok(())
        }
        fn leave_group(&self, _: &RoomId) {}
        fn emit(&self, _: ServerEvent) -> Result<(), SessionError> {
            Ok(())
        }
        fn broadcast_to(&self, _: &RoomId, _: ServerEvent) -> Result<(), SessionError> {
            Ok(())
        }
    }

    /// Hands out the same name a few times before moving on.
    struct Stuttering {
        calls: AtomicUsize,
    }

    impl RoomNamer for Stuttering {
        fn generate(&self) -> RoomId {
            let n = self.calls.fetch_add(1, Ordering::Relaxed);
            RoomId(format!("room-{}", n / 3))
        }
    }

    fn player(id: &str) -> Player {
        Player::new(Stub(PlayerId::from(id)))
    }

    #[test]
    fn test_fresh_room_name_skips_names_in_use() {
        let mut registry = GameRegistry::new();
        registry.insert(GameConfig::new("g", "G", 1, 1)).unwrap();
        let mm = Matchmaker::with_namer(
            Arc::new(registry),
            Arc::new(MembershipTables::new()),
            Stuttering {
                calls: AtomicUsize::new(0),
            },
        );
        let g = GameId::from("g");

        mm.queue_player(&g, player("a")).unwrap();
        let first = mm.try_form_groups(&g).unwrap().unwrap();
        mm.queue_player(&g, player("b")).unwrap();
        let second = mm.try_form_groups(&g).unwrap().unwrap();

        assert_eq!(first.room_id, RoomId::from("room-0"));
        assert_eq!(second.room_id, RoomId::from("room-1"));
    }

    #[test]
    fn test_requeued_member_is_reported_as_relocated() {
        let mut registry = GameRegistry::new();
        registry.insert(GameConfig::new("g", "G", 2, 2)).unwrap();
        let mm = Matchmaker::new(Arc::new(registry), Arc::new(MembershipTables::new()));
        let g = GameId::from("g");

        mm.queue_player(&g, player("a")).unwrap();
        mm.queue_player(&g, player("b")).unwrap();
        let first = mm.try_form_groups(&g).unwrap().unwrap();
        assert!(first.relocated.is_empty());

        mm.queue_player(&g, player("a")).unwrap();
        mm.queue_player(&g, player("c")).unwrap();
        let second = mm.try_form_groups(&g).unwrap().unwrap();

        assert_eq!(second.relocated.len(), 1);
        assert_eq!(second.relocated[0].player, PlayerId::from("a"));
        assert_eq!(second.relocated[0].from, Departure { room: first.room_id.clone(), turn: 0 });
        assert_eq!(mm.roster(&first.room_id), Some(vec![PlayerId::from("b")]));
    }

    #[test]
    fn test_unknown_game_is_reported() {
        let mm = Matchmaker::new(Arc::new(GameRegistry::new()), Arc::new(MembershipTables::new()));
        let missing = GameId::from("missing");
        assert!(matches!(
            mm.queue_player(&missing, player("a")),
            Err(MatchError::UnknownGame(ref g)) if *g == missing
        ));
        assert!(mm.try_form_groups(&missing).is_err());
    }

    #[test]
    fn test_formed_room_seats_follow_member_order() {
        let room = FormedRoom {
            room_id: RoomId::from("r"),
            members: vec![player("a"), player("b")],
            relocated: Vec::new(),
        };
        let seats: Vec<(usize, &str)> = room.seats().map(|(t, p)| (t, p.id().as_str())).collect();
        assert_eq!(seats, vec![(0, "a"), (1, "b")]);
    }
}
