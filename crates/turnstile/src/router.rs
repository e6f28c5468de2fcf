//! Turns decoded client requests into matchmaking calls and events.
//!
//! The router is synchronous and socket-free: it only sees [`Player`]
//! handles, so it can be driven directly from unit tests.

use std::sync::Arc;

use turnstile_lobby::{FormedRoom, Matchmaker};
use turnstile_protocol::{ClientRequest, GameId, MoveData, PeerEntry, ServerEvent};
use turnstile_session::Player;

pub(crate) const MISSING_GAME_ID: &str = "Must include GameID";
pub(crate) const INVALID_GAME_ID: &str = "Invalid GameID";
pub(crate) const NOT_IN_ROOM: &str = "Not in any room";
pub(crate) const NO_TURN: &str = "No turn assigned";

/// Dispatches requests from connected players.
///
/// Every failure is reported to the requesting player only, as a
/// `client-error` or `server-error` event, and never affects other players.
pub struct SessionRouter {
    matchmaker: Arc<Matchmaker>,
}

impl SessionRouter {
    pub fn new(matchmaker: Arc<Matchmaker>) -> Self {
        Self { matchmaker }
    }

    pub fn matchmaker(&self) -> &Matchmaker {
        &self.matchmaker
    }

    pub fn handle(&self, player: &Player, request: ClientRequest) {
        match request {
            ClientRequest::JoinGame { game_id } => self.join(player, &game_id),
            ClientRequest::MakeMove(data) => self.make_move(player, data),
            ClientRequest::GetPeers => self.peers(player),
        }
    }

    /// Queues `player` for `game_id` and forms a room if enough players
    /// are waiting.
    pub fn join(&self, player: &Player, game_id: &GameId) {
        if game_id.as_str().trim().is_empty() {
            reply(player, ServerEvent::client_error(MISSING_GAME_ID));
            return;
        }
        let Some(game) = self.matchmaker.registry().get(game_id) else {
            tracing::debug!(player_id = %player.id(), %game_id, "join for unknown game");
            reply(player, ServerEvent::client_error(INVALID_GAME_ID));
            return;
        };
        let title = game.title().to_owned();

        match self.matchmaker.queue_player(game_id, player.clone()) {
            Ok(true) => {}
            // Already waiting: the first join's confirmation stands.
            Ok(false) => return,
            Err(e) => {
                tracing::warn!(player_id = %player.id(), error = %e, "queueing failed");
                reply(player, ServerEvent::client_error(INVALID_GAME_ID));
                return;
            }
        }
        reply(
            player,
            ServerEvent::InQueue {
                message: format!("You are in the queue for game: {title}"),
            },
        );

        match self.matchmaker.try_form_groups(game_id) {
            Ok(Some(room)) => self.announce(&room),
            Ok(None) => {}
            Err(e) => tracing::warn!(%game_id, error = %e, "grouping failed"),
        }
    }

    /// Relays a move to the other members of the mover's room.
    ///
    /// `madeBy` always comes from the turn table, never from the client.
    pub fn make_move(&self, player: &Player, data: MoveData) {
        let Some(room_id) = self.matchmaker.lookup_room(player.id()) else {
            reply(player, ServerEvent::server_error(NOT_IN_ROOM));
            return;
        };
        let Some(turn) = self.matchmaker.lookup_turn(&room_id, player.id()) else {
            tracing::warn!(player_id = %player.id(), %room_id, "seated player has no turn");
            reply(player, ServerEvent::server_error(NO_TURN));
            return;
        };

        let event = ServerEvent::MoveMade {
            made_by: turn,
            made_by_id: player.id().clone(),
            data,
        };
        if let Err(e) = player.broadcast_to(&room_id, event) {
            tracing::debug!(player_id = %player.id(), %room_id, error = %e, "move relay failed");
        }
    }

    /// Replies with the roster of the caller's room.
    pub fn peers(&self, player: &Player) {
        let Some(room_id) = self.matchmaker.lookup_room(player.id()) else {
            reply(player, ServerEvent::server_error(NOT_IN_ROOM));
            return;
        };
        let players = self
            .matchmaker
            .roster(&room_id)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|id| {
                let turn_number = self.matchmaker.lookup_turn(&room_id, &id)?;
                Some(PeerEntry {
                    player_id: id,
                    turn_number,
                })
            })
            .collect();
        reply(
            player,
            ServerEvent::Peers {
                room_name: room_id,
                players,
            },
        );
    }

    /// Cleans up after a closed connection.
    ///
    /// The remaining members hear exactly one `player-left`, however many
    /// times this runs. `player` needs no open channel of its own.
    pub fn disconnect(&self, player: &Player) {
        let Some(departure) = self.matchmaker.remove_player_everywhere(player.id()) else {
            tracing::debug!(player_id = %player.id(), "disconnected while not seated");
            return;
        };
        tracing::info!(
            player_id = %player.id(),
            room_id = %departure.room,
            turn = departure.turn,
            "player left room"
        );
        let event = ServerEvent::PlayerLeft {
            player_id: player.id().clone(),
            turn_number: departure.turn,
        };
        if let Err(e) = player.broadcast_to(&departure.room, event) {
            tracing::debug!(player_id = %player.id(), error = %e, "player-left broadcast failed");
        }
    }

    /// Tells every member of a new room where it sits, then welcomes the room.
    ///
    /// Members pulled out of an earlier room leave its group first, and
    /// that room hears `player-left`. Members whose connection closed before
    /// they could join the group are unseated again once the rest are told.
    fn announce(&self, room: &FormedRoom) {
        for moved in &room.relocated {
            let Some(member) = room.members.iter().find(|m| *m.id() == moved.player) else {
                continue;
            };
            member.leave_group(&moved.from.room);
            tracing::info!(
                player_id = %moved.player,
                room_id = %moved.from.room,
                turn = moved.from.turn,
                "player left room for a new one"
            );
            let event = ServerEvent::PlayerLeft {
                player_id: moved.player.clone(),
                turn_number: moved.from.turn,
            };
            if let Err(e) = member.broadcast_to(&moved.from.room, event) {
                tracing::debug!(player_id = %moved.player, error = %e, "player-left broadcast failed");
            }
        }

        let mut seated = Vec::with_capacity(room.members.len());
        let mut unreachable = Vec::new();
        for (turn, member) in room.seats() {
            match member.join_group(&room.room_id) {
                Ok(()) => seated.push((turn, member)),
                Err(e) => {
                    tracing::warn!(player_id = %member.id(), room_id = %room.room_id, error = %e, "join group failed");
                    unreachable.push(member);
                }
            }
        }

        for (turn, member) in &seated {
            reply(
                member,
                ServerEvent::GroupAssignment {
                    room_name: room.room_id.clone(),
                    turn_number: *turn,
                },
            );
        }
        let welcome = ServerEvent::RoomMessage {
            message: format!("Welcome to {}", room.room_id),
        };
        for (_, member) in &seated {
            reply(member, welcome.clone());
        }

        for member in unreachable {
            self.disconnect(member);
        }
    }
}

fn reply(player: &Player, event: ServerEvent) {
    let kind = event.kind();
    if let Err(e) = player.emit(event) {
        tracing::debug!(player_id = %player.id(), %kind, error = %e, "event dropped");
    }
}
