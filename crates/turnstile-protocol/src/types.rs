//! Protocol types: everything that is serialized onto the socket.

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Opaque identity of a connected player.
///
/// Serialized as a bare string (`"conn-7"`), stable for the lifetime of the
/// connection it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

/// Name of a formed room, doubling as its broadcast group name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

/// Unique key of a registered game (the `uniqueKey` of its definition file).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub String);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(PlayerId);
string_id!(RoomId);
string_id!(GameId);

/// Free-form move object relayed verbatim between room members.
pub type MoveData = serde_json::Map<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// Requests a client may send.
///
/// Adjacently tagged: `{ "kind": "join-game", "data": { "gameId": "..." } }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "kebab-case")]
pub enum ClientRequest {
    /// Queue for a registered game. A missing `gameId`, or no `data` at
    /// all, decodes as empty and is rejected by the server, not the codec.
    #[serde(rename_all = "camelCase")]
    JoinGame { game_id: GameId },

    /// A move, relayed to the other members of the sender's room.
    MakeMove(MoveData),

    /// Ask who else is in the sender's room.
    GetPeers,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
enum RequestKind {
    JoinGame,
    MakeMove,
    GetPeers,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinData {
    #[serde(default)]
    game_id: GameId,
}

/// A request as it arrives, before `data` is read for its kind.
#[derive(Deserialize)]
struct WireRequest {
    kind: RequestKind,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

impl<'de> Deserialize<'de> for ClientRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let WireRequest { kind, data } = WireRequest::deserialize(deserializer)?;
        match kind {
            RequestKind::JoinGame => {
                let join = match data {
                    Some(value) => JoinData::deserialize(value).map_err(de::Error::custom)?,
                    None => JoinData::default(),
                };
                Ok(Self::JoinGame {
                    game_id: join.game_id,
                })
            }
            RequestKind::MakeMove => {
                let value = data.ok_or_else(|| de::Error::missing_field("data"))?;
                let moved = MoveData::deserialize(value).map_err(de::Error::custom)?;
                Ok(Self::MakeMove(moved))
            }
            RequestKind::GetPeers => Ok(Self::GetPeers),
        }
    }
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Wire name of a [`ServerEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    InQueue,
    GroupAssignment,
    RoomMessage,
    MoveMade,
    PlayerLeft,
    Peers,
    ClientError,
    ServerError,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InQueue => "in-queue",
            Self::GroupAssignment => "group-assignment",
            Self::RoomMessage => "room-message",
            Self::MoveMade => "move-made",
            Self::PlayerLeft => "player-left",
            Self::Peers => "peers",
            Self::ClientError => "client-error",
            Self::ServerError => "server-error",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One member of a room as reported by [`ServerEvent::Peers`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerEntry {
    pub player_id: PlayerId,
    pub turn_number: usize,
}

/// Notifications the server sends.
///
/// Field names are camelCase on the wire to match browser clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// The join was accepted and the player is waiting in the lobby.
    InQueue { message: String },

    /// The player was placed in a room with the given turn.
    #[serde(rename_all = "camelCase")]
    GroupAssignment { room_name: RoomId, turn_number: usize },

    /// Informational broadcast to a whole room.
    RoomMessage { message: String },

    /// Another member of the room moved. `made_by` is the mover's turn,
    /// assigned by the server.
    #[serde(rename_all = "camelCase")]
    MoveMade {
        made_by: usize,
        made_by_id: PlayerId,
        #[serde(rename = "move")]
        data: MoveData,
    },

    /// A room member disconnected.
    #[serde(rename_all = "camelCase")]
    PlayerLeft { player_id: PlayerId, turn_number: usize },

    /// Roster of the requester's room, in turn order.
    #[serde(rename_all = "camelCase")]
    Peers { room_name: RoomId, players: Vec<PeerEntry> },

    /// The request was malformed or referred to something unknown.
    ClientError { error: String },

    /// Server-side state needed to serve the request was missing.
    ServerError { error: String },
}

impl ServerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::InQueue { .. } => EventKind::InQueue,
            Self::GroupAssignment { .. } => EventKind::GroupAssignment,
            Self::RoomMessage { .. } => EventKind::RoomMessage,
            Self::MoveMade { .. } => EventKind::MoveMade,
            Self::PlayerLeft { .. } => EventKind::PlayerLeft,
            Self::Peers { .. } => EventKind::Peers,
            Self::ClientError { .. } => EventKind::ClientError,
            Self::ServerError { .. } => EventKind::ServerError,
        }
    }

    pub fn client_error(error: impl Into<String>) -> Self {
        Self::ClientError { error: error.into() }
    }

    pub fn server_error(error: impl Into<String>) -> Self {
        Self::ServerError { error: error.into() }
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Content of an [`Envelope`]: a client request or a server event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Payload {
    Request(ClientRequest),
    Event(ServerEvent),
}

/// Top-level frame in both directions.
///
/// ```text
/// { "seq": 4, "timestamp": 15000,
///   "payload": { "type": "Event",
///                "data": { "kind": "in-queue", "data": { ... } } } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Per-connection counter, starting at 1 for server frames.
    pub seq: u64,

    /// Milliseconds since the server started. Never decreases for a given
    /// recipient.
    pub timestamp: u64,

    pub payload: Payload,
}

impl Envelope {
    pub fn event(seq: u64, timestamp: u64, event: ServerEvent) -> Self {
        Self {
            seq,
            timestamp,
            payload: Payload::Event(event),
        }
    }

    pub fn request(seq: u64, request: ClientRequest) -> Self {
        Self {
            seq,
            timestamp: 0,
            payload: Payload::Request(request),
        }
    }

    /// Extracts the client request carried by this envelope.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidMessage`](crate::ProtocolError::InvalidMessage)
    /// when the envelope holds a server event instead.
    pub fn into_request(self) -> Result<ClientRequest, crate::ProtocolError> {
        match self.payload {
            Payload::Request(request) => Ok(request),
            Payload::Event(event) => Err(crate::ProtocolError::InvalidMessage(
                format!("clients may not send {}", event.kind()),
            )),
        }
    }
}
