//! Error types for the matchmaking layer.

use std::path::PathBuf;

use turnstile_protocol::GameId;

/// Errors from matchmaking operations.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// No game with this key is registered.
    #[error("unknown game {0}")]
    UnknownGame(GameId),
}

/// Errors while building the [`GameRegistry`](crate::GameRegistry).
///
/// All of these are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The games directory or a definition file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A definition file is not valid TOML or has the wrong shape.
    #[error("invalid configuration in file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A definition is missing its key or has unusable player bounds.
    #[error("invalid game {origin}: {reason}")]
    InvalidGame { origin: String, reason: String },

    /// Two definitions share a `uniqueKey`.
    #[error("uniqueKey {key} conflict between {first} and {second}")]
    DuplicateGame {
        key: GameId,
        first: String,
        second: String,
    },
}
