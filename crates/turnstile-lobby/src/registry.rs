//! The set of games this server offers, loaded once at startup.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use turnstile_protocol::GameId;

use crate::{GameConfig, GroupBounds, Lobby, RegistryError};

/// A registered game and the lobby it owns.
pub struct Game {
    config: GameConfig,
    bounds: GroupBounds,
    lobby: Lobby,
    source: Option<PathBuf>,
}

impl Game {
    pub fn id(&self) -> &GameId {
        &self.config.unique_key
    }

    pub fn title(&self) -> &str {
        &self.config.display_title
    }

    pub fn bounds(&self) -> GroupBounds {
        self.bounds
    }

    pub fn lobby(&self) -> &Lobby {
        &self.lobby
    }

    /// File the definition was read from, if it came from disk.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    fn origin(&self) -> String {
        origin_label(self.source.as_deref(), &self.config.unique_key)
    }
}

/// Where a definition came from, for error messages: its file, or
/// `<key>` for games registered in code.
fn origin_label(source: Option<&Path>, key: &GameId) -> String {
    match source {
        Some(path) => path.display().to_string(),
        None => format!("<{key}>"),
    }
}

/// Immutable map from game key to [`Game`].
///
/// Built before the server starts serving and never mutated afterwards;
/// only the lobbies inside it change.
#[derive(Default)]
pub struct GameRegistry {
    games: HashMap<GameId, Game>,
}

impl GameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every `*.toml` file in `dir` as a game definition.
    ///
    /// Files are read in name order so errors are reproducible.
    ///
    /// # Errors
    /// Any unreadable file, malformed definition, or duplicate key aborts
    /// the whole load.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let dir = dir.as_ref();
        let io_err = |source| RegistryError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "toml") {
                files.push(path);
            }
        }
        files.sort();

        let mut registry = Self::new();
        for path in files {
            let raw = fs::read_to_string(&path).map_err(|source| RegistryError::Io {
                path: path.clone(),
                source,
            })?;
            let config: GameConfig = toml::from_str(&raw).map_err(|source| RegistryError::Parse {
                path: path.clone(),
                source,
            })?;
            registry.insert_from(config, Some(path))?;
        }
        Ok(registry)
    }

    /// Registers a game defined in code.
    ///
    /// # Errors
    /// Same validation as [`load_dir`](Self::load_dir).
    pub fn insert(&mut self, config: GameConfig) -> Result<(), RegistryError> {
        self.insert_from(config, None)
    }

    fn insert_from(&mut self, config: GameConfig, source: Option<PathBuf>) -> Result<(), RegistryError> {
        let origin = origin_label(source.as_deref(), &config.unique_key);

        let bounds = config
            .bounds()
            .map_err(|reason| RegistryError::InvalidGame {
                origin: origin.clone(),
                reason,
            })?;

        if let Some(existing) = self.games.get(&config.unique_key) {
            return Err(RegistryError::DuplicateGame {
                key: config.unique_key.clone(),
                first: existing.origin(),
                second: origin,
            });
        }

        tracing::info!(
            game_id = %config.unique_key,
            title = %config.display_title,
            min = bounds.min,
            max = bounds.max,
            from = %origin,
            "loaded game"
        );
        self.games.insert(
            config.unique_key.clone(),
            Game {
                config,
                bounds,
                lobby: Lobby::new(),
                source,
            },
        );
        Ok(())
    }

    pub fn get(&self, id: &GameId) -> Option<&Game> {
        self.games.get(id)
    }

    pub fn games(&self) -> impl Iterator<Item = &Game> {
        self.games.values()
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}
