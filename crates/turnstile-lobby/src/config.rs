//! Game definitions and the group-size bounds derived from them.

use serde::{Deserialize, Serialize};
use turnstile_protocol::GameId;

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// One game as written in its definition file.
///
/// ```toml
/// uniqueKey = "5f0c8f9e-tic-tac-toe"
/// displayTitle = "Tic Tac Toe"
/// minPlayers = 2
/// maxPlayers = 2   # optional, 0 or absent means "same as minPlayers"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    pub unique_key: GameId,
    pub display_title: String,
    #[serde(default)]
    pub min_players: usize,
    #[serde(default)]
    pub max_players: usize,
}

impl GameConfig {
    pub fn new(key: impl Into<GameId>, title: impl Into<String>, min: usize, max: usize) -> Self {
        Self {
            unique_key: key.into(),
            display_title: title.into(),
            min_players: min,
            max_players: max,
        }
    }

    /// Validates the definition and resolves its group-size bounds.
    ///
    /// # Errors
    /// A human readable reason when the key is empty, `minPlayers` is
    /// missing or zero, or `maxPlayers` is below `minPlayers`.
    pub fn bounds(&self) -> Result<GroupBounds, String> {
        if self.unique_key.as_str().trim().is_empty() {
            return Err("uniqueKey must not be empty".into());
        }
        if self.min_players == 0 {
            return Err("minPlayers must be at least 1".into());
        }
        let max = if self.max_players == 0 {
            self.min_players
        } else {
            self.max_players
        };
        if max < self.min_players {
            return Err(format!(
                "maxPlayers ({max}) is below minPlayers ({})",
                self.min_players
            ));
        }
        Ok(GroupBounds {
            min: self.min_players,
            max,
        })
    }
}

// ---------------------------------------------------------------------------
// GroupBounds
// ---------------------------------------------------------------------------

/// Resolved room size range. Always `1 <= min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupBounds {
    pub min: usize,
    pub max: usize,
}

impl GroupBounds {
    /// Picks the size of the room to form when `queued` players wait.
    ///
    /// Candidates run from `max` down to `min`, but every candidate is
    /// gated on `queued >= max`. The effect is that a room is only ever
    /// formed at full `max` size; with fewer than `max` players waiting
    /// nothing happens even if `min` of them are there.
    pub fn group_size(self, queued: usize) -> Option<usize> {
        (self.min..=self.max).rev().find(|_| queued >= self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_default_max_to_min() {
        let bounds = GameConfig::new("g", "G", 3, 0).bounds().unwrap();
        assert_eq!(bounds, GroupBounds { min: 3, max: 3 });
    }

    #[test]
    fn test_bounds_keep_explicit_range() {
        let bounds = GameConfig::new("g", "G", 2, 4).bounds().unwrap();
        assert_eq!(bounds, GroupBounds { min: 2, max: 4 });
    }

    #[test]
    fn test_bounds_reject_zero_min() {
        let err = GameConfig::new("g", "G", 0, 4).bounds().unwrap_err();
        assert!(err.contains("minPlayers"));
    }

    #[test]
    fn test_bounds_reject_max_below_min() {
        let err = GameConfig::new("g", "G", 4, 2).bounds().unwrap_err();
        assert!(err.contains("maxPlayers"));
    }

    #[test]
    fn test_bounds_reject_blank_key() {
        assert!(GameConfig::new("  ", "G", 2, 2).bounds().is_err());
    }

    #[test]
    fn test_group_size_only_forms_full_rooms() {
        let bounds = GroupBounds { min: 2, max: 4 };
        assert_eq!(bounds.group_size(0), None);
        assert_eq!(bounds.group_size(1), None);
        // min players are waiting, but the gate is on max.
        assert_eq!(bounds.group_size(2), None);
        assert_eq!(bounds.group_size(3), None);
        assert_eq!(bounds.group_size(4), Some(4));
        assert_eq!(bounds.group_size(9), Some(4));
    }

    #[test]
    fn test_group_size_fixed_bounds() {
        let bounds = GroupBounds { min: 2, max: 2 };
        assert_eq!(bounds.group_size(1), None);
        assert_eq!(bounds.group_size(2), Some(2));
    }

    #[test]
    fn test_config_parses_from_toml() {
        let config: GameConfig = toml::from_str(
            r#"
            uniqueKey = "abc"
            displayTitle = "Connect Four"
            minPlayers = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.unique_key, GameId::from("abc"));
        assert_eq!(config.display_title, "Connect Four");
        assert_eq!(config.max_players, 0);
        assert_eq!(config.bounds().unwrap().max, 2);
    }
}
