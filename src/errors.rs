use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::enums::{Move, Player};

/// Top-level error type for the Isolation engine
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IsolationError {
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("Game error: {0}")]
    Game(#[from] GameError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Faults raised inside a search strategy
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SearchError {
    /// The deadline was crossed. Recoverable by the strategy driver only.
    #[error("Search timed out with {remaining_ms:.1}ms left")]
    Timeout { remaining_ms: f64 },

    #[error("Search invariant violated: {details}")]
    InvariantViolation { details: String },
}

/// Rule violations on checked board transitions
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameError {
    #[error("Illegal move {mv} for {player}")]
    IllegalMove { player: Player, mv: Move },

    #[error("Game is over: {player} has no legal moves")]
    GameOver { player: Player },

    #[error("Invalid board dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
}

/// Configuration loading and validation errors
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConfigError {
    #[error("Cannot read configuration {path}: {details}")]
    Io { path: String, details: String },

    #[error("Cannot parse configuration: {details}")]
    Parse { details: String },

    #[error("Invalid configuration value for {field}: {details}")]
    Invalid { field: String, details: String },
}

/// Result type aliases for convenience
pub type IsolationResult<T> = Result<T, IsolationError>;
pub type SearchResult<T> = Result<T, SearchError>;
pub type GameResult<T> = Result<T, GameError>;
pub type ConfigResult<T> = Result<T, ConfigError>;

impl SearchError {
    pub fn invariant(details: impl Into<String>) -> Self {
        Self::InvariantViolation {
            details: details.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            details: details.into(),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse {
            details: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_recognized() {
        let err = SearchError::Timeout { remaining_ms: 3.0 };
        assert!(err.is_timeout());
        assert!(!SearchError::invariant("no child").is_timeout());
    }

    #[test]
    fn test_conversion_into_top_level_error() {
        let err: IsolationError = SearchError::invariant("frontier corrupted").into();
        assert_eq!(
            err.to_string(),
            "Search error: Search invariant violated: frontier corrupted"
        );

        let err: IsolationError = GameError::IllegalMove {
            player: Player::Two,
            mv: Move::new(1, 2),
        }
        .into();
        assert_eq!(err.to_string(), "Game error: Illegal move (1, 2) for player two");
    }

    #[test]
    fn test_json_error_becomes_parse_error() {
        let json_err = serde_json::from_str::<u32>("not a number").unwrap_err();
        let err = ConfigError::from(json_err);
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
