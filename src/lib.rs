// Isolation Engine Library - Core Module Organization
//
// Board model, evaluators and the three adversarial search strategies
// (fixed-depth minimax, iterative-deepening alpha-beta, UCT tree search),
// plus a single-game driver used by the simulate binary.

// Core game data structures and enums
pub mod enums;
pub mod state;

// Search support
pub mod clock;
pub mod config;
pub mod errors;
pub mod evaluation;

// Strategies and the game loop
pub mod game;
pub mod players;

// Re-export common types for convenient access
pub use crate::clock::{Clock, Deadline, TurnClock};
pub use crate::config::{MctsConfig, SearchConfig};
pub use crate::enums::{CellState, Move, Player};
pub use crate::errors::{
    ConfigError, GameError, IsolationError, IsolationResult, SearchError, SearchResult,
};
pub use crate::evaluation::{Evaluator, Heuristic};
pub use crate::game::{play_game, EndReason, GameOutcome};
pub use crate::players::{BotPlayer, PlayerKind, SearchStats};
pub use crate::state::GameState;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
