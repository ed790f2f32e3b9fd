// Players module - Contains all search strategies and light policies
//
// Every strategy implements BotPlayer and is built from its own SearchConfig.

use rand::SeedableRng;
use rand_xorshift::XorShiftRng;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::config::SearchConfig;
use crate::enums::Move;
use crate::errors::SearchResult;
use crate::state::GameState;

pub mod alphabeta;
pub mod greedy;
pub mod mcts;
pub mod minimax;
pub mod random;

pub use self::alphabeta::{AlphaBetaPlayer, MoveOrdering};
pub use self::greedy::GreedyPlayer;
pub use self::mcts::{MonteCarloPlayer, PlayoutPolicy};
pub use self::minimax::MinimaxPlayer;
pub use self::random::RandomPlayer;

/// Work counters for the most recent `choose_move`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Search nodes entered (tree searches) or created (MCTS).
    pub nodes: u64,
    /// Evaluator calls at the horizon or at terminal positions.
    pub leaf_evaluations: u64,
    /// Deepest fully completed depth.
    pub depth_completed: u32,
    /// Completed MCTS select/expand/simulate/backpropagate cycles.
    pub iterations: u64,
}

pub trait BotPlayer {
    fn name(&self) -> &str;

    /// Picks a move for the player to move in `state`.
    ///
    /// `Ok(None)` means the position has no legal move. Timeouts are handled
    /// inside the strategy and never returned.
    fn choose_move(
        &mut self,
        state: &GameState,
        clock: &dyn Clock,
    ) -> SearchResult<Option<Move>>;

    fn last_stats(&self) -> SearchStats {
        SearchStats::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PlayerKind {
    Minimax,
    Alphabeta,
    Mcts,
    Greedy,
    Random,
}

impl PlayerKind {
    pub fn build(self, config: &SearchConfig) -> Box<dyn BotPlayer> {
        match self {
            PlayerKind::Minimax => Box::new(MinimaxPlayer::new(config.clone())),
            PlayerKind::Alphabeta => Box::new(AlphaBetaPlayer::new(config.clone())),
            PlayerKind::Mcts => Box::new(MonteCarloPlayer::new(config.clone())),
            PlayerKind::Greedy => Box::new(GreedyPlayer::new(config.clone())),
            PlayerKind::Random => Box::new(RandomPlayer::new(config.seed)),
        }
    }
}

pub(crate) fn seeded_rng(seed: Option<u64>) -> XorShiftRng {
    match seed {
        Some(seed) => XorShiftRng::seed_from_u64(seed),
        None => XorShiftRng::from_entropy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TurnClock;
    use std::time::Duration;

    #[test]
    fn test_every_kind_builds_a_player() {
        let config = SearchConfig::default().with_seed(3);
        let state = GameState::default()
            .forecast_move(Move::new(4, 4))
            .forecast_move(Move::new(0, 2));
        for kind in [
            PlayerKind::Minimax,
            PlayerKind::Alphabeta,
            PlayerKind::Mcts,
            PlayerKind::Greedy,
            PlayerKind::Random,
        ] {
            let mut player = kind.build(&config);
            let clock = TurnClock::start(Duration::from_millis(150));
            let mv = player.choose_move(&state, &clock).unwrap().unwrap();
            assert!(state.is_legal_move(mv), "{} chose {}", player.name(), mv);
        }
    }

    #[test]
    fn test_player_kind_names() {
        let kind: PlayerKind = serde_json::from_str("\"alphabeta\"").unwrap();
        assert_eq!(kind, PlayerKind::Alphabeta);
        assert_eq!(serde_json::to_string(&PlayerKind::Mcts).unwrap(), "\"mcts\"");
    }
}
