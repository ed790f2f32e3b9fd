use std::time::Instant;

use log::{debug, warn};

use super::{BotPlayer, SearchStats};
use crate::clock::{Clock, Deadline};
use crate::config::SearchConfig;
use crate::enums::Move;
use crate::errors::{SearchError, SearchResult};
use crate::evaluation::Evaluator;
use crate::state::GameState;

/// Fixed-depth, full-width minimax player.
///
/// Runs a single search at `search_depth` each turn. If that search times out
/// the player falls back to the first legal move, since it holds no earlier
/// result.
pub struct MinimaxPlayer {
    config: SearchConfig,
    evaluator: Box<dyn Evaluator>,
    stats: SearchStats,
}

impl MinimaxPlayer {
    pub fn new(config: SearchConfig) -> Self {
        let evaluator = config.heuristic.build();
        Self::with_evaluator(config, evaluator)
    }

    pub fn with_evaluator(config: SearchConfig, evaluator: Box<dyn Evaluator>) -> Self {
        MinimaxPlayer {
            config,
            evaluator,
            stats: SearchStats::default(),
        }
    }

    /// Searches `depth` plies and returns the root score with the best move.
    ///
    /// The move is `None` only when the player to move is already stuck.
    pub fn minimax(
        &mut self,
        state: &GameState,
        depth: u32,
        deadline: &Deadline,
    ) -> SearchResult<(f64, Option<Move>)> {
        self.max_value(state, depth, deadline)
    }

    fn max_value(
        &mut self,
        state: &GameState,
        depth: u32,
        deadline: &Deadline,
    ) -> SearchResult<(f64, Option<Move>)> {
        deadline.check()?;
        self.stats.nodes += 1;

        let mover = state.active_player();
        if depth == 0 || state.is_loser(mover) {
            self.stats.leaf_evaluations += 1;
            return Ok((self.evaluator.score(state, mover), None));
        }

        let moves = non_empty_moves(state)?;
        let mut best_score = f64::NEG_INFINITY;
        let mut best_move = moves[0];
        for mv in moves {
            let (score, _) = self.min_value(&state.forecast_move(mv), depth - 1, deadline)?;
            if score > best_score {
                best_score = score;
                best_move = mv;
            }
        }
        Ok((best_score, Some(best_move)))
    }

    fn min_value(
        &mut self,
        state: &GameState,
        depth: u32,
        deadline: &Deadline,
    ) -> SearchResult<(f64, Option<Move>)> {
        deadline.check()?;
        self.stats.nodes += 1;

        // Scored from the opponent's side and negated
        let mover = state.active_player();
        if depth == 0 || state.is_loser(mover) {
            self.stats.leaf_evaluations += 1;
            return Ok((-self.evaluator.score(state, mover), None));
        }

        let moves = non_empty_moves(state)?;
        let mut best_score = f64::INFINITY;
        let mut best_move = moves[0];
        for mv in moves {
            let (score, _) = self.max_value(&state.forecast_move(mv), depth - 1, deadline)?;
            if score < best_score {
                best_score = score;
                best_move = mv;
            }
        }
        Ok((best_score, Some(best_move)))
    }
}

/// Legal moves of a position already known not to be lost.
pub(crate) fn non_empty_moves(state: &GameState) -> SearchResult<Vec<Move>> {
    let moves = state.legal_moves();
    if moves.is_empty() {
        return Err(SearchError::invariant(format!(
            "{} has no legal moves at ply {} but was not detected as the loser",
            state.active_player(),
            state.move_count()
        )));
    }
    Ok(moves)
}

impl Default for MinimaxPlayer {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}

impl BotPlayer for MinimaxPlayer {
    fn name(&self) -> &str {
        "minimax"
    }

    fn choose_move(
        &mut self,
        state: &GameState,
        clock: &dyn Clock,
    ) -> SearchResult<Option<Move>> {
        self.stats = SearchStats::default();
        let Some(&fallback) = state.legal_moves().first() else {
            return Ok(None);
        };

        let start = Instant::now();
        let depth = self.config.search_depth;
        let deadline = Deadline::new(clock, self.config.timer_threshold_ms);
        match self.minimax(state, depth, &deadline) {
            Ok((score, best)) => {
                self.stats.depth_completed = depth;
                debug!(
                    "minimax depth {} picked {:?} (score {}, {} nodes) in {:?}",
                    depth,
                    best,
                    score,
                    self.stats.nodes,
                    start.elapsed()
                );
                Ok(best.or(Some(fallback)))
            }
            Err(SearchError::Timeout { remaining_ms }) => {
                warn!(
                    "minimax timed out at depth {} with {:.1}ms left, playing {}",
                    depth, remaining_ms, fallback
                );
                Ok(Some(fallback))
            }
            Err(err) => Err(err),
        }
    }

    fn last_stats(&self) -> SearchStats {
        self.stats
    }
}
