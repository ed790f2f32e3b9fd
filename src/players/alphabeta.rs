use std::cmp::Ordering;
use std::time::Instant;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::minimax::non_empty_moves;
use super::{BotPlayer, SearchStats};
use crate::clock::{Clock, Deadline};
use crate::config::SearchConfig;
use crate::enums::Move;
use crate::errors::SearchResult;
use crate::evaluation::Evaluator;
use crate::state::GameState;

/// How moves are ordered at each node before the principal variation move is
/// promoted to the front.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveOrdering {
    /// Knight-offset table order.
    #[default]
    Generation,
    /// Descending score of the successor for the player to move.
    OnePly,
}

/// Iterative-deepening alpha-beta player.
///
/// Each completed depth hands its principal variation to the next one as a
/// move-ordering hint. When the deadline fires the move from the deepest
/// completed depth is played. If not even depth one completes, `choose_move`
/// answers `None` and the game driver scores that as a forfeit. There is no
/// first-legal-move fallback here, unlike `MinimaxPlayer`.
pub struct AlphaBetaPlayer {
    config: SearchConfig,
    evaluator: Box<dyn Evaluator>,
    stats: SearchStats,
}

impl AlphaBetaPlayer {
    pub fn new(config: SearchConfig) -> Self {
        let evaluator = config.heuristic.build();
        Self::with_evaluator(config, evaluator)
    }

    pub fn with_evaluator(config: SearchConfig, evaluator: Box<dyn Evaluator>) -> Self {
        AlphaBetaPlayer {
            config,
            evaluator,
            stats: SearchStats::default(),
        }
    }

    /// Fail-hard alpha-beta search to `depth` plies.
    ///
    /// Returns the root score and the best line found, starting with the move
    /// to play. `preferred` is a previous principal variation; its head is
    /// tried first wherever it is legal, and its tail is handed down one ply.
    pub fn alphabeta(
        &mut self,
        state: &GameState,
        depth: u32,
        preferred: &[Move],
        alpha: f64,
        beta: f64,
        deadline: &Deadline,
    ) -> SearchResult<(f64, Vec<Move>)> {
        deadline.check()?;
        self.max_value(state, depth, preferred, alpha, beta, deadline)
    }

    /// Searches depth 1, 2, ... until the deadline fires or every blank cell
    /// has been accounted for. Returns the principal variation of the deepest
    /// completed depth, empty when none completed.
    pub fn iterative_deepening(
        &mut self,
        state: &GameState,
        deadline: &Deadline,
    ) -> SearchResult<Vec<Move>> {
        let max_depth = state.blank_spaces().len() as u32;
        let mut best_path: Vec<Move> = Vec::new();

        for depth in 1..=max_depth {
            let start = Instant::now();
            match self.alphabeta(
                state,
                depth,
                &best_path,
                f64::NEG_INFINITY,
                f64::INFINITY,
                deadline,
            ) {
                Ok((score, path)) => {
                    debug!(
                        "depth {} done in {:?}: score {}, pv {:?}",
                        depth,
                        start.elapsed(),
                        score,
                        path
                    );
                    self.stats.depth_completed = depth;
                    if path.is_empty() {
                        break;
                    }
                    best_path = path;
                }
                Err(err) if err.is_timeout() => {
                    debug!("depth {} abandoned: {}", depth, err);
                    break;
                }
                Err(err) => return Err(err),
            }
        }

        Ok(best_path)
    }

    fn max_value(
        &mut self,
        state: &GameState,
        depth: u32,
        preferred: &[Move],
        mut alpha: f64,
        beta: f64,
        deadline: &Deadline,
    ) -> SearchResult<(f64, Vec<Move>)> {
        deadline.check()?;
        self.stats.nodes += 1;

        let mover = state.active_player();
        if depth == 0 || state.is_loser(mover) {
            self.stats.leaf_evaluations += 1;
            return Ok((self.evaluator.score(state, mover), Vec::new()));
        }

        let moves = self.ordered_moves(state, preferred)?;
        let tail = preferred.get(1..).unwrap_or_default();
        let mut best_score = f64::NEG_INFINITY;
        let mut best_path = vec![moves[0]];
        for mv in moves {
            let (score, path) = self.min_value(
                &state.forecast_move(mv),
                depth - 1,
                tail,
                alpha,
                beta,
                deadline,
            )?;
            if score > best_score {
                best_score = score;
                best_path = prepend(mv, path);
                if best_score >= beta {
                    return Ok((best_score, best_path));
                }
                alpha = alpha.max(best_score);
            }
        }
        Ok((best_score, best_path))
    }

    fn min_value(
        &mut self,
        state: &GameState,
        depth: u32,
        preferred: &[Move],
        alpha: f64,
        mut beta: f64,
        deadline: &Deadline,
    ) -> SearchResult<(f64, Vec<Move>)> {
        deadline.check()?;
        self.stats.nodes += 1;

        let mover = state.active_player();
        if depth == 0 || state.is_loser(mover) {
            self.stats.leaf_evaluations += 1;
            return Ok((-self.evaluator.score(state, mover), Vec::new()));
        }

        let moves = self.ordered_moves(state, preferred)?;
        let tail = preferred.get(1..).unwrap_or_default();
        let mut best_score = f64::INFINITY;
        let mut best_path = vec![moves[0]];
        for mv in moves {
            let (score, path) = self.max_value(
                &state.forecast_move(mv),
                depth - 1,
                tail,
                alpha,
                beta,
                deadline,
            )?;
            if score < best_score {
                best_score = score;
                best_path = prepend(mv, path);
                if best_score <= alpha {
                    return Ok((best_score, best_path));
                }
                beta = beta.min(best_score);
            }
        }
        Ok((best_score, best_path))
    }

    fn ordered_moves(&self, state: &GameState, preferred: &[Move]) -> SearchResult<Vec<Move>> {
        let mut moves = non_empty_moves(state)?;

        if self.config.move_ordering == MoveOrdering::OnePly {
            let mover = state.active_player();
            let mut scored: Vec<(f64, Move)> = moves
                .iter()
                .map(|&mv| (self.evaluator.score(&state.forecast_move(mv), mover), mv))
                .collect();
            // Stable, so equal scores keep generation order
            scored.sort_by(|(a, _), (b, _)| b.partial_cmp(a).unwrap_or(Ordering::Equal));
            moves = scored.into_iter().map(|(_, mv)| mv).collect();
        }

        if let Some(head) = preferred.first() {
            if let Some(pos) = moves.iter().position(|mv| mv == head) {
                let mv = moves.remove(pos);
                moves.insert(0, mv);
            }
        }
        Ok(moves)
    }
}

fn prepend(mv: Move, mut path: Vec<Move>) -> Vec<Move> {
    path.insert(0, mv);
    path
}

impl Default for AlphaBetaPlayer {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}

impl BotPlayer for AlphaBetaPlayer {
    fn name(&self) -> &str {
        "alphabeta"
    }

    fn choose_move(
        &mut self,
        state: &GameState,
        clock: &dyn Clock,
    ) -> SearchResult<Option<Move>> {
        self.stats = SearchStats::default();
        if !state.has_legal_moves(state.active_player()) {
            return Ok(None);
        }

        let start = Instant::now();
        let deadline = Deadline::new(clock, self.config.timer_threshold_ms);
        let path = self.iterative_deepening(state, &deadline)?;
        let best = path.first().copied();
        match best {
            Some(mv) => debug!(
                "alphabeta picked {} at depth {} ({} nodes) in {:?}",
                mv,
                self.stats.depth_completed,
                self.stats.nodes,
                start.elapsed()
            ),
            None => warn!("alphabeta completed no depth before the deadline"),
        }
        Ok(best)
    }

    fn last_stats(&self) -> SearchStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::CountdownClock;
    use crate::enums::Player;
    use crate::evaluation::ImprovedScore;
    use crate::players::MinimaxPlayer;

    const PLENTY: fn() -> f64 = || 1_000_000.0;

    fn scenario() -> GameState {
        GameState::default()
            .forecast_move(Move::new(4, 4))
            .forecast_move(Move::new(0, 2))
    }

    fn midgame() -> GameState {
        scenario()
            .forecast_move(Move::new(2, 3))
            .forecast_move(Move::new(1, 4))
            .forecast_move(Move::new(4, 2))
    }

    fn single_placement() -> GameState {
        GameState::default().forecast_move(Move::new(3, 3))
    }

    fn alphabeta_player(ordering: MoveOrdering) -> AlphaBetaPlayer {
        AlphaBetaPlayer::with_evaluator(
            SearchConfig::default().with_move_ordering(ordering),
            Box::new(ImprovedScore),
        )
    }

    fn run_alphabeta(
        player: &mut AlphaBetaPlayer,
        state: &GameState,
        depth: u32,
        preferred: &[Move],
    ) -> (f64, Vec<Move>) {
        let deadline = Deadline::new(&PLENTY, 10.0);
        player
            .alphabeta(
                state,
                depth,
                preferred,
                f64::NEG_INFINITY,
                f64::INFINITY,
                &deadline,
            )
            .unwrap()
    }

    fn run_minimax(state: &GameState, depth: u32) -> (f64, Option<Move>, u64) {
        let mut player = MinimaxPlayer::with_evaluator(
            SearchConfig::default(),
            Box::new(ImprovedScore),
        );
        let deadline = Deadline::new(&PLENTY, 10.0);
        let (score, best) = player.minimax(state, depth, &deadline).unwrap();
        (score, best, player.last_stats().leaf_evaluations)
    }

    #[test]
    fn test_matches_minimax_up_to_depth_four() {
        for state in [scenario(), midgame()] {
            for depth in 1..=4 {
                let (mm_score, mm_move, _) = run_minimax(&state, depth);
                let mut player = alphabeta_player(MoveOrdering::Generation);
                let (ab_score, path) = run_alphabeta(&mut player, &state, depth, &[]);
                assert_eq!(ab_score, mm_score, "score at depth {}", depth);
                assert_eq!(path.first().copied(), mm_move, "move at depth {}", depth);
            }
        }
    }

    #[test]
    fn test_matches_minimax_from_unplaced_opponent() {
        let state = single_placement();
        for depth in 1..=2 {
            let (mm_score, mm_move, _) = run_minimax(&state, depth);
            let mut player = alphabeta_player(MoveOrdering::Generation);
            let (ab_score, path) = run_alphabeta(&mut player, &state, depth, &[]);
            assert_eq!(ab_score, mm_score);
            assert_eq!(path.first().copied(), mm_move);
        }
    }

    #[test]
    fn test_one_ply_ordering_keeps_the_result() {
        let state = midgame();
        for depth in 1..=4 {
            let (mm_score, mm_move, _) = run_minimax(&state, depth);
            let mut player = alphabeta_player(MoveOrdering::OnePly);
            let (ab_score, path) = run_alphabeta(&mut player, &state, depth, &[]);
            assert_eq!(ab_score, mm_score);
            assert_eq!(path.first().copied(), mm_move);
        }
    }

    #[test]
    fn test_pruning_evaluates_fewer_leaves() {
        let state = scenario();
        for (depth, expected) in [(2, 15), (3, 72), (4, 130)] {
            let (_, _, mm_leaves) = run_minimax(&state, depth);
            let mut player = alphabeta_player(MoveOrdering::Generation);
            run_alphabeta(&mut player, &state, depth, &[]);
            let ab_leaves = player.last_stats().leaf_evaluations;
            assert_eq!(ab_leaves, expected);
            assert!(ab_leaves < mm_leaves);
        }
    }

    #[test]
    fn test_returns_principal_variation() {
        let mut player = alphabeta_player(MoveOrdering::Generation);
        let (score, path) = run_alphabeta(&mut player, &scenario(), 3, &[]);
        assert_eq!(score, 2.0);
        assert_eq!(
            path,
            vec![Move::new(2, 3), Move::new(1, 4), Move::new(4, 2)]
        );
    }

    #[test]
    fn test_preferred_move_is_tried_first() {
        // (2, 3) and (3, 2) tie at depth 1; whichever is searched first wins.
        let mut player = alphabeta_player(MoveOrdering::Generation);
        let (_, path) = run_alphabeta(&mut player, &scenario(), 1, &[]);
        assert_eq!(path, vec![Move::new(2, 3)]);

        let (score, path) = run_alphabeta(&mut player, &scenario(), 1, &[Move::new(3, 2)]);
        assert_eq!(score, 3.0);
        assert_eq!(path, vec![Move::new(3, 2)]);
    }

    #[test]
    fn test_search_is_deterministic() {
        let state = scenario();
        let mut first = alphabeta_player(MoveOrdering::Generation);
        let mut second = alphabeta_player(MoveOrdering::Generation);
        let (first_score, first_path) = run_alphabeta(&mut first, &state, 3, &[]);
        let (second_score, second_path) = run_alphabeta(&mut second, &state, 3, &[]);
        assert_eq!(first_score, second_score);
        assert_eq!(first_path, second_path);
        assert_eq!(first.last_stats(), second.last_stats());
        assert_eq!(first.last_stats().leaf_evaluations, 72);
    }

    #[test]
    fn test_deepening_reuses_previous_principal_variation() {
        // Only (3, 2) scores at depth one; every deeper leaf ties at zero, so
        // each later depth keeps whichever root move it searched first.
        let favours_third_move = |state: &GameState, player: Player| {
            let value = if state.move_count() == 3
                && state.player_location(Player::One) == Some(Move::new(3, 2))
            {
                1.0
            } else {
                0.0
            };
            if player == Player::One {
                value
            } else {
                -value
            }
        };
        let state = scenario();
        assert_ne!(state.legal_moves()[0], Move::new(3, 2));

        let mut player =
            AlphaBetaPlayer::with_evaluator(SearchConfig::default(), Box::new(favours_third_move));
        let (_, path) = run_alphabeta(&mut player, &state, 1, &[]);
        assert_eq!(path, vec![Move::new(3, 2)]);
        // Without the hint the depth-two tie goes to the first generated move
        let (_, path) = run_alphabeta(&mut player, &state, 2, &[]);
        assert_eq!(path[0], Move::new(2, 3));

        let clock = CountdownClock::new(2000);
        let deadline = Deadline::new(&clock, 10.0);
        let path = player.iterative_deepening(&state, &deadline).unwrap();
        assert!(player.last_stats().depth_completed >= 2);
        assert_eq!(path[0], Move::new(3, 2));
    }

    #[test]
    fn test_illegal_preferred_move_is_ignored() {
        let mut player = alphabeta_player(MoveOrdering::Generation);
        let (_, path) = run_alphabeta(&mut player, &scenario(), 2, &[Move::new(0, 0)]);
        assert_eq!(path, vec![Move::new(2, 3), Move::new(1, 4)]);
    }

    #[test]
    fn test_deadline_keeps_last_completed_depth() {
        // Depth 1 reads the clock ten times: once on entry, once at the root
        // and once per child.
        let clock = CountdownClock::new(10);
        let deadline = Deadline::new(&clock, 10.0);
        let mut player = alphabeta_player(MoveOrdering::Generation);
        let path = player.iterative_deepening(&scenario(), &deadline).unwrap();
        assert_eq!(path, vec![Move::new(2, 3)]);
        assert_eq!(player.last_stats().depth_completed, 1);
    }

    #[test]
    fn test_no_completed_depth_returns_none() {
        let clock = CountdownClock::new(9);
        let mut player = alphabeta_player(MoveOrdering::Generation);
        assert_eq!(player.choose_move(&scenario(), &clock), Ok(None));
        assert_eq!(player.last_stats().depth_completed, 0);
    }

    #[test]
    fn test_choose_move_under_time_pressure() {
        let clock = CountdownClock::new(500);
        let mut player = alphabeta_player(MoveOrdering::Generation);
        let mv = player.choose_move(&scenario(), &clock).unwrap().unwrap();
        assert!(scenario().is_legal_move(mv));
        assert!(player.last_stats().depth_completed >= 2);
    }

    #[test]
    fn test_searches_to_the_end_of_a_small_board() {
        // 4x4 board: few enough blank cells to finish every depth.
        let state = GameState::new(4, 4)
            .unwrap()
            .forecast_move(Move::new(0, 0))
            .forecast_move(Move::new(3, 3));
        let mut player = alphabeta_player(MoveOrdering::OnePly);
        let mv = player.choose_move(&state, &PLENTY).unwrap().unwrap();
        assert!(state.is_legal_move(mv));
    }

    #[test]
    fn test_lost_position_returns_none() {
        let state = GameState::new(3, 3)
            .unwrap()
            .forecast_move(Move::new(0, 0))
            .forecast_move(Move::new(1, 1))
            .forecast_move(Move::new(1, 2));
        let mut player = AlphaBetaPlayer::default();
        assert_eq!(player.choose_move(&state, &PLENTY), Ok(None));
    }
}
