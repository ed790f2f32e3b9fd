use rand::seq::SliceRandom;
use rand::Rng;
use rand_xorshift::XorShiftRng;

use super::{seeded_rng, BotPlayer};
use crate::clock::Clock;
use crate::config::SearchConfig;
use crate::enums::Move;
use crate::errors::SearchResult;
use crate::evaluation::Evaluator;
use crate::state::GameState;

/// One-ply greedy choice: the move whose successor scores best for the
/// player to move. With probability `epsilon` a uniformly random move is
/// taken instead. Ties keep the earliest move in generation order.
pub fn greedy_move<R: Rng + ?Sized>(
    state: &GameState,
    evaluator: &dyn Evaluator,
    epsilon: f64,
    rng: &mut R,
) -> Option<Move> {
    let moves = state.legal_moves();
    if moves.is_empty() {
        return None;
    }
    if epsilon > 0.0 && rng.gen_bool(epsilon) {
        return moves.choose(rng).copied();
    }

    let mover = state.active_player();
    let mut best_move = moves[0];
    let mut best_score = f64::NEG_INFINITY;
    for mv in moves {
        let score = evaluator.score(&state.forecast_move(mv), mover);
        if score > best_score {
            best_score = score;
            best_move = mv;
        }
    }
    Some(best_move)
}

pub struct GreedyPlayer {
    evaluator: Box<dyn Evaluator>,
    epsilon: f64,
    rng: XorShiftRng,
}

impl GreedyPlayer {
    pub fn new(config: SearchConfig) -> Self {
        GreedyPlayer {
            evaluator: config.heuristic.build(),
            epsilon: 0.0,
            rng: seeded_rng(config.seed),
        }
    }

    /// Plays a random move with probability `epsilon`.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon.clamp(0.0, 1.0);
        self
    }
}

impl Default for GreedyPlayer {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}

impl BotPlayer for GreedyPlayer {
    fn name(&self) -> &str {
        "greedy"
    }

    fn choose_move(
        &mut self,
        state: &GameState,
        _clock: &dyn Clock,
    ) -> SearchResult<Option<Move>> {
        Ok(greedy_move(
            state,
            self.evaluator.as_ref(),
            self.epsilon,
            &mut self.rng,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::Player;
    use crate::evaluation::{ImprovedScore, OpenMoveScore};

    fn scenario() -> GameState {
        GameState::default()
            .forecast_move(Move::new(4, 4))
            .forecast_move(Move::new(0, 2))
    }

    #[test]
    fn test_greedy_maximizes_one_ply_score() {
        let state = scenario();
        let mut rng = seeded_rng(Some(0));
        let mv = greedy_move(&state, &ImprovedScore, 0.0, &mut rng).unwrap();
        // Same choice as a depth-one minimax search
        assert_eq!(mv, Move::new(2, 3));
        let best = ImprovedScore.score(&state.forecast_move(mv), Player::One);
        for other in state.legal_moves() {
            assert!(ImprovedScore.score(&state.forecast_move(other), Player::One) <= best);
        }
    }

    #[test]
    fn test_full_epsilon_is_random_but_legal() {
        let state = scenario();
        let mut rng = seeded_rng(Some(5));
        for _ in 0..20 {
            let mv = greedy_move(&state, &OpenMoveScore, 1.0, &mut rng).unwrap();
            assert!(state.is_legal_move(mv));
        }
    }

    #[test]
    fn test_greedy_player_uses_configured_heuristic() {
        let mut player = GreedyPlayer::new(SearchConfig::default().with_seed(1));
        let clock = || 100.0;
        assert_eq!(
            player.choose_move(&scenario(), &clock),
            Ok(Some(Move::new(2, 3)))
        );
    }

    #[test]
    fn test_greedy_player_epsilon_is_clamped() {
        let state = scenario();
        let clock = || 100.0;
        let mut player = GreedyPlayer::new(SearchConfig::default().with_seed(3)).with_epsilon(2.0);
        assert_eq!(player.epsilon, 1.0);
        for _ in 0..10 {
            let mv = player.choose_move(&state, &clock).unwrap().unwrap();
            assert!(state.is_legal_move(mv));
        }

        let mut player = GreedyPlayer::default().with_epsilon(-1.0);
        assert_eq!(player.epsilon, 0.0);
        assert_eq!(player.choose_move(&state, &clock), Ok(Some(Move::new(2, 3))));
    }

    #[test]
    fn test_greedy_move_when_stuck() {
        let state = GameState::new(3, 3)
            .unwrap()
            .forecast_move(Move::new(0, 0))
            .forecast_move(Move::new(1, 1))
            .forecast_move(Move::new(1, 2));
        let mut rng = seeded_rng(Some(0));
        assert_eq!(greedy_move(&state, &ImprovedScore, 0.5, &mut rng), None);
    }
}
