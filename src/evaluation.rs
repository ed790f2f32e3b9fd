// Evaluation functions
//
// Every scorer is terminal-aware: +inf when `player` has just won, -inf when
// `player` is to move and stuck, a finite value otherwise.
//
// The searches score the min layer as `-score(state, mover)` instead of
// evaluating from the maximizer's side. That is exact only for scorers that
// are antisymmetric under swapping the two players (`ImprovedScore`,
// `ReachScore`, `NullScore`). With `SharedReachScore`, `OpenMoveScore` or
// `CenterScore` the min layer is only an approximation of the maximizer's
// own score.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::enums::{Move, Player};
use crate::state::GameState;

pub trait Evaluator {
    fn score(&self, state: &GameState, player: Player) -> f64;

    fn name(&self) -> &str {
        "custom"
    }
}

impl<F> Evaluator for F
where
    F: Fn(&GameState, Player) -> f64,
{
    fn score(&self, state: &GameState, player: Player) -> f64 {
        self(state, player)
    }
}

fn terminal_score(state: &GameState, player: Player) -> Option<f64> {
    if state.is_loser(player) {
        Some(f64::NEG_INFINITY)
    } else if state.is_winner(player) {
        Some(f64::INFINITY)
    } else {
        None
    }
}

/// No knowledge beyond the terminal contract.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullScore;

impl Evaluator for NullScore {
    fn score(&self, state: &GameState, player: Player) -> f64 {
        terminal_score(state, player).unwrap_or(0.0)
    }

    fn name(&self) -> &str {
        "null"
    }
}

/// Number of moves open to `player`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenMoveScore;

impl Evaluator for OpenMoveScore {
    fn score(&self, state: &GameState, player: Player) -> f64 {
        terminal_score(state, player)
            .unwrap_or_else(|| state.legal_moves_for(player).len() as f64)
    }

    fn name(&self) -> &str {
        "open_move"
    }
}

/// Legal-move differential: own moves minus opponent moves.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImprovedScore;

impl Evaluator for ImprovedScore {
    fn score(&self, state: &GameState, player: Player) -> f64 {
        terminal_score(state, player).unwrap_or_else(|| move_differential(state, player))
    }

    fn name(&self) -> &str {
        "improved"
    }
}

fn move_differential(state: &GameState, player: Player) -> f64 {
    let own = state.legal_moves_for(player).len() as f64;
    let opp = state.legal_moves_for(player.opponent()).len() as f64;
    own - opp
}

/// Squared distance of `player` from the board centre.
#[derive(Debug, Clone, Copy, Default)]
pub struct CenterScore;

impl Evaluator for CenterScore {
    fn score(&self, state: &GameState, player: Player) -> f64 {
        if let Some(score) = terminal_score(state, player) {
            return score;
        }
        let Some(location) = state.player_location(player) else {
            return 0.0;
        };
        let half_w = state.width() as f64 / 2.0;
        let half_h = state.height() as f64 / 2.0;
        (half_h - location.row as f64).powi(2) + (half_w - location.col as f64).powi(2)
    }

    fn name(&self) -> &str {
        "center"
    }
}

/// Move differential plus `bonus` whenever both players can land on a common
/// cell next. Both sides receive the bonus, so this scorer is not
/// antisymmetric.
#[derive(Debug, Clone, Copy)]
pub struct SharedReachScore {
    pub bonus: f64,
}

impl Default for SharedReachScore {
    fn default() -> Self {
        SharedReachScore { bonus: 3.0 }
    }
}

impl Evaluator for SharedReachScore {
    fn score(&self, state: &GameState, player: Player) -> f64 {
        if let Some(score) = terminal_score(state, player) {
            return score;
        }
        let own = state.legal_moves_for(player);
        let opp = state.legal_moves_for(player.opponent());
        let score = own.len() as f64 - opp.len() as f64;
        if own.iter().any(|mv| opp.contains(mv)) {
            score + self.bonus
        } else {
            score
        }
    }

    fn name(&self) -> &str {
        "shared_reach"
    }
}

/// Difference in the number of cells each player could reach within
/// `horizon` knight steps over the current board.
#[derive(Debug, Clone, Copy)]
pub struct ReachScore {
    pub horizon: usize,
}

impl Default for ReachScore {
    fn default() -> Self {
        ReachScore { horizon: 3 }
    }
}

impl ReachScore {
    fn reachable(&self, state: &GameState, player: Player) -> usize {
        let Some(start) = state.player_location(player) else {
            return state.blank_spaces().len();
        };
        let mut visited: HashSet<Move> = HashSet::from([start]);
        let mut frontier = vec![start];
        for _ in 0..self.horizon {
            let mut next = Vec::new();
            for cell in frontier {
                for target in state.knight_moves(cell) {
                    if visited.insert(target) {
                        next.push(target);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }
        visited.len()
    }
}

impl Evaluator for ReachScore {
    fn score(&self, state: &GameState, player: Player) -> f64 {
        if let Some(score) = terminal_score(state, player) {
            return score;
        }
        self.reachable(state, player) as f64 - self.reachable(state, player.opponent()) as f64
    }

    fn name(&self) -> &str {
        "reach"
    }
}

/// Outcome in [0, 1] for `player`: 1 for a win, 0 for a loss, otherwise the
/// share of the remaining mobility owned by `player`.
pub fn win_probability(state: &GameState, player: Player) -> f64 {
    if state.is_loser(player) {
        return 0.0;
    }
    if state.is_winner(player) {
        return 1.0;
    }
    let own = state.legal_moves_for(player).len() as f64;
    let opp = state.legal_moves_for(player.opponent()).len() as f64;
    if own + opp == 0.0 {
        0.5
    } else {
        own / (own + opp)
    }
}

/// Registry of the built-in scorers, selectable from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Heuristic {
    Null,
    OpenMove,
    #[default]
    Improved,
    Center,
    SharedReach { bonus: f64 },
    Reach { horizon: usize },
}

impl Heuristic {
    pub fn build(&self) -> Box<dyn Evaluator> {
        match *self {
            Heuristic::Null => Box::new(NullScore),
            Heuristic::OpenMove => Box::new(OpenMoveScore),
            Heuristic::Improved => Box::new(ImprovedScore),
            Heuristic::Center => Box::new(CenterScore),
            Heuristic::SharedReach { bonus } => Box::new(SharedReachScore { bonus }),
            Heuristic::Reach { horizon } => Box::new(ReachScore { horizon }),
        }
    }

    /// Whether `score(s, p) == -score(s, opponent(p))` holds for every
    /// non-terminal state.
    pub fn is_antisymmetric(&self) -> bool {
        matches!(
            self,
            Heuristic::Null | Heuristic::Improved | Heuristic::Reach { .. }
        )
    }
}
