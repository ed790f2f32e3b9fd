use rand::seq::SliceRandom;
use rand::Rng;
use rand_xorshift::XorShiftRng;

use super::{seeded_rng, BotPlayer};
use crate::clock::Clock;
use crate::enums::Move;
use crate::errors::SearchResult;
use crate::state::GameState;

/// Uniformly random legal move, `None` when the mover is stuck.
pub fn random_move<R: Rng + ?Sized>(state: &GameState, rng: &mut R) -> Option<Move> {
    state.legal_moves().choose(rng).copied()
}

pub struct RandomPlayer {
    rng: XorShiftRng,
}

impl RandomPlayer {
    pub fn new(seed: Option<u64>) -> Self {
        RandomPlayer {
            rng: seeded_rng(seed),
        }
    }
}

impl Default for RandomPlayer {
    fn default() -> Self {
        Self::new(None)
    }
}

impl BotPlayer for RandomPlayer {
    fn name(&self) -> &str {
        "random"
    }

    fn choose_move(
        &mut self,
        state: &GameState,
        _clock: &dyn Clock,
    ) -> SearchResult<Option<Move>> {
        Ok(random_move(state, &mut self.rng))
    }
}
