// Game driver - plays one game between two bots under a per-turn time limit

use std::time::Duration;

use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::clock::TurnClock;
use crate::enums::{Move, Player};
use crate::players::BotPlayer;
use crate::state::GameState;

/// Why the game ended, from the loser's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The loser was to move and had nowhere to go.
    NoLegalMoves,
    /// The loser answered after its turn time ran out.
    Timeout,
    /// The loser returned an illegal move, or no move while moves existed.
    IllegalMove,
    /// The loser's search failed with an internal error.
    Fault,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameOutcome {
    pub winner: Player,
    pub reason: EndReason,
    /// Every move applied, in order, including the initial placements.
    pub history: Vec<Move>,
    pub final_state: GameState,
}

impl GameOutcome {
    pub fn loser(&self) -> Player {
        self.winner.opponent()
    }
}

/// Plays `state` to the end. `players[0]` moves for player one and
/// `players[1]` for player two; each turn gets a fresh `time_limit` clock.
pub fn play_game(
    state: GameState,
    mut players: [&mut dyn BotPlayer; 2],
    time_limit: Duration,
) -> GameOutcome {
    let mut state = state;
    let mut history = Vec::new();

    loop {
        let mover = state.active_player();
        if !state.has_legal_moves(mover) {
            info!("{} has no legal moves", mover);
            return finish(state, history, mover, EndReason::NoLegalMoves);
        }

        let player = &mut players[mover.index()];
        let clock = TurnClock::start(time_limit);
        let result = player.choose_move(&state, &clock);
        let elapsed = clock.elapsed();

        let mv = match result {
            Err(err) => {
                error!("{} ({}) failed: {}", mover, player.name(), err);
                return finish(state, history, mover, EndReason::Fault);
            }
            Ok(_) if elapsed > time_limit => {
                warn!(
                    "{} ({}) took {:?} of {:?}",
                    mover,
                    player.name(),
                    elapsed,
                    time_limit
                );
                return finish(state, history, mover, EndReason::Timeout);
            }
            Ok(None) => {
                warn!("{} ({}) gave up with moves left", mover, player.name());
                return finish(state, history, mover, EndReason::IllegalMove);
            }
            Ok(Some(mv)) => mv,
        };

        match state.try_forecast_move(mv) {
            Ok(next) => {
                info!("{} ({}) plays {}", mover, player.name(), mv);
                history.push(mv);
                state = next;
            }
            Err(err) => {
                warn!("{} ({}): {}", mover, player.name(), err);
                return finish(state, history, mover, EndReason::IllegalMove);
            }
        }
    }
}

fn finish(state: GameState, history: Vec<Move>, loser: Player, reason: EndReason) -> GameOutcome {
    let winner = loser.opponent();
    info!(
        "{} wins after {} moves ({:?})",
        winner,
        history.len(),
        reason
    );
    GameOutcome {
        winner,
        reason,
        history,
        final_state: state,
    }
}
