use super::GameState;

use crate::enums::{CellState, Move};
use crate::errors::{GameError, GameResult};

impl GameState {
    /// Returns the position after the player to move takes `mv`.
    ///
    /// The receiver is left untouched. `mv` must come from `legal_moves()`;
    /// use `try_forecast_move` for input that has not been validated.
    pub fn forecast_move(&self, mv: Move) -> GameState {
        debug_assert!(
            self.is_legal_move(mv),
            "illegal move {} for {}",
            mv,
            self.active
        );
        let mut next = self.clone();
        next.apply_move(mv);
        next
    }

    /// Checked variant of `forecast_move`.
    pub fn try_forecast_move(&self, mv: Move) -> GameResult<GameState> {
        if self.is_terminal_for(self.active) {
            return Err(GameError::GameOver {
                player: self.active,
            });
        }
        if !self.is_legal_move(mv) {
            return Err(GameError::IllegalMove {
                player: self.active,
                mv,
            });
        }
        Ok(self.forecast_move(mv))
    }

    /// In-place transition. Only used on private copies (forecasts and
    /// playout boards).
    pub(crate) fn apply_move(&mut self, mv: Move) {
        let mover = self.active;
        if let Some(previous) = self.locations[mover.index()] {
            let idx = self.index_of(previous);
            self.cells[idx] = CellState::Blocked;
        }
        let idx = self.index_of(mv);
        self.cells[idx] = CellState::Occupied(mover);
        self.locations[mover.index()] = Some(mv);
        self.active = mover.opponent();
        self.move_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::Player;

    #[test]
    fn test_forecast_blocks_previous_cell() {
        let state = GameState::default()
            .forecast_move(Move::new(4, 4))
            .forecast_move(Move::new(0, 2));
        let next = state.forecast_move(Move::new(2, 3));

        assert_eq!(next.cell(Move::new(4, 4)), Some(CellState::Blocked));
        assert_eq!(
            next.cell(Move::new(2, 3)),
            Some(CellState::Occupied(Player::One))
        );
        assert_eq!(next.player_location(Player::One), Some(Move::new(2, 3)));
        assert_eq!(next.active_player(), Player::Two);
        assert_eq!(next.move_count(), 3);
    }

    #[test]
    fn test_forecast_never_mutates_receiver() {
        let state = GameState::default()
            .forecast_move(Move::new(4, 4))
            .forecast_move(Move::new(0, 2));
        let snapshot = state.clone();
        let moves_before = state.legal_moves();

        let first = state.forecast_move(Move::new(2, 3));
        let first_snapshot = first.clone();
        let second = first.forecast_move(Move::new(1, 4));

        assert_eq!(state, snapshot);
        assert_eq!(first, first_snapshot);
        assert_eq!(state.legal_moves(), moves_before);
        assert_ne!(second, first);
        assert_eq!(second.move_count(), 4);
    }

    #[test]
    fn test_occupied_cells_are_not_revisited() {
        let state = GameState::default()
            .forecast_move(Move::new(0, 0))
            .forecast_move(Move::new(6, 6));
        let state = state.forecast_move(Move::new(1, 2));
        let state = state.forecast_move(Move::new(4, 5));
        // (0, 0) is blocked, so player one cannot jump back.
        assert!(!state.legal_moves().contains(&Move::new(0, 0)));
        assert_eq!(state.cell(Move::new(0, 0)), Some(CellState::Blocked));
    }

    #[test]
    fn test_try_forecast_rejects_illegal_move() {
        let state = GameState::default()
            .forecast_move(Move::new(4, 4))
            .forecast_move(Move::new(0, 2));
        let err = state.try_forecast_move(Move::new(4, 5)).unwrap_err();
        assert_eq!(
            err,
            GameError::IllegalMove {
                player: Player::One,
                mv: Move::new(4, 5),
            }
        );
        assert!(state.try_forecast_move(Move::new(3, 2)).is_ok());
    }

    #[test]
    fn test_try_forecast_rejects_finished_game() {
        let state = GameState::new(3, 3)
            .unwrap()
            .forecast_move(Move::new(0, 0))
            .forecast_move(Move::new(1, 1));
        let state = state.forecast_move(Move::new(1, 2));
        assert_eq!(
            state.try_forecast_move(Move::new(0, 1)),
            Err(GameError::GameOver {
                player: Player::Two
            })
        );
    }
}
