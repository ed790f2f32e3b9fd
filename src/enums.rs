use std::fmt;

use serde::{Deserialize, Serialize};

/// Knight-step offsets as (row, col) deltas. Legal move generation walks this
/// table in order, so it fixes the exploration order of every search.
pub const KNIGHT_OFFSETS: [(isize, isize); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    One = 0,
    Two = 1,
}

pub const PLAYERS: [Player; 2] = [Player::One, Player::Two];

impl Player {
    pub fn opponent(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::One => write!(f, "player one"),
            Player::Two => write!(f, "player two"),
        }
    }
}

/// A target cell. Moves and player locations share this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Move {
    pub row: usize,
    pub col: usize,
}

impl Move {
    pub const fn new(row: usize, col: usize) -> Self {
        Move { row, col }
    }

    /// Cell reached by a (row, col) offset, if it does not underflow.
    pub fn offset(self, d_row: isize, d_col: isize) -> Option<Move> {
        let row = self.row.checked_add_signed(d_row)?;
        let col = self.col.checked_add_signed(d_col)?;
        Some(Move { row, col })
    }

    pub fn is_knight_step_from(self, other: Move) -> bool {
        let d_row = self.row.abs_diff(other.row);
        let d_col = self.col.abs_diff(other.col);
        (d_row == 1 && d_col == 2) || (d_row == 2 && d_col == 1)
    }
}

impl From<(usize, usize)> for Move {
    fn from((row, col): (usize, usize)) -> Self {
        Move { row, col }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellState {
    Empty,
    /// Visited earlier and left behind
    Blocked,
    Occupied(Player),
}

impl CellState {
    pub fn is_empty(self) -> bool {
        matches!(self, CellState::Empty)
    }
}
