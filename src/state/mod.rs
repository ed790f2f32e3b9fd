// Board state - immutable Isolation positions
//
// A GameState is a self-contained snapshot: successors are produced by
// cloning (see move_application.rs), never by mutating a shared board.

use std::fmt;

use itertools::iproduct;
use serde::{Deserialize, Serialize};

use crate::enums::{CellState, Move, Player, KNIGHT_OFFSETS};
use crate::errors::{GameError, GameResult};

mod move_application;

pub const DEFAULT_WIDTH: usize = 7;
pub const DEFAULT_HEIGHT: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameState {
    width: usize,
    height: usize,
    /// Row-major occupancy
    cells: Vec<CellState>,
    locations: [Option<Move>; 2],
    active: Player,
    move_count: usize,
}

impl Default for GameState {
    fn default() -> Self {
        Self::empty(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl GameState {
    /// Creates an empty board with both players unplaced and player one to move.
    pub fn new(width: usize, height: usize) -> GameResult<Self> {
        if width == 0 || height == 0 {
            return Err(GameError::InvalidDimensions { width, height });
        }
        Ok(Self::empty(width, height))
    }

    fn empty(width: usize, height: usize) -> Self {
        GameState {
            width,
            height,
            cells: vec![CellState::Empty; width * height],
            locations: [None, None],
            active: Player::One,
            move_count: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of plies played so far.
    pub fn move_count(&self) -> usize {
        self.move_count
    }

    pub fn active_player(&self) -> Player {
        self.active
    }

    pub fn inactive_player(&self) -> Player {
        self.active.opponent()
    }

    pub fn opponent(&self, player: Player) -> Player {
        player.opponent()
    }

    /// Current cell of `player`, or `None` before its first placement.
    pub fn player_location(&self, player: Player) -> Option<Move> {
        self.locations[player.index()]
    }

    pub fn in_bounds(&self, cell: Move) -> bool {
        cell.row < self.height && cell.col < self.width
    }

    pub fn cell(&self, cell: Move) -> Option<CellState> {
        if self.in_bounds(cell) {
            Some(self.cells[self.index_of(cell)])
        } else {
            None
        }
    }

    fn index_of(&self, cell: Move) -> usize {
        cell.row * self.width + cell.col
    }

    fn is_open(&self, cell: Move) -> bool {
        self.cell(cell).is_some_and(CellState::is_empty)
    }

    /// Every empty cell, column by column.
    pub fn blank_spaces(&self) -> Vec<Move> {
        iproduct!(0..self.width, 0..self.height)
            .map(|(col, row)| Move::new(row, col))
            .filter(|&cell| self.is_open(cell))
            .collect()
    }

    /// Legal moves of the player to move.
    pub fn legal_moves(&self) -> Vec<Move> {
        self.legal_moves_for(self.active)
    }

    /// Legal moves of `player` from its current cell, in knight-offset table
    /// order. An unplaced player may take any empty cell.
    pub fn legal_moves_for(&self, player: Player) -> Vec<Move> {
        match self.player_location(player) {
            None => self.blank_spaces(),
            Some(from) => self.knight_moves(from).collect(),
        }
    }

    /// Open cells one knight step away from `from`.
    pub fn knight_moves(&self, from: Move) -> impl Iterator<Item = Move> + '_ {
        KNIGHT_OFFSETS
            .iter()
            .filter_map(move |&(d_row, d_col)| from.offset(d_row, d_col))
            .filter(move |&cell| self.is_open(cell))
    }

    pub fn has_legal_moves(&self, player: Player) -> bool {
        match self.player_location(player) {
            None => self.cells.iter().any(|cell| cell.is_empty()),
            Some(from) => self.knight_moves(from).next().is_some(),
        }
    }

    /// Whether `mv` is legal for the player to move.
    pub fn is_legal_move(&self, mv: Move) -> bool {
        if !self.is_open(mv) {
            return false;
        }
        match self.player_location(self.active) {
            None => true,
            Some(from) => mv.is_knight_step_from(from),
        }
    }

    /// True when `player` has no legal move from its current cell.
    pub fn is_terminal_for(&self, player: Player) -> bool {
        !self.has_legal_moves(player)
    }

    /// `player` is to move and is stuck.
    pub fn is_loser(&self, player: Player) -> bool {
        player == self.active && self.is_terminal_for(player)
    }

    /// `player` just moved and the opponent is stuck.
    pub fn is_winner(&self, player: Player) -> bool {
        player != self.active && self.is_terminal_for(self.active)
    }

    pub fn winner(&self) -> Option<Player> {
        if self.is_terminal_for(self.active) {
            Some(self.inactive_player())
        } else {
            None
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.winner().is_some()
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.height {
            write!(f, "|")?;
            for col in 0..self.width {
                let symbol = match self.cells[row * self.width + col] {
                    CellState::Empty => ' ',
                    CellState::Blocked => '-',
                    CellState::Occupied(Player::One) => '1',
                    CellState::Occupied(Player::Two) => '2',
                };
                write!(f, " {} |", symbol)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
