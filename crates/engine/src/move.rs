//! Defines the representation of a move in the engine.

use crate::constants::{Color, Piece, BOARD_COLS, BOARD_ROWS};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A board cell as `(row, col)`.
pub type Square = (usize, usize);

/// Represents a single move.
///
/// Moves carry no state of their own; whether one is playable is decided
/// against a board by `move_gen::is_legal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from_row: usize,
    pub from_col: usize,
    pub to_row: usize,
    pub to_col: usize,
}

impl Move {
    /// Creates a new move.
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from_row: from.0,
            from_col: from.1,
            to_row: to.0,
            to_col: to.1,
        }
    }

    /// Gets the source square.
    pub fn from_sq(&self) -> Square {
        (self.from_row, self.from_col)
    }

    /// Gets the destination square.
    pub fn to_sq(&self) -> Square {
        (self.to_row, self.to_col)
    }

    /// File letter plus rank digit for both squares, rank 0 being Red's back rank.
    pub fn to_uci_string(&self) -> String {
        let from_file = (self.from_col as u8 + b'a') as char;
        let from_rank = BOARD_ROWS - 1 - self.from_row;
        let to_file = (self.to_col as u8 + b'a') as char;
        let to_rank = BOARD_ROWS - 1 - self.to_row;
        format!("{}{}{}{}", from_file, from_rank, to_file, to_rank)
    }

    /// Parses the notation produced by [`Move::to_uci_string`].
    pub fn from_uci_string(s: &str) -> Option<Move> {
        let bytes = s.as_bytes();
        if bytes.len() != 4 {
            return None;
        }
        let square = |file: u8, rank: u8| -> Option<Square> {
            let col = file.checked_sub(b'a')? as usize;
            let rank = rank.checked_sub(b'0')? as usize;
            if col >= BOARD_COLS || rank >= BOARD_ROWS {
                return None;
            }
            Some((BOARD_ROWS - 1 - rank, col))
        };
        Some(Move::new(
            square(bytes[0], bytes[1])?,
            square(bytes[2], bytes[3])?,
        ))
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "({},{})->({},{})",
            self.from_row, self.from_col, self.to_row, self.to_col
        )
    }
}

/// One entry of a game's move history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub mv: Move,
    pub piece: Piece,
    pub captured: Option<Piece>,
    /// Side to move before this move was played.
    pub turn_before: Color,
}
