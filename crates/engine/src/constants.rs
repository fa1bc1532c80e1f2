//! Constants used in the Xiangqi engine.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const BOARD_ROWS: usize = 10;
pub const BOARD_COLS: usize = 9;
pub const BOARD_CELLS: usize = BOARD_ROWS * BOARD_COLS;

/// Columns of the palace, shared by both sides.
pub const PALACE_COLS: std::ops::RangeInclusive<usize> = 3..=5;

// --- Search and Evaluation Constants ---
pub const MATE_VALUE: i32 = 10000;
pub const SCORE_INFINITY: i32 = i32::MAX;

/// Side of the board. Black sits on rows 0-4, Red on rows 5-9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Black,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    King,
    Advisor,
    Elephant,
    Horse,
    Chariot,
    Cannon,
    Soldier,
}

/// An occupied cell. Both halves are closed enums, so every value is a real piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Color {
    pub const ALL: [Color; 2] = [Color::Red, Color::Black];

    /// Get the opponent of the current player.
    pub fn opponent(self) -> Color {
        match self {
            Color::Red => Color::Black,
            Color::Black => Color::Red,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Color::Red => 0,
            Color::Black => 1,
        }
    }

    /// Row delta of a step toward the opponent.
    pub fn forward(self) -> isize {
        match self {
            Color::Red => -1,
            Color::Black => 1,
        }
    }

    pub fn palace_rows(self) -> std::ops::RangeInclusive<usize> {
        match self {
            Color::Red => 7..=9,
            Color::Black => 0..=2,
        }
    }

    /// Rows on this side of the river.
    pub fn home_rows(self) -> std::ops::RangeInclusive<usize> {
        match self {
            Color::Red => 5..=9,
            Color::Black => 0..=4,
        }
    }

    pub fn in_palace(self, row: usize, col: usize) -> bool {
        self.palace_rows().contains(&row) && PALACE_COLS.contains(&col)
    }

    pub fn on_home_side(self, row: usize) -> bool {
        self.home_rows().contains(&row)
    }

    /// Number of rows travelled away from the own back rank.
    pub fn advancement(self, row: usize) -> usize {
        match self {
            Color::Red => BOARD_ROWS - 1 - row,
            Color::Black => row,
        }
    }

    pub fn from_fen_side(c: char) -> Option<Color> {
        match c {
            'w' | 'r' => Some(Color::Red),
            'b' => Some(Color::Black),
            _ => None,
        }
    }

    pub fn to_fen_side(self) -> char {
        match self {
            Color::Red => 'w',
            Color::Black => 'b',
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Color::Red => write!(f, "red"),
            Color::Black => write!(f, "black"),
        }
    }
}

// --- Piece Base Values ---
// Indexed by `PieceKind::index`.
pub const PIECE_VALUES: [i32; 7] = [
    MATE_VALUE, // KING
    20,         // ADVISOR
    20,         // ELEPHANT
    45,         // HORSE
    100,        // CHARIOT
    50,         // CANNON
    10,         // SOLDIER
];

/// Most pieces of each kind a side may hold. Only checked while setting up a board.
pub const MAX_PIECES: [usize; 7] = [1, 2, 2, 2, 2, 2, 5];

impl PieceKind {
    pub const ALL: [PieceKind; 7] = [
        PieceKind::King,
        PieceKind::Advisor,
        PieceKind::Elephant,
        PieceKind::Horse,
        PieceKind::Chariot,
        PieceKind::Cannon,
        PieceKind::Soldier,
    ];

    pub fn index(self) -> usize {
        match self {
            PieceKind::King => 0,
            PieceKind::Advisor => 1,
            PieceKind::Elephant => 2,
            PieceKind::Horse => 3,
            PieceKind::Chariot => 4,
            PieceKind::Cannon => 5,
            PieceKind::Soldier => 6,
        }
    }

    /// Get the material value of a piece.
    pub fn value(self) -> i32 {
        PIECE_VALUES[self.index()]
    }

    pub fn max_count(self) -> usize {
        MAX_PIECES[self.index()]
    }

    /// Lowercase letter used by the board encoding.
    pub fn letter(self) -> char {
        match self {
            PieceKind::King => 'k',
            PieceKind::Advisor => 'a',
            PieceKind::Elephant => 'b',
            PieceKind::Horse => 'n',
            PieceKind::Chariot => 'r',
            PieceKind::Cannon => 'c',
            PieceKind::Soldier => 'p',
        }
    }

    pub fn from_letter(c: char) -> Option<PieceKind> {
        match c.to_ascii_lowercase() {
            'k' => Some(PieceKind::King),
            'a' => Some(PieceKind::Advisor),
            'b' => Some(PieceKind::Elephant),
            'n' => Some(PieceKind::Horse),
            'r' => Some(PieceKind::Chariot),
            'c' => Some(PieceKind::Cannon),
            'p' => Some(PieceKind::Soldier),
            _ => None,
        }
    }
}

impl Piece {
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Self { color, kind }
    }

    /// Uppercase for Red, lowercase for Black.
    pub fn to_fen_char(self) -> char {
        let letter = self.kind.letter();
        match self.color {
            Color::Red => letter.to_ascii_uppercase(),
            Color::Black => letter,
        }
    }

    pub fn from_fen_char(c: char) -> Option<Piece> {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let kind = PieceKind::from_letter(c)?;
        let color = if c.is_ascii_uppercase() {
            Color::Red
        } else {
            Color::Black
        };
        Some(Piece::new(color, kind))
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_fen_char())
    }
}
