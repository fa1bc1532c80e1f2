//! The core board representation for the Xiangqi engine.

use crate::constants::{Color, Piece, PieceKind, BOARD_COLS, BOARD_ROWS};
use crate::error::{EngineError, EngineResult};
use crate::r#move::Square;
use std::fmt;
use std::str::FromStr;

/// Encoding of the standard opening layout.
pub const START_ENCODING: &str = "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR";

const BACK_RANK: [PieceKind; BOARD_COLS] = [
    PieceKind::Chariot,
    PieceKind::Horse,
    PieceKind::Elephant,
    PieceKind::Advisor,
    PieceKind::King,
    PieceKind::Advisor,
    PieceKind::Elephant,
    PieceKind::Horse,
    PieceKind::Chariot,
];

/// A 10x9 grid of optional pieces. Row 0 is Black's back rank.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [[Option<Piece>; BOARD_COLS]; BOARD_ROWS],
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl Board {
    pub fn empty() -> Self {
        Self {
            cells: [[None; BOARD_COLS]; BOARD_ROWS],
        }
    }

    /// The standard opening layout.
    pub fn standard() -> Self {
        let mut board = Board::empty();
        for (col, kind) in BACK_RANK.iter().enumerate() {
            board.cells[0][col] = Some(Piece::new(Color::Black, *kind));
            board.cells[9][col] = Some(Piece::new(Color::Red, *kind));
        }
        for col in [1, 7] {
            board.cells[2][col] = Some(Piece::new(Color::Black, PieceKind::Cannon));
            board.cells[7][col] = Some(Piece::new(Color::Red, PieceKind::Cannon));
        }
        for col in (0..BOARD_COLS).step_by(2) {
            board.cells[3][col] = Some(Piece::new(Color::Black, PieceKind::Soldier));
            board.cells[6][col] = Some(Piece::new(Color::Red, PieceKind::Soldier));
        }
        board
    }

    #[inline]
    pub fn in_bounds(row: usize, col: usize) -> bool {
        row < BOARD_ROWS && col < BOARD_COLS
    }

    /// Piece on a cell; `None` for empty or off-board cells.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<Piece> {
        if Board::in_bounds(row, col) {
            self.cells[row][col]
        } else {
            None
        }
    }

    #[inline]
    pub fn at(&self, sq: Square) -> Option<Piece> {
        self.get(sq.0, sq.1)
    }

    /// Places or clears a cell, returning what was there. Off-board writes are ignored.
    pub fn set(&mut self, sq: Square, piece: Option<Piece>) -> Option<Piece> {
        if !Board::in_bounds(sq.0, sq.1) {
            return None;
        }
        std::mem::replace(&mut self.cells[sq.0][sq.1], piece)
    }

    /// All occupied cells in row-major order.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.cells.iter().enumerate().flat_map(|(row, rank)| {
            rank.iter()
                .enumerate()
                .filter_map(move |(col, cell)| cell.map(|piece| ((row, col), piece)))
        })
    }

    pub fn find_king(&self, color: Color) -> Option<Square> {
        self.pieces()
            .find(|(_, piece)| piece.color == color && piece.kind == PieceKind::King)
            .map(|(sq, _)| sq)
    }

    /// Counts occupied cells strictly between two squares on the same row or column.
    /// Returns `None` when the squares are not on a shared straight line.
    pub fn pieces_between(&self, from: Square, to: Square) -> Option<usize> {
        if from == to {
            return None;
        }
        if from.0 == to.0 {
            let (lo, hi) = (from.1.min(to.1), from.1.max(to.1));
            Some(
                (lo + 1..hi)
                    .filter(|&col| self.cells[from.0][col].is_some())
                    .count(),
            )
        } else if from.1 == to.1 {
            let (lo, hi) = (from.0.min(to.0), from.0.max(to.0));
            Some(
                (lo + 1..hi)
                    .filter(|&row| self.cells[row][from.1].is_some())
                    .count(),
            )
        } else {
            None
        }
    }

    /// Rank-separated, run-length encoding of the piece layout.
    ///
    /// Side to move is deliberately left out: this string is the position
    /// fingerprint used for repetition detection.
    pub fn encode(&self) -> String {
        let mut fen = String::with_capacity(96);
        for (r, rank) in self.cells.iter().enumerate() {
            let mut empty_count = 0;
            for cell in rank {
                match cell {
                    None => empty_count += 1,
                    Some(piece) => {
                        if empty_count > 0 {
                            fen.push_str(&empty_count.to_string());
                            empty_count = 0;
                        }
                        fen.push(piece.to_fen_char());
                    }
                }
            }
            if empty_count > 0 {
                fen.push_str(&empty_count.to_string());
            }
            if r < BOARD_ROWS - 1 {
                fen.push('/');
            }
        }
        fen
    }

    /// Parses [`Board::encode`] output. Anything after the first whitespace
    /// (side to move, counters) is ignored.
    pub fn decode(encoding: &str) -> EngineResult<Board> {
        let layout = encoding.split_whitespace().next().unwrap_or("");
        let ranks: Vec<&str> = layout.split('/').collect();
        if ranks.len() != BOARD_ROWS {
            return Err(EngineError::InvalidEncoding {
                reason: format!("expected {} ranks, found {}", BOARD_ROWS, ranks.len()),
            });
        }

        let mut board = Board::empty();
        for (row, rank) in ranks.iter().enumerate() {
            let mut col = 0;
            for ch in rank.chars() {
                if let Some(digit) = ch.to_digit(10) {
                    if digit == 0 {
                        return Err(EngineError::InvalidEncoding {
                            reason: format!("zero-length gap on rank {}", row),
                        });
                    }
                    col += digit as usize;
                } else {
                    let piece = Piece::from_fen_char(ch).ok_or_else(|| {
                        EngineError::InvalidEncoding {
                            reason: format!("unknown piece letter '{}'", ch),
                        }
                    })?;
                    if col >= BOARD_COLS {
                        return Err(EngineError::InvalidEncoding {
                            reason: format!("rank {} is longer than {} cells", row, BOARD_COLS),
                        });
                    }
                    board.cells[row][col] = Some(piece);
                    col += 1;
                }
                if col > BOARD_COLS {
                    return Err(EngineError::InvalidEncoding {
                        reason: format!("rank {} is longer than {} cells", row, BOARD_COLS),
                    });
                }
            }
            if col != BOARD_COLS {
                return Err(EngineError::InvalidEncoding {
                    reason: format!("rank {} covers {} cells, expected {}", row, col, BOARD_COLS),
                });
            }
        }
        Ok(board)
    }
}

impl FromStr for Board {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Board::decode(s)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "  +-------------------+")?;
        for (r, rank) in self.cells.iter().enumerate() {
            write!(f, "{} | ", BOARD_ROWS - 1 - r)?;
            for cell in rank {
                let ch = cell.map_or('.', |piece| piece.to_fen_char());
                write!(f, "{} ", ch)?;
            }
            writeln!(f, "|")?;
        }
        writeln!(f, "  +-------------------+")?;
        writeln!(f, "    a b c d e f g h i")
    }
}
