//! Free-setup support: placement rules and piece limits.
//!
//! These checks are advisory. They guide a setup editor and are never
//! re-applied once play starts.

use crate::board::Board;
use crate::constants::{Color, PieceKind};
use crate::error::{EngineError, EngineResult};
use crate::r#move::Square;
use serde::{Deserialize, Serialize};

/// One piece in a setup export or import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub row: usize,
    pub col: usize,
    pub color: Color,
    pub kind: PieceKind,
}

const RED_ADVISOR_CELLS: [Square; 5] = [(7, 3), (7, 5), (8, 4), (9, 3), (9, 5)];
const BLACK_ADVISOR_CELLS: [Square; 5] = [(0, 3), (0, 5), (1, 4), (2, 3), (2, 5)];
const RED_ELEPHANT_CELLS: [Square; 7] = [(5, 2), (5, 6), (7, 0), (7, 4), (7, 8), (9, 2), (9, 6)];
const BLACK_ELEPHANT_CELLS: [Square; 7] = [(0, 2), (0, 6), (2, 0), (2, 4), (2, 8), (4, 2), (4, 6)];

/// Files a soldier may stand on before it crosses the river.
const SOLDIER_HOME_COLS: [usize; 5] = [0, 2, 4, 6, 8];

fn invalid(reason: String) -> EngineResult<()> {
    Err(EngineError::InvalidPlacement { reason })
}

/// Checks where a piece may be placed during setup.
pub fn validate_placement(kind: PieceKind, color: Color, row: usize, col: usize) -> EngineResult<()> {
    if !Board::in_bounds(row, col) {
        return invalid(format!("({},{}) is off the board", row, col));
    }
    match kind {
        PieceKind::King => {
            if !color.in_palace(row, col) {
                return invalid(format!("the {} king must stay inside its palace", color));
            }
        }
        PieceKind::Advisor => {
            let cells: &[Square] = match color {
                Color::Red => &RED_ADVISOR_CELLS,
                Color::Black => &BLACK_ADVISOR_CELLS,
            };
            if !cells.contains(&(row, col)) {
                return invalid(format!("a {} advisor can only stand on a palace point", color));
            }
        }
        PieceKind::Elephant => {
            let cells: &[Square] = match color {
                Color::Red => &RED_ELEPHANT_CELLS,
                Color::Black => &BLACK_ELEPHANT_CELLS,
            };
            if !cells.contains(&(row, col)) {
                return invalid(format!(
                    "a {} elephant can only stand on its seven home points",
                    color
                ));
            }
        }
        PieceKind::Soldier => {
            if color.on_home_side(row) && !SOLDIER_HOME_COLS.contains(&col) {
                return invalid(format!(
                    "a {} soldier on its own side must stand on an even file",
                    color
                ));
            }
        }
        PieceKind::Horse | PieceKind::Chariot | PieceKind::Cannon => {}
    }
    Ok(())
}

/// Pieces of each kind held by `color`, indexed by `PieceKind::index`.
pub fn count_pieces(board: &Board, color: Color) -> [usize; 7] {
    let mut counts = [0; 7];
    for (_, piece) in board.pieces().filter(|(_, p)| p.color == color) {
        counts[piece.kind.index()] += 1;
    }
    counts
}

/// Whether another piece of `kind` fits under the per-side maximum.
pub fn can_add_piece(board: &Board, color: Color, kind: PieceKind) -> bool {
    count_pieces(board, color)[kind.index()] < kind.max_count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_king_placement() {
        assert!(validate_placement(PieceKind::King, Color::Red, 8, 4).is_ok());
        assert!(validate_placement(PieceKind::King, Color::Red, 6, 4).is_err());
        assert!(validate_placement(PieceKind::King, Color::Black, 2, 5).is_ok());
        assert!(validate_placement(PieceKind::King, Color::Black, 1, 6).is_err());
    }

    #[test]
    fn test_advisor_and_elephant_allow_lists() {
        assert!(validate_placement(PieceKind::Advisor, Color::Red, 8, 4).is_ok());
        assert!(validate_placement(PieceKind::Advisor, Color::Red, 8, 3).is_err());
        assert!(validate_placement(PieceKind::Advisor, Color::Black, 1, 4).is_ok());
        assert!(validate_placement(PieceKind::Elephant, Color::Red, 5, 6).is_ok());
        assert!(validate_placement(PieceKind::Elephant, Color::Red, 4, 2).is_err());
        assert!(validate_placement(PieceKind::Elephant, Color::Black, 4, 2).is_ok());
    }

    #[test]
    fn test_soldier_files() {
        assert!(validate_placement(PieceKind::Soldier, Color::Red, 6, 4).is_ok());
        assert!(validate_placement(PieceKind::Soldier, Color::Red, 6, 3).is_err());
        // Across the river any file is fine.
        assert!(validate_placement(PieceKind::Soldier, Color::Red, 3, 3).is_ok());
        assert!(validate_placement(PieceKind::Soldier, Color::Black, 4, 1).is_err());
        assert!(validate_placement(PieceKind::Soldier, Color::Black, 5, 1).is_ok());
    }

    #[test]
    fn test_free_pieces_and_bounds() {
        assert!(validate_placement(PieceKind::Horse, Color::Red, 0, 0).is_ok());
        assert!(validate_placement(PieceKind::Cannon, Color::Black, 9, 8).is_ok());
        let err = validate_placement(PieceKind::Chariot, Color::Red, 10, 0).unwrap_err();
        assert!(matches!(err, EngineError::InvalidPlacement { .. }));
    }

    #[test]
    fn test_piece_limits() {
        let board = Board::standard();
        let counts = count_pieces(&board, Color::Red);
        assert_eq!(counts, [1, 2, 2, 2, 2, 2, 5]);
        for kind in PieceKind::ALL {
            assert!(!can_add_piece(&board, Color::Red, kind));
        }
        assert!(can_add_piece(&Board::empty(), Color::Black, PieceKind::King));
    }
}
