//! Move legality, enumeration and check detection.

use crate::board::Board;
use crate::constants::{Color, Piece, PieceKind, BOARD_CELLS, BOARD_COLS, BOARD_ROWS};
use crate::r#move::{Move, Square};
use once_cell::sync::Lazy;

pub const fn sq_to_idx(r: usize, c: usize) -> usize {
    r * BOARD_COLS + c
}

fn offset(sq: Square, dr: isize, dc: isize) -> Option<Square> {
    let r = sq.0 as isize + dr;
    let c = sq.1 as isize + dc;
    if r >= 0 && r < BOARD_ROWS as isize && c >= 0 && c < BOARD_COLS as isize {
        Some((r as usize, c as usize))
    } else {
        None
    }
}

const ORTHOGONAL: [(isize, isize); 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];
const DIAGONAL: [(isize, isize); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
const ELEPHANT_STEPS: [(isize, isize); 4] = [(-2, -2), (-2, 2), (2, -2), (2, 2)];
const HORSE_STEPS: [(isize, isize); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

/// Every destination a piece kind could ever reach from each square,
/// ignoring colour and occupancy. Lists are sorted row-major so that
/// filtering them through `is_legal` yields the same sequence as sweeping
/// all 90 cells.
pub struct ReachTables {
    targets: Vec<Vec<Square>>,
}

impl ReachTables {
    fn new() -> Self {
        let mut targets = vec![Vec::new(); PieceKind::ALL.len() * BOARD_CELLS];

        for kind in PieceKind::ALL {
            for r in 0..BOARD_ROWS {
                for c in 0..BOARD_COLS {
                    let sq = (r, c);
                    let steps = |deltas: &[(isize, isize)]| -> Vec<Square> {
                        deltas
                            .iter()
                            .filter_map(|&(dr, dc)| offset(sq, dr, dc))
                            .collect()
                    };
                    let file: Vec<Square> = (0..BOARD_ROWS).map(|row| (row, c)).collect();
                    let rank: Vec<Square> = (0..BOARD_COLS).map(|col| (r, col)).collect();

                    let mut reach = match kind {
                        // One step, plus the whole file for the flying-general capture.
                        PieceKind::King => [steps(&ORTHOGONAL), file].concat(),
                        PieceKind::Advisor => steps(&DIAGONAL),
                        PieceKind::Elephant => steps(&ELEPHANT_STEPS),
                        PieceKind::Horse => steps(&HORSE_STEPS),
                        PieceKind::Chariot | PieceKind::Cannon => [file, rank].concat(),
                        PieceKind::Soldier => steps(&ORTHOGONAL),
                    };
                    reach.sort_unstable();
                    reach.dedup();
                    reach.retain(|&to| to != sq);
                    targets[kind.index() * BOARD_CELLS + sq_to_idx(r, c)] = reach;
                }
            }
        }

        Self { targets }
    }

    pub fn targets(&self, kind: PieceKind, sq: Square) -> &[Square] {
        &self.targets[kind.index() * BOARD_CELLS + sq_to_idx(sq.0, sq.1)]
    }
}

// Built once on first use.
pub static REACH_TABLES: Lazy<ReachTables> = Lazy::new(ReachTables::new);

/// Checks whether `from -> to` obeys the movement rules of the piece on `from`.
///
/// Moves that leave the mover's own King attacked are still legal: a game
/// ends when a King is captured.
pub fn is_legal(board: &Board, from: Square, to: Square) -> bool {
    if !Board::in_bounds(from.0, from.1) || !Board::in_bounds(to.0, to.1) || from == to {
        return false;
    }
    let Some(piece) = board.at(from) else {
        return false;
    };
    if let Some(target) = board.at(to) {
        if target.color == piece.color {
            return false;
        }
    }

    match piece.kind {
        PieceKind::King => validate_king(board, piece, from, to),
        PieceKind::Advisor => validate_advisor(piece, from, to),
        PieceKind::Elephant => validate_elephant(board, piece, from, to),
        PieceKind::Horse => validate_horse(board, from, to),
        PieceKind::Chariot => board.pieces_between(from, to) == Some(0),
        PieceKind::Cannon => validate_cannon(board, from, to),
        PieceKind::Soldier => validate_soldier(piece, from, to),
    }
}

fn deltas(from: Square, to: Square) -> (usize, usize) {
    (from.0.abs_diff(to.0), from.1.abs_diff(to.1))
}

fn validate_king(board: &Board, piece: Piece, from: Square, to: Square) -> bool {
    // Flying general: capture the opposing King straight down an open file.
    if from.1 == to.1
        && matches!(board.at(to), Some(target) if target.kind == PieceKind::King)
        && board.pieces_between(from, to) == Some(0)
    {
        return true;
    }
    if !piece.color.in_palace(to.0, to.1) {
        return false;
    }
    matches!(deltas(from, to), (1, 0) | (0, 1))
}

fn validate_advisor(piece: Piece, from: Square, to: Square) -> bool {
    piece.color.in_palace(to.0, to.1) && deltas(from, to) == (1, 1)
}

fn validate_elephant(board: &Board, piece: Piece, from: Square, to: Square) -> bool {
    if !piece.color.on_home_side(to.0) || deltas(from, to) != (2, 2) {
        return false;
    }
    let eye = ((from.0 + to.0) / 2, (from.1 + to.1) / 2);
    board.at(eye).is_none()
}

fn validate_horse(board: &Board, from: Square, to: Square) -> bool {
    let leg = match deltas(from, to) {
        (2, 1) => ((from.0 + to.0) / 2, from.1),
        (1, 2) => (from.0, (from.1 + to.1) / 2),
        _ => return false,
    };
    board.at(leg).is_none()
}

fn validate_cannon(board: &Board, from: Square, to: Square) -> bool {
    let screens = board.pieces_between(from, to);
    match board.at(to) {
        None => screens == Some(0),
        Some(_) => screens == Some(1),
    }
}

fn validate_soldier(piece: Piece, from: Square, to: Square) -> bool {
    let dr = to.0 as isize - from.0 as isize;
    let dc = from.1.abs_diff(to.1);
    if dr == piece.color.forward() && dc == 0 {
        return true;
    }
    // Sideways steps only once across the river.
    dr == 0 && dc == 1 && !piece.color.on_home_side(from.0)
}

/// Every legal move for `color`, origins and destinations both in row-major order.
pub fn generate_legal_moves(board: &Board, color: Color) -> Vec<Move> {
    let mut moves = Vec::with_capacity(64);
    for (from, piece) in board.pieces().filter(|(_, p)| p.color == color) {
        for &to in REACH_TABLES.targets(piece.kind, from) {
            if is_legal(board, from, to) {
                moves.push(Move::new(from, to));
            }
        }
    }
    moves
}

/// A side is in check when any opposing piece can move onto its King.
/// A side without a King counts as checked.
pub fn is_king_in_check(board: &Board, color: Color) -> bool {
    let Some(king_sq) = board.find_king(color) else {
        return true;
    };
    let opponent = color.opponent();
    board
        .pieces()
        .filter(|(_, piece)| piece.color == opponent)
        .any(|(from, _)| is_legal(board, from, king_sq))
}
