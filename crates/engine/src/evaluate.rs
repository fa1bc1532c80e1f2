//! Evaluates a board position and returns a score.

use crate::constants::{Color, PieceKind, MATE_VALUE};
use crate::game::{GameState, Outcome};

// --- Positional Bonuses ---
// Indexed by advancement: rows travelled away from the own back rank.
pub const SOLDIER_BONUS: [i32; 10] = [0, 0, 0, 0, 0, 10, 20, 30, 30, 30];
pub const HORSE_BONUS: [i32; 10] = [0, 5, 10, 10, 10, 10, 10, 10, 5, 0];

pub fn position_bonus(kind: PieceKind, color: Color, row: usize) -> i32 {
    let advancement = color.advancement(row);
    match kind {
        PieceKind::Soldier => SOLDIER_BONUS[advancement],
        PieceKind::Horse => HORSE_BONUS[advancement],
        _ => 0,
    }
}

/// Material plus advancement bonuses, positive when `perspective` is ahead.
pub fn evaluate(state: &GameState, perspective: Color) -> i32 {
    let mut score = 0;
    for ((row, _), piece) in state.board().pieces() {
        let value = piece.kind.value() + position_bonus(piece.kind, piece.color, row);
        if piece.color == perspective {
            score += value;
        } else {
            score -= value;
        }
    }

    match state.winner() {
        Some(Outcome::Winner(color)) if color == perspective => score += MATE_VALUE,
        Some(Outcome::Winner(_)) => score -= MATE_VALUE,
        Some(Outcome::Draw) | None => {}
    }
    score
}
