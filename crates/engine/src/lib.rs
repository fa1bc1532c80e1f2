//! Xiangqi rules engine and move search.
//!
//! The rules side owns board state and legality; the search side picks
//! moves by simulating them through the rules on cloned states.

pub mod board;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod evaluate;
pub mod game;
pub mod move_gen;
pub mod r#move;
pub mod session;
pub mod setup;

pub use board::Board;
pub use config::EngineConfig;
pub use constants::{Color, Piece, PieceKind};
pub use engine::{search_with_budget, Engine};
pub use error::{EngineError, EngineResult};
pub use game::{GameSnapshot, GameState, Outcome};
pub use r#move::{Move, MoveRecord, Square};
pub use session::{GameId, GameKind, GameRegistry, GameSession};
pub use setup::{can_add_piece, count_pieces, validate_placement, Placement};

pub fn new_standard_game() -> GameState {
    GameState::new()
}

pub fn new_custom_game(placements: &[Placement], first_to_move: Color) -> GameState {
    GameState::from_placements(placements, first_to_move)
}

pub fn apply_move(state: &mut GameState, from: Square, to: Square) -> EngineResult<()> {
    state.apply_move(from, to)
}

pub fn undo(state: &mut GameState) -> bool {
    state.undo()
}

pub fn legal_moves(state: &GameState, color: Color) -> Vec<Move> {
    state.legal_moves(color)
}

pub fn is_in_check(state: &GameState, color: Color) -> bool {
    state.is_in_check(color)
}

pub fn encode(state: &GameState) -> String {
    state.encode()
}

pub fn decode(encoding: &str) -> EngineResult<Board> {
    Board::decode(encoding)
}

/// Searches with the default configuration and a fresh random seed.
pub fn best_move(state: &GameState, color: Color, force_break: bool) -> Option<Move> {
    Engine::default().best_move(state, color, force_break)
}

pub fn should_accept_draw(state: &GameState, color: Color) -> bool {
    Engine::default().should_accept_draw(state, color)
}

pub fn to_placement_list(state: &GameState) -> Vec<Placement> {
    state.to_placement_list()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_game_is_quiet() {
        let game = new_standard_game();
        assert_eq!(legal_moves(&game, Color::Red).len(), 44);
        assert!(!is_in_check(&game, Color::Red));
        assert!(!is_in_check(&game, Color::Black));
    }

    #[test]
    fn test_custom_game_keeps_advisory_violations() {
        let placements = [
            Placement { row: 0, col: 4, color: Color::Black, kind: PieceKind::King },
            // Outside the palace: warned about, still placed.
            Placement { row: 5, col: 4, color: Color::Red, kind: PieceKind::King },
            Placement { row: 12, col: 0, color: Color::Red, kind: PieceKind::Chariot },
        ];
        let game = new_custom_game(&placements, Color::Black);
        assert_eq!(game.current_player(), Color::Black);
        assert_eq!(to_placement_list(&game).len(), 2);
        assert_eq!(encode(&game), "4k4/9/9/9/9/4K4/9/9/9/9");
    }

    #[test]
    fn test_apply_undo_through_free_functions() {
        let mut game = new_standard_game();
        apply_move(&mut game, (6, 4), (5, 4)).unwrap();
        assert_eq!(decode(&encode(&game)).unwrap(), *game.board());
        assert!(undo(&mut game));
        assert!(!undo(&mut game));
    }
}
