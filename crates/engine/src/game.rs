//! Game state: the board plus turn, result and history bookkeeping.

use crate::board::Board;
use crate::constants::{Color, Piece, PieceKind};
use crate::error::{EngineError, EngineResult};
use crate::move_gen;
use crate::r#move::{Move, MoveRecord, Square};
use crate::setup::{self, Placement};
use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const DEFAULT_POSITION_HISTORY: usize = 12;

/// Occurrences within the window at which a position counts as repeated.
pub const REPETITION_THRESHOLD: usize = 2;
/// Occurrences suggesting a perpetual check or chase.
pub const PERPETUAL_THRESHOLD: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Winner(Color),
    Draw,
}

/// The complete state of one game.
///
/// Mutated only through [`GameState::apply_move`], [`GameState::undo`] and
/// the terminal helpers. Not synchronised: callers serialise access.
#[derive(Debug, Clone)]
pub struct GameState {
    board: Board,
    current_player: Color,
    game_over: bool,
    winner: Option<Outcome>,
    move_history: Vec<MoveRecord>,
    position_history: VecDeque<String>,
    history_capacity: usize,
}

/// Serializable form of a game, used to hand state to and from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub board: String,
    pub current_player: Color,
    pub game_over: bool,
    pub winner: Option<Outcome>,
    #[serde(default)]
    pub move_history: Vec<MoveRecord>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// A game in the standard opening layout with Red to move.
    pub fn new() -> Self {
        Self::from_board(Board::standard(), Color::Red)
    }

    /// A game on an arbitrary board with empty histories.
    pub fn from_board(board: Board, first_to_move: Color) -> Self {
        Self {
            board,
            current_player: first_to_move,
            game_over: false,
            winner: None,
            move_history: Vec::new(),
            position_history: VecDeque::with_capacity(DEFAULT_POSITION_HISTORY),
            history_capacity: DEFAULT_POSITION_HISTORY,
        }
    }

    /// Sets the size of the repetition window. Existing entries beyond it are dropped.
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity.max(1);
        while self.position_history.len() > self.history_capacity {
            self.position_history.pop_front();
        }
        self
    }

    /// Builds a game from a free-setup placement list.
    ///
    /// Placement rules are advisory: violations are logged and the piece is
    /// placed anyway. Off-board entries are skipped.
    pub fn from_placements(placements: &[Placement], first_to_move: Color) -> Self {
        let mut board = Board::empty();
        for p in placements {
            if !Board::in_bounds(p.row, p.col) {
                warn!("Skipping off-board placement {:?}", p);
                continue;
            }
            if let Err(e) = setup::validate_placement(p.kind, p.color, p.row, p.col) {
                warn!("{} at ({},{})", e, p.row, p.col);
            }
            board.set((p.row, p.col), Some(Piece::new(p.color, p.kind)));
        }
        Self::from_board(board, first_to_move)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_player(&self) -> Color {
        self.current_player
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn winner(&self) -> Option<Outcome> {
        self.winner
    }

    pub fn move_history(&self) -> &[MoveRecord] {
        &self.move_history
    }

    pub fn position_history(&self) -> &VecDeque<String> {
        &self.position_history
    }

    pub fn history_capacity(&self) -> usize {
        self.history_capacity
    }

    pub fn is_legal(&self, from: Square, to: Square) -> bool {
        move_gen::is_legal(&self.board, from, to)
    }

    /// Validates, then applies a move for whichever side owns the origin piece.
    pub fn apply_move(&mut self, from: Square, to: Square) -> EngineResult<()> {
        if self.game_over {
            return Err(EngineError::GameAlreadyOver);
        }
        let mv = Move::new(from, to);
        if !self.is_legal(from, to) {
            return Err(EngineError::IllegalMove { mv });
        }
        let Some(piece) = self.board.set(from, None) else {
            return Err(EngineError::IllegalMove { mv });
        };
        let captured = self.board.set(to, Some(piece));

        self.move_history.push(MoveRecord {
            mv,
            piece,
            captured,
            turn_before: self.current_player,
        });

        let encoding = self.board.encode();
        self.position_history.push_back(encoding);
        if self.position_history.len() > self.history_capacity {
            self.position_history.pop_front();
        }

        if let Some(taken) = captured {
            if taken.kind == PieceKind::King {
                self.game_over = true;
                self.winner = Some(Outcome::Winner(piece.color));
                info!("{} captured the {} king with {}", piece.color, taken.color, mv);
            }
        }

        self.current_player = self.current_player.opponent();
        trace!("{} played {}", piece.color, mv);
        Ok(())
    }

    /// Takes back the last move. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(record) = self.move_history.pop() else {
            return false;
        };
        self.board.set(record.mv.from_sq(), Some(record.piece));
        self.board.set(record.mv.to_sq(), record.captured);
        self.current_player = record.turn_before;
        if self.game_over || self.winner.is_some() {
            self.game_over = false;
            self.winner = None;
        }
        self.position_history.pop_back();
        debug!("Undid {}", record.mv);
        true
    }

    /// Ends the game with `color` conceding.
    pub fn resign(&mut self, color: Color) -> EngineResult<()> {
        if self.game_over {
            return Err(EngineError::GameAlreadyOver);
        }
        self.game_over = true;
        self.winner = Some(Outcome::Winner(color.opponent()));
        info!("{} resigned", color);
        Ok(())
    }

    /// Ends the game as a draw, once both sides have agreed.
    pub fn agree_draw(&mut self) -> EngineResult<()> {
        if self.game_over {
            return Err(EngineError::GameAlreadyOver);
        }
        self.game_over = true;
        self.winner = Some(Outcome::Draw);
        info!("Game drawn by agreement");
        Ok(())
    }

    pub fn encode(&self) -> String {
        self.board.encode()
    }

    /// Occurrences of `encoding` within the recent-position window.
    pub fn is_repeated(&self, encoding: &str) -> usize {
        self.position_history
            .iter()
            .filter(|seen| seen.as_str() == encoding)
            .count()
    }

    pub fn is_repetition(&self, encoding: &str) -> bool {
        self.is_repeated(encoding) >= REPETITION_THRESHOLD
    }

    pub fn is_perpetual(&self, encoding: &str) -> bool {
        self.is_repeated(encoding) >= PERPETUAL_THRESHOLD
    }

    pub fn legal_moves(&self, color: Color) -> Vec<Move> {
        move_gen::generate_legal_moves(&self.board, color)
    }

    pub fn is_in_check(&self, color: Color) -> bool {
        move_gen::is_king_in_check(&self.board, color)
    }

    /// Occupied cells as a placement list, row-major.
    pub fn to_placement_list(&self) -> Vec<Placement> {
        self.board
            .pieces()
            .map(|((row, col), piece)| Placement {
                row,
                col,
                color: piece.color,
                kind: piece.kind,
            })
            .collect()
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            board: self.encode(),
            current_player: self.current_player,
            game_over: self.game_over,
            winner: self.winner,
            move_history: self.move_history.clone(),
        }
    }

    /// Rehydrates a game. The repetition window starts empty.
    pub fn from_snapshot(snapshot: &GameSnapshot) -> EngineResult<Self> {
        let board = Board::decode(&snapshot.board)?;
        let mut state = Self::from_board(board, snapshot.current_player);
        state.game_over = snapshot.game_over;
        state.winner = snapshot.winner;
        state.move_history = snapshot.move_history.clone();
        Ok(state)
    }

    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string(&self.snapshot())?)
    }

    pub fn from_json(json: &str) -> EngineResult<Self> {
        let snapshot: GameSnapshot = serde_json::from_str(json)?;
        Self::from_snapshot(&snapshot)
    }
}
