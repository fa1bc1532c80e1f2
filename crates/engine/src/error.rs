//! Error types for the Xiangqi engine
//!
//! Rule violations are local and synchronous: a failed operation never
//! leaves a game half-updated.

use crate::r#move::Move;
use thiserror::Error;

/// Errors that can occur in the rules engine and its session layer
#[derive(Error, Debug)]
pub enum EngineError {
    /// The move fails the piece's movement rules
    #[error("Illegal move: {mv}")]
    IllegalMove { mv: Move },

    /// A move was attempted after the game ended
    #[error("Game is already over")]
    GameAlreadyOver,

    /// Setup-phase placement rule violation; advisory only
    #[error("Invalid placement: {reason}")]
    InvalidPlacement { reason: String },

    /// The board encoding could not be parsed
    #[error("Invalid board encoding: {reason}")]
    InvalidEncoding { reason: String },

    /// A serialized game snapshot could not be parsed
    #[error("Invalid game snapshot: {0}")]
    InvalidSnapshot(#[from] serde_json::Error),

    /// A budgeted search did not finish in time
    #[error("Search exceeded its budget of {budget_ms} ms")]
    SearchTimedOut { budget_ms: u128 },

    /// The blocking search task panicked or was cancelled
    #[error("Search task aborted")]
    SearchAborted,

    /// No session is registered under this id
    #[error("Unknown game id {id}")]
    UnknownGame { id: u64 },
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
