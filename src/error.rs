//! Error types for the rules engine.
//!
//! Committing a move or undoing one never fails loudly: those commands are
//! no-ops on bad input. These errors are returned by the operations that
//! answer a caller's question (parsing, attempting a move, restoring a
//! saved game).

use thiserror::Error;

use crate::moves::Move;
use crate::square::Square;

#[derive(Error, Debug)]
pub enum ChessError {
    /// Text that does not name a square, e.g. "i9"
    #[error("Invalid square: {0:?}")]
    InvalidSquare(String),

    #[error("Invalid square coordinates: file {file}, rank {rank}")]
    InvalidCoordinates { file: i32, rank: i32 },

    /// Text that is not a UCI move, e.g. "e2e"
    #[error("Invalid move notation: {0:?}")]
    InvalidNotation(String),

    #[error("Unknown difficulty {0:?} (expected easy, medium or hard)")]
    InvalidDifficulty(String),

    #[error("No piece on {0}")]
    NoPieceAt(Square),

    #[error("Illegal move: {}", .0.to_uci())]
    IllegalMove(Move),

    #[error("The game is already over")]
    GameFinished,

    #[error("Invalid saved game: {reason}")]
    InvalidSnapshot { reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ChessError>;
