//! Chess rules engine: move generation, a reversible game state machine,
//! algebraic notation and a one-ply computer opponent.

pub mod board;
pub mod engine;
pub mod error;
pub mod game;
pub mod history;
pub mod movegen;
pub mod moves;
pub mod notation;
pub mod piece;
pub mod snapshot;
pub mod square;

pub use board::{Board, CastlingRights, PositionKey};
pub use engine::{AiConfig, Difficulty, Weights};
pub use error::{ChessError, Result};
pub use game::{GameEvent, GameResult, GameState, GameStatus};
pub use history::MoveRecord;
pub use moves::Move;
pub use piece::{Color, Piece, PieceType};
pub use snapshot::{ClockTimes, ControlMode, GameSnapshot};
pub use square::Square;
