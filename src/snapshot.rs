//! Serializable record of an in-progress or finished game.
//!
//! The snapshot holds only what a save file needs: the board, side to move,
//! castling rights, the full move history, the result, the clocks and the
//! control mode. The en-passant target, half-move clock and repetition table
//! are recovered from the last history record on restore.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::{Board, CastlingRights};
use crate::engine::Difficulty;
use crate::error::{ChessError, Result};
use crate::game::{GameResult, GameState};
use crate::history::{MoveRecord, RepetitionTable};
use crate::piece::{Color, Piece, PieceType};

/// Who controls which side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ControlMode {
    #[default]
    HumanVsHuman,
    HumanVsComputer { computer: Color, difficulty: Difficulty },
    /// Two humans at one device, board flipped for Black.
    FaceToFace,
}

/// Remaining time per side; `None` for untimed games.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockTimes {
    pub white: Option<Duration>,
    pub black: Option<Duration>,
}

impl ClockTimes {
    pub fn untimed() -> Self {
        ClockTimes::default()
    }

    pub fn both(remaining: Duration) -> Self {
        ClockTimes { white: Some(remaining), black: Some(remaining) }
    }

    pub fn remaining(&self, color: Color) -> Option<Duration> {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub board: Board,
    pub side_to_move: Color,
    pub castling_rights: CastlingRights,
    pub history: Vec<MoveRecord>,
    pub result: Option<GameResult>,
    pub clocks: ClockTimes,
    pub control_mode: ControlMode,
}

impl GameSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    fn validate(&self) -> Result<()> {
        for color in [Color::White, Color::Black] {
            let kings = self.board.count(Piece::new(PieceType::King, color));
            if kings != 1 {
                return Err(invalid(format!("{color} has {kings} kings")));
            }
        }

        if let Some(last) = self.history.last() {
            if last.mover().opposite() != self.side_to_move {
                return Err(invalid(format!(
                    "{} to move after a {} move",
                    self.side_to_move,
                    last.mover()
                )));
            }
        }
        if let Some(ply) = self
            .history
            .iter()
            .position(|r| r.prior_side_to_move != r.mover())
        {
            return Err(invalid(format!("record {} was played out of turn", ply + 1)));
        }
        Ok(())
    }
}

fn invalid(reason: String) -> ChessError {
    ChessError::InvalidSnapshot { reason }
}

impl GameState {
    pub fn snapshot(&self, clocks: ClockTimes, control_mode: ControlMode) -> GameSnapshot {
        GameSnapshot {
            board: self.board.clone(),
            side_to_move: self.side_to_move,
            castling_rights: self.castling_rights,
            history: self.history.clone(),
            result: self.result,
            clocks,
            control_mode,
        }
    }

    /// Rebuild a game from a snapshot. Undo works back through the whole
    /// restored history.
    pub fn restore(snapshot: &GameSnapshot) -> Result<GameState> {
        snapshot.validate()?;

        let mut game = GameState::from_position(
            snapshot.board.clone(),
            snapshot.side_to_move,
            snapshot.castling_rights,
        );
        if let Some(last) = snapshot.history.last() {
            let mut repetitions: RepetitionTable = last.prior_repetitions.clone();
            *repetitions.entry(game.position_key()).or_insert(0) += 1;

            game.en_passant_target = last.en_passant_target_after();
            game.half_move_clock = last.half_move_clock_after();
            game.repetitions = repetitions;
        }
        game.history = snapshot.history.clone();
        game.result = snapshot.result;

        debug!(plies = game.history.len(), result = ?game.result, "game restored");
        Ok(game)
    }
}
