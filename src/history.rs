use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::board::{CastlingRights, PositionKey};
use crate::game::GameResult;
use crate::moves::Move;
use crate::notation;
use crate::piece::{Color, Piece, PieceType};
use crate::square::Square;

/// How many times each position has occurred in the current game.
pub type RepetitionTable = BTreeMap<PositionKey, u32>;

/// Everything needed to take back one ply, plus the flags the move list
/// needs. Built once when the move is committed and never changed after.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// The move as played; `promotion` is set whenever a pawn promoted.
    pub mv: Move,
    pub moved_piece: Piece,
    pub captured_piece: Option<Piece>,
    /// Where the captured piece stood. Differs from `mv.to` only en passant.
    pub captured_square: Option<Square>,
    pub rook_move: Option<(Square, Square)>,
    pub promotion: Option<PieceType>,
    pub is_en_passant: bool,
    pub is_check: bool,
    pub is_checkmate: bool,
    pub disambiguate_file: bool,
    pub disambiguate_rank: bool,

    pub prior_castling_rights: CastlingRights,
    pub prior_side_to_move: Color,
    pub prior_result: Option<GameResult>,
    pub prior_half_move_clock: u32,
    pub prior_repetitions: RepetitionTable,
    pub prior_en_passant_target: Option<Square>,
}

impl MoveRecord {
    pub fn is_capture(&self) -> bool {
        self.captured_piece.is_some()
    }

    pub fn is_castle(&self) -> bool {
        self.rook_move.is_some()
    }

    pub fn mover(&self) -> Color {
        self.moved_piece.color
    }

    pub fn san(&self) -> String {
        notation::san(self)
    }

    /// Half-move clock once this move has been played.
    pub fn half_move_clock_after(&self) -> u32 {
        if self.moved_piece.piece_type == PieceType::Pawn || self.is_capture() {
            0
        } else {
            self.prior_half_move_clock + 1
        }
    }

    /// En-passant target created by this move (a pawn double step), if any.
    pub fn en_passant_target_after(&self) -> Option<Square> {
        double_step_target(self.moved_piece, &self.mv)
    }
}

/// The square a pawn skipped over, if `mv` is a double step.
pub(crate) fn double_step_target(piece: Piece, mv: &Move) -> Option<Square> {
    if piece.piece_type != PieceType::Pawn || mv.from.file() != mv.to.file() {
        return None;
    }
    if (mv.from.rank() as i8 - mv.to.rank() as i8).abs() != 2 {
        return None;
    }
    Square::new(mv.from.file(), (mv.from.rank() + mv.to.rank()) / 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    fn quiet_record(piece: Piece, from: &str, to: &str, prior_clock: u32) -> MoveRecord {
        MoveRecord {
            mv: Move::new(sq(from), sq(to)),
            moved_piece: piece,
            captured_piece: None,
            captured_square: None,
            rook_move: None,
            promotion: None,
            is_en_passant: false,
            is_check: false,
            is_checkmate: false,
            disambiguate_file: false,
            disambiguate_rank: false,
            prior_castling_rights: CastlingRights::all(),
            prior_side_to_move: piece.color,
            prior_result: None,
            prior_half_move_clock: prior_clock,
            prior_repetitions: RepetitionTable::new(),
            prior_en_passant_target: None,
        }
    }

    #[test]
    fn double_step_sets_the_skipped_square() {
        let pawn = Piece::new(PieceType::Pawn, Color::Black);
        let record = quiet_record(pawn, "d7", "d5", 7);
        assert_eq!(record.en_passant_target_after(), Some(sq("d6")));
        assert_eq!(record.half_move_clock_after(), 0);

        let single = quiet_record(pawn, "d7", "d6", 7);
        assert_eq!(single.en_passant_target_after(), None);
    }

    #[test]
    fn quiet_piece_move_advances_the_clock() {
        let knight = Piece::new(PieceType::Knight, Color::White);
        let mut record = quiet_record(knight, "g1", "f3", 11);
        assert_eq!(record.half_move_clock_after(), 12);
        assert_eq!(record.en_passant_target_after(), None);

        record.captured_piece = Some(Piece::new(PieceType::Pawn, Color::Black));
        record.captured_square = Some(sq("f3"));
        assert_eq!(record.half_move_clock_after(), 0);
    }
}
