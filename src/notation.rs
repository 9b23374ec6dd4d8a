//! Standard algebraic notation for committed moves.

use crate::history::MoveRecord;
use crate::piece::Color;
use crate::square::Square;

pub fn san(record: &MoveRecord) -> String {
    let suffix = if record.is_checkmate {
        "#"
    } else if record.is_check {
        "+"
    } else {
        ""
    };

    if record.is_castle() {
        let castle = if record.mv.to.file() == 6 { "O-O" } else { "O-O-O" };
        return format!("{castle}{suffix}");
    }

    let from = record.mv.from;
    let mut out = String::new();
    match record.moved_piece.piece_type.letter() {
        Some(letter) => {
            out.push(letter);
            if record.disambiguate_file {
                out.push(from.file_char());
            }
            if record.disambiguate_rank {
                out.push(from.rank_char());
            }
        }
        // Pawn captures always name the origin file
        None if record.is_capture() => out.push(from.file_char()),
        None => {}
    }

    if record.is_capture() {
        out.push('x');
    }
    out.push_str(&record.mv.to.to_string());

    if let Some(letter) = record.promotion.and_then(|p| p.letter()) {
        out.push('=');
        out.push(letter);
    }
    out.push_str(suffix);
    out
}

/// Numbered move list, e.g. "1. e4 e5 2. Nf3".
pub fn move_list(records: &[MoveRecord]) -> String {
    let mut parts = Vec::with_capacity(records.len() + records.len() / 2 + 1);
    let mut number = 1;
    for (i, record) in records.iter().enumerate() {
        match record.mover() {
            Color::White => parts.push(format!("{number}. {}", san(record))),
            Color::Black if i == 0 => parts.push(format!("{number}... {}", san(record))),
            Color::Black => parts.push(san(record)),
        }
        if record.mover() == Color::Black {
            number += 1;
        }
    }
    parts.join(" ")
}

/// Which origin coordinates SAN must add, given the other same-type pieces
/// that could also reach the destination: `(file, rank)`.
pub(crate) fn disambiguation(from: Square, others: &[Square]) -> (bool, bool) {
    if others.is_empty() {
        (false, false)
    } else if others.iter().all(|o| o.file() != from.file()) {
        (true, false)
    } else if others.iter().all(|o| o.rank() != from.rank()) {
        (false, true)
    } else {
        (true, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, CastlingRights};
    use crate::game::GameState;
    use crate::piece::{Piece, PieceType};

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    fn play(game: &mut GameState, moves: &[&str]) -> Vec<String> {
        moves
            .iter()
            .map(|uci| {
                let mv = uci.parse().unwrap();
                game.execute_move(mv).expect("move should execute").san()
            })
            .collect()
    }

    #[test]
    fn opening_moves_and_pawn_capture() {
        let mut game = GameState::new();
        let sans = play(&mut game, &["e2e4", "d7d5", "e4d5", "d8d5", "b1c3"]);
        assert_eq!(sans, ["e4", "d5", "exd5", "Qxd5", "Nc3"]);
        assert_eq!(notation_list(&game), "1. e4 d5 2. exd5 Qxd5 3. Nc3");
    }

    fn notation_list(game: &GameState) -> String {
        move_list(game.history())
    }

    #[test]
    fn check_and_mate_suffixes() {
        // Scholar's mate
        let mut game = GameState::new();
        let sans = play(
            &mut game,
            &["e2e4", "e7e5", "f1c4", "b8c6", "d1h5", "g8f6", "h5f7"],
        );
        assert_eq!(sans.last().map(String::as_str), Some("Qxf7#"));

        let mut game = GameState::new();
        let sans = play(&mut game, &["e2e4", "f7f6", "d1h5"]);
        assert_eq!(sans.last().map(String::as_str), Some("Qh5+"));
    }

    #[test]
    fn castling_is_written_with_letters_o() {
        let board = Board::from_pieces([
            (sq("e1"), Piece::new(PieceType::King, Color::White)),
            (sq("h1"), Piece::new(PieceType::Rook, Color::White)),
            (sq("a1"), Piece::new(PieceType::Rook, Color::White)),
            (sq("e8"), Piece::new(PieceType::King, Color::Black)),
            (sq("a8"), Piece::new(PieceType::Rook, Color::Black)),
        ]);
        let mut game = GameState::from_position(board, Color::White, CastlingRights::all());
        let sans = play(&mut game, &["e1g1", "e8c8"]);
        assert_eq!(sans, ["O-O", "O-O-O"]);
    }

    #[test]
    fn file_then_rank_disambiguation() {
        let board = Board::from_pieces([
            (sq("e2"), Piece::new(PieceType::King, Color::White)),
            (sq("a1"), Piece::new(PieceType::Rook, Color::White)),
            (sq("h1"), Piece::new(PieceType::Rook, Color::White)),
            (sq("a5"), Piece::new(PieceType::Rook, Color::White)),
            (sq("h8"), Piece::new(PieceType::King, Color::Black)),
        ]);
        let mut game = GameState::from_position(board.clone(), Color::White, CastlingRights::none());
        // a1 and h1 both reach d1: the file tells them apart
        assert_eq!(play(&mut game, &["a1d1"]), ["Rad1"]);

        let mut game = GameState::from_position(board, Color::White, CastlingRights::none());
        // a1 and a5 both reach a3: same file, so the rank is needed
        assert_eq!(play(&mut game, &["a1a3"]), ["R1a3"]);
    }

    #[test]
    fn promotion_is_suffixed() {
        let board = Board::from_pieces([
            (sq("a1"), Piece::new(PieceType::King, Color::White)),
            (sq("e7"), Piece::new(PieceType::Pawn, Color::White)),
            (sq("d8"), Piece::new(PieceType::Rook, Color::Black)),
            (sq("h5"), Piece::new(PieceType::King, Color::Black)),
        ]);
        let mut game = GameState::from_position(board, Color::White, CastlingRights::none());
        let record = game.attempt_move(sq("e7"), sq("d8"), None).unwrap();
        assert_eq!(record.san(), "exd8=Q");
    }

    #[test]
    fn disambiguation_prefers_file() {
        assert_eq!(disambiguation(sq("b1"), &[]), (false, false));
        assert_eq!(disambiguation(sq("b1"), &[sq("f1")]), (true, false));
        assert_eq!(disambiguation(sq("a1"), &[sq("a5")]), (false, true));
        assert_eq!(disambiguation(sq("a1"), &[sq("a5"), sq("c1")]), (true, true));
    }
}
