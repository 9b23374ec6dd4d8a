//! Move generation over a `Board` snapshot.
//!
//! Pseudo-legal moves follow piece movement shapes only; legal moves are the
//! pseudo-legal ones that do not leave the mover's king attacked, checked by
//! simulating each candidate on its own copy of the board. Castling is not
//! produced here: the game state owns castling rights and injects it.

use crate::board::Board;
use crate::moves::Move;
use crate::piece::{Color, Piece, PieceType};
use crate::square::Square;

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2), (2, 1), (2, -1), (1, -2),
    (-1, -2), (-2, -1), (-2, 1), (-1, 2),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1), (-1, 0), (-1, 1), (0, -1),
    (0, 1), (1, -1), (1, 0), (1, 1),
];

const ROOK_DIRECTIONS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

const QUEEN_DIRECTIONS: [(i8, i8); 8] = [
    (1, 0), (-1, 0), (0, 1), (0, -1),
    (1, 1), (1, -1), (-1, 1), (-1, -1),
];

impl Board {
    pub fn pseudo_legal_moves(
        &self,
        from: Square,
        piece: Piece,
        en_passant_target: Option<Square>,
    ) -> Vec<Move> {
        let mut moves = Vec::new();
        match piece.piece_type {
            PieceType::Pawn => self.pawn_moves(from, piece.color, en_passant_target, &mut moves),
            PieceType::Knight => self.step_moves(from, piece.color, &KNIGHT_OFFSETS, &mut moves),
            PieceType::Bishop => self.sliding_moves(from, piece.color, &BISHOP_DIRECTIONS, &mut moves),
            PieceType::Rook => self.sliding_moves(from, piece.color, &ROOK_DIRECTIONS, &mut moves),
            PieceType::Queen => self.sliding_moves(from, piece.color, &QUEEN_DIRECTIONS, &mut moves),
            PieceType::King => self.step_moves(from, piece.color, &KING_OFFSETS, &mut moves),
        }
        moves
    }

    fn pawn_moves(
        &self,
        from: Square,
        color: Color,
        en_passant_target: Option<Square>,
        moves: &mut Vec<Move>,
    ) {
        let dir = color.forward();

        // Single push, then double push from the starting rank
        if let Some(one) = from.offset(0, dir) {
            if self[one].is_none() {
                moves.push(Move::new(from, one));
                if from.rank() == color.pawn_start_rank() {
                    if let Some(two) = one.offset(0, dir) {
                        if self[two].is_none() {
                            moves.push(Move::new(from, two));
                        }
                    }
                }
            }
        }

        // Captures, including en passant onto the (empty) target square.
        // The target is only valid on the rank behind an enemy double push.
        let ep_rank = color.promotion_rank() as i8 - 2 * dir;
        for df in [-1i8, 1] {
            let Some(target) = from.offset(df, dir) else {
                continue;
            };
            let is_capture = self[target].map(|p| p.color != color).unwrap_or(false);
            let is_en_passant = en_passant_target == Some(target)
                && target.rank() as i8 == ep_rank
                && self[target].is_none();
            if is_capture || is_en_passant {
                moves.push(Move::new(from, target));
            }
        }
    }

    fn step_moves(&self, from: Square, color: Color, offsets: &[(i8, i8)], moves: &mut Vec<Move>) {
        for &(df, dr) in offsets {
            let Some(target) = from.offset(df, dr) else {
                continue;
            };
            if self[target].map(|p| p.color == color).unwrap_or(false) {
                continue;
            }
            moves.push(Move::new(from, target));
        }
    }

    fn sliding_moves(
        &self,
        from: Square,
        color: Color,
        directions: &[(i8, i8)],
        moves: &mut Vec<Move>,
    ) {
        for &(df, dr) in directions {
            let mut current = from.offset(df, dr);
            while let Some(target) = current {
                if let Some(blocker) = self[target] {
                    if blocker.color != color {
                        moves.push(Move::new(from, target));
                    }
                    break;
                }
                moves.push(Move::new(from, target));
                current = target.offset(df, dr);
            }
        }
    }

    /// Pseudo-legal moves of the piece on `from` that keep its own king safe.
    pub fn legal_moves(
        &self,
        from: Square,
        piece: Piece,
        en_passant_target: Option<Square>,
    ) -> Vec<Move> {
        self.pseudo_legal_moves(from, piece, en_passant_target)
            .into_iter()
            .filter(|mv| {
                !self
                    .simulate(mv, en_passant_target)
                    .is_king_in_check(piece.color)
            })
            .collect()
    }

    /// Legal moves of every piece of `color` (castling excluded).
    pub fn legal_moves_for(&self, color: Color, en_passant_target: Option<Square>) -> Vec<Move> {
        self.pieces()
            .filter(|&(_, p)| p.color == color)
            .flat_map(|(sq, p)| self.legal_moves(sq, p, en_passant_target))
            .collect()
    }

    /// Rewrite a pawn move onto the last rank to promote to a queen.
    pub fn with_default_promotion(&self, mv: Move) -> Move {
        match self[mv.from] {
            Some(p)
                if p.piece_type == PieceType::Pawn
                    && mv.to.rank() == p.color.promotion_rank()
                    && mv.promotion.is_none() =>
            {
                mv.with_promotion(PieceType::Queen)
            }
            _ => mv,
        }
    }

    /// Whether any piece of `attacker` attacks `square`. Pawns attack their
    /// two forward diagonals whether or not anything stands there; every
    /// other piece attacks the squares its pseudo-legal moves reach.
    pub fn would_square_be_attacked(&self, square: Square, attacker: Color) -> bool {
        self.pieces()
            .filter(|&(_, p)| p.color == attacker)
            .any(|(from, piece)| {
                if piece.piece_type == PieceType::Pawn {
                    let dir = piece.color.forward();
                    return from.offset(-1, dir) == Some(square)
                        || from.offset(1, dir) == Some(square);
                }
                self.pseudo_legal_moves(from, piece, None)
                    .iter()
                    .any(|mv| mv.to == square)
            })
    }

    pub fn is_king_in_check(&self, color: Color) -> bool {
        match self.find_king(color) {
            Some(king) => self.would_square_be_attacked(king, color.opposite()),
            None => false,
        }
    }

    pub fn has_any_legal_moves(&self, color: Color, en_passant_target: Option<Square>) -> bool {
        self.pieces()
            .filter(|&(_, p)| p.color == color)
            .any(|(sq, p)| !self.legal_moves(sq, p, en_passant_target).is_empty())
    }

    pub fn is_checkmate(&self, color: Color, en_passant_target: Option<Square>) -> bool {
        self.is_king_in_check(color) && !self.has_any_legal_moves(color, en_passant_target)
    }

    pub fn is_stalemate(&self, color: Color, en_passant_target: Option<Square>) -> bool {
        !self.is_king_in_check(color) && !self.has_any_legal_moves(color, en_passant_target)
    }

    /// Other pieces of the same type and colour as the one on `from` that
    /// could also legally move to `target`.
    pub fn find_ambiguous_pieces(
        &self,
        from: Square,
        target: Square,
        en_passant_target: Option<Square>,
    ) -> Vec<Square> {
        let Some(piece) = self[from] else {
            return Vec::new();
        };
        self.pieces()
            .filter(|&(sq, p)| sq != from && p == piece)
            .filter(|&(sq, p)| {
                self.legal_moves(sq, p, en_passant_target)
                    .iter()
                    .any(|mv| mv.to == target)
            })
            .map(|(sq, _)| sq)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    fn piece(piece_type: PieceType, color: Color) -> Piece {
        Piece::new(piece_type, color)
    }

    fn targets(moves: &[Move]) -> Vec<String> {
        let mut names: Vec<String> = moves.iter().map(|m| m.to.to_string()).collect();
        names.sort();
        names
    }

    #[test]
    fn opening_position_has_twenty_moves() {
        let board = Board::standard();
        assert_eq!(board.legal_moves_for(Color::White, None).len(), 20);
        assert_eq!(board.legal_moves_for(Color::Black, None).len(), 20);
    }

    #[test]
    fn pawn_double_push_needs_both_squares_empty() {
        let mut board = Board::standard();
        let pawn = piece(PieceType::Pawn, Color::White);
        assert_eq!(targets(&board.pseudo_legal_moves(sq("e2"), pawn, None)), ["e3", "e4"]);

        board[sq("e4")] = Some(piece(PieceType::Knight, Color::Black));
        assert_eq!(targets(&board.pseudo_legal_moves(sq("e2"), pawn, None)), ["e3"]);

        board[sq("e3")] = Some(piece(PieceType::Knight, Color::Black));
        assert!(board.pseudo_legal_moves(sq("e2"), pawn, None).is_empty());
    }

    #[test]
    fn pawn_captures_only_enemy_pieces_diagonally() {
        let board = Board::from_pieces([
            (sq("d4"), piece(PieceType::Pawn, Color::Black)),
            (sq("c3"), piece(PieceType::Knight, Color::White)),
            (sq("e3"), piece(PieceType::Knight, Color::Black)),
        ]);
        let moves = board.pseudo_legal_moves(sq("d4"), piece(PieceType::Pawn, Color::Black), None);
        assert_eq!(targets(&moves), ["c3", "d3"]);
    }

    #[test]
    fn en_passant_target_must_sit_behind_an_enemy_double_push() {
        let board = Board::from_pieces([
            (sq("e5"), piece(PieceType::Pawn, Color::White)),
            (sq("d5"), piece(PieceType::Pawn, Color::Black)),
        ]);
        let pawn = piece(PieceType::Pawn, Color::White);
        let moves = board.pseudo_legal_moves(sq("e5"), pawn, Some(sq("d6")));
        assert_eq!(targets(&moves), ["d6", "e6"]);

        // A target on the wrong rank is ignored.
        let board = Board::from_pieces([(sq("e2"), pawn)]);
        let moves = board.pseudo_legal_moves(sq("e2"), pawn, Some(sq("d3")));
        assert_eq!(targets(&moves), ["e3", "e4"]);
    }

    #[test]
    fn sliders_stop_at_blockers() {
        let board = Board::from_pieces([
            (sq("a1"), piece(PieceType::Rook, Color::White)),
            (sq("a3"), piece(PieceType::Pawn, Color::White)),
            (sq("c1"), piece(PieceType::Bishop, Color::Black)),
        ]);
        let moves = board.pseudo_legal_moves(sq("a1"), piece(PieceType::Rook, Color::White), None);
        assert_eq!(targets(&moves), ["a2", "b1", "c1"]);
    }

    #[test]
    fn knight_in_the_corner_has_two_moves() {
        let board = Board::from_pieces([(sq("h8"), piece(PieceType::Knight, Color::Black))]);
        let moves = board.pseudo_legal_moves(sq("h8"), piece(PieceType::Knight, Color::Black), None);
        assert_eq!(targets(&moves), ["f7", "g6"]);
    }

    #[test]
    fn pinned_piece_cannot_leave_the_line() {
        let board = Board::from_pieces([
            (sq("e1"), piece(PieceType::King, Color::White)),
            (sq("e2"), piece(PieceType::Rook, Color::White)),
            (sq("e8"), piece(PieceType::Rook, Color::Black)),
            (sq("a8"), piece(PieceType::King, Color::Black)),
        ]);
        let moves = board.legal_moves(sq("e2"), piece(PieceType::Rook, Color::White), None);
        assert!(moves.iter().all(|m| m.to.file() == 4), "{moves:?}");
        assert!(moves.iter().any(|m| m.to == sq("e8")));
    }

    #[test]
    fn en_passant_that_exposes_the_king_is_illegal() {
        // King and both pawns on the fifth rank with a black rook behind:
        // removing both pawns would open the rank.
        let board = Board::from_pieces([
            (sq("a5"), piece(PieceType::King, Color::White)),
            (sq("e5"), piece(PieceType::Pawn, Color::White)),
            (sq("d5"), piece(PieceType::Pawn, Color::Black)),
            (sq("h5"), piece(PieceType::Rook, Color::Black)),
            (sq("h8"), piece(PieceType::King, Color::Black)),
        ]);
        let moves = board.legal_moves(sq("e5"), piece(PieceType::Pawn, Color::White), Some(sq("d6")));
        assert_eq!(targets(&moves), ["e6"]);
    }

    #[test]
    fn pawns_attack_diagonals_even_when_empty() {
        let board = Board::from_pieces([(sq("e4"), piece(PieceType::Pawn, Color::White))]);
        assert!(board.would_square_be_attacked(sq("d5"), Color::White));
        assert!(board.would_square_be_attacked(sq("f5"), Color::White));
        assert!(!board.would_square_be_attacked(sq("e5"), Color::White));
    }

    #[test]
    fn checkmate_in_the_corner() {
        let board = Board::from_pieces([
            (sq("h6"), piece(PieceType::King, Color::White)),
            (sq("g6"), piece(PieceType::Queen, Color::White)),
            (sq("h8"), piece(PieceType::King, Color::Black)),
        ]);
        assert!(!board.is_checkmate(Color::Black, None));

        let after = board.applying(&Move::new(sq("g6"), sq("g7")));
        assert!(after.is_king_in_check(Color::Black));
        assert!(after.is_checkmate(Color::Black, None));
        assert!(!after.is_stalemate(Color::Black, None));
    }

    #[test]
    fn stalemate_in_the_corner() {
        let board = Board::from_pieces([
            (sq("c6"), piece(PieceType::King, Color::White)),
            (sq("c7"), piece(PieceType::Queen, Color::White)),
            (sq("a8"), piece(PieceType::King, Color::Black)),
        ]);
        assert!(!board.is_king_in_check(Color::Black));
        assert!(!board.has_any_legal_moves(Color::Black, None));
        assert!(board.is_stalemate(Color::Black, None));
        assert!(!board.is_checkmate(Color::Black, None));
    }

    #[test]
    fn ambiguous_knights_are_found() {
        let board = Board::from_pieces([
            (sq("e1"), piece(PieceType::King, Color::White)),
            (sq("b1"), piece(PieceType::Knight, Color::White)),
            (sq("f2"), piece(PieceType::Knight, Color::White)),
            (sq("e8"), piece(PieceType::King, Color::Black)),
        ]);
        assert_eq!(board.find_ambiguous_pieces(sq("b1"), sq("d2"), None), vec![]);
        assert_eq!(board.find_ambiguous_pieces(sq("b1"), sq("c3"), None), vec![]);
        assert_eq!(board.find_ambiguous_pieces(sq("f2"), sq("d3"), None), vec![]);

        let board = Board::from_pieces([
            (sq("e1"), piece(PieceType::King, Color::White)),
            (sq("b1"), piece(PieceType::Knight, Color::White)),
            (sq("f1"), piece(PieceType::Knight, Color::White)),
            (sq("e8"), piece(PieceType::King, Color::Black)),
        ]);
        assert_eq!(board.find_ambiguous_pieces(sq("b1"), sq("d2"), None), vec![sq("f1")]);
    }

    #[test]
    fn default_promotion_is_a_queen() {
        let board = Board::from_pieces([(sq("b7"), piece(PieceType::Pawn, Color::White))]);
        let mv = board.with_default_promotion(Move::new(sq("b7"), sq("b8")));
        assert_eq!(mv.promotion, Some(PieceType::Queen));
        let quiet = Board::standard().with_default_promotion(Move::new(sq("b2"), sq("b3")));
        assert_eq!(quiet.promotion, None);
    }
}
