use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::error::ChessError;
use crate::moves::Move;
use crate::piece::{Color, Piece, PieceType};
use crate::square::Square;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq, Hash)]
pub struct CastlingRights {
    pub white_kingside: bool,
    pub white_queenside: bool,
    pub black_kingside: bool,
    pub black_queenside: bool,
}

impl CastlingRights {
    pub fn all() -> Self {
        CastlingRights {
            white_kingside: true,
            white_queenside: true,
            black_kingside: true,
            black_queenside: true,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn kingside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_kingside,
            Color::Black => self.black_kingside,
        }
    }

    pub fn queenside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_queenside,
            Color::Black => self.black_queenside,
        }
    }

    pub(crate) fn revoke_all(&mut self, color: Color) {
        match color {
            Color::White => {
                self.white_kingside = false;
                self.white_queenside = false;
            }
            Color::Black => {
                self.black_kingside = false;
                self.black_queenside = false;
            }
        }
    }

    /// Drop the right tied to a rook's home corner, whether the rook left it
    /// or was captured on it.
    pub(crate) fn revoke_corner(&mut self, square: Square) {
        match (square.file(), square.rank()) {
            (0, 0) => self.white_queenside = false,
            (7, 0) => self.white_kingside = false,
            (0, 7) => self.black_queenside = false,
            (7, 7) => self.black_kingside = false,
            _ => {}
        }
    }

    fn bits(&self) -> [bool; 4] {
        [
            self.white_kingside,
            self.white_queenside,
            self.black_kingside,
            self.black_queenside,
        ]
    }
}

/// Repetition identity of a position: piece placement, side to move and
/// castling rights. The en-passant target and the clocks are not part of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionKey(pub u64);

/// splitmix64 finaliser; spreads small structured inputs over 64 bits.
fn mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// 64 optional pieces, indexed by `rank * 8 + file`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<Option<Piece>>", try_from = "Vec<Option<Piece>>")]
pub struct Board {
    squares: [Option<Piece>; 64],
}

impl From<Board> for Vec<Option<Piece>> {
    fn from(board: Board) -> Self {
        board.squares.to_vec()
    }
}

impl TryFrom<Vec<Option<Piece>>> for Board {
    type Error = ChessError;

    fn try_from(squares: Vec<Option<Piece>>) -> Result<Self, Self::Error> {
        let len = squares.len();
        let squares: [Option<Piece>; 64] =
            squares.try_into().map_err(|_| ChessError::InvalidSnapshot {
                reason: format!("board has {len} squares, expected 64"),
            })?;
        Ok(Board { squares })
    }
}

impl Index<Square> for Board {
    type Output = Option<Piece>;

    fn index(&self, square: Square) -> &Self::Output {
        &self.squares[square.index()]
    }
}

impl IndexMut<Square> for Board {
    fn index_mut(&mut self, square: Square) -> &mut Self::Output {
        &mut self.squares[square.index()]
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::standard()
    }
}

impl Board {
    /// Create an empty board with no pieces. Useful for setting up test positions.
    pub fn empty() -> Self {
        Board { squares: [None; 64] }
    }

    pub fn standard() -> Self {
        let back_rank = [
            PieceType::Rook,
            PieceType::Knight,
            PieceType::Bishop,
            PieceType::Queen,
            PieceType::King,
            PieceType::Bishop,
            PieceType::Knight,
            PieceType::Rook,
        ];

        let mut board = Board::empty();
        for (file, &piece_type) in back_rank.iter().enumerate() {
            let file = file as u8;
            board[Square::at(file, 0)] = Some(Piece::new(piece_type, Color::White));
            board[Square::at(file, 1)] = Some(Piece::new(PieceType::Pawn, Color::White));
            board[Square::at(file, 6)] = Some(Piece::new(PieceType::Pawn, Color::Black));
            board[Square::at(file, 7)] = Some(Piece::new(piece_type, Color::Black));
        }
        board
    }

    pub fn from_pieces(pieces: impl IntoIterator<Item = (Square, Piece)>) -> Self {
        let mut board = Board::empty();
        for (square, piece) in pieces {
            board[square] = Some(piece);
        }
        board
    }

    pub fn take(&mut self, square: Square) -> Option<Piece> {
        self[square].take()
    }

    /// Every occupied square, a1 to h8.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| self[sq].map(|p| (sq, p)))
    }

    pub fn count(&self, piece: Piece) -> usize {
        self.pieces().filter(|&(_, p)| p == piece).count()
    }

    pub fn find_king(&self, color: Color) -> Option<Square> {
        self.pieces()
            .find(|&(_, p)| p.piece_type == PieceType::King && p.color == color)
            .map(|(sq, _)| sq)
    }

    /// Relocate the piece on `mv.from` to `mv.to`, replacing whatever stood
    /// there. En passant, the castling rook and promotion are not handled.
    pub fn applying(&self, mv: &Move) -> Board {
        let mut copy = self.clone();
        if let Some(piece) = copy.take(mv.from) {
            copy[mv.to] = Some(piece);
        }
        copy
    }

    /// Like `applying`, but with every side effect of the move: the pawn
    /// taken en passant disappears, a castling rook jumps, a pawn reaching
    /// the last rank promotes (to a queen unless the move names a piece).
    pub fn simulate(&self, mv: &Move, en_passant_target: Option<Square>) -> Board {
        let mut next = self.clone();
        let Some(piece) = next.take(mv.from) else {
            return next;
        };
        if let Some(victim) = self.en_passant_victim(piece, mv, en_passant_target) {
            next.take(victim);
        }
        if let Some((rook_from, rook_to)) = castling_rook_move(piece, mv) {
            if let Some(rook) = next.take(rook_from) {
                next[rook_to] = Some(rook);
            }
        }
        next[mv.to] = Some(promoted_piece(piece, mv));
        next
    }

    /// Square of the pawn captured en passant by `mv`, if it is such a capture:
    /// a pawn moving diagonally onto the empty en-passant target.
    pub(crate) fn en_passant_victim(
        &self,
        piece: Piece,
        mv: &Move,
        en_passant_target: Option<Square>,
    ) -> Option<Square> {
        if piece.piece_type == PieceType::Pawn
            && Some(mv.to) == en_passant_target
            && mv.from.file() != mv.to.file()
            && self[mv.to].is_none()
        {
            Square::new(mv.to.file(), mv.from.rank())
        } else {
            None
        }
    }

    pub fn position_key(&self, side_to_move: Color, rights: &CastlingRights) -> PositionKey {
        let mut hash = 0u64;
        for (sq, piece) in self.pieces() {
            hash ^= mix(sq.index() as u64 * 16 + piece.code());
        }
        if side_to_move == Color::Black {
            hash ^= mix(1024);
        }
        for (bit, set) in rights.bits().iter().enumerate() {
            if *set {
                hash ^= mix(1025 + bit as u64);
            }
        }
        PositionKey(hash)
    }
}

/// Rook relocation implied by a king moving two files: `(from, to)`.
pub(crate) fn castling_rook_move(piece: Piece, mv: &Move) -> Option<(Square, Square)> {
    if piece.piece_type != PieceType::King || mv.from.rank() != mv.to.rank() {
        return None;
    }
    let rank = mv.from.rank();
    match mv.to.file() as i8 - mv.from.file() as i8 {
        2 => Some((Square::at(7, rank), Square::at(5, rank))),
        -2 => Some((Square::at(0, rank), Square::at(3, rank))),
        _ => None,
    }
}

/// What actually lands on `mv.to`.
pub(crate) fn promoted_piece(piece: Piece, mv: &Move) -> Piece {
    if piece.piece_type != PieceType::Pawn || mv.to.rank() != piece.color.promotion_rank() {
        return piece;
    }
    match mv.promotion {
        Some(kind) if kind.is_promotion_target() => Piece::new(kind, piece.color),
        _ => Piece::new(PieceType::Queen, piece.color),
    }
}
