// =============================================================================
// Game state machine
//
// Owns the authoritative board together with the bookkeeping the board alone
// cannot know: side to move, castling rights, en-passant target, half-move
// clock and the repetition table. Every committed ply produces a MoveRecord
// holding the prior value of each of those fields, so undo replays the
// snapshot instead of re-deriving anything.
//
// Invalid commands (moving from an empty square, moving once the game is
// over, undoing with no history) are no-ops. Observers poll `take_events()`.
// =============================================================================

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::board::{castling_rook_move, promoted_piece, Board, CastlingRights, PositionKey};
use crate::engine::{self, AiConfig};
use crate::error::{ChessError, Result};
use crate::history::{double_step_target, MoveRecord, RepetitionTable};
use crate::moves::Move;
use crate::notation;
use crate::piece::{Color, Piece, PieceType};
use crate::square::Square;

/// Plies without a pawn move or capture before the game is drawn.
pub const FIFTY_MOVE_PLIES: u32 = 100;

/// Occurrences of one position that draw the game.
pub const REPETITION_LIMIT: u32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    Checkmate { winner: Color },
    Stalemate,
    DrawByFiftyMoveRule,
    DrawByThreefoldRepetition,
    Timeout { winner: Color },
    Resignation { winner: Color },
}

impl GameResult {
    pub fn winner(&self) -> Option<Color> {
        match *self {
            GameResult::Checkmate { winner }
            | GameResult::Timeout { winner }
            | GameResult::Resignation { winner } => Some(winner),
            _ => None,
        }
    }

    pub fn is_draw(&self) -> bool {
        self.winner().is_none()
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameResult::Checkmate { winner } => write!(f, "{winner} wins by checkmate"),
            GameResult::Stalemate => write!(f, "Draw by stalemate"),
            GameResult::DrawByFiftyMoveRule => write!(f, "Draw by the fifty-move rule"),
            GameResult::DrawByThreefoldRepetition => write!(f, "Draw by threefold repetition"),
            GameResult::Timeout { winner } => write!(f, "{winner} wins on time"),
            GameResult::Resignation { winner } => write!(f, "{winner} wins by resignation"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    Finished(GameResult),
}

/// Notifications for observers, drained with `GameState::take_events`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    MoveExecuted { ply: usize, mv: Move, san: String },
    MoveUndone { ply: usize, mv: Move },
    GameOver(GameResult),
    Reset,
}

#[derive(Clone, Debug)]
pub struct GameState {
    pub(crate) board: Board,
    pub(crate) side_to_move: Color,
    pub(crate) castling_rights: CastlingRights,
    pub(crate) en_passant_target: Option<Square>,
    pub(crate) half_move_clock: u32,
    pub(crate) repetitions: RepetitionTable,
    pub(crate) result: Option<GameResult>,
    pub(crate) history: Vec<MoveRecord>,
    selected: Option<Square>,
    staged: Option<Move>,
    events: Vec<GameEvent>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// Standard starting position, White to move.
    pub fn new() -> Self {
        Self::from_position(Board::standard(), Color::White, CastlingRights::all())
    }

    /// A game starting from an arbitrary position. The position counts as
    /// its own first occurrence for repetition purposes.
    pub fn from_position(board: Board, side_to_move: Color, castling_rights: CastlingRights) -> Self {
        let mut repetitions = RepetitionTable::new();
        repetitions.insert(board.position_key(side_to_move, &castling_rights), 1);
        GameState {
            board,
            side_to_move,
            castling_rights,
            en_passant_target: None,
            half_move_clock: 0,
            repetitions,
            result: None,
            history: Vec::new(),
            selected: None,
            staged: None,
            events: Vec::new(),
        }
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn castling_rights(&self) -> CastlingRights {
        self.castling_rights
    }

    pub fn en_passant_target(&self) -> Option<Square> {
        self.en_passant_target
    }

    pub fn half_move_clock(&self) -> u32 {
        self.half_move_clock
    }

    pub fn position_key(&self) -> PositionKey {
        self.board.position_key(self.side_to_move, &self.castling_rights)
    }

    /// Occurrences so far of the current position.
    pub fn repetition_count(&self) -> u32 {
        self.repetitions.get(&self.position_key()).copied().unwrap_or(0)
    }

    pub fn repetitions(&self) -> &RepetitionTable {
        &self.repetitions
    }

    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    pub fn status(&self) -> GameStatus {
        match self.result {
            Some(result) => GameStatus::Finished(result),
            None => GameStatus::InProgress,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.result.is_some()
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    pub fn last_move(&self) -> Option<&MoveRecord> {
        self.history.last()
    }

    pub fn san_history(&self) -> Vec<String> {
        self.history.iter().map(notation::san).collect()
    }

    /// Move number of the side to move, counted from 1.
    pub fn full_move_number(&self) -> u32 {
        1 + self.history.iter().filter(|r| r.mover() == Color::Black).count() as u32
    }

    pub fn is_in_check(&self) -> bool {
        self.board.is_king_in_check(self.side_to_move)
    }

    pub fn selected_square(&self) -> Option<Square> {
        self.selected
    }

    pub fn staged_move(&self) -> Option<Move> {
        self.staged
    }

    /// Legal moves of the piece on `from`, if it belongs to the side to move.
    /// Pawn moves to the last rank promote to a queen; king moves include
    /// castling when it is available.
    pub fn legal_moves(&self, from: Square) -> Vec<Move> {
        if self.result.is_some() {
            return Vec::new();
        }
        let Some(piece) = self.board[from] else {
            return Vec::new();
        };
        if piece.color != self.side_to_move {
            return Vec::new();
        }

        let mut moves: Vec<Move> = self
            .board
            .legal_moves(from, piece, self.en_passant_target)
            .into_iter()
            .map(|mv| self.board.with_default_promotion(mv))
            .collect();
        if piece.piece_type == PieceType::King {
            moves.extend(self.castling_moves(from, piece.color));
        }
        moves
    }

    pub fn all_legal_moves(&self) -> Vec<Move> {
        self.board
            .pieces()
            .filter(|&(_, p)| p.color == self.side_to_move)
            .flat_map(|(sq, _)| self.legal_moves(sq))
            .collect()
    }

    fn castling_moves(&self, from: Square, color: Color) -> Vec<Move> {
        let rank = color.back_rank();
        if from != Square::at(4, rank) || self.board.is_king_in_check(color) {
            return Vec::new();
        }

        let enemy = color.opposite();
        let own_rook = Some(Piece::new(PieceType::Rook, color));
        let empty = |files: &[u8]| files.iter().all(|&f| self.board[Square::at(f, rank)].is_none());
        let safe = |files: &[u8]| {
            files
                .iter()
                .all(|&f| !self.board.would_square_be_attacked(Square::at(f, rank), enemy))
        };

        let mut moves = Vec::new();
        if self.castling_rights.kingside(color)
            && self.board[Square::at(7, rank)] == own_rook
            && empty(&[5, 6])
            && safe(&[5, 6])
        {
            moves.push(Move::new(from, Square::at(6, rank)));
        }
        if self.castling_rights.queenside(color)
            && self.board[Square::at(0, rank)] == own_rook
            && empty(&[1, 2, 3])
            && safe(&[3, 2])
        {
            moves.push(Move::new(from, Square::at(2, rank)));
        }
        moves
    }

    // ---------------------------------------------------------------------
    // Commands
    // ---------------------------------------------------------------------

    /// Commit `mv`. The caller is expected to have taken it from
    /// `legal_moves`; this only guards against an empty origin square, a
    /// piece of the wrong colour and a finished game, and does nothing then.
    pub fn execute_move(&mut self, mv: Move) -> Option<&MoveRecord> {
        if let Some(result) = self.result {
            debug!(%mv, %result, "ignoring move: game is over");
            return None;
        }
        let Some(piece) = self.board[mv.from] else {
            debug!(%mv, "ignoring move: no piece on origin square");
            return None;
        };
        if piece.color != self.side_to_move {
            debug!(%mv, "ignoring move: not this side's turn");
            return None;
        }

        let prior_en_passant_target = self.en_passant_target;
        let en_passant_victim = self.board.en_passant_victim(piece, &mv, prior_en_passant_target);
        let captured_square = en_passant_victim.or_else(|| self.board[mv.to].map(|_| mv.to));
        let captured_piece = captured_square.and_then(|sq| self.board[sq]);
        let rook_move = castling_rook_move(piece, &mv);
        let placed = promoted_piece(piece, &mv);
        let promotion = (placed != piece).then_some(placed.piece_type);
        let played = Move { promotion, ..mv };

        let (disambiguate_file, disambiguate_rank) = match piece.piece_type {
            PieceType::Pawn | PieceType::King => (false, false),
            _ => notation::disambiguation(
                mv.from,
                &self.board.find_ambiguous_pieces(mv.from, mv.to, prior_en_passant_target),
            ),
        };

        let mut record = MoveRecord {
            mv: played,
            moved_piece: piece,
            captured_piece,
            captured_square,
            rook_move,
            promotion,
            is_en_passant: en_passant_victim.is_some(),
            is_check: false,
            is_checkmate: false,
            disambiguate_file,
            disambiguate_rank,
            prior_castling_rights: self.castling_rights,
            prior_side_to_move: self.side_to_move,
            prior_result: self.result,
            prior_half_move_clock: self.half_move_clock,
            prior_repetitions: self.repetitions.clone(),
            prior_en_passant_target,
        };

        // Board
        self.board = self.board.simulate(&played, prior_en_passant_target);
        self.selected = None;
        self.staged = None;

        // Castling rights
        if piece.piece_type == PieceType::King {
            self.castling_rights.revoke_all(piece.color);
        }
        if piece.piece_type == PieceType::Rook {
            self.castling_rights.revoke_corner(mv.from);
        }
        if captured_square == Some(mv.to) {
            self.castling_rights.revoke_corner(mv.to);
        }

        // Clocks and turn
        self.half_move_clock = record.half_move_clock_after();
        self.en_passant_target = double_step_target(piece, &played);
        self.side_to_move = self.side_to_move.opposite();
        *self.repetitions.entry(self.position_key()).or_insert(0) += 1;

        self.result = self.evaluate_termination();
        record.is_check = self.board.is_king_in_check(self.side_to_move);
        record.is_checkmate = matches!(self.result, Some(GameResult::Checkmate { .. }));

        let san = record.san();
        self.history.push(record);
        let ply = self.history.len();
        debug!(ply, %san, "move executed");
        self.events.push(GameEvent::MoveExecuted { ply, mv: played, san });

        if let Some(result) = self.result {
            info!(ply, %result, "game over");
            self.events.push(GameEvent::GameOver(result));
        }
        self.history.last()
    }

    /// First matching rule wins: checkmate, stalemate, fifty-move rule,
    /// threefold repetition.
    fn evaluate_termination(&self) -> Option<GameResult> {
        let side = self.side_to_move;
        let has_moves = self.board.has_any_legal_moves(side, self.en_passant_target);
        if !has_moves && self.board.is_king_in_check(side) {
            return Some(GameResult::Checkmate { winner: side.opposite() });
        }
        if !has_moves {
            return Some(GameResult::Stalemate);
        }
        if self.half_move_clock >= FIFTY_MOVE_PLIES {
            return Some(GameResult::DrawByFiftyMoveRule);
        }
        if self.repetition_count() >= REPETITION_LIMIT {
            return Some(GameResult::DrawByThreefoldRepetition);
        }
        None
    }

    /// Resolve a (from, to) pair against the legal move list. An explicit
    /// promotion piece replaces the default queen.
    fn resolve_move(&self, from: Square, to: Square, promotion: Option<PieceType>) -> Result<Move> {
        if self.result.is_some() {
            return Err(ChessError::GameFinished);
        }
        if self.board[from].is_none() {
            return Err(ChessError::NoPieceAt(from));
        }
        let requested = Move { from, to, promotion };
        let mut mv = self
            .legal_moves(from)
            .into_iter()
            .find(|m| m.to == to)
            .ok_or(ChessError::IllegalMove(requested))?;
        if let (Some(_), Some(kind)) = (mv.promotion, promotion) {
            if !kind.is_promotion_target() {
                return Err(ChessError::IllegalMove(requested));
            }
            mv.promotion = Some(kind);
        }
        Ok(mv)
    }

    /// Play `from` → `to` if it is legal. A rejected attempt changes nothing.
    pub fn attempt_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<PieceType>,
    ) -> Result<&MoveRecord> {
        let mv = self.resolve_move(from, to, promotion)?;
        self.execute_move(mv).ok_or(ChessError::IllegalMove(mv))
    }

    /// Tap-style selection. Tapping one of the mover's pieces selects it;
    /// tapping any other square with a piece selected tries that move and
    /// clears the selection. Returns the record if a move was played.
    pub fn select(&mut self, square: Square) -> Option<&MoveRecord> {
        if self.result.is_some() {
            self.selected = None;
            return None;
        }
        match self.board[square] {
            Some(piece) if piece.color == self.side_to_move => {
                self.selected = Some(square);
                None
            }
            _ => {
                let from = self.selected.take()?;
                self.attempt_move(from, square, None).ok()
            }
        }
    }

    /// Hold a legal move for a later `commit_staged_move`, e.g. while the
    /// front end animates it.
    pub fn stage_move(&mut self, mv: Move) -> Result<Move> {
        let resolved = self.resolve_move(mv.from, mv.to, mv.promotion)?;
        self.staged = Some(resolved);
        Ok(resolved)
    }

    pub fn commit_staged_move(&mut self) -> Option<&MoveRecord> {
        let mv = self.staged.take()?;
        self.execute_move(mv)
    }

    pub fn cancel_staged_move(&mut self) -> Option<Move> {
        self.staged.take()
    }

    /// Take back the most recent ply, restoring every snapshotted field.
    ///
    /// The result goes back to the one recorded before that ply. A
    /// resignation or timeout declared after the last move is therefore
    /// cleared and the game is in progress again.
    pub fn undo_last_move(&mut self) -> Option<MoveRecord> {
        let record = self.history.pop()?;
        let mv = record.mv;

        self.board[mv.to] = None;
        if let Some((rook_from, rook_to)) = record.rook_move {
            let rook = self.board.take(rook_to);
            self.board[rook_from] = rook;
        }
        self.board[mv.from] = Some(record.moved_piece);
        if let (Some(square), Some(piece)) = (record.captured_square, record.captured_piece) {
            self.board[square] = Some(piece);
        }

        self.castling_rights = record.prior_castling_rights;
        self.side_to_move = record.prior_side_to_move;
        self.result = record.prior_result;
        self.half_move_clock = record.prior_half_move_clock;
        self.repetitions = record.prior_repetitions.clone();
        self.en_passant_target = record.prior_en_passant_target;
        self.selected = None;
        self.staged = None;

        let ply = self.history.len() + 1;
        debug!(ply, %mv, "move undone");
        self.events.push(GameEvent::MoveUndone { ply, mv });
        Some(record)
    }

    /// Undo until only the first `index` records remain.
    pub fn undo_to(&mut self, index: usize) {
        while self.history.len() > index {
            self.undo_last_move();
        }
    }

    /// Undo back to `player`'s turn, taking at least one ply. After a
    /// computer reply this removes the reply and the move before it.
    /// Returns the number of plies undone.
    pub fn undo_turn(&mut self, player: Color) -> usize {
        let mut undone = 0;
        while self.undo_last_move().is_some() {
            undone += 1;
            if self.side_to_move == player {
                break;
            }
        }
        undone
    }

    pub fn reset(&mut self) {
        let events = std::mem::take(&mut self.events);
        *self = GameState::new();
        self.events = events;
        self.events.push(GameEvent::Reset);
        info!("game reset");
    }

    /// End the game with an externally decided result (clock flag,
    /// resignation). Ignored once the game is already over.
    pub fn force_end(&mut self, result: GameResult) {
        if self.result.is_some() {
            return;
        }
        info!(%result, "game ended externally");
        self.result = Some(result);
        self.selected = None;
        self.staged = None;
        self.events.push(GameEvent::GameOver(result));
    }

    pub fn resign(&mut self, loser: Color) {
        self.force_end(GameResult::Resignation { winner: loser.opposite() });
    }

    pub fn flag_timeout(&mut self, loser: Color) {
        self.force_end(GameResult::Timeout { winner: loser.opposite() });
    }

    /// Let the computer pick and play a move for the side to move.
    pub fn computer_move(&mut self, config: &AiConfig) -> Option<&MoveRecord> {
        self.computer_move_with_rng(config, &mut rand::thread_rng())
    }

    pub fn computer_move_with_rng<R: Rng + ?Sized>(
        &mut self,
        config: &AiConfig,
        rng: &mut R,
    ) -> Option<&MoveRecord> {
        if self.result.is_some() {
            return None;
        }
        let mv = engine::select_from(
            &self.board,
            self.side_to_move,
            self.en_passant_target,
            self.all_legal_moves(),
            config,
            rng,
        )?;
        self.execute_move(mv)
    }

    /// Drain queued events. The queue only empties here, so a long-running
    /// caller has to drain it regularly.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
