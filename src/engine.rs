// =============================================================================
// Computer player
//
// A one-ply heuristic, not a search. Candidates are filtered and ranked in
// three steps:
//
//   1. A move that mates immediately is played regardless of difficulty.
//   2. Moves that let the opponent mate in one are dropped, unless every
//      candidate does (a forced loss still has to return a move).
//   3. Survivors are shuffled, scored by material after the move plus a
//      capture bonus and stably sorted. One is drawn uniformly from exactly
//      the top band for the chosen difficulty (10 for easy, 3 for medium,
//      1 for hard). The shuffle settles ties at random.
//
// Scores are integers in centipawns from the mover's perspective.
// =============================================================================

use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::board::Board;
use crate::error::{ChessError, Result};
use crate::history::double_step_target;
use crate::moves::Move;
use crate::piece::{Color, PieceType};
use crate::square::Square;

// =============================================================================
// Configuration
// =============================================================================

/// Material values and the two move-scoring knobs. Fields missing from a
/// JSON config keep their default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub pawn: i32,
    pub knight: i32,
    pub bishop: i32,
    pub rook: i32,
    pub queen: i32,
    pub king: i32,
    /// A capture earns the victim's value divided by this.
    pub capture_divisor: i32,
    /// Subtracted when a move leaves the mover's own king attacked. Legal
    /// candidates never do, so this only fires for hand-built moves.
    pub self_check_penalty: i32,
}

impl Default for Weights {
    fn default() -> Self {
        Weights {
            pawn: 100,
            knight: 320,
            bishop: 330,
            rook: 500,
            queen: 900,
            king: 20000,
            capture_divisor: 2,
            self_check_penalty: 500,
        }
    }
}

impl Weights {
    pub fn value(&self, piece_type: PieceType) -> i32 {
        match piece_type {
            PieceType::Pawn => self.pawn,
            PieceType::Knight => self.knight,
            PieceType::Bishop => self.bishop,
            PieceType::Rook => self.rook,
            PieceType::Queen => self.queen,
            PieceType::King => self.king,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// How many of the best-scored candidates the pick is drawn from.
    pub fn band(self) -> usize {
        match self {
            Difficulty::Easy => 10,
            Difficulty::Medium => 3,
            Difficulty::Hard => 1,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        f.write_str(name)
    }
}

impl FromStr for Difficulty {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ChessError::InvalidDifficulty(s.to_string())),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub difficulty: Difficulty,
    pub weights: Weights,
}

impl AiConfig {
    pub fn new(difficulty: Difficulty) -> Self {
        AiConfig { difficulty, weights: Weights::default() }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// A candidate paired with its `score_move` value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScoredMove {
    pub mv: Move,
    pub score: i32,
}

// =============================================================================
// Evaluation
// =============================================================================

/// Material balance from `color`'s point of view.
pub fn evaluate(board: &Board, color: Color, weights: &Weights) -> i32 {
    board
        .pieces()
        .map(|(_, p)| {
            let value = weights.value(p.piece_type);
            if p.color == color { value } else { -value }
        })
        .sum()
}

/// Material after `mv`, plus a bonus for whatever it captures, minus the
/// self-check penalty if the mover's king ends up attacked.
pub fn score_move(
    board: &Board,
    mv: &Move,
    color: Color,
    en_passant_target: Option<Square>,
    weights: &Weights,
) -> i32 {
    let after = board.simulate(mv, en_passant_target);
    let mut score = evaluate(&after, color, weights);

    let victim_square = board[mv.from]
        .and_then(|p| board.en_passant_victim(p, mv, en_passant_target))
        .unwrap_or(mv.to);
    if let Some(victim) = board[victim_square].filter(|p| p.color != color) {
        score += weights.value(victim.piece_type) / weights.capture_divisor.max(1);
    }

    if after.is_king_in_check(color) {
        score -= weights.self_check_penalty;
    }
    score
}

// =============================================================================
// Tactical lookahead
// =============================================================================

/// The first candidate that checkmates the opponent outright.
pub fn find_checkmate_in_one(
    board: &Board,
    color: Color,
    en_passant_target: Option<Square>,
    candidates: &[Move],
) -> Option<Move> {
    candidates.iter().copied().find(|mv| {
        let after = board.simulate(mv, en_passant_target);
        let next_ep = board[mv.from].and_then(|p| double_step_target(p, mv));
        after.is_checkmate(color.opposite(), next_ep)
    })
}

/// Whether the opponent has a reply to `mv` that mates `color` at once.
pub fn allows_opponent_mate_in_one(
    board: &Board,
    mv: &Move,
    color: Color,
    en_passant_target: Option<Square>,
) -> bool {
    let after = board.simulate(mv, en_passant_target);
    let reply_ep = board[mv.from].and_then(|p| double_step_target(p, mv));
    let opponent = color.opposite();

    after.legal_moves_for(opponent, reply_ep).iter().any(|reply| {
        let answered = after.simulate(reply, reply_ep);
        let next_ep = after[reply.from].and_then(|p| double_step_target(p, reply));
        answered.is_checkmate(color, next_ep)
    })
}

// =============================================================================
// Move selection
// =============================================================================

/// Scored candidates, best first. The sort is stable, so equal scores keep
/// the order of `candidates`.
pub fn rank_moves(
    board: &Board,
    color: Color,
    en_passant_target: Option<Square>,
    candidates: &[Move],
    weights: &Weights,
) -> Vec<ScoredMove> {
    let mut scored: Vec<ScoredMove> = candidates
        .iter()
        .map(|&mv| ScoredMove {
            mv,
            score: score_move(board, &mv, color, en_passant_target, weights),
        })
        .collect();
    scored.sort_by_key(|s| std::cmp::Reverse(s.score));
    scored
}

/// Uniform draw from the first `band` entries of a ranked list.
fn pick_ranked<'a, R: Rng + ?Sized>(
    scored: &'a [ScoredMove],
    band: usize,
    rng: &mut R,
) -> Option<&'a ScoredMove> {
    scored[..band.max(1).min(scored.len())].choose(rng)
}

/// Pick among `candidates`, which the caller has already restricted to
/// legal moves. `None` only when there are no candidates.
pub fn select_from<R: Rng + ?Sized>(
    board: &Board,
    color: Color,
    en_passant_target: Option<Square>,
    candidates: Vec<Move>,
    config: &AiConfig,
    rng: &mut R,
) -> Option<Move> {
    if candidates.is_empty() {
        return None;
    }

    if let Some(mate) = find_checkmate_in_one(board, color, en_passant_target, &candidates) {
        debug!(%mate, "playing mate in one");
        return Some(mate);
    }

    let safe: Vec<Move> = candidates
        .iter()
        .copied()
        .filter(|mv| {
            let unsafe_move = allows_opponent_mate_in_one(board, mv, color, en_passant_target);
            if unsafe_move {
                debug!(%mv, "rejecting move: allows mate in one");
            }
            !unsafe_move
        })
        .collect();
    let mut pool_source = if safe.is_empty() { candidates } else { safe };

    // Equal scores keep this random order through the stable sort
    pool_source.shuffle(rng);
    let scored = rank_moves(board, color, en_passant_target, &pool_source, &config.weights);
    let band = config.difficulty.band();
    let choice = pick_ranked(&scored, band, rng)?;
    trace!(
        difficulty = %config.difficulty,
        band,
        best = scored[0].score,
        chosen = %choice.mv,
        score = choice.score,
        "move selected"
    );
    Some(choice.mv)
}

/// Pick a move for `color` with a caller-supplied random source. Castling
/// is not considered; `GameState::computer_move` includes it.
pub fn select_move_with_rng<R: Rng + ?Sized>(
    board: &Board,
    color: Color,
    en_passant_target: Option<Square>,
    config: &AiConfig,
    rng: &mut R,
) -> Option<Move> {
    let candidates = board
        .legal_moves_for(color, en_passant_target)
        .into_iter()
        .map(|mv| board.with_default_promotion(mv))
        .collect();
    select_from(board, color, en_passant_target, candidates, config, rng)
}

pub fn select_move(
    board: &Board,
    color: Color,
    en_passant_target: Option<Square>,
    config: &AiConfig,
) -> Option<Move> {
    select_move_with_rng(board, color, en_passant_target, config, &mut rand::thread_rng())
}
