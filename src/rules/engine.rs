//! Rules engine trait.
//!
//! The turn state machine and the sync protocol talk to the board only
//! through `RulesEngine`:
//! - What moves are legal
//! - How a move modifies the board
//! - Whether the side to move is out of play

use serde::{Deserialize, Serialize};

use crate::core::{BoardError, Cell, Color, Move, MoveList};

use super::board::Board;

/// Result of a completed game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameResult {
    WhiteWins,
    Draw,
    BlackWins,
}

/// A game result from one side's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Draw,
    Loss,
}

impl GameResult {
    /// Result where `color` has won.
    #[must_use]
    pub const fn winner_is(color: Color) -> Self {
        match color {
            Color::White => GameResult::WhiteWins,
            Color::Black => GameResult::BlackWins,
        }
    }

    /// Winning side, if any.
    #[must_use]
    pub const fn winner(self) -> Option<Color> {
        match self {
            GameResult::WhiteWins => Some(Color::White),
            GameResult::BlackWins => Some(Color::Black),
            GameResult::Draw => None,
        }
    }

    /// Check if a side won.
    #[must_use]
    pub fn is_winner(self, color: Color) -> bool {
        self.winner() == Some(color)
    }

    /// The result as seen by `color`.
    #[must_use]
    pub fn outcome_for(self, color: Color) -> Outcome {
        match self.winner() {
            None => Outcome::Draw,
            Some(c) if c == color => Outcome::Win,
            Some(_) => Outcome::Loss,
        }
    }

    /// Wire flag: -1 White wins, 0 draw, +1 Black wins.
    #[must_use]
    pub const fn flag(self) -> i8 {
        match self {
            GameResult::WhiteWins => -1,
            GameResult::Draw => 0,
            GameResult::BlackWins => 1,
        }
    }

    /// Inverse of `flag`.
    #[must_use]
    pub const fn from_flag(flag: i8) -> Option<Self> {
        match flag {
            -1 => Some(GameResult::WhiteWins),
            0 => Some(GameResult::Draw),
            1 => Some(GameResult::BlackWins),
            _ => None,
        }
    }
}

impl Outcome {
    /// Stored `lastResult` value: 1 win, 0 draw, -1 loss.
    #[must_use]
    pub const fn score(self) -> i64 {
        match self {
            Outcome::Win => 1,
            Outcome::Draw => 0,
            Outcome::Loss => -1,
        }
    }
}

/// Rules engine trait.
///
/// ## Implementation Notes
///
/// - `legal_moves`: captures only when any exist for the side, otherwise
///   quiet moves only
/// - `moves_for_piece`: empty for an empty cell
/// - `apply_move`: must be deterministic; peers replay each other's moves
///   through it without re-deriving legality
pub trait RulesEngine {
    /// Legal moves for a side, with side-wide mandatory capture.
    fn legal_moves(&self, color: Color) -> MoveList;

    /// Candidate moves for the piece on `at`, dispatched on rank.
    fn moves_for_piece(&self, at: Cell) -> MoveList;

    /// Apply a move. Returns true if the moving piece was promoted.
    fn apply_move(&mut self, mv: &Move) -> Result<bool, BoardError>;

    /// Does the side still have pieces?
    fn has_any_pieces(&self, color: Color) -> bool;

    // === Convenience Methods ===

    /// Does the side have at least one legal move?
    fn has_any_moves(&self, color: Color) -> bool {
        !self.legal_moves(color).is_empty()
    }

    /// Further captures available to the piece on `at`.
    fn capture_continuations(&self, at: Cell) -> MoveList {
        let mut moves = self.moves_for_piece(at);
        moves.retain(|mv| mv.is_capture());
        moves
    }

    /// Check if the side to move is out of play.
    ///
    /// Returns `Some(result)` with the opponent as winner when `to_move`
    /// has no legal moves (including having no pieces), `None` otherwise.
    fn is_terminal(&self, to_move: Color) -> Option<GameResult> {
        if self.has_any_moves(to_move) {
            None
        } else {
            Some(GameResult::winner_is(to_move.opponent()))
        }
    }
}

impl RulesEngine for Board {
    fn legal_moves(&self, color: Color) -> MoveList {
        self.side_moves(color)
    }

    fn moves_for_piece(&self, at: Cell) -> MoveList {
        match self.piece_at(at) {
            Some(piece) => self.piece_moves(piece),
            None => MoveList::new(),
        }
    }

    fn apply_move(&mut self, mv: &Move) -> Result<bool, BoardError> {
        Board::apply_move(self, mv)
    }

    fn has_any_pieces(&self, color: Color) -> bool {
        self.pieces_of(color).next().is_some()
    }
}
