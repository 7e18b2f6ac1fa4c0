//! Turn states and transition outcomes.

use serde::{Deserialize, Serialize};

use crate::core::{Cell, Color, MoveList};
use crate::rules::GameResult;

/// Where the game is.
///
/// `Active` and `Continuation` carry the side to move; the turn timer lives
/// on the session. `GameOver` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnState {
    /// `turn` may move any piece with a legal move.
    Active { turn: Color },

    /// `turn` must keep capturing with the piece on `pinned`.
    Continuation { turn: Color, pinned: Cell },

    /// The game has ended. `result` is `None` when it was terminated from
    /// outside (a participant left) rather than decided on the board.
    GameOver { result: Option<GameResult> },
}

impl TurnState {
    /// Side to move, or `None` once the game is over.
    #[must_use]
    pub const fn turn(&self) -> Option<Color> {
        match self {
            TurnState::Active { turn } | TurnState::Continuation { turn, .. } => Some(*turn),
            TurnState::GameOver { .. } => None,
        }
    }

    /// Pinned piece during a continuation capture.
    #[must_use]
    pub const fn pinned(&self) -> Option<Cell> {
        match self {
            TurnState::Continuation { pinned, .. } => Some(*pinned),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_over(&self) -> bool {
        matches!(self, TurnState::GameOver { .. })
    }
}

/// What happened after a move or a timeout was applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Same side keeps capturing with the piece on `pinned`; `moves` is the
    /// only selectable set.
    Continue { pinned: Cell, moves: MoveList },

    /// The turn passed to `to`.
    Passed { to: Color },

    /// The side that just received the turn cannot move.
    Finished(GameResult),
}
