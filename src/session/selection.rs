//! Selection handling for the input collaborator.
//!
//! Input is cell based: the first click picks a piece, the second picks one
//! of its offered destinations. Hints are advisory and never affect
//! legality.

use serde::{Deserialize, Serialize};

use crate::core::{Cell, Move, MoveList};

/// A picked piece and the moves offered for it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub from: Cell,
    pub moves: MoveList,
}

impl Selection {
    /// The offered move landing on `to`, if any.
    #[must_use]
    pub fn find(&self, to: Cell) -> Option<Move> {
        self.moves.iter().copied().find(|mv| mv.to == to)
    }
}

/// Result of a click.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectOutcome {
    /// Nothing selectable there; any previous selection is cleared.
    Ignored,

    /// A piece was picked. Show `moves` as hints.
    Selected { from: Cell, moves: MoveList },

    /// Click outside the pinned continuation set; the pinned selection and
    /// its hints stay as they were.
    Rejected { pinned: Cell, moves: MoveList },

    /// An offered destination was clicked. The move is not applied yet.
    Chosen(Move),
}
