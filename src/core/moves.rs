//! Move representation: origin, destination, optional captured cell.
//!
//! A move with a captured cell is a "capture move"; otherwise it is a
//! "quiet move". Moves are plain values and never change once built.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::cell::Cell;
use super::player::Color;

/// A single step of play.
///
/// ## Example
///
/// ```
/// use draughts_sync::core::{Cell, Move};
///
/// let quiet = Move::quiet(Cell::new(1, 2), Cell::new(2, 3));
/// assert!(!quiet.is_capture());
///
/// let jump = Move::capture(Cell::new(1, 2), Cell::new(3, 4), Cell::new(2, 3));
/// assert!(jump.is_capture());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Cell,
    pub to: Cell,
    pub captured: Option<Cell>,
}

impl Move {
    /// A non-capturing move.
    #[must_use]
    pub const fn quiet(from: Cell, to: Cell) -> Self {
        Self {
            from,
            to,
            captured: None,
        }
    }

    /// A move that removes the piece on `captured`.
    #[must_use]
    pub const fn capture(from: Cell, to: Cell, captured: Cell) -> Self {
        Self {
            from,
            to,
            captured: Some(captured),
        }
    }

    #[must_use]
    pub const fn is_capture(&self) -> bool {
        self.captured.is_some()
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.captured {
            Some(cap) => write!(f, "{}x{}->{}", self.from, cap, self.to),
            None => write!(f, "{}->{}", self.from, self.to),
        }
    }
}

/// Move collection. A flying king on an open diagonal has at most 13
/// destinations, so 16 covers one piece without spilling.
pub type MoveList = SmallVec<[Move; 16]>;

/// A recorded move with metadata for history tracking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// The side that moved.
    pub color: Color,

    /// The move taken.
    pub mv: Move,

    /// Turn round the move was played in.
    pub round: u32,

    /// True if the piece was promoted by this move.
    pub promoted: bool,
}
