//! Board coordinates.
//!
//! A `Cell` is an `(x, y)` pair with `x` the column and `y` the row. Row 0
//! is White's home row. Coordinates are signed so that direction offsets can
//! walk off the board; `in_bounds` tells whether a cell is on it.
//!
//! ```
//! use draughts_sync::core::{Cell, Direction};
//!
//! let c = Cell::new(7, 7);
//! assert!(c.in_bounds());
//! assert!(!c.step(Direction::new(1, 1)).in_bounds());
//! ```

use serde::{Deserialize, Serialize};

/// Board side length.
pub const BOARD_SIZE: i8 = 8;

/// Number of cells on the board.
pub const CELL_COUNT: usize = (BOARD_SIZE as usize) * (BOARD_SIZE as usize);

/// A board coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: i8,
    pub y: i8,
}

impl Cell {
    /// Create a new cell.
    #[must_use]
    pub const fn new(x: i8, y: i8) -> Self {
        Self { x, y }
    }

    /// True iff both coordinates lie in `[0, BOARD_SIZE)`.
    #[must_use]
    pub const fn in_bounds(self) -> bool {
        self.x >= 0 && self.x < BOARD_SIZE && self.y >= 0 && self.y < BOARD_SIZE
    }

    /// The neighbouring cell in `dir`.
    #[must_use]
    pub const fn step(self, dir: Direction) -> Self {
        Self {
            x: self.x + dir.dx,
            y: self.y + dir.dy,
        }
    }

    /// Arena index of an in-bounds cell.
    #[must_use]
    pub(crate) fn index(self) -> Option<usize> {
        if self.in_bounds() {
            Some(self.y as usize * BOARD_SIZE as usize + self.x as usize)
        } else {
            None
        }
    }

    /// Inverse of `index`.
    #[must_use]
    pub(crate) const fn from_index(index: usize) -> Self {
        Self {
            x: (index % BOARD_SIZE as usize) as i8,
            y: (index / BOARD_SIZE as usize) as i8,
        }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// A diagonal unit direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Direction {
    pub dx: i8,
    pub dy: i8,
}

impl Direction {
    /// The four diagonals.
    pub const DIAGONALS: [Direction; 4] = [
        Direction::new(1, 1),
        Direction::new(-1, 1),
        Direction::new(1, -1),
        Direction::new(-1, -1),
    ];

    #[must_use]
    pub const fn new(dx: i8, dy: i8) -> Self {
        Self { dx, dy }
    }
}
