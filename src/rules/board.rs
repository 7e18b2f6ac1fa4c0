//! Board: an owned arena of cells indexed by coordinate.
//!
//! ## Invariants
//!
//! - Pieces only ever occupy playable, in-bounds cells.
//! - At most one piece per cell.
//! - The grid is `BOARD_SIZE x BOARD_SIZE` for its whole life.
//! - A piece's `position` always equals the cell holding it.

use serde::{Deserialize, Serialize};

use crate::core::{BoardError, Cell, Color, Move, RulesConfig, BOARD_SIZE, CELL_COUNT};

/// Rows of men each side starts with.
pub const STARTING_ROWS: i8 = 3;

/// Piece rank. Men become kings; kings are never demoted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rank {
    Man,
    King,
}

/// A piece on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub color: Color,
    pub rank: Rank,
    pub position: Cell,
}

impl Piece {
    #[must_use]
    pub const fn man(color: Color, position: Cell) -> Self {
        Self {
            color,
            rank: Rank::Man,
            position,
        }
    }

    #[must_use]
    pub const fn is_king(&self) -> bool {
        matches!(self.rank, Rank::King)
    }

    /// Promote to king. Returns true if the rank changed.
    pub fn promote(&mut self) -> bool {
        if self.is_king() {
            return false;
        }
        self.rank = Rank::King;
        true
    }
}

/// Row on which a man of `color` is promoted.
#[must_use]
pub const fn promotion_row(color: Color) -> i8 {
    match color {
        Color::White => BOARD_SIZE - 1,
        Color::Black => 0,
    }
}

/// The playing surface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    cells: Vec<Option<Piece>>,
    rules: RulesConfig,
}

impl Board {
    /// An empty board.
    #[must_use]
    pub fn empty(rules: RulesConfig) -> Self {
        Self {
            cells: vec![None; CELL_COUNT],
            rules,
        }
    }

    /// Standard setup: White on rows 0-2, Black on rows 5-7, playable
    /// cells only.
    #[must_use]
    pub fn standard(rules: RulesConfig) -> Self {
        let mut board = Self::empty(rules);
        board.fill_rows(Color::White, 0);
        board.fill_rows(Color::Black, BOARD_SIZE - STARTING_ROWS);
        board
    }

    fn fill_rows(&mut self, color: Color, start_row: i8) {
        for y in start_row..start_row + STARTING_ROWS {
            for x in 0..BOARD_SIZE {
                let cell = Cell::new(x, y);
                if let Some(index) = cell.index() {
                    if self.rules.is_playable(cell) {
                        self.cells[index] = Some(Piece::man(color, cell));
                    }
                }
            }
        }
    }

    /// Rule switches this board was built with.
    #[must_use]
    pub fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    /// True iff both coordinates are in `[0, BOARD_SIZE)`.
    #[must_use]
    pub fn in_bounds(cell: Cell) -> bool {
        cell.in_bounds()
    }

    /// Parity test against the configured origin-cell color.
    #[must_use]
    pub fn is_playable(&self, cell: Cell) -> bool {
        self.rules.is_playable(cell)
    }

    /// Piece on `cell`, or `None` when empty or off the board.
    #[must_use]
    pub fn piece_at(&self, cell: Cell) -> Option<&Piece> {
        cell.index().and_then(|i| self.cells[i].as_ref())
    }

    /// In bounds, playable and empty: a cell a piece may land on.
    #[must_use]
    pub fn is_open(&self, cell: Cell) -> bool {
        cell.in_bounds() && self.is_playable(cell) && self.piece_at(cell).is_none()
    }

    /// Put a piece on the board.
    pub fn place(&mut self, color: Color, rank: Rank, cell: Cell) -> Result<(), BoardError> {
        let index = cell.index().ok_or(BoardError::OutOfBounds(cell))?;
        if !self.is_playable(cell) {
            return Err(BoardError::Unplayable(cell));
        }
        if self.cells[index].is_some() {
            return Err(BoardError::Occupied(cell));
        }
        self.cells[index] = Some(Piece {
            color,
            rank,
            position: cell,
        });
        Ok(())
    }

    /// Take a piece off the board.
    pub fn remove(&mut self, cell: Cell) -> Option<Piece> {
        cell.index().and_then(|i| self.cells[i].take())
    }

    /// All pieces, scanned row by row from (0,0).
    pub fn pieces(&self) -> impl Iterator<Item = &Piece> {
        self.cells.iter().filter_map(Option::as_ref)
    }

    /// Pieces of one side.
    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = &Piece> {
        self.pieces().filter(move |p| p.color == color)
    }

    /// Number of pieces a side has left.
    #[must_use]
    pub fn piece_count(&self, color: Color) -> usize {
        self.pieces_of(color).count()
    }

    /// Relocate the moving piece, remove the captured piece and promote on
    /// the far row.
    ///
    /// Legality is not checked: callers pass moves obtained from move
    /// generation, or moves a peer generated from an identical board. Only
    /// structural problems (off-board cells, empty origin, occupied
    /// destination) are reported so a bad peer message cannot corrupt the
    /// arena.
    ///
    /// Returns true if the piece was promoted.
    pub fn apply_move(&mut self, mv: &Move) -> Result<bool, BoardError> {
        let from = mv.from.index().ok_or(BoardError::OutOfBounds(mv.from))?;
        let to = mv.to.index().ok_or(BoardError::OutOfBounds(mv.to))?;
        let captured = match mv.captured {
            Some(cell) => Some(cell.index().ok_or(BoardError::OutOfBounds(cell))?),
            None => None,
        };
        if self.cells[from].is_none() {
            return Err(BoardError::EmptyOrigin(mv.from));
        }
        if from != to && self.cells[to].is_some() {
            return Err(BoardError::Occupied(mv.to));
        }

        let Some(mut piece) = self.cells[from].take() else {
            return Err(BoardError::EmptyOrigin(mv.from));
        };
        if let Some(index) = captured {
            self.cells[index] = None;
        }

        piece.position = mv.to;
        let promoted = mv.to.y == promotion_row(piece.color) && piece.promote();
        self.cells[to] = Some(piece);

        Ok(promoted)
    }
}

impl std::fmt::Display for Board {
    /// Row 7 on top; `w`/`b` men, `W`/`B` kings, `.` playable, space otherwise.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for y in (0..BOARD_SIZE).rev() {
            for x in 0..BOARD_SIZE {
                let cell = Cell::new(x, y);
                let c = match self.piece_at(cell) {
                    Some(p) => match (p.color, p.rank) {
                        (Color::White, Rank::Man) => 'w',
                        (Color::White, Rank::King) => 'W',
                        (Color::Black, Rank::Man) => 'b',
                        (Color::Black, Rank::King) => 'B',
                    },
                    None if self.is_playable(cell) => '.',
                    None => ' ',
                };
                write!(f, "{}", c)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
