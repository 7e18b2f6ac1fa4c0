//! Move generation for men and flying kings.
//!
//! Mandatory capture is applied at two levels:
//! - per piece for kings, so a king's own slides never shadow its captures;
//! - side-wide in `legal_moves`, so any capture anywhere hides every quiet
//!   move of that side.
//!
//! Men need no per-piece filter: the side-wide filter covers them.

use crate::core::{Cell, Color, Direction, Move, MoveList};

use super::board::{Board, Piece, Rank};

impl Board {
    /// Candidate moves for one piece, dispatched on rank.
    #[must_use]
    pub fn piece_moves(&self, piece: &Piece) -> MoveList {
        match piece.rank {
            Rank::Man => self.man_moves(piece),
            Rank::King => self.king_moves(piece),
        }
    }

    /// Every candidate move of `color`: captures only if any exist,
    /// otherwise quiet moves only.
    #[must_use]
    pub fn side_moves(&self, color: Color) -> MoveList {
        let mut quiet = MoveList::new();
        let mut captures = MoveList::new();

        for piece in self.pieces_of(color) {
            for mv in self.piece_moves(piece) {
                if mv.is_capture() {
                    captures.push(mv);
                } else {
                    quiet.push(mv);
                }
            }
        }

        if captures.is_empty() {
            quiet
        } else {
            captures
        }
    }

    /// Is there an enemy of `color` on `cell`?
    fn holds_enemy(&self, cell: Cell, color: Color) -> bool {
        self.piece_at(cell).is_some_and(|p| p.color != color)
    }

    fn man_moves(&self, piece: &Piece) -> MoveList {
        let mut moves = MoveList::new();
        let from = piece.position;
        let forward = piece.color.forward();

        let steps = [
            Direction::new(1, forward),
            Direction::new(-1, forward),
            Direction::new(1, -forward),
            Direction::new(-1, -forward),
        ];

        for dir in steps {
            let is_forward = dir.dy == forward;
            let over = from.step(dir);

            if is_forward && self.is_open(over) {
                moves.push(Move::quiet(from, over));
            }

            let land = over.step(dir);
            if self.is_open(land)
                && self.holds_enemy(over, piece.color)
                && (is_forward || self.rules().allow_backward_capture)
            {
                moves.push(Move::capture(from, land, over));
            }
        }

        moves
    }

    fn king_moves(&self, piece: &Piece) -> MoveList {
        let mut moves = MoveList::new();
        let from = piece.position;

        for dir in Direction::DIAGONALS {
            let mut cell = from.step(dir);
            while self.is_open(cell) {
                moves.push(Move::quiet(from, cell));
                cell = cell.step(dir);
            }

            // `cell` is now off the board, unplayable, or occupied.
            if !self.holds_enemy(cell, piece.color) {
                continue;
            }

            let victim = cell;
            let mut land = victim.step(dir);
            while self.is_open(land) {
                moves.push(Move::capture(from, land, victim));
                land = land.step(dir);
            }
        }

        if moves.iter().any(Move::is_capture) {
            moves.retain(|mv| mv.is_capture());
        }
        moves
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RulesConfig;

    fn board_with(pieces: &[(Color, Rank, (i8, i8))]) -> Board {
        let mut board = Board::empty(RulesConfig::default());
        for &(color, rank, (x, y)) in pieces {
            board.place(color, rank, Cell::new(x, y)).unwrap();
        }
        board
    }

    fn piece(board: &Board, x: i8, y: i8) -> Piece {
        *board.piece_at(Cell::new(x, y)).unwrap()
    }

    #[test]
    fn test_man_quiet_moves_forward_only() {
        let board = board_with(&[(Color::White, Rank::Man, (2, 2))]);
        let moves = board.piece_moves(&piece(&board, 2, 2));

        assert_eq!(moves.len(), 2);
        assert!(moves.contains(&Move::quiet(Cell::new(2, 2), Cell::new(3, 3))));
        assert!(moves.contains(&Move::quiet(Cell::new(2, 2), Cell::new(1, 3))));
    }

    #[test]
    fn test_black_man_moves_down() {
        let board = board_with(&[(Color::Black, Rank::Man, (3, 5))]);
        let moves = board.piece_moves(&piece(&board, 3, 5));

        assert_eq!(moves.len(), 2);
        assert!(moves.iter().all(|m| m.to.y == 4));
    }

    #[test]
    fn test_man_backward_capture_flag() {
        let pieces = [
            (Color::White, Rank::Man, (3, 3)),
            (Color::Black, Rank::Man, (2, 2)),
        ];
        let backward = Move::capture(Cell::new(3, 3), Cell::new(1, 1), Cell::new(2, 2));

        let board = board_with(&pieces);
        assert!(board.piece_moves(&piece(&board, 3, 3)).contains(&backward));

        let mut strict = Board::empty(RulesConfig::default().with_backward_capture(false));
        for &(color, rank, (x, y)) in &pieces {
            strict.place(color, rank, Cell::new(x, y)).unwrap();
        }
        let moves = strict.piece_moves(&piece(&strict, 3, 3));
        assert!(!moves.contains(&backward));
        assert!(moves.iter().all(|m| !m.is_capture()));
    }

    #[test]
    fn test_man_cannot_jump_own_piece_or_into_occupied() {
        let board = board_with(&[
            (Color::White, Rank::Man, (2, 2)),
            (Color::White, Rank::Man, (3, 3)),
            (Color::Black, Rank::Man, (1, 3)),
            (Color::Black, Rank::Man, (0, 4)),
        ]);
        let moves = board.piece_moves(&piece(&board, 2, 2));
        assert!(moves.iter().all(|m| !m.is_capture()));
    }

    #[test]
    fn test_king_slides_until_blocked() {
        let board = board_with(&[
            (Color::White, Rank::King, (0, 0)),
            (Color::White, Rank::Man, (4, 4)),
        ]);
        let moves = board.piece_moves(&piece(&board, 0, 0));

        let targets: Vec<_> = moves.iter().map(|m| m.to).collect();
        assert_eq!(targets, vec![Cell::new(1, 1), Cell::new(2, 2), Cell::new(3, 3)]);
    }

    #[test]
    fn test_king_captures_at_every_landing_distance() {
        let board = board_with(&[
            (Color::White, Rank::King, (2, 2)),
            (Color::Black, Rank::Man, (4, 4)),
        ]);
        let moves = board.piece_moves(&piece(&board, 2, 2));

        assert_eq!(moves.len(), 3);
        for land in [5, 6, 7] {
            assert!(moves.contains(&Move::capture(
                Cell::new(2, 2),
                Cell::new(land, land),
                Cell::new(4, 4)
            )));
        }
    }

    #[test]
    fn test_king_blocked_behind_victim() {
        let board = board_with(&[
            (Color::White, Rank::King, (2, 2)),
            (Color::Black, Rank::Man, (4, 4)),
            (Color::Black, Rank::Man, (5, 5)),
        ]);
        let moves = board.piece_moves(&piece(&board, 2, 2));
        assert!(moves.iter().all(|m| !m.is_capture()));
        assert!(moves.contains(&Move::quiet(Cell::new(2, 2), Cell::new(3, 3))));
    }

    #[test]
    fn test_king_landings_stop_at_next_piece() {
        let board = board_with(&[
            (Color::White, Rank::King, (0, 0)),
            (Color::Black, Rank::Man, (2, 2)),
            (Color::White, Rank::Man, (5, 5)),
        ]);
        let moves = board.piece_moves(&piece(&board, 0, 0));
        let landings: Vec<_> = moves.iter().map(|m| m.to).collect();
        assert_eq!(landings, vec![Cell::new(3, 3), Cell::new(4, 4)]);
    }

    #[test]
    fn test_side_wide_capture_hides_quiet_moves() {
        let board = board_with(&[
            (Color::White, Rank::Man, (1, 1)),
            (Color::White, Rank::Man, (5, 1)),
            (Color::Black, Rank::Man, (2, 2)),
        ]);
        let moves = board.side_moves(Color::White);
        assert_eq!(
            moves.as_slice(),
            &[Move::capture(Cell::new(1, 1), Cell::new(3, 3), Cell::new(2, 2))]
        );
    }
}
