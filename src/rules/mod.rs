//! Rules engine: board, move generation, terminal detection.
//!
//! The board is an owned arena; move generation returns derived move sets
//! and never reaches into presentation state. The engine is deterministic:
//! two boards fed the same move sequence stay identical, which is what the
//! peer sync protocol relies on.

pub mod board;
pub mod engine;
mod movegen;

pub use board::{promotion_row, Board, Piece, Rank, STARTING_ROWS};
pub use engine::{GameResult, Outcome, RulesEngine};
