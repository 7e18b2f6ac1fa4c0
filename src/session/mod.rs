//! Turn state machine.
//!
//! Sequences whose turn it is, the turn timer, forced continuation
//! captures and game end. Local and remote moves enter through the same
//! `GameSession::apply_move`, so both peers run identical transitions.

pub mod game;
pub mod selection;
pub mod state;

pub use game::GameSession;
pub use selection::{SelectOutcome, Selection};
pub use state::{TurnOutcome, TurnState};
