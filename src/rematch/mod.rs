//! Post-game rematch negotiation.
//!
//! Independent of the board: participants answer accept or decline, any
//! decline ends the negotiation for everyone, and unanimous acceptance
//! starts a fresh game on the same channel.

mod negotiation;

pub use negotiation::{Choice, RematchSession, RematchStep};
