//! Core types: cells, sides, participants, moves, configuration, RNG, errors.
//!
//! Everything here is plain data shared by the rules engine, the turn state
//! machine and the sync protocol.

pub mod cell;
pub mod player;
pub mod moves;
pub mod config;
pub mod rng;
pub mod error;

pub use cell::{Cell, Direction, BOARD_SIZE, CELL_COUNT};
pub use player::{Color, ParticipantId};
pub use moves::{Move, MoveList, MoveRecord};
pub use config::{RulesConfig, SessionConfig};
pub use rng::DeliveryRng;
pub use error::{BoardError, SessionError, SyncError, WireError};
