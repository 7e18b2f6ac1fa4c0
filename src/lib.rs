//! # draughts-sync
//!
//! A two-player draughts engine kept in sync between peers.
//!
//! ## Design Principles
//!
//! 1. **Deterministic Rules**: The rules engine is a pure function of the
//!    board and the rule switches. Two replicas fed the same moves stay
//!    identical, so peers exchange moves, not boards.
//!
//! 2. **Trusted Peers**: A received move is applied without re-deriving
//!    legality. Only structural checks (bounds, origin piece, turn) guard
//!    against diverged replicas.
//!
//! 3. **Idempotent Protocol**: Any message may arrive twice and messages
//!    from different senders may cross. Every transition that must happen
//!    once sits behind a round-keyed guard.
//!
//! ## Architecture
//!
//! - **Single Entry Point**: Local input and remote messages both go
//!   through `Peer::dispatch`. A local message is applied first, then sent.
//!
//! - **Persistent History**: Applied moves are kept in an `im::Vector`, so
//!   sessions clone cheaply for comparison across replicas.
//!
//! ## Modules
//!
//! - `core`: Cells, colors, participants, moves, configuration, RNG, errors
//! - `rules`: Board, move generation, `RulesEngine` trait, game results
//! - `session`: Turn state machine, timer, selection handling
//! - `sync`: Wire messages, transport trait, roster, loopback network, peers
//! - `rematch`: Post-game rematch negotiation
//! - `stats`: Per-player result bookkeeping

pub mod core;
pub mod rules;
pub mod session;
pub mod sync;
pub mod rematch;
pub mod stats;

// Re-export commonly used types
pub use crate::core::{
    Cell, Color, ParticipantId,
    Move, MoveList, MoveRecord,
    RulesConfig, SessionConfig,
    BoardError, SessionError, SyncError, WireError,
};

pub use crate::rules::{Board, GameResult, Outcome, Piece, Rank, RulesEngine};

pub use crate::session::{GameSession, SelectOutcome, TurnOutcome, TurnState};

pub use crate::sync::{
    LoopbackEndpoint, LoopbackNetwork, NetworkEvent, Peer, PeerEvent, Phase,
    SessionView, Transport, WireMessage,
};

pub use crate::rematch::{Choice, RematchSession, RematchStep};

pub use crate::stats::{MemoryStats, PlayerStats, StatsIdentity, StatsStore};
