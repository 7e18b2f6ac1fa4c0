//! Peer synchronization.
//!
//! Each participant runs a full replica of the game. Moves, timeouts, the
//! end of the game and rematch negotiation travel as `WireMessage`s over a
//! `Transport` that only guarantees per-sender ordering; `Peer` applies
//! them through one entry point with once-only guards, so duplicated or
//! crossing messages leave every replica in the same state.

pub mod message;
pub mod transport;
pub mod roster;
pub mod loopback;
pub mod peer;

pub use message::{parse_choice, parse_result, MoveDescriptor, WireMessage};
pub use transport::{Member, NetworkEvent, SessionView, Transport};
pub use roster::Roster;
pub use loopback::{LoopbackEndpoint, LoopbackNetwork};
pub use peer::{Origin, Peer, PeerEvent, Phase};
