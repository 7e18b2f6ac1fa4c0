//! Error types.
//!
//! Errors never escape to the input collaborator: rejected selections are
//! reported as outcomes, not errors. These types cover board setup,
//! applying moves that arrived from a peer, and decoding wire messages.

use serde::{Deserialize, Serialize};

use super::cell::Cell;
use super::player::{Color, ParticipantId};

/// Errors raised by board mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum BoardError {
    /// Cell lies outside the board.
    #[error("cell {0} is outside the board")]
    OutOfBounds(Cell),
    /// Cell is not one of the playable diagonal squares.
    #[error("cell {0} is not playable")]
    Unplayable(Cell),
    /// Cell already holds a piece.
    #[error("cell {0} is occupied")]
    Occupied(Cell),
    /// No piece stands on the origin of a move.
    #[error("no piece on {0}")]
    EmptyOrigin(Cell),
}

/// Errors raised by the turn state machine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum SessionError {
    /// The game has already ended.
    #[error("game is already over")]
    GameOver,
    /// The moving piece does not belong to the side to move.
    #[error("not your turn - it is {expected}'s turn")]
    NotYourTurn {
        /// Side to move.
        expected: Color,
    },
    /// A continuation capture must be made with the pinned piece.
    #[error("piece on {pinned} must keep capturing")]
    PinnedPiece {
        /// Position of the pinned piece.
        pinned: Cell,
    },
    /// The move could not be applied to the board.
    #[error(transparent)]
    Board(#[from] BoardError),
}

/// Errors raised while decoding wire messages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum WireError {
    /// Bytes did not decode to a message.
    #[error("malformed message: {0}")]
    Decode(String),
    /// Message could not be encoded.
    #[error("failed to encode message: {0}")]
    Encode(String),
    /// A coordinate lies outside `[0, 7]`.
    #[error("coordinate {0} out of range")]
    CoordinateOutOfRange(i8),
    /// Result flag is not -1, 0 or +1.
    #[error("invalid result flag {0}")]
    InvalidResult(i8),
    /// Rematch choice is not -1 or +1.
    #[error("invalid rematch choice {0}")]
    InvalidChoice(i8),
}

/// Errors raised by a peer while processing local input or network events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum SyncError {
    /// The local participant has no seat in the roster.
    #[error("{0} is not seated")]
    NotSeated(ParticipantId),
    #[error(transparent)]
    Wire(#[from] WireError),
    #[error(transparent)]
    Session(#[from] SessionError),
}
