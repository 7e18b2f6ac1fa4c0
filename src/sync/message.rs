//! Wire messages exchanged between peers.
//!
//! Fields are the minimal semantic content. Encoding uses `bincode`; the
//! transport only ever sees bytes.
//!
//! ```
//! use draughts_sync::core::{Cell, Move};
//! use draughts_sync::sync::WireMessage;
//!
//! let mv = Move::capture(Cell::new(1, 2), Cell::new(3, 4), Cell::new(2, 3));
//! let msg = WireMessage::apply_move(&mv);
//! let bytes = msg.encode().unwrap();
//! assert_eq!(WireMessage::decode(&bytes).unwrap(), msg);
//! ```

use serde::{Deserialize, Serialize};

use crate::core::{Cell, Move, ParticipantId, WireError, BOARD_SIZE};
use crate::rematch::Choice;
use crate::rules::GameResult;

/// Compact move descriptor. Capture coordinates are -1 when absent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveDescriptor {
    pub from_x: i8,
    pub from_y: i8,
    pub to_x: i8,
    pub to_y: i8,
    pub has_capture: bool,
    pub cap_x: i8,
    pub cap_y: i8,
}

impl From<&Move> for MoveDescriptor {
    fn from(mv: &Move) -> Self {
        let (cap_x, cap_y) = mv.captured.map_or((-1, -1), |c| (c.x, c.y));
        Self {
            from_x: mv.from.x,
            from_y: mv.from.y,
            to_x: mv.to.x,
            to_y: mv.to.y,
            has_capture: mv.captured.is_some(),
            cap_x,
            cap_y,
        }
    }
}

impl TryFrom<MoveDescriptor> for Move {
    type Error = WireError;

    fn try_from(d: MoveDescriptor) -> Result<Self, Self::Error> {
        let from = cell(d.from_x, d.from_y)?;
        let to = cell(d.to_x, d.to_y)?;
        if d.has_capture {
            Ok(Move::capture(from, to, cell(d.cap_x, d.cap_y)?))
        } else {
            Ok(Move::quiet(from, to))
        }
    }
}

fn cell(x: i8, y: i8) -> Result<Cell, WireError> {
    for v in [x, y] {
        if !(0..BOARD_SIZE).contains(&v) {
            return Err(WireError::CoordinateOutOfRange(v));
        }
    }
    Ok(Cell::new(x, y))
}

/// A message between peers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireMessage {
    /// A move the sender drew from its own legal move set.
    ApplyMove(MoveDescriptor),

    /// The turn timer of `round` ran out.
    TimeoutTurn { round: u32 },

    /// The game ended: -1 White wins, 0 draw, +1 Black wins.
    EndGame { result: i8 },

    /// Open rematch negotiation round `round`.
    AskRematch { round: u32 },

    /// A participant's rematch answer: +1 accept, -1 decline.
    SetChoice {
        participant: ParticipantId,
        value: i8,
        round: u32,
    },

    /// Someone declined the rematch in `round`.
    Declined { round: u32 },
}

impl WireMessage {
    #[must_use]
    pub fn apply_move(mv: &Move) -> Self {
        WireMessage::ApplyMove(mv.into())
    }

    #[must_use]
    pub fn end_game(result: GameResult) -> Self {
        WireMessage::EndGame {
            result: result.flag(),
        }
    }

    #[must_use]
    pub fn set_choice(participant: ParticipantId, choice: Choice, round: u32) -> Self {
        WireMessage::SetChoice {
            participant,
            value: choice.flag(),
            round,
        }
    }

    /// Encode to bytes.
    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        bincode::serialize(self).map_err(|e| WireError::Encode(e.to_string()))
    }

    /// Decode from bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        bincode::deserialize(bytes).map_err(|e| WireError::Decode(e.to_string()))
    }
}

/// Parse an `EndGame` flag.
pub fn parse_result(flag: i8) -> Result<GameResult, WireError> {
    GameResult::from_flag(flag).ok_or(WireError::InvalidResult(flag))
}

/// Parse a `SetChoice` value.
pub fn parse_choice(value: i8) -> Result<Choice, WireError> {
    Choice::from_flag(value).ok_or(WireError::InvalidChoice(value))
}
