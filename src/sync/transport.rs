//! Transport collaborator.
//!
//! The transport connects participants on one session channel. It only
//! has to preserve per-sender delivery order; messages from different
//! senders may interleave arbitrarily.

use serde::{Deserialize, Serialize};

use crate::core::{ParticipantId, WireError};

use super::message::WireMessage;

/// A session view the coordinator can ask every participant to load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionView {
    /// A fresh game.
    Game,
    /// The result screen with rematch negotiation.
    Result,
}

/// A connected participant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: ParticipantId,
    pub nickname: String,
}

impl Member {
    #[must_use]
    pub fn new(id: ParticipantId, nickname: impl Into<String>) -> Self {
        Self {
            id,
            nickname: nickname.into(),
        }
    }
}

/// Something the transport delivers to one participant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NetworkEvent {
    /// Encoded `WireMessage` from another participant.
    Message { from: ParticipantId, payload: Vec<u8> },
    /// A participant joined the channel.
    Joined(Member),
    /// A participant left the channel.
    Left(ParticipantId),
    /// The coordinator switched every participant to `view`.
    ViewLoaded(SessionView),
}

/// Session channel as seen by one participant.
pub trait Transport {
    /// The local participant.
    fn local_id(&self) -> ParticipantId;

    /// Present participants in join order.
    fn members(&self) -> Vec<Member>;

    /// Send to every other participant.
    fn send_others(&mut self, msg: &WireMessage) -> Result<(), WireError>;

    /// Switch every participant, this one included, to `view`.
    fn load_view(&mut self, view: SessionView);

    /// Leave the channel. Remaining participants observe `Left`.
    fn leave(&mut self);
}
