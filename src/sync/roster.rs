//! Seating by join order.
//!
//! The first participant to join plays `first_color` and coordinates the
//! session (loads views, opens rematch rounds); the second plays the other
//! color. Anyone after that watches.

use crate::core::{Color, ParticipantId};

use super::transport::Member;

/// Present participants in join order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Roster {
    members: Vec<Member>,
}

impl Roster {
    #[must_use]
    pub fn new(members: Vec<Member>) -> Self {
        Self { members }
    }

    /// Append a newcomer. A repeated join is ignored.
    pub fn add(&mut self, member: Member) -> bool {
        if self.contains(member.id) {
            return false;
        }
        self.members.push(member);
        true
    }

    /// Remove a participant. Later joiners move up a seat.
    pub fn remove(&mut self, id: ParticipantId) -> Option<Member> {
        let pos = self.members.iter().position(|m| m.id == id)?;
        Some(self.members.remove(pos))
    }

    #[must_use]
    pub fn contains(&self, id: ParticipantId) -> bool {
        self.members.iter().any(|m| m.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        self.members.iter().map(|m| m.id)
    }

    /// The coordinating participant: the earliest joiner still present.
    #[must_use]
    pub fn coordinator(&self) -> Option<ParticipantId> {
        self.members.first().map(|m| m.id)
    }

    /// Seat color of `id`, or `None` for spectators and strangers.
    #[must_use]
    pub fn color_of(&self, id: ParticipantId, first_color: Color) -> Option<Color> {
        match self.members.iter().position(|m| m.id == id)? {
            0 => Some(first_color),
            1 => Some(first_color.opponent()),
            _ => None,
        }
    }

    /// Nickname, or `Player<id>` when it is empty or the id is unknown.
    #[must_use]
    pub fn display_name(&self, id: ParticipantId) -> String {
        self.members
            .iter()
            .find(|m| m.id == id && !m.nickname.is_empty())
            .map_or_else(|| format!("Player{}", id.raw()), |m| m.nickname.clone())
    }
}
