//! Rematch negotiation: a round-keyed agreement machine.
//!
//! Choices from different participants may arrive in any relative order,
//! and any message may arrive twice. Every transition therefore looks at
//! the whole choice map, and each terminal transition sits behind a
//! one-shot guard that is only reset when a newer round opens.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::ParticipantId;

/// A participant's answer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Choice {
    #[default]
    Undecided,
    Accept,
    Decline,
}

impl Choice {
    /// Wire value: +1 accept, -1 decline, 0 undecided.
    #[must_use]
    pub const fn flag(self) -> i8 {
        match self {
            Choice::Accept => 1,
            Choice::Undecided => 0,
            Choice::Decline => -1,
        }
    }

    /// Parse a wire value. Only decided answers travel on the wire.
    #[must_use]
    pub const fn from_flag(flag: i8) -> Option<Self> {
        match flag {
            1 => Some(Choice::Accept),
            -1 => Some(Choice::Decline),
            _ => None,
        }
    }
}

/// What the owner of the session must do after a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RematchStep {
    /// A round opened: show the response panel.
    Opened { round: u32 },
    /// The local participant accepted and is waiting for the others.
    Waiting,
    /// Someone declined: broadcast `Declined` for `round` (once).
    BroadcastDecline { round: u32 },
    /// Everyone accepted (fires once).
    Accepted,
    /// A decline was observed (fires once): leave for the outer menu.
    Declined,
}

/// Negotiation state for one result screen.
#[derive(Clone, Debug)]
pub struct RematchSession {
    local: ParticipantId,
    choices: FxHashMap<ParticipantId, Choice>,
    round: u32,
    decline_broadcast: bool,
    accepted: bool,
    declined: bool,
}

impl RematchSession {
    /// Start with every known participant undecided and no round open.
    #[must_use]
    pub fn new(local: ParticipantId, participants: impl IntoIterator<Item = ParticipantId>) -> Self {
        let mut choices: FxHashMap<ParticipantId, Choice> =
            participants.into_iter().map(|p| (p, Choice::Undecided)).collect();
        choices.entry(local).or_default();
        Self {
            local,
            choices,
            round: 0,
            decline_broadcast: false,
            accepted: false,
            declined: false,
        }
    }

    /// Current round. 0 means no round has been opened yet.
    #[must_use]
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Round number to use when asking locally.
    #[must_use]
    pub fn next_round(&self) -> u32 {
        self.round + 1
    }

    #[must_use]
    pub fn choice(&self, participant: ParticipantId) -> Option<Choice> {
        self.choices.get(&participant).copied()
    }

    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    #[must_use]
    pub fn is_declined(&self) -> bool {
        self.declined
    }

    /// Negotiation is over once accepted or declined.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.accepted || self.declined
    }

    /// Handle `AskRematch`.
    ///
    /// A newer round reseats `participants` (the present roster), all
    /// undecided, and resets the guards. Repeating the current round, or
    /// replaying an older one, changes nothing.
    pub fn ask(&mut self, round: u32, participants: impl IntoIterator<Item = ParticipantId>) -> Option<RematchStep> {
        if self.is_resolved() || round <= self.round {
            debug!(round, current = self.round, "rematch ask ignored");
            return None;
        }
        self.open(round, participants);
        Some(RematchStep::Opened { round })
    }

    fn open(&mut self, round: u32, participants: impl IntoIterator<Item = ParticipantId>) {
        self.choices = participants.into_iter().map(|p| (p, Choice::Undecided)).collect();
        self.choices.entry(self.local).or_default();
        self.round = round;
        self.decline_broadcast = false;
        info!(round, participants = self.choices.len(), "rematch round opened");
    }

    /// Handle `SetChoice`. A choice for a newer round opens that round
    /// first, seating `participants` as `ask` does.
    pub fn set_choice(
        &mut self,
        participant: ParticipantId,
        choice: Choice,
        round: u32,
        participants: impl IntoIterator<Item = ParticipantId>,
    ) -> Vec<RematchStep> {
        let mut steps = Vec::new();
        if self.is_resolved() || round < self.round {
            debug!(%participant, round, "rematch choice ignored");
            return steps;
        }
        let newer = round > self.round;
        let reseat: Vec<ParticipantId> = if newer {
            participants.into_iter().collect()
        } else {
            Vec::new()
        };
        let known = if newer {
            participant == self.local || reseat.contains(&participant)
        } else {
            self.choices.contains_key(&participant)
        };
        if !known {
            warn!(%participant, "rematch choice from unknown participant ignored");
            return steps;
        }
        if newer {
            // The chooser saw an ask we have not received yet.
            self.open(round, reseat);
            steps.push(RematchStep::Opened { round });
        }

        self.choices.insert(participant, choice);
        if participant == self.local && choice == Choice::Accept {
            steps.push(RematchStep::Waiting);
        }

        steps.extend(self.evaluate());
        steps
    }

    /// Handle a participant leaving: an implicit decline.
    pub fn participant_left(&mut self, participant: ParticipantId) -> Vec<RematchStep> {
        if self.is_resolved() {
            return Vec::new();
        }
        match self.choices.get_mut(&participant) {
            Some(choice) => *choice = Choice::Decline,
            None => {
                warn!(%participant, "unknown participant left");
                return Vec::new();
            }
        }
        self.evaluate().into_iter().collect()
    }

    /// Handle `Declined`. Fires once; later declines, and declines arriving
    /// after acceptance, are absorbed.
    pub fn declined(&mut self, round: u32) -> Option<RematchStep> {
        if self.is_resolved() || round < self.round {
            debug!(round, "duplicate decline absorbed");
            return None;
        }
        self.declined = true;
        info!(round, "rematch declined");
        Some(RematchStep::Declined)
    }

    fn evaluate(&mut self) -> Option<RematchStep> {
        if self.choices.values().any(|c| *c == Choice::Decline) {
            if self.decline_broadcast {
                return None;
            }
            self.decline_broadcast = true;
            return Some(RematchStep::BroadcastDecline { round: self.round });
        }

        if self.choices.values().all(|c| *c == Choice::Accept) && !self.accepted {
            self.accepted = true;
            info!(round = self.round, "rematch accepted");
            return Some(RematchStep::Accepted);
        }
        None
    }
}
