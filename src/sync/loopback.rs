//! In-memory session channel for tests and local play.
//!
//! Every (sender, receiver) pair has its own FIFO queue, so per-sender
//! order holds. `deliver_one` picks which non-empty queue goes next with a
//! seeded `DeliveryRng`, so different seeds give different cross-sender
//! interleavings and the same seed replays one exactly. Optionally, wire
//! messages are delivered twice to exercise duplicate handling.
//!
//! ```
//! use draughts_sync::sync::{LoopbackNetwork, NetworkEvent, Transport, WireMessage};
//!
//! let net = LoopbackNetwork::new(3);
//! let mut a = net.join("ann");
//! let b = net.join("bob");
//!
//! a.send_others(&WireMessage::TimeoutTurn { round: 0 }).unwrap();
//!
//! // ann hears that bob joined, bob gets the message; in either order
//! let mut delivered = Vec::new();
//! while let Some((to, event)) = net.deliver_one() {
//!     if to == b.local_id() {
//!         assert!(matches!(event, NetworkEvent::Message { .. }));
//!     }
//!     delivered.push(to);
//! }
//! delivered.sort();
//! assert_eq!(delivered, vec![a.local_id(), b.local_id()]);
//! ```

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use tracing::{debug, trace};

use crate::core::{DeliveryRng, ParticipantId, WireError};

use super::message::WireMessage;
use super::transport::{Member, NetworkEvent, SessionView, Transport};

type Channel = (ParticipantId, ParticipantId);

#[derive(Debug)]
struct Envelope {
    event: NetworkEvent,
    copy: bool,
}

#[derive(Debug)]
struct Hub {
    order: DeliveryRng,
    duplicates: DeliveryRng,
    duplicate_probability: f64,
    members: Vec<Member>,
    next_id: u32,
    // keyed by (sender, receiver)
    queues: BTreeMap<Channel, VecDeque<Envelope>>,
}

impl Hub {
    fn push(&mut self, from: ParticipantId, to: ParticipantId, event: NetworkEvent) {
        self.queues
            .entry((from, to))
            .or_default()
            .push_back(Envelope { event, copy: false });
    }

    fn broadcast(&mut self, from: ParticipantId, event: &NetworkEvent, include_self: bool) {
        let targets: Vec<ParticipantId> = self
            .members
            .iter()
            .map(|m| m.id)
            .filter(|id| include_self || *id != from)
            .collect();
        for to in targets {
            self.push(from, to, event.clone());
        }
    }

    fn is_member(&self, id: ParticipantId) -> bool {
        self.members.iter().any(|m| m.id == id)
    }
}

/// Shared in-memory network. Cloning gives another handle to the same hub.
#[derive(Clone, Debug)]
pub struct LoopbackNetwork {
    hub: Rc<RefCell<Hub>>,
}

impl LoopbackNetwork {
    /// Create an empty network with a delivery seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let mut order = DeliveryRng::new(seed);
        let duplicates = order.fork();
        Self {
            hub: Rc::new(RefCell::new(Hub {
                order,
                duplicates,
                duplicate_probability: 0.0,
                members: Vec::new(),
                next_id: 1,
                queues: BTreeMap::new(),
            })),
        }
    }

    /// Deliver each wire message a second time, right after the first,
    /// with `probability`.
    #[must_use]
    pub fn with_duplicates(self, probability: f64) -> Self {
        self.hub.borrow_mut().duplicate_probability = probability.clamp(0.0, 1.0);
        self
    }

    /// Join the channel. Present members observe `Joined`.
    pub fn join(&self, nickname: impl Into<String>) -> LoopbackEndpoint {
        let mut hub = self.hub.borrow_mut();
        let id = ParticipantId::new(hub.next_id);
        hub.next_id += 1;

        let member = Member::new(id, nickname);
        hub.broadcast(id, &NetworkEvent::Joined(member.clone()), false);
        hub.members.push(member);
        debug!(%id, members = hub.members.len(), "joined loopback channel");

        LoopbackEndpoint {
            id,
            hub: Rc::clone(&self.hub),
        }
    }

    /// Deliver one queued event. Returns the receiver and the event, or
    /// `None` when nothing is in flight.
    pub fn deliver_one(&self) -> Option<(ParticipantId, NetworkEvent)> {
        let mut hub = self.hub.borrow_mut();
        let ready: Vec<Channel> = hub
            .queues
            .iter()
            .filter(|(_, q)| !q.is_empty())
            .map(|(k, _)| *k)
            .collect();
        let channel = ready[hub.order.pick(ready.len())?];

        let probability = hub.duplicate_probability;
        let duplicate = probability > 0.0 && hub.duplicates.gen_bool(probability);
        let queue = hub.queues.get_mut(&channel)?;
        let envelope = queue.pop_front()?;
        if duplicate && !envelope.copy && matches!(envelope.event, NetworkEvent::Message { .. }) {
            trace!(from = %channel.0, to = %channel.1, "duplicating message");
            queue.push_front(Envelope {
                event: envelope.event.clone(),
                copy: true,
            });
        }
        Some((channel.1, envelope.event))
    }

    /// Number of queued events.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.hub.borrow().queues.values().map(VecDeque::len).sum()
    }
}

/// One participant's handle on a `LoopbackNetwork`.
#[derive(Debug)]
pub struct LoopbackEndpoint {
    id: ParticipantId,
    hub: Rc<RefCell<Hub>>,
}

impl Transport for LoopbackEndpoint {
    fn local_id(&self) -> ParticipantId {
        self.id
    }

    fn members(&self) -> Vec<Member> {
        self.hub.borrow().members.clone()
    }

    fn send_others(&mut self, msg: &WireMessage) -> Result<(), WireError> {
        let payload = msg.encode()?;
        let mut hub = self.hub.borrow_mut();
        if !hub.is_member(self.id) {
            debug!(id = %self.id, "send after leaving dropped");
            return Ok(());
        }
        hub.broadcast(self.id, &NetworkEvent::Message { from: self.id, payload }, false);
        Ok(())
    }

    fn load_view(&mut self, view: SessionView) {
        let mut hub = self.hub.borrow_mut();
        if hub.is_member(self.id) {
            hub.broadcast(self.id, &NetworkEvent::ViewLoaded(view), true);
        }
    }

    fn leave(&mut self) {
        let id = self.id;
        let mut hub = self.hub.borrow_mut();
        if !hub.is_member(id) {
            return;
        }
        hub.members.retain(|m| m.id != id);
        hub.queues.retain(|(_, to), _| *to != id);
        hub.broadcast(id, &NetworkEvent::Left(id), false);
        debug!(%id, "left loopback channel");
    }
}
