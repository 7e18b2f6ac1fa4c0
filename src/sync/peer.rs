//! One participant's view of a synchronized game.
//!
//! A `Peer` owns a full replica of the game and a transport handle. Local
//! input and remote messages go through the same `dispatch` entry point:
//! a locally originated message is applied here first and then sent to
//! everyone else, a remote one is only applied. Peers trust each other's
//! moves; the rules engine is deterministic, so identical move sequences
//! keep the replicas identical.
//!
//! ## Once-only guards
//!
//! - Timeouts carry the turn round they expire. Only the participant who
//!   owns the turn raises one, and a round can only pass once.
//! - Every peer announces `EndGame` when its replica finishes. The first
//!   announcement observed wins; the rest are absorbed.
//! - Rematch guards live in `RematchSession`.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::core::{Cell, Color, Move, MoveList, ParticipantId, SessionConfig, SyncError};
use crate::rematch::{Choice, RematchSession, RematchStep};
use crate::rules::{GameResult, Outcome};
use crate::session::{GameSession, SelectOutcome, TurnOutcome};
use crate::stats::{record_result, StatsIdentity, StatsStore};

use super::message::{parse_choice, parse_result, WireMessage};
use super::roster::Roster;
use super::transport::{NetworkEvent, SessionView, Transport};

/// Where a message came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    Local,
    Remote(ParticipantId),
}

/// Which screen the participant is on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Playing,
    Results,
    /// Left the session for the outer menu. Terminal.
    Menu,
}

/// Notifications for the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PeerEvent {
    /// Highlight the destinations of the piece on `from`.
    ShowHints { from: Cell, moves: MoveList },
    ClearHints,
    /// A move was applied to the replica.
    MoveApplied(Move),
    TurnChanged { turn: Color },
    /// The game ended with `result`; `outcome` is the local point of view
    /// (`None` for spectators).
    GameEnded {
        result: GameResult,
        outcome: Option<Outcome>,
    },
    RematchAsked { round: u32 },
    RematchWaiting,
    RematchAccepted,
    RematchDeclined,
    NewGame,
    ReturnedToMenu,
}

/// Follow-up work queued by a message, run after it has been sent.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Reaction {
    /// Dispatch a locally originated message.
    Announce(WireMessage),
    LoadView(SessionView),
}

/// A participant in a synchronized game.
#[derive(Debug)]
pub struct Peer<T: Transport, S: StatsStore> {
    transport: T,
    stats: S,
    identity: StatsIdentity,
    config: SessionConfig,
    roster: Roster,
    color: Option<Color>,
    game: GameSession,
    finished: bool,
    rematch: Option<RematchSession>,
    phase: Phase,
    exit_in: Option<Duration>,
    events: Vec<PeerEvent>,
}

impl<T: Transport, S: StatsStore> Peer<T, S> {
    /// Seat the local participant by join order and start a game.
    pub fn new(transport: T, stats: S, identity: StatsIdentity, config: SessionConfig) -> Result<Self, SyncError> {
        let roster = Roster::new(transport.members());
        let local = transport.local_id();
        if !roster.contains(local) {
            return Err(SyncError::NotSeated(local));
        }
        let color = roster.color_of(local, config.first_color);
        info!(%local, ?color, coordinator = ?roster.coordinator(), "peer seated");

        Ok(Self {
            game: GameSession::new(config.clone()),
            transport,
            stats,
            identity,
            config,
            roster,
            color,
            finished: false,
            rematch: None,
            phase: Phase::Playing,
            exit_in: None,
            events: Vec::new(),
        })
    }

    // === Accessors ===

    #[must_use]
    pub fn id(&self) -> ParticipantId {
        self.transport.local_id()
    }

    /// Seat color, or `None` for a spectator.
    #[must_use]
    pub fn color(&self) -> Option<Color> {
        self.color
    }

    #[must_use]
    pub fn is_coordinator(&self) -> bool {
        self.roster.coordinator() == Some(self.id())
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn game(&self) -> &GameSession {
        &self.game
    }

    #[must_use]
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    #[must_use]
    pub fn rematch(&self) -> Option<&RematchSession> {
        self.rematch.as_ref()
    }

    #[must_use]
    pub fn stats(&self) -> &S {
        &self.stats
    }

    #[must_use]
    pub fn identity(&self) -> &StatsIdentity {
        &self.identity
    }

    /// Time until a scheduled exit to the menu, if one is pending.
    #[must_use]
    pub fn exit_pending(&self) -> Option<Duration> {
        self.exit_in
    }

    /// Take the notifications raised since the last call.
    pub fn drain_events(&mut self) -> Vec<PeerEvent> {
        std::mem::take(&mut self.events)
    }

    // === Local input ===

    /// A click on `cell`. Picks a piece, or moves the picked piece.
    pub fn click(&mut self, cell: Cell) -> Result<(), SyncError> {
        let Some(color) = self.color else {
            return Ok(());
        };
        if self.phase != Phase::Playing {
            return Ok(());
        }
        match self.game.select(cell, color) {
            SelectOutcome::Ignored => self.events.push(PeerEvent::ClearHints),
            SelectOutcome::Selected { from, moves } => self.events.push(PeerEvent::ShowHints { from, moves }),
            SelectOutcome::Rejected { pinned, moves } => {
                debug!(%cell, %pinned, "click outside pinned continuation");
                self.events.push(PeerEvent::ShowHints { from: pinned, moves });
            }
            SelectOutcome::Chosen(mv) => self.dispatch(Origin::Local, WireMessage::apply_move(&mv))?,
        }
        Ok(())
    }

    /// Advance clocks by `elapsed`.
    ///
    /// Every replica counts the turn timer down for display, but only the
    /// owner of the turn raises the timeout.
    pub fn tick(&mut self, elapsed: Duration) -> Result<(), SyncError> {
        if let Some(left) = self.exit_in {
            let left = left.saturating_sub(elapsed);
            if left.is_zero() {
                self.leave();
                return Ok(());
            }
            self.exit_in = Some(left);
        }

        if self.phase != Phase::Playing || self.finished {
            return Ok(());
        }
        let expired = self.game.tick(elapsed);
        if expired && self.color.is_some() && self.game.turn() == self.color {
            let round = self.game.round();
            self.dispatch(Origin::Local, WireMessage::TimeoutTurn { round })?;
        }
        Ok(())
    }

    /// Open a new rematch round from the result screen.
    pub fn ask_rematch(&mut self) -> Result<(), SyncError> {
        let Some(round) = self.rematch.as_ref().map(RematchSession::next_round) else {
            return Ok(());
        };
        self.dispatch(Origin::Local, WireMessage::AskRematch { round })
    }

    /// Answer the open rematch round.
    pub fn choose_rematch(&mut self, accept: bool) -> Result<(), SyncError> {
        let Some(round) = self.rematch.as_ref().map(RematchSession::round) else {
            return Ok(());
        };
        let choice = if accept { Choice::Accept } else { Choice::Decline };
        let msg = WireMessage::set_choice(self.id(), choice, round);
        self.dispatch(Origin::Local, msg)
    }

    /// Leave for the outer menu. Ends the game if it is still running and
    /// cancels any scheduled exit.
    pub fn leave(&mut self) {
        if self.phase == Phase::Menu {
            return;
        }
        self.game.terminate();
        self.exit_in = None;
        self.phase = Phase::Menu;
        self.transport.leave();
        info!(id = %self.id(), "returned to menu");
        self.events.push(PeerEvent::ReturnedToMenu);
    }

    // === Network input ===

    /// Handle one event from the transport.
    ///
    /// Malformed messages are logged and returned as errors; they never
    /// change state.
    pub fn handle(&mut self, event: NetworkEvent) -> Result<(), SyncError> {
        if self.phase == Phase::Menu {
            return Ok(());
        }
        match event {
            NetworkEvent::Message { from, payload } => {
                if !self.roster.contains(from) {
                    warn!(%from, "message from unknown participant ignored");
                    return Ok(());
                }
                let msg = WireMessage::decode(&payload).map_err(|e| {
                    warn!(%from, error = %e, "dropping malformed message");
                    e
                })?;
                self.dispatch(Origin::Remote(from), msg)
            }
            NetworkEvent::Joined(member) => {
                debug!(id = %member.id, "participant joined");
                self.roster.add(member);
                Ok(())
            }
            NetworkEvent::Left(id) => {
                self.participant_left(id);
                Ok(())
            }
            NetworkEvent::ViewLoaded(view) => self.view_loaded(view),
        }
    }

    /// Single entry point for every protocol message.
    ///
    /// A message absorbed by a guard is not broadcast. Reactions (an
    /// `EndGame` after the last move, a `Declined` after a decline, a view
    /// switch) run only after the triggering message has been sent, so
    /// every receiver sees them in causal order.
    pub fn dispatch(&mut self, origin: Origin, msg: WireMessage) -> Result<(), SyncError> {
        if self.phase == Phase::Menu {
            return Ok(());
        }
        let reactions = self.apply(origin, &msg).map_err(|e| {
            warn!(?origin, ?msg, error = %e, "message rejected");
            e
        })?;
        let Some(reactions) = reactions else {
            return Ok(());
        };
        if origin == Origin::Local {
            self.transport.send_others(&msg)?;
        }
        self.react(reactions)
    }

    fn react(&mut self, reactions: Vec<Reaction>) -> Result<(), SyncError> {
        for reaction in reactions {
            match reaction {
                Reaction::Announce(msg) => self.dispatch(Origin::Local, msg)?,
                Reaction::LoadView(view) => self.transport.load_view(view),
            }
        }
        Ok(())
    }

    /// Apply a message to local state. `None` means a guard absorbed it.
    fn apply(&mut self, origin: Origin, msg: &WireMessage) -> Result<Option<Vec<Reaction>>, SyncError> {
        match *msg {
            WireMessage::ApplyMove(descriptor) => {
                let mv = Move::try_from(descriptor)?;
                if self.phase != Phase::Playing || self.finished {
                    debug!(%mv, "move after game end ignored");
                    return Ok(None);
                }
                let outcome = self.game.apply_move(&mv)?;
                self.events.push(PeerEvent::MoveApplied(mv));
                Ok(Some(self.on_turn_outcome(outcome)))
            }
            WireMessage::TimeoutTurn { round } => Ok(self.game.timeout(round).map(|o| self.on_turn_outcome(o))),
            WireMessage::EndGame { result } => {
                let result = parse_result(result)?;
                Ok(self.on_end_game(result))
            }
            WireMessage::AskRematch { round } => {
                let seats: Vec<ParticipantId> = self.roster.ids().collect();
                let step = self.rematch_session().and_then(|r| r.ask(round, seats));
                Ok(step.map(|step| self.on_rematch_steps(vec![step])))
            }
            WireMessage::SetChoice {
                participant,
                value,
                round,
            } => {
                let choice = parse_choice(value)?;
                if let Origin::Remote(from) = origin {
                    if from != participant {
                        warn!(%from, %participant, "choice on behalf of another participant ignored");
                        return Ok(None);
                    }
                }
                let seats: Vec<ParticipantId> = self.roster.ids().collect();
                let steps = self
                    .rematch_session()
                    .map(|r| r.set_choice(participant, choice, round, seats));
                Ok(steps.map(|steps| self.on_rematch_steps(steps)))
            }
            WireMessage::Declined { round } => {
                let step = self.rematch_session().and_then(|r| r.declined(round));
                Ok(step.map(|step| self.on_rematch_steps(vec![step])))
            }
        }
    }

    fn on_turn_outcome(&mut self, outcome: TurnOutcome) -> Vec<Reaction> {
        match outcome {
            TurnOutcome::Continue { pinned, moves } => {
                if self.game.turn() == self.color {
                    self.events.push(PeerEvent::ShowHints { from: pinned, moves });
                }
                Vec::new()
            }
            TurnOutcome::Passed { to } => {
                self.events.push(PeerEvent::ClearHints);
                self.events.push(PeerEvent::TurnChanged { turn: to });
                Vec::new()
            }
            TurnOutcome::Finished(result) => {
                self.events.push(PeerEvent::ClearHints);
                vec![Reaction::Announce(WireMessage::end_game(result))]
            }
        }
    }

    /// First observation of the game end: record stats, notify, and have
    /// the coordinator move everyone to the result screen.
    fn on_end_game(&mut self, result: GameResult) -> Option<Vec<Reaction>> {
        if self.finished {
            debug!(?result, "duplicate end of game absorbed");
            return None;
        }
        self.finished = true;
        self.game.finish(result);

        let outcome = self.color.map(|c| result.outcome_for(c));
        if let Some(outcome) = outcome {
            record_result(&mut self.stats, &self.identity, outcome);
        }
        info!(?result, ?outcome, "game over");
        self.events.push(PeerEvent::GameEnded { result, outcome });

        if self.is_coordinator() {
            Some(vec![Reaction::LoadView(SessionView::Result)])
        } else {
            Some(Vec::new())
        }
    }

    fn on_rematch_steps(&mut self, steps: Vec<RematchStep>) -> Vec<Reaction> {
        let mut reactions = Vec::new();
        for step in steps {
            match step {
                RematchStep::Opened { round } => self.events.push(PeerEvent::RematchAsked { round }),
                RematchStep::Waiting => self.events.push(PeerEvent::RematchWaiting),
                RematchStep::BroadcastDecline { round } => {
                    reactions.push(Reaction::Announce(WireMessage::Declined { round }));
                }
                RematchStep::Accepted => {
                    self.events.push(PeerEvent::RematchAccepted);
                    if self.is_coordinator() {
                        reactions.push(Reaction::LoadView(SessionView::Game));
                    }
                }
                RematchStep::Declined => {
                    self.events.push(PeerEvent::RematchDeclined);
                    self.exit_in = Some(self.config.decline_exit_delay);
                }
            }
        }
        reactions
    }

    /// The rematch session, created on first use once the game is over.
    fn rematch_session(&mut self) -> Option<&mut RematchSession> {
        if !self.finished {
            debug!("rematch message before game end ignored");
            return None;
        }
        if self.rematch.is_none() {
            self.rematch = Some(RematchSession::new(self.id(), self.roster.ids()));
        }
        self.rematch.as_mut()
    }

    fn view_loaded(&mut self, view: SessionView) -> Result<(), SyncError> {
        match view {
            SessionView::Result => {
                if !self.finished || self.phase == Phase::Results {
                    warn!(finished = self.finished, "result view ignored");
                    return Ok(());
                }
                self.phase = Phase::Results;
                if self.rematch_session().is_some() && self.is_coordinator() {
                    self.ask_rematch()?;
                }
            }
            SessionView::Game => {
                if !self.finished {
                    debug!("game view during a running game ignored");
                    return Ok(());
                }
                self.game = GameSession::new(self.config.clone());
                self.color = self.roster.color_of(self.id(), self.config.first_color);
                self.finished = false;
                self.rematch = None;
                self.exit_in = None;
                self.phase = Phase::Playing;
                info!(color = ?self.color, "new game");
                self.events.push(PeerEvent::NewGame);
            }
        }
        Ok(())
    }

    fn participant_left(&mut self, id: ParticipantId) {
        if !self.roster.contains(id) {
            return;
        }
        if self.finished && self.rematch.is_none() {
            // The leaver must still hold a seat in the negotiation.
            self.rematch = Some(RematchSession::new(self.id(), self.roster.ids()));
        }
        let seated = self.roster.color_of(id, self.config.first_color).is_some();
        self.roster.remove(id);
        info!(%id, seated, finished = self.finished, "participant left");
        if !self.finished {
            if seated {
                // Nobody to play against.
                self.leave();
            }
            return;
        }
        let steps = self
            .rematch_session()
            .map(|r| r.participant_left(id))
            .unwrap_or_default();
        let reactions = self.on_rematch_steps(steps);
        if let Err(e) = self.react(reactions) {
            warn!(error = %e, "failed to announce decline");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{MemoryStats, PlayerStats};
    use crate::sync::LoopbackNetwork;
    use crate::sync::LoopbackEndpoint;

    type TestPeer = Peer<LoopbackEndpoint, MemoryStats>;

    fn pair(seed: u64) -> (LoopbackNetwork, TestPeer, TestPeer) {
        let net = LoopbackNetwork::new(seed);
        let a = net.join("ann");
        let b = net.join("bob");
        while net.deliver_one().is_some() {}

        let config = SessionConfig::default();
        let white = Peer::new(a, MemoryStats::new(), StatsIdentity::Nickname("ann".into()), config.clone()).unwrap();
        let black = Peer::new(b, MemoryStats::new(), StatsIdentity::Nickname("bob".into()), config).unwrap();
        (net, white, black)
    }

    fn pump(net: &LoopbackNetwork, white: &mut TestPeer, black: &mut TestPeer) {
        while let Some((to, event)) = net.deliver_one() {
            let peer = if to == white.id() { &mut *white } else { &mut *black };
            peer.handle(event).unwrap();
        }
    }

    #[test]
    fn test_seating() {
        let (_net, white, black) = pair(0);
        assert_eq!(white.color(), Some(Color::White));
        assert_eq!(black.color(), Some(Color::Black));
        assert!(white.is_coordinator());
        assert!(!black.is_coordinator());
    }

    #[test]
    fn test_move_replicates() {
        let (net, mut white, mut black) = pair(1);
        white.click(Cell::new(2, 2)).unwrap();
        white.click(Cell::new(3, 3)).unwrap();
        pump(&net, &mut white, &mut black);

        assert_eq!(white.game().board(), black.game().board());
        assert_eq!(black.game().turn(), Some(Color::Black));
        assert!(black
            .drain_events()
            .contains(&PeerEvent::TurnChanged { turn: Color::Black }));
    }

    #[test]
    fn test_only_turn_owner_times_out() {
        let (net, mut white, mut black) = pair(2);
        black.tick(Duration::from_secs(31)).unwrap();
        assert_eq!(net.pending(), 0);

        white.tick(Duration::from_secs(31)).unwrap();
        pump(&net, &mut white, &mut black);
        assert_eq!(white.game().turn(), Some(Color::Black));
        assert_eq!(black.game().turn(), Some(Color::Black));
        assert_eq!(black.game().round(), 1);
    }

    #[test]
    fn test_leave_mid_game_exits_opponent() {
        let (net, mut white, mut black) = pair(3);
        black.leave();
        pump(&net, &mut white, &mut black);

        assert_eq!(white.phase(), Phase::Menu);
        assert!(white.game().is_over());
        assert_eq!(white.game().result(), None);
        assert_eq!(PlayerStats::load(white.stats(), white.identity()).games, 0);
    }

    #[test]
    fn test_end_game_recorded_once() {
        let (net, mut white, mut black) = pair(4);
        white.dispatch(Origin::Local, WireMessage::end_game(GameResult::WhiteWins)).unwrap();
        black.dispatch(Origin::Local, WireMessage::end_game(GameResult::WhiteWins)).unwrap();
        pump(&net, &mut white, &mut black);

        let w = PlayerStats::load(white.stats(), white.identity());
        let b = PlayerStats::load(black.stats(), black.identity());
        assert_eq!((w.games, w.wins, w.last_result), (1, 1, 1));
        assert_eq!((b.games, b.losses, b.last_result), (1, 1, -1));
        assert_eq!(white.phase(), Phase::Results);
        assert_eq!(black.phase(), Phase::Results);
    }

    #[test]
    fn test_leave_before_rematch_opens_declines() {
        let (net, mut white, mut black) = pair(6);
        black.dispatch(Origin::Local, WireMessage::end_game(GameResult::Draw)).unwrap();
        white.leave();
        pump(&net, &mut white, &mut black);

        assert!(black.rematch().unwrap().is_declined());
        assert!(black.exit_pending().is_some());
        assert!(black.drain_events().contains(&PeerEvent::RematchDeclined));
    }

    #[test]
    fn test_malformed_payload_rejected() {
        let (_net, _white, mut black) = pair(5);
        let err = black
            .handle(NetworkEvent::Message {
                from: ParticipantId::new(1),
                payload: vec![0xff],
            })
            .unwrap_err();
        assert!(matches!(err, SyncError::Wire(_)));
        assert_eq!(black.game().round(), 0);
    }
}
