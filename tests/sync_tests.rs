//! Two peers over the loopback network.
//!
//! Every scenario is run under several delivery seeds, so messages from
//! the two senders cross in different orders.

use std::time::Duration;

use draughts_sync::core::{Cell, Color, DeliveryRng, ParticipantId, RulesConfig, SessionConfig, SyncError};
use draughts_sync::rematch::Choice;
use draughts_sync::rules::{Board, GameResult};
use draughts_sync::stats::{MemoryStats, PlayerStats, StatsIdentity};
use draughts_sync::sync::{
    LoopbackEndpoint, LoopbackNetwork, NetworkEvent, Origin, Peer, PeerEvent, Phase, Transport, WireMessage,
};

type TestPeer = Peer<LoopbackEndpoint, MemoryStats>;

const SEEDS: std::ops::Range<u64> = 0..12;

struct Table {
    net: LoopbackNetwork,
    peers: Vec<TestPeer>,
    rng: DeliveryRng,
    rejected: Vec<SyncError>,
}

impl Table {
    fn new(seed: u64) -> Self {
        Self::with_network(LoopbackNetwork::new(seed), seed, SessionConfig::default())
    }

    fn with_network(net: LoopbackNetwork, seed: u64, config: SessionConfig) -> Self {
        let endpoints = [net.join("ann"), net.join("")];
        while net.deliver_one().is_some() {}

        let peers = endpoints
            .into_iter()
            .enumerate()
            .map(|(i, ep)| {
                let identity = StatsIdentity::Nickname(format!("p{}", i));
                Peer::new(ep, MemoryStats::new(), identity, config.clone()).unwrap()
            })
            .collect();
        Self {
            net,
            peers,
            rng: DeliveryRng::new(seed ^ 0xABCD),
            rejected: Vec::new(),
        }
    }

    fn white(&mut self) -> &mut TestPeer {
        &mut self.peers[0]
    }

    fn black(&mut self) -> &mut TestPeer {
        &mut self.peers[1]
    }

    fn deliver_one(&mut self) -> bool {
        match self.net.deliver_one() {
            Some((to, event)) => {
                // Endpoints beyond the two seated peers have no replica.
                let index = (to.raw() - 1) as usize;
                if let Some(peer) = self.peers.get_mut(index) {
                    if let Err(e) = peer.handle(event) {
                        self.rejected.push(e);
                    }
                }
                true
            }
            None => false,
        }
    }

    fn pump(&mut self) {
        while self.deliver_one() {}
    }

    /// Index of a peer whose own replica says it may move now.
    fn mover(&self) -> Option<usize> {
        self.peers.iter().position(|p| {
            p.phase() == Phase::Playing && !p.game().is_over() && p.game().turn() == p.color()
        })
    }

    /// Play random legal moves, interleaving deliveries, until the game
    /// ends or `max_actions` is reached. Returns true if the game ended.
    fn play(&mut self, max_actions: usize) -> bool {
        for _ in 0..max_actions {
            let act = self.net.pending() == 0 || self.rng.gen_bool(0.5);
            match self.mover() {
                Some(i) if act => {
                    let moves = self.peers[i].game().selectable_moves();
                    let pick = self.rng.pick(moves.len()).unwrap();
                    let mv = moves[pick];
                    self.peers[i].click(mv.from).unwrap();
                    self.peers[i].click(mv.to).unwrap();
                }
                _ => {
                    if !self.deliver_one() && self.mover().is_none() {
                        break;
                    }
                }
            }
        }
        self.pump();
        self.peers.iter().all(|p| p.game().is_over())
    }

    fn finish_with(&mut self, result: GameResult) {
        self.white()
            .dispatch(Origin::Local, WireMessage::end_game(result))
            .unwrap();
        self.pump();
    }

    fn count(&mut self, index: usize, pred: impl Fn(&PeerEvent) -> bool) -> usize {
        self.peers[index].drain_events().iter().filter(|e| pred(*e)).count()
    }
}

fn stats(peer: &TestPeer) -> PlayerStats {
    PlayerStats::load(peer.stats(), peer.identity())
}

// =============================================================================
// Move Replication
// =============================================================================

#[test]
fn test_replicas_agree_across_interleavings() {
    for seed in SEEDS {
        let mut table = Table::new(seed);
        table.play(3_000);

        let (a, b) = (&table.peers[0], &table.peers[1]);
        assert_eq!(a.game().board(), b.game().board(), "seed {}", seed);
        assert_eq!(a.game().history(), b.game().history(), "seed {}", seed);
        assert_eq!(a.game().result(), b.game().result(), "seed {}", seed);
        assert!(table.rejected.is_empty(), "seed {}: {:?}", seed, table.rejected);
    }
}

#[test]
fn test_finished_game_recorded_once() {
    for seed in SEEDS {
        let mut table = Table::new(seed);
        if !table.play(3_000) {
            continue;
        }
        let result = table.peers[0].game().result().unwrap();
        assert!(table.count(0, |e| matches!(e, PeerEvent::GameEnded { .. })) == 1);
        assert!(table.count(1, |e| matches!(e, PeerEvent::GameEnded { .. })) == 1);

        let (w, b) = (stats(&table.peers[0]), stats(&table.peers[1]));
        assert_eq!((w.games, b.games), (1, 1), "seed {}", seed);
        match result.winner() {
            Some(Color::White) => assert_eq!((w.wins, b.losses), (1, 1)),
            Some(Color::Black) => assert_eq!((w.losses, b.wins), (1, 1)),
            None => unreachable!("the board never declares a draw"),
        }
        assert_eq!(table.peers[0].phase(), Phase::Results);
        assert_eq!(table.peers[1].phase(), Phase::Results);
    }
}

#[test]
fn test_duplicated_messages_are_absorbed() {
    for seed in SEEDS {
        let net = LoopbackNetwork::new(seed).with_duplicates(0.5);
        let mut table = Table::with_network(net, seed, SessionConfig::default());
        table.play(400);

        let (a, b) = (&table.peers[0], &table.peers[1]);
        assert_eq!(a.game().board(), b.game().board(), "seed {}", seed);
        assert_eq!(a.game().round(), b.game().round(), "seed {}", seed);
        // A replayed move finds its origin already vacated and is refused.
        assert!(table.rejected.iter().all(|e| matches!(e, SyncError::Session(_))));
    }
}

#[test]
fn test_light_parity_game() {
    let config = SessionConfig::default().with_rules(RulesConfig::default().with_a1_dark(false));
    let mut table = Table::with_network(LoopbackNetwork::new(9), 9, config);
    table.play(200);
    assert_eq!(table.peers[0].game().board(), table.peers[1].game().board());
    assert!(table.peers[0].game().board().piece_at(Cell::new(0, 0)).is_none());
}

#[test]
fn test_hints_follow_clicks() {
    let mut table = Table::new(0);
    table.white().click(Cell::new(2, 2)).unwrap();
    let events = table.white().drain_events();
    assert!(matches!(&events[..], [PeerEvent::ShowHints { from, moves }] if *from == Cell::new(2, 2) && moves.len() == 2));

    table.white().click(Cell::new(5, 5)).unwrap();
    assert_eq!(table.white().drain_events(), vec![PeerEvent::ClearHints]);

    // Black cannot act on White's turn.
    table.black().click(Cell::new(1, 5)).unwrap();
    assert_eq!(table.black().drain_events(), vec![PeerEvent::ClearHints]);
    assert_eq!(table.net.pending(), 0);
}

// =============================================================================
// Timeouts
// =============================================================================

#[test]
fn test_timeout_passes_once_everywhere() {
    for seed in SEEDS {
        let mut table = Table::new(seed);
        table.white().tick(Duration::from_secs(30)).unwrap();
        // A late extra tick on the same expired round raises nothing new.
        table.white().tick(Duration::from_secs(1)).unwrap();
        table.black().tick(Duration::from_secs(45)).unwrap();
        table.pump();

        for peer in &table.peers {
            assert_eq!(peer.game().turn(), Some(Color::Black), "seed {}", seed);
            assert_eq!(peer.game().round(), 1, "seed {}", seed);
        }
    }
}

#[test]
fn test_move_and_replayed_timeout() {
    let mut table = Table::new(4);
    table.white().click(Cell::new(2, 2)).unwrap();
    table.white().click(Cell::new(3, 3)).unwrap();
    table.pump();

    // A stale round-0 timeout arriving after the move changes nothing.
    let payload = WireMessage::TimeoutTurn { round: 0 }.encode().unwrap();
    table
        .black()
        .handle(NetworkEvent::Message {
            from: ParticipantId::new(1),
            payload,
        })
        .unwrap();
    assert_eq!(table.black().game().turn(), Some(Color::Black));
    assert_eq!(table.black().game().round(), 1);
}

// =============================================================================
// Membership
// =============================================================================

#[test]
fn test_unknown_sender_ignored() {
    let mut table = Table::new(1);
    let payload = WireMessage::end_game(GameResult::BlackWins).encode().unwrap();
    table
        .black()
        .handle(NetworkEvent::Message {
            from: ParticipantId::new(42),
            payload,
        })
        .unwrap();
    assert!(!table.black().game().is_over());
}

#[test]
fn test_spectator_leaving_keeps_game_running() {
    for seed in SEEDS {
        let mut table = Table::new(seed);
        let mut spectator = table.net.join("eve");
        table.pump();
        assert_eq!(table.peers[0].roster().len(), 3);

        table.play(10);
        spectator.leave();
        table.pump();

        for peer in &table.peers {
            assert_eq!(peer.phase(), Phase::Playing, "seed {}", seed);
            assert!(!peer.game().is_over(), "seed {}", seed);
            assert_eq!(peer.roster().len(), 2);
        }
        assert_eq!(table.peers[0].color(), Some(Color::White));
        assert_eq!(table.peers[1].color(), Some(Color::Black));
    }
}

#[test]
fn test_late_joiner_must_accept_newer_round() {
    let mut table = Table::new(5);
    table.finish_with(GameResult::Draw);
    let _late = table.net.join("eve");
    table.pump();

    // Round 2 reseats the present roster, the late joiner included.
    table.white().ask_rematch().unwrap();
    table.pump();
    table.white().choose_rematch(true).unwrap();
    table.black().choose_rematch(true).unwrap();
    table.pump();

    for peer in &table.peers {
        let rematch = peer.rematch().unwrap();
        assert_eq!(rematch.round(), 2);
        assert_eq!(rematch.choice(ParticipantId::new(3)), Some(Choice::Undecided));
        assert!(!rematch.is_accepted());
        assert_eq!(peer.phase(), Phase::Results);
    }
}

#[test]
fn test_leave_mid_game() {
    for seed in SEEDS {
        let mut table = Table::new(seed);
        table.play(10);
        table.white().leave();
        table.pump();

        for peer in &table.peers {
            assert_eq!(peer.phase(), Phase::Menu, "seed {}", seed);
            assert!(peer.game().is_over());
            assert_eq!(stats(peer).games, 0);
        }
        // Leaving twice is a no-op.
        table.white().leave();
        assert_eq!(table.count(0, |e| *e == PeerEvent::ReturnedToMenu), 1);
    }
}

#[test]
fn test_display_name_fallback() {
    let table = Table::new(0);
    let roster = table.peers[0].roster();
    assert_eq!(roster.display_name(ParticipantId::new(1)), "ann");
    assert_eq!(roster.display_name(ParticipantId::new(2)), "Player2");
}

// =============================================================================
// Rematch
// =============================================================================

#[test]
fn test_result_view_opens_rematch() {
    let mut table = Table::new(2);
    table.finish_with(GameResult::Draw);

    for i in 0..2 {
        assert_eq!(table.peers[i].phase(), Phase::Results);
        assert_eq!(table.peers[i].rematch().map(|r| r.round()), Some(1));
        assert_eq!(stats(&table.peers[i]).draws, 1);
        assert_eq!(table.count(i, |e| *e == PeerEvent::RematchAsked { round: 1 }), 1);
    }
}

#[test]
fn test_rematch_accepted_starts_fresh_game() {
    for seed in SEEDS {
        let mut table = Table::new(seed);
        table.finish_with(GameResult::WhiteWins);
        table.white().choose_rematch(true).unwrap();
        table.black().choose_rematch(true).unwrap();
        table.pump();

        for i in 0..2 {
            let peer = &table.peers[i];
            assert_eq!(peer.phase(), Phase::Playing, "seed {}", seed);
            assert_eq!(peer.game().board(), &Board::standard(RulesConfig::default()));
            assert_eq!(peer.game().turn(), Some(Color::White));
            assert!(peer.rematch().is_none());

            assert_eq!(table.count(i, |e| *e == PeerEvent::RematchAccepted), 1, "seed {}", seed);
        }
        assert_eq!(table.peers[0].color(), Some(Color::White));

        // The new game is playable and recorded separately.
        table.play(20);
        assert_eq!(stats(&table.peers[0]).games, 1);
    }
}

#[test]
fn test_rematch_decline_exits_after_delay() {
    for seed in SEEDS {
        let mut table = Table::new(seed);
        table.finish_with(GameResult::BlackWins);
        table.white().choose_rematch(true).unwrap();
        table.black().choose_rematch(false).unwrap();
        table.pump();

        for i in 0..2 {
            assert_eq!(table.count(i, |e| *e == PeerEvent::RematchDeclined), 1, "seed {}", seed);
            assert_eq!(table.peers[i].exit_pending(), Some(Duration::from_millis(1200)));
        }

        table.white().tick(Duration::from_secs(1)).unwrap();
        assert_eq!(table.white().phase(), Phase::Results);
        table.white().tick(Duration::from_millis(200)).unwrap();
        assert_eq!(table.white().phase(), Phase::Menu);
    }
}

#[test]
fn test_leave_during_results_declines() {
    for seed in SEEDS {
        let mut table = Table::new(seed);
        table.finish_with(GameResult::WhiteWins);
        table.white().choose_rematch(true).unwrap();
        table.black().leave();
        table.pump();

        let white = &mut table.peers[0];
        assert!(white.rematch().unwrap().is_declined(), "seed {}", seed);
        assert!(white.exit_pending().is_some());

        // Leaving explicitly cancels the scheduled exit.
        white.leave();
        assert_eq!(white.exit_pending(), None);
        assert_eq!(white.phase(), Phase::Menu);
    }
}

#[test]
fn test_choice_on_behalf_of_another_ignored() {
    let mut table = Table::new(3);
    table.finish_with(GameResult::WhiteWins);
    table.count(0, |_| true);

    let payload = WireMessage::set_choice(ParticipantId::new(1), Choice::Decline, 1)
        .encode()
        .unwrap();
    table
        .white()
        .handle(NetworkEvent::Message {
            from: ParticipantId::new(2),
            payload,
        })
        .unwrap();

    let rematch = table.peers[0].rematch().unwrap();
    assert!(!rematch.is_declined());
    assert_eq!(rematch.choice(ParticipantId::new(1)), Some(Choice::Undecided));
    assert_eq!(table.net.pending(), 0);
    assert_eq!(table.count(0, |e| *e == PeerEvent::RematchDeclined), 0);
    assert_eq!(table.white().exit_pending(), None);
}

#[test]
fn test_concurrent_asks_are_idempotent() {
    for seed in SEEDS {
        let mut table = Table::new(seed);
        table.finish_with(GameResult::Draw);

        // Both open round 2 at once; the copies collapse into one round.
        table.white().ask_rematch().unwrap();
        table.black().ask_rematch().unwrap();
        table.pump();

        for i in 0..2 {
            assert_eq!(table.peers[i].rematch().map(|r| r.round()), Some(2), "seed {}", seed);
        }

        table.black().choose_rematch(true).unwrap();
        table.white().choose_rematch(true).unwrap();
        table.pump();
        assert_eq!(table.peers[0].phase(), Phase::Playing, "seed {}", seed);
        assert_eq!(table.peers[1].phase(), Phase::Playing, "seed {}", seed);
    }
}
