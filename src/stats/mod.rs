//! Result bookkeeping.
//!
//! Each peer records the outcome of a finished game once, from its own
//! point of view, into a `StatsStore`:
//!
//! ```
//! use draughts_sync::rules::Outcome;
//! use draughts_sync::stats::{record_result, MemoryStats, PlayerStats, StatsIdentity};
//!
//! let identity = StatsIdentity::resolve(None, Some("ann"));
//! let mut store = MemoryStats::new();
//! record_result(&mut store, &identity, Outcome::Win);
//! record_result(&mut store, &identity, Outcome::Loss);
//!
//! let stats = PlayerStats::load(&store, &identity);
//! assert_eq!((stats.games, stats.wins, stats.losses), (2, 1, 1));
//! assert_eq!(stats.last_result, -1);
//! ```

mod store;

pub use store::{MemoryStats, StatsIdentity, StatsStore, DRAWS, GAMES, LAST_RESULT, LOSSES, WINS};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::rules::Outcome;

/// Count one finished game and flush the store.
pub fn record_result<S: StatsStore + ?Sized>(store: &mut S, identity: &StatsIdentity, outcome: Outcome) {
    store.increment(&identity.key(GAMES));
    let counter = match outcome {
        Outcome::Win => WINS,
        Outcome::Draw => DRAWS,
        Outcome::Loss => LOSSES,
    };
    store.increment(&identity.key(counter));
    store.set(&identity.key(LAST_RESULT), outcome.score());
    store.save();
    info!(?outcome, "result recorded");
}

/// Snapshot of one identity's counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub games: i64,
    pub wins: i64,
    pub losses: i64,
    pub draws: i64,
    pub last_result: i64,
}

impl PlayerStats {
    #[must_use]
    pub fn load<S: StatsStore + ?Sized>(store: &S, identity: &StatsIdentity) -> Self {
        Self {
            games: store.get(&identity.key(GAMES), 0),
            wins: store.get(&identity.key(WINS), 0),
            losses: store.get(&identity.key(LOSSES), 0),
            draws: store.get(&identity.key(DRAWS), 0),
            last_result: store.get(&identity.key(LAST_RESULT), 0),
        }
    }

    /// Wins as a percentage of games played, 0 with no games.
    #[must_use]
    pub fn win_rate(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.wins as f64 * 100.0 / self.games as f64
        }
    }
}
