//! Key/value persistence for per-player result counters.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Games played.
pub const GAMES: &str = "games";
/// Games won.
pub const WINS: &str = "wins";
/// Games lost.
pub const LOSSES: &str = "losses";
/// Games drawn.
pub const DRAWS: &str = "draws";
/// Last result: 1 win, 0 draw, -1 loss.
pub const LAST_RESULT: &str = "lastResult";

/// Who the counters belong to.
///
/// A stable user id wins over a nickname; without either the counters are
/// kept under a shared local bucket.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatsIdentity {
    User(String),
    Nickname(String),
    Local,
}

impl StatsIdentity {
    /// Pick the most specific identity available. Empty strings count as
    /// missing.
    #[must_use]
    pub fn resolve(user_id: Option<&str>, nickname: Option<&str>) -> Self {
        let present = |s: Option<&str>| s.filter(|s| !s.is_empty()).map(str::to_owned);
        if let Some(uid) = present(user_id) {
            StatsIdentity::User(uid)
        } else if let Some(nick) = present(nickname) {
            StatsIdentity::Nickname(nick)
        } else {
            StatsIdentity::Local
        }
    }

    /// Storage key for one counter, e.g. `stats_uid_42_wins`.
    #[must_use]
    pub fn key(&self, counter: &str) -> String {
        match self {
            StatsIdentity::User(uid) => format!("stats_uid_{uid}_{counter}"),
            StatsIdentity::Nickname(nick) => format!("stats_nick_{nick}_{counter}"),
            StatsIdentity::Local => format!("stats_local_{counter}"),
        }
    }
}

/// Persistence collaborator. Implementations decide where values live;
/// `save` flushes whatever has been set.
pub trait StatsStore {
    /// Read `key`, or `default` when absent.
    fn get(&self, key: &str, default: i64) -> i64;

    fn set(&mut self, key: &str, value: i64);

    fn save(&mut self);

    /// Add one to `key`.
    fn increment(&mut self, key: &str) {
        let value = self.get(key, 0) + 1;
        self.set(key, value);
    }
}

/// In-memory store. `save` only counts flushes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStats {
    values: FxHashMap<String, i64>,
    saves: u32,
}

impl MemoryStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `save` was called.
    #[must_use]
    pub fn saves(&self) -> u32 {
        self.saves
    }
}

impl StatsStore for MemoryStats {
    fn get(&self, key: &str, default: i64) -> i64 {
        self.values.get(key).copied().unwrap_or(default)
    }

    fn set(&mut self, key: &str, value: i64) {
        self.values.insert(key.to_owned(), value);
    }

    fn save(&mut self) {
        self.saves += 1;
        debug!(entries = self.values.len(), "stats saved");
    }
}
