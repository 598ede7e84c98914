//! Time-bounded caching for leaderboard queries
//!
//! Remote leaderboards are slow and rate limited; ranked lists are cached for
//! a few minutes and dropped whenever a new score is submitted.

use std::collections::HashMap;
use std::hash::Hash;

use crate::highscores::{HighScoreEntry, Leaderboard, LeaderboardError, ScoreSubmission};

/// Default time-to-live for cached queries (ms)
pub const DEFAULT_TTL_MS: f64 = 5.0 * 60.0 * 1000.0;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: f64,
}

/// Hit/miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Key/value cache where every entry expires after a TTL. Time is passed in
/// (ms) so callers decide which clock to use.
#[derive(Debug, Clone)]
pub struct TtlCache<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    default_ttl: f64,
    hits: u64,
    misses: u64,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(default_ttl_ms: f64) -> Self {
        Self {
            entries: HashMap::new(),
            default_ttl: default_ttl_ms,
            hits: 0,
            misses: 0,
        }
    }

    pub fn set(&mut self, key: K, value: V, now: f64) {
        let ttl = self.default_ttl;
        self.set_with_ttl(key, value, ttl, now);
    }

    pub fn set_with_ttl(&mut self, key: K, value: V, ttl_ms: f64, now: f64) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: now + ttl_ms,
            },
        );
    }

    /// Fresh value for `key`; expired entries are evicted on read
    pub fn get(&mut self, key: &K, now: f64) -> Option<V> {
        match self.entries.get(key) {
            Some(entry) if now < entry.expires_at => {
                self.hits += 1;
                Some(entry.value.clone())
            }
            Some(_) => {
                self.entries.remove(key);
                self.misses += 1;
                None
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn invalidate(&mut self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn invalidate_all(&mut self) {
        self.entries.clear();
    }

    /// Drop every expired entry
    pub fn purge_expired(&mut self, now: f64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| now < e.expires_at);
        before - self.entries.len()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
        }
    }
}

/// Leaderboard wrapper that caches `top` queries
pub struct CachedLeaderboard<L> {
    inner: L,
    cache: TtlCache<usize, Vec<HighScoreEntry>>,
    clock: Box<dyn Fn() -> f64>,
}

impl<L: Leaderboard> CachedLeaderboard<L> {
    /// Wrap `inner` with the default TTL and the platform clock
    pub fn new(inner: L) -> Self {
        Self::with_clock(inner, DEFAULT_TTL_MS, Box::new(crate::platform::now_ms))
    }

    pub fn with_clock(inner: L, ttl_ms: f64, clock: Box<dyn Fn() -> f64>) -> Self {
        Self {
            inner,
            cache: TtlCache::new(ttl_ms),
            clock,
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl<L: Leaderboard> Leaderboard for CachedLeaderboard<L> {
    fn submit(&mut self, run: &ScoreSubmission) -> Result<Option<usize>, LeaderboardError> {
        let rank = self.inner.submit(run)?;
        self.cache.invalidate_all();
        Ok(rank)
    }

    fn top(&mut self, limit: usize) -> Result<Vec<HighScoreEntry>, LeaderboardError> {
        let now = (self.clock)();
        if let Some(entries) = self.cache.get(&limit, now) {
            log::debug!("Leaderboard cache hit (top {limit})");
            return Ok(entries);
        }
        let entries = self.inner.top(limit)?;
        self.cache.set(limit, entries.clone(), now);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    use crate::highscores::HighScores;

    /// Counts queries reaching the wrapped board
    struct CountingBoard {
        board: HighScores,
        queries: Rc<Cell<u32>>,
    }

    impl Leaderboard for CountingBoard {
        fn submit(&mut self, run: &ScoreSubmission) -> Result<Option<usize>, LeaderboardError> {
            self.board.submit(run)
        }

        fn top(&mut self, limit: usize) -> Result<Vec<HighScoreEntry>, LeaderboardError> {
            self.queries.set(self.queries.get() + 1);
            self.board.top(limit)
        }
    }

    fn run(score: u64) -> ScoreSubmission {
        ScoreSubmission {
            score,
            altitude: 1,
            elapsed_secs: 1,
            player: Some("pilot".into()),
        }
    }

    #[test]
    fn test_entries_expire() {
        let mut cache: TtlCache<&str, u32> = TtlCache::new(1000.0);
        cache.set("a", 1, 0.0);
        assert_eq!(cache.get(&"a", 999.0), Some(1));
        assert_eq!(cache.get(&"a", 1000.0), None);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1, entries: 0 });
    }

    #[test]
    fn test_purge_and_invalidate() {
        let mut cache: TtlCache<u8, u8> = TtlCache::new(10.0);
        cache.set(1, 1, 0.0);
        cache.set_with_ttl(2, 2, 100.0, 0.0);
        assert_eq!(cache.purge_expired(50.0), 1);
        assert!(cache.invalidate(&2));
        assert!(!cache.invalidate(&2));
    }

    #[test]
    fn test_cached_leaderboard_hits_and_invalidates() {
        let queries = Rc::new(Cell::new(0));
        let now = Rc::new(Cell::new(0.0));
        let clock = {
            let now = now.clone();
            Box::new(move || now.get())
        };
        let mut board = CachedLeaderboard::with_clock(
            CountingBoard {
                board: HighScores::new(),
                queries: queries.clone(),
            },
            DEFAULT_TTL_MS,
            clock,
        );

        board.submit(&run(10)).unwrap();
        board.top(10).unwrap();
        board.top(10).unwrap();
        assert_eq!(queries.get(), 1);

        board.submit(&run(20)).unwrap();
        let top = board.top(10).unwrap();
        assert_eq!(queries.get(), 2);
        assert_eq!(top[0].score, 20);

        now.set(DEFAULT_TTL_MS + 1.0);
        board.top(10).unwrap();
        assert_eq!(queries.get(), 3);
    }
}
