//! Memory Cache Module
//!
//! Process-local cache engine combining HashMap storage with TTL expiration
//! and size-bounded eviction by least recent access.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use regex::Regex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cache::keys::Invalidation;
use crate::cache::{CacheEntry, CacheStats};
use crate::tasks::spawn_cleanup_task;

// == Cache Config ==
/// Options read once when the cache is constructed.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL applied by `set`, None = entries never expire
    pub default_ttl: Option<Duration>,
    /// Entry count above which eviction kicks in
    pub max_size: usize,
    /// Interval of the background expiry sweep
    pub cleanup_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Some(Duration::from_millis(300_000)),
            max_size: 1000,
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

impl From<&crate::config::Config> for CacheConfig {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            default_ttl: Some(Duration::from_millis(config.cache_default_ttl_ms))
                .filter(|ttl| !ttl.is_zero()),
            max_size: config.cache_max_size,
            cleanup_interval: Duration::from_secs(config.cleanup_interval),
        }
    }
}

// == Cache State ==
#[derive(Debug)]
struct CacheState<V> {
    entries: HashMap<String, CacheEntry<V>>,
    stats: CacheStats,
    tick: u64,
}

impl<V> CacheState<V> {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn delete_matching(&mut self, pattern: &Regex) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !pattern.is_match(key));
        let deleted = before - self.entries.len();
        self.stats.record_deletes(deleted);
        deleted
    }

    fn insert(&mut self, key: String, value: V, ttl: Option<Duration>, max_size: usize) {
        let now = Instant::now();
        let tick = self.next_tick();
        self.entries.insert(key, CacheEntry::new(value, ttl, now, tick));
        self.stats.record_set();
        self.evict_if_needed(max_size);
    }

    fn evict_if_needed(&mut self, max_size: usize) {
        if self.entries.len() <= max_size {
            return;
        }

        let overflow = self.entries.len() - max_size;
        let mut by_recency: Vec<(String, (Instant, u64))> = self
            .entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.recency()))
            .collect();
        by_recency.sort_by(|a, b| a.1.cmp(&b.1));

        for (key, _) in by_recency.into_iter().take(overflow) {
            self.entries.remove(&key);
        }
        self.stats.record_evictions(overflow);
        debug!("Cache eviction: removed {} oldest entries", overflow);
    }
}

// == Memory Cache ==
/// Bounded TTL cache shared through an `Arc`.
///
/// No operation fails: a malfunction can only show up as a miss.
#[derive(Debug)]
pub struct MemoryCache<V> {
    state: Mutex<CacheState<V>>,
    config: CacheConfig,
    sweeper: Mutex<Option<CancellationToken>>,
}

impl<V: Clone + Send + 'static> MemoryCache<V> {
    // == Constructor ==
    /// Creates an empty cache. Call [`MemoryCache::init`] to start the sweep.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                stats: CacheStats::new(config.max_size),
                tick: 0,
            }),
            config,
            sweeper: Mutex::new(None),
        }
    }

    /// Creates the cache and starts its background sweep.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: CacheConfig) -> Arc<Self> {
        let cache = Arc::new(Self::new(config));
        cache.init();
        cache
    }

    // == Lifecycle ==
    /// Starts the periodic expiry sweep. Calling it twice is a no-op.
    pub fn init(self: &Arc<Self>) {
        let mut sweeper = self.sweeper.lock();
        if sweeper.is_some() {
            return;
        }
        let token = CancellationToken::new();
        spawn_cleanup_task(
            Arc::downgrade(self),
            self.config.cleanup_interval,
            token.clone(),
        );
        *sweeper = Some(token);
    }

    /// Stops the sweep and drops every entry. Returns the prior size.
    pub fn destroy(&self) -> usize {
        if let Some(token) = self.sweeper.lock().take() {
            token.cancel();
        }
        let mut state = self.state.lock();
        let size = state.entries.len();
        state.entries.clear();
        size
    }

    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // == Get ==
    /// Returns a clone of the cached value, or None when absent or expired.
    ///
    /// An expired entry found here is removed.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut state = self.state.lock();
        let now = Instant::now();

        match state.entries.get(key).map(|entry| entry.is_expired_at(now)) {
            None => {
                state.stats.record_miss();
                return None;
            }
            Some(true) => {
                state.entries.remove(key);
                state.stats.record_miss();
                return None;
            }
            Some(false) => {}
        }

        let tick = state.next_tick();
        state.stats.record_hit();
        state.entries.get_mut(key).map(|entry| {
            entry.touch(now, tick);
            entry.value.clone()
        })
    }

    // == Set ==
    /// Stores a value under the default TTL.
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, self.config.default_ttl);
    }

    /// Stores a value with an explicit TTL. `None` or zero never expires.
    ///
    /// Replaces any previous entry wholesale, then evicts the least recently
    /// accessed entries if the cache grew past `max_size`.
    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        self.state
            .lock()
            .insert(key.into(), value, ttl, self.config.max_size);
    }

    // == Delete ==
    pub fn delete(&self, key: &str) -> bool {
        let mut state = self.state.lock();
        let deleted = state.entries.remove(key).is_some();
        if deleted {
            state.stats.record_deletes(1);
        }
        deleted
    }

    /// Deletes every key matching a glob where `*` matches any run of
    /// characters. The whole key must match. Returns the number removed.
    pub fn delete_pattern(&self, pattern: &str) -> usize {
        let Some(regex) = glob_to_regex(pattern) else {
            return 0;
        };
        self.state.lock().delete_matching(&regex)
    }

    /// Applies a mutation's cache invalidation as one critical section.
    ///
    /// Returns the number of list entries removed.
    pub fn invalidate(&self, invalidation: Invalidation<V>) -> usize {
        let Some(regex) = glob_to_regex(&invalidation.list_pattern) else {
            return 0;
        };

        let mut state = self.state.lock();
        let removed = state.delete_matching(&regex);
        match invalidation.item {
            Some((value, ttl)) => {
                state.insert(invalidation.item_key, value, ttl, self.config.max_size);
            }
            None => {
                if state.entries.remove(&invalidation.item_key).is_some() {
                    state.stats.record_deletes(1);
                }
            }
        }
        removed
    }

    // == Clear ==
    /// Drops every entry. Returns the prior size.
    pub fn clear(&self) -> usize {
        let mut state = self.state.lock();
        let size = state.entries.len();
        state.entries.clear();
        state.stats.record_deletes(size);
        size
    }

    // == Cleanup Expired ==
    /// Removes all expired entries. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let mut state = self.state.lock();
        let now = Instant::now();
        let before = state.entries.len();
        state.entries.retain(|_, entry| !entry.is_expired_at(now));
        before - state.entries.len()
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        let mut stats = state.stats.clone();
        stats.size = state.entries.len();
        stats
    }

    pub fn size(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }
}

impl<V> Drop for MemoryCache<V> {
    fn drop(&mut self) {
        if let Some(token) = self.sweeper.get_mut().take() {
            token.cancel();
        }
    }
}

/// Translates a `*` glob into an anchored regex, escaping everything else.
fn glob_to_regex(pattern: &str) -> Option<Regex> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    match Regex::new(&format!("^{}$", body)) {
        Ok(regex) => Some(regex),
        Err(e) => {
            warn!("Ignoring cache pattern {:?}: {}", pattern, e);
            None
        }
    }
}
