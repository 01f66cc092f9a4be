//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use tokio::time::Instant;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Expiration instant, None = no expiration
    pub expires_at: Option<Instant>,
    /// Last time the entry was written or read
    pub last_access: Instant,
    /// Monotonic access sequence, breaks ties between equal instants
    pub access_tick: u64,
    /// Creation instant
    pub created_at: Instant,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry.
    ///
    /// A `None` or zero `ttl` means the entry never expires.
    pub fn new(value: V, ttl: Option<Duration>, now: Instant, tick: u64) -> Self {
        let expires_at = ttl.filter(|ttl| !ttl.is_zero()).map(|ttl| now + ttl);

        Self {
            value,
            expires_at,
            last_access: now,
            access_tick: tick,
            created_at: now,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// An entry is expired once `now` is strictly past its expiration instant.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => expires < now,
            None => false,
        }
    }

    // == Touch ==
    /// Records a read access.
    pub fn touch(&mut self, now: Instant, tick: u64) {
        self.last_access = now;
        self.access_tick = tick;
    }

    /// Sort key used by eviction: oldest access first.
    pub fn recency(&self) -> (Instant, u64) {
        (self.last_access, self.access_tick)
    }
}
