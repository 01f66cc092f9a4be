//! Cache key derivation and invalidation
//!
//! Item keys are `entity:id`. List keys are `entity:list:<digest>` where the
//! digest is the first 16 hex chars of a SHA-256 over the filter's canonical
//! JSON. There is no link between a cached list and the items inside it, so a
//! mutation drops every list key of the entity.

use std::time::Duration;

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Length of the truncated filter digest.
pub const LIST_DIGEST_LEN: usize = 16;

/// Key of a single entity.
pub fn item_key(entity: &str, id: &str) -> String {
    format!("{}:{}", entity, id)
}

/// Key of a filtered result set.
///
/// `filters` must serialize deterministically (struct fields in declaration
/// order, absent fields skipped).
pub fn list_key<F: Serialize>(entity: &str, filters: &F) -> String {
    format!("{}:list:{}", entity, filter_digest(filters))
}

/// Glob covering every list key of an entity.
pub fn list_pattern(entity: &str) -> String {
    format!("{}:list:*", entity)
}

fn filter_digest<F: Serialize>(filters: &F) -> String {
    // Serializing a plain struct cannot fail; an empty body still yields a key
    let canonical = serde_json::to_vec(filters).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(LIST_DIGEST_LEN);
    digest
}

// == Invalidation ==
/// Cache changes owed after a successful mutation of one entity.
///
/// Applied by [`crate::cache::MemoryCache::invalidate`] under a single lock:
/// every list key of the entity goes, then the item key is refreshed or
/// removed.
#[derive(Debug, Clone)]
pub struct Invalidation<V> {
    pub list_pattern: String,
    pub item_key: String,
    /// Fresh value and TTL for the item key, None deletes it
    pub item: Option<(V, Option<Duration>)>,
}

impl<V> Invalidation<V> {
    /// After create or update: replace the item entry with `value`.
    pub fn upsert(entity: &str, id: &str, value: V, ttl: Option<Duration>) -> Self {
        Self {
            list_pattern: list_pattern(entity),
            item_key: item_key(entity, id),
            item: Some((value, ttl)),
        }
    }

    /// After delete: drop the item entry.
    pub fn remove(entity: &str, id: &str) -> Self {
        Self {
            list_pattern: list_pattern(entity),
            item_key: item_key(entity, id),
            item: None,
        }
    }
}
