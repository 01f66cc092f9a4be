//! Cache Module
//!
//! Provides in-memory caching with TTL expiration, size-bounded eviction and
//! the key scheme used to invalidate cached catalog pages.

mod entry;
pub mod keys;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use keys::Invalidation;
pub use stats::CacheStats;
pub use store::{CacheConfig, MemoryCache};
