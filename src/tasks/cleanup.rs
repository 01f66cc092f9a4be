//! TTL Cleanup Task
//!
//! Background task that periodically removes expired cache entries.

use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cache::MemoryCache;

/// Spawns a background task that periodically sweeps expired cache entries.
///
/// The task holds only a weak reference, so it never keeps the cache alive.
/// It exits when `token` is cancelled or the cache has been dropped.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(MemoryCache::new(CacheConfig::default()));
/// let token = CancellationToken::new();
/// spawn_cleanup_task(Arc::downgrade(&cache), Duration::from_secs(60), token.clone());
/// // Later, during shutdown:
/// token.cancel();
/// ```
pub fn spawn_cleanup_task<V>(
    cache: Weak<MemoryCache<V>>,
    interval: Duration,
    token: CancellationToken,
) -> JoinHandle<()>
where
    V: Clone + Send + 'static,
{
    tokio::spawn(async move {
        info!(
            "Starting cache cleanup task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }

            let Some(cache) = cache.upgrade() else {
                break;
            };
            let removed = cache.purge_expired();

            if removed > 0 {
                info!("Cache cleanup: removed {} expired entries", removed);
            } else {
                debug!("Cache cleanup: no expired entries found");
            }
        }

        debug!("Cache cleanup task stopped");
    })
}
