//! Response DTOs for the catalog API
//!
//! Defines the structure of outgoing response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::models::{Activity, PaginationInfo};

/// Timing and cache provenance attached to every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    pub cached: bool,
    pub duration_ms: u64,
}

/// One page of a catalog query.
#[derive(Debug, Clone, Serialize)]
pub struct ListResponse {
    pub data: Vec<Activity>,
    pub pagination: PaginationInfo,
    pub meta: ResponseMeta,
}

/// A single activity plus response metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ItemResponse {
    #[serde(flatten)]
    pub activity: Activity,
    pub meta: ResponseMeta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeleteResponse {
    pub ok: bool,
}

impl DeleteResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

/// Response body for `GET /cache/stats`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    pub timestamp: String,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        let hit_rate = stats.hit_rate();
        Self {
            stats,
            hit_rate,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Response body for `POST /cache/clear`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearCacheResponse {
    pub message: String,
    pub items_cleared: usize,
    pub timestamp: String,
}

impl ClearCacheResponse {
    pub fn new(items_cleared: usize) -> Self {
        Self {
            message: "Cache cleared successfully".to_string(),
            items_cleared,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Response body for `GET /cache/size`
#[derive(Debug, Clone, Serialize)]
pub struct CacheSizeResponse {
    pub size: usize,
    pub timestamp: String,
}

impl CacheSizeResponse {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Response body for `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Whether a backing store is wired
    pub store: bool,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy(store: bool) -> Self {
        Self {
            status: "healthy".to_string(),
            store,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityPatch, PaginationWindow};

    #[test]
    fn test_item_response_flattens_activity() {
        let activity = Activity::from_patch("a1".into(), ActivityPatch::default(), chrono::Utc::now());
        let resp = ItemResponse {
            activity,
            meta: ResponseMeta { cached: true, duration_ms: 3 },
        };
        let json = serde_json::to_value(&resp).unwrap();

        assert_eq!(json["id"], "a1");
        assert_eq!(json["meta"]["cached"], true);
        assert_eq!(json["meta"]["durationMs"], 3);
    }

    #[test]
    fn test_list_response_shape() {
        let resp = ListResponse {
            data: Vec::new(),
            pagination: PaginationInfo::new(PaginationWindow::default(), 0),
            meta: ResponseMeta { cached: false, duration_ms: 0 },
        };
        let json = serde_json::to_value(&resp).unwrap();

        assert_eq!(json["pagination"]["totalPages"], 0);
        assert_eq!(json["pagination"]["hasMore"], false);
    }

    #[test]
    fn test_stats_response_hit_rate() {
        let mut stats = CacheStats::new(10);
        stats.hits = 80;
        stats.misses = 20;
        let resp = StatsResponse::from(stats);
        assert!((resp.hit_rate - 0.8).abs() < 0.001);

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["hits"], 80);
        assert!(json.get("hitRate").is_some());
    }

    #[test]
    fn test_health_response_serialize() {
        let json = serde_json::to_string(&HealthResponse::healthy(true)).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_clear_cache_response_shape() {
        let json = serde_json::to_value(ClearCacheResponse::new(4)).unwrap();
        assert_eq!(json["itemsCleared"], 4);
        assert_eq!(json["message"], "Cache cleared successfully");
        assert!(json.get("timestamp").is_some());
    }

    #[test]
    fn test_delete_response() {
        assert_eq!(serde_json::to_string(&DeleteResponse::ok()).unwrap(), r#"{"ok":true}"#);
    }
}
