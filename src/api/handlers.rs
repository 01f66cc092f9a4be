//! API Handlers
//!
//! HTTP request handlers for each catalog endpoint.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, State},
    http::{request::Parts, HeaderMap, StatusCode},
    Json,
};
use tracing::info;

use super::extract::{JsonBody, QueryParams};
use crate::error::Result;
use crate::models::{
    ActivityPatch, CacheSizeResponse, ClearCacheResponse, DeleteResponse, HealthResponse,
    ItemQuery, ItemResponse, ListQuery, ListResponse, StatsResponse,
};
use crate::services::{check_authorization, Caller, CatalogService, QueryOptions};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Roles allowed to write activities and manage the cache.
const ADMIN_ROLES: &[&str] = &["admin"];

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogService>,
}

impl AppState {
    pub fn new(catalog: CatalogService) -> Self {
        Self {
            catalog: Arc::new(catalog),
        }
    }
}

// == Caller Extraction ==
/// Caller identity forwarded by the upstream auth layer, if any.
#[derive(Debug, Clone, Default)]
pub struct CallerHeaders(pub Option<Caller>);

impl CallerHeaders {
    fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let id = header(USER_ID_HEADER);
        let role = header(USER_ROLE_HEADER);
        if id.is_none() && role.is_none() {
            return Self(None);
        }
        Self(Some(Caller { id, role }))
    }

    fn options(&self, force_refresh: bool) -> QueryOptions {
        QueryOptions {
            user: self.0.clone(),
            force_refresh,
        }
    }

    fn require_admin(&self) -> Result<()> {
        check_authorization(self.0.as_ref(), None, ADMIN_ROLES)
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CallerHeaders {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

/// Handler for GET /activities
pub async fn list_handler(
    State(state): State<AppState>,
    caller: CallerHeaders,
    QueryParams(query): QueryParams<ListQuery>,
) -> Result<Json<ListResponse>> {
    let (filters, page, refresh) = query.into_parts();
    let response = state
        .catalog
        .list(&filters, page, &caller.options(refresh))
        .await?;
    Ok(Json(response))
}

/// Handler for GET /activities/:id
pub async fn get_handler(
    State(state): State<AppState>,
    caller: CallerHeaders,
    Path(id): Path<String>,
    QueryParams(query): QueryParams<ItemQuery>,
) -> Result<Json<ItemResponse>> {
    let response = state
        .catalog
        .get(&id, &caller.options(query.refresh))
        .await?;
    Ok(Json(response))
}

/// Handler for POST /activities
///
/// Admin only.
pub async fn create_handler(
    State(state): State<AppState>,
    caller: CallerHeaders,
    JsonBody(data): JsonBody<ActivityPatch>,
) -> Result<(StatusCode, Json<ItemResponse>)> {
    caller.require_admin()?;
    let created = state.catalog.create(data, &caller.options(false)).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Handler for PUT /activities/:id
///
/// Admin only.
pub async fn update_handler(
    State(state): State<AppState>,
    caller: CallerHeaders,
    Path(id): Path<String>,
    JsonBody(data): JsonBody<ActivityPatch>,
) -> Result<Json<ItemResponse>> {
    caller.require_admin()?;
    let updated = state
        .catalog
        .update(&id, data, &caller.options(false))
        .await?;
    Ok(Json(updated))
}

/// Handler for DELETE /activities/:id
///
/// Admin only.
pub async fn delete_handler(
    State(state): State<AppState>,
    caller: CallerHeaders,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    caller.require_admin()?;
    let response = state.catalog.delete(&id, &caller.options(false)).await?;
    Ok(Json(response))
}

// == Cache Management ==
/// Handler for GET /cache/stats
///
/// Admin only.
pub async fn stats_handler(
    State(state): State<AppState>,
    caller: CallerHeaders,
) -> Result<Json<StatsResponse>> {
    caller.require_admin()?;
    Ok(Json(StatsResponse::from(state.catalog.cache().stats())))
}

/// Handler for POST /cache/clear
///
/// Admin only. Drops every cached list and item.
pub async fn clear_cache_handler(
    State(state): State<AppState>,
    caller: CallerHeaders,
) -> Result<Json<ClearCacheResponse>> {
    caller.require_admin()?;
    let cleared = state.catalog.cache().clear();
    info!("Cache cleared on request, {} entries dropped", cleared);
    Ok(Json(ClearCacheResponse::new(cleared)))
}

/// Handler for GET /cache/size
///
/// Admin only.
pub async fn cache_size_handler(
    State(state): State<AppState>,
    caller: CallerHeaders,
) -> Result<Json<CacheSizeResponse>> {
    caller.require_admin()?;
    Ok(Json(CacheSizeResponse::new(state.catalog.cache().size())))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.catalog.has_store()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use crate::error::ServiceError;
    use crate::models::LocalizedText;
    use crate::services::{CatalogCache, CatalogSettings};
    use crate::store::InMemoryActivityStore;
    use axum::http::HeaderValue;

    fn state() -> AppState {
        let cache = Arc::new(CatalogCache::new(CacheConfig::default()));
        AppState::new(
            CatalogService::new(cache, CatalogSettings::default())
                .with_store(Arc::new(InMemoryActivityStore::new())),
        )
    }

    fn admin() -> CallerHeaders {
        CallerHeaders(Some(Caller::new("u1", "admin")))
    }

    fn parent() -> CallerHeaders {
        CallerHeaders(Some(Caller::new("u2", "parent")))
    }

    fn judo() -> ActivityPatch {
        ActivityPatch {
            title: Some(LocalizedText::new("Judo", "Judo")),
            ..ActivityPatch::default()
        }
    }

    #[test]
    fn test_caller_from_headers() {
        let mut headers = HeaderMap::new();
        assert!(CallerHeaders::from_headers(&headers).0.is_none());

        headers.insert(USER_ROLE_HEADER, HeaderValue::from_static("admin"));
        let caller = CallerHeaders::from_headers(&headers).0.unwrap();
        assert!(caller.is_admin());
        assert!(caller.id.is_none());

        headers.insert(USER_ID_HEADER, HeaderValue::from_static(" u7 "));
        let caller = CallerHeaders::from_headers(&headers).0.unwrap();
        assert_eq!(caller.id.as_deref(), Some("u7"));
    }

    #[tokio::test]
    async fn test_create_and_get_handler() {
        let state = state();

        let (status, Json(created)) =
            create_handler(State(state.clone()), admin(), JsonBody(judo()))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert!(!created.meta.cached);

        let Json(item) = get_handler(
            State(state),
            CallerHeaders::default(),
            Path(created.activity.id.clone()),
            QueryParams(ItemQuery::default()),
        )
        .await
        .unwrap();
        assert_eq!(item.activity.id, created.activity.id);
        assert!(item.meta.cached);
    }

    #[tokio::test]
    async fn test_writes_require_admin() {
        let state = state();

        let result =
            create_handler(State(state.clone()), CallerHeaders::default(), JsonBody(judo())).await;
        assert!(matches!(result, Err(ServiceError::Unauthorized { .. })));

        let result = delete_handler(State(state), parent(), Path("a1".to_string())).await;
        assert!(matches!(result, Err(ServiceError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let Json(response) = stats_handler(State(state()), admin()).await.unwrap();
        assert_eq!(response.stats.hits, 0);
        assert_eq!(response.stats.max_size, 1000);

        let result = stats_handler(State(state()), parent()).await;
        assert!(matches!(result, Err(ServiceError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_clear_cache_handler() {
        let state = state();
        create_handler(State(state.clone()), admin(), JsonBody(judo()))
            .await
            .unwrap();
        assert_eq!(state.catalog.cache().size(), 1);

        let result = clear_cache_handler(State(state.clone()), CallerHeaders::default()).await;
        assert!(matches!(result, Err(ServiceError::Unauthorized { .. })));
        assert_eq!(state.catalog.cache().size(), 1);

        let Json(response) = clear_cache_handler(State(state.clone()), admin())
            .await
            .unwrap();
        assert_eq!(response.items_cleared, 1);

        let Json(size) = cache_size_handler(State(state), admin()).await.unwrap();
        assert_eq!(size.size, 0);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler(State(state())).await;
        assert_eq!(response.status, "healthy");
        assert!(response.store);
    }
}
