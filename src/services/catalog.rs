//! Catalog query service
//!
//! Read path: cache lookup, store fetch raced against a timeout, visibility
//! rule, predicate chain, pagination. Write path: validation, store write,
//! then list invalidation and item refresh in one cache critical section.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::{keys, Invalidation, MemoryCache};
use crate::config::Config;
use crate::error::{FieldViolation, Result, ServiceError, StoreError, SERVICE_UNAVAILABLE};
use crate::models::{
    Activity, ActivityPatch, DeleteResponse, FilterSet, ItemResponse, ListResponse, PageRequest,
    PaginationWindow, ResponseMeta,
};
use crate::services::base::{from_store_error, normalize_error, Caller};
use crate::services::filters::{apply_filters, visible_to};
use crate::store::ActivityStore;

/// Cache namespace of catalog entries.
pub const ACTIVITIES: &str = "activities";

const SERVICE_NAME: &str = "CatalogService";

// == Error Codes ==
pub const ACTIVITIES_FETCH_ERROR: &str = "ACTIVITIES_FETCH_ERROR";
pub const ACTIVITY_FETCH_ERROR: &str = "ACTIVITY_FETCH_ERROR";
pub const ACTIVITY_CREATE_ERROR: &str = "ACTIVITY_CREATE_ERROR";
pub const ACTIVITY_UPDATE_ERROR: &str = "ACTIVITY_UPDATE_ERROR";
pub const ACTIVITY_DELETE_ERROR: &str = "ACTIVITY_DELETE_ERROR";
pub const ACTIVITY_NOT_FOUND: &str = "ACTIVITY_NOT_FOUND";

/// What the catalog keeps in the shared cache.
#[derive(Debug, Clone)]
pub enum CachedActivities {
    /// Full store listing for one filter set, before visibility and paging
    List(Arc<Vec<Activity>>),
    Item(Arc<Activity>),
}

pub type CatalogCache = MemoryCache<CachedActivities>;

// == Settings ==
#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub list_ttl: Duration,
    pub item_ttl: Duration,
    pub store_timeout: Duration,
    /// Hide server-side failure details from clients
    pub production: bool,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            list_ttl: Duration::from_secs(5 * 60),
            item_ttl: Duration::from_secs(10 * 60),
            store_timeout: Duration::from_secs(30),
            production: false,
        }
    }
}

impl From<&Config> for CatalogSettings {
    fn from(config: &Config) -> Self {
        Self {
            store_timeout: Duration::from_millis(config.store_timeout_ms),
            production: config.is_production(),
            ..Self::default()
        }
    }
}

/// Per-call options.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub user: Option<Caller>,
    /// Skip the cache read and refetch from the store
    pub force_refresh: bool,
}

impl QueryOptions {
    pub fn for_user(user: Caller) -> Self {
        Self {
            user: Some(user),
            force_refresh: false,
        }
    }

    pub fn refreshed(mut self) -> Self {
        self.force_refresh = true;
        self
    }
}

// == Catalog Service ==
pub struct CatalogService {
    store: Option<Arc<dyn ActivityStore>>,
    cache: Arc<CatalogCache>,
    settings: CatalogSettings,
}

impl CatalogService {
    /// Creates a service without a backing store; reads fail as unavailable
    /// until one is attached.
    pub fn new(cache: Arc<CatalogCache>, settings: CatalogSettings) -> Self {
        Self {
            store: None,
            cache,
            settings,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn ActivityStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    pub fn cache(&self) -> &Arc<CatalogCache> {
        &self.cache
    }

    // == List ==
    /// Returns one page of activities matching `filters`.
    ///
    /// The cache key covers the filters only; visibility and paging run on
    /// every call.
    pub async fn list(
        &self,
        filters: &FilterSet,
        page: PageRequest,
        options: &QueryOptions,
    ) -> Result<ListResponse> {
        let started = Instant::now();
        self.list_inner(filters, page, options, started)
            .await
            .map_err(|e| self.fail(e, ACTIVITIES_FETCH_ERROR, started))
    }

    async fn list_inner(
        &self,
        filters: &FilterSet,
        page: PageRequest,
        options: &QueryOptions,
        started: Instant,
    ) -> Result<ListResponse> {
        let store = self.require_store(ACTIVITIES_FETCH_ERROR)?;
        let window = PaginationWindow::from(page);
        let cache_key = keys::list_key(ACTIVITIES, filters);

        let cached = if options.force_refresh {
            None
        } else {
            self.cached_list(&cache_key)
        };

        let (all, was_cached) = match cached {
            Some(list) => {
                debug!("Cache hit for activities list {}", cache_key);
                (list, true)
            }
            None => {
                debug!("Cache miss for activities list {}, fetching", cache_key);
                (self.fetch_list(store, &cache_key).await?, false)
            }
        };

        let visible = visible_to(all.iter(), options.user.as_ref());
        let filtered = apply_filters(visible, filters);
        let (page, pagination) = window.paginate(filtered);
        let data: Vec<Activity> = page.into_iter().cloned().collect();

        let duration_ms = elapsed_ms(started);
        info!(
            "Returning {} activities ({} total, {}ms)",
            data.len(),
            pagination.total,
            duration_ms
        );

        Ok(ListResponse {
            data,
            pagination,
            meta: ResponseMeta {
                cached: was_cached,
                duration_ms,
            },
        })
    }

    async fn fetch_list(
        &self,
        store: &Arc<dyn ActivityStore>,
        cache_key: &str,
    ) -> Result<Arc<Vec<Activity>>> {
        match self.race(store.list(), ACTIVITIES_FETCH_ERROR).await? {
            Ok(all) => {
                info!("Retrieved {} activities from data store", all.len());
                let all = Arc::new(all);
                self.cache.set_with_ttl(
                    cache_key,
                    CachedActivities::List(all.clone()),
                    Some(self.settings.list_ttl),
                );
                Ok(all)
            }
            Err(StoreError::RateLimited(reason)) => {
                warn!("Data store rate limited ({}), serving stale list", reason);
                let fallback = self
                    .cached_list(&keys::list_key(ACTIVITIES, &FilterSet::default()))
                    .unwrap_or_default();
                if !fallback.is_empty() {
                    self.cache.set_with_ttl(
                        cache_key,
                        CachedActivities::List(fallback.clone()),
                        Some(self.settings.list_ttl),
                    );
                }
                Ok(fallback)
            }
            Err(e) => Err(from_store_error(e, ACTIVITIES_FETCH_ERROR)),
        }
    }

    // == Get ==
    /// Read-through lookup of a single activity.
    pub async fn get(&self, id: &str, options: &QueryOptions) -> Result<ItemResponse> {
        let started = Instant::now();
        self.get_inner(id, options)
            .await
            .map(|(activity, cached)| ItemResponse {
                activity,
                meta: ResponseMeta {
                    cached,
                    duration_ms: elapsed_ms(started),
                },
            })
            .map_err(|e| self.fail(e, ACTIVITY_FETCH_ERROR, started))
    }

    async fn get_inner(&self, id: &str, options: &QueryOptions) -> Result<(Activity, bool)> {
        let cache_key = keys::item_key(ACTIVITIES, id);

        if !options.force_refresh {
            if let Some(CachedActivities::Item(activity)) = self.cache.get(&cache_key) {
                debug!("Cache hit for activity {}", id);
                return Ok(((*activity).clone(), true));
            }
        }

        let store = self.require_store(ACTIVITY_FETCH_ERROR)?;
        let found = match self.race(store.get(id), ACTIVITY_FETCH_ERROR).await? {
            Ok(found) => found,
            Err(StoreError::RateLimited(reason)) => {
                warn!("Data store rate limited ({}), looking in cached list", reason);
                let fallback = self
                    .cached_list(&keys::list_key(ACTIVITIES, &FilterSet::default()))
                    .and_then(|all| all.iter().find(|a| a.id == id).cloned());
                if fallback.is_none() {
                    return Err(ServiceError::unavailable(
                        SERVICE_UNAVAILABLE,
                        "Service temporarily unavailable due to high demand. Please try again in a moment.",
                    ));
                }
                fallback
            }
            Err(e) => return Err(from_store_error(e, ACTIVITY_FETCH_ERROR)),
        };

        let activity = found.ok_or_else(not_found)?;
        self.cache.set_with_ttl(
            cache_key,
            CachedActivities::Item(Arc::new(activity.clone())),
            Some(self.settings.item_ttl),
        );
        Ok((activity, false))
    }

    // == Create ==
    /// Validates, persists and caches a new activity.
    pub async fn create(
        &self,
        data: ActivityPatch,
        _options: &QueryOptions,
    ) -> Result<ItemResponse> {
        let started = Instant::now();
        self.create_inner(data)
            .await
            .map(|activity| fresh(activity, started))
            .map_err(|e| self.fail(e, ACTIVITY_CREATE_ERROR, started))
    }

    async fn create_inner(&self, data: ActivityPatch) -> Result<Activity> {
        validate_activity(&data, false)?;
        let store = self.require_store(ACTIVITY_CREATE_ERROR)?;

        let activity = Activity::from_patch(Uuid::new_v4().to_string(), data, Utc::now());
        let created = store
            .create(activity)
            .await
            .map_err(|e| from_store_error(e, ACTIVITY_CREATE_ERROR))?;

        self.refresh_item(&created);
        info!("Created activity {}", created.id);
        Ok(created)
    }

    // == Update ==
    /// Applies a partial update. Fields absent from `data` are kept.
    pub async fn update(
        &self,
        id: &str,
        data: ActivityPatch,
        _options: &QueryOptions,
    ) -> Result<ItemResponse> {
        let started = Instant::now();
        self.update_inner(id, data)
            .await
            .map(|activity| fresh(activity, started))
            .map_err(|e| self.fail(e, ACTIVITY_UPDATE_ERROR, started))
    }

    async fn update_inner(&self, id: &str, mut data: ActivityPatch) -> Result<Activity> {
        validate_activity(&data, true)?;
        let store = self.require_store(ACTIVITY_UPDATE_ERROR)?;

        data.updated_at = Some(Utc::now());
        let updated = store
            .update(id, data)
            .await
            .map_err(|e| from_store_error(e, ACTIVITY_UPDATE_ERROR))?
            .ok_or_else(not_found)?;

        self.refresh_item(&updated);
        info!("Updated activity {}", updated.id);
        Ok(updated)
    }

    // == Delete ==
    pub async fn delete(&self, id: &str, _options: &QueryOptions) -> Result<DeleteResponse> {
        let started = Instant::now();
        self.delete_inner(id)
            .await
            .map_err(|e| self.fail(e, ACTIVITY_DELETE_ERROR, started))
    }

    async fn delete_inner(&self, id: &str) -> Result<DeleteResponse> {
        let store = self.require_store(ACTIVITY_DELETE_ERROR)?;

        let removed = store
            .remove(id)
            .await
            .map_err(|e| from_store_error(e, ACTIVITY_DELETE_ERROR))?;
        if !removed {
            return Err(not_found());
        }

        let dropped = self.cache.invalidate(Invalidation::remove(ACTIVITIES, id));
        info!("Deleted activity {} ({} cached lists dropped)", id, dropped);
        Ok(DeleteResponse::ok())
    }

    // == Helpers ==
    fn require_store(&self, code: &'static str) -> Result<&Arc<dyn ActivityStore>> {
        self.store
            .as_ref()
            .ok_or_else(|| ServiceError::unavailable(code, "Data store not available"))
    }

    fn cached_list(&self, key: &str) -> Option<Arc<Vec<Activity>>> {
        match self.cache.get(key) {
            Some(CachedActivities::List(all)) => Some(all),
            _ => None,
        }
    }

    fn refresh_item(&self, activity: &Activity) {
        self.cache.invalidate(Invalidation::upsert(
            ACTIVITIES,
            &activity.id,
            CachedActivities::Item(Arc::new(activity.clone())),
            Some(self.settings.item_ttl),
        ));
    }

    /// Races a store call against the configured timeout. The call is
    /// dropped if the timeout wins.
    async fn race<T>(&self, call: impl Future<Output = T>, code: &'static str) -> Result<T> {
        let timeout = self.settings.store_timeout;
        tokio::time::timeout(timeout, call)
            .await
            .map_err(|_| ServiceError::Timeout {
                code,
                message: "Data store operation timed out".to_string(),
                elapsed: timeout,
            })
    }

    fn fail(&self, error: ServiceError, code: &'static str, started: Instant) -> ServiceError {
        let error = normalize_error(SERVICE_NAME, error.into(), code);
        if let Some(original) = error.original_error() {
            debug!(
                "{} failed after {}ms, original error: {:?}",
                code,
                elapsed_ms(started),
                original
            );
        }
        error.redacted(self.settings.production)
    }
}

/// Wraps an activity just written to the store.
fn fresh(activity: Activity, started: Instant) -> ItemResponse {
    ItemResponse {
        activity,
        meta: ResponseMeta {
            cached: false,
            duration_ms: elapsed_ms(started),
        },
    }
}

fn not_found() -> ServiceError {
    ServiceError::not_found(ACTIVITY_NOT_FOUND, "Activity not found")
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

/// Collects every violated write rule instead of stopping at the first.
pub fn validate_activity(data: &ActivityPatch, is_update: bool) -> Result<()> {
    let mut violations = Vec::new();

    if !is_update && data.title.as_ref().map_or(true, |t| t.is_blank()) {
        violations.push(FieldViolation::new("title", "Title is required"));
    }

    if let (Some(min), Some(max)) = (data.age_min, data.age_max) {
        if min > max {
            violations.push(FieldViolation::new(
                "ageMin",
                "Minimum age cannot be greater than maximum age",
            ));
        }
    }

    if let Some(price) = &data.price {
        if price.amount < 0.0 || price.amount.is_nan() {
            violations.push(FieldViolation::new(
                "price.amount",
                "Price cannot be negative",
            ));
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::validation(violations))
    }
}
