//! Services Module
//!
//! Business logic sitting between the HTTP layer and the backing store.

pub mod base;
pub mod catalog;
pub mod filters;

pub use base::{check_authorization, normalize_error, Caller};
pub use catalog::{
    CachedActivities, CatalogCache, CatalogService, CatalogSettings, QueryOptions, ACTIVITIES,
};
