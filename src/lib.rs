//! Activity Catalog - cached query service for an activity directory
//!
//! Provides a read-through in-memory cache with TTL expiration, least
//! recently accessed eviction and pattern invalidation, plus the catalog
//! service that filters, paginates and writes activities on top of it.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use tasks::spawn_cleanup_task;
