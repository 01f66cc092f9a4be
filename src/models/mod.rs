//! Catalog data model and API DTOs
//!
//! Domain types (activities, filters, paging) plus the request and response
//! bodies exchanged with the HTTP layer.

pub mod activity;
pub mod filters;
pub mod pagination;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use activity::{Activity, ActivityPatch, ApprovalStatus, LocalizedText, Price, ScheduleEntry};
pub use filters::FilterSet;
pub use pagination::{PageRequest, PaginationInfo, PaginationWindow};
pub use requests::{ItemQuery, ListQuery};
pub use responses::{
    CacheSizeResponse, ClearCacheResponse, DeleteResponse, HealthResponse, ItemResponse,
    ListResponse, ResponseMeta, StatsResponse,
};
