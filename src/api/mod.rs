//! API Module
//!
//! HTTP handlers and routing for the catalog REST API.
//!
//! # Endpoints
//! - `GET /activities` - Filtered, paginated catalog query
//! - `POST /activities` - Create an activity
//! - `GET|PUT|DELETE /activities/:id` - Single activity operations
//! - `GET /cache/stats` - Cache statistics (admin)
//! - `POST /cache/clear` - Drop every cached entry (admin)
//! - `GET /cache/size` - Number of cached entries (admin)
//! - `GET /health` - Health check endpoint

pub mod extract;
pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
