//! API Routes
//!
//! Configures the Axum router with all catalog endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cache_size_handler, clear_cache_handler, create_handler, delete_handler, get_handler,
    health_handler, list_handler, stats_handler, update_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /activities` - Filtered, paginated catalog query
/// - `POST /activities` - Create an activity (admin)
/// - `GET /activities/:id` - Single activity
/// - `PUT /activities/:id` - Partial update (admin)
/// - `DELETE /activities/:id` - Delete (admin)
/// - `GET /cache/stats` - Cache statistics (admin)
/// - `POST /cache/clear` - Drop every cached entry (admin)
/// - `GET /cache/size` - Number of cached entries (admin)
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/activities", get(list_handler).post(create_handler))
        .route(
            "/activities/:id",
            get(get_handler).put(update_handler).delete(delete_handler),
        )
        .route("/cache/stats", get(stats_handler))
        .route("/cache/clear", post(clear_cache_handler))
        .route("/cache/size", get(cache_size_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
