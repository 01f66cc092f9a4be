//! Activity Catalog - cached query service for an activity directory
//!
//! Binary entry point: wires config, store, cache and HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use activity_catalog::api::create_router;
use activity_catalog::cache::{CacheConfig, MemoryCache};
use activity_catalog::services::{CatalogCache, CatalogService, CatalogSettings};
use activity_catalog::store::InMemoryActivityStore;
use activity_catalog::{AppState, Config};

/// Main entry point for the catalog server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Load the activity store, seeded from file when configured
/// 4. Create the cache and start its background sweep
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM, then destroy the cache
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "activity_catalog=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Activity Catalog Server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: cache_max_size={}, default_ttl={}ms, port={}, cleanup_interval={}s, store_timeout={}ms, env={}",
        config.cache_max_size,
        config.cache_default_ttl_ms,
        config.server_port,
        config.cleanup_interval,
        config.store_timeout_ms,
        config.app_env
    );

    let store = match &config.seed_file {
        Some(path) => InMemoryActivityStore::from_seed_file(path).await?,
        None => InMemoryActivityStore::new(),
    };
    info!("Activity store loaded with {} activities", store.len().await);

    let cache: Arc<CatalogCache> = MemoryCache::start(CacheConfig::from(&config));
    info!("Cache initialized, background sweep started");

    let catalog = CatalogService::new(cache.clone(), CatalogSettings::from(&config))
        .with_store(Arc::new(store));
    let app = create_router(AppState::new(catalog));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    let dropped = cache.destroy();
    warn!("Cache destroyed, {} entries dropped", dropped);
    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
