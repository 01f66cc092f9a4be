//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Default cache TTL in milliseconds, 0 = entries never expire
    pub cache_default_ttl_ms: u64,
    /// Maximum number of entries the cache can hold
    pub cache_max_size: usize,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Upper bound on a single data store read, in milliseconds
    pub store_timeout_ms: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Deployment environment name
    pub app_env: String,
    /// JSON file of activities loaded into the in-memory store at startup
    pub seed_file: Option<PathBuf>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DEFAULT_TTL` - Default TTL in milliseconds (default: 300000)
    /// - `CACHE_MAX_SIZE` - Maximum cache entries (default: 1000)
    /// - `CACHE_CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 60)
    /// - `STORE_TIMEOUT_MS` - Data store timeout in milliseconds (default: 30000)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `APP_ENV` - `production` hides server-side error details (default: development)
    /// - `ACTIVITIES_SEED_FILE` - Optional seed file path
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_default_ttl_ms: parse_var("CACHE_DEFAULT_TTL")
                .unwrap_or(defaults.cache_default_ttl_ms),
            cache_max_size: parse_var("CACHE_MAX_SIZE").unwrap_or(defaults.cache_max_size),
            cleanup_interval: parse_var::<u64>("CACHE_CLEANUP_INTERVAL")
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.cleanup_interval),
            store_timeout_ms: parse_var("STORE_TIMEOUT_MS").unwrap_or(defaults.store_timeout_ms),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            app_env: env::var("APP_ENV").unwrap_or(defaults.app_env),
            seed_file: env::var("ACTIVITIES_SEED_FILE")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_default_ttl_ms: 300_000,
            cache_max_size: 1000,
            cleanup_interval: 60,
            store_timeout_ms: 30_000,
            server_port: 3000,
            app_env: "development".to_string(),
            seed_file: None,
        }
    }
}
