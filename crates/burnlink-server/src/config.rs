//! Server configuration loaded from environment variables.
//!
//! All settings have defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP API.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: unset, meaning `burnlink.db` in the platform data directory.
    pub database_path: Option<PathBuf>,

    /// Largest accepted `encrypted_content`, in bytes.
    /// Env: `MAX_CONTENT_SIZE`
    /// Default: 16 MiB
    pub max_content_size: usize,

    /// How often the sweeper deletes expired rows.
    /// Env: `SWEEP_INTERVAL_SECS`
    /// Default: 60
    pub sweep_interval: Duration,

    /// Admin API bearer token. Required to access /admin/* endpoints.
    /// Env: `ADMIN_TOKEN`
    /// Default: empty (admin API disabled).
    pub admin_token: Option<String>,

    /// Sustained requests per second allowed per client IP.
    /// Env: `RATE_LIMIT_PER_SEC`
    pub rate_limit_per_sec: f64,

    /// Burst size per client IP.
    /// Env: `RATE_LIMIT_BURST`
    pub rate_limit_burst: f64,

    /// Human-readable name for this server instance.
    /// Env: `INSTANCE_NAME`
    pub instance_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], 8080).into(),
            database_path: None,
            max_content_size: 16 * 1024 * 1024, // 16 MiB
            sweep_interval: Duration::from_secs(60),
            admin_token: None,
            rate_limit_per_sec: 10.0,
            rate_limit_burst: 30.0,
            instance_name: "Burnlink".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Unparsable values are logged and
    /// the default is kept.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = parse_var(&lookup, "HTTP_ADDR") {
            config.http_addr = addr;
        }

        if let Some(path) = lookup("DATABASE_PATH").filter(|p| !p.trim().is_empty()) {
            config.database_path = Some(PathBuf::from(path));
        }

        if let Some(size) = parse_var::<usize>(&lookup, "MAX_CONTENT_SIZE").filter(|n| *n > 0) {
            config.max_content_size = size;
        }

        if let Some(secs) = parse_var::<u64>(&lookup, "SWEEP_INTERVAL_SECS").filter(|n| *n > 0) {
            config.sweep_interval = Duration::from_secs(secs);
        }

        if let Some(token) = lookup("ADMIN_TOKEN") {
            if !token.is_empty() {
                config.admin_token = Some(token);
            }
        }

        if let Some(rate) = parse_var::<f64>(&lookup, "RATE_LIMIT_PER_SEC").filter(|r| *r > 0.0) {
            config.rate_limit_per_sec = rate;
        }

        if let Some(burst) = parse_var::<f64>(&lookup, "RATE_LIMIT_BURST").filter(|b| *b >= 1.0) {
            config.rate_limit_burst = burst;
        }

        if let Some(name) = lookup("INSTANCE_NAME") {
            config.instance_name = name;
        }

        // RUST_LOG is read by tracing-subscriber's EnvFilter directly.

        config
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Invalid value, using default");
            None
        }
    }
}
