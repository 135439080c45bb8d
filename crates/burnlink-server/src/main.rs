//! # burnlink-server
//!
//! Storage backend for one-time secret links.
//!
//! This binary provides:
//! - **REST API** (axum) to store, fetch, delete and atomically take
//!   encrypted secrets. Content arrives already encrypted; the server never
//!   sees keys or plaintext.
//! - **Background sweeper** deleting rows whose TTL has passed
//! - **Per-IP rate limiting** to protect against abuse
//! - **Admin sweep endpoint** guarded by a bearer token

mod api;
mod config;
mod error;
mod rate_limit;
mod sweeper;

use std::sync::Arc;
use std::time::Duration;

use burnlink_store::{Database, SqliteSecretStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::rate_limit::RateLimiter;

/// Rate limiter buckets idle this long are dropped.
const RATE_LIMIT_IDLE: Duration = Duration::from_secs(600);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,burnlink_server=debug")),
        )
        .init();

    info!("Starting Burnlink server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(
        instance = %config.instance_name,
        http_addr = %config.http_addr,
        max_content_size = config.max_content_size,
        sweep_interval_secs = config.sweep_interval.as_secs(),
        admin_enabled = config.admin_token.is_some(),
        "Loaded configuration"
    );

    // -----------------------------------------------------------------------
    // 3. Open storage
    // -----------------------------------------------------------------------
    let db = match &config.database_path {
        Some(path) => Database::open_at(path)?,
        None => Database::new()?,
    };
    let store = SqliteSecretStore::new(db);
    info!(stored = store.count().await?, "Secret store ready");

    let rate_limiter = RateLimiter::from_config(&config);

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------
    sweeper::spawn(store.clone(), config.sweep_interval);

    let rl = rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            let purged = rl.purge_idle(RATE_LIMIT_IDLE).await;
            if purged > 0 {
                tracing::debug!(purged, "Purged idle rate limit buckets");
            }
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server until it fails or Ctrl+C
    // -----------------------------------------------------------------------
    let http_addr = config.http_addr;
    let app_state = AppState {
        store,
        rate_limiter,
        config: Arc::new(config),
    };

    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
