//! Background deletion of expired secrets.
//!
//! Reads already hide expired rows; the sweeper makes sure ciphertext that is
//! never requested again is also gone once its TTL passes.

use std::time::Duration;

use burnlink_store::{SqliteSecretStore, StoreError};
use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Run one sweep pass. Returns the number of deleted rows.
pub async fn sweep_once(store: &SqliteSecretStore, now: DateTime<Utc>) -> Result<usize, StoreError> {
    let deleted = store.sweep_expired(now).await?;
    if deleted > 0 {
        info!(deleted, "swept expired secrets");
    } else {
        debug!("sweep found nothing to delete");
    }
    Ok(deleted)
}

/// Spawn the periodic sweeper. The first pass runs immediately.
pub fn spawn(store: SqliteSecretStore, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            if let Err(e) = sweep_once(&store, Utc::now()).await {
                warn!(error = %e, "sweep failed");
            }
        }
    })
}
