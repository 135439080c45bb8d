use std::path::Path;
use std::sync::Arc;

use burnlink_shared::{NewSecret, SecretId, SecretRecord, SecretStore, StorageError};
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::database::Database;
use crate::error::StoreError;

/// [`SecretStore`] over a shared SQLite connection.
///
/// `fetch` hides rows that have expired and deletes them on the way out, so
/// callers never see a record past its expiry even before the sweeper runs.
#[derive(Clone)]
pub struct SqliteSecretStore {
    db: Arc<Mutex<Database>>,
}

impl SqliteSecretStore {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        Database::open_at(path).map(Self::new)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Database::open_in_memory().map(Self::new)
    }

    /// Remove every expired row; returns how many were deleted.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        self.db.lock().await.sweep_expired(now)
    }

    pub async fn count(&self) -> Result<u64, StoreError> {
        self.db.lock().await.count_secrets()
    }
}

impl SecretStore for SqliteSecretStore {
    async fn insert(&self, secret: NewSecret) -> Result<SecretId, StorageError> {
        let db = self.db.lock().await;
        let record = db.insert_secret(&secret, Utc::now())?;
        Ok(record.id)
    }

    async fn fetch(&self, id: SecretId) -> Result<Option<SecretRecord>, StorageError> {
        let db = self.db.lock().await;
        let Some(record) = db.get_secret(id)? else {
            return Ok(None);
        };

        let now = Utc::now();
        if record.is_expired(now) {
            db.delete_if_expired(id, now)?;
            tracing::debug!(%id, "dropped expired secret on read");
            return Ok(None);
        }
        Ok(Some(record))
    }

    async fn delete(&self, id: SecretId) -> Result<(), StorageError> {
        self.db.lock().await.delete_secret(id)?;
        Ok(())
    }

    async fn take(&self, id: SecretId) -> Result<Option<SecretRecord>, StorageError> {
        let record = self.db.lock().await.take_secret(id)?;
        Ok(record.filter(|r| !r.is_expired(Utc::now())))
    }
}
