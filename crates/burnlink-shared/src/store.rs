//! Contract for the service that holds ciphertext between share and view.
//!
//! The store only ever sees the serialized [`EncryptedEnvelope`] text and an
//! expiry. Keys and plaintext never cross this boundary.
//!
//! [`EncryptedEnvelope`]: crate::envelope::EncryptedEnvelope

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::types::SecretId;

/// A secret about to be stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSecret {
    pub encrypted_content: String,
    pub expires_at: DateTime<Utc>,
}

/// A stored secret as held by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRecord {
    pub id: SecretId,
    pub encrypted_content: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl SecretRecord {
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at - now
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.remaining(now) <= Duration::zero()
    }
}

pub trait SecretStore: Send + Sync {
    /// Store a secret and return its newly assigned id.
    fn insert(
        &self,
        secret: NewSecret,
    ) -> impl Future<Output = Result<SecretId, StorageError>> + Send;

    fn fetch(
        &self,
        id: SecretId,
    ) -> impl Future<Output = Result<Option<SecretRecord>, StorageError>> + Send;

    /// Delete a secret. Deleting a missing id is not an error.
    fn delete(&self, id: SecretId) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Atomically delete a secret and return what was stored.
    ///
    /// Of several concurrent callers for the same id at most one receives
    /// `Some`; this is what makes burn-after-read hold under racing viewers.
    fn take(
        &self,
        id: SecretId,
    ) -> impl Future<Output = Result<Option<SecretRecord>, StorageError>> + Send;
}

impl<S: SecretStore> SecretStore for Arc<S> {
    fn insert(
        &self,
        secret: NewSecret,
    ) -> impl Future<Output = Result<SecretId, StorageError>> + Send {
        (**self).insert(secret)
    }

    fn fetch(
        &self,
        id: SecretId,
    ) -> impl Future<Output = Result<Option<SecretRecord>, StorageError>> + Send {
        (**self).fetch(id)
    }

    fn delete(&self, id: SecretId) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).delete(id)
    }

    fn take(
        &self,
        id: SecretId,
    ) -> impl Future<Output = Result<Option<SecretRecord>, StorageError>> + Send {
        (**self).take(id)
    }
}
