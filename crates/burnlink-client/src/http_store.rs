//! [`SecretStore`] backed by the burnlink server's HTTP API.

use std::time::Duration;

use burnlink_shared::{NewSecret, SecretId, SecretRecord, SecretStore, StorageError};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::config::ClientConfig;

#[derive(Deserialize)]
struct CreatedResponse {
    id: SecretId,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Clone)]
pub struct HttpSecretStore {
    client: reqwest::Client,
    base: Url,
}

impl HttpSecretStore {
    pub fn new(server_url: &str, timeout: Duration) -> Result<Self, StorageError> {
        let mut base = Url::parse(server_url.trim())
            .map_err(|e| StorageError::Unavailable(format!("invalid server URL: {e}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        Ok(Self { client, base })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, StorageError> {
        Self::new(&config.server_url, config.timeout)
    }

    fn endpoint(&self, path: &str) -> Result<Url, StorageError> {
        self.base
            .join(path)
            .map_err(|e| StorageError::Unavailable(format!("invalid endpoint {path}: {e}")))
    }

    fn secret_url(&self, id: SecretId) -> Result<Url, StorageError> {
        self.endpoint(&format!("secrets/{id}"))
    }
}

fn request_failed(err: reqwest::Error) -> StorageError {
    tracing::warn!(error = %err, "storage server request failed");
    StorageError::Unavailable(err.to_string())
}

/// Turn a non-success response into a [`StorageError`], using the server's
/// `{"error": ...}` body when there is one.
async fn error_from(resp: Response) -> StorageError {
    let status = resp.status();
    let message = resp
        .json::<ErrorResponse>()
        .await
        .map(|body| body.error)
        .unwrap_or_else(|_| status.to_string());

    if status.is_client_error() {
        StorageError::Rejected(message)
    } else {
        StorageError::Backend(message)
    }
}

async fn record_or_none(resp: Response) -> Result<Option<SecretRecord>, StorageError> {
    match resp.status() {
        StatusCode::OK => resp
            .json::<SecretRecord>()
            .await
            .map(Some)
            .map_err(|e| StorageError::Backend(format!("invalid record: {e}"))),
        StatusCode::NOT_FOUND => Ok(None),
        _ => Err(error_from(resp).await),
    }
}

impl SecretStore for HttpSecretStore {
    async fn insert(&self, secret: NewSecret) -> Result<SecretId, StorageError> {
        let resp = self
            .client
            .post(self.endpoint("secrets")?)
            .json(&secret)
            .send()
            .await
            .map_err(request_failed)?;

        if !resp.status().is_success() {
            return Err(error_from(resp).await);
        }
        let created: CreatedResponse = resp
            .json()
            .await
            .map_err(|e| StorageError::Backend(format!("invalid create response: {e}")))?;
        Ok(created.id)
    }

    async fn fetch(&self, id: SecretId) -> Result<Option<SecretRecord>, StorageError> {
        let resp = self
            .client
            .get(self.secret_url(id)?)
            .send()
            .await
            .map_err(request_failed)?;
        record_or_none(resp).await
    }

    async fn delete(&self, id: SecretId) -> Result<(), StorageError> {
        let resp = self
            .client
            .delete(self.secret_url(id)?)
            .send()
            .await
            .map_err(request_failed)?;

        if resp.status().is_success() || resp.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Err(error_from(resp).await)
    }

    async fn take(&self, id: SecretId) -> Result<Option<SecretRecord>, StorageError> {
        let resp = self
            .client
            .post(self.endpoint(&format!("secrets/{id}/take"))?)
            .send()
            .await
            .map_err(request_failed)?;
        record_or_none(resp).await
    }
}
