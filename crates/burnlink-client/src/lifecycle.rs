//! Create, open and unlock one-time secret links.
//!
//! ```text
//! Created ──▶ Viewable ──┬──────────────────────────▶ Viewed
//!                        ├──▶ AwaitingPassphrase ──┬─▶ Viewed
//!                        │                         └─▶ ViewedAndDeleted (burn)
//!                        ├──────────────────────────▶ ViewedAndDeleted (burn)
//!                        └──────────────────────────▶ ExpiredAndDeleted
//! ```
//!
//! Keys and plaintext exist only inside these calls. The store receives the
//! serialized envelope; the link carries the key (standard mode) or nothing
//! (passphrase mode).

use burnlink_shared::fallback::{self, FallbackSecret};
use burnlink_shared::kdf::{self, KdfParams};
use burnlink_shared::{
    crypto, key_codec, payload, CryptoError, CryptoProvider, Decoded, EncryptedEnvelope,
    ExpiryOption, LinkKind, NewSecret, OsCryptoProvider, Payload, SecretId, SecretStore,
    ShareLink, StorageError, SymmetricKey,
};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::LinkError;
use crate::http_store::HttpSecretStore;

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkState {
    Created,
    Viewable,
    AwaitingPassphrase,
    Viewed,
    ViewedAndDeleted,
    ExpiredAndDeleted,
}

/// What to share.
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub payload: Payload,
    pub expiry: ExpiryOption,
    /// `Some` selects passphrase mode.
    pub passphrase: Option<String>,
}

impl CreateRequest {
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(Payload::text(content))
    }

    /// An empty or blank `mime_type` becomes `application/octet-stream`.
    pub fn file(bytes: &[u8], file_name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        let mut mime_type = mime_type.into();
        if mime_type.trim().is_empty() {
            mime_type = DEFAULT_MIME_TYPE.to_string();
        }
        Self::new(Payload::file(bytes, file_name, mime_type))
    }

    pub fn new(payload: Payload) -> Self {
        Self {
            payload,
            expiry: ExpiryOption::default(),
            passphrase: None,
        }
    }

    pub fn expiry(mut self, expiry: ExpiryOption) -> Self {
        self.expiry = expiry;
        self
    }

    pub fn passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = Some(passphrase.into());
        self
    }

    fn validate(&self) -> Result<(), LinkError> {
        match &self.payload {
            Payload::Text { content } if content.trim().is_empty() => {
                return Err(LinkError::Invalid("Please enter a secret to share".into()));
            }
            Payload::File {
                content,
                file_name,
                mime_type,
            } if content.is_empty()
                || file_name.trim().is_empty()
                || mime_type.trim().is_empty() =>
            {
                return Err(LinkError::Invalid("Please select a file to share".into()));
            }
            _ => {}
        }

        if self
            .passphrase
            .as_deref()
            .is_some_and(|p| p.trim().is_empty())
        {
            return Err(LinkError::Invalid("Please enter a passphrase".into()));
        }

        if self.payload.exceeds_limit() {
            return Err(LinkError::TooLarge {
                kind: if self.payload.is_file() { "File" } else { "Text" },
                size: self.payload.size(),
                max: self.payload.max_size(),
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkMode {
    Backend {
        id: SecretId,
        expires_at: DateTime<Utc>,
    },
    /// DEGRADED: no server copy, plaintext in the fragment.
    Fallback,
}

#[derive(Debug, Clone)]
pub struct CreatedLink {
    pub link: ShareLink,
    pub mode: LinkMode,
    pub expiry: ExpiryOption,
}

impl CreatedLink {
    pub fn url(&self) -> String {
        self.link.to_string()
    }

    pub fn state(&self) -> LinkState {
        LinkState::Created
    }

    pub fn is_fallback(&self) -> bool {
        self.mode == LinkMode::Fallback
    }
}

/// A passphrase-protected secret waiting for its passphrase. Nothing has been
/// deleted; the prompt can be answered any number of times. Each answer is
/// checked against the store again, so a prompt for a deleted secret fails.
#[derive(Debug, Clone)]
pub struct PassphrasePrompt {
    pub id: SecretId,
    pub envelope: EncryptedEnvelope,
    pub salt: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealedSecret {
    pub id: SecretId,
    pub content: Decoded,
    pub expires_at: DateTime<Utc>,
    pub remaining: Duration,
    pub state: LinkState,
}

#[derive(Debug, Clone)]
pub enum ViewOutcome {
    Revealed(RevealedSecret),
    AwaitingPassphrase(PassphrasePrompt),
    /// DEGRADED: decoded from the link alone, never touched a store.
    Fallback(FallbackSecret),
}

impl ViewOutcome {
    pub fn state(&self) -> LinkState {
        match self {
            ViewOutcome::Revealed(secret) => secret.state,
            ViewOutcome::AwaitingPassphrase(_) => LinkState::AwaitingPassphrase,
            ViewOutcome::Fallback(_) => LinkState::Viewed,
        }
    }
}

pub struct LinkLifecycle<S, P = OsCryptoProvider> {
    store: S,
    provider: P,
    origin: String,
    allow_fallback: bool,
    kdf: KdfParams,
}

impl<S: SecretStore> LinkLifecycle<S> {
    pub fn new(store: S, origin: impl Into<String>) -> Self {
        Self::with_provider(store, OsCryptoProvider, origin)
    }
}

impl LinkLifecycle<HttpSecretStore> {
    /// Lifecycle talking to the configured server over HTTP.
    pub fn from_config(config: &ClientConfig) -> Result<Self, LinkError> {
        let store = HttpSecretStore::from_config(config)?;
        Ok(Self::new(store, config.origin.clone()).allow_fallback(config.allow_fallback))
    }
}

impl<S: SecretStore, P: CryptoProvider> LinkLifecycle<S, P> {
    pub fn with_provider(store: S, provider: P, origin: impl Into<String>) -> Self {
        Self {
            store,
            provider,
            origin: origin.into(),
            allow_fallback: false,
            kdf: KdfParams::default(),
        }
    }

    /// Permit client-only links when the store cannot be reached at creation.
    pub fn allow_fallback(mut self, allow: bool) -> Self {
        self.allow_fallback = allow;
        self
    }

    /// Override PBKDF2 parameters. Links created with non-default parameters
    /// can only be unlocked by a lifecycle using the same ones.
    pub fn with_kdf_params(mut self, params: KdfParams) -> Self {
        self.kdf = params;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn create(&self, request: CreateRequest) -> Result<CreatedLink, LinkError> {
        request.validate()?;

        let plaintext = payload::serialize(&request.payload)?;

        let (envelope, fragment_key) = match request.passphrase.as_deref() {
            Some(passphrase) => {
                let salt = kdf::generate_salt(&self.provider)?;
                let key = kdf::derive_key_with(passphrase, &salt, &self.kdf);
                let envelope = crypto::encrypt(&plaintext, &key, &self.provider)?;
                (envelope.with_passphrase_salt(salt), None)
            }
            None => {
                let key = key_codec::generate_key(&self.provider)?;
                let envelope = crypto::encrypt(&plaintext, &key, &self.provider)?;
                (envelope, Some(key_codec::encode_key(&key)))
            }
        };
        let envelope = envelope.with_burn_after_read(request.expiry.burn_after_read());

        let expires_at = request.expiry.expires_at(Utc::now());
        let new_secret = NewSecret {
            encrypted_content: envelope.to_json()?,
            expires_at,
        };

        // Only a store that could not take the write triggers the fallback;
        // a rejection from a reachable server is surfaced as is.
        let id = match self.store.insert(new_secret).await {
            Ok(id) => id,
            Err(e @ (StorageError::Unavailable(_) | StorageError::Backend(_)))
                if self.allow_fallback =>
            {
                warn!(error = %e, "storage unavailable, trying client-only fallback");
                return self.create_fallback(&request);
            }
            Err(e) => return Err(e.into()),
        };

        let link = match fragment_key {
            Some(key) => ShareLink::standard(&self.origin, id, key),
            None => ShareLink::passphrase(&self.origin, id),
        };

        info!(
            %id,
            expiry = %request.expiry,
            passphrase = request.passphrase.is_some(),
            burn_after_read = envelope.burn_after_read,
            "created secret link"
        );

        Ok(CreatedLink {
            link,
            mode: LinkMode::Backend { id, expires_at },
            expiry: request.expiry,
        })
    }

    fn create_fallback(&self, request: &CreateRequest) -> Result<CreatedLink, LinkError> {
        let link = fallback::create_link(
            &self.origin,
            &request.payload,
            request.expiry,
            request.passphrase.is_some(),
            &self.provider,
        )?;

        Ok(CreatedLink {
            link,
            mode: LinkMode::Fallback,
            expiry: request.expiry,
        })
    }

    /// Look at a stored secret without decrypting it.
    pub async fn status(&self, id: SecretId) -> Result<LinkState, LinkError> {
        match self.fetch_live(id).await {
            Ok(_) => Ok(LinkState::Viewable),
            Err(LinkError::NotFoundOrExpired) => Ok(LinkState::ExpiredAndDeleted),
            Err(e) => Err(e),
        }
    }

    /// Open a backend secret. `fragment` is the URL fragment, if any.
    pub async fn open(&self, id: SecretId, fragment: Option<&str>) -> Result<ViewOutcome, LinkError> {
        let (envelope, expires_at) = self.fetch_live(id).await?;

        if envelope.is_passphrase_protected() {
            let salt = envelope.passphrase_salt()?.to_string();
            debug!(%id, "secret needs a passphrase");
            return Ok(ViewOutcome::AwaitingPassphrase(PassphrasePrompt {
                id,
                envelope,
                salt,
                expires_at,
            }));
        }

        let fragment = fragment
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .ok_or(LinkError::MissingKey)?;
        let key = key_codec::decode_key(fragment)?;

        let content = decrypt_and_decode(&envelope, &key)?;
        self.reveal(id, &envelope, content, expires_at)
            .await
            .map(ViewOutcome::Revealed)
    }

    /// Open whatever a share link points at.
    pub async fn open_link(&self, link: &ShareLink) -> Result<ViewOutcome, LinkError> {
        match link.kind() {
            LinkKind::Backend { id, key } => self.open(*id, key.as_deref()).await,
            LinkKind::Fallback { .. } => self.open_fallback(link).map(ViewOutcome::Fallback),
        }
    }

    /// Decode a client-only link. Expiry is counted from the caller's first
    /// view via [`FallbackSecret::expires_at`].
    pub fn open_fallback(&self, link: &ShareLink) -> Result<FallbackSecret, LinkError> {
        let secret = fallback::open_link(link)?;
        warn!(ttl_secs = secret.ttl.num_seconds(), "opened client-only fallback link");
        Ok(secret)
    }

    pub async fn unlock(
        &self,
        prompt: &PassphrasePrompt,
        passphrase: &str,
    ) -> Result<RevealedSecret, LinkError> {
        if passphrase.is_empty() {
            return Err(LinkError::Invalid("Please enter the passphrase".into()));
        }

        let (envelope, expires_at) = self.fetch_live(prompt.id).await?;
        let salt = envelope.passphrase_salt()?;

        let key = kdf::derive_key_with(passphrase, salt, &self.kdf);
        let content = decrypt_and_decode(&envelope, &key).map_err(|e| match e {
            CryptoError::InvalidKeyOrCorruptedData => {
                debug!(id = %prompt.id, "passphrase did not unlock secret");
                LinkError::InvalidKeyOrCorruptedData { retryable: true }
            }
            other => other.into(),
        })?;

        self.reveal(prompt.id, &envelope, content, expires_at).await
    }

    /// Fetch and parse a record that has not expired, deleting it if it has.
    async fn fetch_live(&self, id: SecretId) -> Result<(EncryptedEnvelope, DateTime<Utc>), LinkError> {
        let record = self
            .store
            .fetch(id)
            .await?
            .ok_or(LinkError::NotFoundOrExpired)?;

        if record.is_expired(Utc::now()) {
            self.store.delete(id).await?;
            info!(%id, "deleted expired secret");
            return Err(LinkError::NotFoundOrExpired);
        }

        let envelope = EncryptedEnvelope::from_json(&record.encrypted_content)?;
        Ok((envelope, record.expires_at))
    }

    /// Hand decrypted content to the caller, burning the record first when
    /// the envelope asks for it. Only the viewer whose `take` gets the row
    /// sees the content.
    async fn reveal(
        &self,
        id: SecretId,
        envelope: &EncryptedEnvelope,
        content: Decoded,
        expires_at: DateTime<Utc>,
    ) -> Result<RevealedSecret, LinkError> {
        let state = if envelope.burn_after_read {
            if self.store.take(id).await?.is_none() {
                debug!(%id, "lost burn race, secret already viewed");
                return Err(LinkError::NotFoundOrExpired);
            }
            info!(%id, "secret viewed and burned");
            LinkState::ViewedAndDeleted
        } else {
            info!(%id, "secret viewed");
            LinkState::Viewed
        };

        Ok(RevealedSecret {
            id,
            content,
            expires_at,
            remaining: (expires_at - Utc::now()).max(Duration::zero()),
            state,
        })
    }
}

fn decrypt_and_decode(envelope: &EncryptedEnvelope, key: &SymmetricKey) -> Result<Decoded, CryptoError> {
    let plaintext = crypto::decrypt_envelope(envelope, key)?;
    payload::deserialize(&plaintext)
}
