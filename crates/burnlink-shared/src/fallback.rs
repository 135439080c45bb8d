//! Client-only fallback links.
//!
//! DEGRADED MODE. Used only when the storage backend cannot be reached at
//! creation time. The plaintext travels in the URL fragment with no
//! encryption, no server copy and no real one-time semantics: anyone holding
//! the link can open it until the viewer's own clock says it expired. Files,
//! passphrases and `Instant` expiry are refused because none of them can be
//! honoured without a backend.

use chrono::{DateTime, Duration, Utc};

use crate::constants::{FALLBACK_DEFAULT_TTL_SECS, FALLBACK_ID_LEN};
use crate::error::FallbackError;
use crate::expiry::ExpiryOption;
use crate::link::{LinkKind, ShareLink};
use crate::payload::{self, Decoded, Payload};
use crate::provider::{random_array, CryptoProvider};

const ID_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// What a fallback link decodes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackSecret {
    pub content: Decoded,
    pub ttl: Duration,
}

impl FallbackSecret {
    /// The viewer starts the clock the first time it sees the link.
    pub fn expires_at(&self, first_seen: DateTime<Utc>) -> DateTime<Utc> {
        first_seen + self.ttl
    }

    pub fn is_expired(&self, first_seen: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.expires_at(first_seen) <= now
    }
}

/// Build a fallback link for a text payload.
pub fn create_link(
    origin: &str,
    payload: &Payload,
    expiry: ExpiryOption,
    passphrase_requested: bool,
    provider: &impl CryptoProvider,
) -> Result<ShareLink, FallbackError> {
    if payload.is_file() {
        return Err(FallbackError::FilesUnsupported);
    }
    if passphrase_requested {
        return Err(FallbackError::PassphraseUnsupported);
    }
    if expiry.burn_after_read() {
        return Err(FallbackError::InstantUnsupported);
    }

    let json = payload::serialize(payload)?;
    let fragment = format!("{}|{}", urlencoding::encode(&json), expiry.ttl_secs());

    let id_bytes: [u8; FALLBACK_ID_LEN] = random_array(provider)?;
    let id: String = id_bytes
        .iter()
        .map(|b| ID_ALPHABET[(*b as usize) % ID_ALPHABET.len()] as char)
        .collect();

    tracing::warn!(ttl_secs = expiry.ttl_secs(), "created client-only fallback link");
    Ok(ShareLink::fallback(origin, id, fragment))
}

/// Decode a fallback link's fragment.
pub fn open_link(link: &ShareLink) -> Result<FallbackSecret, FallbackError> {
    let LinkKind::Fallback { fragment, .. } = link.kind() else {
        return Err(FallbackError::Malformed("not a fallback link".into()));
    };
    let fragment = fragment.as_deref().ok_or(FallbackError::Empty)?;

    let (encoded, ttl) = match fragment.split_once('|') {
        Some((encoded, ttl)) => (encoded, ttl.trim().parse::<i64>().ok()),
        None => (fragment, None),
    };
    let ttl_secs = ttl.filter(|secs| *secs > 0).unwrap_or(FALLBACK_DEFAULT_TTL_SECS);

    let text = urlencoding::decode(encoded).map_err(|e| FallbackError::Malformed(e.to_string()))?;
    if text.is_empty() {
        return Err(FallbackError::Empty);
    }

    let content = payload::deserialize(&text).map_err(|e| FallbackError::Malformed(e.to_string()))?;

    Ok(FallbackSecret {
        content,
        ttl: Duration::seconds(ttl_secs),
    })
}
