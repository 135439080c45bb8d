//! Share link format.
//!
//! ```text
//! standard:   <origin>/view/<uuid>#<urlsafe-base64-key>
//! passphrase: <origin>/view/<uuid>
//! fallback:   <origin>/view/<short-id>#<percent-encoded payload>|<ttl secs>
//! ```
//!
//! The key lives in the fragment, which browsers never send to a server.

use std::fmt;

use url::Url;

use crate::constants::VIEW_PATH;
use crate::error::LinkFormatError;
use crate::types::SecretId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkKind {
    /// Ciphertext held by the storage backend.
    Backend { id: SecretId, key: Option<String> },
    /// Degraded client-only link; the fragment is the secret itself.
    Fallback { id: String, fragment: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    origin: String,
    kind: LinkKind,
}

impl ShareLink {
    /// Key-in-fragment link.
    pub fn standard(origin: &str, id: SecretId, key: impl Into<String>) -> Self {
        Self {
            origin: normalize_origin(origin),
            kind: LinkKind::Backend {
                id,
                key: Some(key.into()),
            },
        }
    }

    /// Passphrase link: no key material at all.
    pub fn passphrase(origin: &str, id: SecretId) -> Self {
        Self {
            origin: normalize_origin(origin),
            kind: LinkKind::Backend { id, key: None },
        }
    }

    pub(crate) fn fallback(origin: &str, id: String, fragment: String) -> Self {
        Self {
            origin: normalize_origin(origin),
            kind: LinkKind::Fallback {
                id,
                fragment: Some(fragment),
            },
        }
    }

    pub fn parse(text: &str) -> Result<Self, LinkFormatError> {
        let url = Url::parse(text.trim()).map_err(|e| LinkFormatError::InvalidUrl(e.to_string()))?;

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();
        let [prefix @ .., view, id] = segments.as_slice() else {
            return Err(LinkFormatError::NotAViewLink);
        };
        if *view != VIEW_PATH {
            return Err(LinkFormatError::NotAViewLink);
        }

        let mut base = url.clone();
        base.set_fragment(None);
        base.set_query(None);
        base.set_path(&prefix.join("/"));
        let origin = normalize_origin(base.as_str());

        let fragment = url.fragment().filter(|f| !f.is_empty()).map(str::to_string);
        let kind = match SecretId::parse(id) {
            Ok(id) => LinkKind::Backend { id, key: fragment },
            Err(_) => LinkKind::Fallback {
                id: id.to_string(),
                fragment,
            },
        };

        Ok(Self { origin, kind })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn kind(&self) -> &LinkKind {
        &self.kind
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.kind, LinkKind::Fallback { .. })
    }
}

impl fmt::Display for ShareLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (id, fragment) = match &self.kind {
            LinkKind::Backend { id, key } => (id.to_string(), key.as_deref()),
            LinkKind::Fallback { id, fragment } => (id.clone(), fragment.as_deref()),
        };
        write!(f, "{}/{}/{}", self.origin, VIEW_PATH, id)?;
        if let Some(fragment) = fragment {
            write!(f, "#{fragment}")?;
        }
        Ok(())
    }
}

fn normalize_origin(origin: &str) -> String {
    origin.trim().trim_end_matches('/').to_string()
}
