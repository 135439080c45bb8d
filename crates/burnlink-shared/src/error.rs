use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Cryptography is not available; a secure random source is required")]
    CryptoUnavailable,

    #[error("Invalid key format")]
    InvalidKeyFormat,

    #[error("Corrupted Data: {0}")]
    CorruptedData(String),

    // Deliberately does not say which of the two was at fault.
    #[error("Invalid Key or Corrupted Data")]
    InvalidKeyOrCorruptedData,

    #[error("Encryption failed")]
    EncryptionFailed,
}

impl CryptoError {
    pub fn corrupted(reason: impl Into<String>) -> Self {
        Self::CorruptedData(reason.into())
    }
}

/// Failures reported by a storage collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Storage rejected the request: {0}")]
    Rejected(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FallbackError {
    #[error("Files cannot be shared in offline/fallback mode")]
    FilesUnsupported,

    #[error("Passphrase protection requires backend storage")]
    PassphraseUnsupported,

    #[error("'Instant' expiration requires backend storage")]
    InstantUnsupported,

    #[error("No secret found in link")]
    Empty,

    #[error("Malformed fallback link: {0}")]
    Malformed(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkFormatError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Link is not a /view/<id> link")]
    NotAViewLink,
}
