use burnlink_shared::{CryptoError, FallbackError, LinkFormatError, StorageError};
use thiserror::Error;

/// Everything a create/view/unlock call can report to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error("Cryptography is not available; a secure random source is required")]
    CryptoUnavailable,

    #[error("Invalid key format")]
    InvalidKeyFormat,

    #[error("Corrupted Data: {0}")]
    CorruptedData(String),

    /// Never says whether the key or the ciphertext was at fault.
    #[error("Invalid Key or Corrupted Data")]
    InvalidKeyOrCorruptedData { retryable: bool },

    #[error("This link is missing its decryption key")]
    MissingKey,

    #[error("Secret not found or has expired")]
    NotFoundOrExpired,

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("{0}")]
    Invalid(String),

    #[error("{kind} is too large: {size} bytes (max {max})")]
    TooLarge {
        kind: &'static str,
        size: usize,
        max: usize,
    },

    #[error("{0}")]
    FallbackUnsupported(String),
}

impl LinkError {
    /// Whether the same link can succeed with different user input.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LinkError::MissingKey | LinkError::InvalidKeyOrCorruptedData { retryable: true }
        )
    }
}

impl From<CryptoError> for LinkError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::CryptoUnavailable => LinkError::CryptoUnavailable,
            CryptoError::InvalidKeyFormat => LinkError::InvalidKeyFormat,
            CryptoError::CorruptedData(reason) => LinkError::CorruptedData(reason),
            CryptoError::InvalidKeyOrCorruptedData => {
                LinkError::InvalidKeyOrCorruptedData { retryable: false }
            }
            CryptoError::EncryptionFailed => LinkError::CorruptedData(err.to_string()),
        }
    }
}

impl From<StorageError> for LinkError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Rejected(reason) => LinkError::Invalid(reason),
            other => LinkError::StorageUnavailable(other.to_string()),
        }
    }
}

impl From<FallbackError> for LinkError {
    fn from(err: FallbackError) -> Self {
        match err {
            FallbackError::FilesUnsupported
            | FallbackError::PassphraseUnsupported
            | FallbackError::InstantUnsupported => LinkError::FallbackUnsupported(err.to_string()),
            FallbackError::Empty => LinkError::NotFoundOrExpired,
            FallbackError::Malformed(reason) => LinkError::CorruptedData(reason),
            FallbackError::Crypto(inner) => inner.into(),
        }
    }
}

impl From<LinkFormatError> for LinkError {
    fn from(err: LinkFormatError) -> Self {
        LinkError::Invalid(err.to_string())
    }
}
