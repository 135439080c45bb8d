//! # burnlink-shared
//!
//! Client-side cryptography and wire formats for one-time secret links.
//!
//! ```text
//! Payload ──serialize──▶ JSON ──AES-256-GCM──▶ EncryptedEnvelope ──▶ SecretStore
//!                                  ▲
//!            random key (link fragment) or PBKDF2(passphrase, salt)
//! ```
//!
//! Nothing in this crate talks to the network; the storage backend is the
//! [`store::SecretStore`] contract and randomness comes from an injected
//! [`provider::CryptoProvider`].

pub mod constants;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod expiry;
pub mod fallback;
pub mod kdf;
pub mod key_codec;
pub mod link;
pub mod payload;
pub mod provider;
pub mod store;
pub mod types;

pub use envelope::EncryptedEnvelope;
pub use error::{CryptoError, FallbackError, LinkFormatError, StorageError};
pub use expiry::ExpiryOption;
pub use key_codec::SymmetricKey;
pub use link::{LinkKind, ShareLink};
pub use payload::{Decoded, FileSecret, Payload};
pub use provider::{CryptoProvider, OsCryptoProvider};
pub use store::{NewSecret, SecretRecord, SecretStore};
pub use types::SecretId;
