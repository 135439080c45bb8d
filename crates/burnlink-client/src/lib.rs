//! # burnlink-client
//!
//! The link lifecycle on top of any [`SecretStore`](burnlink_shared::SecretStore):
//! encrypt and share, open and reveal, unlock passphrase links, burn after
//! reading. [`HttpSecretStore`] talks to `burnlink-server`.

pub mod config;
pub mod http_store;
pub mod lifecycle;

mod error;

pub use config::ClientConfig;
pub use error::LinkError;
pub use http_store::HttpSecretStore;
pub use lifecycle::{
    CreateRequest, CreatedLink, LinkLifecycle, LinkMode, LinkState, PassphrasePrompt,
    RevealedSecret, ViewOutcome,
};
