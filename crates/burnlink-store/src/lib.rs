//! # burnlink-store
//!
//! SQLite-backed storage for encrypted secrets.
//!
//! Rows hold only the serialized envelope and its expiry; the store has no
//! way to decrypt anything it keeps. [`Database`] is the synchronous
//! `rusqlite` handle with typed helpers, [`SqliteSecretStore`] wraps it for
//! async callers and implements the shared `SecretStore` contract.

pub mod database;
pub mod migrations;
pub mod secrets;
pub mod sqlite_store;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use sqlite_store::SqliteSecretStore;
