use burnlink_shared::{NewSecret, SecretId, SecretRecord};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use crate::database::Database;
use crate::error::Result;

const SECRET_COLUMNS: &str = "id, encrypted_content, expires_at, created_at";

impl Database {
    /// Insert a new secret under a fresh id.
    ///
    /// The returned record carries the timestamps as stored (millisecond
    /// precision for `expires_at`).
    pub fn insert_secret(&self, secret: &NewSecret, now: DateTime<Utc>) -> Result<SecretRecord> {
        let id = SecretId::new();
        let expires_ms = secret.expires_at.timestamp_millis();

        self.conn().execute(
            "INSERT INTO secrets (id, encrypted_content, expires_at, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                id.to_string(),
                secret.encrypted_content,
                expires_ms,
                now.to_rfc3339(),
            ],
        )?;

        tracing::debug!(%id, expires_at = %secret.expires_at, "stored secret");

        Ok(SecretRecord {
            id,
            encrypted_content: secret.encrypted_content.clone(),
            expires_at: DateTime::<Utc>::from_timestamp_millis(expires_ms)
                .unwrap_or(secret.expires_at),
            created_at: now,
        })
    }

    pub fn get_secret(&self, id: SecretId) -> Result<Option<SecretRecord>> {
        let record = self
            .conn()
            .query_row(
                &format!("SELECT {SECRET_COLUMNS} FROM secrets WHERE id = ?1"),
                params![id.to_string()],
                row_to_secret,
            )
            .optional()?;
        Ok(record)
    }

    /// Returns whether a row was removed.
    pub fn delete_secret(&self, id: SecretId) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM secrets WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }

    /// Delete a secret and hand back what it held, in one statement.
    ///
    /// SQLite serialises writers, so two callers racing on the same id cannot
    /// both see the row.
    pub fn take_secret(&self, id: SecretId) -> Result<Option<SecretRecord>> {
        let record = self
            .conn()
            .query_row(
                &format!("DELETE FROM secrets WHERE id = ?1 RETURNING {SECRET_COLUMNS}"),
                params![id.to_string()],
                row_to_secret,
            )
            .optional()?;
        Ok(record)
    }

    /// Delete the secret only if it has expired. Returns whether it was removed.
    pub fn delete_if_expired(&self, id: SecretId, now: DateTime<Utc>) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM secrets WHERE id = ?1 AND expires_at <= ?2",
            params![id.to_string(), now.timestamp_millis()],
        )?;
        Ok(affected > 0)
    }

    /// Remove every secret whose expiry is at or before `now`.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let deleted = self.conn().execute(
            "DELETE FROM secrets WHERE expires_at <= ?1",
            params![now.timestamp_millis()],
        )?;
        Ok(deleted)
    }

    pub fn count_secrets(&self) -> Result<u64> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM secrets", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}

fn row_to_secret(row: &rusqlite::Row<'_>) -> rusqlite::Result<SecretRecord> {
    let id_str: String = row.get(0)?;
    let encrypted_content: String = row.get(1)?;
    let expires_ms: i64 = row.get(2)?;
    let created_str: String = row.get(3)?;

    let id = Uuid::parse_str(&id_str).map(SecretId).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let expires_at = DateTime::<Utc>::from_timestamp_millis(expires_ms)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(2, expires_ms))?;

    let created_at = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(SecretRecord {
        id,
        encrypted_content,
        expires_at,
        created_at,
    })
}
