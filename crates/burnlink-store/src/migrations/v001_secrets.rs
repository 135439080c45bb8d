//! v001 -- the `secrets` table.

use rusqlite::Connection;

const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS secrets (
    id                TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    encrypted_content TEXT NOT NULL,              -- serialized envelope JSON
    expires_at        INTEGER NOT NULL,           -- unix millis
    created_at        TEXT NOT NULL               -- RFC-3339
);

CREATE INDEX IF NOT EXISTS idx_secrets_expires_at ON secrets(expires_at);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
