//! `system_settings` key/value access (JSON documents).

use crate::errors::AppResult;
use crate::utils::time::to_db;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

pub fn load_setting(conn: &Connection, key: &str) -> AppResult<Option<String>> {
    Ok(conn
        .query_row(
            "SELECT value FROM system_settings WHERE key = ?1",
            [key],
            |r| r.get(0),
        )
        .optional()?)
}

/// Insert or replace the value stored under `key`.
pub fn upsert_setting(
    conn: &Connection,
    key: &str,
    value: &str,
    now: DateTime<Utc>,
) -> AppResult<()> {
    conn.execute(
        "INSERT INTO system_settings (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value, to_db(&now)],
    )?;
    Ok(())
}
