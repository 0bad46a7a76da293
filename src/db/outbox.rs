//! `email_outbox` access: queued transactional e-mails awaiting relay.

use crate::db::queries::ts_col;
use crate::errors::AppResult;
use crate::utils::time::to_db;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};

#[derive(Debug, Clone, PartialEq)]
pub struct OutboxMessage {
    pub id: i64,
    pub recipient: String,
    pub sender: String,
    pub kind: String,
    pub subject: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

pub fn enqueue(
    conn: &Connection,
    recipient: &str,
    sender: &str,
    kind: &str,
    subject: &str,
    body: &str,
    now: DateTime<Utc>,
) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO email_outbox (recipient, sender, kind, subject, body, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![recipient, sender, kind, subject, body, to_db(&now)],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Messages not yet handed to a relay, oldest first.
pub fn load_unsent(conn: &Connection) -> AppResult<Vec<OutboxMessage>> {
    let mut stmt = conn.prepare(
        "SELECT id, recipient, sender, kind, subject, body, created_at
         FROM email_outbox WHERE sent_at IS NULL ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok(OutboxMessage {
            id: r.get("id")?,
            recipient: r.get("recipient")?,
            sender: r.get("sender")?,
            kind: r.get("kind")?,
            subject: r.get("subject")?,
            body: r.get("body")?,
            created_at: ts_col(r, "created_at")?,
        })
    })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
