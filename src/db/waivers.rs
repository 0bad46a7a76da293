//! `waiver_requests` table access.

use crate::db::queries::{opt_ts_col, ts_col};
use crate::errors::{AppError, AppResult};
use crate::models::waiver::{WaiverRequest, WaiverStatus};
use crate::utils::time::to_db;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Result, Row, params};

pub fn map_row(row: &Row) -> Result<WaiverRequest> {
    let status_str: String = row.get("status")?;
    let status = WaiverStatus::from_db_str(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            Type::Text,
            Box::new(AppError::Other(format!("Invalid waiver status: {status_str}"))),
        )
    })?;

    Ok(WaiverRequest {
        token: row.get("token")?,
        user_id: row.get("user_id")?,
        parent_email: row.get("parent_email")?,
        volunteer_name: row.get("volunteer_name")?,
        status,
        parent_signature: row.get("parent_signature")?,
        expires_at: ts_col(row, "expires_at")?,
        signed_at: opt_ts_col(row, "signed_at")?,
        created_at: ts_col(row, "created_at")?,
    })
}

pub fn insert_request(conn: &Connection, req: &WaiverRequest) -> AppResult<()> {
    conn.execute(
        "INSERT INTO waiver_requests (token, user_id, parent_email, volunteer_name, status,
                                      parent_signature, expires_at, signed_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6, NULL, ?7)",
        params![
            req.token,
            req.user_id,
            req.parent_email,
            req.volunteer_name,
            req.status.to_db_str(),
            to_db(&req.expires_at),
            to_db(&req.created_at),
        ],
    )?;
    Ok(())
}

pub fn find_request(conn: &Connection, token: &str) -> AppResult<Option<WaiverRequest>> {
    Ok(conn
        .query_row(
            "SELECT * FROM waiver_requests WHERE token = ?1",
            [token],
            map_row,
        )
        .optional()?)
}

pub fn load_pending_for_user(conn: &Connection, user_id: i64) -> AppResult<Vec<WaiverRequest>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM waiver_requests
         WHERE user_id = ?1 AND status = 'pending'
         ORDER BY created_at DESC",
    )?;
    let rows = stmt.query_map([user_id], map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Transition pending → signed. The status guard makes the transition
/// happen at most once; returns false if the token was already consumed.
pub fn mark_signed(
    conn: &Connection,
    token: &str,
    signature: &str,
    at: DateTime<Utc>,
) -> AppResult<bool> {
    let n = conn.execute(
        "UPDATE waiver_requests
         SET status = 'signed', parent_signature = ?1, signed_at = ?2
         WHERE token = ?3 AND status = 'pending'",
        params![signature, to_db(&at), token],
    )?;
    Ok(n == 1)
}
