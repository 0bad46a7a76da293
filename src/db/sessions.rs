//! `volunteer_sessions` table access.

use crate::db::queries::ts_col;
use crate::errors::{AppError, AppResult};
use crate::models::session::ClosedSession;
use crate::utils::time::to_db;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Result, Row, params};

const SESSION_COLUMNS: &str = "id, user_id, check_in_time, check_out_time, hours_worked, notes";

pub fn map_row(row: &Row) -> Result<ClosedSession> {
    Ok(ClosedSession {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        check_in_time: ts_col(row, "check_in_time")?,
        check_out_time: ts_col(row, "check_out_time")?,
        hours_worked: row.get("hours_worked")?,
        notes: row.get("notes")?,
    })
}

pub fn insert_session(
    conn: &Connection,
    user_id: i64,
    check_in: DateTime<Utc>,
    check_out: DateTime<Utc>,
    hours: f64,
    notes: Option<&str>,
) -> AppResult<ClosedSession> {
    conn.execute(
        "INSERT INTO volunteer_sessions (user_id, check_in_time, check_out_time, hours_worked, notes)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![user_id, to_db(&check_in), to_db(&check_out), hours, notes],
    )?;
    get_session(conn, conn.last_insert_rowid())
}

pub fn find_session(conn: &Connection, id: i64) -> AppResult<Option<ClosedSession>> {
    let sql = format!("SELECT {SESSION_COLUMNS} FROM volunteer_sessions WHERE id = ?1");
    Ok(conn.query_row(&sql, [id], map_row).optional()?)
}

pub fn get_session(conn: &Connection, id: i64) -> AppResult<ClosedSession> {
    find_session(conn, id)?.ok_or(AppError::SessionNotFound(id))
}

pub fn update_session_times(
    conn: &Connection,
    id: i64,
    check_in: DateTime<Utc>,
    check_out: DateTime<Utc>,
    hours: f64,
) -> AppResult<()> {
    let n = conn.execute(
        "UPDATE volunteer_sessions
         SET check_in_time = ?1, check_out_time = ?2, hours_worked = ?3
         WHERE id = ?4",
        params![to_db(&check_in), to_db(&check_out), hours, id],
    )?;
    if n == 0 {
        return Err(AppError::SessionNotFound(id));
    }
    Ok(())
}

pub fn delete_session(conn: &Connection, id: i64) -> AppResult<bool> {
    let n = conn.execute("DELETE FROM volunteer_sessions WHERE id = ?1", [id])?;
    Ok(n == 1)
}

/// A user's closed sessions, newest first.
pub fn load_user_sessions(conn: &Connection, user_id: i64) -> AppResult<Vec<ClosedSession>> {
    let sql = format!(
        "SELECT {SESSION_COLUMNS} FROM volunteer_sessions
         WHERE user_id = ?1 ORDER BY check_in_time DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([user_id], map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Sessions whose check-in falls within `[start, end]`, optionally for one user.
pub fn load_sessions_in_range(
    conn: &Connection,
    user_id: Option<i64>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> AppResult<Vec<ClosedSession>> {
    let sql = format!(
        "SELECT {SESSION_COLUMNS} FROM volunteer_sessions
         WHERE check_in_time >= ?1 AND check_in_time <= ?2
           AND (?3 IS NULL OR user_id = ?3)
         ORDER BY check_in_time DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![to_db(&start), to_db(&end), user_id], map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Fresh sum of `hours_worked` over every session row of the user.
pub fn sum_user_hours(conn: &Connection, user_id: i64) -> AppResult<f64> {
    Ok(conn.query_row(
        "SELECT COALESCE(SUM(hours_worked), 0) FROM volunteer_sessions WHERE user_id = ?1",
        [user_id],
        |r| r.get(0),
    )?)
}

pub fn count_sessions(conn: &Connection) -> AppResult<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM volunteer_sessions", [], |r| r.get(0))?)
}
