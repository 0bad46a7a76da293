//! `staff_profiles` and `login_attempts` access.

use crate::db::queries::{opt_ts_col, ts_col};
use crate::errors::{AppError, AppResult};
use crate::models::staff::{StaffProfile, StaffRole};
use crate::utils::time::to_db;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Result, Row, params};

pub fn map_row(row: &Row) -> Result<StaffProfile> {
    let role_str: String = row.get("role")?;
    let role = StaffRole::from_db_str(&role_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            Type::Text,
            Box::new(AppError::Other(format!("Invalid staff role: {role_str}"))),
        )
    })?;

    Ok(StaffProfile {
        id: row.get("id")?,
        username: row.get("username")?,
        email: row.get("email")?,
        display_name: row.get("display_name")?,
        role,
        password_hash: row.get("password_hash")?,
        first_login: row.get::<_, i32>("first_login")? == 1,
        created_at: ts_col(row, "created_at")?,
    })
}

pub struct NewStaffRow<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub display_name: &'a str,
    pub role: StaffRole,
    pub hash: &'a str,
}

pub fn insert_staff(conn: &Connection, s: &NewStaffRow<'_>, now: DateTime<Utc>) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO staff_profiles (username, email, display_name, role,
                                     password_hash, first_login, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)",
        params![
            s.username,
            s.email,
            s.display_name,
            s.role.to_db_str(),
            s.hash,
            to_db(&now),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Lookup by username or e-mail, case-insensitive.
pub fn find_staff(conn: &Connection, identifier: &str) -> AppResult<Option<StaffProfile>> {
    Ok(conn
        .query_row(
            "SELECT * FROM staff_profiles
             WHERE lower(username) = lower(?1) OR lower(email) = lower(?1)",
            [identifier],
            map_row,
        )
        .optional()?)
}

pub fn username_taken(conn: &Connection, username: &str) -> AppResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT id FROM staff_profiles WHERE lower(username) = lower(?1)",
            [username],
            |r| r.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn count_staff(conn: &Connection) -> AppResult<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM staff_profiles", [], |r| r.get(0))?)
}

/// `hash` is a PHC string; the salt travels inside it.
pub fn update_password(conn: &Connection, id: i64, hash: &str) -> AppResult<()> {
    conn.execute(
        "UPDATE staff_profiles
         SET password_hash = ?1, first_login = 0
         WHERE id = ?2",
        params![hash, id],
    )?;
    Ok(())
}

/// Failure counter for one account (`staff:<id>`) or unknown identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoginAttempts {
    pub failures: i64,
    pub locked_until: Option<DateTime<Utc>>,
}

pub fn load_attempts(conn: &Connection, identifier: &str) -> AppResult<LoginAttempts> {
    let row = conn
        .query_row(
            "SELECT failures, locked_until FROM login_attempts WHERE identifier = ?1",
            [identifier],
            |r| {
                Ok(LoginAttempts {
                    failures: r.get("failures")?,
                    locked_until: opt_ts_col(r, "locked_until")?,
                })
            },
        )
        .optional()?;
    Ok(row.unwrap_or_default())
}

pub fn store_attempts(
    conn: &Connection,
    identifier: &str,
    attempts: &LoginAttempts,
    now: DateTime<Utc>,
) -> AppResult<()> {
    conn.execute(
        "INSERT INTO login_attempts (identifier, failures, locked_until, last_failure)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(identifier) DO UPDATE SET
             failures = excluded.failures,
             locked_until = excluded.locked_until,
             last_failure = excluded.last_failure",
        params![
            identifier,
            attempts.failures,
            attempts.locked_until.as_ref().map(to_db),
            to_db(&now),
        ],
    )?;
    Ok(())
}

pub fn clear_attempts(conn: &Connection, identifier: &str) -> AppResult<()> {
    conn.execute(
        "DELETE FROM login_attempts WHERE identifier = ?1",
        [identifier],
    )?;
    Ok(())
}
