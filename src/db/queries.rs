//! `users` table access: filtered selects, insert, update and delete.

use crate::errors::{AppError, AppResult};
use crate::models::user::{NewUser, User, UserPatch};
use crate::utils::time::to_db;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Result, Row, params};

const USER_COLUMNS: &str = "id, name, email, phone, city, organization, profession, date_of_birth,
     is_minor, parent_guardian_name, parent_email, allow_communication, waiver_signed,
     waiver_signed_at, total_hours, total_bags, is_checked_in, last_check_in, created_at";

fn conversion_error(idx: usize, err: AppError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

/// Read a mandatory RFC 3339 column.
pub(crate) fn ts_col(row: &Row, name: &str) -> Result<DateTime<Utc>> {
    let raw: String = row.get(name)?;
    crate::utils::time::from_db(&raw).map_err(|e| conversion_error(0, e))
}

/// Read a nullable RFC 3339 column.
pub(crate) fn opt_ts_col(row: &Row, name: &str) -> Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(name)?;
    raw.map(|s| crate::utils::time::from_db(&s).map_err(|e| conversion_error(0, e)))
        .transpose()
}

pub fn map_row(row: &Row) -> Result<User> {
    let dob: Option<String> = row.get("date_of_birth")?;
    let date_of_birth = match dob {
        Some(s) if !s.is_empty() => Some(
            NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .map_err(|_| conversion_error(0, AppError::InvalidDate(s.clone())))?,
        ),
        _ => None,
    };

    Ok(User {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        city: row.get("city")?,
        organization: row.get("organization")?,
        profession: row.get("profession")?,
        date_of_birth,
        is_minor: row.get::<_, i32>("is_minor")? == 1,
        parent_guardian_name: row.get("parent_guardian_name")?,
        parent_email: row.get("parent_email")?,
        allow_communication: row.get::<_, i32>("allow_communication")? == 1,
        waiver_signed: row.get::<_, i32>("waiver_signed")? == 1,
        waiver_signed_at: opt_ts_col(row, "waiver_signed_at")?,
        total_hours: row.get("total_hours")?,
        total_bags: row.get("total_bags")?,
        is_checked_in: row.get::<_, i32>("is_checked_in")? == 1,
        last_check_in: opt_ts_col(row, "last_check_in")?,
        created_at: ts_col(row, "created_at")?,
    })
}

fn collect(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> AppResult<Vec<User>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Values computed by the registration logic that are not part of the
/// raw payload.
pub struct WaiverFields<'a> {
    pub is_minor: bool,
    pub guardian_name: Option<&'a str>,
    pub waiver_signed_at: Option<DateTime<Utc>>,
}

pub fn insert_user(
    conn: &Connection,
    u: &NewUser,
    waiver: &WaiverFields<'_>,
    now: DateTime<Utc>,
) -> AppResult<User> {
    conn.execute(
        "INSERT INTO users (name, email, phone, city, organization, profession, date_of_birth,
                            is_minor, parent_guardian_name, parent_email, allow_communication,
                            waiver_signed, waiver_signed_at, total_hours, total_bags,
                            is_checked_in, last_check_in, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, 0, 0, 0, NULL, ?14)",
        params![
            u.name.trim(),
            u.email.trim(),
            u.phone.trim(),
            u.city.trim(),
            u.organization.trim(),
            u.profession.trim(),
            u.date_of_birth.map(|d| d.format("%Y-%m-%d").to_string()),
            waiver.is_minor as i32,
            waiver.guardian_name,
            u.parent_email.as_deref(),
            u.allow_communication as i32,
            waiver.waiver_signed_at.is_some() as i32,
            waiver.waiver_signed_at.as_ref().map(to_db),
            to_db(&now),
        ],
    )?;

    let id = conn.last_insert_rowid();
    get_user(conn, id)
}

pub fn find_user(conn: &Connection, id: i64) -> AppResult<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    Ok(conn.query_row(&sql, [id], map_row).optional()?)
}

pub fn get_user(conn: &Connection, id: i64) -> AppResult<User> {
    find_user(conn, id)?.ok_or(AppError::UserNotFound(id))
}

/// All users, newest registration first.
pub fn load_all_users(conn: &Connection) -> AppResult<Vec<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC");
    collect(conn, &sql, [])
}

/// Case-insensitive substring match across name, email, phone and organization.
/// `%` and `_` in `term` match literally.
pub fn search_users(conn: &Connection, term: &str) -> AppResult<Vec<User>> {
    let pattern = format!("%{}%", escape_like(&term.trim().to_lowercase()));
    let sql = format!(
        "SELECT {USER_COLUMNS} FROM users
         WHERE lower(name) LIKE ?1 ESCAPE '\\' OR lower(email) LIKE ?1 ESCAPE '\\'
            OR phone LIKE ?1 ESCAPE '\\' OR lower(organization) LIKE ?1 ESCAPE '\\'
         ORDER BY name ASC"
    );
    collect(conn, &sql, [pattern])
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub fn load_checked_in(conn: &Connection) -> AppResult<Vec<User>> {
    let sql = format!(
        "SELECT {USER_COLUMNS} FROM users WHERE is_checked_in = 1 ORDER BY last_check_in ASC"
    );
    collect(conn, &sql, [])
}

pub fn load_communication_list(conn: &Connection) -> AppResult<Vec<User>> {
    let sql =
        format!("SELECT {USER_COLUMNS} FROM users WHERE allow_communication = 1 ORDER BY name");
    collect(conn, &sql, [])
}

/// Conditional check-in: only flips a user that is currently checked out.
/// Returns false when no row changed (already checked in, or unknown id).
pub fn mark_checked_in(conn: &Connection, id: i64, at: DateTime<Utc>) -> AppResult<bool> {
    let n = conn.execute(
        "UPDATE users SET is_checked_in = 1, last_check_in = ?1
         WHERE id = ?2 AND is_checked_in = 0",
        params![to_db(&at), id],
    )?;
    Ok(n == 1)
}

/// Conditional check-out: only clears a user still checked in since `since`.
pub fn mark_checked_out(conn: &Connection, id: i64, since: DateTime<Utc>) -> AppResult<bool> {
    let n = conn.execute(
        "UPDATE users SET is_checked_in = 0, last_check_in = NULL
         WHERE id = ?1 AND is_checked_in = 1 AND last_check_in = ?2",
        params![id, to_db(&since)],
    )?;
    Ok(n == 1)
}

/// Move the start of the active (unpersisted) session.
pub fn set_last_check_in(conn: &Connection, id: i64, at: DateTime<Utc>) -> AppResult<bool> {
    let n = conn.execute(
        "UPDATE users SET last_check_in = ?1 WHERE id = ?2 AND is_checked_in = 1",
        params![to_db(&at), id],
    )?;
    Ok(n == 1)
}

pub fn set_total_hours(conn: &Connection, id: i64, total: f64) -> AppResult<()> {
    conn.execute(
        "UPDATE users SET total_hours = ?1 WHERE id = ?2",
        params![total, id],
    )?;
    Ok(())
}

pub fn set_total_bags(conn: &Connection, id: i64, total: i64) -> AppResult<()> {
    conn.execute(
        "UPDATE users SET total_bags = ?1 WHERE id = ?2",
        params![total, id],
    )?;
    Ok(())
}

pub fn mark_waiver_signed(
    conn: &Connection,
    id: i64,
    guardian_name: Option<&str>,
    at: DateTime<Utc>,
) -> AppResult<()> {
    conn.execute(
        "UPDATE users
         SET waiver_signed = 1, waiver_signed_at = ?1,
             parent_guardian_name = COALESCE(?2, parent_guardian_name)
         WHERE id = ?3",
        params![to_db(&at), guardian_name, id],
    )?;
    Ok(())
}

pub fn update_user(conn: &Connection, id: i64, patch: &UserPatch, is_minor: bool) -> AppResult<User> {
    let current = get_user(conn, id)?;

    let name = patch.name.as_deref().unwrap_or(&current.name).trim().to_string();
    let email = patch.email.as_deref().unwrap_or(&current.email).trim().to_string();
    let phone = patch.phone.as_deref().unwrap_or(&current.phone).trim().to_string();
    let city = patch.city.as_deref().unwrap_or(&current.city).trim().to_string();
    let organization = patch
        .organization
        .as_deref()
        .unwrap_or(&current.organization)
        .trim()
        .to_string();
    let profession = patch
        .profession
        .as_deref()
        .unwrap_or(&current.profession)
        .trim()
        .to_string();
    let dob = patch.date_of_birth.or(current.date_of_birth);
    let allow = patch
        .allow_communication
        .unwrap_or(current.allow_communication);

    conn.execute(
        "UPDATE users
         SET name = ?1, email = ?2, phone = ?3, city = ?4, organization = ?5,
             profession = ?6, date_of_birth = ?7, allow_communication = ?8, is_minor = ?9
         WHERE id = ?10",
        params![
            name,
            email,
            phone,
            city,
            organization,
            profession,
            dob.map(|d| d.format("%Y-%m-%d").to_string()),
            allow as i32,
            is_minor as i32,
            id,
        ],
    )?;

    get_user(conn, id)
}

/// Delete the user row; sessions, donations and waiver requests cascade.
pub fn delete_user(conn: &Connection, id: i64) -> AppResult<bool> {
    let n = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
    Ok(n == 1)
}

pub fn count_users(conn: &Connection) -> AppResult<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?)
}
