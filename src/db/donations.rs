//! `donations` table access. Rows are insert-only.

use crate::db::queries::ts_col;
use crate::errors::AppResult;
use crate::models::donation::Donation;
use crate::utils::time::to_db;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Result, Row, params};

pub fn map_row(row: &Row) -> Result<Donation> {
    Ok(Donation {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        bag_count: row.get("bag_count")?,
        timestamp: ts_col(row, "timestamp")?,
    })
}

pub fn insert_donation(
    conn: &Connection,
    user_id: i64,
    bag_count: i64,
    at: DateTime<Utc>,
) -> AppResult<Donation> {
    conn.execute(
        "INSERT INTO donations (user_id, bag_count, timestamp) VALUES (?1, ?2, ?3)",
        params![user_id, bag_count, to_db(&at)],
    )?;
    Ok(Donation {
        id: conn.last_insert_rowid(),
        user_id,
        bag_count,
        timestamp: at,
    })
}

/// Donations whose timestamp falls within `[start, end]`.
pub fn load_donations_in_range(
    conn: &Connection,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> AppResult<Vec<Donation>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, bag_count, timestamp FROM donations
         WHERE timestamp >= ?1 AND timestamp <= ?2
         ORDER BY timestamp ASC",
    )?;
    let rows = stmt.query_map(params![to_db(&start), to_db(&end)], map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn sum_user_bags(conn: &Connection, user_id: i64) -> AppResult<i64> {
    Ok(conn.query_row(
        "SELECT COALESCE(SUM(bag_count), 0) FROM donations WHERE user_id = ?1",
        [user_id],
        |r| r.get(0),
    )?)
}

pub fn count_donations(conn: &Connection) -> AppResult<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM donations", [], |r| r.get(0))?)
}
