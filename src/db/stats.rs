//! `db --info` and `db --check` reports.

use crate::db::pool::DbPool;
use crate::db::{donations, queries, sessions, staff};
use crate::errors::AppResult;
use crate::ui::messages::{field, header};
use crate::utils::colors::{GREY, RESET};
use rusqlite::OptionalExtension;
use std::fs;

pub fn print_db_info(pool: &DbPool, db_path: &str) -> AppResult<()> {
    let file_size = fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);
    let file_mb = (file_size as f64) / (1024.0 * 1024.0);

    header("Database");
    field("File", db_path);
    field("Size", format!("{:.2} MB", file_mb));
    field("Users", queries::count_users(&pool.conn)?);
    field("Sessions", sessions::count_sessions(&pool.conn)?);
    field("Donations", donations::count_donations(&pool.conn)?);
    field("Staff accounts", staff::count_staff(&pool.conn)?);

    let bound = |order: &str| -> AppResult<Option<String>> {
        let sql = format!(
            "SELECT check_in_time FROM volunteer_sessions ORDER BY check_in_time {order} LIMIT 1"
        );
        Ok(pool.conn.query_row(&sql, [], |row| row.get(0)).optional()?)
    };
    let fmt = |v: Option<String>| v.unwrap_or_else(|| format!("{GREY}--{RESET}"));

    field("First session", fmt(bound("ASC")?));
    field("Last session", fmt(bound("DESC")?));
    println!();
    Ok(())
}

/// SQLite's own integrity check plus cached totals that drifted from the
/// session and donation rows. Empty means healthy.
pub fn integrity_problems(pool: &DbPool) -> AppResult<Vec<String>> {
    let mut problems = Vec::new();

    let integrity: String = pool
        .conn
        .query_row("PRAGMA integrity_check;", [], |row| row.get(0))?;
    if integrity != "ok" {
        problems.push(format!("SQLite integrity check failed: {integrity}"));
    }

    let mut stmt = pool.conn.prepare(
        "SELECT u.id, u.total_hours,
                COALESCE((SELECT SUM(hours_worked) FROM volunteer_sessions s WHERE s.user_id = u.id), 0),
                u.total_bags,
                COALESCE((SELECT SUM(bag_count) FROM donations d WHERE d.user_id = u.id), 0)
         FROM users u ORDER BY u.id",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, f64>(1)?,
            r.get::<_, f64>(2)?,
            r.get::<_, i64>(3)?,
            r.get::<_, i64>(4)?,
        ))
    })?;
    for row in rows {
        let (id, hours, hours_rows, bags, bags_rows) = row?;
        if (hours - hours_rows).abs() > 1e-9 {
            problems.push(format!(
                "User {id}: total_hours {hours} but sessions sum to {hours_rows}"
            ));
        }
        if bags != bags_rows {
            problems.push(format!(
                "User {id}: total_bags {bags} but donations sum to {bags_rows}"
            ));
        }
    }

    Ok(problems)
}
