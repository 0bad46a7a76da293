use crate::errors::AppResult;
use chrono::Utc;
use rusqlite::{Connection, params};

/// Append one row to the business audit trail.
pub fn audit(
    conn: &Connection,
    actor: &str,
    operation: &str,
    target: &str,
    message: &str,
) -> AppResult<()> {
    let now = crate::utils::time::to_db(&Utc::now());

    let mut stmt = conn.prepare_cached(
        "INSERT INTO audit_log (date, actor, operation, target, message)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;

    stmt.execute(params![now, actor, operation, target, message])?;

    Ok(())
}

#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub id: i64,
    pub date: String,
    pub actor: String,
    pub operation: String,
    pub target: String,
    pub message: String,
}

pub fn load_audit(conn: &Connection) -> AppResult<Vec<AuditEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, date, actor, operation, COALESCE(target, ''), message
         FROM audit_log ORDER BY id ASC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(AuditEntry {
            id: row.get(0)?,
            date: row.get(1)?,
            actor: row.get(2)?,
            operation: row.get(3)?,
            target: row.get(4)?,
            message: row.get(5)?,
        })
    })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
