use crate::ui::messages::success;
use rusqlite::{Connection, OptionalExtension, Result};
use tracing::{debug, info};

/// Ensure that the `audit_log` table exists. It doubles as the migration
/// ledger, so it has to be created before anything else.
fn ensure_audit_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS audit_log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            actor     TEXT NOT NULL DEFAULT 'system',
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

/// A single, append-only schema step.
struct Migration {
    version: &'static str,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "20250601_0001_core_tables",
        description: "Created users, volunteer_sessions, donations, waiver_requests, system_settings",
        sql: r#"
        CREATE TABLE IF NOT EXISTS users (
            id                   INTEGER PRIMARY KEY AUTOINCREMENT,
            name                 TEXT NOT NULL,
            email                TEXT NOT NULL,
            phone                TEXT NOT NULL,
            city                 TEXT NOT NULL DEFAULT '',
            organization         TEXT NOT NULL DEFAULT '',
            profession           TEXT NOT NULL DEFAULT '',
            date_of_birth        TEXT,
            is_minor             INTEGER NOT NULL DEFAULT 0,
            parent_guardian_name TEXT,
            parent_email         TEXT,
            allow_communication  INTEGER NOT NULL DEFAULT 0,
            waiver_signed        INTEGER NOT NULL DEFAULT 0,
            waiver_signed_at     TEXT,
            total_hours          REAL NOT NULL DEFAULT 0,
            total_bags           INTEGER NOT NULL DEFAULT 0,
            is_checked_in        INTEGER NOT NULL DEFAULT 0,
            last_check_in        TEXT,
            created_at           TEXT NOT NULL,
            CHECK ((is_checked_in = 1) = (last_check_in IS NOT NULL))
        );

        CREATE TABLE IF NOT EXISTS volunteer_sessions (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id        INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            check_in_time  TEXT NOT NULL,
            check_out_time TEXT NOT NULL,
            hours_worked   REAL NOT NULL,
            notes          TEXT
        );

        CREATE TABLE IF NOT EXISTS donations (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id   INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            bag_count INTEGER NOT NULL CHECK (bag_count > 0),
            timestamp TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS waiver_requests (
            token            TEXT PRIMARY KEY,
            user_id          INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            parent_email     TEXT NOT NULL,
            volunteer_name   TEXT NOT NULL,
            status           TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending','signed')),
            parent_signature TEXT,
            expires_at       TEXT NOT NULL,
            signed_at        TEXT,
            created_at       TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS system_settings (
            key        TEXT PRIMARY KEY,
            value      TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    },
    Migration {
        version: "20250601_0002_staff_tables",
        description: "Created staff_profiles and login_attempts",
        sql: r#"
        CREATE TABLE IF NOT EXISTS staff_profiles (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            username      TEXT NOT NULL UNIQUE,
            email         TEXT NOT NULL UNIQUE,
            display_name  TEXT NOT NULL,
            role          TEXT NOT NULL DEFAULT 'staff' CHECK (role IN ('admin','manager','staff')),
            password_hash TEXT NOT NULL,
            first_login   INTEGER NOT NULL DEFAULT 1,
            created_at    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS login_attempts (
            identifier   TEXT PRIMARY KEY,
            failures     INTEGER NOT NULL DEFAULT 0,
            locked_until TEXT,
            last_failure TEXT
        );
        "#,
    },
    Migration {
        version: "20250715_0003_email_outbox",
        description: "Created email_outbox",
        sql: r#"
        CREATE TABLE IF NOT EXISTS email_outbox (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            recipient  TEXT NOT NULL,
            sender     TEXT NOT NULL,
            kind       TEXT NOT NULL,
            subject    TEXT NOT NULL,
            body       TEXT NOT NULL,
            created_at TEXT NOT NULL,
            sent_at    TEXT
        );
        "#,
    },
    Migration {
        version: "20250902_0004_range_indexes",
        description: "Added timestamp indexes for range analytics",
        sql: r#"
        CREATE INDEX IF NOT EXISTS idx_sessions_user ON volunteer_sessions(user_id);
        CREATE INDEX IF NOT EXISTS idx_sessions_check_in ON volunteer_sessions(check_in_time);
        CREATE INDEX IF NOT EXISTS idx_donations_user ON donations(user_id);
        CREATE INDEX IF NOT EXISTS idx_donations_timestamp ON donations(timestamp);
        CREATE INDEX IF NOT EXISTS idx_users_checked_in ON users(is_checked_in);
        "#,
    },
];

fn is_applied(conn: &Connection, version: &str) -> Result<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM audit_log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

fn apply(conn: &Connection, m: &Migration) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(m.sql)?;
    tx.execute(
        "INSERT INTO audit_log (date, actor, operation, target, message)
         VALUES (?1, 'system', 'migration_applied', ?2, ?3)",
        rusqlite::params![chrono::Utc::now().to_rfc3339(), m.version, m.description],
    )?;
    tx.commit()
}

/// Number of migrations not yet recorded in the ledger.
pub fn pending_count(conn: &Connection) -> Result<usize> {
    ensure_audit_table(conn)?;
    let mut n = 0;
    for m in MIGRATIONS {
        if !is_applied(conn, m.version)? {
            n += 1;
        }
    }
    Ok(n)
}

/// Public entry point: run all pending migrations.
///
/// Invoked by db::init_db(). Safe to call on every start-up.
pub fn run_pending_migrations(conn: &Connection) -> Result<()> {
    ensure_audit_table(conn)?;

    for m in MIGRATIONS {
        if is_applied(conn, m.version)? {
            debug!(version = m.version, "migration already applied");
            continue;
        }

        apply(conn, m)?;
        info!(version = m.version, "migration applied");
        success(format!("Migration applied: {} → {}", m.version, m.description));
    }

    Ok(())
}
