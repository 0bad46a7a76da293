//! One handler per top-level command. Handlers parse arguments, call the
//! core layer and print; they never touch SQL directly.

pub mod active;
pub mod auto_checkout;
pub mod checkin;
pub mod config;
pub mod db;
pub mod donate;
pub mod export;
pub mod init;
pub mod log;
pub mod outbox;
pub mod session;
pub mod staff;
pub mod stats;
pub mod user;
pub mod waiver;

use crate::cli::parser::Cli;
use crate::config::Config;
use crate::core::auth::AuthLogic;
use crate::core::calculator::range::DateWindow;
use crate::db::initialize::open_db;
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::models::staff::StaffContext;
use crate::utils::date::parse_date;
use chrono::Utc;
use std::io::{self, IsTerminal, Write};

pub(crate) const PASSWORD_ENV: &str = "VOLUNTEERHUB_PASSWORD";

/// Open the configured database, applying pending migrations.
pub(crate) fn open_pool(cfg: &Config) -> AppResult<DbPool> {
    open_db(&cfg.database)
}

/// Read a secret from `env_var`, or prompt for it on an interactive terminal.
pub(crate) fn read_secret(env_var: &str, prompt: &str) -> AppResult<String> {
    if let Ok(v) = std::env::var(env_var) {
        return Ok(v);
    }
    if !io::stdin().is_terminal() {
        return Err(AppError::NotAuthorized(format!(
            "no password given (set {env_var})"
        )));
    }
    print!("{prompt}");
    io::stdout().flush().ok();
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Authenticate `--staff` and return the acting context. Every staff-only
/// command goes through here, so the lockout policy applies uniformly.
pub(crate) fn staff_context(cli: &Cli, cfg: &Config, pool: &DbPool) -> AppResult<StaffContext> {
    let Some(user) = cli.staff.as_deref() else {
        return Err(AppError::NotAuthorized(
            "this command requires --staff <USER>".into(),
        ));
    };
    let secret = read_secret(PASSWORD_ENV, "Password: ")?;
    let identity =
        AuthLogic::authenticate(pool, &cfg.lockout_policy(), user, &secret, Utc::now())?;
    Ok(StaffContext::Staff(identity))
}

/// Staff when `--staff` is given, the kiosk otherwise.
pub(crate) fn desk_context(cli: &Cli, cfg: &Config, pool: &DbPool) -> AppResult<StaffContext> {
    if cli.staff.is_some() {
        staff_context(cli, cfg, pool)
    } else {
        Ok(StaffContext::Kiosk)
    }
}

/// `--range` or `--from/--to`; all time when neither is given.
pub(crate) fn window_from_args(
    range: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
) -> AppResult<DateWindow> {
    match (range, from, to) {
        (Some(r), _, _) => DateWindow::parse(r),
        (None, Some(f), Some(t)) => {
            let from = parse_date(f).ok_or_else(|| AppError::InvalidDate(f.to_string()))?;
            let to = parse_date(t).ok_or_else(|| AppError::InvalidDate(t.to_string()))?;
            DateWindow::custom(from, to)
        }
        _ => Ok(DateWindow::AllTime),
    }
}
