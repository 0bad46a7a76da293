//! `checkin` and `checkout`: the front-desk pair.

use crate::cli::parser::{Cli, Commands};
use crate::config::Config;
use crate::core::sessions::SessionLogic;
use crate::errors::AppResult;
use crate::models::session::Session;
use crate::ui::messages::success;
use crate::utils::formatting::format_hours;
use crate::utils::time::display_local;
use chrono::Utc;

pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    let pool = super::open_pool(cfg)?;
    let ctx = super::desk_context(cli, cfg, &pool)?;
    let now = Utc::now();

    match &cli.command {
        Commands::Checkin { user_id } => {
            let user = SessionLogic::check_in(&pool, *user_id, now, &ctx)?;
            success(format!(
                "{} checked in at {}",
                user.name,
                display_local(&now)
            ));
        }
        Commands::Checkout { user_id } => {
            let user = SessionLogic::check_out(&pool, *user_id, now, &ctx)?;
            let worked = match SessionLogic::user_sessions(&pool, *user_id)?.first() {
                Some(Session::Closed(s)) => s.hours_worked,
                _ => 0.0,
            };
            success(format!(
                "{} checked out: {} this session, {} in total",
                user.name,
                format_hours(worked),
                format_hours(user.total_hours)
            ));
        }
        _ => {}
    }

    Ok(())
}
