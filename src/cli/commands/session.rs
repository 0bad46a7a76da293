use crate::cli::parser::{Cli, Commands, SessionAction};
use crate::config::Config;
use crate::core::registry::RegistryLogic;
use crate::core::sessions::SessionLogic;
use crate::errors::AppResult;
use crate::ui::messages::{field, header, info, success};
use crate::utils::formatting::format_hours;
use crate::utils::time::{display_local, parse_local_timestamp};
use chrono::Local;

pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    let Commands::Session { action } = &cli.command else {
        return Ok(());
    };
    let pool = super::open_pool(cfg)?;

    match action {
        SessionAction::List { user_id } => {
            let user = RegistryLogic::get_user(&pool, *user_id)?;
            let sessions = SessionLogic::user_sessions(&pool, *user_id)?;
            let today = Local::now();
            let today_hours =
                SessionLogic::hours_for_date(&pool, *user_id, today.date_naive(), &Local)?;

            header(format!("Sessions of {}", user.name));
            field("Total hours", format_hours(user.total_hours));
            field("Today", format_hours(today_hours));
            if sessions.is_empty() {
                info("No sessions yet.");
            } else {
                super::user::print_sessions(&sessions);
            }
        }

        SessionAction::Edit {
            session_id,
            check_in,
            check_out,
        } => {
            let ctx = super::staff_context(cli, cfg, &pool)?;
            let s = SessionLogic::edit_session(
                &pool,
                *session_id,
                parse_local_timestamp(check_in)?,
                parse_local_timestamp(check_out)?,
                &ctx,
            )?;
            success(format!(
                "Session {} now {} → {} ({})",
                s.id,
                display_local(&s.check_in_time),
                display_local(&s.check_out_time),
                format_hours(s.hours_worked)
            ));
        }

        SessionAction::Delete { session_id } => {
            let ctx = super::staff_context(cli, cfg, &pool)?;
            let user = SessionLogic::delete_session(&pool, *session_id, &ctx)?;
            success(format!(
                "Session {} deleted; {} now has {}",
                session_id,
                user.name,
                format_hours(user.total_hours)
            ));
        }

        SessionAction::EditActive { user_id, check_in } => {
            let ctx = super::staff_context(cli, cfg, &pool)?;
            let ts = parse_local_timestamp(check_in)?;
            let user = SessionLogic::edit_active_session(&pool, *user_id, ts, &ctx)?;
            success(format!(
                "{} is now checked in since {}",
                user.name,
                display_local(&ts)
            ));
        }
    }

    Ok(())
}
