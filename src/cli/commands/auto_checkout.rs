use crate::cli::parser::{AutoCheckoutAction, Cli, Commands};
use crate::config::Config;
use crate::core::auto_checkout::{AutoCheckoutLogic, AutoCheckoutReport};
use crate::errors::{AppError, AppResult};
use crate::models::settings::{AutoCheckoutSettings, WEEK, day_key, parse_day};
use crate::models::staff::StaffContext;
use crate::ui::messages::{error, field, header, info, success};
use crate::utils::colors::{GREEN, GREY, RESET};
use crate::utils::table::Table;
use chrono::Utc;

pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    let Commands::AutoCheckout { action } = &cli.command else {
        return Ok(());
    };
    let pool = super::open_pool(cfg)?;

    match action {
        AutoCheckoutAction::Run { force } => {
            if *force {
                // ignoring the schedule is a staff decision
                let ctx = super::staff_context(cli, cfg, &pool)?;
                let report = AutoCheckoutLogic::run_auto_checkout(
                    &pool,
                    &cfg.auto_checkout_reason,
                    Utc::now(),
                    &ctx,
                )?;
                print_report(&report);
            } else {
                let ctx = match cli.staff {
                    Some(_) => super::staff_context(cli, cfg, &pool)?,
                    None => StaffContext::System,
                };
                let (decision, report) = AutoCheckoutLogic::run_if_due(
                    &pool,
                    &cfg.auto_checkout_reason,
                    &Utc::now(),
                    &ctx,
                )?;
                match report {
                    Some(r) => print_report(&r),
                    None => info(format!("Nothing to do: {decision}")),
                }
            }
        }

        AutoCheckoutAction::Show => {
            print_settings(&AutoCheckoutLogic::load_settings(&pool)?);
        }

        AutoCheckoutAction::Enable | AutoCheckoutAction::Disable => {
            let ctx = super::staff_context(cli, cfg, &pool)?;
            let enabled = matches!(action, AutoCheckoutAction::Enable);
            AutoCheckoutLogic::set_enabled(&pool, enabled, &ctx)?;
            success(format!(
                "Auto-checkout {}",
                if enabled { "enabled" } else { "disabled" }
            ));
        }

        AutoCheckoutAction::SetDay {
            day,
            start,
            end,
            off,
        } => {
            let ctx = super::staff_context(cli, cfg, &pool)?;
            let weekday = parse_day(day).ok_or_else(|| AppError::InvalidDay(day.clone()))?;
            let settings = AutoCheckoutLogic::set_day(&pool, weekday, !*off, start, end, &ctx)?;
            success(format!("Schedule for {} updated", day_key(weekday)));
            print_settings(&settings);
        }

        AutoCheckoutAction::SetTimezone { timezone } => {
            let ctx = super::staff_context(cli, cfg, &pool)?;
            let settings = AutoCheckoutLogic::set_timezone(&pool, timezone, &ctx)?;
            success(format!("Office hours are now read in {}", settings.timezone));
        }
    }

    Ok(())
}

fn print_report(report: &AutoCheckoutReport) {
    if report.count() == 0 && report.failures.is_empty() {
        info("No volunteers were checked in.");
        return;
    }
    for u in &report.checked_out {
        success(format!("Checked out {} (id {})", u.name, u.id));
    }
    for (id, reason) in &report.failures {
        error(format!("User {id}: {reason}"));
    }
    info(format!(
        "Auto-checked out {} volunteer(s), {} failure(s)",
        report.count(),
        report.failures.len()
    ));
}

fn print_settings(s: &AutoCheckoutSettings) {
    header("Auto-checkout");
    field(
        "Enabled",
        if s.enabled {
            format!("{GREEN}yes{RESET}")
        } else {
            format!("{GREY}no{RESET}")
        },
    );
    field("Timezone", &s.timezone);

    let mut table = Table::new(["Day", "Enabled", "Start", "End"]);
    for d in WEEK {
        let key = day_key(d);
        match s.day(d) {
            Some(day) => table.add_row(vec![
                key.to_string(),
                if day.enabled { "yes" } else { "no" }.to_string(),
                day.start_time.clone(),
                day.end_time.clone(),
            ]),
            None => table.add_row(vec![key.to_string(), "no".into(), "-".into(), "-".into()]),
        }
    }
    print!("{}", table.render());
}
