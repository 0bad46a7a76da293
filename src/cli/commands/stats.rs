use crate::cli::parser::{Cli, Commands};
use crate::config::Config;
use crate::core::analytics::{AnalyticsLogic, Dashboard};
use crate::errors::AppResult;
use crate::ui::messages::{field, header, info};
use crate::utils::formatting::format_hours;
use crate::utils::table::Table;
use chrono::Local;

pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    if let Commands::Stats {
        range,
        from,
        to,
        json,
    } = &cli.command
    {
        let pool = super::open_pool(cfg)?;
        super::staff_context(cli, cfg, &pool)?;

        let window = super::window_from_args(range.as_deref(), from.as_deref(), to.as_deref())?;
        let dashboard = AnalyticsLogic::dashboard(&pool, &window, &Local::now())?;

        if *json {
            println!("{}", serde_json::to_string_pretty(&dashboard)?);
        } else {
            print_dashboard(&dashboard);
        }
    }
    Ok(())
}

fn print_dashboard(d: &Dashboard) {
    header("All time");
    field("Users", d.all_time.total_users);
    field("Total hours", format_hours(d.all_time.total_hours));
    field("Total bags", d.all_time.total_bags);
    field("Checked in now", d.all_time.active_volunteers);
    field(
        "Avg hours/volunteer",
        format!("{:.2}", d.all_time.avg_hours_per_volunteer),
    );
    field("Avg bags/donor", format!("{:.2}", d.all_time.avg_bags_per_donor));

    if let Some(r) = &d.range {
        header(&d.window);
        field("Hours", format_hours(r.range_hours));
        field("Volunteers", r.range_volunteers);
        field("Sessions", r.range_sessions);
        field("Bags", r.range_bags);
    }

    header("Professions");
    let mut t = Table::new(["Profession", "Users"]);
    for (name, n) in &d.professions {
        t.add_row(vec![name.clone(), n.to_string()]);
    }
    if t.is_empty() {
        info("No users registered yet.");
        return;
    }
    print!("{}", t.render());

    header("Ages");
    let mut t = Table::new(["Age", "Users"]);
    for (bucket, n) in &d.ages {
        t.add_row(vec![bucket.to_string(), n.to_string()]);
    }
    print!("{}", t.render());
}
