use crate::cli::parser::{Cli, Commands};
use crate::config::Config;
use crate::errors::AppResult;
use crate::export::{ExportFilter, ExportLogic, ExportRequest};
use crate::ui::messages::{info, success, warning};
use chrono::Local;

pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    if let Commands::Export {
        dir,
        file,
        range,
        from,
        to,
        profession,
        min_age,
        max_age,
        min_hours,
        max_hours,
        min_bags,
        max_bags,
        force,
    } = &cli.command
    {
        let pool = super::open_pool(cfg)?;
        let ctx = super::staff_context(cli, cfg, &pool)?;

        let request = ExportRequest {
            window: super::window_from_args(range.as_deref(), from.as_deref(), to.as_deref())?,
            filter: ExportFilter {
                profession: profession.clone(),
                min_age: *min_age,
                max_age: *max_age,
                min_hours: *min_hours,
                max_hours: *max_hours,
                min_bags: *min_bags,
                max_bags: *max_bags,
            },
            file: file.clone(),
            dir: dir.clone(),
            force: *force,
        };

        info(format!("Exporting {}…", request.window.label()));
        let summary = ExportLogic::export(&pool, &request, &Local::now(), &ctx)?;

        success(format!(
            "Exported {} user(s) to {}",
            summary.exported,
            summary.path.display()
        ));
        if summary.filtered_out > 0 {
            info(format!("{} user(s) did not match the filters", summary.filtered_out));
        }
        if summary.failed > 0 {
            warning(format!("{} row(s) could not be written", summary.failed));
        }
    }
    Ok(())
}
