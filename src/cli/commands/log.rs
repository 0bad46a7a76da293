use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::log::load_audit;
use crate::errors::AppResult;
use crate::ui::messages::{header, info};
use crate::utils::formatting::truncate;
use crate::utils::table::Table;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Log { print: true, limit } = cmd {
        let pool = super::open_pool(cfg)?;
        let mut rows = load_audit(&pool.conn)?;
        if let Some(n) = limit {
            let skip = rows.len().saturating_sub(*n);
            rows.drain(..skip);
        }

        if rows.is_empty() {
            info("Audit log is empty.");
            return Ok(());
        }

        header("Audit log");
        let mut table = Table::new(["#", "Date", "Actor", "Operation", "Target", "Message"]);
        for e in rows {
            table.add_row(vec![
                e.id.to_string(),
                e.date,
                e.actor,
                e.operation,
                truncate(&e.target, 30),
                truncate(&e.message, 60),
            ]);
        }
        print!("{}", table.render());
    }

    Ok(())
}
