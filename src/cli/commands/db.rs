use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::migrate::{pending_count, run_pending_migrations};
use crate::db::pool::DbPool;
use crate::db::stats;
use crate::errors::AppResult;
use crate::ui::messages::{error, info, success, warning};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Db {
        migrate,
        check,
        vacuum,
        info: show_info,
    } = cmd
    else {
        return Ok(());
    };

    // opened without migrating so `--info` can report what is pending
    let pool = DbPool::new(&cfg.database)?;

    if *migrate {
        match pending_count(&pool.conn)? {
            0 => info("Schema is up to date."),
            n => {
                info(format!("Applying {n} migration(s)…"));
                run_pending_migrations(&pool.conn)?;
                success("Migrations applied.");
            }
        }
    }

    if *show_info {
        stats::print_db_info(&pool, &cfg.database)?;
        let pending = pending_count(&pool.conn)?;
        if pending > 0 {
            warning(format!(
                "{pending} pending migration(s); run `volunteerhub db --migrate`"
            ));
        }
    }

    if *check {
        let problems = stats::integrity_problems(&pool)?;
        if problems.is_empty() {
            success("Integrity check passed.");
        } else {
            for p in &problems {
                error(p);
            }
        }
    }

    if *vacuum {
        pool.conn.execute_batch("VACUUM;")?;
        success("Database compacted (VACUUM).");
    }

    Ok(())
}
