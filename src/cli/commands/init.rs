use crate::cli::parser::Cli;
use crate::config::Config;
use crate::db::initialize::open_db;
use crate::db::log::audit;
use crate::errors::AppResult;
use crate::ui::messages::{info, success, warning};

/// Handle the `init` command
///
/// This initializes:
///  - the config directory (if missing)
///  - the configuration file
///  - the SQLite database with all pending migrations
pub fn handle(cli: &Cli) -> AppResult<()> {
    let db_path = Config::init_all(cli.db.as_deref())?;
    let db_path = db_path.to_string_lossy().to_string();

    info("Initializing VolunteerHub…");
    println!("📄 Config file : {}", Config::config_file().display());
    println!("🗄️  Database   : {}", db_path);

    let pool = open_db(&db_path)?;
    success(format!("Database initialized at {}", db_path));

    // the audit row is informative only
    if let Err(e) = audit(
        &pool.conn,
        "system",
        "init",
        &db_path,
        "Database initialized",
    ) {
        warning(format!("Failed to write audit log: {}", e));
    }

    Ok(())
}
