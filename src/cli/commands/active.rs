use crate::config::Config;
use crate::core::registry::RegistryLogic;
use crate::errors::AppResult;
use crate::ui::messages::{header, info};
use crate::utils::table::Table;
use crate::utils::time::display_local;
use chrono::Utc;

pub fn handle(cfg: &Config) -> AppResult<()> {
    let pool = super::open_pool(cfg)?;
    let active = RegistryLogic::active_volunteers(&pool, Utc::now())?;

    if active.is_empty() {
        info("Nobody is checked in.");
        return Ok(());
    }

    header(format!("On site ({})", active.len()));
    let mut table = Table::new(["ID", "Name", "Since", "Elapsed"]);
    for a in &active {
        table.add_row(vec![
            a.user.id.to_string(),
            a.user.name.clone(),
            display_local(&a.since),
            a.elapsed_label(),
        ]);
    }
    print!("{}", table.render());
    Ok(())
}
