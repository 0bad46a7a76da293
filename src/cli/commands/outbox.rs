use crate::config::Config;
use crate::db::outbox::load_unsent;
use crate::errors::AppResult;
use crate::ui::messages::{header, info};
use crate::utils::formatting::truncate;
use crate::utils::table::Table;
use crate::utils::time::display_local;

pub fn handle(cfg: &Config) -> AppResult<()> {
    let pool = super::open_pool(cfg)?;
    let queued = load_unsent(&pool.conn)?;

    if queued.is_empty() {
        info("Outbox is empty.");
        return Ok(());
    }

    header(format!("Outbox ({} queued)", queued.len()));
    let mut table = Table::new(["#", "Queued", "Kind", "To", "Subject"]);
    for m in &queued {
        table.add_row(vec![
            m.id.to_string(),
            display_local(&m.created_at),
            m.kind.clone(),
            m.recipient.clone(),
            truncate(&m.subject, 50),
        ]);
    }
    print!("{}", table.render());
    Ok(())
}
