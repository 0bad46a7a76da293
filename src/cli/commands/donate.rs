use crate::cli::parser::{Cli, Commands};
use crate::config::Config;
use crate::core::donations::DonationLogic;
use crate::errors::AppResult;
use crate::ui::messages::success;
use chrono::Utc;

pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    if let Commands::Donate { user_id, bags } = &cli.command {
        let pool = super::open_pool(cfg)?;
        let ctx = super::desk_context(cli, cfg, &pool)?;
        let (donation, user) =
            DonationLogic::record_donation(&pool, *user_id, *bags, Utc::now(), &ctx)?;
        success(format!(
            "Recorded {} bag(s) from {} ({} in total)",
            donation.bag_count, user.name, user.total_bags
        ));
    }
    Ok(())
}
