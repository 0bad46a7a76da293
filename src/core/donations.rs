//! Donor check-in: one donation event per visit. Donations are never edited.

use crate::core::registry::RegistryLogic;
use crate::db::donations;
use crate::db::log::audit;
use crate::db::pool::DbPool;
use crate::db::queries::{get_user, set_total_bags};
use crate::errors::{AppError, AppResult};
use crate::models::donation::Donation;
use crate::models::staff::StaffContext;
use crate::models::user::{NewUser, User};
use chrono::{DateTime, Utc};
use tracing::info;

pub struct DonationLogic;

impl DonationLogic {
    /// Insert the donation and recompute `total_bags` from the donation rows.
    pub fn record_donation(
        pool: &DbPool,
        user_id: i64,
        bag_count: i64,
        now: DateTime<Utc>,
        ctx: &StaffContext,
    ) -> AppResult<(Donation, User)> {
        if bag_count < 1 {
            return Err(AppError::Validation(vec![
                "Bag count must be at least 1".to_string(),
            ]));
        }
        let user = get_user(&pool.conn, user_id)?;

        let tx = pool.conn.unchecked_transaction()?;
        let donation = donations::insert_donation(&tx, user_id, bag_count, now)?;
        let total = donations::sum_user_bags(&tx, user_id)?;
        set_total_bags(&tx, user_id, total)?;
        audit(
            &tx,
            ctx.actor(),
            "donation",
            &user_id.to_string(),
            &format!("{} donated {} bag(s)", user.name, bag_count),
        )?;
        tx.commit()?;

        info!(user_id, bag_count, total, "donation recorded");
        Ok((donation, get_user(&pool.conn, user_id)?))
    }

    /// Walk-up donor: register without a waiver, then record the donation.
    pub fn register_donor_and_donate(
        pool: &DbPool,
        new: &NewUser,
        bag_count: i64,
        now: DateTime<Utc>,
        ctx: &StaffContext,
    ) -> AppResult<(Donation, User)> {
        if bag_count < 1 {
            return Err(AppError::Validation(vec![
                "Bag count must be at least 1".to_string(),
            ]));
        }
        let user = RegistryLogic::register_user(pool, new, None, now, ctx)?;
        Self::record_donation(pool, user.id, bag_count, now, ctx)
    }
}
