//! Dashboard rollups: lifetime totals from the cached user aggregates and
//! windowed totals from session and donation rows.

use crate::core::calculator::breakdown::{age_breakdown, profession_breakdown};
use crate::core::calculator::range::{DateRange, DateWindow};
use crate::db::donations::load_donations_in_range;
use crate::db::pool::DbPool;
use crate::db::queries::load_all_users;
use crate::db::sessions::load_sessions_in_range;
use crate::errors::AppResult;
use crate::models::user::User;
use chrono::{DateTime, NaiveDate, TimeZone};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllTimeStats {
    pub total_users: usize,
    pub total_hours: f64,
    pub total_bags: i64,
    pub active_volunteers: usize,
    pub avg_hours_per_volunteer: f64,
    pub avg_bags_per_donor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeStats {
    pub range_hours: f64,
    pub range_volunteers: usize,
    pub range_sessions: usize,
    pub range_bags: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub window: String,
    pub all_time: AllTimeStats,
    /// `None` for the all-time window.
    pub range: Option<RangeStats>,
    pub professions: Vec<(String, usize)>,
    pub ages: Vec<(&'static str, usize)>,
}

fn ratio(num: f64, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num / den as f64 }
}

pub struct AnalyticsLogic;

impl AnalyticsLogic {
    /// Averages divide by the total user count and are 0 for an empty registry.
    pub fn all_time_stats(users: &[User]) -> AllTimeStats {
        let total_users = users.len();
        let total_hours: f64 = users.iter().map(|u| u.total_hours).sum();
        let total_bags: i64 = users.iter().map(|u| u.total_bags).sum();

        AllTimeStats {
            total_users,
            total_hours,
            total_bags,
            active_volunteers: users.iter().filter(|u| u.is_checked_in).count(),
            avg_hours_per_volunteer: ratio(total_hours, total_users),
            avg_bags_per_donor: ratio(total_bags as f64, total_users),
        }
    }

    /// Sessions are selected by `check_in_time`, donations by `timestamp`,
    /// both inclusive.
    pub fn range_stats(pool: &DbPool, range: &DateRange) -> AppResult<RangeStats> {
        let sessions = load_sessions_in_range(&pool.conn, None, range.start, range.end)?;
        let donations = load_donations_in_range(&pool.conn, range.start, range.end)?;

        let volunteers: BTreeSet<i64> = sessions.iter().map(|s| s.user_id).collect();

        Ok(RangeStats {
            range_hours: sessions.iter().map(|s| s.hours_worked).sum(),
            range_volunteers: volunteers.len(),
            range_sessions: sessions.len(),
            range_bags: donations.iter().map(|d| d.bag_count).sum(),
        })
    }

    pub fn dashboard<Tz: TimeZone>(
        pool: &DbPool,
        window: &DateWindow,
        now: &DateTime<Tz>,
    ) -> AppResult<Dashboard> {
        let users = load_all_users(&pool.conn)?;
        let today: NaiveDate = now.date_naive();

        let range = match window.resolve(now) {
            Some(r) => Some(Self::range_stats(pool, &r)?),
            None => None,
        };

        Ok(Dashboard {
            window: window.label(),
            all_time: Self::all_time_stats(&users),
            range,
            professions: profession_breakdown(&users),
            ages: age_breakdown(&users, today),
        })
    }
}
