use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// A registered volunteer or donor, with its cached running totals.
///
/// `total_hours` and `total_bags` are materialised aggregates of the
/// `volunteer_sessions` and `donations` rows; they are only ever written by
/// a full recomputation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub organization: String,
    pub profession: String,
    pub date_of_birth: Option<NaiveDate>,
    pub is_minor: bool,
    pub parent_guardian_name: Option<String>,
    pub parent_email: Option<String>,
    pub allow_communication: bool,
    pub waiver_signed: bool,
    pub waiver_signed_at: Option<DateTime<Utc>>,
    pub total_hours: f64,
    pub total_bags: i64,
    pub is_checked_in: bool,
    pub last_check_in: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Age in whole years on `today`, when a birth date is known.
    pub fn age_on(&self, today: NaiveDate) -> Option<i32> {
        self.date_of_birth
            .map(|dob| crate::core::calculator::age::age_on(dob, today))
    }

    pub fn status_label(&self) -> &'static str {
        if self.is_checked_in { "Active" } else { "Offline" }
    }
}

/// Registration payload, before validation.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub organization: String,
    pub profession: String,
    pub date_of_birth: Option<NaiveDate>,
    pub allow_communication: bool,
    pub parent_email: Option<String>,
}

/// Staff edit of contact/profile fields. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub organization: Option<String>,
    pub profession: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub allow_communication: Option<bool>,
}

/// Dashboard quick filters for the user list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum UserListFilter {
    #[default]
    All,
    Volunteers,
    Donors,
    Active,
    Recent,
}
