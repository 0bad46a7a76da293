use crate::models::user::User;
use crate::utils::date::us_date;
use chrono::NaiveDate;
use serde::Serialize;

/// Staff-selected export criteria. Every bound is optional; a user without
/// a known age fails any age bound.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportFilter {
    pub profession: Option<String>,
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
    /// Compared against the hours of the selected window.
    pub min_hours: Option<f64>,
    pub max_hours: Option<f64>,
    pub min_bags: Option<i64>,
    pub max_bags: Option<i64>,
}

/// A user plus the values derived for one export run.
#[derive(Debug, Clone)]
pub struct ExportCandidate<'a> {
    pub user: &'a User,
    pub age: Option<i32>,
    pub hours_in_range: f64,
}

impl<'a> ExportCandidate<'a> {
    pub fn new(user: &'a User, today: NaiveDate, hours_in_range: f64) -> Self {
        Self {
            user,
            age: user.age_on(today),
            hours_in_range,
        }
    }
}

impl ExportFilter {
    pub fn matches(&self, c: &ExportCandidate<'_>) -> bool {
        if let Some(p) = self.profession.as_deref().map(str::trim)
            && !p.is_empty()
            && c.user.profession.trim() != p
        {
            return false;
        }

        if let Some(min) = self.min_age
            && c.age.is_none_or(|a| a < min)
        {
            return false;
        }
        if let Some(max) = self.max_age
            && c.age.is_none_or(|a| a > max)
        {
            return false;
        }

        if self.min_hours.is_some_and(|m| c.hours_in_range < m)
            || self.max_hours.is_some_and(|m| c.hours_in_range > m)
        {
            return false;
        }

        let bags = c.user.total_bags;
        !(self.min_bags.is_some_and(|m| bags < m) || self.max_bags.is_some_and(|m| bags > m))
    }
}

/// One CSV line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Phone")]
    pub phone: String,
    #[serde(rename = "Age")]
    pub age: String,
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "Organization")]
    pub organization: String,
    #[serde(rename = "Profession")]
    pub profession: String,
    #[serde(rename = "Hours in Period")]
    pub hours_in_period: f64,
    #[serde(rename = "Total Lifetime Hours")]
    pub total_lifetime_hours: f64,
    #[serde(rename = "Total Bags Donated")]
    pub total_bags_donated: i64,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Registered")]
    pub registered: String,
}

fn or_unspecified(s: &str) -> String {
    if s.trim().is_empty() {
        "Not specified".to_string()
    } else {
        s.trim().to_string()
    }
}

impl From<&ExportCandidate<'_>> for ExportRow {
    fn from(c: &ExportCandidate<'_>) -> Self {
        let u = c.user;
        Self {
            name: u.name.clone(),
            email: u.email.clone(),
            phone: u.phone.clone(),
            age: c
                .age
                .map(|a| a.to_string())
                .unwrap_or_else(|| "Not specified".to_string()),
            city: u.city.clone(),
            organization: u.organization.clone(),
            profession: or_unspecified(&u.profession),
            hours_in_period: c.hours_in_range,
            total_lifetime_hours: u.total_hours,
            total_bags_donated: u.total_bags,
            status: u.status_label().to_string(),
            registered: us_date(u.created_at.date_naive()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn user() -> User {
        User {
            id: 7,
            name: "Ada".into(),
            email: "ada@example.org".into(),
            phone: "5551234567".into(),
            city: "Austin".into(),
            organization: String::new(),
            profession: "Engineer".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 6, 1),
            is_minor: false,
            parent_guardian_name: None,
            parent_email: None,
            allow_communication: true,
            waiver_signed: true,
            waiver_signed_at: None,
            total_hours: 12.5,
            total_bags: 3,
            is_checked_in: true,
            last_check_in: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 9, 15, 0, 0).unwrap(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
    }

    #[test]
    fn hours_bound_uses_window_hours() {
        let u = user();
        let c = ExportCandidate::new(&u, today(), 2.0);
        let f = ExportFilter {
            min_hours: Some(5.0),
            ..Default::default()
        };
        assert!(!f.matches(&c));
        let lifetime = ExportCandidate::new(&u, today(), u.total_hours);
        assert!(f.matches(&lifetime));
    }

    #[test]
    fn unknown_age_fails_age_bounds() {
        let mut u = user();
        u.date_of_birth = None;
        let c = ExportCandidate::new(&u, today(), 0.0);
        let f = ExportFilter {
            max_age: Some(99),
            ..Default::default()
        };
        assert!(!f.matches(&c));
        assert!(ExportFilter::default().matches(&c));
    }

    #[test]
    fn profession_and_bags() {
        let u = user();
        let c = ExportCandidate::new(&u, today(), 0.0);
        let wrong = ExportFilter {
            profession: Some("Nurse".into()),
            ..Default::default()
        };
        assert!(!wrong.matches(&c));
        let bags = ExportFilter {
            profession: Some("Engineer".into()),
            min_bags: Some(1),
            max_bags: Some(3),
            ..Default::default()
        };
        assert!(bags.matches(&c));
    }

    #[test]
    fn row_projection() {
        let mut u = user();
        u.profession = String::new();
        let row = ExportRow::from(&ExportCandidate::new(&u, today(), 1.25));
        assert_eq!(row.age, "34");
        assert_eq!(row.profession, "Not specified");
        assert_eq!(row.status, "Active");
        assert_eq!(row.registered, "01/09/2025");
        assert_eq!(row.hours_in_period, 1.25);
    }
}
