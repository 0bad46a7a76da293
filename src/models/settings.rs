//! Auto-checkout settings, stored as JSON under the `auto_checkout` key of
//! `system_settings`. Field names match the stored document.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const AUTO_CHECKOUT_KEY: &str = "auto_checkout";

pub const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySchedule {
    pub enabled: bool,
    /// Zero-padded 24h "HH:MM".
    pub start_time: String,
    /// Zero-padded 24h "HH:MM".
    pub end_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoCheckoutSettings {
    pub enabled: bool,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Keyed by lowercase English weekday name ("monday" ... "sunday").
    #[serde(default)]
    pub schedule: BTreeMap<String, DaySchedule>,
}

fn default_timezone() -> String {
    "America/Chicago".to_string()
}

impl Default for AutoCheckoutSettings {
    fn default() -> Self {
        let schedule = WEEK
            .iter()
            .map(|d| {
                let weekday = !matches!(d, Weekday::Sat | Weekday::Sun);
                (
                    day_key(*d).to_string(),
                    DaySchedule {
                        enabled: weekday,
                        start_time: "09:00".to_string(),
                        end_time: "18:00".to_string(),
                    },
                )
            })
            .collect();

        Self {
            enabled: true,
            timezone: default_timezone(),
            schedule,
        }
    }
}

impl AutoCheckoutSettings {
    pub fn day(&self, day: Weekday) -> Option<&DaySchedule> {
        self.schedule.get(day_key(day))
    }

    /// IANA zone the schedule is written in, `None` when the name is unknown.
    pub fn zone(&self) -> Option<chrono_tz::Tz> {
        self.timezone.trim().parse().ok()
    }
}

/// Lowercase English weekday name used as schedule key.
pub fn day_key(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// Accepts full names and three-letter abbreviations, any case.
pub fn parse_day(s: &str) -> Option<Weekday> {
    let lower = s.trim().to_lowercase();
    WEEK.iter()
        .copied()
        .find(|d| day_key(*d) == lower || day_key(*d)[..3] == lower)
}
