//! Date windows for analytics and exports.
//!
//! "this_week" and "this_month" are rolling windows ending now, while
//! "last_month" is the previous calendar month. Both behaviours are relied
//! upon by the dashboard and must not be unified.

use crate::errors::{AppError, AppResult};
use crate::utils::date::{first_of_previous_month, month_last_day};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Inclusive `[start, end]` bounds in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RangePreset {
    #[value(name = "today")]
    Today,
    #[value(name = "this_week")]
    ThisWeek,
    #[value(name = "this_month")]
    ThisMonth,
    #[value(name = "last_month")]
    LastMonth,
    #[value(name = "this_year")]
    ThisYear,
    #[value(name = "last_30_days")]
    Last30Days,
}

impl RangePreset {
    pub fn slug(&self) -> &'static str {
        match self {
            RangePreset::Today => "today",
            RangePreset::ThisWeek => "this_week",
            RangePreset::ThisMonth => "this_month",
            RangePreset::LastMonth => "last_month",
            RangePreset::ThisYear => "this_year",
            RangePreset::Last30Days => "last_30_days",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RangePreset::Today => "Today",
            RangePreset::ThisWeek => "This Week",
            RangePreset::ThisMonth => "This Month",
            RangePreset::LastMonth => "Last Month",
            RangePreset::ThisYear => "This Year",
            RangePreset::Last30Days => "Last 30 Days",
        }
    }

    pub fn from_slug(s: &str) -> Option<Self> {
        [
            RangePreset::Today,
            RangePreset::ThisWeek,
            RangePreset::ThisMonth,
            RangePreset::LastMonth,
            RangePreset::ThisYear,
            RangePreset::Last30Days,
        ]
        .into_iter()
        .find(|p| p.slug() == s)
    }

    /// Resolve against `now`, using the calendar of `now`'s zone.
    pub fn resolve<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateRange {
        let tz = now.timezone();
        let today = now.date_naive();
        let now_utc = now.with_timezone(&Utc);

        let rolling = |days_back: i64| DateRange {
            start: start_of_day(&tz, today - Duration::days(days_back)),
            end: now_utc,
        };

        match self {
            RangePreset::Today => rolling(0),
            RangePreset::ThisWeek => rolling(6),
            RangePreset::ThisMonth | RangePreset::Last30Days => rolling(29),
            RangePreset::LastMonth => {
                // first_of_previous_month only fails outside chrono's year range
                let first = first_of_previous_month(today).unwrap_or(today);
                let last_day = month_last_day(first.year(), first.month()).unwrap_or(28);
                let last = first.with_day(last_day).unwrap_or(first);
                DateRange {
                    start: start_of_day(&tz, first),
                    end: end_of_day(&tz, last),
                }
            }
            RangePreset::ThisYear => {
                let jan1 = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
                DateRange {
                    start: start_of_day(&tz, jan1),
                    end: now_utc,
                }
            }
        }
    }
}

/// A selectable window: everything, a named preset, or explicit dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateWindow {
    AllTime,
    Preset(RangePreset),
    Custom { from: NaiveDate, to: NaiveDate },
}

impl DateWindow {
    /// Custom window: `from` at 00:00:00.000, `to` at 23:59:59.999.
    pub fn custom(from: NaiveDate, to: NaiveDate) -> AppResult<Self> {
        if from > to {
            return Err(AppError::InvalidRange(format!(
                "start {from} is after end {to}"
            )));
        }
        Ok(DateWindow::Custom { from, to })
    }

    /// `None` for all-time.
    pub fn resolve<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<DateRange> {
        match self {
            DateWindow::AllTime => None,
            DateWindow::Preset(p) => Some(p.resolve(now)),
            DateWindow::Custom { from, to } => {
                let tz = now.timezone();
                Some(DateRange {
                    start: start_of_day(&tz, *from),
                    end: end_of_day(&tz, *to),
                })
            }
        }
    }

    pub fn slug(&self) -> String {
        match self {
            DateWindow::AllTime => "all_time".to_string(),
            DateWindow::Preset(p) => p.slug().to_string(),
            DateWindow::Custom { from, to } if from == to => from.to_string(),
            DateWindow::Custom { from, to } => format!("{from}_{to}"),
        }
    }

    pub fn label(&self) -> String {
        match self {
            DateWindow::AllTime => "All Time".to_string(),
            DateWindow::Preset(p) => p.label().to_string(),
            DateWindow::Custom { from, to } if from == to => from.to_string(),
            DateWindow::Custom { from, to } => format!("{from} to {to}"),
        }
    }

    /// Parse a window expression.
    ///
    /// Supports:
    /// - `all` / `all_time`
    /// - preset names (`today`, `this_week`, `this_month`, `last_month`,
    ///   `this_year`, `last_30_days`)
    /// - `YYYY`, `YYYY-MM`, `YYYY-MM-DD`
    /// - `YYYY:YYYY`, `YYYY-MM:YYYY-MM`, `YYYY-MM-DD:YYYY-MM-DD`
    pub fn parse(r: &str) -> AppResult<Self> {
        let r = r.trim();
        if r.eq_ignore_ascii_case("all") || r.eq_ignore_ascii_case("all_time") {
            return Ok(DateWindow::AllTime);
        }
        if let Some(p) = RangePreset::from_slug(&r.to_ascii_lowercase()) {
            return Ok(DateWindow::Preset(p));
        }

        if let Some((start_raw, end_raw)) = r.split_once(':') {
            let start = start_raw.trim();
            let end = end_raw.trim();
            if start.len() != end.len() {
                return Err(AppError::InvalidRange(
                    "start and end must have same format".into(),
                ));
            }
            let (from, _) = period_bounds(start)?;
            let (_, to) = period_bounds(end)?;
            DateWindow::custom(from, to)
        } else {
            let (from, to) = period_bounds(r)?;
            DateWindow::custom(from, to)
        }
    }
}

/// First and last day of a `YYYY`, `YYYY-MM` or `YYYY-MM-DD` period.
fn period_bounds(p: &str) -> AppResult<(NaiveDate, NaiveDate)> {
    let invalid = || AppError::InvalidRange(format!("unsupported range format: {p}"));

    match p.len() {
        4 => {
            let y: i32 = p.parse().map_err(|_| invalid())?;
            let d1 = NaiveDate::from_ymd_opt(y, 1, 1).ok_or_else(invalid)?;
            let d2 = NaiveDate::from_ymd_opt(y, 12, 31).ok_or_else(invalid)?;
            Ok((d1, d2))
        }
        7 => {
            let (ys, ms) = p.split_once('-').ok_or_else(invalid)?;
            let y: i32 = ys.parse().map_err(|_| invalid())?;
            let m: u32 = ms.parse().map_err(|_| invalid())?;
            let last = month_last_day(y, m).ok_or_else(invalid)?;
            let d1 = NaiveDate::from_ymd_opt(y, m, 1).ok_or_else(invalid)?;
            let d2 = NaiveDate::from_ymd_opt(y, m, last).ok_or_else(invalid)?;
            Ok((d1, d2))
        }
        10 => {
            let d = NaiveDate::parse_from_str(p, "%Y-%m-%d")
                .map_err(|_| AppError::InvalidDate(p.to_string()))?;
            Ok((d, d))
        }
        _ => Err(invalid()),
    }
}

/// Longest DST gap worth walking across, in minutes.
const MAX_GAP_MINUTES: i64 = 24 * 60;

fn local_to_utc<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    // Inside a DST gap the first wall-clock minute that exists is the instant
    // the clocks jumped to.
    (0..=MAX_GAP_MINUTES)
        .find_map(|m| {
            tz.from_local_datetime(&(naive + Duration::minutes(m)))
                .earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

pub fn start_of_day<Tz: TimeZone>(tz: &Tz, d: NaiveDate) -> DateTime<Utc> {
    local_to_utc(tz, d.and_time(NaiveTime::MIN))
}

pub fn end_of_day<Tz: TimeZone>(tz: &Tz, d: NaiveDate) -> DateTime<Utc> {
    let eod = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    local_to_utc(tz, d.and_time(eod))
}
