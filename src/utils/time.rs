//! Time utilities: parsing HH:MM, timestamp storage format, elapsed-time formatting.

use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Local, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc};

pub fn parse_time(t: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(t, "%H:%M").ok()
}

/// Validate a schedule time: must be a zero-padded 24h "HH:MM", so that
/// string comparison matches chronological order.
pub fn validate_hhmm(t: &str) -> AppResult<String> {
    let ok = t.len() == 5 && t.as_bytes()[2] == b':' && parse_time(t).is_some();
    if ok {
        Ok(t.to_string())
    } else {
        Err(AppError::InvalidTime(t.to_string()))
    }
}

pub fn format_minutes(mins: i64) -> String {
    let sign = if mins < 0 { "-" } else { "" };
    let m = mins.abs();
    format!("{}{:02}h {:02}m", sign, m / 60, m % 60)
}

/// Storage format for every timestamp column: fixed-width UTC with
/// milliseconds, so that SQL string comparison is chronological.
pub fn to_db(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn from_db(s: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AppError::InvalidDate(s.to_string()))
}

/// Parse a user-supplied local timestamp: RFC 3339, "YYYY-MM-DD HH:MM"
/// or "YYYY-MM-DDTHH:MM" (interpreted in the host's local zone).
pub fn parse_local_timestamp(s: &str) -> AppResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .map_err(|_| AppError::InvalidDate(s.to_string()))?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| AppError::InvalidDate(s.to_string()))
}

/// Human form of a stored timestamp in the host's zone.
pub fn display_local(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}
