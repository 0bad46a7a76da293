use chrono::{DateTime, Utc};

/// Elapsed time in fractional hours. Negative when `check_out` precedes
/// `check_in`; no clamping happens here.
pub fn elapsed_hours(check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> f64 {
    (check_out - check_in).num_milliseconds() as f64 / 3_600_000.0
}

/// Quantize to the nearest quarter hour, halves rounding up (toward +∞).
pub fn round_to_quarter_hour(hours: f64) -> f64 {
    (hours * 4.0 + 0.5).floor() / 4.0
}

/// Billable hours for a check-in/check-out pair.
pub fn quarter_hours(check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> f64 {
    round_to_quarter_hour(elapsed_hours(check_in, check_out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 15, h, m, 0).unwrap()
    }

    #[test]
    fn thirty_seven_minutes_rounds_to_half_hour() {
        assert_eq!(quarter_hours(at(10, 0), at(10, 37)), 0.5);
    }

    #[test]
    fn fifty_three_minutes_rounds_to_one_hour() {
        assert_eq!(quarter_hours(at(10, 0), at(10, 53)), 1.0);
    }

    #[test]
    fn exact_quarter_is_kept() {
        assert_eq!(quarter_hours(at(9, 0), at(10, 15)), 1.25);
    }

    #[test]
    fn halfway_rounds_up() {
        // 7.5 minutes = 0.125h, exactly half a quarter step
        let start = at(9, 0);
        let end = start + chrono::Duration::seconds(450);
        assert_eq!(quarter_hours(start, end), 0.25);
    }

    #[test]
    fn reversed_pair_is_not_clamped() {
        assert_eq!(quarter_hours(at(11, 0), at(10, 0)), -1.0);
        let start = at(9, 0);
        let end = start - chrono::Duration::seconds(450);
        assert_eq!(quarter_hours(start, end), 0.0);
    }
}
