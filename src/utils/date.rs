use chrono::{Datelike, NaiveDate};

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// Last day of the given month, or None for an invalid month.
pub fn month_last_day(y: i32, m: u32) -> Option<u32> {
    if !(1..=12).contains(&m) {
        return None;
    }
    let next = if m == 12 {
        NaiveDate::from_ymd_opt(y + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(y, m + 1, 1)
    }?;
    next.pred_opt().map(|d| d.day())
}

/// First day of the calendar month preceding `d`.
pub fn first_of_previous_month(d: NaiveDate) -> Option<NaiveDate> {
    let (y, m) = if d.month() == 1 {
        (d.year() - 1, 12)
    } else {
        (d.year(), d.month() - 1)
    };
    NaiveDate::from_ymd_opt(y, m, 1)
}

/// "MM/DD/YYYY", used for the Registered column of exports.
pub fn us_date(d: NaiveDate) -> String {
    d.format("%m/%d/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leap_february() {
        assert_eq!(month_last_day(2024, 2), Some(29));
        assert_eq!(month_last_day(2025, 2), Some(28));
        assert_eq!(month_last_day(1900, 2), Some(28));
        assert_eq!(month_last_day(2000, 2), Some(29));
        assert_eq!(month_last_day(2025, 12), Some(31));
        assert_eq!(month_last_day(2025, 4), Some(30));
        assert_eq!(month_last_day(2025, 0), None);
        assert_eq!(month_last_day(2025, 13), None);
    }

    #[test]
    fn previous_month_wraps_year() {
        let d = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        assert_eq!(
            first_of_previous_month(d),
            NaiveDate::from_ymd_opt(2024, 12, 1)
        );
    }
}
