use chrono::{Datelike, NaiveDate};

pub const ADULT_AGE: i32 = 18;

/// Whole years between `birth` and `today`, minus one when this year's
/// birthday has not happened yet.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

pub fn is_minor(birth: Option<NaiveDate>, today: NaiveDate) -> bool {
    birth.is_some_and(|b| age_on(b, today) < ADULT_AGE)
}

/// Dashboard age group. Ages under 25 all land in "18-24".
pub fn age_bucket(age: i32) -> &'static str {
    if age < 25 {
        "18-24"
    } else if age < 35 {
        "25-34"
    } else if age < 45 {
        "35-44"
    } else if age < 55 {
        "45-54"
    } else if age < 65 {
        "55-64"
    } else {
        "65+"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn birthday_not_yet_reached() {
        assert_eq!(age_on(d(2000, 6, 15), d(2025, 6, 14)), 24);
        assert_eq!(age_on(d(2000, 6, 15), d(2025, 6, 15)), 25);
    }

    #[test]
    fn bucket_boundaries() {
        assert_eq!(age_bucket(24), "18-24");
        assert_eq!(age_bucket(25), "25-34");
        assert_eq!(age_bucket(64), "55-64");
        assert_eq!(age_bucket(65), "65+");
    }

    #[test]
    fn minor_needs_known_birth_date() {
        assert!(is_minor(Some(d(2010, 1, 1)), d(2025, 1, 1)));
        assert!(!is_minor(Some(d(2007, 1, 1)), d(2025, 1, 1)));
        assert!(!is_minor(None, d(2025, 1, 1)));
    }
}
