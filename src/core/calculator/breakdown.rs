//! Dashboard group-bys over the user registry.

use crate::core::calculator::age::age_bucket;
use crate::models::user::User;
use chrono::NaiveDate;
use std::collections::BTreeMap;

pub const UNSPECIFIED_PROFESSION: &str = "Not specified";

/// Age groups in display order.
pub const AGE_BUCKETS: [&str; 6] = ["18-24", "25-34", "35-44", "45-54", "55-64", "65+"];

/// Users per profession, largest group first (ties by name).
/// A blank profession counts as "Not specified".
pub fn profession_breakdown(users: &[User]) -> Vec<(String, usize)> {
    let mut acc: BTreeMap<String, usize> = BTreeMap::new();
    for u in users {
        let prof = u.profession.trim();
        let key = if prof.is_empty() {
            UNSPECIFIED_PROFESSION
        } else {
            prof
        };
        *acc.entry(key.to_string()).or_default() += 1;
    }

    let mut out: Vec<(String, usize)> = acc.into_iter().collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

/// Users per age bucket in bucket order. Users without a birth date are
/// left out entirely; empty buckets are omitted.
pub fn age_breakdown(users: &[User], today: NaiveDate) -> Vec<(&'static str, usize)> {
    let mut counts = [0usize; AGE_BUCKETS.len()];
    for age in users.iter().filter_map(|u| u.age_on(today)) {
        let bucket = age_bucket(age);
        if let Some(i) = AGE_BUCKETS.iter().position(|b| *b == bucket) {
            counts[i] += 1;
        }
    }

    AGE_BUCKETS
        .iter()
        .zip(counts)
        .filter(|(_, n)| *n > 0)
        .map(|(b, n)| (*b, n))
        .collect()
}
