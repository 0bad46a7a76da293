use chrono::{DateTime, Utc};
use serde::Serialize;

/// One donation event. Donations are never edited or deleted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Donation {
    pub id: i64,
    pub user_id: i64,
    pub bag_count: i64,
    pub timestamp: DateTime<Utc>,
}
