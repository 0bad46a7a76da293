use chrono::{DateTime, Utc};
use serde::Serialize;

/// A persisted, completed work interval (`volunteer_sessions` row).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosedSession {
    pub id: i64,
    pub user_id: i64,
    pub check_in_time: DateTime<Utc>,
    pub check_out_time: DateTime<Utc>,
    pub hours_worked: f64,
    pub notes: Option<String>,
}

/// A session as shown in a user's history.
///
/// `Active` is derived from the user's check-in flags; it is never stored and
/// carries no id, so it cannot be passed to the row-level edit/delete paths.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Session {
    Closed(ClosedSession),
    Active {
        user_id: i64,
        check_in_time: DateTime<Utc>,
    },
}

impl Session {
    pub fn user_id(&self) -> i64 {
        match self {
            Session::Closed(s) => s.user_id,
            Session::Active { user_id, .. } => *user_id,
        }
    }

    pub fn check_in_time(&self) -> DateTime<Utc> {
        match self {
            Session::Closed(s) => s.check_in_time,
            Session::Active { check_in_time, .. } => *check_in_time,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Session::Active { .. })
    }
}
