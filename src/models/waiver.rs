use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WaiverStatus {
    Pending,
    Signed,
}

impl WaiverStatus {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            WaiverStatus::Pending => "pending",
            WaiverStatus::Signed => "signed",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(WaiverStatus::Pending),
            "signed" => Some(WaiverStatus::Signed),
            _ => None,
        }
    }
}

/// Guardian attestation requested by e-mail for a minor (legacy remote flow).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaiverRequest {
    pub token: String,
    pub user_id: i64,
    pub parent_email: String,
    pub volunteer_name: String,
    pub status: WaiverStatus,
    pub parent_signature: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub signed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl WaiverRequest {
    /// Usable only while pending and not yet expired.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.status == WaiverStatus::Pending && now < self.expires_at
    }
}
