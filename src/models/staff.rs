use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    Admin,
    Manager,
    Staff,
}

impl StaffRole {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            StaffRole::Admin => "admin",
            StaffRole::Manager => "manager",
            StaffRole::Staff => "staff",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(StaffRole::Admin),
            "manager" => Some(StaffRole::Manager),
            "staff" => Some(StaffRole::Staff),
            _ => None,
        }
    }

    /// Only admins and regular staff may create new staff accounts.
    pub fn can_create_staff(&self) -> bool {
        matches!(self, StaffRole::Admin | StaffRole::Staff)
    }
}

/// Row of `staff_profiles`, including credential material.
#[derive(Debug, Clone)]
pub struct StaffProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub role: StaffRole,
    pub password_hash: String,
    pub first_login: bool,
    pub created_at: DateTime<Utc>,
}

/// Result of a successful authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaffIdentity {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub role: StaffRole,
    pub requires_password_change: bool,
}

impl From<&StaffProfile> for StaffIdentity {
    fn from(p: &StaffProfile) -> Self {
        Self {
            id: p.id,
            username: p.username.clone(),
            display_name: p.display_name.clone(),
            role: p.role,
            requires_password_change: p.first_login,
        }
    }
}

/// Who is performing an operation. Passed explicitly to every mutating core
/// call and recorded as the audit actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaffContext {
    Staff(StaffIdentity),
    /// Self-service kiosk actions (registration, check-in at the front desk).
    Kiosk,
    /// Unattended jobs such as the scheduled auto-checkout.
    System,
}

impl StaffContext {
    pub fn actor(&self) -> &str {
        match self {
            StaffContext::Staff(id) => &id.username,
            StaffContext::Kiosk => "kiosk",
            StaffContext::System => "system",
        }
    }

    pub fn identity(&self) -> Option<&StaffIdentity> {
        match self {
            StaffContext::Staff(id) => Some(id),
            _ => None,
        }
    }
}
