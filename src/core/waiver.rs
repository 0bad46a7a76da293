//! Liability waiver gate.
//!
//! A user reaches `WaiverComplete` either in person (adult self-attestation,
//! or a guardian present at the desk for a minor) or through the remote
//! guardian link sent by e-mail. Check-in is refused until then.

use crate::db::log::audit;
use crate::db::pool::DbPool;
use crate::db::queries::{WaiverFields, get_user, mark_waiver_signed};
use crate::db::waivers;
use crate::errors::{AppError, AppResult};
use crate::mail::{EmailKind, Mailer, TemplateData};
use crate::models::staff::StaffContext;
use crate::models::user::User;
use crate::models::waiver::{WaiverRequest, WaiverStatus};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::Serialize;
use tracing::{info, warn};

const TOKEN_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WaiverState {
    /// Unsigned and no birth date on file, so the path is not yet known.
    NoWaiver,
    AdultWaiverPending,
    MinorWaiverPending,
    WaiverComplete,
}

impl WaiverState {
    pub fn of(user: &User) -> Self {
        if user.waiver_signed {
            WaiverState::WaiverComplete
        } else if user.is_minor {
            WaiverState::MinorWaiverPending
        } else if user.date_of_birth.is_some() {
            WaiverState::AdultWaiverPending
        } else {
            WaiverState::NoWaiver
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WaiverState::NoWaiver => "No waiver",
            WaiverState::AdultWaiverPending => "Adult waiver pending",
            WaiverState::MinorWaiverPending => "Minor waiver pending (guardian required)",
            WaiverState::WaiverComplete => "Complete",
        }
    }
}

/// The two ways of completing a waiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaiverCompletion {
    /// Signed at the desk. For a minor, `guardian_name` is the present guardian.
    InPerson {
        signer: String,
        guardian_name: Option<String>,
    },
    /// Signed through the public `/waiver/<token>` page.
    RemoteToken { token: String, signature: String },
}

/// Waiver answers given on the registration form.
#[derive(Debug, Clone, Default)]
pub struct WaiverIntake {
    /// Adult acknowledgement, or guardian pre-agreement for a minor.
    pub accepted: bool,
    pub guardian_name: Option<String>,
    /// A guardian is at the desk right now (walk-up flow).
    pub guardian_present: bool,
}

/// What the public waiver page should render for a token.
#[derive(Debug, Clone, PartialEq)]
pub enum WaiverLink {
    Form(WaiverRequest),
    Expired,
}

pub struct WaiverLogic;

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

impl WaiverLogic {
    /// Refuse check-in while the waiver is incomplete.
    pub fn gate_check_in(user: &User) -> AppResult<()> {
        if user.waiver_signed {
            Ok(())
        } else {
            Err(AppError::WaiverRequired(user.id))
        }
    }

    /// Translate registration answers into the stored waiver columns.
    ///
    /// Minors need a guardian name and the pre-agreement; their waiver is
    /// only signed when the guardian is present. Adults sign by accepting.
    pub fn intake_fields<'a>(
        intake: &'a WaiverIntake,
        is_minor: bool,
        now: DateTime<Utc>,
    ) -> AppResult<WaiverFields<'a>> {
        let guardian = non_empty(intake.guardian_name.as_deref());
        let mut errors = Vec::new();

        if is_minor {
            if guardian.is_none() {
                errors.push("Parent/guardian name is required for minors".to_string());
            }
            if !intake.accepted {
                errors.push("Parent/guardian pre-agreement is required for minors".to_string());
            }
        } else if !intake.accepted {
            errors.push("The liability waiver must be accepted".to_string());
        }

        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let signed = !is_minor || intake.guardian_present;
        Ok(WaiverFields {
            is_minor,
            guardian_name: if is_minor { guardian } else { None },
            waiver_signed_at: signed.then_some(now),
        })
    }

    /// Complete a user's waiver through either path.
    pub fn complete(
        pool: &DbPool,
        user_id: i64,
        completion: &WaiverCompletion,
        now: DateTime<Utc>,
        ctx: &StaffContext,
    ) -> AppResult<User> {
        match completion {
            WaiverCompletion::InPerson {
                signer,
                guardian_name,
            } => Self::complete_in_person(pool, user_id, signer, guardian_name.as_deref(), now, ctx),
            WaiverCompletion::RemoteToken { token, signature } => {
                let req = waivers::find_request(&pool.conn, token)?
                    .ok_or(AppError::WaiverTokenInvalid)?;
                if req.user_id != user_id {
                    return Err(AppError::WaiverTokenInvalid);
                }
                Self::sign_remote(pool, token, signature, now)
            }
        }
    }

    /// Desk attestation: the adult signs, or the present guardian signs for a minor.
    pub fn complete_in_person(
        pool: &DbPool,
        user_id: i64,
        signer: &str,
        guardian_name: Option<&str>,
        now: DateTime<Utc>,
        ctx: &StaffContext,
    ) -> AppResult<User> {
        let user = get_user(&pool.conn, user_id)?;
        if user.waiver_signed {
            return Ok(user);
        }

        let mut errors = Vec::new();
        if signer.trim().is_empty() {
            errors.push("Signature name is required".to_string());
        }
        let guardian = non_empty(guardian_name);
        if user.is_minor && guardian.is_none() {
            errors.push("A present parent/guardian must enter their name".to_string());
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let tx = pool.conn.unchecked_transaction()?;
        mark_waiver_signed(&tx, user_id, if user.is_minor { guardian } else { None }, now)?;
        audit(
            &tx,
            ctx.actor(),
            "waiver_signed",
            &user_id.to_string(),
            &format!("In-person waiver signed by {}", signer.trim()),
        )?;
        tx.commit()?;

        info!(user_id, minor = user.is_minor, "waiver completed in person");
        get_user(&pool.conn, user_id)
    }

    /// Legacy remote flow: create a token and e-mail the guardian a signing link.
    #[allow(clippy::too_many_arguments)]
    pub fn request_guardian_waiver(
        pool: &DbPool,
        mailer: &dyn Mailer,
        user_id: i64,
        parent_email: Option<&str>,
        base_url: &str,
        ttl_days: i64,
        organization: &str,
        now: DateTime<Utc>,
        ctx: &StaffContext,
    ) -> AppResult<WaiverRequest> {
        let user = get_user(&pool.conn, user_id)?;
        if user.waiver_signed {
            return Err(AppError::Validation(vec![format!(
                "User {user_id} has already completed the waiver"
            )]));
        }

        let email = non_empty(parent_email)
            .or(non_empty(user.parent_email.as_deref()))
            .ok_or_else(|| {
                AppError::Validation(vec!["A parent/guardian e-mail is required".to_string()])
            })?
            .to_string();

        let req = WaiverRequest {
            token: generate_token(),
            user_id,
            parent_email: email.clone(),
            volunteer_name: user.name.clone(),
            status: WaiverStatus::Pending,
            parent_signature: None,
            expires_at: now + Duration::days(ttl_days.max(1)),
            signed_at: None,
            created_at: now,
        };
        // The token only exists if the guardian was actually mailed.
        let tx = pool.conn.unchecked_transaction()?;
        waivers::insert_request(&tx, &req)?;

        let data = TemplateData {
            organization: organization.to_string(),
            link: Some(waiver_link(base_url, &req.token)),
            volunteer_name: Some(user.name.clone()),
            expires_at: Some(req.expires_at),
            ..Default::default()
        };
        mailer.send(&email, EmailKind::WaiverRequest, &data)?;

        audit(
            &tx,
            ctx.actor(),
            "waiver_requested",
            &user_id.to_string(),
            &format!("Guardian waiver link sent to {email}"),
        )?;
        tx.commit()?;
        info!(user_id, "guardian waiver requested");
        Ok(req)
    }

    /// Resolve the public link. Consumed or expired tokens are terminal.
    pub fn resolve_waiver_link(
        pool: &DbPool,
        token: &str,
        now: DateTime<Utc>,
    ) -> AppResult<WaiverLink> {
        let req = waivers::find_request(&pool.conn, token.trim())?
            .ok_or(AppError::WaiverTokenInvalid)?;
        Ok(if req.is_usable(now) {
            WaiverLink::Form(req)
        } else {
            WaiverLink::Expired
        })
    }

    /// Accept the guardian's typed name as signature and mark the user signed.
    pub fn sign_remote(
        pool: &DbPool,
        token: &str,
        signature: &str,
        now: DateTime<Utc>,
    ) -> AppResult<User> {
        let signature = signature.trim();
        if signature.is_empty() {
            return Err(AppError::Validation(vec![
                "Signature name is required".to_string(),
            ]));
        }

        let req = match Self::resolve_waiver_link(pool, token, now)? {
            WaiverLink::Form(req) => req,
            WaiverLink::Expired => return Err(AppError::WaiverTokenExpired),
        };
        let user = get_user(&pool.conn, req.user_id)?;

        let tx = pool.conn.unchecked_transaction()?;
        if !waivers::mark_signed(&tx, &req.token, signature, now)? {
            warn!(user_id = req.user_id, "waiver token consumed concurrently");
            return Err(AppError::WaiverTokenExpired);
        }
        let guardian = user.parent_guardian_name.is_none().then_some(signature);
        mark_waiver_signed(&tx, req.user_id, guardian, now)?;
        audit(
            &tx,
            "guardian",
            "waiver_signed",
            &req.user_id.to_string(),
            &format!("Remote waiver signed by {signature}"),
        )?;
        tx.commit()?;

        info!(user_id = req.user_id, "waiver completed remotely");
        get_user(&pool.conn, req.user_id)
    }

    pub fn pending_requests(pool: &DbPool, user_id: i64) -> AppResult<Vec<WaiverRequest>> {
        waivers::load_pending_for_user(&pool.conn, user_id)
    }
}

pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

pub fn waiver_link(base_url: &str, token: &str) -> String {
    format!("{}/waiver/{}", base_url.trim_end_matches('/'), token)
}
