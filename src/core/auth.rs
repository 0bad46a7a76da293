//! Staff accounts and password authentication with a per-account lockout.

use crate::core::registry::validate_contact;
use crate::db::log::audit;
use crate::db::pool::DbPool;
use crate::db::staff::{self, LoginAttempts, NewStaffRow};
use crate::errors::{AppError, AppResult};
use crate::mail::{EmailKind, Mailer, TemplateData};
use crate::models::staff::{StaffContext, StaffIdentity, StaffProfile, StaffRole};
use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use tracing::{info, warn};

pub const MIN_PASSWORD_LEN: usize = 8;
const TEMP_PASSWORD_LEN: usize = 12;

/// Consecutive failures allowed before an identifier is locked out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    pub max_attempts: i64,
    pub lockout: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lockout: Duration::minutes(15),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewStaff {
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub role: StaffRole,
}

/// Returned once on account creation; the password is never stored in clear.
#[derive(Debug, Clone)]
pub struct CreatedStaff {
    pub identity: StaffIdentity,
    pub temporary_password: String,
}

/// Argon2id PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Other(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, phc: &str) -> bool {
    match PasswordHash::new(phc) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!(error = %e, "stored password hash is unreadable");
            false
        }
    }
}

fn temporary_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TEMP_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

fn normalize(identifier: &str) -> String {
    identifier.trim().to_lowercase()
}

/// Counter key: the account when one matches, so username and e-mail share
/// one budget; otherwise the normalised identifier.
fn attempts_key(profile: Option<&StaffProfile>, normalized: &str) -> String {
    match profile {
        Some(p) => format!("staff:{}", p.id),
        None => normalized.to_string(),
    }
}

pub struct AuthLogic;

impl AuthLogic {
    /// Verify `secret` for a username or e-mail.
    ///
    /// Failures are counted per account whichever alias was typed, and per
    /// normalised identifier for names that match no account. While locked
    /// every attempt fails with `AccountLocked`, including the correct
    /// password.
    pub fn authenticate(
        pool: &DbPool,
        policy: &LockoutPolicy,
        identifier: &str,
        secret: &str,
        now: DateTime<Utc>,
    ) -> AppResult<StaffIdentity> {
        let normalized = normalize(identifier);
        if normalized.is_empty() || secret.is_empty() {
            return Err(AppError::InvalidCredentials);
        }

        let profile = staff::find_staff(&pool.conn, &normalized)?;
        let key = attempts_key(profile.as_ref(), &normalized);

        let mut attempts = staff::load_attempts(&pool.conn, &key)?;
        match attempts.locked_until {
            Some(until) if now < until => return Err(AppError::AccountLocked { until }),
            Some(_) => {
                // Lockout served; start counting afresh.
                staff::clear_attempts(&pool.conn, &key)?;
                attempts = LoginAttempts::default();
            }
            None => {}
        }

        let verified = profile.filter(|p| verify_password(secret, &p.password_hash));

        if let Some(profile) = verified {
            staff::clear_attempts(&pool.conn, &key)?;
            audit(
                &pool.conn,
                &profile.username,
                "staff_login",
                &profile.id.to_string(),
                "Signed in",
            )?;
            info!(staff_id = profile.id, "staff authenticated");
            return Ok(StaffIdentity::from(&profile));
        }

        attempts.failures += 1;
        if attempts.failures >= policy.max_attempts {
            attempts.locked_until = Some(now + policy.lockout);
        }
        staff::store_attempts(&pool.conn, &key, &attempts, now)?;
        warn!(failures = attempts.failures, "staff login failed");

        match attempts.locked_until {
            Some(until) => Err(AppError::AccountLocked { until }),
            None => Err(AppError::InvalidCredentials),
        }
    }

    /// Create a staff account with a random temporary password and queue an
    /// invite. Only admins and staff may do this, except for the very first
    /// account of an empty installation.
    pub fn create_staff_account(
        pool: &DbPool,
        mailer: &dyn Mailer,
        ctx: &StaffContext,
        new: &NewStaff,
        organization: &str,
        now: DateTime<Utc>,
    ) -> AppResult<CreatedStaff> {
        let bootstrap = staff::count_staff(&pool.conn)? == 0;
        if !bootstrap {
            match ctx.identity() {
                Some(id) if id.role.can_create_staff() => {}
                Some(id) => {
                    return Err(AppError::NotAuthorized(format!(
                        "role '{}' cannot create staff accounts",
                        id.role.to_db_str()
                    )));
                }
                None => {
                    return Err(AppError::NotAuthorized(
                        "staff access required".to_string(),
                    ));
                }
            }
        }

        let username = new.username.trim();
        let email = new.email.trim();
        let display_name = new.display_name.trim();

        let mut errors = Vec::new();
        if username.len() < 3
            || !username
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        {
            errors.push(
                "Username must be at least 3 characters of letters, digits, '.', '_' or '-'"
                    .to_string(),
            );
        }
        // Staff have no phone on file; reuse the contact rules for name/email.
        errors.extend(
            validate_contact(display_name, email, "0000000000", None, now.date_naive()),
        );
        if errors.is_empty() && staff::username_taken(&pool.conn, username)? {
            errors.push("Username already exists".to_string());
        }
        if errors.is_empty() && staff::find_staff(&pool.conn, email)?.is_some() {
            errors.push("Email already belongs to a staff account".to_string());
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let password = temporary_password();
        let hash = hash_password(&password)?;

        let tx = pool.conn.unchecked_transaction()?;
        let id = staff::insert_staff(
            &tx,
            &NewStaffRow {
                username,
                email,
                display_name,
                role: new.role,
                hash: &hash,
            },
            now,
        )?;
        let data = TemplateData {
            organization: organization.to_string(),
            recipient_name: Some(display_name.to_string()),
            temporary_password: Some(password.clone()),
            ..Default::default()
        };
        mailer.send(email, EmailKind::Invite, &data)?;
        audit(
            &tx,
            ctx.actor(),
            "staff_create",
            &id.to_string(),
            &format!("Created {} account '{}'", new.role.to_db_str(), username),
        )?;
        tx.commit()?;

        let profile = staff::find_staff(&pool.conn, username)?
            .ok_or_else(|| AppError::Other(format!("staff account {username} vanished")))?;
        info!(staff_id = id, bootstrap, "staff account created");

        Ok(CreatedStaff {
            identity: StaffIdentity::from(&profile),
            temporary_password: password,
        })
    }

    /// Set a new password for the signed-in staff member and clear the
    /// first-login flag.
    pub fn change_password(
        pool: &DbPool,
        ctx: &StaffContext,
        new_password: &str,
    ) -> AppResult<StaffIdentity> {
        let me = ctx
            .identity()
            .ok_or_else(|| AppError::NotAuthorized("staff access required".to_string()))?;

        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(vec![format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )]));
        }

        staff::update_password(&pool.conn, me.id, &hash_password(new_password)?)?;
        audit(
            &pool.conn,
            &me.username,
            "staff_password",
            &me.id.to_string(),
            "Password changed",
        )?;

        let profile = staff::find_staff(&pool.conn, &me.username)?
            .ok_or_else(|| AppError::NotAuthorized(format!("unknown staff '{}'", me.username)))?;
        Ok(StaffIdentity::from(&profile))
    }
}
