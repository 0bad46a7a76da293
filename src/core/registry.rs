//! User registry: registration, lookup, staff edits and removal.

use crate::core::calculator::age::is_minor;
use crate::core::waiver::{WaiverIntake, WaiverLogic};
use crate::db::log::audit;
use crate::db::pool::DbPool;
use crate::db::queries::{self, WaiverFields};
use crate::errors::{AppError, AppResult};
use crate::models::staff::StaffContext;
use crate::models::user::{NewUser, User, UserListFilter, UserPatch};
use crate::utils::time::format_minutes;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use regex::Regex;
use std::sync::LazyLock;
use tracing::info;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[\d\s\-\(\)]{10,20}$").expect("valid phone regex"));

const NAME_MAX: usize = 100;
const RECENT_DAYS: i64 = 7;

/// A checked-in user with the time spent on site so far.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveVolunteer {
    pub user: User,
    pub since: DateTime<Utc>,
    pub elapsed_minutes: i64,
}

impl ActiveVolunteer {
    /// "HHh MMm"
    pub fn elapsed_label(&self) -> String {
        format_minutes(self.elapsed_minutes)
    }
}

pub struct RegistryLogic;

pub fn validate_contact(
    name: &str,
    email: &str,
    phone: &str,
    date_of_birth: Option<NaiveDate>,
    today: NaiveDate,
) -> Vec<String> {
    let mut errors = Vec::new();

    let name_len = name.trim().chars().count();
    if name_len == 0 {
        errors.push("Name is required".to_string());
    } else if name_len > NAME_MAX {
        errors.push(format!("Name must be at most {NAME_MAX} characters"));
    }
    if !EMAIL_RE.is_match(email.trim()) {
        errors.push(format!("Invalid email address '{}'", email.trim()));
    }
    if !PHONE_RE.is_match(phone.trim()) {
        errors.push(format!("Invalid phone number '{}'", phone.trim()));
    }
    if let Some(dob) = date_of_birth
        && dob > today
    {
        errors.push("Date of birth cannot be in the future".to_string());
    }
    errors
}

impl RegistryLogic {
    /// Validate and insert a new user.
    ///
    /// `waiver` carries the registration form's waiver answers; `None`
    /// registers a donor, whose waiver stays open until a volunteer check-in
    /// requires it.
    pub fn register_user(
        pool: &DbPool,
        new: &NewUser,
        waiver: Option<&WaiverIntake>,
        now: DateTime<Utc>,
        ctx: &StaffContext,
    ) -> AppResult<User> {
        let today = now.date_naive();
        let mut errors = validate_contact(
            &new.name,
            &new.email,
            &new.phone,
            new.date_of_birth,
            today,
        );
        if let Some(pe) = new.parent_email.as_deref().map(str::trim)
            && !pe.is_empty()
            && !EMAIL_RE.is_match(pe)
        {
            errors.push(format!("Invalid parent/guardian email '{pe}'"));
        }

        let minor = is_minor(new.date_of_birth, today);
        let fields = match waiver {
            Some(intake) => match WaiverLogic::intake_fields(intake, minor, now) {
                Ok(f) => Some(f),
                Err(AppError::Validation(mut more)) => {
                    errors.append(&mut more);
                    None
                }
                Err(e) => return Err(e),
            },
            None => Some(WaiverFields {
                is_minor: minor,
                guardian_name: None,
                waiver_signed_at: None,
            }),
        };

        let fields = match fields {
            Some(f) if errors.is_empty() => f,
            _ => return Err(AppError::Validation(errors)),
        };

        let user = queries::insert_user(&pool.conn, new, &fields, now)?;
        audit(
            &pool.conn,
            ctx.actor(),
            "user_register",
            &user.id.to_string(),
            &format!(
                "Registered {}{}",
                user.name,
                if user.is_minor { " (minor)" } else { "" }
            ),
        )?;
        info!(user_id = user.id, minor = user.is_minor, "user registered");
        Ok(user)
    }

    pub fn find_users(pool: &DbPool, term: &str) -> AppResult<Vec<User>> {
        if term.trim().is_empty() {
            return Ok(Vec::new());
        }
        queries::search_users(&pool.conn, term)
    }

    /// Dashboard list: checked-in users first, then by name.
    pub fn list_users(
        pool: &DbPool,
        filter: UserListFilter,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<User>> {
        let recent_cutoff = now - Duration::days(RECENT_DAYS);
        let mut users: Vec<User> = queries::load_all_users(&pool.conn)?
            .into_iter()
            .filter(|u| match filter {
                UserListFilter::All => true,
                UserListFilter::Volunteers => u.total_hours > 0.0,
                UserListFilter::Donors => u.total_bags > 0,
                UserListFilter::Active => u.is_checked_in,
                UserListFilter::Recent => u.created_at >= recent_cutoff,
            })
            .collect();

        users.sort_by(|a, b| {
            b.is_checked_in
                .cmp(&a.is_checked_in)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
        Ok(users)
    }

    pub fn get_user(pool: &DbPool, id: i64) -> AppResult<User> {
        queries::get_user(&pool.conn, id)
    }

    pub fn update_user_info(
        pool: &DbPool,
        id: i64,
        patch: &UserPatch,
        now: DateTime<Utc>,
        ctx: &StaffContext,
    ) -> AppResult<User> {
        let current = queries::get_user(&pool.conn, id)?;
        let today = now.date_naive();

        let dob = patch.date_of_birth.or(current.date_of_birth);
        let errors = validate_contact(
            patch.name.as_deref().unwrap_or(&current.name),
            patch.email.as_deref().unwrap_or(&current.email),
            patch.phone.as_deref().unwrap_or(&current.phone),
            dob,
            today,
        );
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let minor = if dob.is_some() {
            is_minor(dob, today)
        } else {
            current.is_minor
        };
        let user = queries::update_user(&pool.conn, id, patch, minor)?;
        audit(
            &pool.conn,
            ctx.actor(),
            "user_update",
            &id.to_string(),
            &format!("Updated profile of {}", user.name),
        )?;
        Ok(user)
    }

    /// Remove the user; sessions, donations and waiver requests go with it.
    pub fn delete_user(pool: &DbPool, id: i64, ctx: &StaffContext) -> AppResult<()> {
        let user = queries::get_user(&pool.conn, id)?;
        let tx = pool.conn.unchecked_transaction()?;
        if !queries::delete_user(&tx, id)? {
            return Err(AppError::UserNotFound(id));
        }
        audit(
            &tx,
            ctx.actor(),
            "user_delete",
            &id.to_string(),
            &format!(
                "Deleted {} ({:.2}h, {} bags)",
                user.name, user.total_hours, user.total_bags
            ),
        )?;
        tx.commit()?;
        info!(user_id = id, "user deleted");
        Ok(())
    }

    pub fn communication_list(pool: &DbPool) -> AppResult<Vec<User>> {
        queries::load_communication_list(&pool.conn)
    }

    /// Checked-in users, longest on site first.
    pub fn active_volunteers(pool: &DbPool, now: DateTime<Utc>) -> AppResult<Vec<ActiveVolunteer>> {
        let mut out: Vec<ActiveVolunteer> = queries::load_checked_in(&pool.conn)?
            .into_iter()
            .filter_map(|u| {
                let since = u.last_check_in?;
                Some(ActiveVolunteer {
                    elapsed_minutes: (now - since).num_minutes(),
                    since,
                    user: u,
                })
            })
            .collect();
        out.sort_by(|a, b| b.elapsed_minutes.cmp(&a.elapsed_minutes));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sessions::SessionLogic;
    use crate::db::initialize::init_db;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 15, 10, 0, 0).unwrap()
    }

    fn setup() -> DbPool {
        let pool = DbPool::in_memory().unwrap();
        init_db(&pool.conn).unwrap();
        pool
    }

    fn form(name: &str, email: &str, dob: Option<NaiveDate>) -> NewUser {
        NewUser {
            name: name.into(),
            email: email.into(),
            phone: "(555) 123-4567".into(),
            profession: "Teacher".into(),
            date_of_birth: dob,
            ..Default::default()
        }
    }

    fn accepted() -> WaiverIntake {
        WaiverIntake {
            accepted: true,
            ..Default::default()
        }
    }

    #[test]
    fn adult_registration_signs_waiver() {
        let pool = setup();
        let u = RegistryLogic::register_user(
            &pool,
            &form("Ada", "ada@example.org", NaiveDate::from_ymd_opt(1990, 1, 1)),
            Some(&accepted()),
            now(),
            &StaffContext::Kiosk,
        )
        .unwrap();
        assert!(u.waiver_signed);
        assert!(!u.is_minor);
        assert_eq!(u.total_hours, 0.0);
        assert!(!u.is_checked_in);
    }

    #[test]
    fn validation_collects_every_error() {
        let pool = setup();
        let mut bad = form("", "not-an-email", NaiveDate::from_ymd_opt(2030, 1, 1));
        bad.phone = "12".into();
        let err = RegistryLogic::register_user(&pool, &bad, Some(&accepted()), now(), &StaffContext::Kiosk)
            .unwrap_err();
        match err {
            AppError::Validation(list) => assert_eq!(list.len(), 4),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(queries::count_users(&pool.conn).unwrap(), 0);
    }

    #[test]
    fn remote_minor_waits_for_guardian() {
        let pool = setup();
        let intake = WaiverIntake {
            accepted: true,
            guardian_name: Some("Pat".into()),
            guardian_present: false,
        };
        let u = RegistryLogic::register_user(
            &pool,
            &form("Kid", "kid@example.org", NaiveDate::from_ymd_opt(2012, 1, 1)),
            Some(&intake),
            now(),
            &StaffContext::Kiosk,
        )
        .unwrap();
        assert!(u.is_minor);
        assert!(!u.waiver_signed);
        assert_eq!(u.parent_guardian_name.as_deref(), Some("Pat"));
    }

    #[test]
    fn list_puts_checked_in_first() {
        let pool = setup();
        let ctx = StaffContext::Kiosk;
        let a = RegistryLogic::register_user(&pool, &form("Zed", "z@example.org", None), Some(&accepted()), now(), &ctx).unwrap();
        RegistryLogic::register_user(&pool, &form("Amy", "a@example.org", None), Some(&accepted()), now(), &ctx).unwrap();
        SessionLogic::check_in(&pool, a.id, now(), &ctx).unwrap();

        let all = RegistryLogic::list_users(&pool, UserListFilter::All, now()).unwrap();
        assert_eq!(all[0].name, "Zed");
        assert_eq!(all[1].name, "Amy");

        let active = RegistryLogic::list_users(&pool, UserListFilter::Active, now()).unwrap();
        assert_eq!(active.len(), 1);

        let later = now() + Duration::days(8);
        assert!(RegistryLogic::list_users(&pool, UserListFilter::Recent, later).unwrap().is_empty());
    }

    #[test]
    fn search_is_case_insensitive() {
        let pool = setup();
        RegistryLogic::register_user(&pool, &form("Grace Hopper", "grace@navy.mil", None), None, now(), &StaffContext::Kiosk).unwrap();
        assert_eq!(RegistryLogic::find_users(&pool, "HOPPER").unwrap().len(), 1);
        assert_eq!(RegistryLogic::find_users(&pool, "NAVY").unwrap().len(), 1);
        assert!(RegistryLogic::find_users(&pool, "  ").unwrap().is_empty());
    }

    #[test]
    fn search_wildcards_match_literally() {
        let pool = setup();
        let ctx = StaffContext::Kiosk;
        RegistryLogic::register_user(&pool, &form("Underscore", "a_b@example.org", None), None, now(), &ctx).unwrap();
        RegistryLogic::register_user(&pool, &form("Plain", "axb@example.org", None), None, now(), &ctx).unwrap();

        let hits = RegistryLogic::find_users(&pool, "a_b").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].email, "a_b@example.org");
        assert!(RegistryLogic::find_users(&pool, "100%").unwrap().is_empty());
    }

    #[test]
    fn delete_cascades_sessions() {
        let pool = setup();
        let ctx = StaffContext::System;
        let u = RegistryLogic::register_user(&pool, &form("Ada", "ada@example.org", None), Some(&accepted()), now(), &ctx).unwrap();
        SessionLogic::check_in(&pool, u.id, now(), &ctx).unwrap();
        SessionLogic::check_out(&pool, u.id, now() + Duration::hours(1), &ctx).unwrap();

        RegistryLogic::delete_user(&pool, u.id, &ctx).unwrap();
        assert_eq!(crate::db::sessions::count_sessions(&pool.conn).unwrap(), 0);
        assert!(matches!(
            RegistryLogic::get_user(&pool, u.id),
            Err(AppError::UserNotFound(_))
        ));
    }

    #[test]
    fn active_volunteers_longest_first() {
        let pool = setup();
        let ctx = StaffContext::Kiosk;
        let a = RegistryLogic::register_user(&pool, &form("Ann", "ann@example.org", None), Some(&accepted()), now(), &ctx).unwrap();
        let b = RegistryLogic::register_user(&pool, &form("Bob", "bob@example.org", None), Some(&accepted()), now(), &ctx).unwrap();
        SessionLogic::check_in(&pool, a.id, now(), &ctx).unwrap();
        SessionLogic::check_in(&pool, b.id, now() - Duration::minutes(75), &ctx).unwrap();

        let list = RegistryLogic::active_volunteers(&pool, now()).unwrap();
        assert_eq!(list[0].user.name, "Bob");
        assert_eq!(list[0].elapsed_label(), "01h 15m");
    }
}
