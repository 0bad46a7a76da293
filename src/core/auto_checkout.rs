//! Scheduled force-checkout of everyone still on site after office hours.

use crate::core::sessions::SessionLogic;
use crate::db::log::audit;
use crate::db::pool::DbPool;
use crate::db::queries::load_checked_in;
use crate::db::settings::{load_setting, upsert_setting};
use crate::errors::{AppError, AppResult};
use crate::models::settings::{AUTO_CHECKOUT_KEY, AutoCheckoutSettings, DaySchedule, day_key};
use crate::models::staff::StaffContext;
use crate::models::user::User;
use crate::utils::time::validate_hhmm;
use chrono::{DateTime, Datelike, TimeZone, Utc, Weekday};
use std::fmt;
use tracing::{debug, info, warn};

/// Why the scheduler would or would not run at a given instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunDecision {
    Due,
    Disabled,
    DayDisabled(&'static str),
    TooEarly { now: String, end: String },
    UnknownTimezone(String),
}

impl fmt::Display for RunDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunDecision::Due => write!(f, "Office hours have ended"),
            RunDecision::Disabled => write!(f, "Auto-checkout disabled"),
            RunDecision::DayDisabled(day) => write!(f, "Not enabled for {day}"),
            RunDecision::TooEarly { now, end } => write!(f, "Too early: {now} < {end}"),
            RunDecision::UnknownTimezone(tz) => write!(f, "Unknown timezone '{tz}'"),
        }
    }
}

/// Outcome of one batch. Failures are reported per user and never abort
/// the batch.
#[derive(Debug, Default)]
pub struct AutoCheckoutReport {
    pub checked_out: Vec<User>,
    pub failures: Vec<(i64, String)>,
}

impl AutoCheckoutReport {
    pub fn count(&self) -> usize {
        self.checked_out.len()
    }
}

pub struct AutoCheckoutLogic;

impl AutoCheckoutLogic {
    /// Evaluate the schedule at `now`, converted to the settings' timezone.
    /// Times are compared as zero-padded "HH:MM" strings. An unknown zone
    /// never runs.
    pub fn decide<Tz: TimeZone>(settings: &AutoCheckoutSettings, now: &DateTime<Tz>) -> RunDecision {
        if !settings.enabled {
            return RunDecision::Disabled;
        }
        let Some(zone) = settings.zone() else {
            return RunDecision::UnknownTimezone(settings.timezone.clone());
        };
        let local = now.with_timezone(&zone);

        let day = local.weekday();
        let schedule = match settings.day(day) {
            Some(s) if s.enabled => s,
            _ => return RunDecision::DayDisabled(day_key(day)),
        };

        let current = local.format("%H:%M").to_string();
        if current.as_str() >= schedule.end_time.as_str() {
            RunDecision::Due
        } else {
            RunDecision::TooEarly {
                now: current,
                end: schedule.end_time.clone(),
            }
        }
    }

    pub fn should_run<Tz: TimeZone>(settings: &AutoCheckoutSettings, now: &DateTime<Tz>) -> bool {
        Self::decide(settings, now) == RunDecision::Due
    }

    /// Force-checkout every checked-in user. Safe to repeat: users already
    /// offline are skipped.
    pub fn run_auto_checkout(
        pool: &DbPool,
        reason: &str,
        now: DateTime<Utc>,
        ctx: &StaffContext,
    ) -> AppResult<AutoCheckoutReport> {
        let active = load_checked_in(&pool.conn)?;
        let mut report = AutoCheckoutReport::default();

        for user in active {
            match SessionLogic::force_check_out(pool, user.id, reason, now, ctx) {
                Ok(Some(u)) => report.checked_out.push(u),
                Ok(None) => debug!(user_id = user.id, "already checked out"),
                Err(e) => {
                    warn!(user_id = user.id, error = %e, "auto-checkout failed");
                    report.failures.push((user.id, e.to_string()));
                }
            }
        }

        if !report.checked_out.is_empty() || !report.failures.is_empty() {
            audit(
                &pool.conn,
                ctx.actor(),
                "auto_checkout",
                "",
                &format!(
                    "Auto-checked out {} volunteer(s), {} failure(s)",
                    report.count(),
                    report.failures.len()
                ),
            )?;
        }
        info!(
            checked_out = report.count(),
            failures = report.failures.len(),
            "auto-checkout finished"
        );
        Ok(report)
    }

    /// Scheduled trigger: load settings, run only when due.
    pub fn run_if_due<Tz: TimeZone>(
        pool: &DbPool,
        reason: &str,
        now: &DateTime<Tz>,
        ctx: &StaffContext,
    ) -> AppResult<(RunDecision, Option<AutoCheckoutReport>)> {
        let settings = Self::load_settings(pool)?;
        let decision = Self::decide(&settings, now);
        if let RunDecision::UnknownTimezone(tz) = &decision {
            warn!(timezone = %tz, "auto-checkout settings name an unknown timezone");
        } else if decision != RunDecision::Due {
            debug!(%decision, "auto-checkout skipped");
        }
        if decision != RunDecision::Due {
            return Ok((decision, None));
        }
        let report = Self::run_auto_checkout(pool, reason, now.with_timezone(&Utc), ctx)?;
        Ok((decision, Some(report)))
    }

    /// Stored settings, or the defaults when none were saved yet.
    pub fn load_settings(pool: &DbPool) -> AppResult<AutoCheckoutSettings> {
        match load_setting(&pool.conn, AUTO_CHECKOUT_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(AutoCheckoutSettings::default()),
        }
    }

    pub fn save_settings(
        pool: &DbPool,
        settings: &AutoCheckoutSettings,
        ctx: &StaffContext,
    ) -> AppResult<()> {
        if settings.zone().is_none() {
            return Err(AppError::InvalidTimezone(settings.timezone.clone()));
        }
        for (day, s) in &settings.schedule {
            check_window(day, s)?;
        }
        let raw = serde_json::to_string(settings)?;
        upsert_setting(&pool.conn, AUTO_CHECKOUT_KEY, &raw, Utc::now())?;
        audit(
            &pool.conn,
            ctx.actor(),
            "settings_update",
            AUTO_CHECKOUT_KEY,
            &format!("Auto-checkout settings saved (enabled: {})", settings.enabled),
        )?;
        Ok(())
    }

    pub fn set_enabled(pool: &DbPool, enabled: bool, ctx: &StaffContext) -> AppResult<AutoCheckoutSettings> {
        let mut settings = Self::load_settings(pool)?;
        settings.enabled = enabled;
        Self::save_settings(pool, &settings, ctx)?;
        Ok(settings)
    }

    pub fn set_timezone(
        pool: &DbPool,
        timezone: &str,
        ctx: &StaffContext,
    ) -> AppResult<AutoCheckoutSettings> {
        let mut settings = Self::load_settings(pool)?;
        settings.timezone = timezone.trim().to_string();
        Self::save_settings(pool, &settings, ctx)?;
        Ok(settings)
    }

    /// Replace one weekday's window.
    pub fn set_day(
        pool: &DbPool,
        day: Weekday,
        enabled: bool,
        start_time: &str,
        end_time: &str,
        ctx: &StaffContext,
    ) -> AppResult<AutoCheckoutSettings> {
        let entry = DaySchedule {
            enabled,
            start_time: validate_hhmm(start_time)?,
            end_time: validate_hhmm(end_time)?,
        };
        check_window(day_key(day), &entry)?;

        let mut settings = Self::load_settings(pool)?;
        settings.schedule.insert(day_key(day).to_string(), entry);
        Self::save_settings(pool, &settings, ctx)?;
        Ok(settings)
    }
}

fn check_window(day: &str, s: &DaySchedule) -> AppResult<()> {
    validate_hhmm(&s.start_time)?;
    validate_hhmm(&s.end_time)?;
    if s.start_time >= s.end_time {
        return Err(AppError::InvalidTime(format!(
            "{day}: start {} must be before end {}",
            s.start_time, s.end_time
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::initialize::init_db;
    use crate::db::queries::{WaiverFields, insert_user};
    use crate::models::user::NewUser;

    use chrono_tz::America::Chicago;

    // Wall time in Chicago (CDT, UTC-5). 2025-03-14 is a Friday, 2025-03-15 a Saturday.
    fn at(day: u32, h: u32, m: u32) -> DateTime<Utc> {
        Chicago
            .with_ymd_and_hms(2025, 3, day, h, m, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn setup() -> DbPool {
        let pool = DbPool::in_memory().unwrap();
        init_db(&pool.conn).unwrap();
        pool
    }

    fn volunteer(pool: &DbPool, email: &str) -> User {
        let nu = NewUser {
            name: email.into(),
            email: email.into(),
            phone: "5551234567".into(),
            ..Default::default()
        };
        let fields = WaiverFields {
            is_minor: false,
            guardian_name: None,
            waiver_signed_at: Some(at(14, 8, 0)),
        };
        insert_user(&pool.conn, &nu, &fields, at(14, 8, 0)).unwrap()
    }

    #[test]
    fn should_run_respects_schedule() {
        let s = AutoCheckoutSettings::default();
        assert!(!AutoCheckoutLogic::should_run(&s, &at(14, 17, 59)));
        assert!(AutoCheckoutLogic::should_run(&s, &at(14, 18, 0)));
        assert!(AutoCheckoutLogic::should_run(&s, &at(14, 18, 1)));
        // Saturday disabled by default
        assert_eq!(
            AutoCheckoutLogic::decide(&s, &at(15, 19, 0)),
            RunDecision::DayDisabled("saturday")
        );

        let off = AutoCheckoutSettings {
            enabled: false,
            ..Default::default()
        };
        assert!(!AutoCheckoutLogic::should_run(&off, &at(14, 23, 0)));
    }

    #[test]
    fn second_run_checks_out_nobody() {
        let pool = setup();
        let ctx = StaffContext::System;
        for email in ["a@example.org", "b@example.org"] {
            let u = volunteer(&pool, email);
            SessionLogic::check_in(&pool, u.id, at(14, 9, 0), &StaffContext::Kiosk).unwrap();
        }

        let now = at(14, 18, 1);
        let (decision, report) =
            AutoCheckoutLogic::run_if_due(&pool, "Auto-checkout: Office hours ended", &now, &ctx)
                .unwrap();
        assert_eq!(decision, RunDecision::Due);
        assert_eq!(report.unwrap().count(), 2);

        let again =
            AutoCheckoutLogic::run_auto_checkout(&pool, "Auto-checkout: Office hours ended", now, &ctx)
                .unwrap();
        assert_eq!(again.count(), 0);
        assert!(again.failures.is_empty());
    }

    #[test]
    fn empty_registry_is_noop() {
        let pool = setup();
        let r = AutoCheckoutLogic::run_auto_checkout(&pool, "x", at(14, 18, 0), &StaffContext::System)
            .unwrap();
        assert_eq!(r.count(), 0);
    }

    #[test]
    fn settings_round_trip_through_store() {
        let pool = setup();
        let ctx = StaffContext::System;
        assert_eq!(
            AutoCheckoutLogic::load_settings(&pool).unwrap(),
            AutoCheckoutSettings::default()
        );

        AutoCheckoutLogic::set_day(&pool, Weekday::Sat, true, "10:00", "14:00", &ctx).unwrap();
        let s = AutoCheckoutLogic::load_settings(&pool).unwrap();
        assert!(s.day(Weekday::Sat).unwrap().enabled);
        assert!(AutoCheckoutLogic::should_run(&s, &at(15, 14, 0)));

        assert!(AutoCheckoutLogic::set_day(&pool, Weekday::Sat, true, "14:00", "10:00", &ctx).is_err());
        assert!(AutoCheckoutLogic::set_day(&pool, Weekday::Sat, true, "9:00", "10:00", &ctx).is_err());

        let s = AutoCheckoutLogic::set_enabled(&pool, false, &ctx).unwrap();
        assert!(!s.enabled);
    }

    #[test]
    fn stored_json_uses_camel_case_fields() {
        let pool = setup();
        AutoCheckoutLogic::save_settings(&pool, &AutoCheckoutSettings::default(), &StaffContext::System)
            .unwrap();
        let raw = load_setting(&pool.conn, AUTO_CHECKOUT_KEY).unwrap().unwrap();
        assert!(raw.contains("\"endTime\":\"18:00\""));
    }

    #[test]
    fn schedule_is_read_in_settings_timezone() {
        let s = AutoCheckoutSettings::default();
        // 18:01 UTC is 13:01 in Chicago
        let utc_evening = Utc.with_ymd_and_hms(2025, 3, 14, 18, 1, 0).unwrap();
        assert_eq!(
            AutoCheckoutLogic::decide(&s, &utc_evening),
            RunDecision::TooEarly {
                now: "13:01".into(),
                end: "18:00".into()
            }
        );
        let chicago_close = Utc.with_ymd_and_hms(2025, 3, 14, 23, 0, 0).unwrap();
        assert!(AutoCheckoutLogic::should_run(&s, &chicago_close));

        // Saturday 01:00 UTC is still Friday evening in Chicago
        let late = Utc.with_ymd_and_hms(2025, 3, 15, 1, 0, 0).unwrap();
        assert!(AutoCheckoutLogic::should_run(&s, &late));

        let utc = AutoCheckoutSettings {
            timezone: "UTC".into(),
            ..Default::default()
        };
        assert!(AutoCheckoutLogic::should_run(&utc, &utc_evening));
        assert_eq!(
            AutoCheckoutLogic::decide(&utc, &late),
            RunDecision::DayDisabled("saturday")
        );
    }

    #[test]
    fn unknown_timezone_is_rejected_and_never_runs() {
        let pool = setup();
        let ctx = StaffContext::System;
        assert!(matches!(
            AutoCheckoutLogic::set_timezone(&pool, "Mars/Olympus", &ctx),
            Err(AppError::InvalidTimezone(_))
        ));

        let s = AutoCheckoutLogic::set_timezone(&pool, " Europe/Rome ", &ctx).unwrap();
        assert_eq!(s.timezone, "Europe/Rome");

        let broken = AutoCheckoutSettings {
            timezone: "Nowhere".into(),
            ..Default::default()
        };
        assert_eq!(
            AutoCheckoutLogic::decide(&broken, &at(14, 23, 0)),
            RunDecision::UnknownTimezone("Nowhere".into())
        );
    }
}
