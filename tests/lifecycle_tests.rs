//! End-to-end scenarios against the library with an in-memory store and a
//! fixed clock.

use chrono::{DateTime, Duration, TimeZone, Utc};
use volunteerhub::core::analytics::AnalyticsLogic;
use volunteerhub::core::auto_checkout::AutoCheckoutLogic;
use volunteerhub::core::calculator::range::DateRange;
use volunteerhub::core::donations::DonationLogic;
use volunteerhub::core::registry::RegistryLogic;
use volunteerhub::core::sessions::SessionLogic;
use volunteerhub::core::waiver::{WaiverIntake, WaiverLink, WaiverLogic, WaiverState};
use volunteerhub::db::initialize::init_db;
use volunteerhub::db::pool::DbPool;
use volunteerhub::errors::AppError;
use volunteerhub::mail::OutboxMailer;
use volunteerhub::models::session::Session;
use volunteerhub::models::staff::StaffContext;
use volunteerhub::models::user::{NewUser, User};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 15, 0, 0).unwrap()
}

fn store() -> DbPool {
    let pool = DbPool::in_memory().unwrap();
    init_db(&pool.conn).unwrap();
    pool
}

fn adult(pool: &DbPool, name: &str, email: &str) -> User {
    let new = NewUser {
        name: name.into(),
        email: email.into(),
        phone: "555-123-4567".into(),
        date_of_birth: chrono::NaiveDate::from_ymd_opt(1988, 1, 20),
        ..Default::default()
    };
    let intake = WaiverIntake {
        accepted: true,
        ..Default::default()
    };
    RegistryLogic::register_user(pool, &new, Some(&intake), t0() - Duration::days(1), &StaffContext::Kiosk)
        .unwrap()
}

#[test]
fn volunteer_day_end_to_end() {
    let pool = store();
    let kiosk = StaffContext::Kiosk;
    let ann = adult(&pool, "Ann Lee", "ann@example.org");
    assert_eq!(WaiverState::of(&ann), WaiverState::WaiverComplete);

    SessionLogic::check_in(&pool, ann.id, t0(), &kiosk).unwrap();
    let out = SessionLogic::check_out(&pool, ann.id, t0() + Duration::minutes(75), &kiosk).unwrap();
    assert_eq!(out.total_hours, 1.25);
    assert!(!out.is_checked_in);
    assert!(out.last_check_in.is_none());

    let (_, ann) = DonationLogic::record_donation(&pool, ann.id, 3, t0() + Duration::minutes(80), &kiosk)
        .unwrap();
    assert_eq!(ann.total_bags, 3);

    let range = DateRange {
        start: t0(),
        end: t0() + Duration::hours(2),
    };
    let stats = AnalyticsLogic::range_stats(&pool, &range).unwrap();
    assert_eq!(stats.range_hours, 1.25);
    assert_eq!(stats.range_bags, 3);
    assert_eq!(stats.range_volunteers, 1);
    assert_eq!(stats.range_sessions, 1);

    let users = RegistryLogic::list_users(&pool, Default::default(), t0()).unwrap();
    let all = AnalyticsLogic::all_time_stats(&users);
    assert_eq!(all.total_hours, 1.25);
    assert_eq!(all.avg_bags_per_donor, 3.0);
}

#[test]
fn corrections_recompute_totals_from_rows() {
    let pool = store();
    let staff = StaffContext::System;
    let bob = adult(&pool, "Bob Stone", "bob@example.org");

    for day in 0..2 {
        let start = t0() + Duration::days(day);
        SessionLogic::check_in(&pool, bob.id, start, &staff).unwrap();
        SessionLogic::check_out(&pool, bob.id, start + Duration::hours(2), &staff).unwrap();
    }
    assert_eq!(RegistryLogic::get_user(&pool, bob.id).unwrap().total_hours, 4.0);

    let sessions = SessionLogic::user_sessions(&pool, bob.id).unwrap();
    let Some(Session::Closed(newest)) = sessions.first().cloned() else {
        panic!("expected a closed session");
    };
    let edited = SessionLogic::edit_session(
        &pool,
        newest.id,
        newest.check_in_time,
        newest.check_in_time + Duration::minutes(37),
        &staff,
    )
    .unwrap();
    assert_eq!(edited.hours_worked, 0.5);
    assert_eq!(RegistryLogic::get_user(&pool, bob.id).unwrap().total_hours, 2.5);

    let after = SessionLogic::delete_session(&pool, newest.id, &staff).unwrap();
    assert_eq!(after.total_hours, 2.0);
    assert_eq!(SessionLogic::recalculate_user_hours(&pool, bob.id).unwrap(), 2.0);
}

#[test]
fn auto_checkout_is_idempotent() {
    let pool = store();
    let ann = adult(&pool, "Ann Lee", "ann@example.org");
    let bob = adult(&pool, "Bob Stone", "bob@example.org");
    adult(&pool, "Cy Offline", "cy@example.org");
    for id in [ann.id, bob.id] {
        SessionLogic::check_in(&pool, id, t0(), &StaffContext::Kiosk).unwrap();
    }

    // Friday 18:30 in Chicago (23:30 UTC), default schedule ends at 18:00
    let evening = Utc.with_ymd_and_hms(2025, 3, 14, 23, 30, 0).unwrap();
    let (early, none) = AutoCheckoutLogic::run_if_due(
        &pool,
        "Office closed",
        &(evening - Duration::hours(5)),
        &StaffContext::System,
    )
    .unwrap();
    assert!(early.to_string().starts_with("Too early"));
    assert!(none.is_none());

    let (decision, report) =
        AutoCheckoutLogic::run_if_due(&pool, "Office closed", &evening, &StaffContext::System)
            .unwrap();
    assert_eq!(decision.to_string(), "Office hours have ended");
    let report = report.unwrap();
    assert_eq!(report.count(), 2);
    assert!(report.failures.is_empty());
    assert!(report.checked_out.iter().all(|u| u.total_hours == 8.5));

    let again =
        AutoCheckoutLogic::run_auto_checkout(&pool, "Office closed", evening, &StaffContext::System)
            .unwrap();
    assert_eq!(again.count(), 0);
    assert!(RegistryLogic::active_volunteers(&pool, evening).unwrap().is_empty());
}

#[test]
fn remote_guardian_waiver_unblocks_minor() {
    let pool = store();
    let new = NewUser {
        name: "Kid Kim".into(),
        email: "kid@example.org".into(),
        phone: "555 222 3333".into(),
        date_of_birth: chrono::NaiveDate::from_ymd_opt(2012, 9, 1),
        parent_email: Some("pat@example.org".into()),
        ..Default::default()
    };
    let intake = WaiverIntake {
        accepted: true,
        guardian_name: Some("Pat Kim".into()),
        guardian_present: false,
    };
    let kid = RegistryLogic::register_user(&pool, &new, Some(&intake), t0(), &StaffContext::Kiosk)
        .unwrap();
    assert_eq!(WaiverState::of(&kid), WaiverState::MinorWaiverPending);
    assert!(matches!(
        SessionLogic::check_in(&pool, kid.id, t0(), &StaffContext::Kiosk),
        Err(AppError::WaiverRequired(_))
    ));

    let req = {
        let mailer = OutboxMailer::new(&pool.conn, "noreply@example.org");
        WaiverLogic::request_guardian_waiver(
            &pool,
            &mailer,
            kid.id,
            None,
            "https://volunteer.example.org",
            7,
            "Food Bank",
            t0(),
            &StaffContext::Kiosk,
        )
        .unwrap()
    };
    assert_eq!(req.token.len(), 32);
    assert_eq!(req.parent_email, "pat@example.org");

    let late = t0() + Duration::days(8);
    assert_eq!(
        WaiverLogic::resolve_waiver_link(&pool, &req.token, late).unwrap(),
        WaiverLink::Expired
    );

    let signed = WaiverLogic::sign_remote(&pool, &req.token, "Pat Kim", t0() + Duration::hours(1))
        .unwrap();
    assert!(signed.waiver_signed);
    SessionLogic::check_in(&pool, kid.id, t0() + Duration::hours(2), &StaffContext::Kiosk).unwrap();
}
