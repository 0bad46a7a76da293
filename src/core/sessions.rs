//! Session accounting: check-in/out and session history edits.
//!
//! `total_hours` is a materialised aggregate. Every path that writes a
//! session row ends with [`SessionLogic::recalculate_user_hours`], which sums
//! the rows from scratch instead of patching the cached value.

use crate::core::calculator::hours::quarter_hours;
use crate::core::calculator::range::{end_of_day, start_of_day};
use crate::core::waiver::WaiverLogic;
use crate::db::log::audit;
use crate::db::pool::DbPool;
use crate::db::queries::{
    get_user, mark_checked_in, mark_checked_out, set_last_check_in, set_total_hours,
};
use crate::db::sessions;
use crate::errors::{AppError, AppResult};
use crate::models::session::{ClosedSession, Session};
use crate::models::staff::StaffContext;
use crate::models::user::User;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rusqlite::Connection;
use tracing::{debug, info};

pub struct SessionLogic;

impl SessionLogic {
    /// Start a session. Only the user's flags change; the row is written at
    /// check-out.
    pub fn check_in(
        pool: &DbPool,
        user_id: i64,
        now: DateTime<Utc>,
        ctx: &StaffContext,
    ) -> AppResult<User> {
        let user = get_user(&pool.conn, user_id)?;
        if user.is_checked_in {
            return Err(AppError::AlreadyCheckedIn(user_id));
        }
        WaiverLogic::gate_check_in(&user)?;

        // Guarded update: a concurrent check-in that won the race leaves
        // nothing to change here.
        if !mark_checked_in(&pool.conn, user_id, now)? {
            return Err(AppError::AlreadyCheckedIn(user_id));
        }

        audit(
            &pool.conn,
            ctx.actor(),
            "check_in",
            &user_id.to_string(),
            &format!("{} checked in", user.name),
        )?;
        info!(user_id, "checked in");
        get_user(&pool.conn, user_id)
    }

    pub fn check_out(
        pool: &DbPool,
        user_id: i64,
        now: DateTime<Utc>,
        ctx: &StaffContext,
    ) -> AppResult<User> {
        let user = get_user(&pool.conn, user_id)?;
        Self::close_active(pool, &user, now, None, ctx)?.ok_or(AppError::NotCheckedIn(user_id))
    }

    /// Like [`check_out`](Self::check_out) but tags the session with `reason`
    /// and returns `None` for a user who is not checked in.
    pub fn force_check_out(
        pool: &DbPool,
        user_id: i64,
        reason: &str,
        now: DateTime<Utc>,
        ctx: &StaffContext,
    ) -> AppResult<Option<User>> {
        let user = get_user(&pool.conn, user_id)?;
        Self::close_active(pool, &user, now, Some(reason), ctx)
    }

    fn close_active(
        pool: &DbPool,
        user: &User,
        now: DateTime<Utc>,
        notes: Option<&str>,
        ctx: &StaffContext,
    ) -> AppResult<Option<User>> {
        let since = match (user.is_checked_in, user.last_check_in) {
            (true, Some(since)) => since,
            _ => {
                debug!(user_id = user.id, "not checked in, nothing to close");
                return Ok(None);
            }
        };

        let hours = quarter_hours(since, now);

        let tx = pool.conn.unchecked_transaction()?;
        if !mark_checked_out(&tx, user.id, since)? {
            // Someone else closed this session between our read and write.
            return Ok(None);
        }
        let session = sessions::insert_session(&tx, user.id, since, now, hours, notes)?;
        let total = recompute(&tx, user.id)?;
        audit(
            &tx,
            ctx.actor(),
            if notes.is_some() { "force_check_out" } else { "check_out" },
            &user.id.to_string(),
            &format!(
                "{} checked out, session {} worth {:.2}h{}",
                user.name,
                session.id,
                hours,
                notes.map(|n| format!(" ({n})")).unwrap_or_default()
            ),
        )?;
        tx.commit()?;

        info!(user_id = user.id, session_id = session.id, hours, total, "checked out");
        get_user(&pool.conn, user.id).map(Some)
    }

    /// Replace a closed session's times; hours are re-rounded and the owner's
    /// total recomputed.
    pub fn edit_session(
        pool: &DbPool,
        session_id: i64,
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
        ctx: &StaffContext,
    ) -> AppResult<ClosedSession> {
        let before = sessions::get_session(&pool.conn, session_id)?;
        let hours = quarter_hours(check_in, check_out);

        let tx = pool.conn.unchecked_transaction()?;
        sessions::update_session_times(&tx, session_id, check_in, check_out, hours)?;
        let total = recompute(&tx, before.user_id)?;
        audit(
            &tx,
            ctx.actor(),
            "session_edit",
            &session_id.to_string(),
            &format!(
                "Session {} of user {}: {:.2}h -> {:.2}h",
                session_id, before.user_id, before.hours_worked, hours
            ),
        )?;
        tx.commit()?;

        info!(session_id, user_id = before.user_id, hours, total, "session edited");
        sessions::get_session(&pool.conn, session_id)
    }

    pub fn delete_session(pool: &DbPool, session_id: i64, ctx: &StaffContext) -> AppResult<User> {
        let before = sessions::get_session(&pool.conn, session_id)?;

        let tx = pool.conn.unchecked_transaction()?;
        if !sessions::delete_session(&tx, session_id)? {
            return Err(AppError::SessionNotFound(session_id));
        }
        let total = recompute(&tx, before.user_id)?;
        audit(
            &tx,
            ctx.actor(),
            "session_delete",
            &session_id.to_string(),
            &format!(
                "Deleted session {} ({:.2}h) of user {}",
                session_id, before.hours_worked, before.user_id
            ),
        )?;
        tx.commit()?;

        info!(session_id, user_id = before.user_id, total, "session deleted");
        get_user(&pool.conn, before.user_id)
    }

    /// The active session has no row; only its start can move.
    pub fn edit_active_session(
        pool: &DbPool,
        user_id: i64,
        new_check_in: DateTime<Utc>,
        ctx: &StaffContext,
    ) -> AppResult<User> {
        let user = get_user(&pool.conn, user_id)?;
        if !user.is_checked_in {
            return Err(AppError::NotCheckedIn(user_id));
        }
        if !set_last_check_in(&pool.conn, user_id, new_check_in)? {
            return Err(AppError::NotCheckedIn(user_id));
        }
        audit(
            &pool.conn,
            ctx.actor(),
            "session_edit_active",
            &user_id.to_string(),
            &format!("Active session start moved to {}", new_check_in.to_rfc3339()),
        )?;
        get_user(&pool.conn, user_id)
    }

    /// Sum every session row of the user and store it as `total_hours`.
    pub fn recalculate_user_hours(pool: &DbPool, user_id: i64) -> AppResult<f64> {
        get_user(&pool.conn, user_id)?;
        recompute(&pool.conn, user_id)
    }

    /// History for display: the active session first (if any), then closed
    /// sessions newest first.
    pub fn user_sessions(pool: &DbPool, user_id: i64) -> AppResult<Vec<Session>> {
        let user = get_user(&pool.conn, user_id)?;
        let mut out = Vec::new();
        if let (true, Some(since)) = (user.is_checked_in, user.last_check_in) {
            out.push(Session::Active {
                user_id,
                check_in_time: since,
            });
        }
        out.extend(
            sessions::load_user_sessions(&pool.conn, user_id)?
                .into_iter()
                .map(Session::Closed),
        );
        Ok(out)
    }

    pub fn sessions_in_range(
        pool: &DbPool,
        user_id: Option<i64>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<ClosedSession>> {
        sessions::load_sessions_in_range(&pool.conn, user_id, start, end)
    }

    /// Hours of sessions started on `date` in the calendar of `tz`.
    pub fn hours_for_date<Tz: TimeZone>(
        pool: &DbPool,
        user_id: i64,
        date: NaiveDate,
        tz: &Tz,
    ) -> AppResult<f64> {
        let rows = sessions::load_sessions_in_range(
            &pool.conn,
            Some(user_id),
            start_of_day(tz, date),
            end_of_day(tz, date),
        )?;
        Ok(rows.iter().map(|s| s.hours_worked).sum())
    }
}

fn recompute(conn: &Connection, user_id: i64) -> AppResult<f64> {
    let total = sessions::sum_user_hours(conn, user_id)?;
    set_total_hours(conn, user_id, total)?;
    debug!(user_id, total, "total_hours recomputed");
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::initialize::init_db;
    use crate::db::queries::{WaiverFields, insert_user};
    use crate::models::user::NewUser;
    use chrono::Duration;

    fn t(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 15, h, m, 0).unwrap()
    }

    fn setup() -> DbPool {
        let pool = DbPool::in_memory().unwrap();
        init_db(&pool.conn).unwrap();
        pool
    }

    fn volunteer(pool: &DbPool, signed: bool) -> User {
        let nu = NewUser {
            name: "Alex Helper".into(),
            email: "alex@example.org".into(),
            phone: "5551234567".into(),
            ..Default::default()
        };
        let fields = WaiverFields {
            is_minor: false,
            guardian_name: None,
            waiver_signed_at: signed.then_some(t(8, 0)),
        };
        insert_user(&pool.conn, &nu, &fields, t(8, 0)).unwrap()
    }

    #[test]
    fn checkout_rounds_and_totals() {
        let pool = setup();
        let u = volunteer(&pool, true);
        let ctx = StaffContext::Kiosk;

        SessionLogic::check_in(&pool, u.id, t(10, 0), &ctx).unwrap();
        let after = SessionLogic::check_out(&pool, u.id, t(10, 37), &ctx).unwrap();
        assert_eq!(after.total_hours, 0.5);
        assert!(!after.is_checked_in);
        assert!(after.last_check_in.is_none());

        SessionLogic::check_in(&pool, u.id, t(11, 0), &ctx).unwrap();
        let after = SessionLogic::check_out(&pool, u.id, t(11, 53), &ctx).unwrap();
        assert_eq!(after.total_hours, 1.5);
    }

    #[test]
    fn double_check_in_is_rejected() {
        let pool = setup();
        let u = volunteer(&pool, true);
        SessionLogic::check_in(&pool, u.id, t(10, 0), &StaffContext::Kiosk).unwrap();
        assert!(matches!(
            SessionLogic::check_in(&pool, u.id, t(10, 1), &StaffContext::Kiosk),
            Err(AppError::AlreadyCheckedIn(_))
        ));
        let user = get_user(&pool.conn, u.id).unwrap();
        assert_eq!(user.last_check_in, Some(t(10, 0)));
    }

    #[test]
    fn unsigned_waiver_blocks_check_in() {
        let pool = setup();
        let u = volunteer(&pool, false);
        assert!(matches!(
            SessionLogic::check_in(&pool, u.id, t(10, 0), &StaffContext::Kiosk),
            Err(AppError::WaiverRequired(_))
        ));
        assert!(!get_user(&pool.conn, u.id).unwrap().is_checked_in);
    }

    #[test]
    fn checkout_without_session_fails() {
        let pool = setup();
        let u = volunteer(&pool, true);
        assert!(matches!(
            SessionLogic::check_out(&pool, u.id, t(10, 0), &StaffContext::Kiosk),
            Err(AppError::NotCheckedIn(_))
        ));
    }

    #[test]
    fn force_checkout_is_noop_when_offline() {
        let pool = setup();
        let u = volunteer(&pool, true);
        let res =
            SessionLogic::force_check_out(&pool, u.id, "closing", t(18, 0), &StaffContext::System)
                .unwrap();
        assert!(res.is_none());
        assert_eq!(sessions::count_sessions(&pool.conn).unwrap(), 0);
        assert_eq!(get_user(&pool.conn, u.id).unwrap().total_hours, 0.0);
    }

    #[test]
    fn force_checkout_tags_notes() {
        let pool = setup();
        let u = volunteer(&pool, true);
        SessionLogic::check_in(&pool, u.id, t(9, 0), &StaffContext::Kiosk).unwrap();
        SessionLogic::force_check_out(&pool, u.id, "Office closed", t(18, 1), &StaffContext::System)
            .unwrap()
            .unwrap();
        let rows = sessions::load_user_sessions(&pool.conn, u.id).unwrap();
        assert_eq!(rows[0].notes.as_deref(), Some("Office closed"));
        assert_eq!(rows[0].hours_worked, 9.0);
    }

    #[test]
    fn edit_recomputes_from_all_rows() {
        let pool = setup();
        let u = volunteer(&pool, true);
        let ctx = StaffContext::System;
        let s1 = sessions::insert_session(&pool.conn, u.id, t(9, 0), t(10, 0), 1.0, None).unwrap();
        sessions::insert_session(&pool.conn, u.id, t(11, 0), t(13, 0), 2.0, None).unwrap();
        sessions::insert_session(&pool.conn, u.id, t(14, 0), t(14, 30), 0.5, None).unwrap();
        // Stale cache on purpose
        set_total_hours(&pool.conn, u.id, 99.0).unwrap();

        let edited = SessionLogic::edit_session(&pool, s1.id, t(9, 0), t(12, 15), &ctx).unwrap();
        assert_eq!(edited.hours_worked, 3.25);
        let user = get_user(&pool.conn, u.id).unwrap();
        assert_eq!(user.total_hours, 5.75);
        assert_eq!(user.total_hours, sessions::sum_user_hours(&pool.conn, u.id).unwrap());
    }

    #[test]
    fn delete_recomputes_total() {
        let pool = setup();
        let u = volunteer(&pool, true);
        let s1 = sessions::insert_session(&pool.conn, u.id, t(9, 0), t(10, 0), 1.0, None).unwrap();
        sessions::insert_session(&pool.conn, u.id, t(11, 0), t(13, 0), 2.0, None).unwrap();
        let user = SessionLogic::delete_session(&pool, s1.id, &StaffContext::System).unwrap();
        assert_eq!(user.total_hours, 2.0);
        assert!(matches!(
            SessionLogic::delete_session(&pool, s1.id, &StaffContext::System),
            Err(AppError::SessionNotFound(_))
        ));
    }

    #[test]
    fn active_session_is_listed_first_and_editable() {
        let pool = setup();
        let u = volunteer(&pool, true);
        sessions::insert_session(&pool.conn, u.id, t(8, 0), t(9, 0), 1.0, None).unwrap();
        SessionLogic::check_in(&pool, u.id, t(10, 0), &StaffContext::Kiosk).unwrap();

        let list = SessionLogic::user_sessions(&pool, u.id).unwrap();
        assert_eq!(list.len(), 2);
        assert!(list[0].is_active());

        let moved = SessionLogic::edit_active_session(
            &pool,
            u.id,
            t(10, 0) - Duration::minutes(30),
            &StaffContext::System,
        )
        .unwrap();
        assert_eq!(moved.last_check_in, Some(t(9, 30)));
    }

    #[test]
    fn hours_for_date_sums_that_day_only() {
        let pool = setup();
        let u = volunteer(&pool, true);
        sessions::insert_session(&pool.conn, u.id, t(9, 0), t(10, 0), 1.0, None).unwrap();
        let next = t(9, 0) + Duration::days(1);
        sessions::insert_session(&pool.conn, u.id, next, next + Duration::hours(2), 2.0, None)
            .unwrap();
        let day = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        assert_eq!(SessionLogic::hours_for_date(&pool, u.id, day, &Utc).unwrap(), 1.0);
    }
}
