use crate::core::calculator::range::DateWindow;
use crate::core::sessions::SessionLogic;
use crate::db::log::audit;
use crate::db::pool::DbPool;
use crate::db::queries::load_all_users;
use crate::errors::AppResult;
use crate::export::csv::write_rows;
use crate::export::filter::{ExportCandidate, ExportFilter, ExportRow};
use crate::export::fs_utils::{ensure_writable, resolve_output};
use crate::models::staff::StaffContext;
use chrono::{DateTime, TimeZone};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::info;

/// Where and what to export.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub window: DateWindow,
    pub filter: ExportFilter,
    pub file: Option<String>,
    pub dir: Option<String>,
    pub force: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub exported: usize,
    pub filtered_out: usize,
    pub failed: usize,
}

pub struct ExportLogic;

impl ExportLogic {
    /// Rows for the request without touching the filesystem.
    pub fn rows<Tz: TimeZone>(
        pool: &DbPool,
        window: &DateWindow,
        filter: &ExportFilter,
        now: &DateTime<Tz>,
    ) -> AppResult<(Vec<ExportRow>, usize)> {
        let users = load_all_users(&pool.conn)?;
        let today = now.date_naive();

        // Per-user hours inside the window; lifetime totals when there is none.
        let window_hours: Option<HashMap<i64, f64>> = match window.resolve(now) {
            None => None,
            Some(r) => {
                let mut acc = HashMap::new();
                for s in SessionLogic::sessions_in_range(pool, None, r.start, r.end)? {
                    *acc.entry(s.user_id).or_insert(0.0) += s.hours_worked;
                }
                Some(acc)
            }
        };

        let mut rows = Vec::new();
        let mut filtered_out = 0;
        for u in &users {
            let hours = match &window_hours {
                Some(map) => map.get(&u.id).copied().unwrap_or(0.0),
                None => u.total_hours,
            };
            let c = ExportCandidate::new(u, today, hours);
            if filter.matches(&c) {
                rows.push(ExportRow::from(&c));
            } else {
                filtered_out += 1;
            }
        }
        Ok((rows, filtered_out))
    }

    pub fn export<Tz: TimeZone>(
        pool: &DbPool,
        req: &ExportRequest,
        now: &DateTime<Tz>,
        ctx: &StaffContext,
    ) -> AppResult<ExportSummary> {
        let path = resolve_output(
            req.file.as_deref(),
            req.dir.as_deref(),
            &req.window.slug(),
            now.date_naive(),
        )?;
        ensure_writable(&path, req.force)?;

        let (rows, filtered_out) = Self::rows(pool, &req.window, &req.filter, now)?;
        let file = File::create(&path)?;
        let (exported, failed) = write_rows(BufWriter::new(file), &rows)?;

        audit(
            &pool.conn,
            ctx.actor(),
            "export",
            &path.display().to_string(),
            &format!(
                "Exported {exported} user(s) for {} ({failed} failed)",
                req.window.label()
            ),
        )?;
        info!(exported, filtered_out, failed, "csv export written");

        Ok(ExportSummary {
            path,
            exported,
            filtered_out,
            failed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::calculator::range::RangePreset;
    use crate::db::initialize::init_db;
    use crate::db::queries::{WaiverFields, insert_user, set_total_hours};
    use crate::db::sessions::insert_session;
    use crate::models::user::NewUser;
    use chrono::{Duration, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap()
    }

    fn seeded() -> DbPool {
        let pool = DbPool::in_memory().unwrap();
        init_db(&pool.conn).unwrap();
        for (name, email) in [("Ann", "ann@example.org"), ("Bob", "bob@example.org")] {
            let nu = NewUser {
                name: name.into(),
                email: email.into(),
                phone: "5551234567".into(),
                ..Default::default()
            };
            let f = WaiverFields {
                is_minor: false,
                guardian_name: None,
                waiver_signed_at: Some(now()),
            };
            insert_user(&pool.conn, &nu, &f, now() - Duration::days(60)).unwrap();
        }
        // Ann: 2h last month and 3h this month
        let feb = Utc.with_ymd_and_hms(2025, 2, 10, 9, 0, 0).unwrap();
        insert_session(&pool.conn, 1, feb, feb + Duration::hours(2), 2.0, None).unwrap();
        let mar = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
        insert_session(&pool.conn, 1, mar, mar + Duration::hours(3), 3.0, None).unwrap();
        set_total_hours(&pool.conn, 1, 5.0).unwrap();
        pool
    }

    #[test]
    fn window_hours_drive_the_hours_filter() {
        let pool = seeded();
        let filter = ExportFilter {
            min_hours: Some(1.0),
            ..Default::default()
        };

        let (rows, skipped) = ExportLogic::rows(
            &pool,
            &DateWindow::Preset(RangePreset::LastMonth),
            &filter,
            &now(),
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(skipped, 1);
        assert_eq!(rows[0].hours_in_period, 2.0);
        assert_eq!(rows[0].total_lifetime_hours, 5.0);

        let (rows, _) = ExportLogic::rows(&pool, &DateWindow::AllTime, &filter, &now()).unwrap();
        assert_eq!(rows[0].hours_in_period, 5.0);
    }

    #[test]
    fn export_writes_named_file_and_refuses_overwrite() {
        let pool = seeded();
        let dir = tempfile::tempdir().unwrap();
        let req = ExportRequest {
            window: DateWindow::Preset(RangePreset::LastMonth),
            filter: ExportFilter::default(),
            file: None,
            dir: Some(dir.path().to_string_lossy().to_string()),
            force: false,
        };

        let s = ExportLogic::export(&pool, &req, &now(), &StaffContext::System).unwrap();
        assert_eq!(s.exported, 2);
        assert_eq!(
            s.path.file_name().unwrap().to_string_lossy(),
            "volunteer-data-last_month-2025-03-15.csv"
        );
        let text = std::fs::read_to_string(&s.path).unwrap();
        assert_eq!(text.lines().count(), 3);

        if !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
            assert!(ExportLogic::export(&pool, &req, &now(), &StaffContext::System).is_err());
        }
        let forced = ExportRequest { force: true, ..req };
        assert!(ExportLogic::export(&pool, &forced, &now(), &StaffContext::System).is_ok());
    }
}
