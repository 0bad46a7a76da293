use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, warning};
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};

/// Check that `path` may be created or replaced.
///
/// An existing file is only replaced with `force`, or after an explicit
/// "yes" on an interactive terminal.
pub(crate) fn ensure_writable(path: &Path, force: bool) -> AppResult<()> {
    if !path.exists() || force {
        return Ok(());
    }

    warning(format!("The file '{}' already exists.", path.display()));

    if !io::stdin().is_terminal() {
        return Err(AppError::from(io::Error::other(
            "Export cancelled: file exists (use --force to overwrite)",
        )));
    }

    print!("Overwrite? [y/N]: ");
    io::stdout().flush().ok();

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;

    if matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes") {
        info("Existing file will be overwritten.");
        Ok(())
    } else {
        Err(AppError::from(io::Error::other(
            "Export cancelled: existing file not overwritten",
        )))
    }
}

/// `volunteer-data-<label>-<YYYY-MM-DD>.csv`
pub fn export_file_name(label: &str, date: chrono::NaiveDate) -> String {
    format!("volunteer-data-{}-{}.csv", label, date.format("%Y-%m-%d"))
}

/// An explicit file wins; otherwise the generated name inside `dir`
/// (current directory by default).
pub(crate) fn resolve_output(
    file: Option<&str>,
    dir: Option<&str>,
    label: &str,
    date: chrono::NaiveDate,
) -> AppResult<PathBuf> {
    if let Some(f) = file {
        return Ok(crate::utils::path::expand_tilde(f));
    }
    let base = match dir {
        Some(d) => crate::utils::path::expand_tilde(d),
        None => std::env::current_dir()?,
    };
    if !base.is_dir() {
        return Err(AppError::from(io::Error::other(format!(
            "Output directory does not exist: {}",
            base.display()
        ))));
    }
    Ok(base.join(export_file_name(label, date)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn file_name_encodes_window() {
        let d = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        assert_eq!(
            export_file_name("last_month", d),
            "volunteer-data-last_month-2025-03-15.csv"
        );
    }

    #[test]
    fn refuses_existing_file_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("out.csv");
        std::fs::write(&p, "x").unwrap();
        assert!(ensure_writable(&p, true).is_ok());
        // cargo test runs without a tty on stdin
        if !io::stdin().is_terminal() {
            assert!(ensure_writable(&p, false).is_err());
        }
    }
}
