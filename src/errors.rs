//! Unified application error type.
//! Every module (db, core, export, cli) returns AppError so that the CLI can
//! surface one consistent message per failed operation.

use chrono::{DateTime, Utc};
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // Collaborators (store, files, mail)
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Database migration error: {0}")]
    Migration(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Email delivery failed: {0}")]
    Email(String),

    // ---------------------------
    // Validation
    // ---------------------------
    #[error("Validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Invalid time format: {0}")]
    InvalidTime(String),

    #[error("Invalid date range: {0}")]
    InvalidRange(String),

    #[error("Invalid weekday: {0}")]
    InvalidDay(String),

    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),

    // ---------------------------
    // State
    // ---------------------------
    #[error("User {0} not found")]
    UserNotFound(i64),

    #[error("Session {0} not found")]
    SessionNotFound(i64),

    #[error("User {0} is not checked in")]
    NotCheckedIn(i64),

    #[error("User {0} is already checked in")]
    AlreadyCheckedIn(i64),

    #[error("User {0} must complete the liability waiver before checking in")]
    WaiverRequired(i64),

    #[error("Waiver link is invalid")]
    WaiverTokenInvalid,

    #[error("Waiver link has expired or was already used")]
    WaiverTokenExpired,

    // ---------------------------
    // Authentication
    // ---------------------------
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Too many failed attempts, account locked until {until}")]
    AccountLocked { until: DateTime<Utc> },

    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    // ---------------------------
    // Config
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

pub type AppResult<T> = Result<T, AppError>;
