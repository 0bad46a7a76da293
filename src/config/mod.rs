use crate::core::auth::LockoutPolicy;
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const APP_DIR: &str = ".volunteerhub";
const CONFIG_FILE: &str = "volunteerhub.conf";
const DB_FILE: &str = "volunteerhub.sqlite";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_organization")]
    pub organization_name: String,
    /// Lifetime of a remote guardian waiver link.
    #[serde(default = "default_waiver_ttl")]
    pub waiver_token_ttl_days: i64,
    #[serde(default = "default_max_attempts")]
    pub login_max_attempts: i64,
    #[serde(default = "default_lockout_minutes")]
    pub login_lockout_minutes: i64,
    /// Prefix of the public `/waiver/<token>` link.
    #[serde(default = "default_public_url")]
    pub public_base_url: String,
    #[serde(default = "default_mail_from")]
    pub mail_from: String,
    /// Note written on sessions closed by the scheduler.
    #[serde(default = "default_auto_checkout_reason")]
    pub auto_checkout_reason: String,
}

fn default_database() -> String {
    Config::database_file().to_string_lossy().to_string()
}
fn default_organization() -> String {
    "VolunteerHub".to_string()
}
fn default_waiver_ttl() -> i64 {
    7
}
fn default_max_attempts() -> i64 {
    5
}
fn default_lockout_minutes() -> i64 {
    15
}
fn default_public_url() -> String {
    "http://localhost:3000".to_string()
}
fn default_mail_from() -> String {
    "noreply@volunteerhub.local".to_string()
}
fn default_auto_checkout_reason() -> String {
    "Auto-checkout: Office hours ended".to_string()
}

/// Keys written by `init`, used by `config --check`.
pub const KNOWN_FIELDS: [&str; 8] = [
    "database",
    "organization_name",
    "waiver_token_ttl_days",
    "login_max_attempts",
    "login_lockout_minutes",
    "public_base_url",
    "mail_from",
    "auto_checkout_reason",
];

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            organization_name: default_organization(),
            waiver_token_ttl_days: default_waiver_ttl(),
            login_max_attempts: default_max_attempts(),
            login_lockout_minutes: default_lockout_minutes(),
            public_base_url: default_public_url(),
            mail_from: default_mail_from(),
            auto_checkout_reason: default_auto_checkout_reason(),
        }
    }
}

impl Config {
    /// Platform configuration directory
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            let appdata = env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(appdata).join("volunteerhub")
        } else {
            let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(APP_DIR)
        }
    }

    pub fn config_file() -> PathBuf {
        Self::config_dir().join(CONFIG_FILE)
    }

    pub fn database_file() -> PathBuf {
        Self::config_dir().join(DB_FILE)
    }

    /// Load the config file, or defaults when it doesn't exist yet.
    pub fn load() -> AppResult<Self> {
        Self::load_from(&Self::config_file())
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.login_max_attempts < 1 {
            return Err(AppError::Config("login_max_attempts must be >= 1".into()));
        }
        if self.login_lockout_minutes < 1 {
            return Err(AppError::Config("login_lockout_minutes must be >= 1".into()));
        }
        if self.waiver_token_ttl_days < 1 {
            return Err(AppError::Config("waiver_token_ttl_days must be >= 1".into()));
        }
        Ok(())
    }

    pub fn lockout_policy(&self) -> LockoutPolicy {
        LockoutPolicy {
            max_attempts: self.login_max_attempts,
            lockout: chrono::Duration::minutes(self.login_lockout_minutes),
        }
    }

    /// Fields absent from the file on disk (they silently take defaults).
    pub fn missing_fields(path: &Path) -> AppResult<Vec<&'static str>> {
        if !path.exists() {
            return Ok(KNOWN_FIELDS.to_vec());
        }
        let content = fs::read_to_string(path)?;
        let value: serde_yaml::Value = serde_yaml::from_str(&content)?;
        let map = value.as_mapping();

        Ok(KNOWN_FIELDS
            .iter()
            .copied()
            .filter(|k| {
                map.is_none_or(|m| !m.contains_key(serde_yaml::Value::String((*k).to_string())))
            })
            .collect())
    }

    /// Create the config directory, write the config file and make sure the
    /// database file exists. Returns the database path.
    pub fn init_all(custom_db: Option<&str>) -> AppResult<PathBuf> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir)?;

        let db_path = match custom_db {
            Some(name) => {
                let p = Path::new(name);
                if p.is_absolute() {
                    p.to_path_buf()
                } else {
                    dir.join(p)
                }
            }
            None => dir.join(DB_FILE),
        };

        let path = Self::config_file();
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            Self::default()
        };
        config.database = db_path.to_string_lossy().to_string();

        let yaml = serde_yaml::to_string(&config)?;
        let mut file = fs::File::create(&path)?;
        file.write_all(yaml.as_bytes())?;

        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(db_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_takes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("volunteerhub.conf");
        fs::write(&path, "database: /tmp/x.sqlite\norganization_name: Food Bank\n").unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.database, "/tmp/x.sqlite");
        assert_eq!(cfg.login_max_attempts, 5);
        assert_eq!(cfg.auto_checkout_reason, "Auto-checkout: Office hours ended");

        let missing = Config::missing_fields(&path).unwrap();
        assert!(missing.contains(&"login_lockout_minutes"));
        assert!(!missing.contains(&"database"));
    }

    #[test]
    fn invalid_policy_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("volunteerhub.conf");
        fs::write(&path, "login_max_attempts: 0\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(AppError::Config(_))));
    }
}
