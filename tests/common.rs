#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use std::path::PathBuf;
use tempfile::TempDir;

pub const ADMIN: &str = "admin";

/// Isolated installation: its own HOME (so the config file lives in a temp
/// dir) and its own database file.
pub struct Site {
    pub home: TempDir,
    pub db: String,
}

impl Site {
    pub fn new() -> Self {
        let home = tempfile::tempdir().expect("temp home");
        let db = home
            .path()
            .join("test_volunteerhub.sqlite")
            .to_string_lossy()
            .to_string();
        Self { home, db }
    }

    /// Fresh site with `init` already run.
    pub fn init() -> Self {
        let site = Self::new();
        site.vh().arg("init").assert().success();
        site
    }

    /// The binary with `--db` and a private HOME.
    pub fn vh(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("volunteerhub");
        cmd.env("HOME", self.home.path())
            .env("NO_COLOR", "1")
            .env_remove("VOLUNTEERHUB_PASSWORD")
            .env_remove("VOLUNTEERHUB_NEW_PASSWORD")
            .args(["--db", &self.db]);
        cmd
    }

    /// Run as an authenticated staff member.
    pub fn as_staff(&self, user: &str, password: &str) -> Command {
        let mut cmd = self.vh();
        cmd.env("VOLUNTEERHUB_PASSWORD", password)
            .args(["--staff", user]);
        cmd
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.home.path().join(name)
    }

    /// Create the bootstrap admin and return its temporary password.
    pub fn bootstrap_admin(&self) -> String {
        let out = self
            .vh()
            .args([
                "staff",
                "create",
                "--username",
                ADMIN,
                "--email",
                "admin@example.org",
                "--name",
                "Site Admin",
                "--role",
                "admin",
            ])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        temporary_password(&String::from_utf8_lossy(&out))
    }

    /// Register an adult volunteer who accepted the waiver.
    pub fn register_adult(&self, name: &str, email: &str) {
        self.vh()
            .args([
                "user",
                "register",
                "--name",
                name,
                "--email",
                email,
                "--phone",
                "555-123-4567",
                "--profession",
                "Teacher",
                "--dob",
                "1990-04-12",
                "--accept-waiver",
            ])
            .assert()
            .success();
    }
}

/// Pull the password out of the `staff create` output.
pub fn temporary_password(stdout: &str) -> String {
    stdout
        .lines()
        .find(|l| l.contains("Temporary password:"))
        .and_then(|l| l.split_whitespace().last())
        .expect("temporary password line")
        .to_string()
}
