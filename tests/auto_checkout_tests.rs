use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

mod common;
use common::{ADMIN, Site};

#[test]
fn default_schedule_is_weekdays_nine_to_six() {
    let site = Site::init();

    site.vh()
        .args(["auto-checkout", "show"])
        .assert()
        .success()
        .stdout(
            contains("America/Chicago")
                .and(contains("monday"))
                .and(contains("18:00")),
        );
}

#[test]
fn settings_changes_need_staff_and_valid_times() {
    let site = Site::init();
    let password = site.bootstrap_admin();

    site.vh()
        .args(["auto-checkout", "disable"])
        .assert()
        .failure();

    site.as_staff(ADMIN, &password)
        .args(["auto-checkout", "set-day", "sat", "--start", "10:00", "--end", "9:00"])
        .assert()
        .failure()
        .stderr(contains("Invalid time format"));

    site.as_staff(ADMIN, &password)
        .args(["auto-checkout", "set-day", "sat", "--start", "14:00", "--end", "10:00"])
        .assert()
        .failure();

    site.as_staff(ADMIN, &password)
        .args(["auto-checkout", "set-day", "funday", "--start", "10:00", "--end", "14:00"])
        .assert()
        .failure()
        .stderr(contains("Invalid weekday"));

    site.as_staff(ADMIN, &password)
        .args(["auto-checkout", "set-day", "Saturday", "--start", "10:00", "--end", "14:00"])
        .assert()
        .success()
        .stdout(contains("saturday").and(contains("14:00")));

    site.as_staff(ADMIN, &password)
        .args(["auto-checkout", "set-timezone", "Mars/Olympus"])
        .assert()
        .failure()
        .stderr(contains("Unknown timezone"));

    site.as_staff(ADMIN, &password)
        .args(["auto-checkout", "set-timezone", "Europe/Rome"])
        .assert()
        .success();

    site.vh()
        .args(["auto-checkout", "show"])
        .assert()
        .success()
        .stdout(contains("Europe/Rome"));

    site.as_staff(ADMIN, &password)
        .args(["auto-checkout", "disable"])
        .assert()
        .success();

    site.vh()
        .args(["auto-checkout", "run"])
        .assert()
        .success()
        .stdout(contains("Auto-checkout disabled"));
}

#[test]
fn forced_run_checks_everyone_out_once() {
    let site = Site::init();
    let password = site.bootstrap_admin();
    site.register_adult("Ann Lee", "ann@example.org");
    site.register_adult("Bob Stone", "bob@example.org");
    site.vh().args(["checkin", "1"]).assert().success();
    site.vh().args(["checkin", "2"]).assert().success();

    site.as_staff(ADMIN, &password)
        .args(["auto-checkout", "run", "--force"])
        .assert()
        .success()
        .stdout(contains("Auto-checked out 2 volunteer(s), 0 failure(s)"));

    site.as_staff(ADMIN, &password)
        .args(["auto-checkout", "run", "--force"])
        .assert()
        .success()
        .stdout(contains("No volunteers were checked in"));

    site.vh()
        .args(["session", "list", "1"])
        .assert()
        .success()
        .stdout(contains("Auto-checkout: Office hours ended"));
}
