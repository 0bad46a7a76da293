use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

mod common;
use common::Site;

#[test]
fn init_writes_config_and_database() {
    let site = Site::init();

    assert!(site.path(".volunteerhub/volunteerhub.conf").exists());
    assert!(std::path::Path::new(&site.db).exists());

    site.vh()
        .args(["config", "--check"])
        .assert()
        .success()
        .stdout(contains("complete"));

    site.vh()
        .args(["config", "--print"])
        .assert()
        .success()
        .stdout(contains("organization_name"));
}

#[test]
fn register_check_in_and_out() {
    let site = Site::init();
    site.register_adult("Ann Lee", "ann@example.org");

    site.vh()
        .args(["checkin", "1"])
        .assert()
        .success()
        .stdout(contains("Ann Lee checked in"));

    site.vh()
        .arg("active")
        .assert()
        .success()
        .stdout(contains("Ann Lee").and(contains("00h 00m")));

    site.vh()
        .args(["checkin", "1"])
        .assert()
        .failure()
        .stderr(contains("already checked in"));

    // seconds after check-in: the quarter-hour rounding yields zero
    site.vh()
        .args(["checkout", "1"])
        .assert()
        .success()
        .stdout(contains("checked out: 0h this session"));

    site.vh()
        .args(["checkout", "1"])
        .assert()
        .failure()
        .stderr(contains("is not checked in"));

    site.vh()
        .arg("active")
        .assert()
        .success()
        .stdout(contains("Nobody is checked in"));

    site.vh()
        .args(["user", "show", "1"])
        .assert()
        .success()
        .stdout(contains("Complete").and(contains("Sessions")));
}

#[test]
fn invalid_registration_reports_every_problem() {
    let site = Site::init();

    site.vh()
        .args([
            "user",
            "register",
            "--name",
            "Bad Data",
            "--email",
            "not-an-email",
            "--phone",
            "123",
        ])
        .assert()
        .failure()
        .stderr(
            contains("Validation failed")
                .and(contains("email"))
                .and(contains("phone"))
                .and(contains("waiver")),
        );

    site.vh()
        .args(["user", "list"])
        .assert()
        .success()
        .stdout(contains("No users found"));
}

#[test]
fn donor_needs_waiver_before_volunteering() {
    let site = Site::init();

    site.vh()
        .args([
            "user",
            "register",
            "--name",
            "Dan Donor",
            "--email",
            "dan@example.org",
            "--phone",
            "(555) 987-6543",
            "--donor",
            "--bags",
            "2",
        ])
        .assert()
        .success()
        .stdout(contains("2 bag(s)"));

    site.vh()
        .args(["checkin", "1"])
        .assert()
        .failure()
        .stderr(contains("liability waiver"));

    site.vh()
        .args(["waiver", "sign", "1", "--signer", "Dan Donor"])
        .assert()
        .success();

    site.vh().args(["checkin", "1"]).assert().success();

    site.vh()
        .args(["donate", "1", "--bags", "3"])
        .assert()
        .success()
        .stdout(contains("(5 in total)"));

    site.vh()
        .args(["donate", "1", "--bags", "0"])
        .assert()
        .failure();
}

#[test]
fn minor_registration_needs_guardian() {
    let site = Site::init();
    let base = [
        "user",
        "register",
        "--name",
        "Kid Kim",
        "--email",
        "kid@example.org",
        "--phone",
        "555 222 3333",
        "--dob",
        "2015-06-01",
        "--accept-waiver",
    ];

    site.vh()
        .args(base)
        .assert()
        .failure()
        .stderr(contains("guardian name is required"));

    site.vh()
        .args(base)
        .args(["--guardian", "Pat Kim", "--parent-email", "pat@example.org"])
        .assert()
        .success()
        .stdout(contains("Minor waiver pending"));

    site.vh()
        .args(["checkin", "1"])
        .assert()
        .failure()
        .stderr(contains("liability waiver"));

    // remote path: queue a link, then sign through it
    let out = site
        .vh()
        .args(["waiver", "request", "1"])
        .assert()
        .success()
        .stdout(contains("pat@example.org"))
        .get_output()
        .stdout
        .clone();
    let out = String::from_utf8_lossy(&out);
    let token = out
        .lines()
        .find(|l| l.contains("/waiver/"))
        .and_then(|l| l.rsplit('/').next())
        .expect("waiver link")
        .trim()
        .to_string();

    site.vh()
        .arg("outbox")
        .assert()
        .success()
        .stdout(contains("waiver_request").and(contains("pat@example.org")));

    site.vh()
        .args(["waiver", "show", &token])
        .assert()
        .success()
        .stdout(contains("Kid Kim"));

    site.vh()
        .args(["waiver", "complete", &token, "--signature", "Pat Kim"])
        .assert()
        .success();

    site.vh()
        .args(["waiver", "show", &token])
        .assert()
        .success()
        .stdout(contains("expired or was already used"));

    site.vh().args(["checkin", "1"]).assert().success();
}

#[test]
fn search_and_list_filters() {
    let site = Site::init();
    site.register_adult("Ann Lee", "ann@example.org");
    site.register_adult("Bob Stone", "bob@example.org");

    site.vh()
        .args(["user", "search", "STONE"])
        .assert()
        .success()
        .stdout(contains("Bob Stone").and(contains("Ann Lee").not()));

    site.vh().args(["checkin", "2"]).assert().success();

    site.vh()
        .args(["user", "list", "--filter", "active"])
        .assert()
        .success()
        .stdout(contains("Bob Stone").and(contains("Ann Lee").not()));
}

#[test]
fn db_maintenance_reports() {
    let site = Site::init();
    site.register_adult("Ann Lee", "ann@example.org");

    site.vh()
        .args(["db", "--info"])
        .assert()
        .success()
        .stdout(contains("Users").and(contains("Staff accounts")));

    site.vh()
        .args(["db", "--migrate", "--check", "--vacuum"])
        .assert()
        .success()
        .stdout(
            contains("Schema is up to date")
                .and(contains("Integrity check passed"))
                .and(contains("VACUUM")),
        );

    site.vh()
        .args(["log", "--print", "--limit", "1"])
        .assert()
        .success()
        .stdout(contains("user_register"));
}
