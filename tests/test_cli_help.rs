use assert_cmd::Command;
use predicates::prelude::*;

fn relay() -> Command {
    let mut cmd = Command::cargo_bin("s3-sftp-relay").unwrap();
    cmd.env_remove("WEEKEND_ALERT")
        .env_remove("RELAY_UTC_OFFSET_HOURS");
    cmd
}

#[test]
fn test_help_lists_commands() {
    relay()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("COMMANDS:"))
        .stdout(predicate::str::contains("invoke"))
        .stdout(predicate::str::contains("gate"))
        .stdout(predicate::str::contains("env"));
}

#[test]
fn test_version_flag_prints_crate_version() {
    relay()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_env_lists_required_variables() {
    relay()
        .arg("env")
        .assert()
        .success()
        .stdout(predicate::str::contains("S3_BUCKET"))
        .stdout(predicate::str::contains("SECRET_NAME"))
        .stdout(predicate::str::contains("SNS_TOPIC"))
        .stdout(predicate::str::contains("WEEKEND_ALERT"));
}

#[test]
fn test_gate_suppresses_saturday_morning() {
    relay()
        .args(["gate", "--now", "2024-06-08T09:00:00+09:00"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saturday"))
        .stdout(predicate::str::contains("Suppress"));
}

#[test]
fn test_gate_uses_configured_offset() {
    // Friday 20:00 UTC is Saturday 05:00 in +09:00.
    relay()
        .args(["gate", "--now", "2024-06-07T20:00:00+00:00"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Suppress"));

    relay()
        .env("RELAY_UTC_OFFSET_HOURS", "0")
        .args(["gate", "--now", "2024-06-07T20:00:00+00:00"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Proceed"));
}

#[test]
fn test_gate_flag_overrides_environment() {
    relay()
        .env("WEEKEND_ALERT", "true")
        .args([
            "gate",
            "--now",
            "2024-06-09T12:00:00+09:00",
            "--weekend-alert",
            "false",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Proceed"));
}

#[test]
fn test_gate_rejects_bad_timestamp() {
    relay()
        .args(["gate", "--now", "next saturday"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("RFC 3339"));
}

#[test]
fn test_invoke_requires_event_file() {
    relay()
        .arg("invoke")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--event"));
}
