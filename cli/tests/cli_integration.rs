use assert_cmd::Command;
use predicates::prelude::*;

/// Helper to get the relnotes binary command
fn relnotes_cmd() -> Command {
    Command::cargo_bin("relnotes").unwrap()
}

#[test]
fn help_describes_the_identifier() {
    relnotes_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("IDENTIFIER"))
        .stdout(predicate::str::contains("release notes"));
}

#[test]
fn version_flag_prints_version() {
    relnotes_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("relnotes"));
}

#[test]
fn missing_identifier_is_a_usage_error() {
    relnotes_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn unknown_flag_is_rejected() {
    relnotes_cmd()
        .args(["vue", "--no-such-flag"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--no-such-flag"));
}
