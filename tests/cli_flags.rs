use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn prints_version() {
    Command::cargo_bin("hn-ticker")
        .expect("locate hn-ticker binary")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn prints_help() {
    Command::cargo_bin("hn-ticker")
        .expect("locate hn-ticker binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("HN-Ticker"))
        .stdout(predicate::str::contains("--version"))
        .stdout(predicate::str::contains("--once"));
}

#[test]
fn rejects_unknown_arguments() {
    Command::cargo_bin("hn-ticker")
        .expect("locate hn-ticker binary")
        .arg("--bogus")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown argument"));
}

#[test]
fn config_flag_requires_path() {
    Command::cargo_bin("hn-ticker")
        .expect("locate hn-ticker binary")
        .arg("--config")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--config requires a path"));
}
