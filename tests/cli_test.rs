//! CLI integration tests for rms.
//!
//! These tests cover argument parsing, usage output and exit codes. None of
//! them needs a database server.

use assert_cmd::Command;
use predicates::prelude::*;

/// Get a command for the rms binary with no RMS_* overrides from the environment.
fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("rms").unwrap();
    for var in [
        "RMS_HOST",
        "RMS_USER",
        "RMS_PASSWORD",
        "RMS_PORT",
        "RMS_ORDERING",
        "RMS_CONNECT_TIMEOUT",
        "RMS_LOG_LEVEL",
        "RMS_JSON_LOGS",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_lists_flags() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--host"))
        .stdout(predicate::str::contains("--from"))
        .stdout(predicate::str::contains("--to"))
        .stdout(predicate::str::contains("--table"))
        .stdout(predicate::str::contains("--ordering"))
        .stdout(predicate::str::contains("[default: 3306]"));
}

#[test]
fn test_single_dash_help() {
    cmd()
        .arg("-help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("rms"));
}

// =============================================================================
// Required Flag Tests
// =============================================================================

#[test]
fn test_missing_from_prints_usage() {
    cmd()
        .args(["-to", "shop_bak"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("please specify -from"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_missing_to_prints_usage() {
    cmd()
        .args(["-from", "shop"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("please specify -to"));
}

#[test]
fn test_missing_both_reports_from_first() {
    cmd()
        .assert()
        .code(2)
        .stdout(predicate::str::contains("please specify -from"));
}

#[test]
fn test_empty_schema_name_is_rejected() {
    cmd()
        .args(["-from", "shop", "-to", ""])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("please specify -to"));
}

#[test]
fn test_validation_happens_before_connecting() {
    // Port 1 is never a MySQL server; validation must fail first
    cmd()
        .args(["-host", "127.0.0.1", "-port", "1", "-to", "b"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Failed to connect").not());
}

// =============================================================================
// Invalid Argument Tests
// =============================================================================

#[test]
fn test_invalid_ordering_rejected() {
    cmd()
        .args(["-from", "a", "-to", "b", "--ordering", "sideways"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sideways"));
}

#[test]
fn test_invalid_port_rejected() {
    cmd()
        .args(["-from", "a", "-to", "b", "-port", "99999"])
        .assert()
        .failure();
}

// =============================================================================
// Connection Failure Tests
// =============================================================================

#[test]
fn test_unreachable_server_exits_with_failure() {
    cmd()
        .args([
            "-host",
            "127.0.0.1",
            "-port",
            "1",
            "-from",
            "a",
            "-to",
            "b",
            "--connect-timeout",
            "2",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to connect to 127.0.0.1:1"));
}
