//! Integration tests for the CLI job workflow.
//!
//! Each test runs the built binary with `HOME` pointed at a temporary
//! directory, so the config file, job records and logs all land there.
//! Only commands that need no network are exercised.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const KYIV: [&str; 4] = ["30.496", "50.450", "30.513", "50.457"];

/// Run a CLI command under `home` and capture output.
fn run_cli(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_xvulcan"))
        .args(args)
        .env("HOME", home)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command")
}

/// Assert a command succeeded.
fn assert_success(output: &Output, context: &str) {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        panic!(
            "{} failed:\nstdout: {}\nstderr: {}",
            context, stdout, stderr
        );
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_tiles_reports_range_and_count() {
    let home = TempDir::new().unwrap();
    let mut args = vec!["tiles"];
    args.extend(KYIV);
    args.extend(["--zoom", "18"]);

    let output = run_cli(home.path(), &args);
    assert_success(&output, "tiles");

    let text = stdout(&output);
    assert!(text.contains("X:     153278..=153290"), "{}", text);
    assert!(text.contains("Y:     88384..=88392"), "{}", text);
    assert!(text.contains("Tiles: 117"), "{}", text);
}

#[test]
fn test_submit_then_status() {
    let home = TempDir::new().unwrap();
    let mut args = vec!["submit"];
    args.extend(KYIV);

    let output = run_cli(home.path(), &args);
    assert_success(&output, "submit");
    let job = stdout(&output).trim().to_string();
    assert!(!job.is_empty());
    assert!(home
        .path()
        .join(".xvulcan/jobs/records")
        .join(format!("{}.json", job))
        .is_file());

    let output = run_cli(home.path(), &["status", &job]);
    assert_success(&output, "status <job>");
    let text = stdout(&output);
    assert!(text.contains("Status:    waiting_imagery"), "{}", text);
    assert!(text.contains("Listings:  0"), "{}", text);

    let output = run_cli(home.path(), &["status"]);
    assert_success(&output, "status");
    let text = stdout(&output);
    assert!(text.contains(&job) && text.contains("waiting_imagery"), "{}", text);
}

#[test]
fn test_oversized_area_is_rejected() {
    let home = TempDir::new().unwrap();
    let output = run_cli(home.path(), &["submit", "30.0", "50.0", "31.5", "50.5"]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error:"), "{}", stderr);
}

#[test]
fn test_unknown_job_status_fails() {
    let home = TempDir::new().unwrap();
    let output = run_cli(home.path(), &["status", "no-such-job"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_search_without_api_key_explains_config() {
    let home = TempDir::new().unwrap();
    let mut args = vec!["submit"];
    args.extend(KYIV);
    let job = stdout(&run_cli(home.path(), &args)).trim().to_string();

    let output = run_cli(home.path(), &["search", &job]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("planet_api_key"), "{}", stderr);
}

#[test]
fn test_config_init_is_idempotent() {
    let home = TempDir::new().unwrap();
    let config = home.path().join(".xvulcan/config.ini");

    let output = run_cli(home.path(), &["config", "init"]);
    assert_success(&output, "config init");
    assert!(config.is_file());
    let written = std::fs::read_to_string(&config).unwrap();

    let output = run_cli(home.path(), &["config", "init"]);
    assert_success(&output, "config init again");
    assert!(stdout(&output).contains("already exists"));
    assert_eq!(std::fs::read_to_string(&config).unwrap(), written);

    let output = run_cli(home.path(), &["config", "path"]);
    assert_success(&output, "config path");
    assert_eq!(stdout(&output).trim(), config.display().to_string());
}
