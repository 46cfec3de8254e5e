//! Corruption recovery tests for cyclefit.
//!
//! These tests verify the system can handle:
//! - Corrupted state files
//! - Corrupted period log lines
//! - Missing files

use assert_cmd::Command;
use std::fs;
use std::io::Write as IoWrite;
use tempfile::TempDir;

fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("cyclefit"))
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn status_json(data_dir: &std::path::Path, today: &str) -> serde_json::Value {
    let output = cli()
        .arg("status")
        .arg("--json")
        .arg("--data-dir")
        .arg(data_dir)
        .arg("--today")
        .arg(today)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&output).expect("status should print JSON")
}

#[test]
fn test_corrupted_state_file() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(data_dir.join("state.json"), "{ invalid json }}}}")
        .expect("Failed to write corrupted state");

    let outlook = status_json(data_dir, "2024-01-10");
    assert_eq!(outlook["phase"], "luteal");

    // Writing commands replace the corrupted file with a valid one
    cli()
        .arg("pin")
        .arg("follicular")
        .arg("--data-dir")
        .arg(data_dir)
        .arg("--today")
        .arg("2024-01-10")
        .assert()
        .success();

    let outlook = status_json(data_dir, "2024-01-10");
    assert_eq!(outlook["phase"], "follicular");
}

#[test]
fn test_corrupted_wal_lines_are_skipped() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli()
        .arg("log")
        .arg("2024-01-01")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success();

    // Simulate a partial write followed by more valid entries
    {
        let mut wal = fs::OpenOptions::new()
            .append(true)
            .open(data_dir.join("periods.wal"))
            .unwrap();
        write!(wal, "{{\"recorded_at\": \"2024-01-").unwrap();
        writeln!(wal).unwrap();
    }

    cli()
        .arg("log")
        .arg("2024-01-29")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success();

    let outlook = status_json(data_dir, "2024-02-01");
    assert_eq!(outlook["last_period_start"], "2024-01-29");
    assert_eq!(outlook["cycle_day"], 4);
    assert_eq!(outlook["stats"]["valid_sample_count"], 1);
}

#[test]
fn test_missing_data_dir_is_created_on_write() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("does/not/exist");

    cli()
        .arg("log")
        .arg("2024-01-01")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success();

    assert!(data_dir.join("periods.wal").exists());
    assert!(data_dir.join("state.json").exists());
}
