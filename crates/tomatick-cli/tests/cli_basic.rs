//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data
//! directory so config and database state never leak between tests.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(data_dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_tomatick"))
        .env("TOMATICK_DATA_DIR", data_dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout.trim()).expect("stdout is not JSON")
}

#[test]
fn test_status_of_a_fresh_timer() {
    let dir = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["timer", "status"]);
    assert_eq!(code, 0);

    let snapshot = json(&stdout);
    assert_eq!(snapshot["type"], "snapshot");
    assert_eq!(snapshot["phase"], "idle");
    assert_eq!(snapshot["mode"], "focus");
    assert_eq!(snapshot["remaining_secs"], 1500);
}

#[test]
fn test_start_then_pause() {
    let dir = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["timer", "start"]);
    assert_eq!(code, 0);
    assert_eq!(json(&stdout)["type"], "started");

    let (code, stdout, _) = run_cli(dir.path(), &["timer", "pause"]);
    assert_eq!(code, 0);
    let paused = json(&stdout);
    assert_eq!(paused["type"], "paused");
    assert!(paused["remaining_secs"].as_u64().unwrap() <= 1500);

    let (_, stdout, _) = run_cli(dir.path(), &["timer", "status"]);
    assert_eq!(json(&stdout)["phase"], "paused");
}

#[test]
fn test_pause_when_idle_is_rejected() {
    let dir = TempDir::new().unwrap();
    let (code, stdout, stderr) = run_cli(dir.path(), &["timer", "pause"]);
    assert_eq!(code, 1);
    assert!(stdout.is_empty());
    assert!(stderr.contains("cannot pause while the timer is idle"));
}

#[test]
fn test_switch_is_rejected_while_running() {
    let dir = TempDir::new().unwrap();
    run_cli(dir.path(), &["timer", "start"]);

    let (code, _, stderr) = run_cli(dir.path(), &["timer", "switch", "short_break"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("cannot switch mode while the timer is running"));

    let (code, _, _) = run_cli(dir.path(), &["timer", "reset"]);
    assert_eq!(code, 0);
    let (code, stdout, _) = run_cli(dir.path(), &["timer", "switch", "short_break"]);
    assert_eq!(code, 0);
    let switched = json(&stdout);
    assert_eq!(switched["type"], "mode_switched");
    assert_eq!(switched["remaining_secs"], 300);
}

#[test]
fn test_config_set_changes_durations() {
    let dir = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["config", "set", "schedule.focus_duration", "50"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "schedule.focus_duration = 50");

    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "schedule.focus_duration"]);
    assert_eq!(stdout.trim(), "50");

    let (_, stdout, _) = run_cli(dir.path(), &["timer", "status"]);
    assert_eq!(json(&stdout)["remaining_secs"], 3000);
}

#[test]
fn test_config_rejects_zero_duration() {
    let dir = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["config", "set", "schedule.short_break", "0"]);
    assert_eq!(code, 1);
    assert!(stderr.starts_with("error:"));

    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "schedule.short_break"]);
    assert_eq!(stdout.trim(), "5");
}

#[test]
fn test_stats_today_starts_empty() {
    let dir = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["stats", "today"]);
    assert_eq!(code, 0);
    let stats = json(&stdout);
    assert_eq!(stats["today_pomodoros"], 0);
    assert_eq!(stats["streak_days"], 0);
}

#[test]
fn test_stats_history_prints_one_line_per_day() {
    let dir = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["stats", "history", "--days", "3"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.lines().count(), 3);
}

#[test]
fn test_export_without_pomodoros_fails() {
    let dir = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["export", "ics", "--stdout"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("no pomodoros"));
}

#[test]
fn test_completions_for_bash() {
    let dir = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["completions", "bash"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("tomatick"));
}

#[test]
fn test_config_get_unknown_key_fails() {
    let dir = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["config", "get", "goals.monthly"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Unknown configuration key: goals.monthly"));
}

#[test]
fn test_second_countdown_is_refused() {
    let dir = TempDir::new().unwrap();
    let (code, _, _) = run_cli(dir.path(), &["timer", "start"]);
    assert_eq!(code, 0);

    let (code, _, stderr) = run_cli(dir.path(), &["timer", "start"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("cannot start while the timer is running"));

    let (code, _, stderr) = run_cli(dir.path(), &["timer", "run"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("already running"));
}
