//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway data directory and
//! verify outputs.

use std::path::Path;
use std::process::Command;
use std::thread;
use std::time::Duration;

use serde_json::Value;
use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_worktally"))
        .args(args)
        .env("WORKTALLY_HOME", home)
        .env_remove("WORKTALLY_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_ok(home: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(code, 0, "command {args:?} failed: {stderr}");
    stdout
}

fn run_json(home: &Path, args: &[&str]) -> Value {
    let stdout = run_ok(home, args);
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

/// A data directory with an identity configured.
fn signed_in_home() -> TempDir {
    let home = tempfile::tempdir().unwrap();
    run_ok(home.path(), &["config", "set", "identity.user_id", "cli-user"]);
    run_ok(home.path(), &["config", "set", "identity.display_name", "Casey"]);
    home
}

#[test]
fn test_config_get_set_list() {
    let home = tempfile::tempdir().unwrap();
    assert_eq!(run_ok(home.path(), &["config", "get", "timer.keep_awake"]).trim(), "true");

    run_ok(home.path(), &["config", "set", "timer.keep_awake", "false"]);
    assert_eq!(run_ok(home.path(), &["config", "get", "timer.keep_awake"]).trim(), "false");

    let listed = run_ok(home.path(), &["config", "list"]);
    assert!(listed.contains("timer.keep_awake = false"));
    assert!(listed.contains("report.default_expiry = 1d"));

    let (_, stderr, code) = run_cli(home.path(), &["config", "set", "timer.bogus", "1"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_timer_lifecycle_records_a_session() {
    let home = signed_in_home();

    let started = run_json(home.path(), &["timer", "start", "Write tests"]);
    assert_eq!(started["type"], "TimerStarted");
    assert_eq!(started["task_name"], "Write tests");

    let status = run_json(home.path(), &["timer", "status"]);
    assert_eq!(status["type"], "StateSnapshot");
    assert_eq!(status["phase"], "running");

    thread::sleep(Duration::from_millis(1100));
    run_json(home.path(), &["timer", "pause"]);
    let stopped = run_json(home.path(), &["timer", "stop"]);
    assert_eq!(stopped["event"]["type"], "TimerStopped");
    assert_eq!(stopped["persisted"]["status"], "created");

    let sessions = run_json(home.path(), &["session", "list"]);
    let sessions = sessions.as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["task_name"], "Write tests");
    assert!(sessions[0]["duration_seconds"].as_u64().unwrap() >= 1);

    let recent = run_json(home.path(), &["session", "recent"]);
    assert_eq!(recent[0]["task_name"], "Write tests");

    // Picking the task again reattaches to the same record.
    let resumed = run_json(home.path(), &["timer", "resume-task", "Write tests"]);
    assert_eq!(resumed["resumed_session"], sessions[0]["id"]);
    thread::sleep(Duration::from_millis(1100));
    let stopped = run_json(home.path(), &["timer", "stop"]);
    assert_eq!(stopped["persisted"]["status"], "updated");
    assert_eq!(run_json(home.path(), &["session", "list"]).as_array().unwrap().len(), 1);

    let today = run_json(home.path(), &["stats", "today"]);
    assert_eq!(today["period"], "today");
    assert_eq!(today["session_count"], 1);
}

#[test]
fn test_invalid_transition_is_an_error() {
    let home = signed_in_home();
    let (_, stderr, code) = run_cli(home.path(), &["timer", "pause"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("cannot pause while timer is idle"), "{stderr}");
}

#[test]
fn test_anonymous_stop_reports_failure_and_resets() {
    let home = tempfile::tempdir().unwrap();
    run_ok(home.path(), &["timer", "start", "Offline"]);
    thread::sleep(Duration::from_millis(1100));

    let (stdout, stderr, code) = run_cli(home.path(), &["timer", "stop"]);
    assert_eq!(code, 1);
    assert!(stdout.contains("\"failed\""));
    assert!(stderr.contains("not saved"));

    let status = run_json(home.path(), &["timer", "status"]);
    assert_eq!(status["phase"], "idle");
}

#[test]
fn test_watch_on_idle_timer_exits() {
    let home = tempfile::tempdir().unwrap();
    let snapshot = run_json(home.path(), &["timer", "watch"]);
    assert_eq!(snapshot["phase"], "idle");
}

#[test]
fn test_settings_validate_goal() {
    let home = signed_in_home();
    let (_, _, code) = run_cli(home.path(), &["settings", "set-goal", "30"]);
    assert_eq!(code, 1);

    let settings = run_json(home.path(), &["settings", "set-goal", "8"]);
    assert_eq!(settings["daily_goal_hours"], 8.0);
    let settings = run_json(home.path(), &["settings", "set-theme", "dark"]);
    assert_eq!(settings["theme"], "dark");
    assert_eq!(settings["daily_goal_hours"], 8.0);
}

#[test]
fn test_report_share_view_and_deactivate() {
    let home = signed_in_home();
    let shared = run_json(home.path(), &["report", "share", "--expires", "7d", "--no-details"]);
    let id = shared["id"].as_str().unwrap().to_string();
    assert!(shared["url"].as_str().unwrap().ends_with(&format!("/report/{id}")));
    assert_eq!(shared["report"]["user_name"], "Casey");
    assert_eq!(shared["report"]["includes_task_details"], false);

    let viewed = run_json(home.path(), &["report", "view", &id]);
    assert_eq!(viewed["user_name"], "Casey");

    let listed = run_json(home.path(), &["report", "list"]);
    assert_eq!(listed[0]["view_count"], 1);

    run_ok(home.path(), &["report", "deactivate", &id]);
    let (_, stderr, code) = run_cli(home.path(), &["report", "view", &id]);
    assert_eq!(code, 1);
    assert!(stderr.contains("deactivated"), "{stderr}");

    run_ok(home.path(), &["report", "delete", &id]);
    assert!(run_json(home.path(), &["report", "list"]).as_array().unwrap().is_empty());
}

#[test]
fn test_oversized_expiry_is_rejected_cleanly() {
    let home = signed_in_home();
    let (_, stderr, code) = run_cli(home.path(), &["report", "share", "--expires", "100000000d"]);
    assert_eq!(code, 2, "{stderr}");
    assert!(stderr.contains("invalid expiry"), "{stderr}");

    let (_, stderr, code) = run_cli(home.path(), &["config", "set", "report.default_expiry", "3000000000000h"]);
    assert_eq!(code, 1, "{stderr}");
    assert_eq!(run_ok(home.path(), &["config", "get", "report.default_expiry"]).trim(), "1d");
}
