//! Basic CLI smoke tests.
//!
//! Tests invoke CLI commands via cargo run and verify outputs. They run
//! against the dev data directory (PULSEFOCUS_ENV=dev).

use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "pulsefocus-cli", "--"])
        .args(args)
        .env("PULSEFOCUS_ENV", "dev")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_advise_outputs_json() {
    let (stdout, _, code) = run_cli(&[
        "advise",
        "--bpm",
        "100",
        "--hrv",
        "2",
        "--resting-hr",
        "60",
    ]);
    assert_eq!(code, 0, "advise failed");
    let advice: serde_json::Value = serde_json::from_str(&stdout).expect("advise output not JSON");
    // pressure 20: floor focus, cap rest.
    assert_eq!(advice["focus_minutes"], 15);
    assert_eq!(advice["rest_minutes"], 10);
    assert_eq!(advice["score"], 0.0);
}

#[test]
fn test_advise_zero_pressure_keeps_bases() {
    let (stdout, _, code) = run_cli(&[
        "advise",
        "--focus-base",
        "30",
        "--rest-base",
        "6",
        "--bpm",
        "58",
        "--hrv",
        "50",
        "--resting-hr",
        "60",
    ]);
    assert_eq!(code, 0);
    let advice: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(advice["focus_minutes"], 30);
    assert_eq!(advice["rest_minutes"], 6);
    assert_eq!(advice["score"], 100.0);
}

#[test]
fn test_config_show_is_json() {
    let (stdout, _, code) = run_cli(&["config", "show"]);
    assert_eq!(code, 0, "config show failed");
    let config: serde_json::Value = serde_json::from_str(&stdout).expect("config not JSON");
    assert!(config["timer"]["focus_minutes"].is_number());
    assert!(config["coach"]["base_url"].is_string());
}

#[test]
fn test_timer_status_reports_phase() {
    let (stdout, _, code) = run_cli(&["timer", "status"]);
    assert_eq!(code, 0, "timer status failed");
    // Status may be preceded by catch-up events; the status object starts
    // at the last unindented brace.
    let last = stdout
        .rfind("\n{")
        .map(|i| &stdout[i + 1..])
        .unwrap_or(&stdout);
    let status: serde_json::Value = serde_json::from_str(last).expect("status not JSON");
    assert!(status["phase"].is_string());
    assert!(status["remaining_secs"].is_number());
}

#[test]
fn test_history_list_is_json_array() {
    let (stdout, _, code) = run_cli(&["history", "list"]);
    assert_eq!(code, 0, "history list failed");
    let sessions: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(sessions.is_array());
}

#[test]
fn test_demo_sync_converges() {
    let (stdout, _, code) = run_cli(&["demo", "sync"]);
    assert_eq!(code, 0, "demo sync failed");
    assert!(stdout.contains("link down"));
    assert!(stdout.contains("link up"));
    assert!(stdout.contains("mirror phase: Idle"));
}
