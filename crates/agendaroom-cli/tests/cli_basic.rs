//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway data directory and
//! verify outputs.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use serde_json::Value;

/// Run a CLI command and return output.
fn run_cli(data_dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_agendaroom-cli"))
        .args(args)
        .env("AGENDAROOM_DATA_DIR", data_dir)
        .env_remove("AGENDAROOM_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn run_json(data_dir: &Path, args: &[&str]) -> Value {
    let (code, stdout, stderr) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

/// Event lines printed one JSON object per line.
fn event_types(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|l| serde_json::from_str::<Value>(l).ok())
        .filter_map(|v| v["type"].as_str().map(str::to_string))
        .collect()
}

fn setup_meeting(dir: &Path, items: &[(&str, &str)]) -> (String, Vec<String>) {
    let meeting = run_json(dir, &["meeting", "create", "Weekly sync"]);
    let meeting_id = meeting["id"].as_str().unwrap().to_string();
    let ids = items
        .iter()
        .map(|(title, minutes)| {
            let item = run_json(dir, &["agenda", "add", title, "--minutes", minutes]);
            item["id"].as_str().unwrap().to_string()
        })
        .collect();
    (meeting_id, ids)
}

#[test]
fn test_meeting_create_and_list() {
    let dir = tempfile::tempdir().unwrap();
    let meeting = run_json(dir.path(), &["meeting", "create", "Retro", "--auto-transition", "true"]);
    assert_eq!(meeting["title"], "Retro");
    assert_eq!(meeting["status"], "not-started");
    assert_eq!(meeting["settings"]["auto_transition"], true);

    run_json(dir.path(), &["meeting", "create", "Planning"]);
    let list = run_json(dir.path(), &["meeting", "list"]);
    let rows = list.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    // The first meeting stays current.
    assert_eq!(rows[0]["current"], true);
    assert_eq!(rows[1]["current"], false);
}

#[test]
fn test_agenda_add_reorder_and_select() {
    let dir = tempfile::tempdir().unwrap();
    let (_, ids) = setup_meeting(dir.path(), &[("Intro", "5"), ("Demo", "10"), ("Q&A", "5")]);

    let list = run_json(dir.path(), &["agenda", "list"]);
    assert_eq!(list[1]["planned_duration"], 600);
    assert_eq!(list[1]["remaining_time"], 600);

    let reordered = run_json(dir.path(), &["agenda", "reorder", &ids[2]]);
    let titles: Vec<_> = reordered
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["Q&A", "Intro", "Demo"]);

    let (code, stdout, _) = run_cli(dir.path(), &["agenda", "select", &ids[1]]);
    assert_eq!(code, 0);
    assert_eq!(event_types(&stdout), vec!["AgendaSelected"]);

    let meeting = run_json(dir.path(), &["meeting", "show"]);
    assert_eq!(meeting["current_agenda_id"], ids[1].as_str());
    assert_eq!(meeting["total_planned_duration"], 1200);
}

#[test]
fn test_agenda_add_requires_duration() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["meeting", "create", "Standup"]);
    let (code, _, stderr) = run_cli(dir.path(), &["agenda", "add", "Updates"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("error:"));

    let (code, _, _) = run_cli(dir.path(), &["agenda", "add", "Updates", "--minutes", "0"]);
    assert_ne!(code, 0);
}

#[test]
fn test_delete_current_item_reselects_next() {
    let dir = tempfile::tempdir().unwrap();
    let (_, ids) = setup_meeting(dir.path(), &[("A", "1"), ("B", "1"), ("C", "1")]);
    run_cli(dir.path(), &["agenda", "select", &ids[1]]);

    let (code, _, _) = run_cli(dir.path(), &["agenda", "delete", &ids[1]]);
    assert_eq!(code, 0);
    let meeting = run_json(dir.path(), &["meeting", "show"]);
    assert_eq!(meeting["current_agenda_id"], ids[2].as_str());
    assert_eq!(meeting["agenda"].as_array().unwrap().len(), 2);
    assert_eq!(meeting["total_planned_duration"], 120);
}

#[test]
fn test_timer_next_completes_meeting_and_records_history() {
    let dir = tempfile::tempdir().unwrap();
    setup_meeting(dir.path(), &[("First", "1"), ("Second", "1")]);

    let status = run_json(dir.path(), &["timer", "status"]);
    assert_eq!(status["type"], "StateSnapshot");
    assert_eq!(status["is_running"], false);
    assert_eq!(status["agenda_title"], "First");

    let (_, stdout, _) = run_cli(dir.path(), &["timer", "next"]);
    assert_eq!(event_types(&stdout), vec!["AgendaAdvanced"]);
    let (_, stdout, _) = run_cli(dir.path(), &["timer", "stop"]);
    assert_eq!(event_types(&stdout), vec!["MeetingCompleted"]);

    let (code, stdout, _) = run_cli(dir.path(), &["timer", "next"]);
    assert_eq!(code, 0);
    assert!(event_types(&stdout).is_empty());

    let history = run_json(dir.path(), &["meeting", "history"]);
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["title"], "Weekly sync");
    assert_eq!(history[0]["agenda_count"], 2);
}

#[test]
fn test_timer_run_with_live_commands() {
    let dir = tempfile::tempdir().unwrap();
    setup_meeting(dir.path(), &[("Only item", "5")]);

    let mut child = Command::new(env!("CARGO_BIN_EXE_agendaroom-cli"))
        .args(["timer", "run"])
        .env("AGENDAROOM_DATA_DIR", dir.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn CLI");
    child.stdin.take().unwrap().write_all(b"n\n").unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let types = event_types(&stdout);
    assert_eq!(types.first().map(String::as_str), Some("TimerStarted"));
    assert_eq!(types.last().map(String::as_str), Some("MeetingCompleted"));

    let meeting = run_json(dir.path(), &["meeting", "show"]);
    assert_eq!(meeting["status"], "completed");
    assert_eq!(meeting["agenda"][0]["status"], "completed");
}

#[test]
fn test_timer_run_quit_pauses_current_item() {
    let dir = tempfile::tempdir().unwrap();
    setup_meeting(dir.path(), &[("Only item", "5")]);

    let mut child = Command::new(env!("CARGO_BIN_EXE_agendaroom-cli"))
        .args(["timer", "run"])
        .env("AGENDAROOM_DATA_DIR", dir.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn CLI");
    child.stdin.take().unwrap().write_all(b"q\n").unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let types = event_types(&stdout);
    assert_eq!(types.first().map(String::as_str), Some("TimerStarted"));
    assert_eq!(types.last().map(String::as_str), Some("TimerPaused"));

    let meeting = run_json(dir.path(), &["meeting", "show"]);
    assert_eq!(meeting["status"], "paused");
    assert_eq!(meeting["agenda"][0]["status"], "paused");
}

#[test]
fn test_timer_run_without_items_fails() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["meeting", "create", "Empty"]);
    let (code, _, stderr) = run_cli(dir.path(), &["timer", "run"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("nothing to run"));
}

#[test]
fn test_meeting_settings_update() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["meeting", "create", "Quiet"]);
    let settings = run_json(
        dir.path(),
        &["meeting", "settings", "--silent", "true", "--bell-overtime", "false"],
    );
    assert_eq!(settings["silent_mode"], true);
    assert_eq!(settings["bells"]["overtime"], false);
    assert_eq!(settings["bells"]["start"], true);

    let meeting = run_json(dir.path(), &["meeting", "show"]);
    assert_eq!(meeting["settings"]["silent_mode"], true);
}

#[test]
fn test_unknown_meeting_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["meeting", "use", "no-such-id"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Unknown meeting"));
}

#[test]
fn test_config_set_and_get() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "timer.threshold_mode"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "crossed");

    let (code, _, _) = run_cli(dir.path(), &["config", "set", "defaults.auto_transition", "true"]);
    assert_eq!(code, 0);
    let meeting = run_json(dir.path(), &["meeting", "create", "Auto"]);
    assert_eq!(meeting["settings"]["auto_transition"], true);

    let (code, _, _) = run_cli(dir.path(), &["config", "set", "timer.nonexistent", "1"]);
    assert_ne!(code, 0);
    let (code, _, _) = run_cli(dir.path(), &["config", "get", "nope"]);
    assert_ne!(code, 0);

    let (code, _, _) = run_cli(dir.path(), &["config", "reset"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "defaults.auto_transition"]);
    assert_eq!(stdout.trim(), "false");
}
