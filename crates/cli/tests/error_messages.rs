//! Failures that surface before any browser is launched.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

fn gizmo_binary() -> PathBuf {
	let mut path = std::env::current_exe().unwrap();
	path.pop();
	path.pop();
	path.push("gizmo");
	path
}

fn run(dir: &Path, args: &[&str]) -> Output {
	Command::new(gizmo_binary())
		.current_dir(dir)
		// Keep a stray user settings file or cookie override out of the run.
		.env("XDG_CONFIG_HOME", dir)
		.env("HOME", dir)
		.env_remove("GIZMO_COOKIES")
		.args(args)
		.output()
		.expect("failed to execute gizmo")
}

fn envelope(output: &Output) -> Value {
	serde_json::from_slice(&output.stdout).unwrap_or(Value::Null)
}

#[test]
fn missing_config_argument_is_a_usage_error() {
	let dir = TempDir::new().unwrap();
	let output = run(dir.path(), &[]);
	assert_eq!(output.status.code(), Some(2));
	let stderr = String::from_utf8_lossy(&output.stderr);
	assert!(stderr.contains("CONFIG"), "got: {stderr}");
}

#[test]
fn missing_config_file_names_the_problem() {
	let dir = TempDir::new().unwrap();
	let output = run(dir.path(), &["-f", "json", "absent.json"]);
	assert_eq!(output.status.code(), Some(2));

	let json = envelope(&output);
	assert_eq!(json["ok"], false);
	assert_eq!(json["command"], "apply");
	assert_eq!(json["error"]["code"], "CONFIG_ERROR");
	let msg = json["error"]["message"].as_str().unwrap_or_default();
	assert!(msg.contains("file not found"), "got: {msg}");
	assert!(msg.contains("absent.json"), "got: {msg}");
}

#[test]
fn config_without_name_is_rejected_before_launch() {
	let dir = TempDir::new().unwrap();
	std::fs::write(
		dir.path().join("agent.json"),
		r#"{"description": "d", "instructions": "i", "conversation_starters": []}"#,
	)
	.unwrap();

	let output = run(dir.path(), &["-f", "json", "agent.json"]);
	assert_eq!(output.status.code(), Some(2));
	let json = envelope(&output);
	assert_eq!(json["error"]["code"], "CONFIG_ERROR");
	let msg = json["error"]["message"].as_str().unwrap_or_default();
	assert!(msg.contains("name"), "got: {msg}");
	assert!(!dir.path().join("chatgpt_cookies.json").exists());
}

#[test]
fn malformed_settings_file_is_a_config_error() {
	let dir = TempDir::new().unwrap();
	std::fs::write(dir.path().join("settings.json"), "{ not json").unwrap();
	std::fs::write(
		dir.path().join("agent.json"),
		r#"{"name": "n", "description": "d", "instructions": "i", "conversation_starters": []}"#,
	)
	.unwrap();

	let output = run(dir.path(), &["--settings", "settings.json", "agent.json"]);
	assert_eq!(output.status.code(), Some(2));
	let stderr = String::from_utf8_lossy(&output.stderr);
	assert!(stderr.contains("CONFIG_ERROR"), "got: {stderr}");
	assert!(stdout_is_empty(&output), "text mode prints no envelope");
}

fn stdout_is_empty(output: &Output) -> bool {
	output.stdout.iter().all(u8::is_ascii_whitespace)
}
