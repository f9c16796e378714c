//! Result envelope and terminal output.
//!
//! With `-f json` every run prints one envelope on stdout:
//!
//! ```json
//! {
//!   "schemaVersion": 1,
//!   "ok": true,
//!   "command": "apply",
//!   "data": { "name": "Demo", "mode": "create", ... },
//!   "timings": { "durationMs": 48211 }
//! }
//! ```
//!
//! On failure `data` is replaced by `error: {code, message, details?}`. A
//! human-readable line always goes to stderr.

#[cfg(test)]
mod tests;

use std::io::{self, Write};
use std::time::{Duration, Instant};

use colored::Colorize;
use gizmo::{EditMode, RunReport};
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

/// Name reported in the envelope's `command` field.
pub const COMMAND: &str = "apply";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text
	#[default]
	Text,
	/// JSON envelope on stdout
	Json,
}

impl std::fmt::Display for OutputFormat {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			OutputFormat::Text => write!(f, "text"),
			OutputFormat::Json => write!(f, "json"),
		}
	}
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult<T: Serialize> {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub schema_version: Option<u32>,

	pub ok: bool,

	pub command: String,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<CommandError>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub timings: Option<Timings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
	pub code: ErrorCode,

	pub message: String,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
}

/// Stable error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	/// Config, tool document, or settings file is missing or invalid
	ConfigError,
	/// Login could not be completed
	AuthError,
	/// An editor step kept failing after retries
	UiInteractionFailed,
	/// The application refused the OpenAPI document
	ToolSpecRejected,
	/// Browser could not be started
	BrowserLaunchFailed,
	/// Browser died or stopped responding
	BrowserCrashed,
	/// The application could not be reached
	NavigationFailed,
	IoError,
	InternalError,
}

impl ErrorCode {
	/// Process exit status for this failure.
	pub fn exit_code(self) -> i32 {
		match self {
			ErrorCode::ConfigError => 2,
			ErrorCode::AuthError => 3,
			ErrorCode::UiInteractionFailed => 4,
			ErrorCode::ToolSpecRejected => 5,
			ErrorCode::BrowserLaunchFailed | ErrorCode::BrowserCrashed | ErrorCode::NavigationFailed => 6,
			ErrorCode::IoError | ErrorCode::InternalError => 1,
		}
	}
}

impl std::fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ErrorCode::ConfigError => write!(f, "CONFIG_ERROR"),
			ErrorCode::AuthError => write!(f, "AUTH_ERROR"),
			ErrorCode::UiInteractionFailed => write!(f, "UI_INTERACTION_FAILED"),
			ErrorCode::ToolSpecRejected => write!(f, "TOOL_SPEC_REJECTED"),
			ErrorCode::BrowserLaunchFailed => write!(f, "BROWSER_LAUNCH_FAILED"),
			ErrorCode::BrowserCrashed => write!(f, "BROWSER_CRASHED"),
			ErrorCode::NavigationFailed => write!(f, "NAVIGATION_FAILED"),
			ErrorCode::IoError => write!(f, "IO_ERROR"),
			ErrorCode::InternalError => write!(f, "INTERNAL_ERROR"),
		}
	}
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timings {
	pub duration_ms: u64,
}

impl From<Duration> for Timings {
	fn from(duration: Duration) -> Self {
		Timings {
			duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
		}
	}
}

pub struct ResultBuilder<T: Serialize> {
	command: String,
	data: Option<T>,
	error: Option<CommandError>,
	start_time: Instant,
}

impl<T: Serialize> ResultBuilder<T> {
	pub fn new(command: impl Into<String>, start_time: Instant) -> Self {
		Self {
			command: command.into(),
			data: None,
			error: None,
			start_time,
		}
	}

	pub fn data(mut self, data: T) -> Self {
		self.data = Some(data);
		self
	}

	pub fn error(mut self, error: CommandError) -> Self {
		self.error = Some(error);
		self
	}

	pub fn build(self) -> CommandResult<T> {
		CommandResult {
			schema_version: Some(SCHEMA_VERSION),
			ok: self.error.is_none() && self.data.is_some(),
			command: self.command,
			data: self.data,
			error: self.error,
			timings: Some(Timings::from(self.start_time.elapsed())),
		}
	}
}

/// Print a command result to stdout in the specified format
pub fn print_result<T: Serialize>(result: &CommandResult<T>, format: OutputFormat) {
	match format {
		OutputFormat::Json => {
			if let Ok(json) = serde_json::to_string_pretty(result) {
				println!("{json}");
			}
		}
		OutputFormat::Text => {}
	}
}

/// One-line summary of a successful run.
pub fn summary(report: &RunReport) -> String {
	let verb = match report.mode {
		EditMode::Create => "created",
		EditMode::Update => "updated",
	};
	match &report.url {
		Some(url) => format!("{verb} \"{}\" ({url})", report.name),
		None => format!("{verb} \"{}\"", report.name),
	}
}

pub fn print_success_stderr(report: &RunReport) {
	let mut stderr = io::stderr().lock();
	let _ = writeln!(stderr, "{} {}", "✓".green().bold(), summary(report));
}

pub fn print_error_stderr(error: &CommandError) {
	eprintln!("{} [{}]: {}", "error".red().bold(), error.code, error.message);
}
