use std::path::PathBuf;

use gizmo::{Error as RunError, ErrorKind};
use serde_json::json;
use thiserror::Error;

use crate::output::{CommandError, ErrorCode};

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("settings file {}: {source:#}", path.display())]
	Settings {
		path: PathBuf,
		#[source]
		source: anyhow::Error,
	},

	#[error(transparent)]
	Run(#[from] RunError),
}

impl CliError {
	pub fn code(&self) -> ErrorCode {
		let err = match self {
			CliError::Settings { .. } => return ErrorCode::ConfigError,
			CliError::Run(err) => err,
		};
		match (err.kind(), err) {
			(_, RunError::BrowserLaunch(_)) => ErrorCode::BrowserLaunchFailed,
			(_, RunError::Navigation { .. }) => ErrorCode::NavigationFailed,
			(ErrorKind::Resource, _) => ErrorCode::BrowserCrashed,
			(ErrorKind::Config, _) => ErrorCode::ConfigError,
			(ErrorKind::Authentication, _) => ErrorCode::AuthError,
			(ErrorKind::UiInteraction, _) => ErrorCode::UiInteractionFailed,
			(ErrorKind::ToolSpecRejected, _) => ErrorCode::ToolSpecRejected,
			(ErrorKind::Internal, RunError::Io(_) | RunError::CookieStore { .. }) => ErrorCode::IoError,
			(ErrorKind::Internal, _) => ErrorCode::InternalError,
		}
	}

	pub fn exit_code(&self) -> i32 {
		self.code().exit_code()
	}

	/// Convert to the structured error carried by the result envelope.
	pub fn to_command_error(&self) -> CommandError {
		let details = match self {
			CliError::Run(RunError::UiInteraction { step, attempts, source }) => Some(json!({
				"step": step,
				"attempts": attempts,
				"cause": source.to_string(),
			})),
			CliError::Run(RunError::Config { path, .. }) | CliError::Settings { path, .. } => {
				Some(json!({ "path": path }))
			}
			CliError::Run(RunError::AuthenticationTimeout { waited_secs }) => Some(json!({ "waitedSecs": waited_secs })),
			_ => None,
		};
		CommandError {
			code: self.code(),
			message: self.to_string(),
			details,
		}
	}
}
