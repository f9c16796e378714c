use std::path::PathBuf;

use thiserror::Error;

use crate::app::Step;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	#[error("configuration error in {}: {reason}", path.display())]
	Config { path: PathBuf, reason: String },

	#[error("login was not completed within {waited_secs}s")]
	AuthenticationTimeout { waited_secs: u64 },

	#[error("could not set {step} after {attempts} attempt(s): {source}")]
	UiInteraction {
		step: Step,
		attempts: u32,
		#[source]
		source: Box<Error>,
	},

	#[error("tool document rejected: {message}")]
	ToolSpecRejected { message: String },

	#[error("browser launch failed: {0}")]
	BrowserLaunch(String),

	#[error("browser stopped responding: {0}")]
	BrowserCrashed(String),

	#[error("navigation to {url} failed: {reason}")]
	Navigation { url: String, reason: String },

	#[error("element not found: {selector}")]
	ElementNotFound { selector: String },

	#[error("element not interactable: {selector} ({reason})")]
	NotInteractable { selector: String, reason: String },

	#[error("timeout after {ms}ms waiting for: {condition}")]
	Timeout { ms: u64, condition: String },

	#[error("javascript evaluation failed: {0}")]
	JsEval(String),

	#[error("cookie file {}: {source}", path.display())]
	CookieStore {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

impl Error {
	pub(crate) fn config(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
		Self::Config {
			path: path.into(),
			reason: reason.into(),
		}
	}

	/// Element-level failures worth another attempt at the same step.
	pub fn is_transient(&self) -> bool {
		matches!(
			self,
			Self::ElementNotFound { .. } | Self::NotInteractable { .. } | Self::Timeout { .. } | Self::JsEval(_)
		)
	}

	/// Browser-level failures; the whole run may be restarted with a fresh browser.
	pub fn is_resource(&self) -> bool {
		matches!(self, Self::BrowserLaunch(_) | Self::BrowserCrashed(_))
	}

	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Config { .. } => ErrorKind::Config,
			Self::AuthenticationTimeout { .. } => ErrorKind::Authentication,
			Self::UiInteraction { .. }
			| Self::ElementNotFound { .. }
			| Self::NotInteractable { .. }
			| Self::Timeout { .. }
			| Self::JsEval(_) => ErrorKind::UiInteraction,
			Self::ToolSpecRejected { .. } => ErrorKind::ToolSpecRejected,
			Self::BrowserLaunch(_) | Self::BrowserCrashed(_) | Self::Navigation { .. } => ErrorKind::Resource,
			Self::CookieStore { .. } | Self::Io(_) | Self::Json(_) => ErrorKind::Internal,
		}
	}
}

/// Coarse failure category, stable across error message changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	Config,
	Authentication,
	UiInteraction,
	ToolSpecRejected,
	Resource,
	Internal,
}

/// Maps a DevTools failure message onto the error taxonomy.
///
/// chromiumoxide reports most failures as opaque strings, so this goes by
/// message content the way Playwright errors are classified by the CLI.
pub(crate) fn classify_browser_error(target: &str, msg: &str) -> Error {
	let lower = msg.to_ascii_lowercase();
	if lower.contains("channel")
		|| lower.contains("websocket")
		|| lower.contains("connection")
		|| lower.contains("target closed")
		|| lower.contains("browser has been closed")
		|| lower.contains("no response")
	{
		return Error::BrowserCrashed(msg.to_string());
	}
	if lower.contains("timeout") || lower.contains("timed out") {
		return Error::Timeout {
			ms: 0,
			condition: target.to_string(),
		};
	}
	if lower.contains("not found") || lower.contains("could not find node") || lower.contains("no node") {
		return Error::ElementNotFound {
			selector: target.to_string(),
		};
	}
	Error::NotInteractable {
		selector: target.to_string(),
		reason: msg.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn element_errors_are_transient() {
		assert!(
			Error::ElementNotFound {
				selector: "#x".into()
			}
			.is_transient()
		);
		assert!(
			Error::Timeout {
				ms: 10,
				condition: "x".into()
			}
			.is_transient()
		);
		assert!(!Error::BrowserCrashed("gone".into()).is_transient());
	}

	#[test]
	fn wrapped_failure_keeps_its_kind() {
		let err = Error::UiInteraction {
			step: Step::Instructions,
			attempts: 3,
			source: Box::new(Error::ElementNotFound {
				selector: "textarea".into(),
			}),
		};
		assert_eq!(err.kind(), ErrorKind::UiInteraction);
		assert!(!err.is_transient());
		assert!(err.to_string().contains("instructions"), "got: {err}");
		assert!(err.to_string().contains("3 attempt"), "got: {err}");
	}

	#[test]
	fn classifies_devtools_messages() {
		assert!(classify_browser_error("btn", "send failed because receiver is gone: channel closed").is_resource());
		assert!(matches!(
			classify_browser_error("btn", "Request timed out."),
			Error::Timeout { .. }
		));
		assert!(matches!(
			classify_browser_error("btn", "Could not find node with given id"),
			Error::ElementNotFound { .. }
		));
		assert!(matches!(
			classify_browser_error("btn", "Node is not clickable"),
			Error::NotInteractable { .. }
		));
	}
}
