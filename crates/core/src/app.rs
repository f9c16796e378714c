//! Capability interface between the runner and the automated application.
//!
//! The runner only talks to [`Launcher`] and [`TargetApp`]. The Chrome
//! adapter drives the real site over CDP; the fake adapter scripts responses
//! for tests.

use std::fmt;

use async_trait::async_trait;
use gizmo_protocol::SessionCookies;
use serde::Serialize;

use crate::error::Result;

/// Whether restored cookies grant a signed-in session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
	Authenticated,
	LoginRequired,
}

/// An existing item in the application's listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRef {
	pub name: String,
	/// Position in the listing, used to locate its edit control.
	pub index: usize,
	pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
	Create,
	Update,
}

impl fmt::Display for EditMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Create => "create",
			Self::Update => "update",
		})
	}
}

/// A unit of editor work, named in errors and retry logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
	Editor,
	Name,
	Description,
	Instructions,
	ConversationStarters,
	Tool,
	Submit,
}

impl fmt::Display for Step {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Editor => "editor",
			Self::Name => "name",
			Self::Description => "description",
			Self::Instructions => "instructions",
			Self::ConversationStarters => "conversation starters",
			Self::Tool => "tool",
			Self::Submit => "submit",
		})
	}
}

/// A value for one editor field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
	Name(&'a str),
	Description(&'a str),
	Instructions(&'a str),
	/// Already capped to the editor's slot count.
	ConversationStarters(&'a [String]),
}

impl FieldValue<'_> {
	pub fn step(&self) -> Step {
		match self {
			Self::Name(_) => Step::Name,
			Self::Description(_) => Step::Description,
			Self::Instructions(_) => Step::Instructions,
			Self::ConversationStarters(_) => Step::ConversationStarters,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
	Accepted,
	/// The application's own validation message, verbatim.
	Rejected(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitReceipt {
	pub url: Option<String>,
}

/// Starts a browser session against the target application.
#[async_trait]
pub trait Launcher: Send + Sync {
	/// Failures here are [`Error::BrowserLaunch`](crate::Error::BrowserLaunch).
	async fn launch(&self, cookies: Option<&SessionCookies>) -> Result<Box<dyn TargetApp>>;
}

/// Primitive operations on the target application.
///
/// Element-level failures are reported as transient errors and retried by the
/// runner; implementations never retry on their own.
#[async_trait]
pub trait TargetApp: Send {
	/// Opens the application and reports whether a login is needed.
	async fn session_status(&mut self) -> Result<SessionStatus>;

	/// Starts the interactive login flow. Returns once the login form is shown.
	async fn begin_login(&mut self) -> Result<()>;

	/// Checks once for the signed-in marker.
	async fn poll_login(&mut self) -> Result<bool>;

	async fn export_cookies(&mut self) -> Result<SessionCookies>;

	/// Looks up an item whose display name equals `name` exactly.
	async fn find_item(&mut self, name: &str) -> Result<Option<ItemRef>>;

	/// Opens the editor for `item`, or a blank editor when `None`.
	async fn open_editor(&mut self, item: Option<&ItemRef>) -> Result<()>;

	async fn fill_field(&mut self, value: FieldValue<'_>) -> Result<()>;

	/// Pastes `document` into the action editor and reports the validation verdict.
	async fn register_tool(&mut self, document: &str) -> Result<ToolOutcome>;

	async fn submit(&mut self, mode: EditMode) -> Result<SubmitReceipt>;

	async fn close(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginEvent {
	/// The login form is shown and the runner is waiting.
	Started,
	Completed,
}

/// Out-of-band "login is done" signal from the operator.
#[async_trait]
pub trait LoginSignal: Send {
	/// Resolves when the operator reports the login as finished.
	///
	/// Must be cancel-safe: the runner races it against a poll timer.
	async fn confirmed(&mut self);

	fn notify(&mut self, _event: LoginEvent) {}
}

/// A signal that never fires; login completion is detected by polling only.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSignal;

#[async_trait]
impl LoginSignal for NoSignal {
	async fn confirmed(&mut self) {
		std::future::pending::<()>().await
	}
}
