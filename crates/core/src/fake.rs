//! Scripted in-memory target application.
//!
//! Records every interaction so tests can assert on ordering, and lets a test
//! inject transient failures, tool rejections and browser crashes. State is
//! shared between the [`FakeLauncher`] handle kept by the test and every
//! [`FakeApp`] it launches, so items created by one run are visible to the next.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use gizmo_protocol::{Cookie, SessionCookies};

use crate::app::{EditMode, FieldValue, ItemRef, Launcher, SessionStatus, Step, SubmitReceipt, TargetApp, ToolOutcome};
use crate::error::{Error, Result};

/// One recorded interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum FakeEvent {
	Launch { restored: usize },
	SessionStatus(SessionStatus),
	BeginLogin,
	PollLogin,
	ExportCookies,
	FindItem(String),
	OpenEditor(Option<String>),
	Fill { step: Step, values: Vec<String> },
	RegisterTool(String),
	Submit(EditMode),
	Close,
}

#[derive(Debug, Default)]
struct FakeState {
	items: Vec<String>,
	/// Cookies the application accepts as a signed-in session.
	valid_session: Option<SessionCookies>,
	jar: SessionCookies,
	/// Number of polls after `begin_login` until the login completes.
	login_after_polls: Option<u32>,
	polls: u32,
	failures: HashMap<Step, u32>,
	rejection: Option<String>,
	launch_failures: u32,
	crash_on: Option<(Step, u32)>,
	events: Vec<FakeEvent>,
}

impl FakeState {
	fn take_failure(&mut self, step: Step) -> Result<()> {
		if let Some((crash_step, remaining)) = self.crash_on.as_mut() {
			if *crash_step == step && *remaining > 0 {
				*remaining -= 1;
				return Err(Error::BrowserCrashed(format!("renderer crashed during {step}")));
			}
		}
		match self.failures.get_mut(&step) {
			Some(remaining) if *remaining > 0 => {
				*remaining -= 1;
				Err(Error::ElementNotFound {
					selector: format!("fake {step} control"),
				})
			}
			_ => Ok(()),
		}
	}
}

/// Test handle and [`Launcher`] for [`FakeApp`].
#[derive(Debug, Clone, Default)]
pub struct FakeLauncher {
	state: Arc<Mutex<FakeState>>,
}

impl FakeLauncher {
	/// An application with no items, no valid session, and a login that
	/// completes on the first poll.
	pub fn new() -> Self {
		let launcher = Self::default();
		launcher.lock().login_after_polls = Some(1);
		launcher
	}

	pub fn with_item(self, name: impl Into<String>) -> Self {
		self.lock().items.push(name.into());
		self
	}

	/// Treats `cookies` as a live session.
	pub fn with_session(self, cookies: SessionCookies) -> Self {
		self.lock().valid_session = Some(cookies);
		self
	}

	pub fn login_after_polls(self, polls: u32) -> Self {
		self.lock().login_after_polls = Some(polls);
		self
	}

	pub fn never_login(self) -> Self {
		self.lock().login_after_polls = None;
		self
	}

	/// Makes the next `times` attempts at `step` fail with a transient error.
	pub fn fail_step(self, step: Step, times: u32) -> Self {
		self.lock().failures.insert(step, times);
		self
	}

	pub fn reject_tool(self, message: impl Into<String>) -> Self {
		self.lock().rejection = Some(message.into());
		self
	}

	pub fn fail_launches(self, times: u32) -> Self {
		self.lock().launch_failures = times;
		self
	}

	/// Makes the next `times` attempts at `step` fail as a browser crash.
	pub fn crash_on(self, step: Step, times: u32) -> Self {
		self.lock().crash_on = Some((step, times));
		self
	}

	pub fn events(&self) -> Vec<FakeEvent> {
		self.lock().events.clone()
	}

	pub fn items(&self) -> Vec<String> {
		self.lock().items.clone()
	}

	pub fn count(&self, pred: impl Fn(&FakeEvent) -> bool) -> usize {
		self.lock().events.iter().filter(|e| pred(e)).count()
	}

	fn lock(&self) -> MutexGuard<'_, FakeState> {
		self.state.lock().unwrap_or_else(|e| e.into_inner())
	}
}

#[async_trait]
impl Launcher for FakeLauncher {
	async fn launch(&self, cookies: Option<&SessionCookies>) -> Result<Box<dyn TargetApp>> {
		let mut state = self.lock();
		if state.launch_failures > 0 {
			state.launch_failures -= 1;
			return Err(Error::BrowserLaunch("fake browser refused to start".into()));
		}
		state.jar = cookies.cloned().unwrap_or_default();
		state.polls = 0;
		let restored = state.jar.len();
		state.events.push(FakeEvent::Launch { restored });
		Ok(Box::new(FakeApp {
			state: Arc::clone(&self.state),
		}))
	}
}

/// A launched fake session.
#[derive(Debug)]
pub struct FakeApp {
	state: Arc<Mutex<FakeState>>,
}

impl FakeApp {
	fn lock(&self) -> MutexGuard<'_, FakeState> {
		self.state.lock().unwrap_or_else(|e| e.into_inner())
	}
}

#[async_trait]
impl TargetApp for FakeApp {
	async fn session_status(&mut self) -> Result<SessionStatus> {
		let mut state = self.lock();
		let valid = !state.jar.is_empty() && state.valid_session.as_ref() == Some(&state.jar);
		let status = if valid {
			SessionStatus::Authenticated
		} else {
			SessionStatus::LoginRequired
		};
		state.events.push(FakeEvent::SessionStatus(status));
		Ok(status)
	}

	async fn begin_login(&mut self) -> Result<()> {
		let mut state = self.lock();
		state.polls = 0;
		state.events.push(FakeEvent::BeginLogin);
		Ok(())
	}

	async fn poll_login(&mut self) -> Result<bool> {
		let mut state = self.lock();
		state.events.push(FakeEvent::PollLogin);
		state.polls += 1;
		let done = state.login_after_polls.is_some_and(|n| state.polls >= n);
		if done {
			let issued = SessionCookies::new(vec![
				Cookie::new("__Secure-next-auth.session-token", format!("fake-{}", state.events.len()), ".chatgpt.com")
					.secure(true)
					.http_only(true),
			]);
			state.valid_session = Some(issued.clone());
			state.jar = issued;
		}
		Ok(done)
	}

	async fn export_cookies(&mut self) -> Result<SessionCookies> {
		let mut state = self.lock();
		state.events.push(FakeEvent::ExportCookies);
		Ok(state.jar.clone())
	}

	async fn find_item(&mut self, name: &str) -> Result<Option<ItemRef>> {
		let mut state = self.lock();
		state.events.push(FakeEvent::FindItem(name.to_string()));
		Ok(state.items.iter().position(|item| item == name).map(|index| ItemRef {
			name: name.to_string(),
			index,
			url: Some(format!("https://chatgpt.com/g/g-fake{index}")),
		}))
	}

	async fn open_editor(&mut self, item: Option<&ItemRef>) -> Result<()> {
		let mut state = self.lock();
		state.take_failure(Step::Editor)?;
		state.events.push(FakeEvent::OpenEditor(item.map(|i| i.name.clone())));
		Ok(())
	}

	async fn fill_field(&mut self, value: FieldValue<'_>) -> Result<()> {
		let mut state = self.lock();
		let step = value.step();
		state.take_failure(step)?;
		let values = match value {
			FieldValue::Name(v) | FieldValue::Description(v) | FieldValue::Instructions(v) => vec![v.to_string()],
			FieldValue::ConversationStarters(starters) => starters.to_vec(),
		};
		state.events.push(FakeEvent::Fill { step, values });
		Ok(())
	}

	async fn register_tool(&mut self, document: &str) -> Result<ToolOutcome> {
		let mut state = self.lock();
		state.take_failure(Step::Tool)?;
		state.events.push(FakeEvent::RegisterTool(document.to_string()));
		Ok(match &state.rejection {
			Some(message) => ToolOutcome::Rejected(message.clone()),
			None => ToolOutcome::Accepted,
		})
	}

	async fn submit(&mut self, mode: EditMode) -> Result<SubmitReceipt> {
		let mut state = self.lock();
		state.take_failure(Step::Submit)?;
		state.events.push(FakeEvent::Submit(mode));
		let name = state
			.events
			.iter()
			.rev()
			.find_map(|e| match e {
				FakeEvent::Fill { step: Step::Name, values } => values.first().cloned(),
				_ => None,
			})
			.unwrap_or_default();
		let existing = state.items.iter().position(|item| *item == name);
		let index = match existing {
			Some(index) => index,
			None => {
				state.items.push(name);
				state.items.len() - 1
			}
		};
		Ok(SubmitReceipt {
			url: Some(format!("https://chatgpt.com/g/g-fake{index}")),
		})
	}

	async fn close(&mut self) -> Result<()> {
		self.lock().events.push(FakeEvent::Close);
		Ok(())
	}
}
