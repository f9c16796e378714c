//! Session Runner: drives one create-or-update of an agent end to end.
//!
//! A run moves through `NotAuthenticated -> Authenticated -> Creating |
//! Updating -> Submitted`; any error ends it in the failed state. The browser
//! is launched per run attempt and closed on every exit path. When the browser
//! itself dies the whole run is restarted with a fresh one, reusing the
//! cookies saved after authentication.

use std::path::Path;
use std::time::{Duration, Instant};

use gizmo_protocol::{AgentConfig, SessionCookies};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::app::{
	EditMode, FieldValue, ItemRef, Launcher, LoginEvent, LoginSignal, NoSignal, SessionStatus, Step, SubmitReceipt,
	TargetApp, ToolOutcome,
};
use crate::config::{RunPlan, ToolSpec};
use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use crate::store::SessionStore;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
	NotAuthenticated,
	Authenticated,
	Creating,
	Updating,
	Submitted,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
	pub name: String,
	pub mode: EditMode,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
	pub phases: Vec<RunPhase>,
	pub conversation_starters: usize,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub tool: Option<String>,
	/// Browser sessions used, including restarts.
	pub runs: u32,
}

#[derive(Debug, Clone)]
pub struct RunnerOptions {
	/// Per-step retry on transient element failures.
	pub field_retry: RetryPolicy,
	/// Whole-run restarts after the browser fails to start or dies.
	pub restart: RetryPolicy,
	/// `None` waits for the human indefinitely.
	pub login_timeout: Option<Duration>,
	pub login_poll_interval: Duration,
}

impl Default for RunnerOptions {
	fn default() -> Self {
		Self {
			field_retry: RetryPolicy::default(),
			restart: RetryPolicy::restart(),
			login_timeout: None,
			login_poll_interval: Duration::from_secs(2),
		}
	}
}

/// One retryable unit of editor work.
#[derive(Debug, Clone, Copy)]
enum Action<'a> {
	OpenEditor(Option<&'a ItemRef>),
	Fill(FieldValue<'a>),
	Tool(&'a str),
}

impl Action<'_> {
	fn step(&self) -> Step {
		match self {
			Self::OpenEditor(_) => Step::Editor,
			Self::Fill(value) => value.step(),
			Self::Tool(_) => Step::Tool,
		}
	}
}

async fn perform(app: &mut dyn TargetApp, action: Action<'_>) -> Result<()> {
	match action {
		Action::OpenEditor(item) => app.open_editor(item).await,
		Action::Fill(value) => app.fill_field(value).await,
		Action::Tool(document) => match app.register_tool(document).await? {
			ToolOutcome::Accepted => Ok(()),
			ToolOutcome::Rejected(message) => Err(Error::ToolSpecRejected { message }),
		},
	}
}

pub struct Runner<L> {
	launcher: L,
	store: SessionStore,
	signal: Box<dyn LoginSignal>,
	options: RunnerOptions,
}

impl<L: Launcher> Runner<L> {
	pub fn new(launcher: L, store: SessionStore) -> Self {
		Self {
			launcher,
			store,
			signal: Box::new(NoSignal),
			options: RunnerOptions::default(),
		}
	}

	pub fn with_options(mut self, options: RunnerOptions) -> Self {
		self.options = options;
		self
	}

	pub fn with_login_signal(mut self, signal: impl LoginSignal + 'static) -> Self {
		self.signal = Box::new(signal);
		self
	}

	/// Loads the inputs at `config_path` and creates or updates the agent.
	///
	/// Input errors are raised before any browser is launched.
	pub async fn run(&mut self, config_path: &Path) -> Result<RunReport> {
		let plan = RunPlan::load(config_path)?;
		self.run_plan(&plan).await
	}

	pub async fn run_plan(&mut self, plan: &RunPlan) -> Result<RunReport> {
		let policy = self.options.restart;
		let mut attempt = 1;
		loop {
			match self.run_once(plan).await {
				Ok(mut report) => {
					report.runs = attempt;
					return Ok(report);
				}
				Err(err) if err.is_resource() && policy.allows_retry(attempt) => {
					let delay = policy.delay_after(attempt);
					warn!(
						target = "gizmo",
						attempt,
						error = %err,
						"browser failure; restarting run in {delay:?}"
					);
					tokio::time::sleep(delay).await;
					attempt += 1;
				}
				Err(err) => return Err(err),
			}
		}
	}

	/// Cookies from the previous run, if any survived.
	pub fn restore_session(&self) -> Option<SessionCookies> {
		self.store.load()
	}

	async fn run_once(&mut self, plan: &RunPlan) -> Result<RunReport> {
		let cookies = self.restore_session();
		let mut app = self.launcher.launch(cookies.as_ref()).await?;
		let result = self.drive(app.as_mut(), plan).await;
		if let Err(err) = app.close().await {
			warn!(target = "gizmo", error = %err, "failed to close browser");
		}
		if let Err(err) = &result {
			debug!(target = "gizmo", error = %err, "run failed");
		}
		result
	}

	async fn drive(&mut self, app: &mut dyn TargetApp, plan: &RunPlan) -> Result<RunReport> {
		let config = &plan.config;
		let mut phases = vec![RunPhase::NotAuthenticated];

		self.ensure_authenticated(app).await?;
		enter(&mut phases, RunPhase::Authenticated);

		let existing = self.find_existing(app, &config.name).await?;
		let mode = match existing {
			Some(_) => EditMode::Update,
			None => EditMode::Create,
		};
		enter(
			&mut phases,
			match mode {
				EditMode::Create => RunPhase::Creating,
				EditMode::Update => RunPhase::Updating,
			},
		);

		let receipt = self.apply_config(app, existing.as_ref(), plan).await?;
		enter(&mut phases, RunPhase::Submitted);

		let url = receipt.url.or_else(|| existing.and_then(|item| item.url));
		info!(
			target = "gizmo",
			name = %config.name,
			%mode,
			url = url.as_deref().unwrap_or("-"),
			"agent saved"
		);
		Ok(RunReport {
			name: config.name.clone(),
			mode,
			url,
			phases,
			conversation_starters: config.visible_starters().len(),
			tool: plan.tool.as_ref().map(tool_label),
			runs: 1,
		})
	}

	/// Makes sure the session is signed in, pausing for a human login when it
	/// is not, then persists the resulting cookies.
	pub async fn ensure_authenticated(&mut self, app: &mut dyn TargetApp) -> Result<SessionCookies> {
		match app.session_status().await? {
			SessionStatus::Authenticated => info!(target = "gizmo", "restored session is signed in"),
			SessionStatus::LoginRequired => {
				info!(target = "gizmo", "login required; waiting for manual login");
				app.begin_login().await?;
				self.signal.notify(LoginEvent::Started);
				self.await_login(app).await?;
				self.signal.notify(LoginEvent::Completed);
				info!(target = "gizmo", "login completed");
			}
		}

		let jar = app.export_cookies().await?;
		if let Err(err) = self.store.save(&jar) {
			warn!(target = "gizmo", error = %err, "could not persist cookies; next run will need a login");
		}
		Ok(jar)
	}

	async fn await_login(&mut self, app: &mut dyn TargetApp) -> Result<()> {
		let started = Instant::now();
		let interval = self.options.login_poll_interval;
		loop {
			if app.poll_login().await? {
				return Ok(());
			}

			let wait = match self.options.login_timeout {
				Some(limit) => {
					let elapsed = started.elapsed();
					if elapsed >= limit {
						return Err(Error::AuthenticationTimeout {
							waited_secs: elapsed.as_secs(),
						});
					}
					interval.min(limit - elapsed)
				}
				None => interval,
			};

			let confirmed = tokio::select! {
				_ = self.signal.confirmed() => true,
				_ = tokio::time::sleep(wait) => false,
			};
			if confirmed {
				debug!(target = "gizmo", "operator confirmed login");
				return Ok(());
			}
		}
	}

	pub async fn find_existing(&self, app: &mut dyn TargetApp, name: &str) -> Result<Option<ItemRef>> {
		let found = app.find_item(name).await?;
		match &found {
			Some(item) => info!(target = "gizmo", name, index = item.index, "found existing agent"),
			None => info!(target = "gizmo", name, "no existing agent with this name"),
		}
		Ok(found)
	}

	/// Fills every editor field for `plan`, registers its tool, and submits.
	///
	/// `item` selects between updating that agent and creating a new one.
	pub async fn apply_config(
		&self,
		app: &mut dyn TargetApp,
		item: Option<&ItemRef>,
		plan: &RunPlan,
	) -> Result<SubmitReceipt> {
		let config: &AgentConfig = &plan.config;
		let mode = if item.is_some() { EditMode::Update } else { EditMode::Create };

		self.attempt(app, Action::OpenEditor(item)).await?;
		for value in [
			FieldValue::Name(&config.name),
			FieldValue::Description(&config.description),
			FieldValue::Instructions(&config.instructions),
			FieldValue::ConversationStarters(config.visible_starters()),
		] {
			self.attempt(app, Action::Fill(value)).await?;
		}

		if let Some(tool) = &plan.tool {
			self.register_tool(app, tool).await?;
		}

		// Submitting twice could create a duplicate agent, so it gets one try.
		app.submit(mode).await.map_err(|err| {
			if err.is_transient() {
				Error::UiInteraction {
					step: Step::Submit,
					attempts: 1,
					source: Box::new(err),
				}
			} else {
				err
			}
		})
	}

	/// Pastes the tool document into the action editor.
	///
	/// A validation message from the application fails with
	/// [`Error::ToolSpecRejected`] and is not retried.
	pub async fn register_tool(&self, app: &mut dyn TargetApp, tool: &ToolSpec) -> Result<()> {
		info!(target = "gizmo", path = %tool.path.display(), "registering tool");
		self.attempt(app, Action::Tool(&tool.document)).await
	}

	async fn attempt(&self, app: &mut dyn TargetApp, action: Action<'_>) -> Result<()> {
		let policy = self.options.field_retry;
		let step = action.step();
		let mut attempt = 1;
		loop {
			match perform(app, action).await {
				Ok(()) => {
					debug!(target = "gizmo", %step, attempt, "step done");
					return Ok(());
				}
				Err(err) if !err.is_transient() => return Err(err),
				Err(err) if policy.allows_retry(attempt) => {
					let delay = policy.delay_after(attempt);
					warn!(
						target = "gizmo",
						%step,
						attempt,
						error = %err,
						"step failed; retrying in {delay:?}"
					);
					tokio::time::sleep(delay).await;
					attempt += 1;
				}
				Err(err) => {
					return Err(Error::UiInteraction {
						step,
						attempts: attempt,
						source: Box::new(err),
					});
				}
			}
		}
	}
}

fn enter(phases: &mut Vec<RunPhase>, next: RunPhase) {
	info!(target = "gizmo", from = ?phases.last(), to = ?next, "phase");
	phases.push(next);
}

fn tool_label(tool: &ToolSpec) -> String {
	match tool.info.as_ref().and_then(|info| info.title()) {
		Some(title) => title.to_string(),
		None => tool.path.display().to_string(),
	}
}
