//! Chromium adapter over the DevTools protocol.
//!
//! One [`ChromeApp`] owns one browser process and a single page. Elements are
//! located by in-page scripts (see [`dom`]) and clicked through CDP. No method
//! retries on its own; element failures surface as transient errors for the
//! runner to retry.

mod cookies;
mod dom;
mod launch;
pub mod selectors;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use chromiumoxide::page::Page;
use futures::StreamExt;
use gizmo_protocol::SessionCookies;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

pub use self::launch::{BROWSER_PATH_ENV, LOCAL_BROWSERS_DIR, discover, resolve_in};
use self::selectors::*;
use crate::app::{EditMode, FieldValue, ItemRef, Launcher, SessionStatus, SubmitReceipt, TargetApp, ToolOutcome};
use crate::error::{Error, Result, classify_browser_error};

pub const DEFAULT_BASE_URL: &str = "https://chatgpt.com";

#[derive(Debug, Clone)]
pub struct ChromeSettings {
	pub base_url: String,
	pub headless: bool,
	/// Browser path given on the command line; wins over the environment.
	pub browser_path: Option<PathBuf>,
	/// Browser path from the settings file; loses to the environment.
	pub configured_browser_path: Option<PathBuf>,
	pub local_browsers_dir: PathBuf,
	pub user_agent: Option<String>,
	/// How long to wait for a required element to appear.
	pub element_timeout: Duration,
	/// Pause after navigation and clicks that re-render the editor.
	pub settle: Duration,
	/// How long to look for the login button before assuming a live session.
	pub login_check_timeout: Duration,
	pub dialog_timeout: Duration,
	pub poll_interval: Duration,
}

impl Default for ChromeSettings {
	fn default() -> Self {
		Self {
			base_url: DEFAULT_BASE_URL.to_string(),
			headless: false,
			browser_path: None,
			configured_browser_path: None,
			local_browsers_dir: PathBuf::from(LOCAL_BROWSERS_DIR),
			user_agent: None,
			element_timeout: Duration::from_secs(5),
			settle: Duration::from_secs(2),
			login_check_timeout: Duration::from_secs(3),
			dialog_timeout: Duration::from_secs(10),
			poll_interval: Duration::from_millis(250),
		}
	}
}

/// Launches a local Chromium for each run.
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
	settings: ChromeSettings,
}

impl ChromeLauncher {
	pub fn new(settings: ChromeSettings) -> Self {
		Self { settings }
	}
}

#[async_trait]
impl Launcher for ChromeLauncher {
	async fn launch(&self, cookies: Option<&SessionCookies>) -> Result<Box<dyn TargetApp>> {
		let env = std::env::var_os(BROWSER_PATH_ENV).map(PathBuf::from);
		let executable = discover(
			self.settings.browser_path.as_deref(),
			env.as_deref(),
			self.settings.configured_browser_path.as_deref(),
			&self.settings.local_browsers_dir,
		)?;
		match &executable {
			Some(path) => info!(target = "gizmo", path = %path.display(), "launching browser"),
			None => info!(target = "gizmo", "launching browser found by chromiumoxide"),
		}

		let config = launch::browser_config(&self.settings, executable)?;
		let (browser, mut handler) = Browser::launch(config)
			.await
			.map_err(|e| Error::BrowserLaunch(e.to_string()))?;
		let handler = tokio::spawn(async move {
			while let Some(event) = handler.next().await {
				if let Err(e) = event {
					debug!(target = "gizmo", error = %e, "browser event error");
				}
			}
		});

		let page = match browser.new_page("about:blank").await {
			Ok(page) => page,
			Err(e) => {
				handler.abort();
				return Err(Error::BrowserLaunch(e.to_string()));
			}
		};

		let app = ChromeApp {
			browser,
			page,
			handler,
			settings: self.settings.clone(),
		};
		if let Some(jar) = cookies.filter(|jar| !jar.is_empty()) {
			app.restore_cookies(jar).await;
		}
		Ok(Box::new(app))
	}
}

#[derive(Debug, Deserialize)]
struct ListingHit {
	index: usize,
	url: Option<String>,
}

/// A launched browser showing the target application.
pub struct ChromeApp {
	browser: Browser,
	page: Page,
	handler: JoinHandle<()>,
	settings: ChromeSettings,
}

impl ChromeApp {
	fn url(&self, path: &str) -> String {
		format!("{}{path}", self.settings.base_url.trim_end_matches('/'))
	}

	async fn restore_cookies(&self, jar: &SessionCookies) {
		let params = cookies::to_params(jar, &self.settings.base_url);
		match self.page.set_cookies(params).await {
			Ok(_) => debug!(target = "gizmo", count = jar.len(), "restored cookies into browser"),
			Err(e) => warn!(target = "gizmo", error = %e, "could not restore cookies; a login will be needed"),
		}
	}

	async fn goto(&self, path: &str) -> Result<()> {
		let url = self.url(path);
		debug!(target = "gizmo", %url, "navigating");
		if let Err(e) = self.page.goto(url.as_str()).await {
			let msg = e.to_string();
			return Err(match classify_browser_error(&url, &msg) {
				crashed @ Error::BrowserCrashed(_) => crashed,
				_ => Error::Navigation { url, reason: msg },
			});
		}
		if let Err(e) = self.page.evaluate(dom::HIDE_WEBDRIVER).await {
			debug!(target = "gizmo", error = %e, "could not mask webdriver flag");
		}
		self.wait_ready().await;
		sleep(self.settings.settle).await;
		Ok(())
	}

	async fn wait_ready(&self) {
		let deadline = Instant::now() + self.settings.element_timeout;
		while Instant::now() < deadline {
			if let Ok(true) = self.eval::<bool>(dom::DOCUMENT_READY.to_string(), "document ready").await {
				return;
			}
			sleep(self.settings.poll_interval).await;
		}
	}

	/// Evaluates `js`, treating a `null`/`undefined` result as JSON null.
	async fn eval<T: DeserializeOwned>(&self, js: String, what: &str) -> Result<T> {
		let result = self
			.page
			.evaluate(js)
			.await
			.map_err(|e| classify_browser_error(what, &e.to_string()))?;
		let value = result.value().cloned().unwrap_or(serde_json::Value::Null);
		serde_json::from_value(value).map_err(|e| Error::JsEval(format!("{what}: {e}")))
	}

	/// Polls until `locator` matches, tagging the match.
	async fn wait_for_mark(&self, locator: &Locator, timeout: Duration) -> Result<()> {
		let js = dom::mark(locator)?;
		let deadline = Instant::now() + timeout;
		loop {
			if self.eval::<bool>(js.clone(), locator.label).await? {
				return Ok(());
			}
			if Instant::now() >= deadline {
				return Err(Error::Timeout {
					ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
					condition: locator.label.to_string(),
				});
			}
			sleep(self.settings.poll_interval).await;
		}
	}

	async fn appears(&self, locator: &Locator, timeout: Duration) -> Result<bool> {
		match self.wait_for_mark(locator, timeout).await {
			Ok(()) => Ok(true),
			Err(Error::Timeout { .. }) => Ok(false),
			Err(e) => Err(e),
		}
	}

	async fn click_marked(&self, what: &str) -> Result<()> {
		let element = self
			.page
			.find_element(dom::MARKED)
			.await
			.map_err(|e| classify_browser_error(what, &e.to_string()))?;
		element
			.click()
			.await
			.map_err(|e| classify_browser_error(what, &e.to_string()))?;
		Ok(())
	}

	async fn click(&self, locator: &Locator, timeout: Duration) -> Result<()> {
		self.wait_for_mark(locator, timeout).await?;
		self.click_marked(locator.label).await
	}

	/// Clicks `locator` if it shows up within `timeout`.
	async fn try_click(&self, locator: &Locator, timeout: Duration) -> Result<bool> {
		if !self.appears(locator, timeout).await? {
			return Ok(false);
		}
		self.click_marked(locator.label).await?;
		Ok(true)
	}

	async fn fill_marked(&self, what: &str, text: &str) -> Result<()> {
		let status: String = self.eval(dom::fill_marked(text)?, what).await?;
		match status.as_str() {
			"ok" => Ok(()),
			"disabled" => Err(Error::NotInteractable {
				selector: what.to_string(),
				reason: "field is disabled or read-only".into(),
			}),
			_ => Err(Error::ElementNotFound {
				selector: what.to_string(),
			}),
		}
	}

	async fn fill(&self, locator: &Locator, text: &str) -> Result<()> {
		self.wait_for_mark(locator, self.settings.element_timeout).await?;
		self.fill_marked(locator.label, text).await
	}

	/// Tags starter slot `index`; returns the number of visible slots.
	async fn mark_starter(&self, index: usize) -> Result<usize> {
		let count: i64 = self
			.eval(dom::mark_in_section(&STARTERS_SECTION, STARTER_INPUT, index)?, STARTERS_SECTION.label)
			.await?;
		usize::try_from(count).map_err(|_| Error::ElementNotFound {
			selector: STARTERS_SECTION.label.to_string(),
		})
	}

	async fn fill_starters(&self, starters: &[String]) -> Result<()> {
		for (index, starter) in starters.iter().enumerate() {
			if index >= self.mark_starter(index).await? {
				return Err(Error::ElementNotFound {
					selector: format!("conversation starter slot {}", index + 1),
				});
			}
			self.fill_marked("conversation starter", starter).await?;
			// the editor appends the next empty slot after a short delay
			sleep(self.settings.poll_interval).await;
		}

		// Slots past the configured list still hold values from an earlier
		// version; clear them from the back so indexes stay stable.
		let values: Option<Vec<String>> = self
			.eval(dom::section_values(&STARTERS_SECTION, STARTER_INPUT)?, STARTERS_SECTION.label)
			.await?;
		let values = values.unwrap_or_default();
		for index in (starters.len()..values.len()).rev() {
			if values[index].is_empty() {
				continue;
			}
			if index < self.mark_starter(index).await? {
				self.fill_marked("conversation starter", "").await?;
				debug!(target = "gizmo", slot = index + 1, "cleared stale conversation starter");
			}
		}
		Ok(())
	}

	async fn wait_for_dialog(&self) -> Result<Option<String>> {
		let js = dom::dialog_kind(SHARE_DIALOG_TEXT, UPDATED_DIALOG_TEXT)?;
		let deadline = Instant::now() + self.settings.dialog_timeout;
		loop {
			let kind: Option<String> = self.eval(js.clone(), "save confirmation").await?;
			if kind.is_some() || Instant::now() >= deadline {
				return Ok(kind);
			}
			sleep(self.settings.poll_interval).await;
		}
	}

	async fn current_url(&self) -> Option<String> {
		self.page.url().await.ok().flatten()
	}
}

#[async_trait]
impl TargetApp for ChromeApp {
	async fn session_status(&mut self) -> Result<SessionStatus> {
		self.goto("/").await?;
		if self.appears(&LOGIN_BUTTON, self.settings.login_check_timeout).await? {
			return Ok(SessionStatus::LoginRequired);
		}
		Ok(SessionStatus::Authenticated)
	}

	async fn begin_login(&mut self) -> Result<()> {
		self.click(&LOGIN_BUTTON, self.settings.element_timeout).await
	}

	async fn poll_login(&mut self) -> Result<bool> {
		let js = dom::exists(&PROFILE_BUTTON)?;
		match self.eval::<bool>(js, PROFILE_BUTTON.label).await {
			Ok(found) => Ok(found),
			Err(e) if e.is_resource() => Err(e),
			// mid-navigation evaluations fail while the login pages redirect
			Err(e) => {
				debug!(target = "gizmo", error = %e, "login check failed");
				Ok(false)
			}
		}
	}

	async fn export_cookies(&mut self) -> Result<SessionCookies> {
		let jar = self
			.page
			.get_cookies()
			.await
			.map_err(|e| classify_browser_error("cookies", &e.to_string()))?;
		Ok(cookies::from_cdp(&jar))
	}

	async fn find_item(&mut self, name: &str) -> Result<Option<ItemRef>> {
		self.goto("/gpts/mine").await?;
		let hit: Option<ListingHit> = self.eval(dom::find_listing_item(LISTING_ITEM, name)?, "agent listing").await?;
		Ok(hit.map(|hit| ItemRef {
			name: name.to_string(),
			index: hit.index,
			url: hit.url,
		}))
	}

	async fn open_editor(&mut self, item: Option<&ItemRef>) -> Result<()> {
		match item {
			None => self.goto("/gpts/editor").await?,
			Some(item) => {
				self.goto("/gpts/mine").await?;
				let js = dom::mark_listing_edit(LISTING_ITEM, &item.name, LISTING_EDIT_BUTTON)?;
				if !self.eval::<bool>(js, "edit button").await? {
					return Err(Error::ElementNotFound {
						selector: format!("edit button for {:?}", item.name),
					});
				}
				self.click_marked("edit button").await?;
				sleep(self.settings.settle).await;
			}
		}

		if self.try_click(&CONFIGURE_TAB, self.settings.element_timeout).await? {
			sleep(self.settings.settle).await;
		} else {
			debug!(target = "gizmo", "no configure tab; assuming the form is already shown");
		}
		self.wait_for_mark(&NAME_INPUT, self.settings.element_timeout).await
	}

	async fn fill_field(&mut self, value: FieldValue<'_>) -> Result<()> {
		match value {
			FieldValue::Name(text) => self.fill(&NAME_INPUT, text).await,
			FieldValue::Description(text) => self.fill(&DESCRIPTION_INPUT, text).await,
			FieldValue::Instructions(text) => self.fill(&INSTRUCTIONS_INPUT, text).await,
			FieldValue::ConversationStarters(starters) => self.fill_starters(starters).await,
		}
	}

	async fn register_tool(&mut self, document: &str) -> Result<ToolOutcome> {
		let js = dom::mark_action(&ACTIONS_SECTION, CREATE_ACTION_TEXT, &SCHEMA_INPUT)?;
		let deadline = Instant::now() + self.settings.element_timeout;
		let kind = loop {
			let kind: String = self.eval(js.clone(), ACTIONS_SECTION.label).await?;
			if kind != "none" || Instant::now() >= deadline {
				break kind;
			}
			sleep(self.settings.poll_interval).await;
		};
		match kind.as_str() {
			"open" => debug!(target = "gizmo", "action editor already open"),
			"existing" | "create" => {
				debug!(target = "gizmo", action = %kind, "opening the action editor");
				self.click_marked("action button").await?;
				sleep(self.settings.settle).await;
			}
			_ => {
				return Err(Error::ElementNotFound {
					selector: ACTIONS_SECTION.label.to_string(),
				});
			}
		}

		self.fill(&SCHEMA_INPUT, document).await?;
		// validation runs asynchronously after the schema changes
		sleep(self.settings.settle).await;
		let js = dom::schema_problem(&SCHEMA_INPUT, &ACTION_EDITOR_BACK, SCHEMA_ERRORS)?;
		let problem: Option<String> = self.eval(js, "schema validation").await?;
		if let Some(message) = problem {
			warn!(target = "gizmo", %message, "application rejected the tool document");
			return Ok(ToolOutcome::Rejected(message));
		}

		if !self.try_click(&ACTION_EDITOR_BACK, self.settings.element_timeout).await? {
			debug!(target = "gizmo", "no back button in the action editor");
		}
		sleep(self.settings.settle).await;
		Ok(ToolOutcome::Accepted)
	}

	async fn submit(&mut self, mode: EditMode) -> Result<SubmitReceipt> {
		let (primary, secondary) = match mode {
			EditMode::Create => (&CREATE_BUTTON, &UPDATE_BUTTON),
			EditMode::Update => (&UPDATE_BUTTON, &CREATE_BUTTON),
		};
		let clicked = self.try_click(primary, self.settings.dialog_timeout).await?
			|| self.try_click(secondary, self.settings.poll_interval).await?;
		if !clicked {
			return Err(Error::ElementNotFound {
				selector: primary.label.to_string(),
			});
		}
		sleep(self.settings.settle).await;

		match self.wait_for_dialog().await?.as_deref() {
			Some("share") => {
				if !self.try_click(&ONLY_ME_OPTION, self.settings.element_timeout).await? {
					warn!(target = "gizmo", "\"Only me\" option not found; keeping the default visibility");
				}
				sleep(self.settings.poll_interval).await;
				self.click(&DIALOG_SAVE_BUTTON, self.settings.element_timeout).await?;
				sleep(self.settings.settle).await;
			}
			Some(_) => debug!(target = "gizmo", "update confirmed"),
			None => warn!(target = "gizmo", "no confirmation dialog appeared after saving"),
		}

		if self.try_click(&VIEW_GPT, self.settings.element_timeout).await? {
			sleep(self.settings.settle).await;
		}
		let url = self.current_url().await.filter(|url| url.contains("/g/"));
		Ok(SubmitReceipt { url })
	}

	async fn close(&mut self) -> Result<()> {
		let result = self.browser.close().await;
		// a failed close leaves the process to be killed when the browser is dropped
		if result.is_ok() {
			let _ = self.browser.wait().await;
		}
		self.handler.abort();
		result
			.map(|_| ())
			.map_err(|e| Error::BrowserCrashed(format!("close failed: {e}")))
	}
}
