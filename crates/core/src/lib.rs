//! Browser automation for creating and updating custom agents.
//!
//! # Main Types
//!
//! - [`Runner`] - Orchestrates login, lookup, editing and submission for one config
//! - [`TargetApp`] / [`Launcher`] - Capability seam the runner drives
//! - [`ChromeLauncher`] - Drives a real Chromium over the DevTools protocol
//! - [`RetryPolicy`] - Bounded retry with backoff for flaky UI steps
//! - [`SessionStore`] - Cookie jar persisted between runs
//!
//! # Example
//!
//! ```ignore
//! use gizmo::{ChromeLauncher, ChromeSettings, Runner, SessionStore};
//!
//! let launcher = ChromeLauncher::new(ChromeSettings::default());
//! let mut runner = Runner::new(launcher, SessionStore::new("chatgpt_cookies.json"));
//! let report = runner.run("agent.json".as_ref()).await?;
//! println!("{} {}", report.mode, report.name);
//! ```

pub mod app;
pub mod chrome;
pub mod config;
pub mod error;
#[cfg(any(test, feature = "fake"))]
pub mod fake;
pub mod retry;
pub mod runner;
pub mod store;

pub use app::{
	EditMode, FieldValue, ItemRef, Launcher, LoginEvent, LoginSignal, NoSignal, SessionStatus, Step, SubmitReceipt,
	TargetApp, ToolOutcome,
};
pub use chrome::{BROWSER_PATH_ENV, ChromeApp, ChromeLauncher, ChromeSettings, DEFAULT_BASE_URL, LOCAL_BROWSERS_DIR};
pub use config::{RunPlan, ToolSpec, load_config};
pub use error::{Error, ErrorKind, Result};
pub use gizmo_protocol as protocol;
pub use gizmo_protocol::{AgentConfig, SessionCookies};
pub use retry::RetryPolicy;
pub use runner::{RunPhase, RunReport, Runner, RunnerOptions};
pub use store::{DEFAULT_COOKIE_FILE, SessionStore};
