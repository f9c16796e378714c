//! Layered run settings.
//!
//! Each value comes from the first source that sets it: command-line flag,
//! environment variable, settings file, built-in default. The browser path
//! environment variable is read by the launcher itself so it sits between the
//! flag and the file as well.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use gizmo::{ChromeSettings, DEFAULT_BASE_URL, DEFAULT_COOKIE_FILE, RetryPolicy, RunnerOptions};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cli::Cli;
use crate::error::{CliError, Result};

pub const COOKIES_ENV: &str = "GIZMO_COOKIES";

/// Contents of `settings.json`; every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
	#[serde(default)]
	pub cookies_file: Option<PathBuf>,
	#[serde(default)]
	pub base_url: Option<String>,
	#[serde(default)]
	pub login_timeout_secs: Option<u64>,
	#[serde(default)]
	pub browser_path: Option<PathBuf>,
	#[serde(default)]
	pub headless: Option<bool>,
	#[serde(default)]
	pub field_attempts: Option<u32>,
}

impl Settings {
	pub fn default_path() -> Option<PathBuf> {
		dirs::config_dir().map(|dir| dir.join("gizmo").join("settings.json"))
	}

	/// Loads `explicit`, or the default location when `None`.
	///
	/// A missing default file yields empty settings; a missing explicit file
	/// or a malformed one is an error.
	pub fn load(explicit: Option<&Path>) -> Result<Self> {
		let path = match explicit {
			Some(path) => path.to_path_buf(),
			None => match Self::default_path() {
				Some(path) if path.exists() => path,
				_ => return Ok(Self::default()),
			},
		};
		Self::read(&path).map_err(|source| CliError::Settings { path, source })
	}

	fn read(path: &Path) -> anyhow::Result<Self> {
		let text = fs::read_to_string(path).context("could not read file")?;
		let settings = serde_json::from_str(&text).context("invalid settings JSON")?;
		debug!(target = "gizmo", path = %path.display(), "loaded settings");
		Ok(settings)
	}
}

/// Effective settings for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
	pub cookies_file: PathBuf,
	pub base_url: String,
	pub login_timeout: Option<Duration>,
	pub headless: bool,
	pub field_attempts: u32,
	pub browser_path: Option<PathBuf>,
	pub configured_browser_path: Option<PathBuf>,
}

impl RunSettings {
	/// `env_cookies` is the value of [`COOKIES_ENV`], if set.
	pub fn resolve(cli: &Cli, settings: Settings, env_cookies: Option<PathBuf>) -> Self {
		Self {
			cookies_file: cli
				.cookies
				.clone()
				.or(env_cookies)
				.or(settings.cookies_file)
				.unwrap_or_else(|| PathBuf::from(DEFAULT_COOKIE_FILE)),
			base_url: cli
				.base_url
				.clone()
				.or(settings.base_url)
				.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
			login_timeout: cli
				.login_timeout
				.or(settings.login_timeout_secs)
				.map(Duration::from_secs),
			headless: cli.headless_override().or(settings.headless).unwrap_or(false),
			field_attempts: cli
				.attempts
				.or(settings.field_attempts)
				.unwrap_or(RetryPolicy::default().max_attempts),
			browser_path: cli.browser.clone(),
			configured_browser_path: settings.browser_path,
		}
	}

	pub fn chrome(&self) -> ChromeSettings {
		ChromeSettings {
			base_url: self.base_url.clone(),
			headless: self.headless,
			browser_path: self.browser_path.clone(),
			configured_browser_path: self.configured_browser_path.clone(),
			..ChromeSettings::default()
		}
	}

	pub fn runner(&self) -> RunnerOptions {
		RunnerOptions {
			field_retry: RetryPolicy::default().with_max_attempts(self.field_attempts),
			login_timeout: self.login_timeout,
			..RunnerOptions::default()
		}
	}
}

#[cfg(test)]
mod tests {
	use clap::Parser;
	use tempfile::TempDir;

	use super::*;

	fn cli(args: &[&str]) -> Cli {
		Cli::try_parse_from(std::iter::once("gizmo").chain(args.iter().copied()).chain(["agent.json"])).unwrap()
	}

	#[test]
	fn defaults_apply_without_any_source() {
		let run = RunSettings::resolve(&cli(&[]), Settings::default(), None);
		assert_eq!(run.cookies_file, PathBuf::from(DEFAULT_COOKIE_FILE));
		assert_eq!(run.base_url, DEFAULT_BASE_URL);
		assert_eq!(run.login_timeout, None);
		assert!(!run.headless);
		assert_eq!(run.field_attempts, 3);
	}

	#[test]
	fn flag_beats_env_beats_file() {
		let file = Settings {
			cookies_file: Some("from-file.json".into()),
			..Settings::default()
		};

		let run = RunSettings::resolve(&cli(&["--cookies", "from-flag.json"]), file.clone(), Some("from-env.json".into()));
		assert_eq!(run.cookies_file, PathBuf::from("from-flag.json"));

		let run = RunSettings::resolve(&cli(&[]), file.clone(), Some("from-env.json".into()));
		assert_eq!(run.cookies_file, PathBuf::from("from-env.json"));

		let run = RunSettings::resolve(&cli(&[]), file, None);
		assert_eq!(run.cookies_file, PathBuf::from("from-file.json"));
	}

	#[test]
	fn file_values_fill_unset_flags() {
		let file = Settings {
			login_timeout_secs: Some(300),
			headless: Some(true),
			field_attempts: Some(5),
			base_url: Some("https://staging.example".into()),
			browser_path: Some("/opt/chrome".into()),
			..Settings::default()
		};
		let run = RunSettings::resolve(&cli(&["--attempts", "2"]), file, None);
		assert_eq!(run.login_timeout, Some(Duration::from_secs(300)));
		assert!(run.headless);
		assert_eq!(run.field_attempts, 2);
		assert_eq!(run.base_url, "https://staging.example");
		assert_eq!(run.browser_path, None);
		assert_eq!(run.configured_browser_path, Some(PathBuf::from("/opt/chrome")));
		assert_eq!(run.runner().field_retry.max_attempts, 2);
	}

	#[test]
	fn headed_flag_overrides_headless_settings() {
		let file = Settings {
			headless: Some(true),
			..Settings::default()
		};
		assert!(RunSettings::resolve(&cli(&[]), file.clone(), None).headless);
		assert!(!RunSettings::resolve(&cli(&["--headed"]), file, None).headless);
	}

	#[test]
	fn settings_file_uses_camel_case_keys() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("settings.json");
		fs::write(&path, r#"{"cookiesFile": "jar.json", "loginTimeoutSecs": 90}"#).unwrap();

		let settings = Settings::load(Some(&path)).unwrap();
		assert_eq!(settings.cookies_file, Some(PathBuf::from("jar.json")));
		assert_eq!(settings.login_timeout_secs, Some(90));
	}

	#[test]
	fn malformed_settings_file_is_an_error() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("settings.json");
		fs::write(&path, "cookiesFile = 1").unwrap();

		let err = Settings::load(Some(&path)).unwrap_err();
		assert_eq!(err.exit_code(), 2);
		assert!(err.to_string().contains("invalid settings JSON"), "got: {err}");
	}

	#[test]
	fn missing_explicit_settings_file_is_an_error() {
		let dir = TempDir::new().unwrap();
		assert!(Settings::load(Some(&dir.path().join("absent.json"))).is_err());
	}
}
