//! Browser binary discovery and launch configuration.

use std::fs;
use std::path::{Path, PathBuf};

use chromiumoxide::browser::{BrowserConfig, HeadlessMode};

use super::ChromeSettings;
use crate::error::{Error, Result};

/// Overrides the browser search: an executable, or a directory to search.
pub const BROWSER_PATH_ENV: &str = "GIZMO_BROWSER_PATH";

/// Searched when nothing is configured, relative to the working directory.
pub const LOCAL_BROWSERS_DIR: &str = "browsers";

const PATH_CANDIDATES: &[&str] = &[
	"google-chrome-stable",
	"google-chrome",
	"chromium-browser",
	"chromium",
	"chrome",
];

/// Executable names looked for inside a browser directory.
fn executable_names() -> &'static [&'static str] {
	if cfg!(target_os = "windows") {
		&["chrome.exe", "msedge.exe", "chromium.exe"]
	} else if cfg!(target_os = "macos") {
		&[
			"Google Chrome.app/Contents/MacOS/Google Chrome",
			"Chromium.app/Contents/MacOS/Chromium",
			"chrome",
			"chromium",
		]
	} else {
		&["chrome", "chromium", "chromium-browser", "google-chrome"]
	}
}

fn search_dir(dir: &Path) -> Option<PathBuf> {
	executable_names().iter().map(|name| dir.join(name)).find(|p| p.is_file())
}

/// Resolves `path` to an executable: the file itself, or a browser binary
/// directly inside it or one directory down (e.g. `browsers/chrome-linux64/chrome`).
pub fn resolve_in(path: &Path) -> Option<PathBuf> {
	if path.is_file() {
		return Some(path.to_path_buf());
	}
	if !path.is_dir() {
		return None;
	}
	if let Some(found) = search_dir(path) {
		return Some(found);
	}
	let mut children: Vec<PathBuf> = fs::read_dir(path)
		.ok()?
		.flatten()
		.map(|entry| entry.path())
		.filter(|p| p.is_dir())
		.collect();
	children.sort();
	children.iter().find_map(|child| search_dir(child))
}

/// Picks the browser executable.
///
/// Order: explicit path, `GIZMO_BROWSER_PATH`, configured path, the local
/// browsers directory, then `PATH`. A path that was set but holds no browser
/// is a configuration error. `Ok(None)` leaves detection to chromiumoxide.
pub fn discover(
	explicit: Option<&Path>,
	env: Option<&Path>,
	configured: Option<&Path>,
	local_dir: &Path,
) -> Result<Option<PathBuf>> {
	let sources = [
		(explicit, "--browser"),
		(env, BROWSER_PATH_ENV),
		(configured, "browserPath"),
	];
	for (path, source) in sources {
		if let Some(path) = path {
			return match resolve_in(path) {
				Some(found) => Ok(Some(found)),
				None => Err(Error::config(path, format!("no browser executable found (from {source})"))),
			};
		}
	}

	if let Some(found) = resolve_in(local_dir) {
		return Ok(Some(found));
	}

	Ok(PATH_CANDIDATES.iter().find_map(|name| which::which(name).ok()))
}

pub fn browser_config(settings: &ChromeSettings, executable: Option<PathBuf>) -> Result<BrowserConfig> {
	let mode = if settings.headless {
		HeadlessMode::New
	} else {
		HeadlessMode::False
	};
	let mut builder = BrowserConfig::builder()
		.headless_mode(mode)
		.window_size(1280, 900)
		.arg("--disable-blink-features=AutomationControlled")
		.arg("--no-first-run")
		.arg("--no-default-browser-check")
		.arg("--disable-infobars");
	if let Some(agent) = &settings.user_agent {
		builder = builder.arg(format!("--user-agent={agent}"));
	}
	if let Some(executable) = executable {
		builder = builder.chrome_executable(executable);
	}
	builder.build().map_err(Error::BrowserLaunch)
}
