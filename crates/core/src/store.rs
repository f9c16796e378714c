//! Cookie persistence between runs.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use gizmo_protocol::SessionCookies;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Default cookie file name, relative to the working directory.
pub const DEFAULT_COOKIE_FILE: &str = "chatgpt_cookies.json";

/// The on-disk cookie jar.
#[derive(Debug, Clone)]
pub struct SessionStore {
	path: PathBuf,
}

impl SessionStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Loads the jar, dropping cookies that have already expired.
	///
	/// A missing file is the normal first-run case. An unreadable or corrupt
	/// file is reported and treated the same way, forcing a fresh login.
	pub fn load(&self) -> Option<SessionCookies> {
		if !self.path.exists() {
			debug!(target = "gizmo", path = %self.path.display(), "no saved cookies");
			return None;
		}
		let mut jar = match SessionCookies::from_file(&self.path) {
			Ok(jar) => jar,
			Err(e) => {
				warn!(target = "gizmo", path = %self.path.display(), error = %e, "ignoring unreadable cookie file");
				return None;
			}
		};
		let dropped = jar.prune_expired(unix_now());
		debug!(target = "gizmo", loaded = jar.len(), expired = dropped, "restored cookies");
		Some(jar)
	}

	/// Overwrites the jar, creating parent directories as needed.
	pub fn save(&self, jar: &SessionCookies) -> Result<()> {
		let wrap = |source| Error::CookieStore {
			path: self.path.clone(),
			source,
		};
		if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(wrap)?;
		}
		jar.to_file(&self.path).map_err(wrap)?;
		#[cfg(unix)]
		{
			use std::os::unix::fs::PermissionsExt;
			fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600)).map_err(wrap)?;
		}
		debug!(target = "gizmo", path = %self.path.display(), count = jar.len(), "saved cookies");
		Ok(())
	}
}

fn unix_now() -> f64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_secs_f64())
		.unwrap_or_default()
}

#[cfg(test)]
mod tests {
	use gizmo_protocol::Cookie;
	use tempfile::TempDir;

	use super::*;

	#[test]
	fn missing_file_loads_as_none() {
		let dir = TempDir::new().unwrap();
		assert!(SessionStore::new(dir.path().join("c.json")).load().is_none());
	}

	#[test]
	fn corrupt_file_loads_as_none() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("c.json");
		fs::write(&path, "{{{").unwrap();
		assert!(SessionStore::new(&path).load().is_none());
	}

	#[test]
	fn save_then_load_round_trips() {
		let dir = TempDir::new().unwrap();
		let store = SessionStore::new(dir.path().join("nested/state/c.json"));
		let jar = SessionCookies::new(vec![
			Cookie::new("__Secure-next-auth.session-token", "tok", ".chatgpt.com")
				.secure(true)
				.http_only(true),
		]);

		store.save(&jar).unwrap();
		assert_eq!(store.load(), Some(jar));
	}

	#[test]
	fn expired_cookies_are_dropped_on_load() {
		let dir = TempDir::new().unwrap();
		let store = SessionStore::new(dir.path().join("c.json"));
		store
			.save(&SessionCookies::new(vec![
				Cookie::new("stale", "1", "chatgpt.com").expires(1.0),
				Cookie::new("live", "2", "chatgpt.com"),
			]))
			.unwrap();

		let jar = store.load().unwrap();
		assert_eq!(jar.len(), 1);
		assert_eq!(jar.cookies[0].name, "live");
	}

	#[cfg(unix)]
	#[test]
	fn saved_file_is_private() {
		use std::os::unix::fs::PermissionsExt;

		let dir = TempDir::new().unwrap();
		let store = SessionStore::new(dir.path().join("c.json"));
		store.save(&SessionCookies::default()).unwrap();
		let mode = fs::metadata(store.path()).unwrap().permissions().mode();
		assert_eq!(mode & 0o777, 0o600);
	}
}
