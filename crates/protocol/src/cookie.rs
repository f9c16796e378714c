//! Cookie types for session persistence.
//!
//! Cookies use the Playwright JSON shape (`httpOnly`, `sameSite`, `expires` in
//! Unix seconds with `-1` for session cookies), so jars written by earlier
//! Playwright-based tooling load unchanged.

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// SameSite cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SameSite {
	#[serde(rename = "None")]
	None,
	#[default]
	#[serde(rename = "Lax")]
	Lax,
	#[serde(rename = "Strict")]
	Strict,
}

/// A browser cookie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
	pub name: String,

	pub value: String,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub domain: Option<String>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub path: Option<String>,

	/// Unix timestamp in seconds (-1 means session cookie)
	#[serde(skip_serializing_if = "Option::is_none")]
	pub expires: Option<f64>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub http_only: Option<bool>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub secure: Option<bool>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub same_site: Option<SameSite>,
}

impl Cookie {
	/// Creates a cookie scoped to `domain`.
	pub fn new(name: impl Into<String>, value: impl Into<String>, domain: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			value: value.into(),
			domain: Some(domain.into()),
			path: Some("/".into()),
			expires: None,
			http_only: None,
			secure: None,
			same_site: None,
		}
	}

	pub fn expires(mut self, expires: f64) -> Self {
		self.expires = Some(expires);
		self
	}

	pub fn secure(mut self, secure: bool) -> Self {
		self.secure = Some(secure);
		self
	}

	pub fn http_only(mut self, http_only: bool) -> Self {
		self.http_only = Some(http_only);
		self
	}

	pub fn same_site(mut self, same_site: SameSite) -> Self {
		self.same_site = Some(same_site);
		self
	}

	/// Session cookies (no expiry, or a negative one) never count as expired.
	pub fn is_expired_at(&self, now_secs: f64) -> bool {
		match self.expires {
			Some(ts) if ts >= 0.0 => ts < now_secs,
			_ => false,
		}
	}
}

/// The cookie jar persisted between runs.
///
/// Serializes as a bare JSON array. Deserializes from either that array or a
/// Playwright storage-state object (`{"cookies": [...], "origins": [...]}`),
/// whose `origins` are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionCookies {
	pub cookies: Vec<Cookie>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SessionCookiesRepr {
	Jar(Vec<Cookie>),
	StorageState {
		cookies: Vec<Cookie>,
		#[serde(default, rename = "origins")]
		_origins: serde_json::Value,
	},
}

impl Serialize for SessionCookies {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		self.cookies.serialize(serializer)
	}
}

impl<'de> Deserialize<'de> for SessionCookies {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let cookies = match SessionCookiesRepr::deserialize(deserializer)? {
			SessionCookiesRepr::Jar(cookies) => cookies,
			SessionCookiesRepr::StorageState { cookies, .. } => cookies,
		};
		Ok(Self { cookies })
	}
}

impl SessionCookies {
	pub fn new(cookies: Vec<Cookie>) -> Self {
		Self { cookies }
	}

	pub fn len(&self) -> usize {
		self.cookies.len()
	}

	pub fn is_empty(&self) -> bool {
		self.cookies.is_empty()
	}

	/// Drops cookies whose expiry lies before `now_secs`, returning how many were removed.
	pub fn prune_expired(&mut self, now_secs: f64) -> usize {
		let before = self.cookies.len();
		self.cookies.retain(|c| !c.is_expired_at(now_secs));
		before - self.cookies.len()
	}

	/// Loads a cookie jar from a JSON file.
	pub fn from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
		let content = std::fs::read_to_string(path)?;
		serde_json::from_str(&content).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
	}

	/// Writes the cookie jar as pretty-printed JSON.
	pub fn to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
		let content = serde_json::to_string_pretty(self).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
		std::fs::write(path, content)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cookie_uses_playwright_field_names() {
		let cookie = Cookie::new("session", "abc", ".chatgpt.com").http_only(true).same_site(SameSite::Lax);

		let json = serde_json::to_string(&cookie).unwrap();
		assert!(json.contains("\"httpOnly\":true"));
		assert!(json.contains("\"sameSite\":\"Lax\""));
	}

	#[test]
	fn jar_serializes_as_bare_array() {
		let jar = SessionCookies::new(vec![Cookie::new("a", "1", "example.com")]);
		let json = serde_json::to_string(&jar).unwrap();
		assert!(json.starts_with('['), "got: {json}");
	}

	#[test]
	fn jar_accepts_storage_state_object() {
		let json = r#"{"cookies":[{"name":"a","value":"1","domain":"example.com"}],"origins":[{"origin":"https://example.com","localStorage":[]}]}"#;
		let jar: SessionCookies = serde_json::from_str(json).unwrap();
		assert_eq!(jar.len(), 1);
		assert_eq!(jar.cookies[0].name, "a");
	}

	#[test]
	fn prune_keeps_session_cookies() {
		let mut jar = SessionCookies::new(vec![
			Cookie::new("old", "1", "example.com").expires(100.0),
			Cookie::new("fresh", "2", "example.com").expires(10_000.0),
			Cookie::new("session", "3", "example.com").expires(-1.0),
			Cookie::new("unset", "4", "example.com"),
		]);

		assert_eq!(jar.prune_expired(5_000.0), 1);
		let names: Vec<_> = jar.cookies.iter().map(|c| c.name.as_str()).collect();
		assert_eq!(names, ["fresh", "session", "unset"]);
	}
}
