//! Agent configuration file format.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Number of conversation starter slots the editor exposes.
pub const MAX_CONVERSATION_STARTERS: usize = 4;

/// A custom agent definition, loaded from a JSON configuration file.
///
/// ```json
/// {
///   "name": "Demo",
///   "description": "d",
///   "instructions": "i",
///   "conversation_starters": ["hi"],
///   "openapi_spec_file": "openapi.json"
/// }
/// ```
///
/// `name` doubles as the key used to decide between creating a new agent and
/// updating an existing one, and is compared verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
	pub name: String,
	pub description: String,
	pub instructions: String,
	#[serde(default)]
	pub conversation_starters: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub openapi_spec_file: Option<PathBuf>,
}

impl AgentConfig {
	/// Parses a configuration from JSON text.
	///
	/// Missing required fields are reported by serde as `missing field `...``.
	pub fn from_json(text: &str) -> serde_json::Result<Self> {
		serde_json::from_str(text)
	}

	/// Returns the first structural problem with an already-parsed config.
	pub fn validate(&self) -> Result<(), String> {
		if self.name.is_empty() {
			return Err("field `name` must not be empty".into());
		}
		if let Some(path) = &self.openapi_spec_file {
			if path.as_os_str().is_empty() {
				return Err("field `openapi_spec_file` must not be empty when present".into());
			}
		}
		Ok(())
	}

	/// Starters that fit into the editor, in configured order.
	pub fn visible_starters(&self) -> &[String] {
		let end = self.conversation_starters.len().min(MAX_CONVERSATION_STARTERS);
		&self.conversation_starters[..end]
	}

	/// Starters beyond [`MAX_CONVERSATION_STARTERS`] that will be dropped.
	pub fn overflow_starters(&self) -> usize {
		self.conversation_starters.len().saturating_sub(MAX_CONVERSATION_STARTERS)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_minimal_config_with_defaults() {
		let cfg = AgentConfig::from_json(r#"{"name":"Demo","description":"d","instructions":"i"}"#).unwrap();
		assert_eq!(cfg.name, "Demo");
		assert!(cfg.conversation_starters.is_empty());
		assert!(cfg.openapi_spec_file.is_none());
		assert!(cfg.validate().is_ok());
	}

	#[test]
	fn missing_required_field_names_the_field() {
		let err = AgentConfig::from_json(r#"{"name":"Demo","description":"d"}"#).unwrap_err();
		assert!(err.to_string().contains("instructions"), "got: {err}");
	}

	#[test]
	fn empty_name_is_rejected() {
		let cfg = AgentConfig::from_json(r#"{"name":"","description":"d","instructions":"i"}"#).unwrap();
		assert!(cfg.validate().unwrap_err().contains("name"));
	}

	#[test]
	fn starters_beyond_editor_capacity_are_reported() {
		let cfg = AgentConfig {
			name: "n".into(),
			description: String::new(),
			instructions: String::new(),
			conversation_starters: (1..=6).map(|i| format!("s{i}")).collect(),
			openapi_spec_file: None,
		};
		assert_eq!(cfg.visible_starters().len(), MAX_CONVERSATION_STARTERS);
		assert_eq!(cfg.visible_starters()[0], "s1");
		assert_eq!(cfg.overflow_starters(), 2);
	}
}
