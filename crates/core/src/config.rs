//! Loading and validating the run inputs.
//!
//! Everything here runs before a browser is launched, so a bad config file
//! never leaves a half-edited item behind.

use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use gizmo_protocol::{AgentConfig, ToolSpecInfo};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Reads and validates an agent configuration file.
pub fn load_config(path: &Path) -> Result<AgentConfig> {
	let text = read_input(path)?;
	let config = AgentConfig::from_json(&text).map_err(|e| Error::config(path, e.to_string()))?;
	config.validate().map_err(|reason| Error::config(path, reason))?;
	debug!(target = "gizmo", path = %path.display(), name = %config.name, "loaded agent config");
	Ok(config)
}

fn read_input(path: &Path) -> Result<String> {
	fs::read_to_string(path).map_err(|e| match e.kind() {
		IoErrorKind::NotFound => Error::config(path, "file not found"),
		_ => Error::config(path, e.to_string()),
	})
}

/// An OpenAPI document, kept as the exact text read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
	pub path: PathBuf,
	pub document: String,
	/// Best-effort summary; `None` when it could not be extracted.
	pub info: Option<ToolSpecInfo>,
}

impl ToolSpec {
	pub fn load(path: &Path) -> Result<Self> {
		let document = read_input(path)?;
		let info = ToolSpecInfo::parse(&document);
		match &info {
			Some(info) => debug!(
				target = "gizmo",
				path = %path.display(),
				title = info.title().unwrap_or("-"),
				version = info.version().unwrap_or("-"),
				operations = info.operations().len(),
				"loaded tool document"
			),
			None => warn!(
				target = "gizmo",
				path = %path.display(),
				"could not summarize tool document; passing it through unchanged"
			),
		}
		Ok(Self {
			path: path.to_path_buf(),
			document,
			info,
		})
	}
}

/// Validated inputs for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunPlan {
	pub config_path: PathBuf,
	pub config: AgentConfig,
	pub tool: Option<ToolSpec>,
}

impl RunPlan {
	/// Loads the config and the tool document it references.
	///
	/// The tool path is used as written, relative to the working directory.
	pub fn load(config_path: &Path) -> Result<Self> {
		let config = load_config(config_path)?;
		let tool = config.openapi_spec_file.as_deref().map(ToolSpec::load).transpose()?;
		if config.overflow_starters() > 0 {
			warn!(
				target = "gizmo",
				dropped = config.overflow_starters(),
				"only {} conversation starters fit the editor; dropping the rest",
				gizmo_protocol::MAX_CONVERSATION_STARTERS
			);
		}
		Ok(Self {
			config_path: config_path.to_path_buf(),
			config,
			tool,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
		let path = dir.path().join(name);
		fs::write(&path, content).unwrap();
		path
	}

	#[test]
	fn missing_file_is_config_error() {
		let dir = TempDir::new().unwrap();
		let err = load_config(&dir.path().join("nope.json")).unwrap_err();
		assert!(matches!(err, Error::Config { .. }));
		assert!(err.to_string().contains("file not found"), "got: {err}");
	}

	#[test]
	fn invalid_json_is_config_error() {
		let dir = TempDir::new().unwrap();
		let path = write(&dir, "c.json", "{ not json");
		assert!(matches!(load_config(&path), Err(Error::Config { .. })));
	}

	#[test]
	fn missing_instructions_is_named() {
		let dir = TempDir::new().unwrap();
		let path = write(&dir, "c.json", r#"{"name":"Demo","description":"d"}"#);
		let err = load_config(&path).unwrap_err();
		assert!(err.to_string().contains("instructions"), "got: {err}");
	}

	#[test]
	fn plan_reads_tool_document_verbatim() {
		let dir = TempDir::new().unwrap();
		let doc = "{\n  \"openapi\": \"3.1.0\",\n  \"info\": {\"title\": \"T\", \"version\": \"1\"}\n}\n";
		let tool = write(&dir, "openapi.json", doc);
		let cfg = format!(
			r#"{{"name":"Demo","description":"d","instructions":"i","openapi_spec_file":{}}}"#,
			serde_json::to_string(&tool).unwrap()
		);
		let path = write(&dir, "c.json", &cfg);

		let plan = RunPlan::load(&path).unwrap();
		let tool = plan.tool.unwrap();
		assert_eq!(tool.document, doc);
		assert_eq!(tool.info.unwrap().title(), Some("T"));
	}

	#[test]
	fn unsummarizable_tool_document_still_loads() {
		let dir = TempDir::new().unwrap();
		let doc = r#"{"openapi": "3.1.0", "info": {"title": "T", "version": 1}}"#;
		let tool = write(&dir, "openapi.json", doc);

		let spec = ToolSpec::load(&tool).unwrap();
		assert_eq!(spec.document, doc);
		assert_eq!(spec.info, None);
	}

	#[test]
	fn plan_with_missing_tool_document_fails_early() {
		let dir = TempDir::new().unwrap();
		let path = write(
			&dir,
			"c.json",
			r#"{"name":"Demo","description":"d","instructions":"i","openapi_spec_file":"/definitely/missing.json"}"#,
		);
		let err = RunPlan::load(&path).unwrap_err();
		assert!(err.to_string().contains("missing.json"), "got: {err}");
	}

	#[test]
	fn non_json_tool_document_is_accepted() {
		let dir = TempDir::new().unwrap();
		let path = write(&dir, "openapi.yaml", "openapi: 3.1.0\n");
		let tool = ToolSpec::load(&path).unwrap();
		assert!(tool.info.is_none());
		assert_eq!(tool.document, "openapi: 3.1.0\n");
	}
}
