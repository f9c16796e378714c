//! OpenAPI document summary.
//!
//! The document itself is handed to the target application verbatim; this
//! summary only feeds log lines and the run report.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

const HTTP_METHODS: [&str; 8] = ["get", "put", "post", "delete", "options", "head", "patch", "trace"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolSpecInfo {
	#[serde(default)]
	pub openapi: Option<String>,
	#[serde(default)]
	pub info: Option<ToolInfo>,
	#[serde(default)]
	pub servers: Vec<ToolServer>,
	#[serde(default, skip_serializing)]
	paths: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolInfo {
	#[serde(default)]
	pub title: Option<String>,
	#[serde(default)]
	pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolServer {
	pub url: String,
}

impl ToolSpecInfo {
	/// Extracts a summary, or [`None`] when the text is not JSON or its
	/// fields have unexpected types.
	pub fn parse(text: &str) -> Option<Self> {
		serde_json::from_str(text).ok()
	}

	pub fn title(&self) -> Option<&str> {
		self.info.as_ref().and_then(|i| i.title.as_deref())
	}

	pub fn version(&self) -> Option<&str> {
		self.info.as_ref().and_then(|i| i.version.as_deref())
	}

	/// `operationId`s in path order, falling back to `METHOD /route` when unset.
	pub fn operations(&self) -> Vec<String> {
		let mut ops = Vec::new();
		for (route, methods) in &self.paths {
			for (method, op) in methods {
				if !HTTP_METHODS.contains(&method.as_str()) {
					continue;
				}
				match op.get("operationId").and_then(|v| v.as_str()) {
					Some(id) => ops.push(id.to_string()),
					None => ops.push(format!("{} {route}", method.to_uppercase())),
				}
			}
		}
		ops
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const WEATHER: &str = r#"{
		"openapi": "3.1.0",
		"info": {"title": "Weather", "version": "1.0.0"},
		"servers": [{"url": "https://api.example.com"}],
		"paths": {
			"/forecast": {
				"get": {"operationId": "getForecast", "parameters": [], "responses": {}},
				"parameters": []
			},
			"/alerts": {"post": {"responses": {}}}
		}
	}"#;

	#[test]
	fn summarizes_openapi_document() {
		let info = ToolSpecInfo::parse(WEATHER).unwrap();
		assert_eq!(info.openapi.as_deref(), Some("3.1.0"));
		assert_eq!(info.title(), Some("Weather"));
		assert_eq!(info.version(), Some("1.0.0"));
		assert_eq!(info.servers[0].url, "https://api.example.com");
		assert_eq!(info.operations(), ["POST /alerts", "getForecast"]);
	}

	#[test]
	fn non_json_yields_none() {
		assert!(ToolSpecInfo::parse("openapi: 3.1.0").is_none());
	}
}
