use gizmo::RunPhase;

use super::*;

fn report(mode: EditMode, url: Option<&str>) -> RunReport {
	RunReport {
		name: "Demo".into(),
		mode,
		url: url.map(str::to_string),
		phases: vec![RunPhase::NotAuthenticated, RunPhase::Authenticated, RunPhase::Creating, RunPhase::Submitted],
		conversation_starters: 1,
		tool: None,
		runs: 1,
	}
}

#[test]
fn success_envelope() {
	let result = ResultBuilder::new(COMMAND, Instant::now())
		.data(report(EditMode::Create, Some("https://chatgpt.com/g/g-abc")))
		.build();

	assert!(result.ok);
	let json = serde_json::to_string(&result).unwrap();
	assert!(json.contains("\"ok\":true"));
	assert!(json.contains("\"command\":\"apply\""));
	assert!(json.contains("\"mode\":\"create\""));
	assert!(json.contains("\"phases\":[\"not_authenticated\",\"authenticated\",\"creating\",\"submitted\"]"));
	assert!(json.contains("\"durationMs\""));
	assert!(!json.contains("\"error\""));
}

#[test]
fn error_envelope() {
	let result: CommandResult<RunReport> = ResultBuilder::new(COMMAND, Instant::now())
		.error(CommandError {
			code: ErrorCode::ToolSpecRejected,
			message: "tool document rejected: bad schema".into(),
			details: None,
		})
		.build();

	assert!(!result.ok);
	let json = serde_json::to_string(&result).unwrap();
	assert!(json.contains("\"code\":\"TOOL_SPEC_REJECTED\""));
	assert!(!json.contains("\"data\""));
}

#[test]
fn error_code_display_matches_serde() {
	for code in [ErrorCode::ConfigError, ErrorCode::UiInteractionFailed, ErrorCode::BrowserCrashed] {
		let serialized = serde_json::to_string(&code).unwrap();
		assert_eq!(serialized, format!("\"{code}\""));
	}
}

#[test]
fn exit_codes_are_distinct_per_category() {
	assert_eq!(ErrorCode::ConfigError.exit_code(), 2);
	assert_eq!(ErrorCode::AuthError.exit_code(), 3);
	assert_eq!(ErrorCode::UiInteractionFailed.exit_code(), 4);
	assert_eq!(ErrorCode::ToolSpecRejected.exit_code(), 5);
	assert_eq!(ErrorCode::BrowserCrashed.exit_code(), 6);
	assert_eq!(ErrorCode::InternalError.exit_code(), 1);
}

#[test]
fn summary_mentions_url_when_known() {
	assert_eq!(
		summary(&report(EditMode::Update, Some("https://chatgpt.com/g/g-abc"))),
		"updated \"Demo\" (https://chatgpt.com/g/g-abc)"
	);
	assert_eq!(summary(&report(EditMode::Create, None)), "created \"Demo\"");
}
