//! Selector table for the agent editor.
//!
//! The site changes its markup without notice; every locator lists fallbacks
//! in order of preference and the first visible match wins.

use serde::Serialize;

/// A CSS selector, optionally narrowed to elements whose rendered text
/// contains (or, when `exact`, equals) `text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Target {
	pub css: &'static str,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub text: Option<&'static str>,
	pub exact: bool,
}

const fn css(css: &'static str) -> Target {
	Target {
		css,
		text: None,
		exact: false,
	}
}

const fn has_text(css: &'static str, text: &'static str) -> Target {
	Target {
		css,
		text: Some(text),
		exact: false,
	}
}

const fn exact(css: &'static str, text: &'static str) -> Target {
	Target {
		css,
		text: Some(text),
		exact: true,
	}
}

/// A named list of fallback targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locator {
	pub label: &'static str,
	pub targets: &'static [Target],
}

impl Locator {
	const fn new(label: &'static str, targets: &'static [Target]) -> Self {
		Self { label, targets }
	}
}

pub const LOGIN_BUTTON: Locator = Locator::new("login button", &[css(r#"button[data-testid="login-button"]"#)]);

pub const PROFILE_BUTTON: Locator = Locator::new("profile button", &[css(r#"[data-testid="profile-button"]"#)]);

/// Each entry in the "my GPTs" listing.
pub const LISTING_ITEM: &str = r#"div[tabindex="0"]"#;
pub const LISTING_EDIT_BUTTON: &[&str] = &[r#"button[class*="text-token-text-primary"]"#, "button"];

pub const CONFIGURE_TAB: Locator = Locator::new(
	"configure tab",
	&[
		css(r#"button[data-testid="gizmo-editor-configure-button"]"#),
		has_text(r#"[role="tab"]"#, "Configure"),
		has_text("button", "Configure"),
		has_text("a", "Configure"),
	],
);

pub const NAME_INPUT: Locator = Locator::new(
	"name input",
	&[
		css(r#"input[data-testid="gizmo-name-input"]"#),
		css(r#"input[placeholder*="Name"]"#),
		css(r#"input[placeholder*="name"]"#),
		css(r#"textarea[placeholder*="Name"]"#),
	],
);

pub const DESCRIPTION_INPUT: Locator = Locator::new(
	"description input",
	&[
		css(r#"input[data-testid="gizmo-description-input"]"#),
		css(r#"textarea[placeholder*="Description"]"#),
		css(r#"input[placeholder*="Description"]"#),
		css(r#"textarea[placeholder*="description"]"#),
	],
);

pub const INSTRUCTIONS_INPUT: Locator = Locator::new(
	"instructions input",
	&[
		css(r#"textarea[data-testid="gizmo-instructions-input"]"#),
		css(r#"textarea[placeholder*="Instructions"]"#),
		css(r#"textarea[placeholder*="instructions"]"#),
	],
);

pub const STARTERS_SECTION: Locator = Locator::new(
	"conversation starters section",
	&[has_text("div.mb-6", "Conversation starters")],
);
pub const STARTER_INPUT: &str = r#"input[type="text"]"#;

pub const ACTIONS_SECTION: Locator = Locator::new("actions section", &[has_text("div.mb-6", "Actions")]);
pub const CREATE_ACTION_TEXT: &str = "Create new action";

pub const SCHEMA_INPUT: Locator = Locator::new(
	"schema editor",
	&[
		css(r#"textarea[placeholder*="Enter your OpenAPI schema here"]"#),
		css(r#"textarea[placeholder*="schema"]"#),
		css(r#"textarea[placeholder*="OpenAPI"]"#),
		css(r#"textarea[placeholder*="Schema"]"#),
	],
);

/// Where the action editor reports schema validation problems; only
/// searched inside the editor around the schema field.
pub const SCHEMA_ERRORS: &[&str] = &[".text-token-text-error", ".text-red-500", r#"[role="alert"]"#];

pub const ACTION_EDITOR_BACK: Locator = Locator::new(
	"action editor back button",
	&[css(r#"button[aria-label*="Back"]"#), css(r#"button[aria-label*="back"]"#)],
);

pub const CREATE_BUTTON: Locator = Locator::new(
	"create button",
	&[exact("button", "Create"), has_text("button div", "Create")],
);

pub const UPDATE_BUTTON: Locator = Locator::new(
	"update button",
	&[exact("button", "Update"), has_text("button div", "Update")],
);

pub const SHARE_DIALOG_TEXT: &str = "Share GPT";
pub const UPDATED_DIALOG_TEXT: &str = "GPT Updated";

pub const ONLY_ME_OPTION: Locator = Locator::new("\"Only me\" option", &[has_text("button", "Only me")]);

pub const DIALOG_SAVE_BUTTON: Locator = Locator::new(
	"dialog save button",
	&[exact(r#"[role="dialog"] button"#, "Save"), exact("button", "Save")],
);

pub const VIEW_GPT: Locator = Locator::new("\"View GPT\" link", &[has_text("a", "View GPT"), has_text("button", "View GPT")]);
