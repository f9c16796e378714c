//! In-page scripts.
//!
//! Each script is an immediately invoked function with its arguments inlined
//! as a JSON literal, so user text never needs manual escaping. Elements are
//! located in the page and tagged with [`MARKED`]; the adapter then clicks the
//! tagged element through CDP so the site sees real mouse events.

use serde::Serialize;
use serde_json::json;

use super::selectors::Locator;
use crate::error::Result;

/// Attribute selector for the element tagged by the last `mark*` script.
pub const MARKED: &str = "[data-gizmo-target]";

pub const HIDE_WEBDRIVER: &str =
	"try { Object.defineProperty(navigator, 'webdriver', { get: () => undefined, configurable: true }) } catch (_) {}";

pub const DOCUMENT_READY: &str = "document.readyState === 'complete'";

const PRELUDE: &str = r#"
const __text = (el) => (el.innerText || el.textContent || '').trim();
const __visible = (el) => el.getClientRects().length > 0;
const __find = (targets, root) => {
	for (const t of targets) {
		for (const el of (root || document).querySelectorAll(t.css)) {
			if (!__visible(el)) continue;
			if (t.text != null) {
				const text = __text(el);
				if (t.exact ? text !== t.text : !text.includes(t.text)) continue;
			}
			return el;
		}
	}
	return null;
};
const __mark = (el) => {
	document.querySelectorAll('[data-gizmo-target]').forEach((e) => e.removeAttribute('data-gizmo-target'));
	if (!el) return false;
	el.setAttribute('data-gizmo-target', '1');
	el.scrollIntoView({ block: 'center' });
	return true;
};
"#;

fn script(body: &str, args: &impl Serialize) -> Result<String> {
	let args = serde_json::to_string(args)?;
	Ok(format!("(() => {{{PRELUDE}const args = {args};\n{body}\n}})()"))
}

/// Tags the first visible match. Evaluates to a boolean.
pub fn mark(locator: &Locator) -> Result<String> {
	script("return __mark(__find(args.targets));", &json!({ "targets": locator.targets }))
}

/// Evaluates to whether any target is visible.
pub fn exists(locator: &Locator) -> Result<String> {
	script("return __find(args.targets) !== null;", &json!({ "targets": locator.targets }))
}

/// Replaces the value of the tagged field.
///
/// Uses `insertText` so framework input handlers fire, then falls back to the
/// native value setter. Evaluates to `"ok"`, `"missing"` or `"disabled"`.
pub fn fill_marked(text: &str) -> Result<String> {
	const BODY: &str = r#"
const el = document.querySelector('[data-gizmo-target]');
if (!el) return 'missing';
if (el.disabled || el.readOnly) return 'disabled';
el.focus();
if (el.isContentEditable) {
	document.execCommand('selectAll', false, null);
	document.execCommand('insertText', false, args.text);
} else {
	el.select();
	const inserted = args.text === ''
		? document.execCommand('delete', false, null)
		: document.execCommand('insertText', false, args.text);
	if (!inserted || el.value !== args.text) {
		const proto = el instanceof HTMLTextAreaElement ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype;
		Object.getOwnPropertyDescriptor(proto, 'value').set.call(el, args.text);
		el.dispatchEvent(new Event('input', { bubbles: true }));
	}
}
el.dispatchEvent(new Event('change', { bubbles: true }));
return 'ok';
"#;
	script(BODY, &json!({ "text": text }))
}

/// Tags the `index`th visible `css` element inside `section`.
///
/// Evaluates to the number of such elements, or `-1` without a section.
pub fn mark_in_section(section: &Locator, css: &str, index: usize) -> Result<String> {
	const BODY: &str = r#"
const section = __find(args.section);
if (!section) { __mark(null); return -1; }
const inputs = Array.from(section.querySelectorAll(args.css)).filter(__visible);
__mark(args.index < inputs.length ? inputs[args.index] : null);
return inputs.length;
"#;
	script(BODY, &json!({ "section": section.targets, "css": css, "index": index }))
}

/// Evaluates to the current values of `css` inputs inside `section`, or null.
pub fn section_values(section: &Locator, css: &str) -> Result<String> {
	const BODY: &str = r#"
const section = __find(args.section);
if (!section) return null;
return Array.from(section.querySelectorAll(args.css)).filter(__visible).map((el) => el.value || '');
"#;
	script(BODY, &json!({ "section": section.targets, "css": css }))
}

/// Evaluates to `{index, url}` for the listing entry showing `name` as one of
/// its lines, or null.
pub fn find_listing_item(item_css: &str, name: &str) -> Result<String> {
	const BODY: &str = r#"
const items = Array.from(document.querySelectorAll(args.item));
for (let i = 0; i < items.length; i++) {
	const lines = (items[i].innerText || '').split('\n').map((l) => l.trim());
	if (lines.includes(args.name)) {
		const link = items[i].querySelector('a[href*="/g/"]');
		return { index: i, url: link ? link.href : null };
	}
}
return null;
"#;
	script(BODY, &json!({ "item": item_css, "name": name }))
}

/// Tags the edit control of the listing entry showing `name`.
pub fn mark_listing_edit(item_css: &str, name: &str, buttons: &[&str]) -> Result<String> {
	const BODY: &str = r#"
for (const item of document.querySelectorAll(args.item)) {
	const lines = (item.innerText || '').split('\n').map((l) => l.trim());
	if (!lines.includes(args.name)) continue;
	for (const css of args.buttons) {
		const button = item.querySelector(css);
		if (button) return __mark(button);
	}
	return __mark(null);
}
return __mark(null);
"#;
	script(BODY, &json!({ "item": item_css, "name": name, "buttons": buttons }))
}

/// Prepares the action editor for a schema paste.
///
/// Evaluates to `"open"` when the `schema` editor is already showing (an
/// earlier attempt got that far), otherwise tags the first existing action in
/// `section` (`"existing"`) or its create button (`"create"`). `"none"` when
/// neither is on the page yet.
pub fn mark_action(section: &Locator, create_text: &str, schema: &Locator) -> Result<String> {
	const BODY: &str = r#"
if (__find(args.schema)) { __mark(null); return 'open'; }
const section = __find(args.section);
if (!section) { __mark(null); return 'none'; }
const wanted = args.create.toLowerCase();
const buttons = Array.from(section.querySelectorAll('button')).filter(__visible);
const isCreate = (b) => __text(b).toLowerCase().includes(wanted);
const existing = buttons.find((b) => !isCreate(b));
if (existing) { __mark(existing); return 'existing'; }
const create = buttons.find(isCreate);
if (create) { __mark(create); return 'create'; }
__mark(null);
return 'none';
"#;
	script(
		BODY,
		&json!({ "section": section.targets, "create": create_text, "schema": schema.targets }),
	)
}

/// Evaluates to the first visible non-empty `selectors` text inside the
/// action editor holding `schema`, or null.
///
/// The editor is the nearest dialog around the schema field, else the nearest
/// ancestor that also holds the `back` button. Alerts elsewhere on the page
/// are ignored.
pub fn schema_problem(schema: &Locator, back: &Locator, selectors: &[&str]) -> Result<String> {
	const BODY: &str = r#"
const field = __find(args.schema);
if (!field) return null;
let root = field.closest('[role="dialog"]');
if (!root) {
	root = field.parentElement;
	while (root && root !== document.body && !__find(args.back, root)) root = root.parentElement;
	if (!root || root === document.body) root = field.parentElement;
}
if (!root) return null;
for (const css of args.selectors) {
	for (const el of root.querySelectorAll(css)) {
		const text = __text(el);
		if (text && __visible(el)) return text;
	}
}
return null;
"#;
	script(
		BODY,
		&json!({ "schema": schema.targets, "back": back.targets, "selectors": selectors }),
	)
}

/// Evaluates to `"share"` or `"updated"` depending on which post-save dialog
/// is showing, or null.
pub fn dialog_kind(share: &str, updated: &str) -> Result<String> {
	const BODY: &str = r#"
const roots = Array.from(document.querySelectorAll('[role="dialog"]'));
if (!roots.length) roots.push(document.body);
for (const root of roots) {
	const text = root.innerText || '';
	if (text.includes(args.share)) return 'share';
	if (text.includes(args.updated)) return 'updated';
}
return null;
"#;
	script(BODY, &json!({ "share": share, "updated": updated }))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::chrome::selectors::{
		ACTION_EDITOR_BACK, ACTIONS_SECTION, CREATE_ACTION_TEXT, DESCRIPTION_INPUT, SCHEMA_ERRORS, SCHEMA_INPUT,
		STARTERS_SECTION,
	};

	#[test]
	fn scripts_are_immediately_invoked() {
		let js = mark(&DESCRIPTION_INPUT).unwrap();
		assert!(js.starts_with("(() => {"));
		assert!(js.ends_with("})()"));
		assert!(js.contains("gizmo-description-input"));
	}

	#[test]
	fn user_text_is_json_encoded() {
		let js = fill_marked("say \"hi\"\n</script>").unwrap();
		assert!(js.contains(r#"const args = {"text":"say \"hi\"\n</script>"};"#), "got: {js}");
	}

	#[test]
	fn text_targets_carry_match_mode() {
		let js = mark_in_section(&STARTERS_SECTION, "input", 2).unwrap();
		assert!(js.contains(r#""text":"Conversation starters""#));
		assert!(js.contains(r#""exact":false"#));
		assert!(js.contains(r#""index":2"#));
	}

	#[test]
	fn action_step_reuses_an_open_schema_editor() {
		let js = mark_action(&ACTIONS_SECTION, CREATE_ACTION_TEXT, &SCHEMA_INPUT).unwrap();
		let open = js.find("return 'open'").unwrap();
		let section = js.find("__find(args.section)").unwrap();
		assert!(open < section, "schema check must come before section lookup");
		assert!(js.contains("Enter your OpenAPI schema here"));
	}

	#[test]
	fn schema_problems_are_read_inside_the_editor_only() {
		let js = schema_problem(&SCHEMA_INPUT, &ACTION_EDITOR_BACK, SCHEMA_ERRORS).unwrap();
		assert!(js.contains("root.querySelectorAll(css)"));
		assert!(!js.contains("document.querySelectorAll(css)"));
		assert!(js.contains(r#""selectors":[".text-token-text-error""#), "got: {js}");
	}
}
