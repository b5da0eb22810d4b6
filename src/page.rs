//! The editor page and the field bindings it declares.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::document::{Document, FieldKey};
use crate::markdown;

/// The built-in page served at `/`.
pub const PAGE_HTML: &str = include_str!("../assets/index.html");

/// Client script loaded by the page for in-place editing.
pub const EDITOR_JS: &str = include_str!("../assets/editor.js");

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[A-Za-z][^>]*>").expect("valid tag pattern"))
}

fn attr_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"([A-Za-z-]+)\s*=\s*"([^"]*)""#).expect("valid attribute pattern")
    })
}

/// The `data-key` of an opening tag that carries the `editable` class.
fn bound_key(tag: &str) -> Option<String> {
    let mut editable = false;
    let mut key = None;
    for caps in attr_pattern().captures_iter(tag) {
        match &caps[1] {
            "class" => editable = caps[2].split_whitespace().any(|c| c == "editable"),
            "data-key" => key = Some(caps[2].to_string()),
            _ => {}
        }
    }
    key.filter(|_| editable)
}

/// Every field key bound on the page, in document order.
///
/// A binding is an element with the `editable` class and a `data-key`
/// attribute. Repeated keys are bound once.
pub fn field_bindings(markup: &str) -> Vec<FieldKey> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();

    for tag in tag_pattern().find_iter(markup) {
        if let Some(key) = bound_key(tag.as_str()) {
            if seen.insert(key.clone()) {
                keys.push(FieldKey::new(key));
            }
        }
    }

    keys
}

/// Fill every bound element with its display form from `doc`.
///
/// The rendered value goes right after the element's opening tag, so the
/// page's bound elements are expected to be empty.
pub fn render_page(markup: &str, doc: &Document) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut last = 0;

    for tag in tag_pattern().find_iter(markup) {
        let Some(key) = bound_key(tag.as_str()) else {
            continue;
        };
        out.push_str(&markup[last..tag.end()]);
        out.push_str(&markdown::to_display(doc.get(&key)).to_html());
        last = tag.end();
    }

    out.push_str(&markup[last..]);
    out
}

/// Bindings of the built-in page.
pub fn default_bindings() -> Vec<FieldKey> {
    field_bindings(PAGE_HTML)
}

/// Help text for the page's keyboard shortcuts.
pub fn shortcuts() -> &'static str {
    "Keyboard shortcuts:\n\
     - Double-click: Edit field\n\
     - Shift + Enter: New line (for ingredients)\n\
     - Enter / Escape: Finish editing (changes are saved)\n\
     - Single-click: Follow links"
}
