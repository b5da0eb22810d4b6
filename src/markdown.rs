//! Conversion between `[label](url)` link syntax and rendered hyperlinks.
//!
//! Field values are stored in source form. A field in display mode shows
//! [`Markup`]: the same text with every link pattern replaced by a hyperlink.
//! Entering edit mode walks the markup back to source form.

use std::fmt::Write as _;
use std::sync::OnceLock;

use regex::Regex;

fn link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid link pattern"))
}

/// One piece of rendered field content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Link { label: String, href: String },
}

/// Rendered field content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Markup {
    nodes: Vec<Node>,
}

impl Markup {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// True when the content holds no hyperlinks.
    pub fn is_plain(&self) -> bool {
        self.nodes.iter().all(|n| matches!(n, Node::Text(_)))
    }

    pub fn links(&self) -> impl Iterator<Item = (&str, &str)> {
        self.nodes.iter().filter_map(|n| match n {
            Node::Link { label, href } => Some((label.as_str(), href.as_str())),
            Node::Text(_) => None,
        })
    }

    /// HTML for the page. Text is emitted as-is; only links are substituted.
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        for node in &self.nodes {
            match node {
                Node::Text(text) => html.push_str(text),
                Node::Link { label, href } => {
                    let _ = write!(
                        html,
                        r#"<a href="{href}" target="_blank" rel="noopener noreferrer">{label}</a>"#
                    );
                }
            }
        }
        html
    }

    /// What a reader sees: link labels in place of the link syntax.
    pub fn visible_text(&self) -> String {
        self.nodes
            .iter()
            .map(|n| match n {
                Node::Text(text) => text.as_str(),
                Node::Link { label, .. } => label.as_str(),
            })
            .collect()
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Node::Text(last)) = self.nodes.last_mut() {
            last.push_str(text);
        } else {
            self.nodes.push(Node::Text(text.to_string()));
        }
    }
}

/// Render source text, turning every `[label](url)` into a hyperlink.
pub fn to_display(text: &str) -> Markup {
    let mut markup = Markup::default();
    let mut last = 0;

    for caps in link_pattern().captures_iter(text) {
        let (Some(whole), Some(label), Some(href)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        markup.push_text(&text[last..whole.start()]);
        markup.nodes.push(Node::Link {
            label: label.as_str().to_string(),
            href: href.as_str().to_string(),
        });
        last = whole.end();
    }
    markup.push_text(&text[last..]);

    markup
}

/// Walk rendered content back to source text.
pub fn to_source(markup: &Markup) -> String {
    let mut source = String::new();
    for node in &markup.nodes {
        match node {
            Node::Text(text) => source.push_str(text),
            Node::Link { label, href } => {
                let _ = write!(source, "[{label}]({href})");
            }
        }
    }
    source
}
