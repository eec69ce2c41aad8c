//! Body text of an entry description.
//!
//! A description is free text followed by the location trail and an
//! attribution line:
//!
//! ```text
//! Great finish, watch the loose block<br/>
//! <a href=".../area/...">Virginia</a> &gt; ... &gt; <a href=".../route/...">Tan &amp; Handsome</a><br/>
//! Shared By: Jane Doe
//! ```
//!
//! The body is whatever text precedes the first link. Descriptions without
//! links fall back to stripping all markup.

use ego_tree::NodeRef;
use regex::Regex;
use scraper::node::Node;
use scraper::Html;
use std::ops::ControlFlow;
use std::sync::OnceLock;

use super::rules::cached_regex;
use crate::util::collapse_whitespace;

/// Elements whose text never belongs in the body.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style"];

/// Returns the display text of a description.
pub fn clean_description(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let root = fragment.tree.root();

    if root.descendants().any(|n| is_element(n, "a")) {
        let mut text = String::new();
        // Break means the first link was reached.
        let _ = text_before_link(root, &mut text);
        strip_shared_by(text.trim()).trim().to_string()
    } else {
        let mut text = String::new();
        text_without_media(root, &mut text);
        let text = strip_shared_by(text.trim());
        let text = match separator_regex() {
            Some(re) => re.replace_all(text, " "),
            None => text.into(),
        };
        collapse_whitespace(&text)
    }
}

fn is_element(node: NodeRef<'_, Node>, name: &str) -> bool {
    matches!(node.value(), Node::Element(el) if el.name() == name)
}

/// Appends text nodes in document order until the first `<a>` element.
fn text_before_link(node: NodeRef<'_, Node>, out: &mut String) -> ControlFlow<()> {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => match el.name() {
                "a" => return ControlFlow::Break(()),
                "br" => out.push('\n'),
                name if SKIPPED_ELEMENTS.contains(&name) => {}
                _ => text_before_link(child, out)?,
            },
            _ => text_before_link(child, out)?,
        }
    }
    ControlFlow::Continue(())
}

/// Appends all text except that inside links and images.
fn text_without_media(node: NodeRef<'_, Node>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => match el.name() {
                "a" | "img" => {}
                "br" => out.push('\n'),
                name if SKIPPED_ELEMENTS.contains(&name) => {}
                _ => text_without_media(child, out),
            },
            _ => text_without_media(child, out),
        }
    }
}

static SHARED_BY_TAIL: OnceLock<Option<Regex>> = OnceLock::new();
static SEPARATOR: OnceLock<Option<Regex>> = OnceLock::new();

/// Drops a `Shared By: ...` clause on the last line.
fn strip_shared_by(text: &str) -> &str {
    let Some(re) = cached_regex(&SHARED_BY_TAIL, r"(?i)Shared By:.*$") else {
        return text;
    };
    match re.find(text) {
        Some(m) => &text[..m.start()],
        None => text,
    }
}

/// Breadcrumb arrows (`>`) with their surrounding whitespace.
fn separator_regex() -> Option<&'static Regex> {
    cached_regex(&SEPARATOR, r"\s*>\s*")
}
