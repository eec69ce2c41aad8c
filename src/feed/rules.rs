//! Field extraction rules for feed entries.
//!
//! Each rule reads one raw field (title, link or description HTML) and returns
//! one derived value with an explicit default. Rules never fail: a pattern that
//! does not match yields `None`, an empty string or an empty vec. Upstream
//! markup drift is therefore contained to the rule that reads it.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use super::model::ItemKind;
use crate::util::{collapse_whitespace, decode_entities};

/// Compiles `pattern` once and caches it in `cell`.
///
/// A pattern that fails to compile is logged and cached as `None`, which the
/// calling rule treats as "no match".
pub(super) fn cached_regex(
    cell: &'static OnceLock<Option<Regex>>,
    pattern: &str,
) -> Option<&'static Regex> {
    cell.get_or_init(|| match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::error!(pattern, error = %e, "Extraction pattern failed to compile");
            None
        }
    })
    .as_ref()
}

/// Path marker of route pages in entry links.
const ROUTE_SEGMENT: &str = "/route/";
/// Path marker of area pages in entry links.
const AREA_SEGMENT: &str = "/area/";

/// Substring of medium-resolution photo URLs.
pub const MEDIUM_IMAGE_MARKER: &str = "_smallMed_";
/// Substring of large-resolution photo URLs.
pub const LARGE_IMAGE_MARKER: &str = "_large_";

/// Attribution marker in descriptions.
pub const SHARED_BY_MARKER: &str = "Shared By:";

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len()
        && s.is_char_boundary(prefix.len())
        && s[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// Classifies an entry. First match wins:
/// comment title, photo title, route link, area link, otherwise update.
pub fn classify(title: &str, link: &str) -> ItemKind {
    let title = title.trim_start();
    if starts_with_ignore_case(title, "comment") {
        ItemKind::Comment
    } else if starts_with_ignore_case(title, "photo") {
        ItemKind::Photo
    } else if link.contains(ROUTE_SEGMENT) {
        ItemKind::Route
    } else if link.contains(AREA_SEGMENT) {
        ItemKind::Area
    } else {
        ItemKind::Update
    }
}

static COMMENT_TITLE: OnceLock<Option<Regex>> = OnceLock::new();
static LINE_BREAK: OnceLock<Option<Regex>> = OnceLock::new();

/// Strips the source prefix from a title and normalizes it for display.
///
/// - comments titled `Comment re: <subject>: <text>` keep `<text>`
/// - photos titled `Photo: <text>` keep `<text>`
/// - any other title with a colon keeps everything after the first colon
///
/// Line-break tags become spaces, whitespace collapses and entities decode.
pub fn clean_title(raw: &str, kind: ItemKind) -> String {
    let trimmed = raw.trim();

    let comment_text = if kind == ItemKind::Comment {
        cached_regex(&COMMENT_TITLE, r"(?is)^comment re:\s*.+?:\s(.*)$")
            .and_then(|re| re.captures(trimmed))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    } else {
        None
    };

    let body = if let Some(text) = comment_text {
        text
    } else if kind == ItemKind::Photo && starts_with_ignore_case(trimmed, "photo:") {
        &trimmed["photo:".len()..]
    } else if let Some((_, rest)) = trimmed.split_once(':') {
        rest
    } else {
        trimmed
    };

    // Breaks are replaced on both sides of decoding so escaped `&lt;br&gt;` goes too.
    let body = replace_line_breaks(body);
    let decoded = decode_entities(&body);
    collapse_whitespace(&replace_line_breaks(&decoded))
}

fn replace_line_breaks(s: &str) -> String {
    match cached_regex(&LINE_BREAK, r"(?i)<br\s*/?>") {
        Some(re) => re.replace_all(s, " ").into_owned(),
        None => s.to_string(),
    }
}

static IMG_SRC: OnceLock<Option<Regex>> = OnceLock::new();

/// URL of the first inline image in the description, upgraded to the large variant.
pub fn image_url(description: &str) -> Option<String> {
    let re = cached_regex(&IMG_SRC, r#"(?is)<img\b[^>]*?\bsrc\s*=\s*["']([^"']+)["']"#)?;
    let src = re.captures(description)?.get(1)?.as_str().trim();
    if src.is_empty() {
        return None;
    }
    Some(upgrade_image_resolution(&decode_entities(src)))
}

/// Rewrites the medium-resolution marker to the large one. URLs without the
/// marker, including already-large ones, are returned unchanged.
pub fn upgrade_image_resolution(url: &str) -> String {
    url.replacen(MEDIUM_IMAGE_MARKER, LARGE_IMAGE_MARKER, 1)
}

static PAREN_GRADE: OnceLock<Option<Regex>> = OnceLock::new();

/// First parenthesized substring of the raw title, e.g. `5.10b` in
/// `Comment re: Tan & Handsome (5.10b): ...`.
pub fn title_grade(raw_title: &str) -> Option<String> {
    let re = cached_regex(&PAREN_GRADE, r"\(([^)]+)\)")?;
    let grade = re.captures(raw_title)?.get(1)?.as_str().trim();
    (!grade.is_empty()).then(|| grade.to_string())
}

static SHARED_BY: OnceLock<Option<Regex>> = OnceLock::new();

/// Name following the `Shared By:` marker, up to the next tag.
pub fn shared_by(description: &str) -> Option<String> {
    let re = cached_regex(&SHARED_BY, r"Shared By:([^<]*)")?;
    let raw = re.captures(description)?.get(1)?.as_str();
    let name = collapse_whitespace(&decode_entities(raw));
    (!name.is_empty()).then_some(name)
}

static VIDEO_LINK: OnceLock<Option<Regex>> = OnceLock::new();

/// Video ids linked from the description (watch pages, short links and
/// embed pages), unique and in first-seen order.
pub fn video_ids(description: &str) -> Vec<String> {
    let Some(re) = cached_regex(
        &VIDEO_LINK,
        r"(?:https?://)?(?:www\.)?(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([a-zA-Z0-9_-]{11})",
    ) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    re.captures_iter(description)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .filter(|id| seen.insert(id.clone()))
        .collect()
}
