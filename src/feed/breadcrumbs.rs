//! Location trail extraction.
//!
//! Descriptions end with a chain of links from the top-level region down to
//! the subject route, e.g. `Virginia > Southwest Virginia > Breaks Interstate
//! Park > Lower Gorge > Tan & Handsome (5.10b)`. Only links to area and route
//! pages on the configured site become breadcrumbs.

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;
use url::Url;

use super::model::{Breadcrumb, CrumbKind};
use super::rules::cached_regex;
use crate::util::{collapse_whitespace, slug_to_title};

/// Marker the upstream site appends to shortened link text.
pub const TRUNCATION_MARKER: char = '\u{2026}';

/// Route and location context derived from a breadcrumb sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trail {
    pub target_route: Option<Breadcrumb>,
    pub location_path: Vec<Breadcrumb>,
    pub area_id: Option<u64>,
    pub area_name: Option<String>,
}

/// Classifies a link as an area or route page on `site_host`.
///
/// Accepts `http(s)://<site_host>/area/...` and `http(s)://<site_host>/route/...`
/// with at least one segment after the kind. Anything else is not a crumb.
pub fn crumb_kind(href: &str, site_host: &str) -> Option<CrumbKind> {
    let url = Url::parse(href).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    if !url.host_str()?.eq_ignore_ascii_case(site_host) {
        return None;
    }

    let mut segments = url.path_segments()?;
    let kind = match segments.next()? {
        "area" => CrumbKind::Area,
        "route" => CrumbKind::Route,
        _ => return None,
    };
    segments.next().filter(|s| !s.is_empty())?;
    Some(kind)
}

/// Last non-empty path segment of a URL, e.g. `desert-pony-buttress`.
pub fn url_slug(href: &str) -> Option<String> {
    let url = Url::parse(href).ok()?;
    url.path_segments()?
        .filter(|s| !s.is_empty())
        .last()
        .map(str::to_string)
}

/// Numeric page id of an area or route URL (`/area/111742350/breaks-interstate-park`).
pub fn page_id(href: &str) -> Option<u64> {
    let url = Url::parse(href).ok()?;
    url.path_segments()?.nth(1)?.parse().ok()
}

static NAME_WITH_GRADE: OnceLock<Option<Regex>> = OnceLock::new();

/// Splits `Name (grade)` into `("Name", Some("grade"))`; other names are kept whole.
pub fn split_grade(name: &str) -> (String, Option<String>) {
    let caps = cached_regex(&NAME_WITH_GRADE, r"^(.+?)\s*\(([^)]+)\)$")
        .and_then(|re| re.captures(name));
    match caps.as_ref().and_then(|c| Some((c.get(1)?, c.get(2)?))) {
        Some((base, grade)) => (
            base.as_str().trim().to_string(),
            Some(grade.as_str().trim().to_string()),
        ),
        None => (name.to_string(), None),
    }
}

/// Display name of a crumb: the link text, or the URL slug in title case when
/// the text was truncated upstream.
fn crumb_name(text: &str, href: &str) -> String {
    let text = collapse_whitespace(text);
    if !text.contains(TRUNCATION_MARKER) {
        return text;
    }
    match url_slug(href) {
        Some(slug) => slug_to_title(&slug),
        None => text,
    }
}

static ANCHOR: OnceLock<Option<Selector>> = OnceLock::new();

/// Extracts the breadcrumb trail from description HTML, in document order.
///
/// Link text is entity-decoded by the HTML parser. Truncated names are
/// rebuilt from the URL slug before the grade suffix is split off, so a
/// truncated route link loses its grade; the title grade covers that case.
pub fn extract_breadcrumbs(description: &str, site_host: &str) -> Vec<Breadcrumb> {
    let Some(selector) = ANCHOR
        .get_or_init(|| Selector::parse("a[href]").ok())
        .as_ref()
    else {
        return Vec::new();
    };

    let fragment = Html::parse_fragment(description);
    fragment
        .select(selector)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?.trim();
            let kind = crumb_kind(href, site_host)?;
            let text: String = anchor.text().collect();
            let (name, grade) = split_grade(&crumb_name(&text, href));
            Some(Breadcrumb {
                name,
                url: href.to_string(),
                kind,
                grade,
            })
        })
        .collect()
}

/// Derives target route, location path and top-level area from a trail.
///
/// `region_depth` is the number of leading region crumbs (state, sub-region)
/// that every trail starts with. The crumb right after them is the climbing
/// area, reported as `area_id`/`area_name`. Crumbs strictly between the area
/// and the target route (or the end of the trail) form the location path.
pub fn derive_trail(crumbs: &[Breadcrumb], region_depth: usize) -> Trail {
    let route_index = crumbs.iter().rposition(|c| c.kind == CrumbKind::Route);
    let target_route = route_index.map(|i| crumbs[i].clone());
    let end = route_index.unwrap_or(crumbs.len());

    let start = region_depth + 1;
    let location_path = if start < end {
        crumbs[start..end].to_vec()
    } else {
        Vec::new()
    };

    let area = crumbs
        .get(region_depth)
        .filter(|c| c.kind == CrumbKind::Area);

    Trail {
        target_route,
        location_path,
        area_id: area.and_then(|c| page_id(&c.url)),
        area_name: area.map(|c| c.name.clone()),
    }
}
