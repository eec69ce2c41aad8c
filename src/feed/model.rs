use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Title used when the channel carries none.
pub const DEFAULT_CHANNEL_TITLE: &str = "Mountain Project Feed";

/// Category of a feed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Comment,
    Photo,
    Route,
    Area,
    Update,
}

impl ItemKind {
    /// All kinds in filter-bar order.
    pub const ALL: [ItemKind; 5] = [
        ItemKind::Comment,
        ItemKind::Photo,
        ItemKind::Route,
        ItemKind::Area,
        ItemKind::Update,
    ];

    /// Label shown next to each item.
    pub fn label(self) -> &'static str {
        match self {
            ItemKind::Comment => "Comment",
            ItemKind::Photo => "Photo",
            ItemKind::Route => "New Route",
            ItemKind::Area => "New Area",
            ItemKind::Update => "Update",
        }
    }

    /// Plural label used by the filter bar.
    pub fn plural(self) -> &'static str {
        match self {
            ItemKind::Comment => "Comments",
            ItemKind::Photo => "Photos",
            ItemKind::Route => "Routes",
            ItemKind::Area => "Areas",
            ItemKind::Update => "Updates",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether a breadcrumb points at an area page or a route page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CrumbKind {
    Area,
    Route,
}

/// One link of the location trail embedded in an entry description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub name: String,
    pub url: String,
    pub kind: CrumbKind,
    pub grade: Option<String>,
}

/// Channel-level fields of a feed document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelMetadata {
    pub title: String,
    pub description: String,
    pub last_build_date: Option<DateTime<Utc>>,
}

impl Default for ChannelMetadata {
    fn default() -> Self {
        Self {
            title: DEFAULT_CHANNEL_TITLE.to_string(),
            description: String::new(),
            last_build_date: None,
        }
    }
}

/// A normalized feed entry.
///
/// Every derived field has a default (`None`, empty string or empty vec), so
/// an entry with missing or unexpected markup still yields a record. The raw
/// title and description are kept for display when derivation comes up empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedItem {
    pub id: String,
    pub raw_title: String,
    pub raw_description_html: String,
    pub link: String,
    pub clean_title: String,
    pub published_at: Option<DateTime<Utc>>,
    pub kind: ItemKind,
    pub image_url: Option<String>,
    pub grade: Option<String>,
    pub shared_by: Option<String>,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub target_route: Option<Breadcrumb>,
    pub location_path: Vec<Breadcrumb>,
    pub area_id: Option<u64>,
    pub area_name: Option<String>,
    pub clean_description: String,
    pub video_ids: Vec<String>,
}

impl FeedItem {
    /// Title to render: the cleaned title, or the raw one when cleaning left nothing.
    pub fn display_title(&self) -> &str {
        if self.clean_title.is_empty() {
            &self.raw_title
        } else {
            &self.clean_title
        }
    }
}

/// Which items the presentation layer shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KindFilter {
    #[default]
    All,
    Only(ItemKind),
}

impl KindFilter {
    pub fn matches(self, kind: ItemKind) -> bool {
        match self {
            KindFilter::All => true,
            KindFilter::Only(k) => k == kind,
        }
    }
}

/// Oldest and newest publish times across a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub oldest: DateTime<Utc>,
    pub newest: DateTime<Utc>,
}

/// The result of extracting one feed document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedSnapshot {
    pub channel: ChannelMetadata,
    pub items: Vec<FeedItem>,
}

impl FeedSnapshot {
    /// Number of items per kind. Kinds with no items are absent.
    pub fn count_by_kind(&self) -> HashMap<ItemKind, usize> {
        let mut counts = HashMap::new();
        for item in &self.items {
            *counts.entry(item.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Min/max `published_at`, ignoring items without a date.
    pub fn date_range(&self) -> Option<DateRange> {
        let mut dates = self.items.iter().filter_map(|i| i.published_at);
        let first = dates.next()?;
        let (oldest, newest) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
        Some(DateRange { oldest, newest })
    }

    pub fn items_of(&self, filter: KindFilter) -> impl Iterator<Item = &FeedItem> {
        self.items.iter().filter(move |i| filter.matches(i.kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(id: &str, kind: ItemKind, ts: Option<i64>) -> FeedItem {
        FeedItem {
            id: id.to_string(),
            raw_title: format!("raw {id}"),
            raw_description_html: String::new(),
            link: String::new(),
            clean_title: String::new(),
            published_at: ts.and_then(|t| Utc.timestamp_opt(t, 0).single()),
            kind,
            image_url: None,
            grade: None,
            shared_by: None,
            breadcrumbs: Vec::new(),
            target_route: None,
            location_path: Vec::new(),
            area_id: None,
            area_name: None,
            clean_description: String::new(),
            video_ids: Vec::new(),
        }
    }

    fn snapshot(items: Vec<FeedItem>) -> FeedSnapshot {
        FeedSnapshot {
            channel: ChannelMetadata::default(),
            items,
        }
    }

    #[test]
    fn test_count_by_kind() {
        let snap = snapshot(vec![
            item("1", ItemKind::Comment, None),
            item("2", ItemKind::Comment, None),
            item("3", ItemKind::Photo, None),
        ]);
        let counts = snap.count_by_kind();
        assert_eq!(counts.get(&ItemKind::Comment), Some(&2));
        assert_eq!(counts.get(&ItemKind::Photo), Some(&1));
        assert_eq!(counts.get(&ItemKind::Route), None);
    }

    #[test]
    fn test_date_range_skips_undated_items() {
        let snap = snapshot(vec![
            item("1", ItemKind::Route, Some(1_700_000_500)),
            item("2", ItemKind::Route, None),
            item("3", ItemKind::Route, Some(1_700_000_000)),
            item("4", ItemKind::Route, Some(1_700_000_900)),
        ]);
        let range = snap.date_range().unwrap();
        assert_eq!(range.oldest.timestamp(), 1_700_000_000);
        assert_eq!(range.newest.timestamp(), 1_700_000_900);
    }

    #[test]
    fn test_date_range_empty() {
        assert!(snapshot(vec![]).date_range().is_none());
        assert!(snapshot(vec![item("1", ItemKind::Area, None)])
            .date_range()
            .is_none());
    }

    #[test]
    fn test_items_of_filter() {
        let snap = snapshot(vec![
            item("1", ItemKind::Comment, None),
            item("2", ItemKind::Photo, None),
            item("3", ItemKind::Comment, None),
        ]);
        let ids: Vec<&str> = snap
            .items_of(KindFilter::Only(ItemKind::Comment))
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert_eq!(snap.items_of(KindFilter::All).count(), 3);
    }

    #[test]
    fn test_display_title_falls_back_to_raw() {
        let mut it = item("1", ItemKind::Update, None);
        assert_eq!(it.display_title(), "raw 1");
        it.clean_title = "Clean".to_string();
        assert_eq!(it.display_title(), "Clean");
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        let json = serde_json::to_string(&ItemKind::Comment).unwrap();
        assert_eq!(json, "\"comment\"");
    }
}
