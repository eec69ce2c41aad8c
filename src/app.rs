use crate::config::{AreaEntry, Config};
use crate::feed::{
    FeedExtractor, FeedItem, FeedQuery, FeedSnapshot, FetchSettings, ItemKind, KindFilter,
};
use anyhow::Result;
use lru::LruCache;
use reqwest::redirect::Policy;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::time::Instant;

/// How long a status message stays on screen.
const STATUS_TTL_SECS: u64 = 3;

// ============================================================================
// HTTP Client Configuration
// ============================================================================

/// Redirect policy: at most 3 hops, loops rejected.
fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }

        let url = attempt.url();
        if attempt.previous().iter().any(|prev| prev.as_str() == url.as_str()) {
            return attempt.error("Redirect loop detected");
        }

        tracing::debug!(
            to = %url,
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );
        attempt.follow()
    })
}

// ============================================================================
// Event Types
// ============================================================================

/// Events sent from background tasks to the UI loop.
#[derive(Debug)]
pub enum AppEvent {
    /// A feed request finished.
    ///
    /// `area_id` identifies the request; the result is only presented when it
    /// still matches the selected area.
    FeedLoaded {
        area_id: u64,
        result: Result<FeedSnapshot, String>,
    },
    /// A background task panicked.
    TaskPanicked { task: &'static str, error: String },
}

// ============================================================================
// Application State
// ============================================================================

pub struct App {
    pub http_client: reqwest::Client,
    pub fetch_settings: Arc<FetchSettings>,
    pub extractor: Arc<FeedExtractor>,

    /// Query template; the area id is swapped in per request.
    base_query: FeedQuery,

    // Areas
    pub areas: Vec<AreaEntry>,
    pub selected_area: usize,

    // Data
    /// Snapshot currently on screen. Survives failed refreshes.
    pub snapshot: Option<Arc<FeedSnapshot>>,
    /// Message of the last failed load for the selected area.
    pub error: Option<String>,
    cache: LruCache<u64, Arc<FeedSnapshot>>,
    /// Areas with a request in flight.
    pending: HashSet<u64>,

    // UI State
    pub filter: KindFilter,
    /// Ids of items whose description is shown in full.
    pub expanded: HashSet<String>,
    pub selected_item: usize,
    /// First visible row of the item list, kept between frames.
    pub list_offset: usize,
    /// Wrapped description lines shown for a collapsed item.
    pub collapsed_lines: usize,
    pub status_message: Option<(Cow<'static, str>, Instant)>,
    pub spinner_frame: usize,

    /// Set whenever state changes; cleared after a frame is drawn.
    pub needs_redraw: bool,
}

impl App {
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .redirect(create_redirect_policy())
            .pool_max_idle_per_host(2)
            .pool_idle_timeout(std::time::Duration::from_secs(30))
            .build()?;

        let cache_size = NonZeroUsize::new(config.cache_size).unwrap_or(NonZeroUsize::MIN);
        let initial = config.initial_area();
        let mut areas = config.areas.clone();
        if !areas.iter().any(|a| a.id == initial) {
            areas.insert(
                0,
                AreaEntry {
                    id: initial,
                    name: format!("Area {initial}"),
                },
            );
        }
        let selected_area = areas.iter().position(|a| a.id == initial).unwrap_or(0);

        Ok(Self {
            http_client,
            fetch_settings: Arc::new(config.fetch_settings()),
            extractor: Arc::new(FeedExtractor::new(config.extract_options())),
            base_query: config.query_for(initial),
            areas,
            selected_area,
            snapshot: None,
            error: None,
            cache: LruCache::new(cache_size),
            pending: HashSet::new(),
            filter: KindFilter::All,
            expanded: HashSet::new(),
            selected_item: 0,
            list_offset: 0,
            collapsed_lines: config.collapsed_lines.max(1),
            status_message: None,
            spinner_frame: 0,
            needs_redraw: true,
        })
    }

    // ------------------------------------------------------------------------
    // Areas and loading
    // ------------------------------------------------------------------------

    pub fn current_area(&self) -> Option<&AreaEntry> {
        self.areas.get(self.selected_area)
    }

    pub fn current_area_id(&self) -> u64 {
        self.current_area()
            .map(|a| a.id)
            .unwrap_or(self.base_query.area_id)
    }

    pub fn current_query(&self) -> FeedQuery {
        self.base_query.with_area(self.current_area_id())
    }

    /// True while a request for the selected area is in flight.
    pub fn is_loading(&self) -> bool {
        self.pending.contains(&self.current_area_id())
    }

    /// Decides whether a request for the selected area should be issued.
    ///
    /// Without `force`, a cached snapshot is shown instead of fetching.
    /// Returns `None` when the area is already pending, so at most one request
    /// per area is ever in flight. The caller spawns the returned query.
    pub fn begin_load(&mut self, force: bool) -> Option<FeedQuery> {
        let area_id = self.current_area_id();

        if !force {
            if let Some(cached) = self.cache.get(&area_id) {
                tracing::debug!(area_id, "Serving feed from cache");
                self.snapshot = Some(Arc::clone(cached));
                self.error = None;
                self.clamp_selection();
                return None;
            }
        }

        if !self.pending.insert(area_id) {
            tracing::debug!(area_id, "Feed request already in flight");
            return None;
        }

        self.needs_redraw = true;
        Some(self.current_query())
    }

    /// Records a finished request.
    ///
    /// Successful results always enter the cache. The visible snapshot and
    /// error only change when `area_id` is the selected area; a failure keeps
    /// the previous snapshot on screen.
    pub fn apply_loaded(&mut self, area_id: u64, result: Result<FeedSnapshot, String>) {
        self.pending.remove(&area_id);
        let is_current = area_id == self.current_area_id();

        match result {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.cache.put(area_id, Arc::clone(&snapshot));
                if !is_current {
                    tracing::debug!(area_id, "Cached result for an area no longer selected");
                    return;
                }
                tracing::info!(area_id, items = snapshot.items.len(), "Feed loaded");
                self.set_status(format!("Loaded {} items", snapshot.items.len()));
                self.snapshot = Some(snapshot);
                self.error = None;
                if !self.filter_enabled(self.filter) {
                    self.filter = KindFilter::All;
                }
                self.clamp_selection();
            }
            Err(message) => {
                tracing::warn!(area_id, error = %message, "Feed load failed");
                if is_current {
                    self.error = Some(message);
                }
            }
        }
    }

    /// Selects the next configured area, wrapping around.
    ///
    /// Returns false when there is only one area. Shows the cached snapshot
    /// for the new area if there is one; otherwise the list is empty until
    /// the caller's load completes.
    pub fn next_area(&mut self) -> bool {
        if self.areas.len() < 2 {
            return false;
        }
        self.selected_area = (self.selected_area + 1) % self.areas.len();
        let area_id = self.current_area_id();
        self.snapshot = self.cache.get(&area_id).map(Arc::clone);
        self.error = None;
        self.filter = KindFilter::All;
        self.expanded.clear();
        self.selected_item = 0;
        self.list_offset = 0;
        true
    }

    // ------------------------------------------------------------------------
    // Filtering
    // ------------------------------------------------------------------------

    /// Items of the current snapshot that pass the filter, in feed order.
    pub fn visible_items(&self) -> Vec<&FeedItem> {
        match &self.snapshot {
            Some(snapshot) => snapshot.items_of(self.filter).collect(),
            None => Vec::new(),
        }
    }

    pub fn counts(&self) -> HashMap<ItemKind, usize> {
        self.snapshot
            .as_ref()
            .map(|s| s.count_by_kind())
            .unwrap_or_default()
    }

    pub fn total_items(&self) -> usize {
        self.snapshot.as_ref().map_or(0, |s| s.items.len())
    }

    /// A kind filter is enabled only when the snapshot has items of that kind.
    pub fn filter_enabled(&self, filter: KindFilter) -> bool {
        match filter {
            KindFilter::All => true,
            KindFilter::Only(kind) => self.counts().get(&kind).copied().unwrap_or(0) > 0,
        }
    }

    /// Switches the filter. Returns false (and leaves state alone) when the
    /// requested kind has no items.
    pub fn set_filter(&mut self, filter: KindFilter) -> bool {
        if !self.filter_enabled(filter) {
            if let KindFilter::Only(kind) = filter {
                self.set_status(format!("No {} in this feed", kind.plural().to_lowercase()));
            }
            return false;
        }
        if self.filter != filter {
            self.filter = filter;
            self.selected_item = 0;
            self.list_offset = 0;
        }
        true
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    pub fn selected(&self) -> Option<&FeedItem> {
        self.visible_items().get(self.selected_item).copied()
    }

    pub fn nav_down(&mut self) {
        let len = self.visible_items().len();
        if len > 0 && self.selected_item + 1 < len {
            self.selected_item += 1;
        }
    }

    pub fn nav_up(&mut self) {
        self.selected_item = self.selected_item.saturating_sub(1);
    }

    pub fn nav_first(&mut self) {
        self.selected_item = 0;
    }

    pub fn nav_last(&mut self) {
        self.selected_item = self.visible_items().len().saturating_sub(1);
    }

    /// Expands or collapses the selected item's description.
    pub fn toggle_expanded(&mut self) {
        let Some(id) = self.selected().map(|item| item.id.clone()) else {
            return;
        };
        if !self.expanded.remove(&id) {
            self.expanded.insert(id);
        }
    }

    pub fn is_expanded(&self, item: &FeedItem) -> bool {
        self.expanded.contains(&item.id)
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_items().len();
        if self.selected_item >= len {
            self.selected_item = len.saturating_sub(1);
        }
        let live: HashSet<&str> = self
            .snapshot
            .iter()
            .flat_map(|s| s.items.iter().map(|i| i.id.as_str()))
            .collect();
        let stale: Vec<String> = self
            .expanded
            .iter()
            .filter(|id| !live.contains(id.as_str()))
            .cloned()
            .collect();
        for id in stale {
            self.expanded.remove(&id);
        }
    }

    // ------------------------------------------------------------------------
    // Status line
    // ------------------------------------------------------------------------

    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clears the status message once it is older than 3 seconds.
    /// Returns true if a message was actually cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed().as_secs() >= STATUS_TTL_SECS {
                self.status_message = None;
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{ChannelMetadata, DEFAULT_CHANNEL_TITLE};
    use tokio::time::{self, Duration};

    fn test_config() -> Config {
        Config {
            areas: vec![
                AreaEntry {
                    id: 1,
                    name: "Red River Gorge".to_string(),
                },
                AreaEntry {
                    id: 2,
                    name: "New River Gorge".to_string(),
                },
            ],
            ..Config::default()
        }
    }

    fn test_app() -> App {
        App::new(&test_config()).unwrap()
    }

    fn item(id: &str, kind: ItemKind) -> FeedItem {
        FeedItem {
            id: id.to_string(),
            raw_title: id.to_string(),
            raw_description_html: String::new(),
            link: String::new(),
            clean_title: id.to_string(),
            published_at: None,
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
            channel: ChannelMetadata {
                title: DEFAULT_CHANNEL_TITLE.to_string(),
                ..ChannelMetadata::default()
            },
            items,
        }
    }

    fn loaded_app() -> App {
        let mut app = test_app();
        app.begin_load(false).unwrap();
        app.apply_loaded(
            1,
            Ok(snapshot(vec![
                item("a", ItemKind::Comment),
                item("b", ItemKind::Photo),
                item("c", ItemKind::Comment),
            ])),
        );
        app
    }

    #[test]
    fn test_initial_area_is_first_configured() {
        let app = test_app();
        assert_eq!(app.current_area_id(), 1);
        assert!(app.snapshot.is_none());
        assert!(app.visible_items().is_empty());
    }

    #[test]
    fn test_unknown_default_area_is_added() {
        let config = Config {
            default_area: Some(99),
            ..test_config()
        };
        let app = App::new(&config).unwrap();
        assert_eq!(app.current_area_id(), 99);
        assert_eq!(app.areas.len(), 3);
        assert_eq!(app.areas[0].name, "Area 99");
    }

    #[test]
    fn test_pending_request_not_duplicated() {
        let mut app = test_app();
        let query = app.begin_load(false).unwrap();
        assert_eq!(query.area_id, 1);
        assert!(app.is_loading());
        assert!(app.begin_load(false).is_none());
        assert!(app.begin_load(true).is_none());

        app.apply_loaded(1, Ok(snapshot(vec![])));
        assert!(!app.is_loading());
        assert!(app.begin_load(true).is_some());
    }

    #[test]
    fn test_cached_snapshot_served_without_request() {
        let mut app = loaded_app();
        app.snapshot = None;
        assert!(app.begin_load(false).is_none());
        assert_eq!(app.total_items(), 3);
    }

    #[test]
    fn test_stale_result_cached_but_not_shown() {
        let mut app = test_app();
        app.begin_load(false).unwrap();
        assert!(app.next_area());
        assert_eq!(app.current_area_id(), 2);

        app.apply_loaded(1, Ok(snapshot(vec![item("old", ItemKind::Route)])));
        assert!(app.snapshot.is_none());

        // Switching back serves area 1 from the cache.
        assert!(app.next_area());
        assert_eq!(app.current_area_id(), 1);
        assert_eq!(app.total_items(), 1);
        assert!(app.begin_load(false).is_none());
    }

    #[test]
    fn test_error_keeps_previous_snapshot() {
        let mut app = loaded_app();
        app.begin_load(true).unwrap();
        app.apply_loaded(1, Err("Failed to fetch feed: 503".to_string()));
        assert_eq!(app.error.as_deref(), Some("Failed to fetch feed: 503"));
        assert_eq!(app.total_items(), 3);

        app.begin_load(true).unwrap();
        app.apply_loaded(1, Ok(snapshot(vec![item("d", ItemKind::Area)])));
        assert!(app.error.is_none());
        assert_eq!(app.total_items(), 1);
    }

    #[test]
    fn test_error_for_other_area_ignored() {
        let mut app = loaded_app();
        app.apply_loaded(2, Err("boom".to_string()));
        assert!(app.error.is_none());
    }

    #[test]
    fn test_filter_counts_and_disabled_kinds() {
        let mut app = loaded_app();
        let counts = app.counts();
        assert_eq!(counts.get(&ItemKind::Comment), Some(&2));
        assert_eq!(counts.get(&ItemKind::Photo), Some(&1));

        assert!(app.set_filter(KindFilter::Only(ItemKind::Comment)));
        let ids: Vec<&str> = app.visible_items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);

        assert!(!app.set_filter(KindFilter::Only(ItemKind::Route)));
        assert_eq!(app.filter, KindFilter::Only(ItemKind::Comment));
        assert!(app.status_message.is_some());

        assert!(app.set_filter(KindFilter::All));
        assert_eq!(app.visible_items().len(), 3);
    }

    #[test]
    fn test_filter_reset_when_kind_disappears() {
        let mut app = loaded_app();
        app.set_filter(KindFilter::Only(ItemKind::Photo));
        app.begin_load(true).unwrap();
        app.apply_loaded(1, Ok(snapshot(vec![item("x", ItemKind::Comment)])));
        assert_eq!(app.filter, KindFilter::All);
    }

    #[test]
    fn test_navigation_bounds() {
        let mut app = loaded_app();
        app.nav_up();
        assert_eq!(app.selected_item, 0);
        app.nav_down();
        app.nav_down();
        app.nav_down();
        assert_eq!(app.selected_item, 2);
        app.nav_first();
        assert_eq!(app.selected().map(|i| i.id.as_str()), Some("a"));
        app.nav_last();
        assert_eq!(app.selected().map(|i| i.id.as_str()), Some("c"));
    }

    #[test]
    fn test_toggle_expanded() {
        let mut app = loaded_app();
        app.nav_down();
        app.toggle_expanded();
        assert!(app.expanded.contains("b"));
        app.toggle_expanded();
        assert!(app.expanded.is_empty());
    }

    #[test]
    fn test_selection_clamped_after_refresh() {
        let mut app = loaded_app();
        app.nav_last();
        app.begin_load(true).unwrap();
        app.apply_loaded(1, Ok(snapshot(vec![item("only", ItemKind::Photo)])));
        assert_eq!(app.selected_item, 0);
    }

    #[test]
    fn test_single_area_does_not_switch() {
        let mut app = App::new(&Config::default()).unwrap();
        assert!(!app.next_area());
    }

    #[tokio::test]
    async fn test_status_expires_after_3_seconds() {
        let mut app = test_app();
        time::pause();
        app.set_status("Test message");

        time::advance(Duration::from_secs(2)).await;
        assert!(!app.clear_expired_status());
        assert!(app.status_message.is_some());

        time::advance(Duration::from_secs(2)).await;
        assert!(app.clear_expired_status());
        assert!(app.status_message.is_none());
    }
}
