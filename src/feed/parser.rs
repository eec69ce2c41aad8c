use feed_rs::model::{Entry, Feed};
use feed_rs::parser;
use quick_xml::events::Event;
use quick_xml::Reader;
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::breadcrumbs::{derive_trail, extract_breadcrumbs};
use super::description::clean_description;
use super::model::{ChannelMetadata, FeedItem, FeedSnapshot, DEFAULT_CHANNEL_TITLE};
use super::rules;

/// Host whose area and route pages make up location trails.
pub const DEFAULT_SITE_HOST: &str = "www.mountainproject.com";

/// Number of region crumbs (state, sub-region) preceding the climbing area.
pub const DEFAULT_REGION_DEPTH: usize = 2;

/// The document could not be read as a feed at all.
///
/// Entry-level problems never produce this error; they degrade the affected
/// field to its default instead.
#[derive(Debug, Error)]
pub enum MalformedFeedError {
    /// XML tokenizer rejected the document (bad tag, mismatched end tag, ...).
    #[error("Feed is not well-formed XML: {0}")]
    Xml(String),
    /// Document ended while elements were still open (truncated download).
    #[error("Feed document ended with {0} unclosed element(s)")]
    Unclosed(usize),
    /// Well-formed XML without a `<channel>` element.
    #[error("Feed document has no <channel> element")]
    MissingChannel,
    /// XML was well-formed but not a readable syndication feed.
    #[error("Feed could not be parsed: {0}")]
    Syndication(String),
}

/// Site-specific knobs of the extraction rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    pub site_host: String,
    pub region_depth: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            site_host: DEFAULT_SITE_HOST.to_string(),
            region_depth: DEFAULT_REGION_DEPTH,
        }
    }
}

/// Turns raw feed documents into [`FeedSnapshot`]s.
///
/// Stateless apart from its options; one extractor can be shared for the
/// lifetime of the application.
#[derive(Debug, Clone, Default)]
pub struct FeedExtractor {
    options: ExtractOptions,
}

impl FeedExtractor {
    pub fn new(options: ExtractOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extracts channel metadata and one [`FeedItem`] per entry, in document order.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedFeedError`] when the document is not well-formed XML,
    /// is truncated, lacks a `<channel>`, or is not a syndication feed. No
    /// partial result is returned in that case.
    pub fn extract(&self, raw: &str) -> Result<FeedSnapshot, MalformedFeedError> {
        check_structure(raw)?;

        // Missing guids stay empty so `generate_guid` gives them a stable id.
        let feed = parser::Builder::new()
            .id_generator(|_, _, _| String::new())
            .build()
            .parse(raw.as_bytes())
            .map_err(|e| MalformedFeedError::Syndication(e.to_string()))?;

        let channel = channel_metadata(&feed);
        let items: Vec<FeedItem> = feed
            .entries
            .into_iter()
            .map(|entry| self.map_entry(entry))
            .collect();

        tracing::debug!(
            title = %channel.title,
            items = items.len(),
            "Extracted feed"
        );

        Ok(FeedSnapshot { channel, items })
    }

    fn map_entry(&self, entry: Entry) -> FeedItem {
        let link = entry
            .links
            .first()
            .map(|l| l.href.trim().to_string())
            .unwrap_or_default();
        let raw_title = entry.title.map(|t| t.content).unwrap_or_default();
        let raw_description_html = entry
            .summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body))
            .unwrap_or_default();
        let published_at = entry.published.or(entry.updated);

        let existing_id = (!entry.id.trim().is_empty()).then_some(entry.id.as_str());
        let id = generate_guid(existing_id, &link, &raw_title, published_at.map(|d| d.timestamp()));

        let kind = rules::classify(&raw_title, &link);
        let breadcrumbs = extract_breadcrumbs(&raw_description_html, &self.options.site_host);
        let trail = derive_trail(&breadcrumbs, self.options.region_depth);

        if trail.target_route.is_some() && breadcrumbs.len() <= self.options.region_depth {
            tracing::warn!(
                id = %id,
                crumbs = breadcrumbs.len(),
                region_depth = self.options.region_depth,
                "Route trail is shorter than the configured region depth"
            );
        }

        let grade = trail
            .target_route
            .as_ref()
            .and_then(|r| r.grade.clone())
            .or_else(|| rules::title_grade(&raw_title));

        FeedItem {
            clean_title: rules::clean_title(&raw_title, kind),
            image_url: rules::image_url(&raw_description_html),
            shared_by: rules::shared_by(&raw_description_html),
            clean_description: clean_description(&raw_description_html),
            video_ids: rules::video_ids(&raw_description_html),
            grade,
            kind,
            target_route: trail.target_route,
            location_path: trail.location_path,
            area_id: trail.area_id,
            area_name: trail.area_name,
            breadcrumbs,
            id,
            raw_title,
            raw_description_html,
            link,
            published_at,
        }
    }
}

/// Extracts with default options.
pub fn extract(raw: &str) -> Result<FeedSnapshot, MalformedFeedError> {
    FeedExtractor::default().extract(raw)
}

fn channel_metadata(feed: &Feed) -> ChannelMetadata {
    let title = feed
        .title
        .as_ref()
        .map(|t| t.content.trim())
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_CHANNEL_TITLE)
        .to_string();
    let description = feed
        .description
        .as_ref()
        .map(|d| d.content.trim().to_string())
        .unwrap_or_default();

    ChannelMetadata {
        title,
        description,
        last_build_date: feed.updated,
    }
}

/// Walks the whole document once to reject input that is not a complete feed.
///
/// The syndication parser is lenient about truncated documents, so
/// well-formedness is checked here first.
fn check_structure(raw: &str) -> Result<(), MalformedFeedError> {
    let mut reader = Reader::from_str(raw);
    let mut depth: usize = 0;
    let mut saw_channel = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                if e.local_name().as_ref() == b"channel" {
                    saw_channel = true;
                }
            }
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"channel" {
                    saw_channel = true;
                }
            }
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Eof) => break,
            Err(e) => return Err(MalformedFeedError::Xml(e.to_string())),
            _ => {}
        }
    }

    if depth > 0 {
        return Err(MalformedFeedError::Unclosed(depth));
    }
    if !saw_channel {
        return Err(MalformedFeedError::MissingChannel);
    }
    Ok(())
}

/// Entry guid, or a SHA-256 of link, title and publish time when the entry has none.
fn generate_guid(existing: Option<&str>, link: &str, title: &str, published: Option<i64>) -> String {
    if let Some(guid) = existing {
        let trimmed = guid.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let input = format!(
        "{}|{}|{}",
        link,
        title,
        published.map(|p| p.to_string()).unwrap_or_default()
    );
    format!("{:x}", Sha256::digest(input.as_bytes()))
}
