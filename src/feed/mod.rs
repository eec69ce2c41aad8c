//! Feed extraction and fetching.
//!
//! - [`parser`] - [`FeedExtractor`]: raw RSS document to [`FeedSnapshot`]
//! - [`rules`] - one extraction rule per item field
//! - [`breadcrumbs`] - location trail, target route and area
//! - [`description`] - body text of an entry description
//! - [`fetcher`] - HTTP retrieval of the upstream document
//! - [`model`] - records produced by extraction
//!
//! # Example
//!
//! ```ignore
//! use cragfeed::feed::{load_feed, FeedExtractor, FeedQuery, FetchSettings};
//!
//! let snapshot = load_feed(&client, &FetchSettings::default(), &FeedQuery::all(111742350),
//!     &FeedExtractor::default()).await?;
//! for item in &snapshot.items {
//!     println!("{} {}", item.kind, item.display_title());
//! }
//! ```

pub mod breadcrumbs;
pub mod description;
mod fetcher;
mod model;
mod parser;
pub mod rules;

pub use fetcher::{
    fetch_feed, load_feed, FeedQuery, FetchError, FetchSettings, DEFAULT_ENDPOINT,
    DEFAULT_USER_AGENT,
};
pub use model::{
    Breadcrumb, ChannelMetadata, CrumbKind, DateRange, FeedItem, FeedSnapshot, ItemKind,
    KindFilter, DEFAULT_CHANNEL_TITLE,
};
pub use parser::{
    extract, ExtractOptions, FeedExtractor, MalformedFeedError, DEFAULT_REGION_DEPTH,
    DEFAULT_SITE_HOST,
};
