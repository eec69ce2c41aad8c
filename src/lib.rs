//! cragfeed: a terminal viewer for Mountain Project climbing activity feeds.
//!
//! The [`feed`] module turns a raw RSS document into a [`feed::FeedSnapshot`]
//! of typed items (kind, cleaned title, grade, location trail, photo,
//! description). [`app`] and [`ui`] present snapshots in a ratatui interface.

pub mod app;
pub mod config;
pub mod feed;
pub mod ui;
pub mod util;
