//! Terminal User Interface module.
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling
//! - `events` - Background task event processing
//! - `helpers` - Background feed loading
//! - `render` - Layout and error/loading states
//! - `header` - Title, area badge, item count, date range
//! - `filter_bar` - Kind filters with counts
//! - `items` - Activity list
//! - `status` - Status bar widget

mod events;
mod filter_bar;
mod header;
mod helpers;
mod input;
mod items;
mod loop_runner;
mod render;
mod status;

pub use header::format_updated;
pub use items::{format_relative_time, format_short_date};
pub use loop_runner::{run, Action};
