//! Text helpers shared by the extraction rules and the terminal renderer.
//!
//! - **Markup text**: entity decoding, whitespace collapsing, slug titles
//! - **Terminal text**: display width, truncation, word wrap, control-char stripping
//! - **Links**: validation before opening an item in the browser

mod text;
mod url_validator;

pub use text::{
    collapse_whitespace, decode_entities, display_width, slug_to_title, strip_control_chars,
    truncate_to_width, wrap_lines,
};
pub use url_validator::{validate_link_for_open, LinkError};
