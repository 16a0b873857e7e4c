//! RSS 2.0 rendering and atomic output for the generated feed.

pub mod render;
pub mod writer;

pub use render::{render_feed, FeedDocument};
pub use writer::write_atomic;
