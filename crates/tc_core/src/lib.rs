pub mod config;
pub mod error;
pub mod types;

pub use config::{ChannelConfig, FeedConfig};
pub use error::{Error, Result};
pub use types::{sort_newest_first, ArticleCandidate, ArticleEntry, DetailInfo};
