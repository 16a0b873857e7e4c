pub mod builder;
pub mod dates;
pub mod fetcher;
pub mod logging;
pub mod scrapers;

pub use builder::{FeedBuilder, FeedSummary};
pub use fetcher::{HttpFetcher, Page, PageFetcher};
pub use scrapers::{default_rules, DetailExtractor, ExtractionRule};

pub mod prelude {
    pub use super::builder::{FeedBuilder, FeedSummary};
    pub use super::fetcher::PageFetcher;
    pub use super::scrapers::ExtractionRule;
    pub use tc_core::{ArticleEntry, Error, FeedConfig, Result};
}
