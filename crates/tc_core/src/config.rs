use crate::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_SOURCE_URL: &str = "https://transformer-circuits.pub/";
pub const DEFAULT_OUTPUT_PATH: &str = "docs/index.xml";
pub const DEFAULT_USER_AGENT: &str = "tc-unofficial-rss/1.1 (+github actions; contact: N/A)";

/// Channel-level metadata written at the top of the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    pub title: String,
    /// Defaults to the source URL when unset.
    pub link: Option<String>,
    pub description: String,
    pub language: String,
    pub generator: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            title: "Transformer Circuits (Unofficial)".to_string(),
            link: None,
            description: "Unofficial RSS feed generated from the homepage of transformer-circuits.pub".to_string(),
            language: "en".to_string(),
            generator: format!("tc-feed {}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub source_url: String,
    pub output_path: PathBuf,
    pub user_agent: String,
    pub timeout: Duration,
    /// Upper bound on entries kept after deduplication. `None` keeps everything.
    pub max_items: Option<usize>,
    /// Pause after each detail fetch.
    pub request_delay: Duration,
    pub detail_concurrency: usize,
    pub fetch_details: bool,
    pub channel: ChannelConfig,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            max_items: Some(50),
            request_delay: Duration::from_millis(200),
            detail_concurrency: 1,
            fetch_details: true,
            channel: ChannelConfig::default(),
        }
    }
}

impl FeedConfig {
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = url.into();
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn source(&self) -> Result<Url> {
        parse_http_url(&self.source_url)
    }

    /// Channel link, falling back to the source URL.
    pub fn channel_link(&self) -> String {
        self.channel.link.clone().unwrap_or_else(|| self.source_url.clone())
    }

    pub fn validate(&self) -> Result<()> {
        self.source()?;
        if self.timeout.is_zero() {
            return Err(Error::Config("timeout must be greater than zero".to_string()));
        }
        if self.detail_concurrency == 0 {
            return Err(Error::Config("detail concurrency must be at least 1".to_string()));
        }
        if self.max_items == Some(0) {
            return Err(Error::Config("max items must be at least 1".to_string()));
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(Error::Config("output path must not be empty".to_string()));
        }
        if self.channel.title.trim().is_empty() {
            return Err(Error::Config("channel title must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Parses `url`, accepting only http and https.
pub fn parse_http_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(Error::InvalidUrl(format!("{}: unsupported scheme {}", url, scheme))),
    }
}
