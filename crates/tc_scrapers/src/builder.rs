use crate::fetcher::{HttpFetcher, Page, PageFetcher};
use crate::scrapers::{self, DetailExtractor, ExtractionRule};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use scraper::{ElementRef, Html};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tc_core::config::parse_http_url;
use tc_core::{sort_newest_first, ArticleCandidate, ArticleEntry, DetailInfo, Error, FeedConfig, Result};
use tc_feed::{render_feed, write_atomic, FeedDocument};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use url::Url;

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSummary {
    pub path: PathBuf,
    pub items: usize,
    pub dated: usize,
}

/// Fetches the listing page, extracts and enriches entries, and writes the feed.
pub struct FeedBuilder {
    config: FeedConfig,
    fetcher: Arc<dyn PageFetcher>,
    rules: Vec<Box<dyn ExtractionRule>>,
    detail: DetailExtractor,
}

impl FeedBuilder {
    pub fn new(config: FeedConfig) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(&config)?);
        Self::with_fetcher(config, fetcher)
    }

    pub fn with_fetcher(config: FeedConfig, fetcher: Arc<dyn PageFetcher>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            fetcher,
            rules: scrapers::default_rules()?,
            detail: DetailExtractor::new()?,
        })
    }

    pub fn with_rules(mut self, rules: Vec<Box<dyn ExtractionRule>>) -> Self {
        self.rules = rules;
        self
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Builds the feed for the configured source and output path.
    pub async fn run(&self) -> Result<FeedSummary> {
        self.build(&self.config.source_url, &self.config.output_path).await
    }

    /// Regenerates the feed for `source_url` and atomically replaces `output_path`.
    ///
    /// Nothing is written unless every fatal step succeeded.
    pub async fn build(&self, source_url: &str, output_path: &Path) -> Result<FeedSummary> {
        let entries = self.collect_entries(source_url).await?;
        let xml = self.render(source_url, &entries, Utc::now())?;
        write_atomic(output_path, xml.as_bytes())?;

        let summary = FeedSummary {
            path: output_path.to_path_buf(),
            items: entries.len(),
            dated: entries.iter().filter(|e| e.published_at.is_some()).count(),
        };
        info!(
            undated = summary.items - summary.dated,
            "Wrote {} with {} items.",
            summary.path.display(),
            summary.items
        );
        Ok(summary)
    }

    /// Everything up to rendering: fetch, extract, dedupe, enrich, sort.
    pub async fn collect_entries(&self, source_url: &str) -> Result<Vec<ArticleEntry>> {
        let source = parse_http_url(source_url)?;

        info!(url = %source, "Fetching listing page");
        let page = self.fetcher.fetch(&source).await?;

        let candidates = self.extract_candidates(&page)?;
        info!(count = candidates.len(), "Found article links");

        let details = self.fetch_details(&candidates).await;
        let mut entries: Vec<ArticleEntry> = candidates
            .into_iter()
            .zip(details)
            .map(|(candidate, detail)| ArticleEntry::from_parts(candidate, detail))
            .collect();

        sort_newest_first(&mut entries);
        Ok(entries)
    }

    /// Parses the listing page into unique candidates, capped at `max_items`.
    pub fn extract_candidates(&self, page: &Page) -> Result<Vec<ArticleCandidate>> {
        let document = parse_listing(page)?;
        let found = scrapers::collect_candidates(&document, &page.url, &self.rules);
        if found.is_empty() {
            let names: Vec<_> = self.rules.iter().map(|r| r.name()).collect();
            return Err(Error::parse(
                &page.url,
                format!("no article links matched ({})", names.join(", ")),
            ));
        }

        let total = found.len();
        let mut candidates = scrapers::dedup_candidates(found);
        debug!(total, unique = candidates.len(), "Deduplicated article links");

        if let Some(max) = self.config.max_items {
            if candidates.len() > max {
                debug!(max, dropped = candidates.len() - max, "Truncating to max items");
                candidates.truncate(max);
            }
        }
        Ok(candidates)
    }

    /// One result per candidate, in candidate order. Failures become `None`.
    async fn fetch_details(&self, candidates: &[ArticleCandidate]) -> Vec<Option<DetailInfo>> {
        if !self.config.fetch_details {
            return vec![None; candidates.len()];
        }

        let semaphore = Semaphore::new(self.config.detail_concurrency);
        let semaphore = &semaphore;
        let delay = self.config.request_delay;

        let futures = candidates.iter().map(|candidate| async move {
            let _permit = semaphore.acquire().await.ok()?;
            let result = self.fetch_detail(&candidate.url).await;
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            match result {
                Ok(detail) => {
                    debug!(url = %candidate.url, found = !detail.is_empty(), "Fetched detail page");
                    Some(detail)
                }
                Err(e) => {
                    warn!(url = %candidate.url, error = %e, "Detail page unavailable, keeping listing data");
                    None
                }
            }
        });

        join_all(futures).await
    }

    async fn fetch_detail(&self, url: &Url) -> Result<DetailInfo> {
        let page = self.fetcher.fetch(url).await.map_err(Error::into_detail)?;
        let mut detail = self.detail.extract_html(&page.body);
        detail.last_modified = page.last_modified;
        Ok(detail)
    }

    pub fn render(&self, source_url: &str, entries: &[ArticleEntry], build_time: DateTime<Utc>) -> Result<String> {
        let link = self.config.channel.link.as_deref().unwrap_or(source_url);
        render_feed(&FeedDocument {
            channel: &self.config.channel,
            link,
            entries,
            build_time,
        })
    }
}

/// Rejects bodies that carry no markup at all.
fn parse_listing(page: &Page) -> Result<Html> {
    if page.body.trim().is_empty() {
        return Err(Error::parse(&page.url, "empty response body"));
    }

    let document = Html::parse_document(&page.body);
    let has_elements = document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .any(|el| !matches!(el.value().name(), "html" | "head" | "body"));
    if !has_elements {
        return Err(Error::parse(&page.url, "document contains no elements"));
    }

    Ok(document)
}
