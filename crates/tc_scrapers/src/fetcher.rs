use crate::dates::parse_datetime;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use encoding_rs::{Encoding, UTF_8};
use reqwest::header::{CONTENT_TYPE, LAST_MODIFIED};
use reqwest::Client;
use tc_core::{Error, FeedConfig, Result};
use tracing::debug;
use url::Url;

/// How far into the body a `<meta charset>` declaration is looked for.
const META_SNIFF_LIMIT: usize = 1024;

/// A successfully fetched and decoded HTML page.
#[derive(Debug, Clone)]
pub struct Page {
    /// Final URL after redirects; relative links resolve against it.
    pub url: Url,
    pub body: String,
    pub encoding: &'static Encoding,
    pub last_modified: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches `url`. Network failures, timeouts and non-2xx statuses are `Error::Fetch`.
    async fn fetch(&self, url: &Url) -> Result<Page>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FeedConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Page> {
        debug!(%url, "Fetching page");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::fetch(url, describe(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::fetch(url, format!("HTTP {}", status)));
        }

        let final_url = response.url().clone();
        let headers = response.headers();
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let last_modified = headers
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_datetime);

        let bytes = response.bytes().await.map_err(|e| Error::fetch(url, describe(&e)))?;
        let (body, encoding) = decode_body(&bytes, content_type.as_deref());
        debug!(%url, encoding = encoding.name(), bytes = bytes.len(), "Fetched page");

        Ok(Page {
            url: final_url,
            body,
            encoding,
            last_modified,
        })
    }
}

fn describe(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timed out".to_string()
    } else {
        error.to_string()
    }
}

/// Decodes `bytes` as text.
///
/// A byte-order mark wins, then the `Content-Type` charset, then a `<meta>`
/// declaration near the top of the document, then UTF-8.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> (String, &'static Encoding) {
    let declared = content_type
        .and_then(charset_from_content_type)
        .or_else(|| sniff_meta_charset(bytes))
        .unwrap_or(UTF_8);

    let (text, used, _had_errors) = declared.decode(bytes);
    (text.into_owned(), used)
}

pub fn charset_from_content_type(content_type: &str) -> Option<&'static Encoding> {
    content_type
        .split(';')
        .filter_map(|part| part.trim().split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("charset"))
        .and_then(|(_, value)| Encoding::for_label(value.trim().trim_matches(|c| c == '"' || c == '\'').as_bytes()))
}

/// Finds `<meta charset=...>` or `<meta http-equiv=... content="...; charset=...">`.
pub fn sniff_meta_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(META_SNIFF_LIMIT)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();

    head.split("<meta").skip(1).find_map(|tag| {
        let tag = tag.split('>').next().unwrap_or(tag);
        let (_, rest) = tag.split_once("charset=")?;
        let label: String = rest
            .trim_start_matches(|c| c == '"' || c == '\'' || c == ' ')
            .chars()
            .take_while(|c| !matches!(c, '"' | '\'' | ';' | '/' | ' ' | '>'))
            .collect();
        // A UTF-16 label in markup means the bytes are ASCII-compatible after all.
        Encoding::for_label(label.as_bytes()).map(Encoding::output_encoding)
    })
}
