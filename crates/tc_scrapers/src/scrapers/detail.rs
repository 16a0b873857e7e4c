use super::jsonld;
use super::utils::{self, clean_text};
use crate::dates::parse_datetime;
use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use tc_core::{DetailInfo, Result};

/// Meta tags that may carry a publication date, strongest first.
const DATE_META: &[&str] = &[
    "meta[property='article:published_time']",
    "meta[name='citation_publication_date']",
    "meta[name='pubdate']",
    "meta[name='date']",
    "meta[property='og:updated_time']",
    "meta[property='article:modified_time']",
];

const DESCRIPTION_META: &[&str] = &[
    "meta[name='description']",
    "meta[property='og:description']",
    "meta[name='twitter:description']",
];

/// Pulls description and publication date out of an article page.
pub struct DetailExtractor {
    date_meta: Vec<Selector>,
    description_meta: Vec<Selector>,
    time: Selector,
}

impl DetailExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            date_meta: DATE_META.iter().map(|css| utils::selector(css)).collect::<Result<_>>()?,
            description_meta: DESCRIPTION_META.iter().map(|css| utils::selector(css)).collect::<Result<_>>()?,
            time: utils::selector("time[datetime]")?,
        })
    }

    /// Meta tags, then JSON-LD, then the first `<time datetime>`.
    pub fn published_at(&self, document: &Html) -> Option<DateTime<Utc>> {
        first_meta(document, &self.date_meta, parse_datetime)
            .or_else(|| jsonld::extract_published(document))
            .or_else(|| {
                document
                    .select(&self.time)
                    .filter_map(|el| el.value().attr("datetime"))
                    .find_map(parse_datetime)
            })
    }

    pub fn description(&self, document: &Html) -> Option<String> {
        first_meta(document, &self.description_meta, |content| {
            Some(clean_text(content)).filter(|text| !text.is_empty())
        })
        .or_else(|| jsonld::extract_description(document))
    }

    pub fn extract(&self, document: &Html) -> DetailInfo {
        DetailInfo {
            description: self.description(document),
            published_at: self.published_at(document),
            last_modified: None,
        }
    }

    pub fn extract_html(&self, html: &str) -> DetailInfo {
        self.extract(&Html::parse_document(html))
    }
}

/// First `content` attribute across `selectors`, in order, that `parse` accepts.
fn first_meta<T>(document: &Html, selectors: &[Selector], parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    selectors.iter().find_map(|selector| {
        document
            .select(selector)
            .filter_map(|el| el.value().attr("content"))
            .find_map(&parse)
    })
}
