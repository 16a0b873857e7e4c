use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use url::Url;

/// One `<item>` of the generated feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleEntry {
    pub title: String,
    pub url: String,
    pub description: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// A link found on the listing page, before its detail page is consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleCandidate {
    pub url: Url,
    pub title: String,
    pub description: String,
    pub published_at: Option<DateTime<Utc>>,
    /// Name of the extraction rule that produced this candidate.
    pub rule: &'static str,
}

/// Fields recovered from an article's own page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailInfo {
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    /// `Last-Modified` of the detail response; weaker than any date found in the markup.
    pub last_modified: Option<DateTime<Utc>>,
}

impl DetailInfo {
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.published_at.is_none() && self.last_modified.is_none()
    }
}

impl ArticleEntry {
    /// Merges listing data with detail data.
    ///
    /// The listing description wins over the detail one. For the date, a date
    /// found in the detail markup wins over the listing date, which in turn wins
    /// over the detail response's `Last-Modified` header.
    pub fn from_parts(candidate: ArticleCandidate, detail: Option<DetailInfo>) -> Self {
        let detail = detail.unwrap_or_default();
        let description = if candidate.description.is_empty() {
            detail.description.unwrap_or_default()
        } else {
            candidate.description
        };

        Self {
            title: candidate.title,
            url: candidate.url.to_string(),
            description,
            published_at: detail.published_at.or(candidate.published_at).or(detail.last_modified),
        }
    }
}

/// Newest first; undated entries after all dated ones.
pub fn compare_newest_first(a: &ArticleEntry, b: &ArticleEntry) -> Ordering {
    match (&a.published_at, &b.published_at) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort, so ties and undated entries keep encounter order.
pub fn sort_newest_first(entries: &mut [ArticleEntry]) {
    entries.sort_by(compare_newest_first);
}
