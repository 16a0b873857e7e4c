use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tc_core::{ArticleCandidate, Error, Result};
use tracing::debug;
use url::Url;

pub mod detail;
pub mod jsonld;
pub mod note_card;
pub mod paper;

pub use detail::DetailExtractor;
pub use note_card::NoteCardRule;
pub use paper::PaperRule;

/// One structural pattern of article links on the listing page.
///
/// When the site's markup changes, the matching rule is the only thing to update.
pub trait ExtractionRule: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Elements this rule is responsible for.
    fn selector(&self) -> &Selector;

    /// Builds a candidate from a matched element, or `None` to skip it.
    fn extract(&self, element: ElementRef<'_>, base: &Url) -> Option<ArticleCandidate>;
}

/// The rules for the current transformer-circuits.pub homepage.
pub fn default_rules() -> Result<Vec<Box<dyn ExtractionRule>>> {
    Ok(vec![Box::new(NoteCardRule::new()?), Box::new(PaperRule::new()?)])
}

/// Walks the document once and applies the first matching rule to each element,
/// so candidates come out in document order regardless of which rule matched.
pub fn collect_candidates(document: &Html, base: &Url, rules: &[Box<dyn ExtractionRule>]) -> Vec<ArticleCandidate> {
    let mut candidates = Vec::new();

    for element in document.root_element().descendants().filter_map(ElementRef::wrap) {
        let Some(rule) = rules.iter().find(|rule| rule.selector().matches(&element)) else {
            continue;
        };
        match rule.extract(element, base) {
            Some(candidate) => candidates.push(candidate),
            None => debug!(rule = rule.name(), href = ?element.value().attr("href"), "Skipping unusable link"),
        }
    }

    candidates
}

/// Keeps the first candidate for each URL.
pub fn dedup_candidates(candidates: Vec<ArticleCandidate>) -> Vec<ArticleCandidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|candidate| {
            let fresh = seen.insert(candidate.url.as_str().to_string());
            if !fresh {
                debug!(url = %candidate.url, rule = candidate.rule, "Dropping duplicate link");
            }
            fresh
        })
        .collect()
}

/// Common utilities for extraction rules
pub(crate) mod utils {
    use super::*;
    use crate::dates::parse_datetime;

    pub fn selector(css: &str) -> Result<Selector> {
        Selector::parse(css).map_err(|e| Error::Config(format!("Invalid selector {}: {}", css, e)))
    }

    /// Resolves `href` against `base`, dropping the fragment. Only http(s) targets are kept.
    pub fn resolve_url(base: &Url, href: &str) -> Option<Url> {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') {
            return None;
        }
        let mut url = base.join(href).ok()?;
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }
        url.set_fragment(None);
        Some(url)
    }

    /// Collapses whitespace and drops control and replacement characters.
    pub fn clean_text(raw: &str) -> String {
        raw.split_whitespace()
            .map(|word| {
                word.chars()
                    .filter(|c| !c.is_control() && *c != char::REPLACEMENT_CHARACTER)
                    .collect::<String>()
            })
            .filter(|word| !word.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Like [`clean_text`], but first decodes entities and strips tags.
    /// For strings that may still carry markup, such as JSON-LD values.
    pub fn normalize_text(raw: &str) -> String {
        if raw.contains('<') || raw.contains('&') {
            let fragment = Html::parse_fragment(raw);
            clean_text(&fragment.root_element().text().collect::<Vec<_>>().join(" "))
        } else {
            clean_text(raw)
        }
    }

    /// Text nodes joined by a space, so `<br>` and child blocks keep word boundaries.
    pub fn element_text(element: ElementRef<'_>) -> String {
        clean_text(&element.text().collect::<Vec<_>>().join(" "))
    }

    /// Text of the first descendant matching `selector`, if it is non-empty.
    pub fn first_text(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
        element
            .select(selector)
            .map(element_text)
            .find(|text| !text.is_empty())
    }

    /// Date from the first descendant matching `selector`, preferring its `datetime` attribute.
    pub fn first_date(element: ElementRef<'_>, selector: &Selector) -> Option<chrono::DateTime<chrono::Utc>> {
        element.select(selector).find_map(|el| {
            el.value()
                .attr("datetime")
                .and_then(parse_datetime)
                .or_else(|| parse_datetime(&element_text(el)))
        })
    }

    /// Selectors describing the inside of one article card.
    pub struct CardSelectors {
        pub link: Selector,
        pub title: Selector,
        pub description: Selector,
        pub date: Selector,
    }

    /// Shared extraction for link-shaped cards: `<a href>` wrapping a title,
    /// an optional description and an optional date.
    pub fn extract_card(
        rule: &'static str,
        selectors: &CardSelectors,
        element: ElementRef<'_>,
        base: &Url,
    ) -> Option<ArticleCandidate> {
        let url = resolve_url(base, element.value().attr("href")?)?;

        let title = first_text(element, &selectors.title)
            .or_else(|| element.value().attr("title").map(clean_text).filter(|t| !t.is_empty()))
            .unwrap_or_else(|| url.to_string());

        let description = first_text(element, &selectors.description).unwrap_or_default();
        let published_at = first_date(element, &selectors.date);

        Some(ArticleCandidate {
            url,
            title,
            description,
            published_at,
            rule,
        })
    }
}
