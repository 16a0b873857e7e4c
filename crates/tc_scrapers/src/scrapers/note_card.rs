use super::utils::{self, CardSelectors};
use super::ExtractionRule;
use scraper::{ElementRef, Selector};
use tc_core::{ArticleCandidate, Result};
use url::Url;

/// Short notes and updates: `<a class="note">` with an `h3` title and a
/// `*description*` block.
pub struct NoteCardRule {
    selectors: CardSelectors,
}

impl NoteCardRule {
    pub const NAME: &'static str = "note";

    pub fn new() -> Result<Self> {
        Ok(Self {
            selectors: CardSelectors {
                link: utils::selector("a.note[href]")?,
                title: utils::selector("h3")?,
                description: utils::selector("div[class*='description']")?,
                date: utils::selector("time[datetime], [class*='date']")?,
            },
        })
    }
}

impl ExtractionRule for NoteCardRule {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn selector(&self) -> &Selector {
        &self.selectors.link
    }

    fn extract(&self, element: ElementRef<'_>, base: &Url) -> Option<ArticleCandidate> {
        utils::extract_card(Self::NAME, &self.selectors, element, base)
    }
}
