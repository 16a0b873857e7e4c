use super::utils::{self, CardSelectors};
use super::ExtractionRule;
use scraper::{ElementRef, Selector};
use tc_core::{ArticleCandidate, Result};
use url::Url;

/// Full papers: `<a class="paper">` whose title is an `h3` or a `*title*` block.
pub struct PaperRule {
    selectors: CardSelectors,
}

impl PaperRule {
    pub const NAME: &'static str = "paper";

    pub fn new() -> Result<Self> {
        Ok(Self {
            selectors: CardSelectors {
                link: utils::selector("a.paper[href]")?,
                title: utils::selector("h3, [class*='title']")?,
                description: utils::selector("[class*='description']")?,
                date: utils::selector("time[datetime], [class*='date']")?,
            },
        })
    }
}

impl ExtractionRule for PaperRule {
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
