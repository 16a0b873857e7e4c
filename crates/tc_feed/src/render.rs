use chrono::{DateTime, Utc};
use rss::{Channel, ChannelBuilder, GuidBuilder, Item, ItemBuilder};
use tc_core::{ArticleEntry, ChannelConfig, Error, Result};

/// Everything needed to render one feed document.
#[derive(Debug, Clone)]
pub struct FeedDocument<'a> {
    pub channel: &'a ChannelConfig,
    pub link: &'a str,
    pub entries: &'a [ArticleEntry],
    pub build_time: DateTime<Utc>,
}

impl<'a> FeedDocument<'a> {
    pub fn to_channel(&self) -> Channel {
        let items = self.entries.iter().map(to_item).collect::<Vec<_>>();

        ChannelBuilder::default()
            .title(self.channel.title.clone())
            .link(self.link.to_string())
            .description(self.channel.description.clone())
            .language(Some(self.channel.language.clone()))
            .generator(Some(self.channel.generator.clone()))
            .last_build_date(Some(self.build_time.to_rfc2822()))
            .items(items)
            .build()
    }
}

fn to_item(entry: &ArticleEntry) -> Item {
    let guid = GuidBuilder::default()
        .value(entry.url.clone())
        .permalink(true)
        .build();

    let description = if entry.description.is_empty() {
        None
    } else {
        Some(entry.description.clone())
    };

    ItemBuilder::default()
        .title(Some(entry.title.clone()))
        .link(Some(entry.url.clone()))
        .guid(Some(guid))
        .description(description)
        .pub_date(entry.published_at.map(|dt| dt.to_rfc2822()))
        .build()
}

/// Renders `doc` as an indented RSS 2.0 document.
pub fn render_feed(doc: &FeedDocument<'_>) -> Result<String> {
    let channel = doc.to_channel();
    let buffer = channel
        .pretty_write_to(Vec::new(), b' ', 2)
        .map_err(|e| Error::Render(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| Error::Render(e.to_string()))
}
