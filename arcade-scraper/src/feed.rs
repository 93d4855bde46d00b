//! RSS feed adapter.
//!
//! Fetches a single feed resource and parses its `<item>` entries. A feed
//! without the expected `<rss>`/`<channel>` root fails the whole adapter
//! run; individual malformed items are logged and skipped.

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::adapter::{CandidateItem, Discovery, SourceAdapter};
use crate::client::HttpFetch;
use crate::error::ScrapeError;

/// Discovers candidates from one RSS feed.
pub struct FeedAdapter {
    source: String,
    feed_url: String,
}

impl FeedAdapter {
    pub fn new(source: impl Into<String>, feed_url: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            feed_url: feed_url.into(),
        }
    }
}

#[async_trait::async_trait]
impl SourceAdapter for FeedAdapter {
    fn name(&self) -> &str {
        "feed"
    }

    fn source(&self) -> &str {
        &self.source
    }

    async fn discover(&self, fetch: &dyn HttpFetch) -> Result<Discovery, ScrapeError> {
        let mut discovery = Discovery {
            requests: 1,
            ..Discovery::default()
        };

        let resp = fetch.fetch(&self.feed_url).await?;
        let raw_items = parse_feed(&resp.body)?;

        log::info!(
            "Feed {} returned {} items",
            self.feed_url,
            raw_items.len()
        );

        for raw in raw_items {
            let Some(title) = raw.title else {
                log::debug!("Skipping feed item without a title");
                continue;
            };
            let Some(link) = raw.link else {
                log::debug!("Skipping feed item '{}' without a link", title);
                continue;
            };

            discovery.items.push(CandidateItem {
                title,
                url: link,
                description: raw.description,
                thumbnail: raw.image,
                published_at: raw.pub_date,
                category_hint: raw.category,
                rating: None,
                plays: None,
                source: self.source.clone(),
            });
        }

        Ok(discovery)
    }
}

/// A single `<item>` as parsed from the feed, before validation.
#[derive(Debug, Default)]
struct FeedItem {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    pub_date: Option<String>,
    category: Option<String>,
    image: Option<String>,
}

/// Parse an RSS document into its items.
///
/// Fails when the `<rss>`/`<channel>` root structure is absent. Broken
/// individual items are returned as-is and filtered by the caller.
fn parse_feed(xml_text: &str) -> Result<Vec<FeedItem>, ScrapeError> {
    let mut xml = Reader::from_str(xml_text);
    xml.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut saw_channel = false;
    let mut in_item = false;
    let mut current_tag = String::new();
    let mut current_item = FeedItem::default();

    let mut buf = Vec::new();
    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match tag_name.as_str() {
                    "channel" => saw_channel = true,
                    "item" => {
                        in_item = true;
                        current_item = FeedItem::default();
                    }
                    _ => current_tag = tag_name,
                }
            }
            Ok(Event::Empty(ref e)) => {
                // Thumbnails arrive as self-closing tags with a url attribute:
                // <enclosure url="..."/> or <media:thumbnail url="..."/>.
                let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if in_item && (tag_name == "enclosure" || tag_name.ends_with("thumbnail")) {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"url" {
                            current_item.image =
                                Some(String::from_utf8_lossy(&attr.value).to_string());
                        }
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                if !in_item {
                    continue;
                }
                let text = match e.unescape() {
                    Ok(t) => t.to_string(),
                    Err(e) => {
                        log::debug!("Unescape failure in feed item, skipping field: {}", e);
                        continue;
                    }
                };
                assign_field(&mut current_item, &current_tag, text);
            }
            Ok(Event::CData(ref e)) => {
                if !in_item {
                    continue;
                }
                let bytes = e.clone().into_inner();
                let text = String::from_utf8_lossy(&bytes).to_string();
                assign_field(&mut current_item, &current_tag, text);
            }
            Ok(Event::End(ref e)) => {
                let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if tag_name == "item" {
                    in_item = false;
                    items.push(std::mem::take(&mut current_item));
                } else {
                    current_tag.clear();
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                // The reader cannot resume past a malformed region; keep
                // whatever items parsed cleanly before it.
                log::warn!("Feed parse error, keeping {} parsed items: {}", items.len(), e);
                break;
            }
        }
        buf.clear();
    }

    if !saw_channel {
        return Err(ScrapeError::Feed(
            "feed has no <rss>/<channel> root".to_string(),
        ));
    }

    Ok(items)
}

fn assign_field(item: &mut FeedItem, tag: &str, text: String) {
    match tag {
        "title" => item.title = Some(text),
        "link" => item.link = Some(text),
        "description" => item.description = Some(text),
        "pubDate" => item.pub_date = Some(text),
        "category" => item.category = Some(text),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::testing::ScriptedFetch;

    const FEED: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>New Games</title>
    <item>
      <title>Bubble Pop</title>
      <link>https://games.example.com/play/bubble-pop/</link>
      <description>Pop all the bubbles before time runs out.</description>
      <pubDate>Mon, 03 Aug 2026 09:30:00 +0000</pubDate>
      <category>Puzzle</category>
      <enclosure url="https://cdn.example.com/bubble-pop.jpg" type="image/jpeg"/>
    </item>
    <item>
      <title><![CDATA[Night Racer 2]]></title>
      <link>https://games.example.com/play/night-racer-2/</link>
    </item>
    <item>
      <description>No title or link here.</description>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn parses_items_with_optional_fields() {
        let items = parse_feed(FEED).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title.as_deref(), Some("Bubble Pop"));
        assert_eq!(
            items[0].image.as_deref(),
            Some("https://cdn.example.com/bubble-pop.jpg")
        );
        assert_eq!(items[0].category.as_deref(), Some("Puzzle"));
        assert_eq!(items[1].title.as_deref(), Some("Night Racer 2"));
        assert!(items[1].description.is_none());
    }

    #[test]
    fn missing_root_is_an_adapter_failure() {
        let err = parse_feed("<html><body>not a feed</body></html>").unwrap_err();
        assert!(matches!(err, ScrapeError::Feed(_)));
    }

    #[tokio::test]
    async fn discover_drops_items_without_title_or_link() {
        let fetch = ScriptedFetch::new().ok("https://games.example.com/feed.xml", FEED);
        let adapter = FeedAdapter::new("feed", "https://games.example.com/feed.xml");

        let discovery = adapter.discover(&fetch).await.unwrap();
        assert_eq!(discovery.requests, 1);
        assert_eq!(discovery.items.len(), 2);
        assert_eq!(discovery.items[0].source, "feed");
        assert_eq!(
            discovery.items[1].url,
            "https://games.example.com/play/night-racer-2/"
        );
    }

    #[tokio::test]
    async fn discover_surfaces_fetch_failure() {
        let fetch = ScriptedFetch::new().status("https://games.example.com/feed.xml", 500);
        let adapter = FeedAdapter::new("feed", "https://games.example.com/feed.xml");
        assert!(adapter.discover(&fetch).await.is_err());
    }
}
