//! Feed management: URL validation, article discovery, and refresh runs.

use feed_rs::model::{self, Entry};
use feed_rs::parser;
use tracing::{info, warn};

use crate::config::{Config, FeedsConfig};
use crate::error::{NuntiusError, Result};
use crate::fetch::{self, FetchConfig};
use crate::models::{Article, Feed, RefreshOutcome};
use crate::store::Store;

/// Metadata describing a candidate feed, gathered before anything is stored.
#[derive(Debug, Clone)]
pub struct FeedInfo {
    pub title: String,
    pub description: Option<String>,
    pub entry_count: usize,
    /// Title of the newest entry, as a preview of what the feed carries.
    pub latest_entry: Option<String>,
}

/// Fetch and parse a feed URL without persisting anything. A feed that parses
/// but has no entries is rejected.
pub async fn validate_feed_url(url: &str, config: &FetchConfig) -> Result<FeedInfo> {
    let bytes = fetch::fetch_bytes(url, config).await?;
    let feed =
        parser::parse(bytes.as_slice()).map_err(|e| NuntiusError::FeedError(format!("{url}: {e}")))?;

    feed_info(url, feed)
}

fn feed_info(url: &str, feed: model::Feed) -> Result<FeedInfo> {
    if feed.entries.is_empty() {
        return Err(NuntiusError::FeedError(format!("{url}: no entries found")));
    }

    Ok(FeedInfo {
        title: feed
            .title
            .map(|t| t.content)
            .unwrap_or_else(|| "Unknown Feed".to_string()),
        description: feed.description.map(|t| t.content),
        entry_count: feed.entries.len(),
        latest_entry: feed.entries[0].title.as_ref().map(|t| t.content.clone()),
    })
}

/// Map feed entries into pending articles, newest-first as the feed lists
/// them, dropping entries without a usable link and capping the result.
fn collect_articles(feed: model::Feed, feed_url: &str, max: usize) -> Vec<Article> {
    feed.entries
        .into_iter()
        .filter_map(|entry| entry_to_article(entry, feed_url))
        .take(max)
        .collect()
}

fn entry_to_article(entry: Entry, feed_url: &str) -> Option<Article> {
    let link = select_entry_link(&entry)?;
    let title = entry
        .title
        .map(|t| t.content)
        .unwrap_or_else(|| "No Title".to_string());

    let mut article = Article::new(title, link, feed_url);
    article.description = entry.summary.map(|t| t.content);
    article.published = entry.published.or(entry.updated);
    Some(article)
}

/// Prefer the alternate (or unqualified) link, then any link, then an entry
/// id that happens to be a URL. `None` means the entry cannot be stored: the
/// link is the article's identity and the scraper's target.
fn select_entry_link(entry: &Entry) -> Option<String> {
    for link in &entry.links {
        let href = link.href.trim();
        if href.is_empty() {
            continue;
        }
        let rel = link.rel.as_deref().unwrap_or("");
        if rel.is_empty() || rel.eq_ignore_ascii_case("alternate") {
            return Some(href.to_string());
        }
    }
    if let Some(link) = entry.links.iter().find(|l| !l.href.trim().is_empty()) {
        return Some(link.href.clone());
    }
    let id = entry.id.trim();
    if id.starts_with("http://") || id.starts_with("https://") {
        return Some(id.to_string());
    }
    None
}

/// Service coordinating feed CRUD and refresh runs against the store.
pub struct FeedManager {
    store: Store,
    feeds: FeedsConfig,
    fetch: FetchConfig,
}

impl FeedManager {
    pub fn new(store: Store, config: &Config) -> Self {
        Self {
            store,
            feeds: config.feeds.clone(),
            fetch: FetchConfig::with_timeout(config.feeds.request_timeout),
        }
    }

    /// Validate a feed URL and store it, auto-filling title and description
    /// from the parsed feed. Duplicates are rejected before any network work.
    pub async fn add_feed(&self, url: &str) -> Result<Feed> {
        if self.store.get_feed_by_url(url).await?.is_some() {
            return Err(NuntiusError::FeedError(format!("{url}: feed already exists")));
        }

        let info = validate_feed_url(url, &self.fetch).await?;

        let mut feed = Feed::new(url);
        feed.title = Some(info.title);
        feed.description = info.description;
        self.store.add_feed(&feed).await
    }

    /// Download a feed and map its entries into pending articles, capped at
    /// `max_articles_per_feed`.
    pub async fn fetch_feed_articles(&self, feed_url: &str) -> Result<Vec<Article>> {
        let bytes = fetch::fetch_bytes(feed_url, &self.fetch).await?;
        let feed = parser::parse(bytes.as_slice())
            .map_err(|e| NuntiusError::FeedError(format!("{feed_url}: {e}")))?;

        Ok(collect_articles(feed, feed_url, self.feeds.max_articles_per_feed))
    }

    /// Refresh one feed: insert the articles that are new by link and persist
    /// the feed's success or error state. Returns how many articles were new.
    pub async fn refresh_feed(&self, feed: &Feed) -> Result<usize> {
        let mut feed = feed.clone();
        match self.fetch_feed_articles(&feed.url).await {
            Ok(articles) => {
                let mut inserted = 0;
                for article in &articles {
                    if self.store.insert_article(article).await? {
                        inserted += 1;
                    }
                }
                feed.mark_success();
                self.store.update_feed(&feed).await?;
                info!(url = %feed.url, new_articles = inserted, "feed refreshed");
                Ok(inserted)
            }
            Err(e) => {
                feed.mark_error(e.to_string());
                self.store.update_feed(&feed).await?;
                Err(e)
            }
        }
    }

    /// Refresh every active feed, collecting per-feed failures instead of
    /// aborting the run.
    pub async fn refresh_all(&self) -> Result<RefreshOutcome> {
        let feeds = self.store.list_feeds(false).await?;
        let mut outcome = RefreshOutcome {
            feeds_checked: feeds.len(),
            ..RefreshOutcome::default()
        };

        for feed in &feeds {
            match self.refresh_feed(feed).await {
                Ok(new_articles) => outcome.new_articles += new_articles,
                Err(e) => {
                    warn!(url = %feed.url, error = %e, "feed refresh failed");
                    outcome.errors.push(format!("{}: {e}", feed.url));
                }
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Datelike;

    use super::*;
    use crate::models::FeedStatus;

    const RSS_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example News</title>
    <description>News you can trust</description>
    <item>
      <title>First story</title>
      <link>https://example.com/first</link>
      <description>Short teaser for the first story.</description>
      <pubDate>Mon, 24 Aug 2026 08:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Second story</title>
      <link>https://example.com/second</link>
    </item>
    <item>
      <title>Third story</title>
      <link>https://example.com/third</link>
    </item>
  </channel>
</rss>"#;

    const ATOM_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Example Atom</title>
  <id>urn:uuid:feed</id>
  <updated>2026-08-24T08:00:00Z</updated>
  <entry>
    <title>Linked</title>
    <link rel="enclosure" href="https://example.com/audio.mp3"/>
    <link rel="alternate" href="https://example.com/article"/>
    <id>urn:uuid:1</id>
    <updated>2026-08-24T08:00:00Z</updated>
  </entry>
  <entry>
    <title>Unlinked</title>
    <id>urn:uuid:2</id>
    <updated>2026-08-24T07:00:00Z</updated>
  </entry>
</feed>"#;

    fn parse(xml: &str) -> model::Feed {
        parser::parse(xml.as_bytes()).unwrap()
    }

    #[test]
    fn test_rss_entries_become_pending_articles() {
        let articles = collect_articles(parse(RSS_SAMPLE), "https://example.com/rss", 100);

        assert_eq!(articles.len(), 3);
        let first = &articles[0];
        assert_eq!(first.title, "First story");
        assert_eq!(first.link, "https://example.com/first");
        assert_eq!(
            first.description.as_deref(),
            Some("Short teaser for the first story.")
        );
        assert_eq!(first.feed_url, "https://example.com/rss");
        assert!(first.content.is_none());

        let published = first.published.expect("pubDate should parse");
        assert_eq!(published.year(), 2026);
        assert_eq!(published.month(), 8);
        assert_eq!(published.day(), 24);

        // No pubDate on the second item.
        assert!(articles[1].published.is_none());
    }

    #[test]
    fn test_collect_articles_caps_per_feed() {
        let articles = collect_articles(parse(RSS_SAMPLE), "https://example.com/rss", 2);
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "First story");
        assert_eq!(articles[1].title, "Second story");
    }

    #[test]
    fn test_entry_link_prefers_alternate_and_skips_linkless() {
        let articles = collect_articles(parse(ATOM_SAMPLE), "https://example.com/atom", 100);

        // The unlinked entry has only a urn id, so it is dropped.
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].link, "https://example.com/article");
        // No published element; the updated timestamp stands in.
        assert!(articles[0].published.is_some());
    }

    #[test]
    fn test_feed_info_describes_feed() {
        let info = feed_info("https://example.com/rss", parse(RSS_SAMPLE)).unwrap();
        assert_eq!(info.title, "Example News");
        assert_eq!(info.description.as_deref(), Some("News you can trust"));
        assert_eq!(info.entry_count, 3);
        assert_eq!(info.latest_entry.as_deref(), Some("First story"));
    }

    #[test]
    fn test_feed_without_entries_is_rejected() {
        let empty = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Empty</title></channel></rss>"#;
        let err = feed_info("https://example.com/rss", parse(empty)).unwrap_err();
        assert!(matches!(err, NuntiusError::FeedError(_)));
    }

    #[tokio::test]
    async fn test_add_feed_rejects_known_url() {
        let store = Store::in_memory().await.unwrap();
        store
            .add_feed(&Feed::new("https://example.com/rss"))
            .await
            .unwrap();

        let manager = FeedManager::new(store, &Config::default());
        let err = manager.add_feed("https://example.com/rss").await.unwrap_err();
        assert!(matches!(err, NuntiusError::FeedError(_)));
    }

    #[tokio::test]
    async fn test_refresh_feed_persists_fetch_errors() {
        let store = Store::in_memory().await.unwrap();
        let feed = store.add_feed(&Feed::new("not a feed url")).await.unwrap();

        let manager = FeedManager::new(store.clone(), &Config::default());
        assert!(manager.refresh_feed(&feed).await.is_err());

        let reloaded = store.get_feed(feed.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(reloaded.status, FeedStatus::Error);
        assert!(reloaded.last_fetch_error.is_some());
    }

    #[tokio::test]
    async fn test_refresh_all_collects_per_feed_errors() {
        let store = Store::in_memory().await.unwrap();
        store.add_feed(&Feed::new("not a feed url")).await.unwrap();

        let manager = FeedManager::new(store, &Config::default());
        let outcome = manager.refresh_all().await.unwrap();

        assert_eq!(outcome.feeds_checked, 1);
        assert_eq!(outcome.new_articles, 0);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].starts_with("not a feed url"));
    }
}
