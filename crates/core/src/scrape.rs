//! Article scraping service: fetch a page, extract its body, persist it.

use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::extract;
use crate::fetch::{self, FetchConfig};
use crate::parse::Document;
use crate::store::Store;

/// How many queued articles a bulk run covers when no limit is given.
pub const DEFAULT_BULK_LIMIT: usize = 10;

/// Service that downloads article pages and stores the extracted bodies.
pub struct Scraper {
    store: Store,
    fetch: FetchConfig,
    max_content_length: usize,
}

impl Scraper {
    pub fn new(store: Store, config: &Config) -> Self {
        Self {
            store,
            fetch: FetchConfig::with_timeout(config.feeds.request_timeout),
            max_content_length: config.ui.max_content_length,
        }
    }

    /// Fetch a page and extract its main content. Transport failures and
    /// extraction misses all collapse to `None`; scraping is best-effort.
    pub async fn scrape_url(&self, url: &str) -> Option<String> {
        let html = match fetch::fetch_html(url, &self.fetch).await {
            Ok(html) => html,
            Err(e) => {
                error!(url, error = %e, "failed to fetch article page");
                return None;
            }
        };

        let mut doc = match Document::parse(&html) {
            Ok(doc) => doc,
            Err(e) => {
                error!(url, error = %e, "failed to parse article page");
                return None;
            }
        };

        extract::extract_main_content(&mut doc, self.max_content_length)
    }

    /// Scrape one stored article. A body advances the article to `scraped`,
    /// a miss records the `error` status (the article stays queued for the
    /// next bulk run). An article without a link cannot be scraped.
    pub async fn scrape_article(&self, id: i64) -> Result<bool> {
        let Some(article) = self.store.get_article(id).await? else {
            warn!(id, "article not found");
            return Ok(false);
        };
        if article.link.is_empty() {
            warn!(id, "article has no link to scrape");
            return Ok(false);
        }

        match self.scrape_url(&article.link).await {
            Some(content) => {
                self.store.update_article_content(id, &content).await?;
                Ok(true)
            }
            None => {
                self.store.mark_article_error(id).await?;
                Ok(false)
            }
        }
    }

    /// Scrape queued articles sequentially, up to `limit` of them. Returns
    /// how many bodies were stored.
    pub async fn bulk_scrape(&self, limit: Option<usize>) -> Result<usize> {
        let limit = limit.unwrap_or(DEFAULT_BULK_LIMIT);
        let articles = self.store.articles_without_content(limit as i64).await?;

        if articles.is_empty() {
            info!("no articles need content scraping");
            return Ok(0);
        }

        info!(count = articles.len(), "starting bulk scrape");
        let mut scraped = 0;
        for (i, article) in articles.iter().enumerate() {
            let Some(id) = article.id else { continue };
            info!(
                article = %article.title,
                current = i + 1,
                total = articles.len(),
                "scraping"
            );
            if self.scrape_article(id).await? {
                scraped += 1;
            }
        }
        info!(scraped, failed = articles.len() - scraped, "bulk scrape finished");

        Ok(scraped)
    }
}
