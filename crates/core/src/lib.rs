pub mod config;
pub mod error;
pub mod extract;
pub mod feed;
pub mod fetch;
pub mod models;
pub mod parse;
pub mod scrape;
pub mod store;
pub mod summarize;

pub use config::{AiConfig, Config, DatabaseConfig, FeedsConfig, UiConfig};
pub use error::{NuntiusError, Result};
pub use extract::DEFAULT_MAX_LENGTH;
pub use extract::extract_main_content;
pub use feed::{FeedInfo, FeedManager, validate_feed_url};
pub use fetch::FetchConfig;
pub use fetch::{fetch_bytes, fetch_html};
pub use models::{
    Article, ArticleStatus, DailySummary, Feed, FeedStatistics, FeedStatus, GlobalStatistics,
    RefreshOutcome,
};
pub use parse::{Document, Element};
pub use scrape::{DEFAULT_BULK_LIMIT, Scraper};
pub use store::Store;
pub use summarize::{ChatClient, Summarizer};
