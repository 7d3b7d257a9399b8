//! Domain types shared across the aggregator.
//!
//! Articles and feeds are the persisted entities; the remaining types are
//! rollups and outcomes passed between services and the CLI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Processing state of an article.
///
/// Articles enter as `Pending`, move to `Scraped` once full content is
/// stored, to `Summarized` once an AI summary is stored, and to `Error`
/// when scraping failed terminally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    Pending,
    Scraped,
    Summarized,
    Error,
}

impl ArticleStatus {
    /// The storage code for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Pending => "pending",
            ArticleStatus::Scraped => "scraped",
            ArticleStatus::Summarized => "summarized",
            ArticleStatus::Error => "error",
        }
    }

    /// Parses a storage code back into a status.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ArticleStatus::Pending),
            "scraped" => Some(ArticleStatus::Scraped),
            "summarized" => Some(ArticleStatus::Summarized),
            "error" => Some(ArticleStatus::Error),
            _ => None,
        }
    }
}

/// A single article pulled from a feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Database id, `None` until inserted
    pub id: Option<i64>,
    pub title: String,
    /// Canonical article URL, unique across the store
    pub link: String,
    pub description: Option<String>,
    /// Publication timestamp reported by the feed
    pub published: Option<DateTime<Utc>>,
    /// URL of the feed this article came from
    pub feed_url: String,
    /// Full scraped body text
    pub content: Option<String>,
    /// AI-generated summary
    pub summary: Option<String>,
    pub status: ArticleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Article {
    /// Creates a pending article with no content or summary.
    pub fn new(title: impl Into<String>, link: impl Into<String>, feed_url: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            title: title.into(),
            link: link.into(),
            description: None,
            published: None,
            feed_url: feed_url.into(),
            content: None,
            summary: None,
            status: ArticleStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// True when scraped content is present and non-blank.
    pub fn has_content(&self) -> bool {
        self.content.as_ref().is_some_and(|c| !c.trim().is_empty())
    }

    /// True when an AI summary is present and non-blank.
    pub fn has_summary(&self) -> bool {
        self.summary.as_ref().is_some_and(|s| !s.trim().is_empty())
    }

    /// True when the article has both content and a summary.
    pub fn is_complete(&self) -> bool {
        self.has_content() && self.has_summary()
    }
}

/// Lifecycle state of a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedStatus {
    Active,
    Inactive,
    Error,
    Paused,
}

impl FeedStatus {
    /// The storage code for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedStatus::Active => "active",
            FeedStatus::Inactive => "inactive",
            FeedStatus::Error => "error",
            FeedStatus::Paused => "paused",
        }
    }

    /// Parses a storage code back into a status.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(FeedStatus::Active),
            "inactive" => Some(FeedStatus::Inactive),
            "error" => Some(FeedStatus::Error),
            "paused" => Some(FeedStatus::Paused),
            _ => None,
        }
    }
}

/// A subscribed RSS/Atom feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feed {
    /// Database id, `None` until inserted
    pub id: Option<i64>,
    /// Feed URL, unique across the store
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: FeedStatus,
    /// When the feed last refreshed successfully
    pub last_updated: Option<DateTime<Utc>>,
    /// Message from the most recent failed refresh
    pub last_fetch_error: Option<String>,
    /// Seconds between refreshes
    pub fetch_interval: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Feed {
    /// Creates an active feed with default refresh interval.
    pub fn new(url: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            url: url.into(),
            title: None,
            description: None,
            status: FeedStatus::Active,
            last_updated: None,
            last_fetch_error: None,
            fetch_interval: 3600,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == FeedStatus::Active
    }

    /// Title when set, otherwise the URL.
    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.url)
    }

    /// Records a failed refresh.
    pub fn mark_error(&mut self, message: impl Into<String>) {
        self.status = FeedStatus::Error;
        self.last_fetch_error = Some(message.into());
        self.updated_at = Utc::now();
    }

    /// Records a successful refresh, clearing a previous error state.
    pub fn mark_success(&mut self) {
        if self.status == FeedStatus::Error {
            self.status = FeedStatus::Active;
        }
        self.last_fetch_error = None;
        self.last_updated = Some(Utc::now());
        self.updated_at = Utc::now();
    }
}

/// Per-feed article rollup.
#[derive(Debug, Clone, Serialize)]
pub struct FeedStatistics {
    pub feed_id: i64,
    pub feed_title: String,
    pub total_articles: i64,
    pub articles_with_content: i64,
    pub articles_with_summary: i64,
    pub latest_article_date: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
    /// 1 when the feed is currently in the error state
    pub error_count: i64,
}

impl FeedStatistics {
    /// Percentage of articles with scraped content.
    pub fn content_completion_rate(&self) -> f64 {
        if self.total_articles == 0 {
            return 0.0;
        }
        self.articles_with_content as f64 / self.total_articles as f64 * 100.0
    }

    /// Percentage of articles with AI summaries.
    pub fn summary_completion_rate(&self) -> f64 {
        if self.total_articles == 0 {
            return 0.0;
        }
        self.articles_with_summary as f64 / self.total_articles as f64 * 100.0
    }
}

/// Store-wide rollup across all feeds and articles.
#[derive(Debug, Clone, Serialize)]
pub struct GlobalStatistics {
    pub total_articles: i64,
    pub total_feeds: i64,
    pub active_feeds: i64,
    pub articles_with_content: i64,
    pub articles_with_summary: i64,
}

impl GlobalStatistics {
    pub fn content_completion_rate(&self) -> f64 {
        if self.total_articles == 0 {
            return 0.0;
        }
        self.articles_with_content as f64 / self.total_articles as f64 * 100.0
    }

    pub fn summary_completion_rate(&self) -> f64 {
        if self.total_articles == 0 {
            return 0.0;
        }
        self.articles_with_summary as f64 / self.total_articles as f64 * 100.0
    }
}

/// A generated daily news digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySummary {
    /// Database id, `None` until inserted
    pub id: Option<i64>,
    pub title: String,
    pub summary: String,
    /// Number of articles synthesized into the digest
    pub article_count: i64,
    /// Number of distinct feeds those articles came from
    pub sources_count: i64,
    /// Look-back window the digest covers, in hours
    pub time_range_hours: i64,
    pub generated_at: DateTime<Utc>,
}

/// Totals reported by a refresh-all run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RefreshOutcome {
    pub feeds_checked: usize,
    pub new_articles: usize,
    /// Per-feed failure messages, one entry per failed feed
    pub errors: Vec<String>,
}
