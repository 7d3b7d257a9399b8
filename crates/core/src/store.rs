//! SQLite persistence for feeds, articles, and daily summaries.
//!
//! Timestamps are stored as RFC 3339 text and parsed back with chrono, so
//! rows stay readable with plain `sqlite3` tooling.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::error::{NuntiusError, Result};
use crate::models::{
    Article, ArticleStatus, DailySummary, Feed, FeedStatistics, FeedStatus, GlobalStatistics,
};

/// SQLite-backed store shared by the feed, scrape, and summarize services.
/// Cloning is cheap; clones share the same pool.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if missing) the database at `database_url` and run
    /// migrations.
    ///
    /// # Example URLs
    /// - `sqlite://nuntius.db` - file next to the working directory
    /// - `sqlite::memory:` - ephemeral in-memory database
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:").await
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS feeds (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url TEXT NOT NULL UNIQUE,
                title TEXT,
                description TEXT,
                status TEXT NOT NULL DEFAULT 'active',
                last_updated TEXT,
                last_fetch_error TEXT,
                fetch_interval INTEGER NOT NULL DEFAULT 3600,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                link TEXT NOT NULL UNIQUE,
                description TEXT,
                published TEXT,
                feed_url TEXT NOT NULL,
                content TEXT,
                summary TEXT,
                status TEXT NOT NULL DEFAULT 'pending',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_articles_feed_url ON articles(feed_url);
            CREATE INDEX IF NOT EXISTS idx_articles_status ON articles(status);
            CREATE INDEX IF NOT EXISTS idx_articles_published ON articles(published);
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS daily_summaries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                summary TEXT NOT NULL,
                article_count INTEGER NOT NULL DEFAULT 0,
                sources_count INTEGER NOT NULL DEFAULT 0,
                time_range_hours INTEGER NOT NULL DEFAULT 24,
                generated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // -- feeds ---------------------------------------------------------------

    /// Insert a feed, returning it with its new id. A duplicate url fails the
    /// UNIQUE constraint.
    pub async fn add_feed(&self, feed: &Feed) -> Result<Feed> {
        let result = sqlx::query(
            r#"
            INSERT INTO feeds
                (url, title, description, status, last_updated, last_fetch_error,
                 fetch_interval, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&feed.url)
        .bind(&feed.title)
        .bind(&feed.description)
        .bind(feed.status.as_str())
        .bind(feed.last_updated.map(|t| t.to_rfc3339()))
        .bind(&feed.last_fetch_error)
        .bind(feed.fetch_interval as i64)
        .bind(feed.created_at.to_rfc3339())
        .bind(feed.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        let mut stored = feed.clone();
        stored.id = Some(result.last_insert_rowid());
        Ok(stored)
    }

    pub async fn get_feed(&self, id: i64) -> Result<Option<Feed>> {
        let row = sqlx::query_as::<_, FeedRow>(
            "SELECT id, url, title, description, status, last_updated, last_fetch_error, \
             fetch_interval, created_at, updated_at FROM feeds WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(FeedRow::into_feed).transpose()
    }

    pub async fn get_feed_by_url(&self, url: &str) -> Result<Option<Feed>> {
        let row = sqlx::query_as::<_, FeedRow>(
            "SELECT id, url, title, description, status, last_updated, last_fetch_error, \
             fetch_interval, created_at, updated_at FROM feeds WHERE url = ?",
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        row.map(FeedRow::into_feed).transpose()
    }

    /// All feeds, or only the active ones.
    pub async fn list_feeds(&self, include_inactive: bool) -> Result<Vec<Feed>> {
        let query = if include_inactive {
            "SELECT id, url, title, description, status, last_updated, last_fetch_error, \
             fetch_interval, created_at, updated_at FROM feeds ORDER BY id"
        } else {
            "SELECT id, url, title, description, status, last_updated, last_fetch_error, \
             fetch_interval, created_at, updated_at FROM feeds WHERE status = ? ORDER BY id"
        };

        let mut q = sqlx::query_as::<_, FeedRow>(query);
        if !include_inactive {
            q = q.bind(FeedStatus::Active.as_str());
        }
        let rows = q.fetch_all(&self.pool).await?;

        rows.into_iter().map(FeedRow::into_feed).collect()
    }

    /// Write the mutable fields of a feed back by id.
    pub async fn update_feed(&self, feed: &Feed) -> Result<()> {
        let Some(id) = feed.id else {
            return Err(NuntiusError::DatabaseError(sqlx::Error::RowNotFound));
        };

        sqlx::query(
            r#"
            UPDATE feeds
            SET title = ?, description = ?, status = ?, last_updated = ?,
                last_fetch_error = ?, fetch_interval = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&feed.title)
        .bind(&feed.description)
        .bind(feed.status.as_str())
        .bind(feed.last_updated.map(|t| t.to_rfc3339()))
        .bind(&feed.last_fetch_error)
        .bind(feed.fetch_interval as i64)
        .bind(feed.updated_at.to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Soft delete: the feed stays in the table with status `inactive` so its
    /// articles keep their source.
    pub async fn delete_feed(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE feeds SET status = ?, updated_at = ? WHERE id = ?")
            .bind(FeedStatus::Inactive.as_str())
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Reactivate a soft-deleted feed and clear any stored fetch error.
    pub async fn restore_feed(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE feeds SET status = ?, last_fetch_error = NULL, updated_at = ? WHERE id = ?",
        )
        .bind(FeedStatus::Active.as_str())
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Hard delete a feed together with every article it produced.
    pub async fn purge_feed(&self, id: i64) -> Result<bool> {
        let Some(feed) = self.get_feed(id).await? else {
            return Ok(false);
        };

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM articles WHERE feed_url = ?")
            .bind(&feed.url)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM feeds WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    // -- articles ------------------------------------------------------------

    /// Insert an article unless its link is already present. Returns whether a
    /// row was actually written.
    pub async fn insert_article(&self, article: &Article) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO articles
                (title, link, description, published, feed_url, content, summary,
                 status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&article.title)
        .bind(&article.link)
        .bind(&article.description)
        .bind(article.published.map(|t| t.to_rfc3339()))
        .bind(&article.feed_url)
        .bind(&article.content)
        .bind(&article.summary)
        .bind(article.status.as_str())
        .bind(article.created_at.to_rfc3339())
        .bind(article.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get_article(&self, id: i64) -> Result<Option<Article>> {
        let row = sqlx::query_as::<_, ArticleRow>(
            "SELECT id, title, link, description, published, feed_url, content, summary, \
             status, created_at, updated_at FROM articles WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ArticleRow::into_article).transpose()
    }

    pub async fn get_article_by_link(&self, link: &str) -> Result<Option<Article>> {
        let row = sqlx::query_as::<_, ArticleRow>(
            "SELECT id, title, link, description, published, feed_url, content, summary, \
             status, created_at, updated_at FROM articles WHERE link = ?",
        )
        .bind(link)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ArticleRow::into_article).transpose()
    }

    /// Newest-first page of articles, optionally narrowed to one feed and/or
    /// one status.
    pub async fn list_articles(
        &self,
        limit: i64,
        offset: i64,
        feed_url: Option<&str>,
        status: Option<ArticleStatus>,
    ) -> Result<Vec<Article>> {
        let mut clauses = Vec::new();
        if feed_url.is_some() {
            clauses.push("feed_url = ?");
        }
        if status.is_some() {
            clauses.push("status = ?");
        }
        let filter = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        let query = format!(
            "SELECT id, title, link, description, published, feed_url, content, summary, \
             status, created_at, updated_at FROM articles {filter} \
             ORDER BY COALESCE(published, created_at) DESC, id DESC LIMIT ? OFFSET ?"
        );

        let mut q = sqlx::query_as::<_, ArticleRow>(&query);
        if let Some(url) = feed_url {
            q = q.bind(url);
        }
        if let Some(status) = status {
            q = q.bind(status.as_str());
        }
        let rows = q.bind(limit).bind(offset).fetch_all(&self.pool).await?;

        rows.into_iter().map(ArticleRow::into_article).collect()
    }

    /// Articles whose body has not been scraped yet. An empty string counts as
    /// missing, matching [`Article::has_content`]. Errored articles stay in the
    /// queue and are retried on the next bulk run.
    pub async fn articles_without_content(&self, limit: i64) -> Result<Vec<Article>> {
        let rows = sqlx::query_as::<_, ArticleRow>(
            "SELECT id, title, link, description, published, feed_url, content, summary, \
             status, created_at, updated_at FROM articles \
             WHERE content IS NULL OR content = '' \
             ORDER BY created_at DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ArticleRow::into_article).collect()
    }

    /// Articles with no summary yet. Whether an article has usable source text
    /// (body or description) is the summarizer's call, not the store's.
    pub async fn articles_without_summary(&self, limit: i64) -> Result<Vec<Article>> {
        let rows = sqlx::query_as::<_, ArticleRow>(
            "SELECT id, title, link, description, published, feed_url, content, summary, \
             status, created_at, updated_at FROM articles \
             WHERE summary IS NULL OR summary = '' \
             ORDER BY created_at DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ArticleRow::into_article).collect()
    }

    /// Store a scraped body and advance the article to `scraped`.
    pub async fn update_article_content(&self, id: i64, content: &str) -> Result<()> {
        sqlx::query("UPDATE articles SET content = ?, status = ?, updated_at = ? WHERE id = ?")
            .bind(content)
            .bind(ArticleStatus::Scraped.as_str())
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Store a generated summary and advance the article to `summarized`.
    pub async fn update_article_summary(&self, id: i64, summary: &str) -> Result<()> {
        sqlx::query("UPDATE articles SET summary = ?, status = ?, updated_at = ? WHERE id = ?")
            .bind(summary)
            .bind(ArticleStatus::Summarized.as_str())
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn mark_article_error(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE articles SET status = ?, updated_at = ? WHERE id = ?")
            .bind(ArticleStatus::Error.as_str())
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Articles discovered since `cutoff`, restricted to active feeds. Feeds
    /// that were paused or errored out do not contribute to the daily digest.
    pub async fn articles_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<Article>> {
        let rows = sqlx::query_as::<_, ArticleRow>(
            r#"
            SELECT a.id, a.title, a.link, a.description, a.published, a.feed_url,
                   a.content, a.summary, a.status, a.created_at, a.updated_at
            FROM articles a
            JOIN feeds f ON f.url = a.feed_url
            WHERE f.status = ? AND a.created_at >= ?
            ORDER BY COALESCE(a.published, a.created_at) DESC
            "#,
        )
        .bind(FeedStatus::Active.as_str())
        .bind(cutoff.to_rfc3339())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ArticleRow::into_article).collect()
    }

    pub async fn count_articles(&self, feed_url: Option<&str>) -> Result<i64> {
        let count: (i64,) = match feed_url {
            Some(url) => {
                sqlx::query_as("SELECT COUNT(*) FROM articles WHERE feed_url = ?")
                    .bind(url)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as("SELECT COUNT(*) FROM articles")
                    .fetch_one(&self.pool)
                    .await?
            }
        };

        Ok(count.0)
    }

    // -- daily summaries -----------------------------------------------------

    pub async fn insert_daily_summary(&self, summary: &DailySummary) -> Result<DailySummary> {
        let result = sqlx::query(
            r#"
            INSERT INTO daily_summaries
                (title, summary, article_count, sources_count, time_range_hours, generated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&summary.title)
        .bind(&summary.summary)
        .bind(summary.article_count)
        .bind(summary.sources_count)
        .bind(summary.time_range_hours)
        .bind(summary.generated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        let mut stored = summary.clone();
        stored.id = Some(result.last_insert_rowid());
        Ok(stored)
    }

    pub async fn latest_daily_summary(&self) -> Result<Option<DailySummary>> {
        let row = sqlx::query_as::<_, DailySummaryRow>(
            "SELECT id, title, summary, article_count, sources_count, time_range_hours, \
             generated_at FROM daily_summaries ORDER BY generated_at DESC, id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(DailySummaryRow::into_daily_summary).transpose()
    }

    pub async fn recent_daily_summaries(&self, limit: i64) -> Result<Vec<DailySummary>> {
        let rows = sqlx::query_as::<_, DailySummaryRow>(
            "SELECT id, title, summary, article_count, sources_count, time_range_hours, \
             generated_at FROM daily_summaries ORDER BY generated_at DESC, id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(DailySummaryRow::into_daily_summary)
            .collect()
    }

    // -- statistics ----------------------------------------------------------

    /// Per-feed article rollup, one entry per feed in id order.
    pub async fn feed_statistics(&self) -> Result<Vec<FeedStatistics>> {
        let rows = sqlx::query_as::<_, FeedStatsRow>(
            r#"
            SELECT f.id, f.title, f.url, f.status, f.last_updated,
                   COUNT(a.id) AS total_articles,
                   COALESCE(SUM(CASE WHEN a.content IS NOT NULL AND a.content != ''
                                     THEN 1 ELSE 0 END), 0) AS articles_with_content,
                   COALESCE(SUM(CASE WHEN a.summary IS NOT NULL AND a.summary != ''
                                     THEN 1 ELSE 0 END), 0) AS articles_with_summary,
                   MAX(a.created_at) AS latest_article
            FROM feeds f
            LEFT JOIN articles a ON a.feed_url = f.url
            GROUP BY f.id
            ORDER BY f.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(FeedStatsRow::into_statistics).collect()
    }

    pub async fn global_statistics(&self) -> Result<GlobalStatistics> {
        let (total_articles,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM articles")
            .fetch_one(&self.pool)
            .await?;
        let (total_feeds,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM feeds")
            .fetch_one(&self.pool)
            .await?;
        let (active_feeds,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM feeds WHERE status = ?")
                .bind(FeedStatus::Active.as_str())
                .fetch_one(&self.pool)
                .await?;
        let (articles_with_content,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM articles WHERE content IS NOT NULL AND content != ''",
        )
        .fetch_one(&self.pool)
        .await?;
        let (articles_with_summary,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM articles WHERE summary IS NOT NULL AND summary != ''",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(GlobalStatistics {
            total_articles,
            total_feeds,
            active_feeds,
            articles_with_content,
            articles_with_summary,
        })
    }
}

fn decode_error(message: String) -> NuntiusError {
    NuntiusError::DatabaseError(sqlx::Error::Decode(message.into()))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| decode_error(format!("invalid timestamp {raw:?}: {e}")))
}

fn parse_opt_timestamp(raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    raw.map(parse_timestamp).transpose()
}

fn parse_article_status(raw: &str) -> Result<ArticleStatus> {
    ArticleStatus::parse(raw).ok_or_else(|| decode_error(format!("unknown article status {raw:?}")))
}

fn parse_feed_status(raw: &str) -> Result<FeedStatus> {
    FeedStatus::parse(raw).ok_or_else(|| decode_error(format!("unknown feed status {raw:?}")))
}

// Row types for sqlx queries
#[derive(Debug, FromRow)]
struct FeedRow {
    id: i64,
    url: String,
    title: Option<String>,
    description: Option<String>,
    status: String,
    last_updated: Option<String>,
    last_fetch_error: Option<String>,
    fetch_interval: i64,
    created_at: String,
    updated_at: String,
}

impl FeedRow {
    fn into_feed(self) -> Result<Feed> {
        Ok(Feed {
            id: Some(self.id),
            url: self.url,
            title: self.title,
            description: self.description,
            status: parse_feed_status(&self.status)?,
            last_updated: parse_opt_timestamp(self.last_updated.as_deref())?,
            last_fetch_error: self.last_fetch_error,
            fetch_interval: self.fetch_interval as u64,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

#[derive(Debug, FromRow)]
struct ArticleRow {
    id: i64,
    title: String,
    link: String,
    description: Option<String>,
    published: Option<String>,
    feed_url: String,
    content: Option<String>,
    summary: Option<String>,
    status: String,
    created_at: String,
    updated_at: String,
}

impl ArticleRow {
    fn into_article(self) -> Result<Article> {
        Ok(Article {
            id: Some(self.id),
            title: self.title,
            link: self.link,
            description: self.description,
            published: parse_opt_timestamp(self.published.as_deref())?,
            feed_url: self.feed_url,
            content: self.content,
            summary: self.summary,
            status: parse_article_status(&self.status)?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

#[derive(Debug, FromRow)]
struct DailySummaryRow {
    id: i64,
    title: String,
    summary: String,
    article_count: i64,
    sources_count: i64,
    time_range_hours: i64,
    generated_at: String,
}

impl DailySummaryRow {
    fn into_daily_summary(self) -> Result<DailySummary> {
        Ok(DailySummary {
            id: Some(self.id),
            title: self.title,
            summary: self.summary,
            article_count: self.article_count,
            sources_count: self.sources_count,
            time_range_hours: self.time_range_hours,
            generated_at: parse_timestamp(&self.generated_at)?,
        })
    }
}

#[derive(Debug, FromRow)]
struct FeedStatsRow {
    id: i64,
    title: Option<String>,
    url: String,
    status: String,
    last_updated: Option<String>,
    total_articles: i64,
    articles_with_content: i64,
    articles_with_summary: i64,
    latest_article: Option<String>,
}

impl FeedStatsRow {
    fn into_statistics(self) -> Result<FeedStatistics> {
        let status = parse_feed_status(&self.status)?;
        Ok(FeedStatistics {
            feed_id: self.id,
            feed_title: self.title.unwrap_or(self.url),
            total_articles: self.total_articles,
            articles_with_content: self.articles_with_content,
            articles_with_summary: self.articles_with_summary,
            latest_article_date: parse_opt_timestamp(self.latest_article.as_deref())?,
            last_updated: parse_opt_timestamp(self.last_updated.as_deref())?,
            error_count: i64::from(status == FeedStatus::Error),
        })
    }
}
