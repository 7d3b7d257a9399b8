use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use nuntius_core::{
    Article, ArticleStatus, Config, Document, Feed, FeedManager, FeedStatus, FetchConfig, Scraper, Store, Summarizer,
    extract_main_content, fetch_html,
};
use owo_colors::OwoColorize;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Aggregate news feeds, scrape article content, and generate AI summaries
#[derive(Parser, Debug)]
#[command(name = "nuntius")]
#[command(version)]
#[command(about = "Aggregate news feeds, scrape articles, and summarize them", long_about = None)]
struct Args {
    /// Configuration file (default: the platform config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Database URL override (e.g. sqlite://news.db)
    #[arg(long, global = true, value_name = "URL")]
    database: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage feed subscriptions
    #[command(subcommand)]
    Feed(FeedCommand),

    /// Fetch new articles from subscribed feeds
    Refresh {
        /// Refresh a single feed by id
        #[arg(long, value_name = "ID")]
        feed: Option<i64>,
    },

    /// Scrape full article content for pending articles
    Scrape {
        /// Maximum number of queued articles to scrape
        #[arg(short, long, value_name = "N")]
        limit: Option<usize>,

        /// Scrape a single article by id
        #[arg(long, value_name = "ID")]
        article: Option<i64>,

        /// Extract a page and print the text without saving anything
        #[arg(long, value_name = "URL", conflicts_with_all = ["article", "limit"])]
        url: Option<String>,
    },

    /// Generate AI summaries for scraped articles
    Summarize {
        /// Maximum number of articles to summarize
        #[arg(short, long, value_name = "N")]
        limit: Option<usize>,

        /// Summarize a single article by id
        #[arg(long, value_name = "ID")]
        article: Option<i64>,
    },

    /// Generate and store a digest of recent articles
    Digest {
        /// Look-back window in hours
        #[arg(long, default_value = "24", value_name = "N")]
        hours: i64,
    },

    /// List stored articles
    Articles {
        /// Maximum number of articles to show
        #[arg(short, long, default_value = "20", value_name = "N")]
        limit: i64,

        /// Only articles from this feed URL
        #[arg(long, value_name = "URL")]
        feed: Option<String>,

        /// Only articles with this status (pending, scraped, summarized, error)
        #[arg(long, value_name = "STATUS")]
        status: Option<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one article in full
    Article {
        #[arg(value_name = "ID")]
        id: i64,
    },

    /// Show per-feed and overall statistics
    Stats,
}

#[derive(Subcommand, Debug)]
enum FeedCommand {
    /// Validate a feed URL and subscribe to it
    Add {
        #[arg(value_name = "URL")]
        url: String,
    },

    /// Subscribe to the built-in starter feeds
    Defaults,

    /// List subscribed feeds
    List {
        /// Include inactive feeds
        #[arg(long)]
        all: bool,
    },

    /// Unsubscribe from a feed (articles are kept)
    Remove {
        #[arg(value_name = "ID")]
        id: i64,
    },

    /// Reactivate a removed feed
    Restore {
        #[arg(value_name = "ID")]
        id: i64,
    },

    /// Permanently delete a feed and all of its articles
    Purge {
        #[arg(value_name = "ID")]
        id: i64,
    },
}

/// Print a styled banner for verbose mode
fn print_banner() {
    eprintln!(
        "\n{} {} {}",
        "Nuntius".bold().bright_blue(),
        "v".dimmed(),
        VERSION.dimmed()
    );
    eprintln!("{}", "Aggregate news feeds, scrape articles, and summarize them".dimmed());
    eprintln!();
}

/// Print a success message
fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

fn paint_feed_status(status: FeedStatus) -> String {
    let label = format!("{:<8}", status.as_str());
    match status {
        FeedStatus::Active => label.green().to_string(),
        FeedStatus::Inactive => label.dimmed().to_string(),
        FeedStatus::Error => label.red().to_string(),
        FeedStatus::Paused => label.yellow().to_string(),
    }
}

fn paint_article_status(status: ArticleStatus) -> String {
    let label = format!("{:<10}", status.as_str());
    match status {
        ArticleStatus::Pending => label.yellow().to_string(),
        ArticleStatus::Scraped => label.cyan().to_string(),
        ArticleStatus::Summarized => label.green().to_string(),
        ArticleStatus::Error => label.red().to_string(),
    }
}

/// Shorten a title for one-line table output
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{cut}...")
}

fn init_tracing(verbose: bool) {
    let directives = if verbose { "nuntius=debug,nuntius_core=debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(directives));

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.verbose {
        print_banner();
    }

    let mut config = match &args.config {
        Some(path) => {
            Config::load(path).with_context(|| format!("failed to load config from {}", path.display()))?
        }
        None => Config::load_default().context("failed to load configuration")?,
    };

    if let Some(url) = args.database.clone() {
        config.database.url = url;
    }

    // The extraction preview works without touching the database.
    if let Command::Scrape { url: Some(url), .. } = &args.command {
        return preview_extraction(url, &config).await;
    }

    let store = Store::connect(&config.database.url)
        .await
        .with_context(|| format!("failed to open database {}", config.database.url))?;

    match args.command {
        Command::Feed(command) => cmd_feed(&store, &config, command).await,
        Command::Refresh { feed } => cmd_refresh(&store, &config, feed).await,
        Command::Scrape { limit, article, .. } => cmd_scrape(&store, &config, limit, article).await,
        Command::Summarize { limit, article } => cmd_summarize(&store, &config, limit, article).await,
        Command::Digest { hours } => cmd_digest(&store, &config, hours).await,
        Command::Articles { limit, feed, status, json } => cmd_articles(&store, limit, feed, status, json).await,
        Command::Article { id } => cmd_article(&store, id).await,
        Command::Stats => cmd_stats(&store).await,
    }
}

/// Fetch a page and print what the extractor finds, without saving anything
async fn preview_extraction(url: &str, config: &Config) -> anyhow::Result<()> {
    let fetch = FetchConfig::with_timeout(config.feeds.request_timeout);
    let html = fetch_html(url, &fetch).await.with_context(|| format!("failed to fetch {url}"))?;

    let mut doc = Document::parse(&html)?;
    match extract_main_content(&mut doc, config.ui.max_content_length) {
        Some(content) => {
            print_success(&format!("Extracted {} characters", content.chars().count()));
            println!("{content}");
            Ok(())
        }
        None => anyhow::bail!("no readable content found at {url}"),
    }
}

async fn cmd_feed(store: &Store, config: &Config, command: FeedCommand) -> anyhow::Result<()> {
    match command {
        FeedCommand::Add { url } => {
            let manager = FeedManager::new(store.clone(), config);
            let feed = manager.add_feed(&url).await?;
            print_success(&format!("Subscribed to {}", feed.display_name()));
            Ok(())
        }
        FeedCommand::Defaults => {
            let manager = FeedManager::new(store.clone(), config);
            let mut added = 0usize;
            for url in Config::default_feeds() {
                match manager.add_feed(url).await {
                    Ok(feed) => {
                        added += 1;
                        print_success(&format!("Subscribed to {}", feed.display_name()));
                    }
                    Err(e) => print_warning(&format!("{e}")),
                }
            }
            print_info(&format!("{added} feeds added"));
            Ok(())
        }
        FeedCommand::List { all } => {
            let feeds = store.list_feeds(all).await?;
            if feeds.is_empty() {
                print_info("No feeds subscribed. Add one with: nuntius feed add <url>");
                return Ok(());
            }
            for feed in &feeds {
                print_feed_line(feed);
            }
            Ok(())
        }
        FeedCommand::Remove { id } => {
            if store.delete_feed(id).await? {
                print_success(&format!("Feed {id} deactivated; its articles are kept"));
                Ok(())
            } else {
                anyhow::bail!("feed {id} not found")
            }
        }
        FeedCommand::Restore { id } => {
            if store.restore_feed(id).await? {
                print_success(&format!("Feed {id} restored"));
                Ok(())
            } else {
                anyhow::bail!("feed {id} not found")
            }
        }
        FeedCommand::Purge { id } => {
            if store.purge_feed(id).await? {
                print_success(&format!("Feed {id} and its articles deleted"));
                Ok(())
            } else {
                anyhow::bail!("feed {id} not found")
            }
        }
    }
}

fn print_feed_line(feed: &Feed) {
    let id = feed.id.unwrap_or_default();
    println!("{:>4}  {}  {}", id, paint_feed_status(feed.status), feed.display_name().bold());
    println!("      {}", feed.url.dimmed());
    if let Some(error) = &feed.last_fetch_error {
        println!("      {}", error.red());
    }
}

async fn cmd_refresh(store: &Store, config: &Config, feed_id: Option<i64>) -> anyhow::Result<()> {
    let manager = FeedManager::new(store.clone(), config);

    match feed_id {
        Some(id) => {
            let feed = store.get_feed(id).await?.with_context(|| format!("feed {id} not found"))?;
            let inserted = manager.refresh_feed(&feed).await?;
            print_success(&format!("{}: {inserted} new articles", feed.display_name()));
        }
        None => {
            let outcome = manager.refresh_all().await?;
            for error in &outcome.errors {
                print_warning(error);
            }
            print_success(&format!(
                "{} feeds checked, {} new articles",
                outcome.feeds_checked, outcome.new_articles
            ));
        }
    }
    Ok(())
}

async fn cmd_scrape(
    store: &Store,
    config: &Config,
    limit: Option<usize>,
    article: Option<i64>,
) -> anyhow::Result<()> {
    let scraper = Scraper::new(store.clone(), config);

    match article {
        Some(id) => {
            if scraper.scrape_article(id).await? {
                print_success(&format!("Article {id} scraped"));
            } else {
                anyhow::bail!("could not extract content for article {id}");
            }
        }
        None => {
            let scraped = scraper.bulk_scrape(limit).await?;
            print_success(&format!("{scraped} articles scraped"));
        }
    }
    Ok(())
}

async fn cmd_summarize(
    store: &Store,
    config: &Config,
    limit: Option<usize>,
    article: Option<i64>,
) -> anyhow::Result<()> {
    let summarizer = Summarizer::new(store.clone(), config)?;

    match article {
        Some(id) => {
            if summarizer.summarize_article(id).await? {
                print_success(&format!("Article {id} summarized"));
            } else {
                anyhow::bail!("article {id} has no text to summarize");
            }
        }
        None => {
            let summarized = summarizer.bulk_summarize(limit).await?;
            print_success(&format!("{summarized} articles summarized"));
        }
    }
    Ok(())
}

async fn cmd_digest(store: &Store, config: &Config, hours: i64) -> anyhow::Result<()> {
    let summarizer = Summarizer::new(store.clone(), config)?;
    print_info(&format!("Generating digest with {}", summarizer.model()));

    let digest = summarizer.daily_digest(hours).await?;

    println!("{}", digest.title.bold().bright_blue());
    println!(
        "{}",
        format!(
            "{} articles from {} sources, last {} hours",
            digest.article_count, digest.sources_count, digest.time_range_hours
        )
        .dimmed()
    );
    println!();
    println!("{}", digest.summary);
    Ok(())
}

async fn cmd_articles(
    store: &Store,
    limit: i64,
    feed: Option<String>,
    status: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let status = match status.as_deref() {
        Some(s) => Some(ArticleStatus::parse(s).with_context(|| {
            format!("unknown status {s:?} (expected pending, scraped, summarized, or error)")
        })?),
        None => None,
    };

    let articles = store.list_articles(limit, 0, feed.as_deref(), status).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&articles)?);
        return Ok(());
    }

    if articles.is_empty() {
        print_info("No articles found");
        return Ok(());
    }

    for article in &articles {
        print_article_line(article);
    }

    let total = store.count_articles(feed.as_deref()).await?;
    print_info(&format!("{} of {total} articles", articles.len()));
    Ok(())
}

fn print_article_line(article: &Article) {
    let id = article.id.unwrap_or_default();
    let date = article.published.unwrap_or(article.created_at).format("%Y-%m-%d %H:%M");
    println!(
        "{:>4}  {}  {}  {}",
        id,
        paint_article_status(article.status),
        date,
        truncate(&article.title, 70).bold()
    );
    println!("      {}", article.link.dimmed());
}

async fn cmd_article(store: &Store, id: i64) -> anyhow::Result<()> {
    let article = store.get_article(id).await?.with_context(|| format!("article {id} not found"))?;

    println!("{}", article.title.bold().bright_blue());
    println!("{}", article.link.dimmed());
    println!();
    println!("{} {}", "Feed:".dimmed(), article.feed_url);
    println!("{} {}", "Status:".dimmed(), article.status.as_str());
    if let Some(published) = article.published {
        println!("{} {}", "Published:".dimmed(), published.format("%Y-%m-%d %H:%M"));
    }

    if let Some(summary) = &article.summary {
        println!();
        println!("{}", "Summary".bold());
        println!("{summary}");
    }

    if let Some(content) = &article.content {
        println!();
        println!("{}", "Content".bold());
        println!("{content}");
    } else if let Some(description) = &article.description {
        println!();
        println!("{}", "Description".bold());
        println!("{description}");
    }
    Ok(())
}

async fn cmd_stats(store: &Store) -> anyhow::Result<()> {
    let feeds = store.feed_statistics().await?;
    let global = store.global_statistics().await?;

    println!("{}", "Feeds".bold());
    if feeds.is_empty() {
        print_info("No feeds subscribed");
    }
    for stats in &feeds {
        println!(
            "{:>4}  {:<40}  {:>5} articles  {:>5.1}% scraped  {:>5.1}% summarized",
            stats.feed_id,
            truncate(&stats.feed_title, 40),
            stats.total_articles,
            stats.content_completion_rate(),
            stats.summary_completion_rate(),
        );
    }

    println!();
    println!("{}", "Totals".bold());
    println!("  {} feeds ({} active)", global.total_feeds, global.active_feeds);
    println!(
        "  {} articles, {:.1}% scraped, {:.1}% summarized",
        global.total_articles,
        global.content_completion_rate(),
        global.summary_completion_rate()
    );
    Ok(())
}
