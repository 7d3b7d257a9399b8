//! AI summarization over an OpenAI-compatible chat API: per-article
//! summaries and the daily digest.

use std::collections::HashSet;

use chrono::{Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::{AiConfig, Config};
use crate::error::{NuntiusError, Result};
use crate::models::{Article, DailySummary};
use crate::store::Store;

const ARTICLE_SYSTEM_PROMPT: &str = "You are a professional news summarizer. \
    Create concise, accurate summaries of news articles.";

const DIGEST_SYSTEM_PROMPT: &str = "You are a professional news editor creating daily news \
    digests. Your task is to synthesize multiple news articles into a single, flowing narrative \
    that reads like a comprehensive news briefing. Write in a clear, engaging style that connects \
    related stories and provides context.";

/// Article text beyond this many chars is not sent to the model.
const ARTICLE_PROMPT_CAP: usize = 3000;
/// Per-article text cap when assembling the digest input.
const DIGEST_ARTICLE_CAP: usize = 1000;
/// At most this many articles feed one digest.
const DIGEST_ARTICLE_LIMIT: usize = 50;
const DIGEST_MAX_TOKENS: u32 = 800;
const DIGEST_TEMPERATURE: f32 = 0.3;

/// Minimal OpenAI-compatible chat client.
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: u64,
}

impl ChatClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: 30,
        }
    }

    /// Build a client from config. The API key must be present, either from
    /// the config file or the `OPENAI_API_KEY` environment override applied
    /// at config load.
    pub fn from_config(config: &AiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| NuntiusError::AiError("API key not configured".to_string()))?;

        Ok(Self {
            client: Client::new(),
            api_key,
            model: config.model.clone(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: config.timeout,
        })
    }

    /// Set the chat model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom base URL (for proxies and compatible providers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One system+user exchange, returning the assistant's text.
    pub async fn chat(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            temperature: Some(temperature),
            max_tokens: Some(max_tokens),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .timeout(std::time::Duration::from_secs(self.timeout))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| NuntiusError::AiError(e.to_string()))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NuntiusError::AiError(format!("chat API error: {body}")));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| NuntiusError::AiError(e.to_string()))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| NuntiusError::AiError("no choices in chat response".to_string()))
    }
}

// Request/response types for the chat completions endpoint.

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Summarization service over the store and a chat client.
pub struct Summarizer {
    store: Store,
    ai: AiConfig,
    client: ChatClient,
}

impl Summarizer {
    /// Fails when no API key is configured.
    pub fn new(store: Store, config: &Config) -> Result<Self> {
        Ok(Self {
            store,
            ai: config.ai.clone(),
            client: ChatClient::from_config(&config.ai)?,
        })
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// Summarize article text within the configured length budget.
    pub async fn summarize_text(&self, content: &str, title: &str) -> Result<String> {
        let words = self.ai.max_summary_length / 4;
        let user = format!(
            "Please summarize the following news article in {words} words or less.\n\
             Focus on the key facts, main points, and important details.\n\n\
             Title: {title}\n\n\
             Article Content:\n{}\n\n\
             Summary:",
            cap_chars(content, ARTICLE_PROMPT_CAP)
        );
        let max_tokens = (self.ai.max_summary_length / 2) as u32;

        let summary = self
            .client
            .chat(ARTICLE_SYSTEM_PROMPT, &user, max_tokens, self.ai.temperature)
            .await?;
        Ok(summary.trim().to_string())
    }

    /// Summarize one stored article. An article that already carries a
    /// summary is left alone and counts as done. Articles with neither body
    /// nor description have nothing to summarize and return `false`.
    pub async fn summarize_article(&self, id: i64) -> Result<bool> {
        let Some(article) = self.store.get_article(id).await? else {
            return Ok(false);
        };
        if article.has_summary() {
            return Ok(true);
        }

        let source = article
            .content
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| article.description.as_deref().filter(|t| !t.trim().is_empty()));
        let Some(text) = source else {
            return Ok(false);
        };

        let summary = self.summarize_text(text, &article.title).await?;
        if summary.is_empty() {
            return Ok(false);
        }
        self.store.update_article_summary(id, &summary).await?;
        Ok(true)
    }

    /// Summarize queued articles sequentially, up to `limit` (the configured
    /// bulk limit by default). Per-article failures are logged and skipped.
    /// Returns how many summaries were stored.
    pub async fn bulk_summarize(&self, limit: Option<usize>) -> Result<usize> {
        let limit = limit.unwrap_or(self.ai.bulk_limit);
        let articles = self.store.articles_without_summary(limit as i64).await?;

        if articles.is_empty() {
            info!("no articles need summaries");
            return Ok(0);
        }

        info!(count = articles.len(), "starting bulk summarize");
        let mut summarized = 0;
        for article in &articles {
            let Some(id) = article.id else { continue };
            if !has_usable_text(article) {
                continue;
            }
            match self.summarize_article(id).await {
                Ok(true) => summarized += 1,
                Ok(false) => {}
                Err(e) => error!(id, error = %e, "failed to summarize article"),
            }
        }
        info!(summarized, "bulk summarize finished");

        Ok(summarized)
    }

    /// Build and persist a digest of the articles discovered on active feeds
    /// within the last `hours`.
    pub async fn daily_digest(&self, hours: i64) -> Result<DailySummary> {
        let cutoff = Utc::now() - Duration::hours(hours);
        let articles = self.store.articles_since(cutoff).await?;

        if articles.is_empty() {
            return Err(NuntiusError::AiError(format!(
                "no articles from active feeds in the last {hours} hours"
            )));
        }

        let sources: HashSet<&str> = articles.iter().map(|a| a.feed_url.as_str()).collect();
        let user = digest_prompt(&articles, hours);

        let summary = self
            .client
            .chat(DIGEST_SYSTEM_PROMPT, &user, DIGEST_MAX_TOKENS, DIGEST_TEMPERATURE)
            .await?;
        let summary = summary.trim().to_string();
        if summary.is_empty() {
            return Err(NuntiusError::AiError("empty digest response".to_string()));
        }

        let digest = DailySummary {
            id: None,
            title: "Daily News Summary".to_string(),
            summary,
            article_count: articles.len() as i64,
            sources_count: sources.len() as i64,
            time_range_hours: hours,
            generated_at: Utc::now(),
        };
        self.store.insert_daily_summary(&digest).await
    }
}

fn has_usable_text(article: &Article) -> bool {
    article.has_content()
        || article
            .description
            .as_deref()
            .is_some_and(|d| !d.trim().is_empty())
}

/// Longest prefix of `text` holding at most `max` chars, cut on a char
/// boundary.
fn cap_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}

/// Best text for one digest entry: an existing summary, else a capped body,
/// else the description, else just the title.
fn best_article_text(article: &Article) -> String {
    if let Some(summary) = article.summary.as_deref().filter(|s| !s.trim().is_empty()) {
        return summary.to_string();
    }
    if let Some(content) = article.content.as_deref().filter(|c| !c.trim().is_empty()) {
        let capped = cap_chars(content, DIGEST_ARTICLE_CAP);
        if capped.len() < content.len() {
            return format!("{capped}...");
        }
        return content.to_string();
    }
    if let Some(description) = article
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
    {
        return description.to_string();
    }
    article.title.clone()
}

/// Assemble the digest prompt: one entry per article in the order given
/// (newest first), capped at [`DIGEST_ARTICLE_LIMIT`] entries.
fn digest_prompt(articles: &[Article], hours: i64) -> String {
    let entries: Vec<String> = articles
        .iter()
        .take(DIGEST_ARTICLE_LIMIT)
        .map(|article| {
            let time_info = article.created_at.format("%H:%M");
            format!("**{}** ({time_info})\n{}", article.title, best_article_text(article))
        })
        .collect();
    let combined = entries.join("\n\n---\n\n");

    format!(
        "You are a professional news editor creating a comprehensive daily digest. Based on the \
         {count} articles from active news feeds in the last {hours} hours below, create a \
         single, cohesive narrative summary that flows naturally from topic to topic.\n\n\
         Requirements:\n\
         1. Write as ONE continuous text (not bullet points or sections)\n\
         2. Start with the most significant breaking news or developments\n\
         3. Connect related stories and themes naturally in the narrative\n\
         4. Include key details, numbers, and quotes where relevant\n\
         5. Transition smoothly between different topics and regions\n\
         6. End with a brief outlook or context for tomorrow\n\
         7. Write in an engaging, journalistic style suitable for an informed reader\n\
         8. Aim for 300-500 words\n\n\
         Focus on creating a flowing narrative that gives readers a complete picture of today's \
         news landscape, as if you were briefing someone who's been away and needs to catch up \
         on everything important that happened today.\n\n\
         Articles to synthesize:\n{combined}\n\n\
         Write a comprehensive daily news summary:",
        count = articles.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArticleStatus;

    fn config_with_key() -> Config {
        let mut config = Config::default();
        config.ai.api_key = Some("sk-test".to_string());
        config
    }

    #[test]
    fn test_chat_client_builder() {
        let client = ChatClient::new("sk-test")
            .with_model("gpt-4o")
            .with_base_url("https://llm.example.com/v1");

        assert_eq!(client.model(), "gpt-4o");
        assert_eq!(client.base_url, "https://llm.example.com/v1");
    }

    #[test]
    fn test_client_requires_api_key() {
        let missing = ChatClient::from_config(&AiConfig::default());
        assert!(matches!(missing, Err(NuntiusError::AiError(_))));

        let blank = ChatClient::from_config(&AiConfig {
            api_key: Some("   ".to_string()),
            ..AiConfig::default()
        });
        assert!(blank.is_err());

        let client = ChatClient::from_config(&AiConfig {
            api_key: Some("sk-test".to_string()),
            ..AiConfig::default()
        })
        .unwrap();
        assert_eq!(client.model(), "gpt-4o-mini");
    }

    #[test]
    fn test_cap_chars_counts_chars_not_bytes() {
        assert_eq!(cap_chars("hello", 10), "hello");
        assert_eq!(cap_chars("hello", 3), "hel");
        // Multibyte input still cuts on a char boundary.
        assert_eq!(cap_chars("ééééé", 3), "ééé");
    }

    #[test]
    fn test_best_article_text_preference_order() {
        let mut article = Article::new("Title", "https://example.com/a", "https://example.com/rss");
        assert_eq!(best_article_text(&article), "Title");

        article.description = Some("A teaser.".into());
        assert_eq!(best_article_text(&article), "A teaser.");

        article.content = Some("The full body.".into());
        assert_eq!(best_article_text(&article), "The full body.");

        article.summary = Some("The summary.".into());
        assert_eq!(best_article_text(&article), "The summary.");
    }

    #[test]
    fn test_best_article_text_caps_long_bodies() {
        let mut article = Article::new("Title", "https://example.com/a", "https://example.com/rss");
        article.content = Some("x".repeat(1500));

        let text = best_article_text(&article);
        assert_eq!(text.chars().count(), 1003);
        assert!(text.ends_with("..."));
    }

    #[test]
    fn test_digest_prompt_shape() {
        let articles: Vec<Article> = (0..55)
            .map(|i| {
                let mut a = Article::new(
                    format!("Story {i}"),
                    format!("https://example.com/{i}"),
                    "https://example.com/rss",
                );
                a.description = Some(format!("Teaser {i}."));
                a
            })
            .collect();

        let prompt = digest_prompt(&articles, 24);
        // The header counts every article, the body carries at most 50.
        assert!(prompt.contains("55 articles"));
        assert!(prompt.contains("last 24 hours"));
        assert!(prompt.contains("**Story 0**"));
        assert!(prompt.contains("Teaser 0."));
        assert!(prompt.contains("**Story 49**"));
        assert!(!prompt.contains("**Story 50**"));
        assert_eq!(prompt.matches("\n\n---\n\n").count(), 49);
    }

    #[tokio::test]
    async fn test_summarizer_requires_api_key() {
        let store = Store::in_memory().await.unwrap();
        assert!(Summarizer::new(store, &Config::default()).is_err());
    }

    #[tokio::test]
    async fn test_summarize_article_skips_already_summarized() {
        let store = Store::in_memory().await.unwrap();
        let mut article = Article::new("Title", "https://example.com/a", "https://example.com/rss");
        article.summary = Some("Done already.".into());
        article.status = ArticleStatus::Summarized;
        store.insert_article(&article).await.unwrap();
        let id = store
            .get_article_by_link("https://example.com/a")
            .await
            .unwrap()
            .unwrap()
            .id
            .unwrap();

        let summarizer = Summarizer::new(store, &config_with_key()).unwrap();
        assert!(summarizer.summarize_article(id).await.unwrap());
    }

    #[tokio::test]
    async fn test_summarize_article_without_text_is_false() {
        let store = Store::in_memory().await.unwrap();
        let article = Article::new("Title", "https://example.com/a", "https://example.com/rss");
        store.insert_article(&article).await.unwrap();
        let id = store
            .get_article_by_link("https://example.com/a")
            .await
            .unwrap()
            .unwrap()
            .id
            .unwrap();

        let summarizer = Summarizer::new(store, &config_with_key()).unwrap();
        assert!(!summarizer.summarize_article(id).await.unwrap());
        assert!(!summarizer.summarize_article(9999).await.unwrap());
    }
}
