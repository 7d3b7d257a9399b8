//! Application configuration.
//!
//! Settings live in a JSON file under the platform config directory
//! (`~/.config/nuntius/config.json` on Linux). Every field has a default,
//! so a missing or partial file still yields a working configuration.
//!
//! The OpenAI API key is the exception to persistence: it is read from the
//! `OPENAI_API_KEY` environment variable at load time and never written
//! back to disk.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{NuntiusError, Result, extract};

/// Database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx connection URL
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: "sqlite://nuntius.db".to_string() }
    }
}

/// AI summarization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Never persisted; populated from the environment
    #[serde(skip)]
    pub api_key: Option<String>,
    pub model: String,
    /// Target summary length in characters; also bounds the token budget
    pub max_summary_length: usize,
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout: u64,
    /// Default batch size for bulk summarization
    pub bulk_limit: usize,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            max_summary_length: 500,
            temperature: 0.3,
            timeout: 30,
            bulk_limit: 10,
        }
    }
}

/// Feed refresh settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedsConfig {
    /// Default seconds between refreshes for newly added feeds
    pub fetch_interval: u64,
    /// Cap on articles taken from a single feed per refresh
    pub max_articles_per_feed: usize,
    /// Request timeout in seconds, shared with the scraper
    pub request_timeout: u64,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self { fetch_interval: 3600, max_articles_per_feed: 100, request_timeout: 30 }
    }
}

/// Presentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Articles shown per listing page
    pub items_per_page: usize,
    /// Maximum length of scraped content in characters
    pub max_content_length: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { items_per_page: 20, max_content_length: extract::DEFAULT_MAX_LENGTH }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub ai: AiConfig,
    pub feeds: FeedsConfig,
    pub ui: UiConfig,
}

impl Config {
    /// The default configuration file location for this platform.
    ///
    /// Returns `None` when the platform exposes no config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("nuntius").join("config.json"))
    }

    /// Loads configuration from a file, falling back to defaults when the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`NuntiusError::ConfigError`] when the file exists but cannot
    /// be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| NuntiusError::ConfigError(format!("{}: {e}", path.display())))?;
            serde_json::from_str(&raw).map_err(|e| NuntiusError::ConfigError(format!("{}: {e}", path.display())))?
        } else {
            Self::default()
        };

        config.apply_api_key(std::env::var("OPENAI_API_KEY").ok());
        Ok(config)
    }

    /// Loads configuration from the default location.
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => {
                let mut config = Self::default();
                config.apply_api_key(std::env::var("OPENAI_API_KEY").ok());
                Ok(config)
            }
        }
    }

    /// Saves configuration to a file, creating parent directories as needed.
    ///
    /// The API key is skipped during serialization and never reaches disk.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(self)
            .map_err(|e| NuntiusError::ConfigError(format!("serialize: {e}")))?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    /// Feeds seeded into a fresh installation.
    pub fn default_feeds() -> &'static [&'static str] {
        &[
            "https://feeds.bbci.co.uk/news/rss.xml",
            "https://rss.cnn.com/rss/edition.rss",
            "https://feeds.reuters.com/reuters/topNews",
            "https://techcrunch.com/feed/",
            "https://feeds.npr.org/1001/rss.xml",
        ]
    }

    fn apply_api_key(&mut self, key: Option<String>) {
        if let Some(key) = key
            && !key.trim().is_empty()
        {
            self.ai.api_key = Some(key);
        }
    }
}
