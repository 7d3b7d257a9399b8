//! HTTP transport for feeds and article pages.
//!
//! This module performs the network half of scraping: browser-like GET
//! requests with timeout mapping and, for article pages, a content-type
//! gate that rejects anything other than HTML before extraction ever runs.

use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::{NuntiusError, Result};

/// HTTP client configuration shared by the feed fetcher and the scraper.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// User-Agent string sent with every request.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            // Desktop browser UA; many news sites block obvious bots.
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                .to_string(),
        }
    }
}

impl FetchConfig {
    /// Builds a config with the given timeout and the default User-Agent.
    pub fn with_timeout(timeout: u64) -> Self {
        Self { timeout, ..Self::default() }
    }
}

/// Fetches an HTML page from a URL.
///
/// Performs a GET request with browser-like headers, following redirects
/// and enforcing the configured timeout. Responses with a non-success
/// status or a content type other than `text/html` are rejected.
///
/// # Errors
///
/// * [`NuntiusError::InvalidUrl`] when the URL cannot be parsed
/// * [`NuntiusError::Timeout`] when the request exceeds the timeout
/// * [`NuntiusError::HttpError`] for transport failures and error statuses
/// * [`NuntiusError::NotHtml`] when the response is not an HTML page
pub async fn fetch_html(url: &str, config: &FetchConfig) -> Result<String> {
    let response = get(url, config).await?;

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_lowercase();
    if !content_type.contains("text/html") {
        return Err(NuntiusError::NotHtml(content_type));
    }

    Ok(response.text().await?)
}

/// Fetches raw bytes from a URL, for feed XML.
///
/// Same transport behavior as [`fetch_html`] without the content-type gate;
/// feeds are served under a wide variety of XML content types.
pub async fn fetch_bytes(url: &str, config: &FetchConfig) -> Result<Vec<u8>> {
    let response = get(url, config).await?;
    Ok(response.bytes().await?.to_vec())
}

async fn get(url: &str, config: &FetchConfig) -> Result<reqwest::Response> {
    let parsed_url = Url::parse(url).map_err(|e| NuntiusError::InvalidUrl(e.to_string()))?;

    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout))
        .build()
        .map_err(NuntiusError::HttpError)?;

    let response = client
        .get(parsed_url)
        .header("User-Agent", &config.user_agent)
        .header(
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )
        .header("Accept-Language", "en-US,en;q=0.5")
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                NuntiusError::Timeout { timeout: config.timeout }
            } else {
                NuntiusError::HttpError(e)
            }
        })?;

    Ok(response.error_for_status()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, 30);
        assert!(config.user_agent.contains("Mozilla/5.0"));
    }

    #[test]
    fn test_with_timeout_keeps_user_agent() {
        let config = FetchConfig::with_timeout(5);
        assert_eq!(config.timeout, 5);
        assert_eq!(config.user_agent, FetchConfig::default().user_agent);
    }

    #[tokio::test]
    async fn test_fetch_html_invalid_url() {
        let config = FetchConfig::default();
        let result = fetch_html("not-a-url", &config).await;
        assert!(matches!(result, Err(NuntiusError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_fetch_bytes_invalid_url() {
        let config = FetchConfig::default();
        let result = fetch_bytes("://missing-scheme", &config).await;
        assert!(matches!(result, Err(NuntiusError::InvalidUrl(_))));
    }

    #[test]
    fn test_url_validation() {
        assert!(Url::parse("http://example.com").is_ok());
        assert!(Url::parse("https://example.com").is_ok());
        assert!(Url::parse("example.com").is_err()); // Missing scheme
    }
}
