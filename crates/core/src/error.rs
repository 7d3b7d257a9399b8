//! Error types for Nuntius operations.
//!
//! This module defines the main error type [`NuntiusError`] which represents
//! all possible errors that can occur during feed fetching, content scraping,
//! storage, and summarization operations.
//!
//! # Example
//!
//! ```rust
//! use nuntius_core::{NuntiusError, Result};
//!
//! fn check_url(url: &str) -> Result<()> {
//!     if url.is_empty() {
//!         return Err(NuntiusError::InvalidUrl("empty URL".to_string()));
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Main error type for feed aggregation and scraping operations.
///
/// This enum represents all possible errors that can occur during
/// HTTP fetching, feed parsing, HTML selection, persistence, and
/// AI summarization.
///
/// # Example
///
/// ```rust
/// use nuntius_core::NuntiusError;
///
/// let err = NuntiusError::Timeout { timeout: 30 };
/// assert!(err.to_string().contains("30"));
/// ```
#[derive(Error, Debug)]
pub enum NuntiusError {
    /// HTTP request errors from reqwest.
    ///
    /// This variant wraps network errors, DNS failures, connection issues,
    /// and other HTTP-related problems.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    ///
    /// Returned when an HTTP request exceeds the configured timeout duration.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided.
    ///
    /// Returned when a URL cannot be parsed or is malformed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Response was not an HTML page.
    ///
    /// Returned when a scrape target responds with a content type other
    /// than text/html, such as a PDF or a JSON API endpoint.
    #[error("Not an HTML response: {0}")]
    NotHtml(String),

    /// Invalid CSS selector.
    ///
    /// Returned when a selector string cannot be compiled.
    #[error("Invalid selector: {0}")]
    SelectorError(String),

    /// Feed parsing errors.
    ///
    /// Returned when a fetched document cannot be parsed as RSS or Atom.
    #[error("Failed to parse feed: {0}")]
    FeedError(String),

    /// Database errors from sqlx.
    ///
    /// Wraps connection failures, constraint violations, and query errors.
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// AI service errors.
    ///
    /// Returned when the chat completion API is unreachable, rejects the
    /// request, or returns an empty response.
    #[error("AI service error: {0}")]
    AiError(String),

    /// Configuration errors.
    ///
    /// Returned when the configuration file cannot be read or parsed.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// File I/O errors.
    ///
    /// Wraps standard I/O errors for file operations.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for NuntiusError.
///
/// This is a convenience alias for `std::result::Result<T, NuntiusError>`.
pub type Result<T> = std::result::Result<T, NuntiusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NuntiusError::InvalidUrl("not a url".to_string());
        assert!(err.to_string().contains("Invalid URL"));
    }

    #[test]
    fn test_timeout_error() {
        let err = NuntiusError::Timeout { timeout: 30 };
        assert!(err.to_string().contains("30"));
    }

    #[test]
    fn test_not_html_error() {
        let err = NuntiusError::NotHtml("application/pdf".to_string());
        assert!(err.to_string().contains("application/pdf"));
    }

    #[test]
    fn test_selector_error() {
        let err = NuntiusError::SelectorError("div[".to_string());
        assert!(err.to_string().contains("Invalid selector"));
    }
}
