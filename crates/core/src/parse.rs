//! HTML parsing and DOM access.
//!
//! This module provides the [`Document`] and [`Element`] types for parsing
//! HTML pages and querying the tree with CSS selectors. Extraction works on
//! a mutable [`Document`]: noise elements are detached from the tree before
//! any candidate search runs.
//!
//! # Example
//!
//! ```rust
//! use nuntius_core::parse::Document;
//!
//! let html = r#"
//!     <html>
//!         <body>
//!             <article>Story text</article>
//!             <nav>Site menu</nav>
//!         </body>
//!     </html>
//! "#;
//!
//! let mut doc = Document::parse(html).unwrap();
//! doc.remove_all("nav").unwrap();
//! let articles = doc.select("article").unwrap();
//! assert_eq!(articles[0].text(), "Story text");
//! ```

use scraper::{Html, Selector};

use crate::{NuntiusError, Result};

/// Represents a parsed HTML document.
///
/// A Document wraps one HTML page and provides methods for querying elements
/// with CSS selectors, detaching unwanted subtrees, and extracting visible
/// text. html5ever recovers from malformed markup, so parsing always
/// produces a tree (with a synthesized `body` when the input has none).
///
/// Documents are created per page and discarded after extraction; nothing
/// is cached across calls.
///
/// # Example
///
/// ```rust
/// use nuntius_core::parse::Document;
///
/// let html = "<html><body><p>Hello</p></body></html>";
/// let doc = Document::parse(html).unwrap();
/// assert_eq!(doc.select("p").unwrap().len(), 1);
/// ```
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses HTML from a string.
    ///
    /// # Arguments
    ///
    /// * `html` - The HTML content to parse
    ///
    /// # Example
    ///
    /// ```rust
    /// use nuntius_core::parse::Document;
    ///
    /// let doc = Document::parse("<html><body><h1>Title</h1></body></html>").unwrap();
    /// ```
    pub fn parse(html: &str) -> Result<Self> {
        let html = Html::parse_document(html);
        Ok(Self { html })
    }

    /// Gets the raw HTML representation.
    ///
    /// Returns a reference to the underlying `scraper::Html` instance.
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Selects elements using a CSS selector.
    ///
    /// Matches are returned in document order.
    ///
    /// # Arguments
    ///
    /// * `selector` - A CSS selector string (e.g., "article", ".post-content")
    ///
    /// # Errors
    ///
    /// Returns [`NuntiusError::SelectorError`] if the selector is invalid.
    ///
    /// # Example
    ///
    /// ```rust
    /// use nuntius_core::parse::Document;
    ///
    /// let html = r#"<p class="lede">First</p><p class="lede">Second</p>"#;
    /// let doc = Document::parse(html).unwrap();
    /// assert_eq!(doc.select("p.lede").unwrap().len(), 2);
    /// ```
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = Selector::parse(selector).map_err(|e| NuntiusError::SelectorError(format!("{selector}: {e}")))?;

        Ok(self.html.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// Detaches every element matching a CSS selector from the tree.
    ///
    /// The matched elements and their subtrees no longer appear in later
    /// selections or text extraction. Matching nothing is a no-op.
    ///
    /// Returns the number of elements detached.
    ///
    /// # Errors
    ///
    /// Returns [`NuntiusError::SelectorError`] if the selector is invalid.
    ///
    /// # Example
    ///
    /// ```rust
    /// use nuntius_core::parse::Document;
    ///
    /// let html = "<body><script>var x;</script><p>Kept</p></body>";
    /// let mut doc = Document::parse(html).unwrap();
    /// assert_eq!(doc.remove_all("script").unwrap(), 1);
    /// assert!(doc.select("script").unwrap().is_empty());
    /// ```
    pub fn remove_all(&mut self, selector: &str) -> Result<usize> {
        let sel = Selector::parse(selector).map_err(|e| NuntiusError::SelectorError(format!("{selector}: {e}")))?;

        // Two passes: ids first, then detach, since selection borrows the tree.
        let ids: Vec<_> = self.html.select(&sel).map(|el| el.id()).collect();
        for id in &ids {
            if let Some(mut node) = self.html.tree.get_mut(*id) {
                node.detach();
            }
        }

        Ok(ids.len())
    }

    /// Gets the visible text of the document's `body` element.
    ///
    /// Returns `None` when the tree has no body element.
    pub fn body_text(&self) -> Option<String> {
        let sel = Selector::parse("body").ok()?;
        self.html.select(&sel).next().map(|el| Element { element: el }.text())
    }

    /// Gets all text content from the document root.
    ///
    /// Unlike [`Element::text`], this is the raw concatenation of text nodes
    /// with no trimming or joining applied.
    pub fn text_content(&self) -> String {
        self.html.root_element().text().collect()
    }
}

/// A wrapper around scraper's ElementRef.
///
/// Element represents a single node in the document tree and provides
/// access to its attributes and visible text.
///
/// # Example
///
/// ```rust
/// use nuntius_core::parse::Document;
///
/// let html = r#"<a href="https://example.com">Link text</a>"#;
/// let doc = Document::parse(html).unwrap();
/// let link = &doc.select("a").unwrap()[0];
///
/// assert_eq!(link.text(), "Link text");
/// assert_eq!(link.attr("href"), Some("https://example.com"));
/// ```
#[derive(Clone, Debug)]
pub struct Element<'a> {
    element: scraper::ElementRef<'a>,
}

impl<'a> Element<'a> {
    /// Gets the visible text of this element.
    ///
    /// Every descendant text fragment is trimmed, whitespace-only fragments
    /// are dropped, and the survivors are joined with single spaces. This is
    /// the text measure used throughout content extraction.
    pub fn text(&self) -> String {
        self.element
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Gets the value of an attribute.
    ///
    /// # Arguments
    ///
    /// * `name` - The attribute name (e.g., "href", "class", "id")
    ///
    /// Returns `None` if the attribute is not present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.element.value().attr(name)
    }

    /// Gets the tag name of this element.
    ///
    /// Returns the lowercase tag name (e.g., "div", "article", "p").
    pub fn tag_name(&self) -> String {
        self.element.value().name().to_lowercase()
    }
}
