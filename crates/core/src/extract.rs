use tracing::{debug, warn};

use crate::parse::Document;

/// Default maximum length of extracted content, in characters
pub const DEFAULT_MAX_LENGTH: usize = 10_000;

/// Selector acceptance threshold: a candidate wins only above this length
const MIN_CANDIDATE_LEN: usize = 100;

/// Paragraphs at or below this length are skipped by the paragraph fallback
const MIN_PARAGRAPH_LEN: usize = 20;

/// Final acceptance gate: shorter cleaned output is reported as absent
const MIN_CONTENT_LEN: usize = 50;

/// Elements that never hold article body text, detached before selection
const NOISE_SELECTORS: &[&str] = &[
    "script",
    "style",
    "nav",
    "header",
    "footer",
    "aside",
    r#"[class*="advertisement"]"#,
    r#"[class*="ads"]"#,
    r#"[class*="social-share"]"#,
];

/// Candidate selectors, most specific first. The first selector whose best
/// match passes the acceptance threshold wins; later selectors are never
/// consulted even if they would match more text.
const CONTENT_SELECTORS: &[&str] = &[
    // Specific article containers
    "article",
    r#"[role="main"] article"#,
    ".article-body",
    ".article-content",
    ".post-content",
    ".entry-content",
    ".content-body",
    ".story-body",
    ".article-text",
    // General content containers
    "main",
    r#"[role="main"]"#,
    ".main-content",
    "#main-content",
    ".content",
    ".post",
    ".entry",
    // Last-resort containers
    "#content",
    ".container .content",
    ".wrapper .content",
];

/// Boilerplate phrases deleted from extracted text, in this order
const NOISE_PHRASES: &[&str] = &[
    "Subscribe to our newsletter",
    "Follow us on",
    "Share this article",
    "Related articles",
    "You may also like",
    "Advertisement",
    "Cookie policy",
];

/// Detach structural noise from the document
fn strip_noise(doc: &mut Document) {
    for selector in NOISE_SELECTORS {
        // Every selector in the list compiles; a miss detaches nothing.
        doc.remove_all(selector).ok();
    }
}

/// Scan the ordered selector list for the first acceptable candidate.
///
/// For each selector, every match is considered and the one with the longest
/// visible text is kept (first in document order on equal length). The scan
/// stops at the first selector whose best text exceeds [`MIN_CANDIDATE_LEN`]
/// characters. A selector that fails to evaluate counts as a miss.
fn select_candidate(doc: &Document) -> Option<String> {
    for selector in CONTENT_SELECTORS {
        let elements = match doc.select(selector) {
            Ok(elements) => elements,
            Err(e) => {
                debug!("selector {selector} failed: {e}");
                continue;
            }
        };

        if elements.is_empty() {
            continue;
        }

        let mut best: Option<String> = None;
        let mut best_len = 0usize;
        for element in &elements {
            let text = element.text();
            let len = text.chars().count();
            if best.is_none() || len > best_len {
                best_len = len;
                best = Some(text);
            }
        }

        if let Some(text) = best
            && best_len > MIN_CANDIDATE_LEN
        {
            debug!("selector {selector} accepted with {best_len} chars");
            return Some(text);
        }
    }

    None
}

/// Join the visible text of every substantial paragraph, in document order.
///
/// Qualifies as the working text only when the join is non-empty and at
/// least [`MIN_CANDIDATE_LEN`] characters long.
fn paragraph_text(doc: &Document) -> Option<String> {
    let paragraphs = doc.select("p").ok()?;

    let joined = paragraphs
        .iter()
        .map(|p| p.text())
        .filter(|text| text.chars().count() > MIN_PARAGRAPH_LEN)
        .collect::<Vec<_>>()
        .join(" ");

    if !joined.is_empty() && joined.chars().count() >= MIN_CANDIDATE_LEN {
        Some(joined)
    } else {
        None
    }
}

/// Normalize whitespace, delete boilerplate phrases, and bound the length.
///
/// Phrase removal runs after whitespace normalization and is not followed by
/// another normalization pass, so a deleted phrase may leave a doubled space
/// behind. Truncation counts characters and appends a literal `...`.
fn cleanup(text: &str, max_length: usize) -> String {
    let mut content = text.split_whitespace().collect::<Vec<_>>().join(" ");

    for phrase in NOISE_PHRASES {
        content = content.replace(phrase, "");
    }

    if content.chars().count() > max_length {
        let mut truncated: String = content.chars().take(max_length).collect();
        truncated.push_str("...");
        content = truncated;
    }

    content
}

/// Extract the main readable content from a parsed page.
///
/// The extraction runs three stages over the document:
/// 1. Noise removal: script, style, nav, header, footer, aside, and
///    advertisement/social-share marked elements are detached.
/// 2. Candidate selection: an ordered selector list is scanned for the first
///    selector whose longest match exceeds 100 characters of visible text.
/// 3. Fallbacks and cleanup: paragraph aggregation when selection came up
///    short, then the whole body text as the terminal fallback; the survivor
///    is whitespace-normalized, stripped of boilerplate phrases, and cut to
///    `max_length` characters.
///
/// Returns `None` when no stage produced text that still measures at least
/// 50 characters after cleanup. Selector failures are absorbed as misses;
/// this function never panics on any input.
///
/// # Example
///
/// ```rust
/// use nuntius_core::{extract_main_content, parse::Document};
///
/// let html = format!("<html><body><article>{}</article></body></html>", "word ".repeat(40));
/// let mut doc = Document::parse(&html).unwrap();
/// let content = extract_main_content(&mut doc, 10_000).unwrap();
/// assert!(content.starts_with("word word"));
/// ```
pub fn extract_main_content(doc: &mut Document, max_length: usize) -> Option<String> {
    strip_noise(doc);

    let mut content = select_candidate(doc);

    if content.as_ref().is_none_or(|text| text.chars().count() < MIN_CANDIDATE_LEN)
        && let Some(joined) = paragraph_text(doc)
    {
        content = Some(joined);
    }

    if content.as_ref().is_none_or(|text| text.chars().count() < MIN_CONTENT_LEN)
        && let Some(body) = doc.body_text()
    {
        content = Some(body);
    }

    let cleaned = cleanup(&content?, max_length);
    let cleaned_len = cleaned.chars().count();
    if cleaned_len < MIN_CONTENT_LEN {
        warn!("extracted content too short: {cleaned_len} chars");
        return None;
    }

    Some(cleaned)
}
