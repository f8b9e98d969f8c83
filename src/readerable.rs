//! Quick readability check without running the full pipeline.
//!
//! [`is_probably_readerable`] looks for basic content signals only, making
//! it cheap enough to run over large URL batches before committing to a
//! full extraction.

use crate::dom_utils;
use scraper::{Html, Selector};

/// Thresholds for the pre-flight check.
#[derive(Debug, Clone)]
pub struct ReaderableOptions {
    /// Paragraphs shorter than this are ignored.
    ///
    /// Default: `140`
    pub min_content_length: usize,

    /// Score a document must accumulate to count as readerable.
    ///
    /// Default: `20.0`
    pub min_score: f64,
}

impl Default for ReaderableOptions {
    fn default() -> Self {
        Self {
            min_content_length: 140,
            min_score: 20.0,
        }
    }
}

/// Fast check for whether a document is likely to yield an article.
///
/// Sums a square-root score over visible `<p>`, `<pre>` and `<article>`
/// elements with enough text, returning `true` as soon as the threshold is
/// passed.
///
/// ```rust
/// use unclutter::is_probably_readerable;
///
/// let html = r#"<html><body><article>
///     <p>This is a substantial paragraph with enough content to indicate that
///     this page likely contains article text which can be extracted. More words
///     follow to comfortably clear the minimum length, and then a few more still,
///     because the scoring is based on how far past the floor each paragraph goes.</p>
///     <p>A second paragraph with a similar amount of prose pushes the score over
///     the readerability threshold for the default options, since both paragraphs
///     contribute the square root of their excess length to the running total.</p>
/// </article></body></html>"#;
/// assert!(is_probably_readerable(html, None));
///
/// assert!(!is_probably_readerable("<html><body><p>Short</p></body></html>", None));
/// ```
pub fn is_probably_readerable(html: &str, options: Option<ReaderableOptions>) -> bool {
    let options = options.unwrap_or_default();
    let document = Html::parse_document(html);

    let selector = Selector::parse("p, pre, article").unwrap();
    let mut score = 0.0;

    for node in document.select(&selector) {
        if !dom_utils::is_probably_visible(&node) {
            continue;
        }

        let text = node.text().collect::<String>();
        let text_len = text.trim().len();
        if text_len < options.min_content_length {
            continue;
        }

        score += ((text_len - options.min_content_length) as f64).sqrt();
        if score > options.min_score {
            return true;
        }
    }

    false
}
