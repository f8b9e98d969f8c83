//! The extraction orchestrator: ties preprocessing, scoring, assembly and
//! cleanup together under a bounded retry loop.
//!
//! ## Example
//!
//! ```rust,no_run
//! use unclutter::{Extractor, ExtractOptions};
//!
//! let html = std::fs::read_to_string("article.html").unwrap();
//! let extractor = Extractor::new(&html, Some("https://example.com/article"), None)?;
//!
//! let article = extractor.extract()?;
//! println!("Title: {:?}", article.title);
//! println!("Length: {} chars", article.length);
//! # Ok::<(), unclutter::ExtractError>(())
//! ```

use crate::article::{Article, Metadata};
use crate::cleaner;
use crate::content_extractor;
use crate::dom_utils;
use crate::error::{ExtractError, Result};
use crate::flags::ExtractionFlags;
use crate::metadata;
use crate::options::ExtractOptions;
use crate::post_processor;
use crate::utils;
use scraper::{Html, Selector};
use url::Url;

/// One extraction run over one document.
///
/// The extractor owns its parsed trees exclusively; independent instances
/// can run in parallel with no shared mutable state. Each retry attempt
/// re-parses the preprocessed document, so node ids and score entries
/// never leak between attempts.
pub struct Extractor {
    /// Raw parse of the input, used for metadata only
    document: Html,

    /// Original input, re-parsed per attempt after preprocessing
    html: String,

    base_url: Option<Url>,

    options: ExtractOptions,
}

/// Result of a single attempt, kept only while it is the best seen.
struct AttemptOutcome {
    content: String,
    text: String,
    length: usize,
}

impl Extractor {
    /// Create an extractor for one HTML document.
    ///
    /// # Arguments
    /// * `html` - The HTML content to parse
    /// * `url` - Optional base URL for resolving relative links
    /// * `options` - Optional configuration overrides
    pub fn new(html: &str, url: Option<&str>, options: Option<ExtractOptions>) -> Result<Self> {
        if html.trim().is_empty() {
            return Err(ExtractError::EmptyDocument);
        }

        let base_url = url
            .map(|u| Url::parse(u).map_err(|_| ExtractError::InvalidUrl(u.to_string())))
            .transpose()?;

        let options = options.unwrap_or_default();
        let document = Html::parse_document(html);

        if options.max_elems_to_parse > 0 {
            let elements = document
                .tree
                .root()
                .descendants()
                .filter(|node| node.value().is_element())
                .count();
            if elements > options.max_elems_to_parse {
                return Err(ExtractError::MaxElementsExceeded(elements));
            }
        }

        Ok(Self {
            document,
            html: html.to_string(),
            base_url,
            options,
        })
    }

    /// Run the full extraction pipeline.
    ///
    /// Attempt 1 runs with every heuristic enabled. When the result falls
    /// short of `char_threshold`, the flags are relaxed one heuristic at a
    /// time in fixed order and the attempt repeats, bounded by
    /// `max_attempts`. The longest result seen wins; `NoCandidateFound`
    /// surfaces only when no attempt produced a candidate at all.
    pub fn extract(self) -> Result<Article> {
        // Metadata never depends on scoring state; it reads the raw tree.
        let metadata = metadata::extract(&self.document, self.base_url.as_ref(), &self.options);

        let mut preprocessed = Html::parse_document(&self.html);
        cleaner::prep_document(&mut preprocessed)?;
        let prepped_html = preprocessed.root_element().html();

        let mut best: Option<AttemptOutcome> = None;
        let mut next_flags = Some(ExtractionFlags::default());
        let mut attempt = 0;

        while let Some(flags) = next_flags {
            if attempt >= self.options.max_attempts {
                break;
            }
            attempt += 1;

            match self.run_attempt(&prepped_html, flags) {
                Ok(outcome) => {
                    self.log(&format!(
                        "attempt {attempt} ({flags:?}) extracted {} chars",
                        outcome.length
                    ));

                    let improved = best
                        .as_ref()
                        .is_none_or(|prev| outcome.length > prev.length);
                    if improved {
                        best = Some(outcome);
                    }

                    if best
                        .as_ref()
                        .is_some_and(|b| b.length >= self.options.char_threshold)
                    {
                        break;
                    }
                }
                Err(err) => {
                    // A failed attempt is discarded whole; the next relaxed
                    // attempt starts from the preprocessed document again.
                    self.log(&format!("attempt {attempt} ({flags:?}) failed: {err}"));
                }
            }

            next_flags = flags.relaxed();
        }

        let Some(outcome) = best else {
            return Err(ExtractError::NoCandidateFound);
        };

        Ok(self.build_article(metadata, outcome))
    }

    /// One scoring/assembly/cleanup pass under a fixed flag set.
    fn run_attempt(&self, prepped_html: &str, flags: ExtractionFlags) -> Result<AttemptOutcome> {
        // Fresh tree, fresh score tracker: nothing survives from earlier
        // attempts.
        let mut document = Html::parse_document(prepped_html);
        let content = content_extractor::grab_article(&mut document, flags, &self.options)?;

        let mut fragment = Html::parse_fragment(&content);
        post_processor::clean_article(&mut fragment, self.base_url.as_ref(), flags, &self.options);

        let cleaned = fragment.root_element().inner_html();
        let text = dom_utils::inner_text(*fragment.root_element());
        let length = text.chars().count();

        Ok(AttemptOutcome {
            content: cleaned,
            text,
            length,
        })
    }

    fn build_article(&self, metadata: Metadata, outcome: AttemptOutcome) -> Article {
        let excerpt = metadata
            .excerpt
            .clone()
            .or_else(|| first_paragraph_excerpt(&outcome.content));

        Article {
            title: metadata.title,
            content: Some(outcome.content),
            text_content: Some(outcome.text),
            length: outcome.length,
            excerpt,
            byline: metadata.byline,
            site_name: metadata.site_name,
            image: metadata.image,
            favicon: metadata.favicon,
            lang: metadata.language,
            published_time: metadata.published_time,
        }
    }

    fn log(&self, message: &str) {
        if self.options.debug {
            eprintln!("unclutter: {message}");
        }
    }
}

/// First substantial paragraph of the extracted content, for documents
/// that carried no description metadata.
fn first_paragraph_excerpt(content: &str) -> Option<String> {
    let fragment = Html::parse_fragment(content);
    let p_selector = Selector::parse("p").unwrap();

    for paragraph in fragment.select(&p_selector) {
        let text = utils::trim_and_normalize(&paragraph.text().collect::<String>());
        if text.chars().count() < 25 {
            continue;
        }
        if utils::looks_like_byline(&text) {
            continue;
        }
        return Some(truncate_at_word(&text, 300));
    }

    None
}

fn truncate_at_word(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let truncated: String = text.chars().take(max_chars).collect();
    match truncated.rfind(char::is_whitespace) {
        Some(pos) => truncated[..pos].trim_end().to_string(),
        None => truncated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_input_is_empty_document() {
        assert!(matches!(
            Extractor::new("   ", None, None),
            Err(ExtractError::EmptyDocument)
        ));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let html = "<html><body><p>Test</p></body></html>";
        assert!(matches!(
            Extractor::new(html, Some("not a url"), None),
            Err(ExtractError::InvalidUrl(_))
        ));
    }

    #[test]
    fn element_limit_is_enforced() {
        let html = "<html><body><p>a</p><p>b</p><p>c</p></body></html>";
        let options = ExtractOptions::builder().max_elems_to_parse(2).build();
        assert!(matches!(
            Extractor::new(html, None, Some(options)),
            Err(ExtractError::MaxElementsExceeded(_))
        ));
    }

    #[test]
    fn truncation_breaks_at_word_boundary() {
        let text = "alpha beta gamma delta";
        let truncated = truncate_at_word(text, 12);
        assert_eq!(truncated, "alpha beta");
    }
}
