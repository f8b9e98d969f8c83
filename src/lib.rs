//! # unclutter
//!
//! Extracts the primary readable content and metadata from arbitrary, often
//! noisy, HTML documents: navigation, ads, widgets and other boilerplate are
//! stripped while the article body, its images and basic formatting are
//! preserved.
//!
//! ## Overview
//!
//! unclutter takes a fully-downloaded HTML document (retrieval is the
//! caller's job) and produces an [`Article`]: cleaned content HTML, plain
//! text, and metadata such as title, byline, excerpt, site name, lead
//! image, favicon, language and publish time.
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use unclutter::{Extractor, ExtractOptions};
//!
//! let html = r#"<html><body><article><h1>Title</h1><p>Content...</p></article></body></html>"#;
//! let url = "https://example.com/article";
//!
//! let extractor = Extractor::new(html, Some(url), None).unwrap();
//! match extractor.extract() {
//!     Ok(article) => {
//!         println!("Title: {:?}", article.title);
//!         println!("Text: {:?}", article.text_content);
//!     }
//!     Err(err) => eprintln!("extraction failed: {err}"),
//! }
//! ```
//!
//! ## Custom Options
//!
//! Every tuned threshold is overridable through the options builder:
//!
//! ```rust,no_run
//! use unclutter::{Extractor, ExtractOptions};
//!
//! let options = ExtractOptions::builder()
//!     .char_threshold(300)
//!     .keep_classes(true)
//!     .build();
//!
//! let extractor = Extractor::new("<html>...</html>", None, Some(options)).unwrap();
//! ```
//!
//! ## Pre-flight Check
//!
//! [`is_probably_readerable`] is a cheap filter for pages unlikely to
//! contain an article, useful before paying for a full extraction.
//!
//! ## Algorithm
//!
//! Extraction runs as a pipeline. The document is first normalized:
//! scripts, styles and comments are removed, lazy-loaded and
//! `<noscript>`-wrapped images are promoted, and `<br>` runs become
//! paragraph boundaries. Paragraph-like nodes are then scored from their
//! text length, link density and class/id keywords, with a decaying share
//! of each score propagated to nearby ancestors. The best-scoring
//! container is selected, assembled together with qualifying siblings, and
//! cleaned: URLs made absolute, presentational attributes dropped, and
//! low-value tables, lists and forms conditionally removed.
//!
//! When a pass yields too little text, the orchestrator retries with the
//! heuristics relaxed one at a time in a fixed order, returning the best
//! result seen across all attempts.
//!
//! Extraction is deterministic: the same input tree and options always
//! produce the same article. Each run owns its document and score state
//! exclusively, so independent runs parallelize freely.

mod article;
mod cleaner;
mod constants;
mod content_extractor;
mod dom_utils;
mod error;
mod extractor;
mod flags;
mod metadata;
mod options;
mod post_processor;
mod readerable;
mod scoring;
mod utils;

// Public exports
pub use article::{Article, Metadata};
pub use error::{ExtractError, Result};
pub use extractor::Extractor;
pub use flags::ExtractionFlags;
pub use options::{ExtractOptions, ExtractOptionsBuilder};
pub use readerable::{is_probably_readerable, ReaderableOptions};
