//! Error types for the extraction engine.

use thiserror::Error;

/// Result type alias for extraction operations
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Errors that can occur during article extraction
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Document has no body or no element content at all
    #[error("Document is empty or has no body content")]
    EmptyDocument,

    /// Every node scored zero across all extraction attempts
    #[error("No candidate content found in document")]
    NoCandidateFound,

    /// Invalid base URL provided
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Maximum element limit exceeded
    #[error("Maximum element limit exceeded: {0}")]
    MaxElementsExceeded(usize),

    /// Unrecoverable metadata parsing failure.
    ///
    /// Reserved: malformed metadata currently degrades to absent fields
    /// instead of surfacing this variant.
    #[error("Metadata extraction error: {0}")]
    Metadata(String),

    /// Unexpected tree-shape violation during traversal
    #[error("Parsing error: {0}")]
    Parsing(String),
}
