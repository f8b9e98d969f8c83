//! The extracted article and its metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata harvested from the document, independent of content scoring.
///
/// Built once per extraction run; unset fields stay `None`. Metadata
/// harvesting never fails the overall run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub title: Option<String>,
    pub byline: Option<String>,
    pub excerpt: Option<String>,
    pub site_name: Option<String>,
    pub image: Option<String>,
    pub favicon: Option<String>,
    pub language: Option<String>,
    pub published_time: Option<DateTime<Utc>>,
}

/// A successfully extracted article.
///
/// `content` holds the cleaned HTML of the article subtree, `text_content`
/// the same content as plain text. All metadata fields are optional since
/// few pages carry every one of them.
///
/// Serializes with serde:
///
/// ```rust,no_run
/// use unclutter::Extractor;
///
/// let html = "<html><body><article><p>...</p></article></body></html>";
/// let article = Extractor::new(html, None, None).unwrap().extract().unwrap();
/// let json = serde_json::to_string_pretty(&article).unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Article {
    /// Article title from metadata, the `<title>` tag or the best heading.
    pub title: Option<String>,

    /// Cleaned HTML of the article content.
    pub content: Option<String>,

    /// Plain text of the article content.
    pub text_content: Option<String>,

    /// Character count of `text_content`.
    pub length: usize,

    /// Short description, from metadata or the first substantial paragraph.
    pub excerpt: Option<String>,

    /// Author name(s), comma-separated when several were found.
    pub byline: Option<String>,

    /// Publication or site name.
    pub site_name: Option<String>,

    /// Lead image URL.
    pub image: Option<String>,

    /// Site favicon URL.
    pub favicon: Option<String>,

    /// Language code from the document root or `content-language`.
    pub lang: Option<String>,

    /// Publication timestamp, when one parsed.
    pub published_time: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn article_serde_round_trip() {
        let article = Article {
            title: Some("Title".to_string()),
            content: Some("<p>Body</p>".to_string()),
            text_content: Some("Body".to_string()),
            length: 4,
            ..Article::default()
        };

        let json = serde_json::to_string(&article).unwrap();
        let back: Article = serde_json::from_str(&json).unwrap();
        assert_eq!(article, back);
    }
}
