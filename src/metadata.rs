//! Metadata harvesting: meta tags, JSON-LD, favicons and publish dates.
//!
//! This pass runs over the raw document, independent of content scoring,
//! and always produces a [`Metadata`] value; fields that cannot be
//! determined stay `None`.

use crate::article::Metadata;
use crate::constants::REGEXPS;
use crate::options::ExtractOptions;
use crate::utils;
use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use serde_json::Value;
use std::collections::HashMap;
use url::Url;

/// Structured data pulled out of `application/ld+json` blocks.
#[derive(Debug, Clone, Default)]
struct JsonLd {
    headline: Option<String>,
    author: Option<String>,
    description: Option<String>,
    date_published: Option<String>,
    image: Option<String>,
}

/// Harvest metadata from the document.
///
/// Each field follows its own precedence chain; the chains are evaluated
/// independently and the first match wins. Harvesting never fails the run.
pub fn extract(document: &Html, base_url: Option<&Url>, options: &ExtractOptions) -> Metadata {
    let values = collect_meta_values(document);
    let json_ld = if options.disable_json_ld {
        JsonLd::default()
    } else {
        get_json_ld(document)
    };

    let title = values
        .get("og:title")
        .cloned()
        .or_else(|| values.get("twitter:title").cloned())
        .or_else(|| json_ld.headline.clone())
        .or_else(|| document_title(document))
        .or_else(|| best_heading(document));

    // Some sites put a profile URL in the author meta; that is not a name.
    let byline = values
        .get("author")
        .filter(|v| !utils::is_url(v))
        .cloned()
        .or_else(|| rel_author_text(document))
        .or_else(|| json_ld.author.clone());

    let excerpt = values
        .get("description")
        .cloned()
        .or_else(|| values.get("og:description").cloned())
        .or_else(|| json_ld.description.clone());

    let site_name = values
        .get("og:site_name")
        .cloned()
        .or_else(|| base_url.and_then(|u| u.host_str().map(str::to_string)));

    let image = values
        .get("og:image")
        .cloned()
        .or_else(|| values.get("twitter:image").cloned())
        .or_else(|| json_ld.image.clone())
        .map(|src| resolve(base_url, &src));

    let published_time = json_ld
        .date_published
        .as_deref()
        .and_then(parse_date)
        .or_else(|| {
            values
                .get("article:published_time")
                .and_then(|v| parse_date(v))
        })
        .or_else(|| first_time_datetime(document).as_deref().and_then(parse_date));

    Metadata {
        title: title.map(|t| utils::trim_and_normalize(&utils::unescape_html_entities(&t))),
        byline: byline
            .map(|b| utils::trim_and_normalize(&utils::unescape_html_entities(&b)))
            .filter(|b| !b.is_empty()),
        excerpt: excerpt
            .map(|e| utils::unescape_html_entities(&e).trim().to_string())
            .filter(|e| !e.is_empty()),
        site_name: site_name
            .map(|s| utils::unescape_html_entities(&s))
            .filter(|s| !s.is_empty()),
        image,
        favicon: favicon(document, base_url),
        language: language(document),
        published_time,
    }
}

/// Gather recognized `<meta>` values keyed by normalized property/name.
///
/// The first occurrence of a key wins; later duplicates are ignored.
fn collect_meta_values(document: &Html) -> HashMap<String, String> {
    let property_pattern = regex::Regex::new(
        r"(?i)\s*(article|dc|dcterm|og|twitter)\s*:\s*(author|creator|description|published_time|title|site_name|image\S*)\s*",
    )
    .unwrap();
    let name_pattern = regex::Regex::new(
        r"(?i)^\s*(?:(?:article|dc|dcterm|og|twitter)\s*[-\.:]\s*)?(author|creator|description|title|site_name|image)\s*$",
    )
    .unwrap();

    let meta_selector = Selector::parse("meta").unwrap();
    let mut values: HashMap<String, String> = HashMap::new();

    for meta in document.select(&meta_selector) {
        let Some(content) = meta.value().attr("content").filter(|c| !c.trim().is_empty()) else {
            continue;
        };

        let mut matched = false;
        if let Some(property) = meta.value().attr("property") {
            // Properties may carry several space-separated names.
            for prop in property.split_whitespace() {
                if property_pattern.is_match(prop) {
                    let key = prop.to_lowercase().replace(char::is_whitespace, "");
                    values
                        .entry(key)
                        .or_insert_with(|| content.trim().to_string());
                    matched = true;
                }
            }
        }

        if !matched {
            if let Some(name) = meta.value().attr("name") {
                if name_pattern.is_match(name) {
                    let key = name
                        .to_lowercase()
                        .replace(char::is_whitespace, "")
                        .replace('.', ":");
                    values
                        .entry(key)
                        .or_insert_with(|| content.trim().to_string());
                }
            }
        }
    }

    values
}

/// Parse JSON-LD blocks for Schema.org article data.
fn get_json_ld(document: &Html) -> JsonLd {
    let mut out = JsonLd::default();
    let script_selector = Selector::parse(r#"script[type="application/ld+json"]"#).unwrap();

    for script in document.select(&script_selector) {
        let content = script.text().collect::<String>();
        let content = content
            .trim()
            .trim_start_matches("<![CDATA[")
            .trim_end_matches("]]>")
            .trim();

        let Ok(parsed) = serde_json::from_str::<Value>(content) else {
            continue;
        };
        let Some(article) = find_article_object(&parsed) else {
            continue;
        };

        if out.headline.is_none() {
            out.headline = article
                .get("headline")
                .or_else(|| article.get("name"))
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string());
        }

        if out.author.is_none() {
            out.author = article.get("author").and_then(author_names);
        }

        if out.description.is_none() {
            out.description = article
                .get("description")
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string());
        }

        if out.date_published.is_none() {
            out.date_published = article
                .get("datePublished")
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string());
        }

        if out.image.is_none() {
            out.image = json_ld_image(article);
        }
    }

    out
}

/// Locate the article-typed object in a JSON-LD value, descending into
/// top-level arrays and `@graph`.
fn find_article_object(parsed: &Value) -> Option<&Value> {
    if let Some(arr) = parsed.as_array() {
        return arr.iter().find_map(find_article_object);
    }

    if is_article_type(parsed) {
        return Some(parsed);
    }

    if let Some(graph) = parsed.get("@graph").and_then(Value::as_array) {
        if has_schema_context(parsed) {
            return graph.iter().find(|item| is_article_type(item));
        }
    }

    None
}

fn is_article_type(value: &Value) -> bool {
    value
        .get("@type")
        .and_then(Value::as_str)
        .is_some_and(|t| REGEXPS.json_ld_article_types.is_match(t))
}

fn has_schema_context(value: &Value) -> bool {
    match value.get("@context") {
        Some(Value::String(ctx)) => REGEXPS.schema_org.is_match(ctx),
        Some(Value::Object(ctx)) => ctx
            .get("@vocab")
            .and_then(Value::as_str)
            .is_some_and(|v| REGEXPS.schema_org.is_match(v)),
        // Many generators omit the context on nested graph objects.
        None => true,
        _ => false,
    }
}

fn author_names(author: &Value) -> Option<String> {
    match author {
        Value::String(name) => Some(name.trim().to_string()),
        Value::Object(_) => author
            .get("name")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string()),
        Value::Array(authors) => {
            let names: Vec<String> = authors
                .iter()
                .filter_map(|a| match a {
                    Value::String(name) => Some(name.trim().to_string()),
                    _ => a
                        .get("name")
                        .and_then(Value::as_str)
                        .map(|s| s.trim().to_string()),
                })
                .collect();
            if names.is_empty() {
                None
            } else {
                Some(names.join(", "))
            }
        }
        _ => None,
    }
}

fn json_ld_image(article: &Value) -> Option<String> {
    match article.get("image")? {
        Value::String(src) => Some(src.trim().to_string()),
        Value::Object(obj) => obj
            .get("url")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string()),
        Value::Array(arr) => arr.first().and_then(|first| match first {
            Value::String(src) => Some(src.trim().to_string()),
            _ => first
                .get("url")
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string()),
        }),
        _ => None,
    }
}

/// The `<title>` element, with a trailing ` | Site Name` style tail removed
/// when enough of the title survives.
fn document_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").unwrap();
    let raw = document
        .select(&title_selector)
        .next()
        .map(|el| utils::trim_and_normalize(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty())?;

    if let Some(m) = REGEXPS.title_separator.find_iter(&raw).last() {
        let head = raw[..m.start()].trim();
        if head.split_whitespace().count() >= 3 {
            return Some(head.to_string());
        }
        let tail = raw[m.end()..].trim();
        if tail.split_whitespace().count() >= 3 {
            return Some(tail.to_string());
        }
    }

    Some(raw)
}

/// Longest `<h1>` text, as a last-resort title.
fn best_heading(document: &Html) -> Option<String> {
    let h1_selector = Selector::parse("h1").unwrap();
    document
        .select(&h1_selector)
        .map(|el| utils::trim_and_normalize(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty())
        .max_by_key(String::len)
}

fn rel_author_text(document: &Html) -> Option<String> {
    let author_selector = Selector::parse(r#"a[rel~="author"]"#).unwrap();
    document
        .select(&author_selector)
        .map(|el| utils::trim_and_normalize(&el.text().collect::<String>()))
        .find(|t| !t.is_empty())
}

/// Favicon URL, preferring the largest advertised `NxN` size.
fn favicon(document: &Html, base_url: Option<&Url>) -> Option<String> {
    let link_selector = Selector::parse("link").unwrap();
    let mut best: Option<(u64, String)> = None;

    for link in document.select(&link_selector) {
        let rel = link.value().attr("rel").unwrap_or_default();
        if !rel.to_lowercase().contains("icon") {
            continue;
        }
        let Some(href) = link.value().attr("href").filter(|h| !h.trim().is_empty()) else {
            continue;
        };

        let size = link
            .value()
            .attr("sizes")
            .and_then(|sizes| REGEXPS.favicon_size.captures(sizes))
            .and_then(|caps| {
                let w: u64 = caps[1].parse().ok()?;
                let h: u64 = caps[2].parse().ok()?;
                Some(w * h)
            })
            .unwrap_or(0);

        if best.as_ref().is_none_or(|(best_size, _)| size > *best_size) {
            best = Some((size, href.trim().to_string()));
        }
    }

    best.map(|(_, href)| resolve(base_url, &href))
}

fn language(document: &Html) -> Option<String> {
    document
        .root_element()
        .value()
        .attr("lang")
        .map(|lang| lang.trim().to_string())
        .filter(|lang| !lang.is_empty())
        .or_else(|| {
            let meta_selector = Selector::parse(r#"meta[http-equiv]"#).unwrap();
            document
                .select(&meta_selector)
                .find(|el| {
                    el.value()
                        .attr("http-equiv")
                        .is_some_and(|v| v.eq_ignore_ascii_case("content-language"))
                })
                .and_then(|el| el.value().attr("content"))
                .map(|v| utils::first_token(v).to_string())
                .filter(|v| !v.is_empty())
        })
}

fn first_time_datetime(document: &Html) -> Option<String> {
    let time_selector = Selector::parse("time[datetime]").unwrap();
    document
        .select(&time_selector)
        .next()
        .and_then(|el| el.value().attr("datetime"))
        .map(|v| v.trim().to_string())
}

/// Permissive date parsing: ISO-8601 and the common human-readable forms.
///
/// Unparseable values yield `None`, never an error. Multi-valued content
/// falls back to its first token.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    parse_date_single(raw).or_else(|| {
        let token = utils::first_token(raw);
        if token != raw {
            parse_date_single(token)
        } else {
            None
        }
    })
}

fn parse_date_single(date_str: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(date_str) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(date_str, fmt) {
            return Some(dt.and_utc());
        }
    }

    let date_formats = [
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%d/%m/%Y",
        "%m/%d/%Y",
        "%B %d, %Y",
        "%b %d, %Y",
        "%d %B %Y",
    ];
    for fmt in date_formats {
        if let Ok(date) = chrono::NaiveDate::parse_from_str(date_str, fmt) {
            return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }

    None
}

fn resolve(base_url: Option<&Url>, value: &str) -> String {
    let value = value.trim();
    if value.starts_with('#') || value.starts_with("data:") || Url::parse(value).is_ok() {
        return value.to_string();
    }
    match base_url {
        Some(base) => base
            .join(value)
            .map_or_else(|_| value.to_string(), |u| u.to_string()),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta_for(html: &str) -> Metadata {
        let document = Html::parse_document(html);
        extract(&document, None, &ExtractOptions::default())
    }

    #[test]
    fn og_title_beats_title_element() {
        let metadata = meta_for(
            r#"<html><head>
            <meta property="og:title" content="OG Title">
            <title>Tag Title</title>
            </head><body></body></html>"#,
        );
        assert_eq!(metadata.title.as_deref(), Some("OG Title"));
    }

    #[test]
    fn title_element_is_the_fallback() {
        let metadata = meta_for("<html><head><title>Only Title</title></head><body></body></html>");
        assert_eq!(metadata.title.as_deref(), Some("Only Title"));
    }

    #[test]
    fn title_site_suffix_is_stripped() {
        let metadata = meta_for(
            "<html><head><title>A Very Good Headline Indeed | Example News</title></head><body></body></html>",
        );
        assert_eq!(metadata.title.as_deref(), Some("A Very Good Headline Indeed"));
    }

    #[test]
    fn meta_description_wins_over_og_description() {
        let metadata = meta_for(
            r#"<html><head>
            <meta name="description" content="An excerpt.">
            <meta property="og:description" content="Other.">
            </head><body></body></html>"#,
        );
        assert_eq!(metadata.excerpt.as_deref(), Some("An excerpt."));
    }

    #[test]
    fn byline_from_meta_author() {
        let metadata = meta_for(
            r#"<html><head><meta name="author" content="Jane Doe"></head><body></body></html>"#,
        );
        assert_eq!(metadata.byline.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn byline_from_rel_author_link() {
        let metadata = meta_for(
            r#"<html><body><a rel="author" href="/about">John Smith</a></body></html>"#,
        );
        assert_eq!(metadata.byline.as_deref(), Some("John Smith"));
    }

    #[test]
    fn json_ld_headline_used_when_meta_absent() {
        let metadata = meta_for(
            r#"<html><head><script type="application/ld+json">
            {"@context":"https://schema.org","@type":"NewsArticle","headline":"Structured Title","author":{"name":"LD Author"},"datePublished":"2024-03-01T08:30:00Z"}
            </script></head><body></body></html>"#,
        );
        assert_eq!(metadata.title.as_deref(), Some("Structured Title"));
        assert_eq!(metadata.byline.as_deref(), Some("LD Author"));
        assert!(metadata.published_time.is_some());
    }

    #[test]
    fn site_name_falls_back_to_hostname() {
        let document = Html::parse_document("<html><body></body></html>");
        let base = Url::parse("https://news.example.org/story/1").unwrap();
        let metadata = extract(&document, Some(&base), &ExtractOptions::default());
        assert_eq!(metadata.site_name.as_deref(), Some("news.example.org"));
    }

    #[test]
    fn favicon_prefers_largest_size() {
        let document = Html::parse_document(
            r#"<html><head>
            <link rel="icon" href="/small.png" sizes="16x16">
            <link rel="icon" href="/big.png" sizes="192x192">
            </head><body></body></html>"#,
        );
        let base = Url::parse("https://example.com/").unwrap();
        let metadata = extract(&document, Some(&base), &ExtractOptions::default());
        assert_eq!(metadata.favicon.as_deref(), Some("https://example.com/big.png"));
    }

    #[test]
    fn published_time_from_meta() {
        let metadata = meta_for(
            r#"<html><head><meta property="article:published_time" content="2023-11-05T12:00:00+01:00"></head><body></body></html>"#,
        );
        let time = metadata.published_time.unwrap();
        assert_eq!(time.to_rfc3339(), "2023-11-05T11:00:00+00:00");
    }

    #[test]
    fn unparseable_dates_are_none() {
        let metadata = meta_for(
            r#"<html><head><meta property="article:published_time" content="sometime last week"></head><body></body></html>"#,
        );
        assert!(metadata.published_time.is_none());
    }

    #[test]
    fn permissive_date_formats() {
        assert!(parse_date("2024-01-15").is_some());
        assert!(parse_date("January 15, 2024").is_some());
        assert!(parse_date("15 January 2024").is_some());
        assert!(parse_date("2024-01-15T10:00:00").is_some());
        assert!(parse_date("garbage").is_none());
    }

    #[test]
    fn language_from_html_lang() {
        let metadata = meta_for(r#"<html lang="fr"><body></body></html>"#);
        assert_eq!(metadata.language.as_deref(), Some("fr"));
    }

    #[test]
    fn multi_valued_meta_uses_first_token() {
        let metadata = meta_for(
            r#"<html><head><meta property="article:published_time" content="2024-02-02, 2024-02-03"></head><body></body></html>"#,
        );
        let time = metadata.published_time.unwrap();
        assert_eq!(time.format("%Y-%m-%d").to_string(), "2024-02-02");
    }
}
