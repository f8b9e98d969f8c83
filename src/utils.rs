//! Small text and URL helpers shared across the engine.

use crate::constants::REGEXPS;

/// Check whether a string parses as an absolute URL.
pub fn is_url(value: &str) -> bool {
    match url::Url::parse(value) {
        Ok(parsed) => !parsed.scheme().is_empty() && parsed.has_host(),
        Err(_) => false,
    }
}

/// Collapse whitespace runs to single spaces and trim the ends.
pub fn trim_and_normalize(text: &str) -> String {
    REGEXPS
        .normalize_spaces
        .replace_all(text.trim(), " ")
        .into_owned()
}

/// First token of a space- or comma-separated multi-valued string.
///
/// Meta properties like `article:tag` may carry several values where a
/// scalar is required; the first one wins.
pub fn first_token(value: &str) -> &str {
    value
        .split([',', ' '])
        .map(str::trim)
        .find(|token| !token.is_empty())
        .unwrap_or("")
}

/// Unescape the named and numeric HTML entities that survive attribute
/// harvesting.
pub fn unescape_html_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        let Some(end) = rest.find(';') else {
            break;
        };
        let entity = &rest[1..end];

        let replacement = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some('\u{a0}'),
            _ => entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                .and_then(char::from_u32),
        };

        match replacement {
            Some(ch) => {
                out.push(ch);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Whether free text reads like a byline rather than article prose.
pub fn looks_like_byline(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && trimmed.len() < 100 && REGEXPS.byline.is_match(trimmed)
}
