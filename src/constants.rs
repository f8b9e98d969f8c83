//! Process-wide heuristic constants: keyword regexes, tag tables and the
//! tuned scoring numbers.
//!
//! The keyword lists are immutable configuration data; nothing in the engine
//! ever mutates them. The scoring constants here are only the fixed per-tag
//! numbers; every threshold a caller may want to tune lives on
//! [`ExtractOptions`](crate::ExtractOptions) instead.

use once_cell::sync::Lazy;
use regex::Regex;

/// Compiled regex set used throughout the engine.
pub struct Regexps {
    pub unlikely_candidates: Regex,
    pub maybe_candidate: Regex,
    pub positive: Regex,
    pub negative: Regex,
    pub byline: Regex,
    pub videos: Regex,
    pub share_elements: Regex,
    pub display_none: Regex,
    pub visibility_hidden: Regex,
    pub hash_url: Regex,
    pub favicon_size: Regex,
    pub lazy_image_src: Regex,
    pub lazy_image_srcset: Regex,
    pub json_ld_article_types: Regex,
    pub schema_org: Regex,
    pub title_separator: Regex,
    pub normalize_spaces: Regex,
    pub sentence_period: Regex,
}

pub static REGEXPS: Lazy<Regexps> = Lazy::new(|| Regexps {
    unlikely_candidates: Regex::new(
        r"(?i)-ad-|ai2html|banner|breadcrumbs|combx|comment|community|cover-wrap|disqus|extra|footer|gdpr|header|legends|menu|related|remark|replies|rss|shoutbox|sidebar|skyscraper|social|sponsor|supplemental|ad-break|agegate|pagination|pager|popup|yom-remote",
    )
    .unwrap(),
    maybe_candidate: Regex::new(r"(?i)and|article|body|column|content|main|shadow").unwrap(),
    positive: Regex::new(
        r"(?i)article|body|content|entry|hentry|h-entry|main|page|pagination|post|text|blog|story",
    )
    .unwrap(),
    negative: Regex::new(
        r"(?i)-ad-|hidden|^hid$| hid$| hid |^hid |banner|combx|comment|com-|contact|foot|footer|footnote|gdpr|masthead|media|meta|outbrain|promo|related|scroll|share|shoutbox|sidebar|skyscraper|sponsor|shopping|tags|tool|widget",
    )
    .unwrap(),
    byline: Regex::new(r"(?i)byline|author|dateline|writtenby|p-author").unwrap(),
    videos: Regex::new(
        r"(?i)//(www\.)?((dailymotion|youtube|youtube-nocookie|player\.vimeo|v\.qq)\.com|(archive|upload\.wikimedia)\.org|player\.twitch\.tv)",
    )
    .unwrap(),
    share_elements: Regex::new(r"(?i)(\b|_)(share|sharedaddy)(\b|_)").unwrap(),
    display_none: Regex::new(r"(?i)display\s*:\s*none").unwrap(),
    visibility_hidden: Regex::new(r"(?i)visibility\s*:\s*hidden").unwrap(),
    hash_url: Regex::new(r"^#.+").unwrap(),
    favicon_size: Regex::new(r"(\d+)x(\d+)").unwrap(),
    lazy_image_src: Regex::new(r"(?i)^\s*\S+\.(jpg|jpeg|png|webp)\S*\s*$").unwrap(),
    lazy_image_srcset: Regex::new(r"(?i)\.(jpg|jpeg|png|webp)\s+\d").unwrap(),
    json_ld_article_types: Regex::new(
        r"^Article|AdvertiserContentArticle|NewsArticle|AnalysisNewsArticle|AskPublicNewsArticle|BackgroundNewsArticle|OpinionNewsArticle|ReportageNewsArticle|ReviewNewsArticle|Report|SatiricalArticle|ScholarlyArticle|MedicalScholarlyArticle|SocialMediaPosting|BlogPosting|LiveBlogPosting|DiscussionForumPosting|TechArticle|APIReference$",
    )
    .unwrap(),
    schema_org: Regex::new(r"^https?://schema\.org/?$").unwrap(),
    title_separator: Regex::new(r" [\|\-\\/>»] ").unwrap(),
    normalize_spaces: Regex::new(r"\s{2,}").unwrap(),
    sentence_period: Regex::new(r"\.( |$)").unwrap(),
});

/// Tags whose text seeds a content score.
pub const TAGS_TO_SCORE: &[&str] = &["p", "pre", "td", "blockquote", "div", "section"];

/// Attributes carrying presentational hints, stripped during cleanup.
pub const PRESENTATIONAL_ATTRIBUTES: &[&str] = &[
    "align",
    "background",
    "bgcolor",
    "border",
    "cellpadding",
    "cellspacing",
    "frame",
    "hspace",
    "rules",
    "style",
    "valign",
    "vspace",
];

/// Phrasing content tags; a run of `<br>`s followed by these gets folded
/// into a fresh paragraph.
pub const PHRASING_ELEMS: &[&str] = &[
    "abbr", "audio", "b", "bdo", "br", "button", "cite", "code", "data", "datalist", "dfn", "em",
    "embed", "i", "img", "input", "kbd", "label", "mark", "math", "meter", "noscript", "object",
    "output", "progress", "q", "ruby", "samp", "select", "small", "span", "strong", "sub", "sup",
    "textarea", "time", "var", "wbr",
];

/// ARIA roles that disqualify an element from being article content.
pub const UNLIKELY_ROLES: &[&str] = &[
    "menu",
    "menubar",
    "complementary",
    "navigation",
    "alert",
    "alertdialog",
    "dialog",
];

/// Coarse tag categories decided once and reused by every later phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagCategory {
    /// Paragraph-like text containers: `p`, `pre`, `td`, `blockquote`
    BlockText,
    /// Generic containers that may wrap article content
    Container,
    /// Phrasing/inline content
    Inline,
    /// Images, video embeds and other media
    Media,
    /// Headings, lists, forms and other structural markup
    Structural,
    /// Everything else
    Other,
}

impl TagCategory {
    pub fn of(tag: &str) -> Self {
        match tag {
            "p" | "pre" | "td" | "blockquote" => Self::BlockText,
            "div" | "section" | "article" | "main" | "body" => Self::Container,
            "img" | "picture" | "figure" | "video" | "audio" | "iframe" | "embed" | "object" => {
                Self::Media
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "th" | "ul" | "ol" | "li" | "dl" | "dd"
            | "dt" | "form" | "fieldset" | "address" | "table" => Self::Structural,
            tag if PHRASING_ELEMS.contains(&tag) => Self::Inline,
            _ => Self::Other,
        }
    }

    /// Fixed starting score a tag contributes before any text is counted.
    pub fn initial_score(tag: &str) -> f64 {
        match tag {
            "p" | "pre" => 5.0,
            "td" | "blockquote" => 3.0,
            "div" | "section" | "article" | "main" => 2.0,
            "address" | "ol" | "ul" | "dl" | "dd" | "dt" | "li" | "form" => -3.0,
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "th" => -5.0,
            _ => 0.0,
        }
    }
}

/// Class/id keyword weight applied at most once per attribute.
pub const CLASS_WEIGHT: f64 = 25.0;

/// Minimum trimmed text length before a node contributes to scoring.
pub const MIN_SCORED_TEXT_LEN: usize = 25;

/// Cap on the per-100-characters text bonus.
pub const TEXT_LENGTH_BONUS_CAP: f64 = 3.0;

/// Weight given to anchor text behind `#fragment` links when computing
/// link density.
pub const HASH_LINK_WEIGHT: f64 = 0.3;
