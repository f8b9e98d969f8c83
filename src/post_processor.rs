//! Final cleanup of the assembled article fragment.
//!
//! Order matters here: URLs are made absolute first, presentational and
//! scripting attributes go next, then conditionally-unwanted structures,
//! then empty blocks, and finally class/bookkeeping attributes. The pass
//! is idempotent, and it never deletes the last remaining piece of
//! content: an empty article beats a crash.

use crate::constants::{TagCategory, PRESENTATIONAL_ATTRIBUTES, REGEXPS};
use crate::dom_utils;
use crate::flags::ExtractionFlags;
use crate::options::ExtractOptions;
use crate::scoring;
use ego_tree::NodeId;
use scraper::node::Node;
use scraper::{ElementRef, Html};
use url::Url;

/// Share widgets shorter than this are dropped outright.
const SHARE_ELEMENT_THRESHOLD: usize = 500;

/// Tags eligible for conditional removal.
const CONDITIONAL_TAGS: &[&str] = &["table", "ul", "ol", "div", "form", "fieldset"];

/// Tags that always carry content and exempt their subtree from
/// conditional removal.
const CONTENT_BEARING_TAGS: &[&str] = &["code", "pre", "img", "picture", "figure"];

/// Clean the article fragment in place.
pub fn clean_article(
    document: &mut Html,
    base_url: Option<&Url>,
    flags: ExtractionFlags,
    options: &ExtractOptions,
) {
    fix_relative_urls(document, base_url);
    strip_presentational_attributes(document);
    remove_disallowed_embeds(document, options);
    remove_share_elements(document);
    if flags.contains(ExtractionFlags::CLEAN_CONDITIONALLY) {
        clean_conditionally(document);
    }
    collapse_empty_blocks(document);
    strip_bookkeeping_attributes(document, options);
}

fn fix_relative_urls(document: &mut Html, base_url: Option<&Url>) {
    let Some(base) = base_url else {
        return;
    };

    let mut updates: Vec<(NodeId, &'static str, String)> = Vec::new();
    for node in document.tree.root().descendants() {
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };
        let el = element.value();

        if let Some(href) = el.attr("href") {
            if let Some(resolved) = resolve_url(base, href) {
                updates.push((node.id(), "href", resolved));
            }
        }
        for attr in ["src", "poster"] {
            if let Some(value) = el.attr(attr) {
                if let Some(resolved) = resolve_url(base, value) {
                    updates.push((node.id(), attr, resolved));
                }
            }
        }
        if let Some(srcset) = el.attr("srcset") {
            let rewritten = rewrite_srcset(srcset, base);
            if rewritten != srcset {
                updates.push((node.id(), "srcset", rewritten));
            }
        }
    }

    for (id, attr, value) in updates {
        if let Some(mut node) = document.tree.get_mut(id) {
            if let Node::Element(el) = node.value() {
                dom_utils::set_attr(el, attr, &value);
            }
        }
    }
}

/// Absolute form of a reference, or `None` when it should stay as-is.
fn resolve_url(base: &Url, value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty()
        || value.starts_with('#')
        || value.starts_with("data:")
        || value.to_ascii_lowercase().starts_with("javascript:")
        || Url::parse(value).is_ok()
    {
        return None;
    }
    base.join(value).ok().map(|u| u.to_string())
}

fn rewrite_srcset(srcset: &str, base: &Url) -> String {
    srcset
        .split(',')
        .filter_map(|candidate| {
            let candidate = candidate.trim();
            if candidate.is_empty() {
                return None;
            }
            let mut parts = candidate.split_whitespace();
            let url_part = parts.next()?;
            let descriptor = parts.collect::<Vec<_>>().join(" ");
            let resolved = resolve_url(base, url_part).unwrap_or_else(|| url_part.to_string());
            if descriptor.is_empty() {
                Some(resolved)
            } else {
                Some(format!("{resolved} {descriptor}"))
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn strip_presentational_attributes(document: &mut Html) {
    let ids: Vec<NodeId> = document
        .tree
        .root()
        .descendants()
        .filter(|n| n.value().is_element())
        .map(|n| n.id())
        .collect();

    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            if let Node::Element(el) = node.value() {
                el.attrs.retain(|name, _| {
                    let local = name.local.as_ref();
                    !PRESENTATIONAL_ATTRIBUTES.contains(&local) && !local.starts_with("on")
                });
            }
        }
    }
}

/// `<iframe>`/`<embed>`/`<object>` survive only when they point at a
/// recognized video host.
fn remove_disallowed_embeds(document: &mut Html, options: &ExtractOptions) {
    let videos = options
        .allowed_video_regex
        .as_ref()
        .unwrap_or(&REGEXPS.videos);

    let ids: Vec<NodeId> = document
        .tree
        .root()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|element| {
            let el = element.value();
            if !matches!(el.name(), "iframe" | "embed" | "object") {
                return false;
            }
            !el.attrs()
                .any(|(_, value)| videos.is_match(value))
        })
        .map(|element| element.id())
        .collect();
    dom_utils::detach_all(document, ids);
}

fn remove_share_elements(document: &mut Html) {
    let ids: Vec<NodeId> = document
        .tree
        .root()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|element| {
            let match_string = dom_utils::class_and_id(element);
            !match_string.is_empty()
                && REGEXPS.share_elements.is_match(&match_string)
                && dom_utils::inner_text(**element).chars().count() < SHARE_ELEMENT_THRESHOLD
        })
        .map(|element| element.id())
        .collect();
    dom_utils::detach_all(document, ids);
}

fn clean_conditionally(document: &mut Html) {
    let ids: Vec<NodeId> = document
        .tree
        .root()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|element| {
            CONDITIONAL_TAGS.contains(&element.value().name())
                && !element
                    .value()
                    .attr("id")
                    .is_some_and(|id| id.starts_with("unclutter-"))
        })
        .map(|element| element.id())
        .collect();

    for id in ids {
        let remove = {
            let Some(node) = document.tree.get(id) else {
                continue;
            };
            let Some(element) = ElementRef::wrap(node) else {
                continue;
            };
            !is_sole_content(element) && should_remove_conditionally(element)
        };
        if remove {
            if let Some(mut node) = document.tree.get_mut(id) {
                node.detach();
            }
        }
    }
}

/// The last element standing inside the page wrapper is kept no matter
/// what the heuristics say.
fn is_sole_content(element: ElementRef) -> bool {
    let Some(parent) = element.parent() else {
        return true;
    };
    let Some(parent_el) = ElementRef::wrap(parent) else {
        return false;
    };
    if parent_el.value().attr("id") != Some("unclutter-page-1") {
        return false;
    }
    parent
        .children()
        .filter(|child| child.value().is_element())
        .count()
        <= 1
}

fn should_remove_conditionally(element: ElementRef) -> bool {
    // Code samples and figures are content no matter how list-like or
    // link-heavy they look.
    let has_content_bearing = element.descendants().any(|d| {
        matches!(d.value(), Node::Element(el) if CONTENT_BEARING_TAGS.contains(&el.name()))
    });
    if has_content_bearing {
        return false;
    }

    let weight = scoring::class_weight(&element);
    if weight < 0.0 {
        return true;
    }

    let text = dom_utils::inner_text(*element);
    if text.matches(',').count() >= 10 {
        return false;
    }

    let tag = element.value().name();
    let paragraphs = dom_utils::count_elements(*element, |t| t == "p");
    let images = dom_utils::count_elements(*element, |t| t == "img");
    let list_items = dom_utils::count_elements(*element, |t| t == "li");
    let inputs = dom_utils::count_elements(*element, |t| t == "input");
    let embeds = dom_utils::count_elements(*element, |t| {
        matches!(t, "iframe" | "embed" | "object" | "video")
    });
    let density = dom_utils::link_density(*element);
    let text_len = text.chars().count();
    let is_list = matches!(tag, "ul" | "ol");

    if images > 1 && paragraphs * 2 < images {
        return true;
    }
    if !is_list && list_items > paragraphs {
        return true;
    }
    if inputs * 3 > paragraphs.max(1) {
        return true;
    }
    if text_len < 25 && (images == 0 || images > 2) {
        return true;
    }
    if weight < 25.0 && density > 0.2 {
        return true;
    }
    if weight >= 25.0 && density > 0.5 {
        return true;
    }
    if (embeds == 1 && text_len < 75) || embeds > 1 {
        return true;
    }

    false
}

/// Remove block elements that ended up with no text and no media.
fn collapse_empty_blocks(document: &mut Html) {
    const EMPTY_CANDIDATES: &[&str] = &[
        "p", "div", "section", "blockquote", "ul", "ol", "li", "table", "tbody", "tr", "td",
        "span",
    ];

    // Removing a child can empty its parent, so iterate to a fixpoint.
    loop {
        let ids: Vec<NodeId> = document
            .tree
            .root()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|element| {
                let el = element.value();
                if !EMPTY_CANDIDATES.contains(&el.name()) {
                    return false;
                }
                if el.attr("id") == Some("unclutter-content")
                    || el.attr("id") == Some("unclutter-page-1")
                {
                    return false;
                }
                dom_utils::inner_text(**element).is_empty()
                    && dom_utils::count_elements(**element, |t| {
                        TagCategory::of(t) == TagCategory::Media || t == "br" || t == "hr"
                    }) == 0
            })
            .map(|element| element.id())
            .collect();

        if ids.is_empty() {
            break;
        }
        dom_utils::detach_all(document, ids);
    }
}

fn strip_bookkeeping_attributes(document: &mut Html, options: &ExtractOptions) {
    let ids: Vec<NodeId> = document
        .tree
        .root()
        .descendants()
        .filter(|n| n.value().is_element())
        .map(|n| n.id())
        .collect();

    for id in ids {
        let kept_classes = {
            let Some(node) = document.tree.get(id) else {
                continue;
            };
            let Some(element) = ElementRef::wrap(node) else {
                continue;
            };
            element.value().attr("class").map(|class| {
                class
                    .split_whitespace()
                    .filter(|token| {
                        options.keep_classes
                            || options.classes_to_preserve.iter().any(|keep| keep == token)
                    })
                    .collect::<Vec<_>>()
                    .join(" ")
            })
        };

        if let Some(mut node) = document.tree.get_mut(id) {
            if let Node::Element(el) = node.value() {
                el.attrs
                    .retain(|name, _| !name.local.as_ref().starts_with("data-unclutter-"));
                match kept_classes {
                    Some(classes) if !classes.is_empty() => {
                        dom_utils::set_attr(el, "class", &classes);
                    }
                    Some(_) => dom_utils::remove_attr(el, "class"),
                    None => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(html: &str, base: Option<&str>) -> String {
        let mut document = Html::parse_fragment(html);
        let base = base.map(|b| Url::parse(b).unwrap());
        clean_article(
            &mut document,
            base.as_ref(),
            ExtractionFlags::default(),
            &ExtractOptions::default(),
        );
        document.root_element().inner_html()
    }

    const PAGE_OPEN: &str = r#"<div id="unclutter-content"><div id="unclutter-page-1" class="page">"#;
    const PAGE_CLOSE: &str = "</div></div>";

    fn page(inner: &str) -> String {
        format!("{PAGE_OPEN}{inner}{PAGE_CLOSE}")
    }

    #[test]
    fn resolves_relative_urls() {
        let cleaned = clean(
            &page(r#"<p><a href="/about">About</a><img src="pic.jpg"></p>"#),
            Some("https://example.com/articles/1"),
        );
        assert!(cleaned.contains(r#"href="https://example.com/about""#));
        assert!(cleaned.contains(r#"src="https://example.com/articles/pic.jpg""#));
    }

    #[test]
    fn rewrites_srcset_candidates() {
        let cleaned = clean(
            &page(r#"<p>Text body here.<img srcset="a.jpg 1x, b.jpg 2x"></p>"#),
            Some("https://example.com/post/"),
        );
        assert!(cleaned.contains("https://example.com/post/a.jpg 1x"));
        assert!(cleaned.contains("https://example.com/post/b.jpg 2x"));
    }

    #[test]
    fn strips_style_and_event_handlers() {
        let cleaned = clean(
            &page(r#"<p style="color:red" onclick="evil()" align="center">Some paragraph text.</p>"#),
            None,
        );
        assert!(!cleaned.contains("style="));
        assert!(!cleaned.contains("onclick"));
        assert!(!cleaned.contains("align"));
        assert!(cleaned.contains("Some paragraph text."));
    }

    #[test]
    fn removes_link_farm_lists() {
        let cleaned = clean(
            &page(
                r#"<p>Real article text that should definitely stay around after cleaning.</p>
                <ul><li><a href="/a">One</a></li><li><a href="/b">Two</a></li><li><a href="/c">Three</a></li></ul>"#,
            ),
            None,
        );
        assert!(cleaned.contains("Real article text"));
        assert!(!cleaned.contains("<ul>"));
    }

    #[test]
    fn keeps_code_bearing_blocks() {
        let cleaned = clean(
            &page(r#"<div><pre><code>let x = 1;</code></pre></div>"#),
            None,
        );
        assert!(cleaned.contains("let x = 1;"));
    }

    #[test]
    fn never_removes_sole_content_node() {
        let cleaned = clean(&page(r#"<div class="sidebar"><p>Only thing left.</p></div>"#), None);
        assert!(cleaned.contains("Only thing left."));
    }

    #[test]
    fn removes_non_video_iframes() {
        let cleaned = clean(
            &page(
                r#"<p>Body text of the article, long enough to stay.</p>
                <iframe src="https://adserver.example.com/frame"></iframe>
                <iframe src="https://www.youtube.com/embed/xyz"></iframe>"#,
            ),
            None,
        );
        assert!(!cleaned.contains("adserver"));
        assert!(cleaned.contains("youtube.com/embed/xyz"));
    }

    #[test]
    fn collapses_empty_blocks() {
        let cleaned = clean(
            &page(r#"<p>Kept paragraph.</p><div><span>  </span></div>"#),
            None,
        );
        assert!(cleaned.contains("Kept paragraph."));
        assert!(!cleaned.contains("<span>"));
        assert_eq!(cleaned.matches("<div").count(), 2);
    }

    #[test]
    fn strips_classes_except_preserved() {
        let cleaned = clean(
            &page(r#"<p class="lede page highlight">Styled text content here.</p>"#),
            None,
        );
        assert!(cleaned.contains(r#"class="page""#));
        assert!(!cleaned.contains("lede"));
        assert!(!cleaned.contains("highlight"));
    }

    #[test]
    fn cleaning_twice_changes_nothing() {
        let html = page(
            r#"<p><a href="/rel">Link</a> and a good chunk of article text, with commas, even.</p>
            <ul><li><a href="/x">Nav one</a></li><li><a href="/y">Nav two</a></li></ul>"#,
        );
        let mut document = Html::parse_fragment(&html);
        let base = Url::parse("https://example.com/").unwrap();
        let options = ExtractOptions::default();

        clean_article(&mut document, Some(&base), ExtractionFlags::default(), &options);
        let first = document.root_element().html();

        clean_article(&mut document, Some(&base), ExtractionFlags::default(), &options);
        let second = document.root_element().html();

        assert_eq!(first, second);
    }
}
