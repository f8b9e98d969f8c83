//! DOM helpers shared across the pipeline: visibility classification, text
//! collection, link density and attribute mutation on the scraper tree.

use crate::constants::{HASH_LINK_WEIGHT, PHRASING_ELEMS, REGEXPS};
use crate::utils;
use html5ever::tendril::StrTendril;
use html5ever::{namespace_url, ns, LocalName, QualName};
use ego_tree::{NodeId, NodeRef};
use scraper::node::{Element, Node};
use scraper::{ElementRef, Html};

/// Decide whether a node is probably visible to a reader.
///
/// Checks short-circuit in order: inline `display:none` /
/// `visibility:hidden`, the `hidden` attribute, then `aria-hidden="true"`
/// unless the element opts back in via a `fallback-image` class. Pure
/// function of the element's attributes.
pub fn is_probably_visible(element: &ElementRef) -> bool {
    if let Some(style) = element.value().attr("style") {
        if REGEXPS.display_none.is_match(style) || REGEXPS.visibility_hidden.is_match(style) {
            return false;
        }
    }

    if element.value().attr("hidden").is_some() {
        return false;
    }

    if element
        .value()
        .attr("aria-hidden")
        .is_some_and(|v| v.trim() == "true")
    {
        let has_override = element
            .value()
            .attr("class")
            .is_some_and(|c| c.contains("fallback-image"));
        if !has_override {
            return false;
        }
    }

    true
}

/// Concatenated text of all descendant text nodes, whitespace-normalized.
pub fn inner_text(node: NodeRef<'_, Node>) -> String {
    let mut text = String::new();
    for descendant in node.descendants() {
        if let Node::Text(chunk) = descendant.value() {
            text.push_str(chunk);
        }
    }
    utils::trim_and_normalize(&text)
}

/// Ratio of anchor-enclosed text to total text in a node.
///
/// Text behind bare `#fragment` links is discounted, matching the
/// observation that footnote/anchor links are not navigation.
pub fn link_density(node: NodeRef<'_, Node>) -> f64 {
    let total = inner_text(node).chars().count() as f64;
    if total == 0.0 {
        return 0.0;
    }

    let mut link_length = 0.0;
    for descendant in node.descendants() {
        let Some(element) = ElementRef::wrap(descendant) else {
            continue;
        };
        if element.value().name() != "a" {
            continue;
        }

        let href = element.value().attr("href").unwrap_or_default();
        let weight = if REGEXPS.hash_url.is_match(href) {
            HASH_LINK_WEIGHT
        } else {
            1.0
        };
        let text = inner_text(*element);
        link_length += text.chars().count() as f64 * weight;
    }

    link_length / total
}

/// Class and id attributes joined into one match string for the keyword
/// regexes.
pub fn class_and_id(element: &ElementRef) -> String {
    let class = element.value().attr("class").unwrap_or_default();
    let id = element.value().attr("id").unwrap_or_default();
    let mut out = String::with_capacity(class.len() + id.len() + 1);
    out.push_str(class);
    if !id.is_empty() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(id);
    }
    out
}

/// The `<body>` element of a parsed document.
pub fn body_node(document: &Html) -> Option<NodeRef<'_, Node>> {
    document
        .root_element()
        .children()
        .find(|child| matches!(child.value(), Node::Element(el) if el.name() == "body"))
}

pub fn is_whitespace_text(node: &NodeRef<'_, Node>) -> bool {
    matches!(node.value(), Node::Text(text) if text.trim().is_empty())
}

pub fn is_phrasing_node(node: &NodeRef<'_, Node>) -> bool {
    match node.value() {
        Node::Text(_) => true,
        Node::Element(element) => PHRASING_ELEMS.contains(&element.name()),
        _ => false,
    }
}

/// Build a detached element node for insertion into the tree, carrying
/// exactly the representation the parser itself produces.
pub fn create_element(tag: &str) -> Node {
    let fragment = Html::parse_fragment(&format!("<{tag}></{tag}>"));
    fragment
        .tree
        .root()
        .descendants()
        .find_map(|node| match node.value() {
            Node::Element(el) if el.name() == tag => Some(Node::Element(el.clone())),
            _ => None,
        })
        .unwrap_or(Node::Fragment)
}

pub fn set_attr(element: &mut Element, name: &str, value: &str) {
    element.attrs.insert(
        QualName::new(None, ns!(), LocalName::from(name)),
        StrTendril::from(value),
    );
}

pub fn remove_attr(element: &mut Element, name: &str) {
    element.attrs.retain(|attr, _| attr.local.as_ref() != name);
}

pub fn rename_element(element: &mut Element, tag: &str) {
    element.name = QualName::new(None, ns!(html), LocalName::from(tag));
}

/// Detach a set of nodes from the tree, ignoring ids that are already gone.
pub fn detach_all(document: &mut Html, ids: Vec<NodeId>) {
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// Count descendant elements matching a tag predicate.
pub fn count_elements<F>(node: NodeRef<'_, Node>, predicate: F) -> usize
where
    F: Fn(&str) -> bool,
{
    node.descendants()
        .filter(|d| matches!(d.value(), Node::Element(el) if predicate(el.name())))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Selector;

    fn first_el<'a>(doc: &'a Html, selector: &str) -> ElementRef<'a> {
        let sel = Selector::parse(selector).unwrap();
        doc.select(&sel).next().unwrap()
    }

    #[test]
    fn display_none_is_not_visible() {
        let doc = Html::parse_document(r#"<div style="display: none">x</div>"#);
        assert!(!is_probably_visible(&first_el(&doc, "div")));
    }

    #[test]
    fn hidden_attribute_is_not_visible() {
        let doc = Html::parse_document(r#"<div hidden>x</div>"#);
        assert!(!is_probably_visible(&first_el(&doc, "div")));
    }

    #[test]
    fn aria_hidden_is_not_visible_without_override() {
        let doc = Html::parse_document(r#"<div aria-hidden="true">x</div>"#);
        assert!(!is_probably_visible(&first_el(&doc, "div")));

        let doc = Html::parse_document(r#"<div aria-hidden="true" class="fallback-image">x</div>"#);
        assert!(is_probably_visible(&first_el(&doc, "div")));
    }

    #[test]
    fn plain_elements_are_visible() {
        let doc = Html::parse_document(r#"<div class="content">x</div>"#);
        assert!(is_probably_visible(&first_el(&doc, "div")));
    }

    #[test]
    fn link_density_counts_anchor_text() {
        let doc = Html::parse_document(
            r#"<div><a href="/x">link text here</a> and some plain text that is longer</div>"#,
        );
        let el = first_el(&doc, "div");
        let density = link_density(*el);
        assert!(density > 0.0 && density < 0.5, "density was {density}");
    }

    #[test]
    fn hash_links_are_discounted() {
        let plain = Html::parse_document(r#"<div><a href="/x">abcdef</a>ghijkl</div>"#);
        let hashed = Html::parse_document(r##"<div><a href="#f">abcdef</a>ghijkl</div>"##);
        let plain_density = link_density(*first_el(&plain, "div"));
        let hashed_density = link_density(*first_el(&hashed, "div"));
        assert!(hashed_density < plain_density);
    }

    #[test]
    fn inner_text_normalizes_whitespace() {
        let doc = Html::parse_document("<div>  a\n   <span>b</span>\tc </div>");
        assert_eq!(inner_text(*first_el(&doc, "div")), "a b c");
    }
}
