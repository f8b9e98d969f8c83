//! Document preprocessing: the first pipeline phase.
//!
//! Normalizes the raw DOM in place before scoring sees it: scripts, styles
//! and comments go away, lazy-loaded and `<noscript>`-wrapped images are
//! promoted to plain `<img>` elements, `<br>` runs become paragraph
//! boundaries and deprecated presentational tags are neutralized.

use crate::constants::REGEXPS;
use crate::dom_utils;
use crate::error::{ExtractError, Result};
use ego_tree::NodeId;
use scraper::node::Node;
use scraper::{ElementRef, Html};

const IMAGE_SOURCE_ATTRIBUTES: &[&str] = &["src", "srcset", "data-src", "data-srcset"];
const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".webp"];

/// Normalize the document in place.
///
/// Operations run in a fixed order; malformed fragments the parser already
/// tolerated pass through unchanged. Fails only when the document ends up
/// with no body content at all.
pub fn prep_document(document: &mut Html) -> Result<()> {
    remove_scripts_styles_comments(document);
    unwrap_noscript_images(document);
    fix_lazy_images(document);
    remove_sourceless_images(document);
    replace_break_runs(document);
    rewrite_font_tags(document);
    ensure_body_content(document)
}

fn remove_scripts_styles_comments(document: &mut Html) {
    let ids: Vec<NodeId> = document
        .tree
        .root()
        .descendants()
        .filter(|node| match node.value() {
            Node::Comment(_) => true,
            Node::Element(el) => matches!(el.name(), "script" | "style"),
            _ => false,
        })
        .map(|node| node.id())
        .collect();
    dom_utils::detach_all(document, ids);
}

/// Promote the real image hidden in a `<noscript>` fallback over its lazy
/// placeholder sibling, then drop the `<noscript>` wrappers.
fn unwrap_noscript_images(document: &mut Html) {
    let noscript_ids: Vec<NodeId> = document
        .tree
        .root()
        .descendants()
        .filter(|n| matches!(n.value(), Node::Element(el) if el.name() == "noscript"))
        .map(|n| n.id())
        .collect();

    for id in &noscript_ids {
        promote_noscript_image(document, *id);
    }
    dom_utils::detach_all(document, noscript_ids);
}

fn promote_noscript_image(document: &mut Html, noscript_id: NodeId) {
    // The parser treats noscript content as text, so re-parse it to see
    // the fallback markup.
    let (fallback_attrs, placeholder_id) = {
        let Some(noscript) = document.tree.get(noscript_id) else {
            return;
        };

        let raw = dom_utils::inner_text(noscript);
        if raw.is_empty() {
            return;
        }
        let fragment = Html::parse_fragment(&raw);
        let Some(attrs) = single_image_attrs(&fragment) else {
            return;
        };

        let mut prev = noscript.prev_sibling();
        while let Some(node) = prev {
            if dom_utils::is_whitespace_text(&node) {
                prev = node.prev_sibling();
                continue;
            }
            break;
        }
        let Some(placeholder) = prev.and_then(ElementRef::wrap) else {
            return;
        };
        let Some(placeholder_img) = single_image_in(placeholder) else {
            return;
        };

        (attrs, placeholder_img)
    };

    if let Some(mut node) = document.tree.get_mut(placeholder_id) {
        if let Node::Element(el) = node.value() {
            for attr in IMAGE_SOURCE_ATTRIBUTES {
                dom_utils::remove_attr(el, attr);
            }
            for (name, value) in &fallback_attrs {
                dom_utils::set_attr(el, name, value);
            }
        }
    }
}

/// The attributes of the only `<img>` in a parsed fragment, if the fragment
/// holds nothing else of substance.
fn single_image_attrs(fragment: &Html) -> Option<Vec<(String, String)>> {
    let root = fragment.root_element();
    if !dom_utils::inner_text(*root).is_empty() {
        return None;
    }

    let mut images = root
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "img");
    let image = images.next()?;
    if images.next().is_some() {
        return None;
    }

    Some(
        image
            .value()
            .attrs()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
    )
}

/// The element itself when it is an `<img>`, or its single `<img>`
/// descendant when it is a text-free wrapper.
fn single_image_in(element: ElementRef) -> Option<NodeId> {
    if element.value().name() == "img" {
        return Some(element.id());
    }
    if !dom_utils::inner_text(*element).is_empty() {
        return None;
    }

    let mut images = element
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "img");
    let image = images.next()?;
    if images.next().is_some() {
        return None;
    }
    Some(image.id())
}

/// Copy `data-src`/`data-srcset` into the real source attributes for images
/// a lazy loader never got to hydrate.
fn fix_lazy_images(document: &mut Html) {
    let mut updates: Vec<(NodeId, Option<String>, Option<String>)> = Vec::new();

    for node in document.tree.root().descendants() {
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };
        let el = element.value();
        if el.name() != "img" || el.attr("src").is_some() || el.attr("srcset").is_some() {
            continue;
        }

        let src = el
            .attr("data-src")
            .filter(|v| REGEXPS.lazy_image_src.is_match(v))
            .map(str::to_string);
        let srcset = el
            .attr("data-srcset")
            .filter(|v| REGEXPS.lazy_image_srcset.is_match(v))
            .map(str::to_string);
        if src.is_some() || srcset.is_some() {
            updates.push((node.id(), src, srcset));
        }
    }

    for (id, src, srcset) in updates {
        if let Some(mut node) = document.tree.get_mut(id) {
            if let Node::Element(el) = node.value() {
                if let Some(src) = src {
                    dom_utils::set_attr(el, "src", &src);
                    dom_utils::remove_attr(el, "data-src");
                }
                if let Some(srcset) = srcset {
                    dom_utils::set_attr(el, "srcset", &srcset);
                    dom_utils::remove_attr(el, "data-srcset");
                }
            }
        }
    }
}

/// Drop `<img>` placeholders that carry no usable source anywhere.
fn remove_sourceless_images(document: &mut Html) {
    let ids: Vec<NodeId> = document
        .tree
        .root()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|element| {
            let el = element.value();
            el.name() == "img"
                && !el.attrs().any(|(name, value)| {
                    IMAGE_SOURCE_ATTRIBUTES.contains(&name)
                        || IMAGE_EXTENSIONS
                            .iter()
                            .any(|ext| value.to_lowercase().contains(ext))
                })
        })
        .map(|element| element.id())
        .collect();
    dom_utils::detach_all(document, ids);
}

/// Split runs of two or more `<br>` elements into paragraph boundaries,
/// folding the phrasing content that follows into a fresh `<p>`.
fn replace_break_runs(document: &mut Html) {
    let chain_starts: Vec<NodeId> = document
        .tree
        .root()
        .descendants()
        .filter(|node| is_br(node) && starts_break_chain(*node))
        .map(|node| node.id())
        .collect();

    for id in chain_starts {
        convert_break_chain(document, id);
    }
}

fn is_br(node: &ego_tree::NodeRef<'_, Node>) -> bool {
    matches!(node.value(), Node::Element(el) if el.name() == "br")
}

fn starts_break_chain(node: ego_tree::NodeRef<'_, Node>) -> bool {
    let mut next = node.next_sibling();
    while let Some(sibling) = next {
        if dom_utils::is_whitespace_text(&sibling) {
            next = sibling.next_sibling();
            continue;
        }
        return is_br(&sibling);
    }
    false
}

fn convert_break_chain(document: &mut Html, first_br: NodeId) {
    let Some(br) = document.tree.get(first_br) else {
        return;
    };

    let mut chain = vec![first_br];
    let mut next = br.next_sibling();
    while let Some(node) = next {
        if dom_utils::is_whitespace_text(&node) || is_br(&node) {
            chain.push(node.id());
            next = node.next_sibling();
            continue;
        }
        break;
    }

    let mut to_move = Vec::new();
    let mut cursor = next;
    while let Some(node) = cursor {
        if is_br(&node) {
            break;
        }
        if dom_utils::is_phrasing_node(&node) || dom_utils::is_whitespace_text(&node) {
            to_move.push(node.id());
            cursor = node.next_sibling();
        } else {
            break;
        }
    }

    if to_move.is_empty() && chain.len() <= 1 {
        return;
    }

    let paragraph_id = {
        let Some(mut br_node) = document.tree.get_mut(first_br) else {
            return;
        };
        let paragraph = br_node.insert_before(dom_utils::create_element("p"));
        paragraph.id()
    };

    dom_utils::detach_all(document, chain);

    if let Some(mut paragraph) = document.tree.get_mut(paragraph_id) {
        for id in to_move {
            paragraph.append_id(id);
        }
    }

    trim_edge_whitespace(document, paragraph_id);

    // A paragraph cannot nest inside another; widen the old parent.
    let parent_id = document
        .tree
        .get(paragraph_id)
        .and_then(|node| node.parent())
        .map(|parent| parent.id());
    if let Some(parent_id) = parent_id {
        if let Some(mut parent) = document.tree.get_mut(parent_id) {
            if let Node::Element(el) = parent.value() {
                if el.name() == "p" {
                    dom_utils::rename_element(el, "div");
                }
            }
        }
    }
}

fn trim_edge_whitespace(document: &mut Html, id: NodeId) {
    let Some(mut node) = document.tree.get_mut(id) else {
        return;
    };
    while let Some(mut child) = node.first_child() {
        if matches!(child.value(), Node::Text(text) if text.trim().is_empty()) {
            child.detach();
        } else {
            break;
        }
    }
    while let Some(mut child) = node.last_child() {
        if matches!(child.value(), Node::Text(text) if text.trim().is_empty()) {
            child.detach();
        } else {
            break;
        }
    }
}

fn rewrite_font_tags(document: &mut Html) {
    let ids: Vec<NodeId> = document
        .tree
        .root()
        .descendants()
        .filter(|n| matches!(n.value(), Node::Element(el) if el.name() == "font"))
        .map(|n| n.id())
        .collect();

    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            if let Node::Element(el) = node.value() {
                dom_utils::rename_element(el, "span");
            }
        }
    }
}

fn ensure_body_content(document: &Html) -> Result<()> {
    let Some(body) = dom_utils::body_node(document) else {
        return Err(ExtractError::EmptyDocument);
    };

    let has_content = body.children().any(|child| match child.value() {
        Node::Element(_) => true,
        Node::Text(text) => !text.trim().is_empty(),
        _ => false,
    });
    if has_content {
        Ok(())
    } else {
        Err(ExtractError::EmptyDocument)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prepped(html: &str) -> Html {
        let mut document = Html::parse_document(html);
        prep_document(&mut document).unwrap();
        document
    }

    #[test]
    fn strips_scripts_styles_and_comments() {
        let document = prepped(
            "<html><body><script>var x;</script><style>p{}</style><!-- hi --><p>Text</p></body></html>",
        );
        let html = document.html();
        assert!(!html.contains("script"));
        assert!(!html.contains("style"));
        assert!(!html.contains("hi"));
        assert!(html.contains("<p>Text</p>"));
    }

    #[test]
    fn empty_document_is_an_error() {
        let mut document = Html::parse_document("<html><body>   </body></html>");
        assert!(matches!(
            prep_document(&mut document),
            Err(ExtractError::EmptyDocument)
        ));
    }

    #[test]
    fn promotes_noscript_image_over_placeholder() {
        let document = prepped(
            r#"<html><body><p>x</p><img class="lazy" src="placeholder.gif">
            <noscript><img src="real.jpg" alt="photo"></noscript></body></html>"#,
        );
        let html = document.html();
        assert!(html.contains(r#"src="real.jpg""#));
        assert!(!html.contains("noscript"));
    }

    #[test]
    fn hydrates_lazy_data_src() {
        let document = prepped(
            r#"<html><body><p>x</p><img data-src="photo.jpg"></body></html>"#,
        );
        assert!(document.html().contains(r#"src="photo.jpg""#));
    }

    #[test]
    fn drops_images_without_any_source() {
        let document = prepped(r#"<html><body><p>x</p><img class="spacer"></body></html>"#);
        assert!(!document.html().contains("img"));
    }

    #[test]
    fn double_br_becomes_paragraph() {
        let document = prepped(
            "<html><body><div>first line<br><br>second line</div></body></html>",
        );
        let html = document.html();
        assert!(!html.contains("<br>"));
        assert!(html.contains("<p>second line</p>"));
    }

    #[test]
    fn single_br_is_left_alone() {
        let document = prepped("<html><body><div>one<br>two</div></body></html>");
        assert!(document.html().contains("<br>"));
    }

    #[test]
    fn font_tags_become_spans() {
        let document = prepped("<html><body><p><font color=\"red\">loud</font> text</p></body></html>");
        let html = document.html();
        assert!(!html.contains("<font"));
        assert!(html.contains("<span"));
    }
}
