//! Candidate selection and article assembly.
//!
//! Works on a per-attempt copy of the preprocessed document: boilerplate
//! and invisible nodes are detached, the remainder is scored, and the
//! best-scoring container plus its qualifying siblings become the article.

use crate::constants::{REGEXPS, UNLIKELY_ROLES};
use crate::dom_utils;
use crate::error::{ExtractError, Result};
use crate::flags::ExtractionFlags;
use crate::options::ExtractOptions;
use crate::scoring::{self, ScoreTracker};
use ego_tree::NodeId;
use scraper::{ElementRef, Html};

/// Minimum absolute score a sibling needs regardless of the top score.
const MIN_SIBLING_SCORE: f64 = 10.0;

/// Extract the article content from a preprocessed document.
///
/// Returns the serialized article wrapper, or `NoCandidateFound` when
/// nothing scored above zero.
pub fn grab_article(
    document: &mut Html,
    flags: ExtractionFlags,
    options: &ExtractOptions,
) -> Result<String> {
    remove_hidden_nodes(document);
    if flags.contains(ExtractionFlags::STRIP_UNLIKELYS) {
        strip_unlikely_candidates(document);
    }

    let tracker = scoring::score_document(document, flags, options);
    if tracker.is_empty() {
        return Err(ExtractError::NoCandidateFound);
    }
    let top = select_top_candidate(document, &tracker, options)
        .ok_or(ExtractError::NoCandidateFound)?;

    Ok(assemble_article(document, top, &tracker, options))
}

/// Detach everything the visibility classifier rejects, so hidden text can
/// never be scored, assembled or counted.
fn remove_hidden_nodes(document: &mut Html) {
    let Some(body) = dom_utils::body_node(document) else {
        return;
    };

    let ids: Vec<NodeId> = body
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|element| !dom_utils::is_probably_visible(element))
        .map(|element| element.id())
        .collect();
    dom_utils::detach_all(document, ids);
}

/// Drop nodes whose class/id scream boilerplate, unless they also carry a
/// maybe-candidate keyword.
fn strip_unlikely_candidates(document: &mut Html) {
    let Some(body) = dom_utils::body_node(document) else {
        return;
    };

    let ids: Vec<NodeId> = body
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|element| {
            let tag = element.value().name();
            if matches!(tag, "body" | "a") {
                return false;
            }

            if element
                .value()
                .attr("role")
                .is_some_and(|role| UNLIKELY_ROLES.contains(&role))
            {
                return true;
            }

            let match_string = dom_utils::class_and_id(element);
            !match_string.is_empty()
                && REGEXPS.unlikely_candidates.is_match(&match_string)
                && !REGEXPS.maybe_candidate.is_match(&match_string)
        })
        .map(|element| element.id())
        .collect();
    dom_utils::detach_all(document, ids);
}

/// Highest-scoring node, walking a few ancestors to prefer a structurally
/// better container when their scores are close.
pub fn select_top_candidate(
    document: &Html,
    tracker: &ScoreTracker,
    options: &ExtractOptions,
) -> Option<NodeId> {
    let body = dom_utils::body_node(document)?;

    // Document-order iteration: on equal rounded scores the earlier node
    // wins, keeping selection deterministic.
    let mut best: Option<(NodeId, f64)> = None;
    for node in body.descendants() {
        let Some(score) = tracker.get(node.id()) else {
            continue;
        };
        let rounded = (score * 100.0).round() / 100.0;
        if best.is_none_or(|(_, best_score)| rounded > best_score) {
            best = Some((node.id(), rounded));
        }
    }

    let (mut candidate, mut candidate_score) = best?;
    if candidate_score <= 0.0 {
        return None;
    }

    // Content split across a shallow wrapper: prefer an ancestor that
    // scores nearly as well and holds little else.
    for _ in 0..options.ancestor_depth {
        let node = document.tree.get(candidate)?;
        let Some(parent) = node.parent() else {
            break;
        };
        let Some(parent_el) = ElementRef::wrap(parent) else {
            break;
        };
        if matches!(parent_el.value().name(), "body" | "html") {
            break;
        }
        let Some(parent_score) = tracker.get(parent.id()) else {
            break;
        };

        let scored_siblings = parent
            .children()
            .filter(|child| child.id() != candidate && tracker.is_scored(child.id()))
            .count();

        if parent_score > 0.0
            && parent_score >= candidate_score * options.ancestor_score_decay
            && scored_siblings <= options.max_scored_siblings
        {
            candidate = parent.id();
            candidate_score = parent_score;
        } else {
            break;
        }
    }

    Some(candidate)
}

/// Build the article wrapper from the top candidate and its qualifying
/// siblings, in original document order.
fn assemble_article(
    document: &Html,
    top: NodeId,
    tracker: &ScoreTracker,
    options: &ExtractOptions,
) -> String {
    let top_score = tracker.get(top).unwrap_or(0.0);
    let sibling_threshold = (top_score * options.sibling_score_fraction).max(MIN_SIBLING_SCORE);

    let mut parts: Vec<String> = Vec::new();

    let top_node = document.tree.get(top);
    let parent = top_node.and_then(|node| node.parent());

    match (top_node, parent) {
        (Some(_), Some(parent)) => {
            for child in parent.children() {
                let Some(element) = ElementRef::wrap(child) else {
                    continue;
                };

                let append = if child.id() == top {
                    true
                } else if tracker.get(child.id()).unwrap_or(0.0) >= sibling_threshold {
                    true
                } else if element.value().name() == "p" {
                    lead_in_paragraph(element)
                } else {
                    false
                };

                if append {
                    parts.push(element.html());
                }
            }
        }
        (Some(node), None) => {
            if let Some(element) = ElementRef::wrap(node) {
                parts.push(element.html());
            }
        }
        _ => {}
    }

    format!(
        r#"<div id="unclutter-content"><div id="unclutter-page-1" class="page">{}</div></div>"#,
        parts.join("")
    )
}

/// Short lead-in paragraphs score low but still belong to the article when
/// they read like prose.
fn lead_in_paragraph(element: ElementRef) -> bool {
    let text = dom_utils::inner_text(*element);
    let len = text.chars().count();
    let density = dom_utils::link_density(*element);

    (len > 80 && density < 0.25)
        || (len > 0 && len <= 80 && density == 0.0 && REGEXPS.sentence_period.is_match(&text))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG_TEXT: &str = "The committee met for several hours on Thursday to debate the new \
        proposal, which observers described as the most consequential change in a decade. Each \
        member spoke at length, and the final vote was closer than anyone had predicted.";

    fn grab(html: &str) -> Result<String> {
        let mut document = Html::parse_document(html);
        grab_article(&mut document, ExtractionFlags::default(), &ExtractOptions::default())
    }

    #[test]
    fn extracts_article_over_boilerplate() {
        let html = format!(
            r#"<html><body>
            <div class="ad">Buy now</div>
            <article><p>{LONG_TEXT}</p><p>{LONG_TEXT}</p></article>
            </body></html>"#
        );
        let content = grab(&html).unwrap();
        assert!(content.contains("committee met"));
        assert!(!content.contains("Buy now"));
    }

    #[test]
    fn unlikely_candidates_are_stripped() {
        let html = format!(
            r#"<html><body>
            <div id="sidebar"><p>{LONG_TEXT}</p></div>
            <div id="story"><p>{LONG_TEXT}</p></div>
            </body></html>"#
        );
        let content = grab(&html).unwrap();
        assert_eq!(content.matches("committee met").count(), 1);
    }

    #[test]
    fn hidden_content_is_excluded() {
        let html = format!(
            r#"<html><body><div>
            <p hidden>SECRET {LONG_TEXT}</p>
            <p>{LONG_TEXT}</p>
            </div></body></html>"#
        );
        let content = grab(&html).unwrap();
        assert!(!content.contains("SECRET"));
        assert!(content.contains("committee met"));
    }

    #[test]
    fn no_candidate_when_nothing_scores() {
        let html = "<html><body><div><span>hi</span></div></body></html>";
        let result = grab(html);
        assert!(matches!(result, Err(ExtractError::NoCandidateFound)));
    }

    #[test]
    fn short_lead_in_paragraph_is_kept() {
        let html = format!(
            r#"<html><body><div>
            <p>A short introduction sentence.</p>
            <div id="main-block"><p>{LONG_TEXT}</p><p>{LONG_TEXT}</p></div>
            </div></body></html>"#
        );
        let content = grab(&html).unwrap();
        assert!(content.contains("short introduction"));
    }

    #[test]
    fn siblings_keep_document_order() {
        let html = format!(
            r#"<html><body><div>
            <div id="first"><p>{LONG_TEXT} alpha ending.</p></div>
            <div id="second"><p>{LONG_TEXT} beta ending.</p></div>
            </div></body></html>"#
        );
        let content = grab(&html).unwrap();
        let alpha = content.find("alpha");
        let beta = content.find("beta");
        if let (Some(alpha), Some(beta)) = (alpha, beta) {
            assert!(alpha < beta);
        }
    }
}
