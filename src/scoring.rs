//! Content scoring: the ScoreTracker side table and the node scorer.
//!
//! Scores live in a map keyed by the tree's stable node ids, never in
//! attributes that could leak into output. One tracker exists per attempt
//! and is dropped with it; nothing scored outlives the document.

use crate::constants::{
    TagCategory, CLASS_WEIGHT, MIN_SCORED_TEXT_LEN, REGEXPS, TAGS_TO_SCORE, TEXT_LENGTH_BONUS_CAP,
};
use crate::dom_utils;
use crate::flags::ExtractionFlags;
use crate::options::ExtractOptions;
use ego_tree::{NodeId, NodeRef};
use scraper::node::Node;
use scraper::{ElementRef, Html};
use std::collections::HashMap;

/// Accumulated score for one node.
#[derive(Debug, Clone, Copy)]
pub struct ScoreEntry {
    pub content_score: f64,
    /// Whether the entry has received its tag/class base score.
    pub initialized: bool,
}

/// Out-of-band node-to-score mapping for a single extraction attempt.
#[derive(Debug, Default)]
pub struct ScoreTracker {
    scores: HashMap<NodeId, ScoreEntry>,
}

impl ScoreTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry for a node, seeding it with `base` on first touch.
    fn ensure(&mut self, id: NodeId, base: f64) -> &mut ScoreEntry {
        let entry = self.scores.entry(id).or_insert(ScoreEntry {
            content_score: 0.0,
            initialized: false,
        });
        if !entry.initialized {
            entry.content_score = base;
            entry.initialized = true;
        }
        entry
    }

    pub fn get(&self, id: NodeId) -> Option<f64> {
        self.scores.get(&id).map(|entry| entry.content_score)
    }

    pub fn is_scored(&self, id: NodeId) -> bool {
        self.scores.contains_key(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }
}

/// Class/id keyword weight: +25 for positive matches, -25 for negative,
/// each attribute counted at most once.
pub fn class_weight(element: &ElementRef) -> f64 {
    let mut weight = 0.0;

    if let Some(class) = element.value().attr("class").filter(|c| !c.is_empty()) {
        if REGEXPS.positive.is_match(class) {
            weight += CLASS_WEIGHT;
        }
        if REGEXPS.negative.is_match(class) {
            weight -= CLASS_WEIGHT;
        }
    }

    if let Some(id) = element.value().attr("id").filter(|i| !i.is_empty()) {
        if REGEXPS.positive.is_match(id) {
            weight += CLASS_WEIGHT;
        }
        if REGEXPS.negative.is_match(id) {
            weight -= CLASS_WEIGHT;
        }
    }

    weight
}

/// Score every paragraph-like node in the document and propagate a
/// decaying share of each contribution to its ancestors.
///
/// Pure function of the document and this attempt's flags: repeated calls
/// yield identical trackers, and candidate selection later walks the tree
/// in document order rather than map order.
pub fn score_document(
    document: &Html,
    flags: ExtractionFlags,
    options: &ExtractOptions,
) -> ScoreTracker {
    let mut tracker = ScoreTracker::new();
    let Some(body) = dom_utils::body_node(document) else {
        return tracker;
    };

    for node in body.descendants() {
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };
        if !is_scorable(&element) {
            continue;
        }

        let base = node_base_score(&element, flags);
        tracker.ensure(node.id(), base);

        let text = dom_utils::inner_text(node);
        if text.chars().count() < MIN_SCORED_TEXT_LEN {
            continue;
        }

        let density = dom_utils::link_density(node);
        let mut contribution = 1.0 + ((text.chars().count() as f64) / 100.0).min(TEXT_LENGTH_BONUS_CAP);
        contribution *= 1.0 - density;
        tracker.ensure(node.id(), base).content_score += contribution;

        // Heavily linked nodes keep their own score but poison nothing
        // above them.
        if density > options.link_density_threshold {
            continue;
        }

        propagate(&mut tracker, node, contribution, flags, options);
    }

    tracker
}

fn propagate(
    tracker: &mut ScoreTracker,
    node: NodeRef<'_, Node>,
    contribution: f64,
    flags: ExtractionFlags,
    options: &ExtractOptions,
) {
    let mut ancestor = node.parent();
    for divider in options.propagation_decay {
        let Some(current) = ancestor else {
            break;
        };
        let Some(element) = ElementRef::wrap(current) else {
            break;
        };
        if matches!(element.value().name(), "body" | "html") {
            break;
        }

        let base = node_base_score(&element, flags);
        tracker.ensure(current.id(), base).content_score += contribution / divider;
        ancestor = current.parent();
    }
}

fn node_base_score(element: &ElementRef, flags: ExtractionFlags) -> f64 {
    let mut base = TagCategory::initial_score(element.value().name());
    if flags.contains(ExtractionFlags::WEIGHT_CLASSES) {
        base += class_weight(element);
    }
    base
}

/// Whether an element's own text should seed a score: the block-text tags
/// always do, generic containers only when they hold direct text.
fn is_scorable(element: &ElementRef) -> bool {
    let tag = element.value().name();
    if !TAGS_TO_SCORE.contains(&tag) {
        return false;
    }
    if matches!(tag, "div" | "section") && !has_direct_text(element) {
        return false;
    }
    dom_utils::is_probably_visible(element)
}

fn has_direct_text(element: &ElementRef) -> bool {
    element
        .children()
        .any(|child| matches!(child.value(), Node::Text(text) if !text.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Selector;

    const LONG_TEXT: &str = "This paragraph carries enough characters to contribute meaningfully \
        to the score of its ancestors, well past the minimum text length.";

    fn score(html: &str) -> (Html, ScoreTracker) {
        let document = Html::parse_document(html);
        let tracker = score_document(&document, ExtractionFlags::default(), &ExtractOptions::default());
        (document, tracker)
    }

    fn node_id(document: &Html, selector: &str) -> NodeId {
        let sel = Selector::parse(selector).unwrap();
        document.select(&sel).next().unwrap().id()
    }

    #[test]
    fn paragraph_text_scores_its_container() {
        let html = format!(
            r#"<html><body><div id="wrapper"><p>{LONG_TEXT}</p></div></body></html>"#
        );
        let (document, tracker) = score(&html);

        let p = node_id(&document, "p");
        let wrapper = node_id(&document, "#wrapper");
        assert!(tracker.get(p).unwrap() > 5.0);
        assert!(tracker.get(wrapper).unwrap() > 0.0);
    }

    #[test]
    fn scoring_is_deterministic() {
        let html = format!(
            "<html><body><div><p>{LONG_TEXT}</p><p>{LONG_TEXT}</p></div><article><p>{LONG_TEXT}</p></article></body></html>"
        );
        let document = Html::parse_document(&html);
        let options = ExtractOptions::default();

        let first = score_document(&document, ExtractionFlags::default(), &options);
        let second = score_document(&document, ExtractionFlags::default(), &options);

        assert_eq!(first.len(), second.len());
        for node in document.tree.root().descendants() {
            assert_eq!(first.get(node.id()), second.get(node.id()));
        }
    }

    #[test]
    fn class_weight_applies_once_per_attribute() {
        let document = Html::parse_document(
            r#"<html><body><div class="article content main" id="comment">x</div></body></html>"#,
        );
        let sel = Selector::parse("div").unwrap();
        let element = document.select(&sel).next().unwrap();
        // Three positive class keywords still only count once; the negative
        // id subtracts once.
        assert_eq!(class_weight(&element), 0.0);
    }

    #[test]
    fn hidden_nodes_are_never_scored() {
        let html = format!(
            r#"<html><body><p style="display:none">{LONG_TEXT}</p><p>{LONG_TEXT}</p></body></html>"#
        );
        let (document, tracker) = score(&html);

        let sel = Selector::parse("p").unwrap();
        let mut paragraphs = document.select(&sel);
        let hidden = paragraphs.next().unwrap();
        let visible = paragraphs.next().unwrap();

        assert!(tracker.get(hidden.id()).is_none());
        assert!(tracker.get(visible.id()).is_some());
    }

    #[test]
    fn link_heavy_nodes_do_not_lift_ancestors() {
        let linked = format!(
            r#"<html><body><div id="nav"><p><a href="/a">{LONG_TEXT}</a></p></div></body></html>"#
        );
        let (document, tracker) = score(&linked);
        let nav = node_id(&document, "#nav");
        // The all-links paragraph contributes nothing upward.
        let nav_score = tracker.get(nav).unwrap_or(0.0);
        assert!(nav_score <= 2.0, "nav scored {nav_score}");
    }

    #[test]
    fn weight_classes_flag_controls_keyword_weight() {
        let html = format!(
            r#"<html><body><div class="sidebar"><p>{LONG_TEXT}</p></div></body></html>"#
        );
        let document = Html::parse_document(&html);
        let options = ExtractOptions::default();

        let weighted = score_document(&document, ExtractionFlags::default(), &options);
        let unweighted = score_document(
            &document,
            ExtractionFlags::default() - ExtractionFlags::WEIGHT_CLASSES,
            &options,
        );

        let sel = Selector::parse("div").unwrap();
        let div = document.select(&sel).next().unwrap().id();
        assert!(weighted.get(div).unwrap() < unweighted.get(div).unwrap());
    }
}
