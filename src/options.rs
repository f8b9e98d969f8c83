//! Configuration for the extraction engine.
//!
//! Every empirically tuned threshold and decay constant is a named,
//! overridable field here rather than an inlined number. The defaults are
//! the tuned values; changing them without a regression corpus is not
//! recommended.
//!
//! ```rust
//! use unclutter::ExtractOptions;
//!
//! let options = ExtractOptions::builder()
//!     .char_threshold(300)
//!     .keep_classes(true)
//!     .build();
//! ```

use regex::Regex;

/// Options controlling scoring thresholds, retry behavior and cleanup.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Emit diagnostic messages to stderr during extraction.
    pub debug: bool,

    /// Safety limit on elements parsed; 0 disables the check.
    pub max_elems_to_parse: usize,

    /// Minimum extracted text length for an attempt to count as sufficient.
    ///
    /// Below this the orchestrator retries with relaxed flags.
    /// Default: `500`
    pub char_threshold: usize,

    /// Upper bound on extraction attempts across the relaxation sequence.
    pub max_attempts: usize,

    /// Nodes whose own link density exceeds this never propagate score to
    /// their ancestors. Default: `0.33`
    pub link_density_threshold: f64,

    /// A sibling of the top candidate is appended when it scores at least
    /// this fraction of the top score. Default: `0.2`
    pub sibling_score_fraction: f64,

    /// How many ancestors of the best-scored node the selector inspects for
    /// a structurally better container.
    pub ancestor_depth: usize,

    /// An ancestor is preferred only if its score is at least the child's
    /// score times this factor.
    pub ancestor_score_decay: f64,

    /// An ancestor is preferred only when it has at most this many other
    /// scored children.
    pub max_scored_siblings: usize,

    /// Divisors applied to a node's contribution for its parent,
    /// grandparent and great-grandparent.
    pub propagation_decay: [f64; 3],

    /// CSS classes kept in the output when classes are otherwise stripped.
    pub classes_to_preserve: Vec<String>,

    /// Keep all CSS classes in the output HTML.
    pub keep_classes: bool,

    /// Skip JSON-LD structured data during metadata extraction.
    pub disable_json_ld: bool,

    /// Override for the video-host allowlist used when cleaning embeds.
    pub allowed_video_regex: Option<Regex>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            debug: false,
            max_elems_to_parse: 0,
            char_threshold: 500,
            max_attempts: 5,
            link_density_threshold: 0.33,
            sibling_score_fraction: 0.2,
            ancestor_depth: 3,
            ancestor_score_decay: 1.0 / 3.0,
            max_scored_siblings: 2,
            propagation_decay: [1.0, 2.0, 3.0],
            classes_to_preserve: vec!["page".to_string()],
            keep_classes: false,
            disable_json_ld: false,
            allowed_video_regex: None,
        }
    }
}

impl ExtractOptions {
    pub fn builder() -> ExtractOptionsBuilder {
        ExtractOptionsBuilder::default()
    }
}

/// Builder for [`ExtractOptions`].
#[derive(Default)]
pub struct ExtractOptionsBuilder {
    debug: Option<bool>,
    max_elems_to_parse: Option<usize>,
    char_threshold: Option<usize>,
    max_attempts: Option<usize>,
    link_density_threshold: Option<f64>,
    sibling_score_fraction: Option<f64>,
    ancestor_depth: Option<usize>,
    ancestor_score_decay: Option<f64>,
    max_scored_siblings: Option<usize>,
    propagation_decay: Option<[f64; 3]>,
    classes_to_preserve: Option<Vec<String>>,
    keep_classes: Option<bool>,
    disable_json_ld: Option<bool>,
    allowed_video_regex: Option<Regex>,
}

impl ExtractOptionsBuilder {
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    pub fn max_elems_to_parse(mut self, max: usize) -> Self {
        self.max_elems_to_parse = Some(max);
        self
    }

    pub fn char_threshold(mut self, threshold: usize) -> Self {
        self.char_threshold = Some(threshold);
        self
    }

    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    pub fn link_density_threshold(mut self, threshold: f64) -> Self {
        self.link_density_threshold = Some(threshold);
        self
    }

    pub fn sibling_score_fraction(mut self, fraction: f64) -> Self {
        self.sibling_score_fraction = Some(fraction);
        self
    }

    pub fn ancestor_depth(mut self, depth: usize) -> Self {
        self.ancestor_depth = Some(depth);
        self
    }

    pub fn ancestor_score_decay(mut self, decay: f64) -> Self {
        self.ancestor_score_decay = Some(decay);
        self
    }

    pub fn max_scored_siblings(mut self, count: usize) -> Self {
        self.max_scored_siblings = Some(count);
        self
    }

    pub fn propagation_decay(mut self, decay: [f64; 3]) -> Self {
        self.propagation_decay = Some(decay);
        self
    }

    pub fn classes_to_preserve(mut self, classes: Vec<String>) -> Self {
        self.classes_to_preserve = Some(classes);
        self
    }

    pub fn keep_classes(mut self, keep: bool) -> Self {
        self.keep_classes = Some(keep);
        self
    }

    pub fn disable_json_ld(mut self, disable: bool) -> Self {
        self.disable_json_ld = Some(disable);
        self
    }

    pub fn allowed_video_regex(mut self, regex: Regex) -> Self {
        self.allowed_video_regex = Some(regex);
        self
    }

    pub fn build(self) -> ExtractOptions {
        let defaults = ExtractOptions::default();
        ExtractOptions {
            debug: self.debug.unwrap_or(defaults.debug),
            max_elems_to_parse: self
                .max_elems_to_parse
                .unwrap_or(defaults.max_elems_to_parse),
            char_threshold: self.char_threshold.unwrap_or(defaults.char_threshold),
            max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts),
            link_density_threshold: self
                .link_density_threshold
                .unwrap_or(defaults.link_density_threshold),
            sibling_score_fraction: self
                .sibling_score_fraction
                .unwrap_or(defaults.sibling_score_fraction),
            ancestor_depth: self.ancestor_depth.unwrap_or(defaults.ancestor_depth),
            ancestor_score_decay: self
                .ancestor_score_decay
                .unwrap_or(defaults.ancestor_score_decay),
            max_scored_siblings: self
                .max_scored_siblings
                .unwrap_or(defaults.max_scored_siblings),
            propagation_decay: self.propagation_decay.unwrap_or(defaults.propagation_decay),
            classes_to_preserve: self
                .classes_to_preserve
                .unwrap_or(defaults.classes_to_preserve),
            keep_classes: self.keep_classes.unwrap_or(defaults.keep_classes),
            disable_json_ld: self.disable_json_ld.unwrap_or(defaults.disable_json_ld),
            allowed_video_regex: self.allowed_video_regex.or(defaults.allowed_video_regex),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_only_named_fields() {
        let options = ExtractOptions::builder()
            .char_threshold(300)
            .max_attempts(2)
            .build();

        assert_eq!(options.char_threshold, 300);
        assert_eq!(options.max_attempts, 2);
        assert_eq!(options.link_density_threshold, 0.33);
        assert_eq!(options.propagation_decay, [1.0, 2.0, 3.0]);
    }
}
