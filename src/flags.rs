//! Heuristic toggles for a single extraction attempt.
//!
//! Each retry derives a new, strictly more permissive flag set from the
//! previous one instead of mutating it, which keeps the relaxation order
//! trivially testable.

use bitflags::bitflags;

bitflags! {
    /// Which heuristics are active for one extraction attempt.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ExtractionFlags: u32 {
        /// Remove nodes whose class/id match boilerplate keywords before scoring.
        const STRIP_UNLIKELYS = 0b001;
        /// Allow conditional removal of tables, lists, forms and divs during cleanup.
        const CLEAN_CONDITIONALLY = 0b010;
        /// Apply the +/-25 class and id keyword weight while scoring.
        const WEIGHT_CLASSES = 0b100;
    }
}

impl Default for ExtractionFlags {
    fn default() -> Self {
        Self::all()
    }
}

impl ExtractionFlags {
    /// Derive the flag set for the next attempt.
    ///
    /// Relaxation happens in a fixed order: unlikely-candidate stripping is
    /// dropped first, conditional cleaning second, class/id weighting last.
    /// Returns `None` once every heuristic has been disabled.
    pub fn relaxed(self) -> Option<Self> {
        if self.contains(Self::STRIP_UNLIKELYS) {
            Some(self - Self::STRIP_UNLIKELYS)
        } else if self.contains(Self::CLEAN_CONDITIONALLY) {
            Some(self - Self::CLEAN_CONDITIONALLY)
        } else if self.contains(Self::WEIGHT_CLASSES) {
            Some(self - Self::WEIGHT_CLASSES)
        } else {
            None
        }
    }
}
