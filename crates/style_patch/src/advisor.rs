//! Heuristic, tiered style corrections keyed on the difference ratio.

use crate::error::PatchError;
use crate::stylesheet::{PropertyChange, Stylesheet};
use core::fmt::{self, Display, Formatter};
use log::{info, warn};
use serde::Serialize;

/// A single property assignment proposed for the component's root rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Correction {
    pub property_name: String,
    pub property_value: String,
    pub rationale: String,
}

impl Correction {
    pub fn new(property_name: &str, property_value: &str, rationale: &str) -> Self {
        Self {
            property_name: property_name.to_owned(),
            property_value: property_value.to_owned(),
            rationale: rationale.to_owned(),
        }
    }
}

impl Display for Correction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} ({})",
            self.property_name, self.property_value, self.rationale
        )
    }
}

/// Severity band of a difference ratio. Bands are disjoint and checked high to low.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PatchTier {
    /// More than half the overlap differs.
    Structural,
    /// Between 20% and 50%.
    SpacingAlignment,
    /// Between 5% and 20%.
    BoxModel,
    /// 5% or less: nothing automatic left to try.
    ManualReview,
}

impl PatchTier {
    pub fn for_ratio(diff_ratio: f64) -> Self {
        if diff_ratio > 0.50 {
            Self::Structural
        } else if diff_ratio > 0.20 {
            Self::SpacingAlignment
        } else if diff_ratio > 0.05 {
            Self::BoxModel
        } else {
            Self::ManualReview
        }
    }

    /// The fixed corrections attached to this tier.
    pub fn corrections(self) -> Vec<Correction> {
        match self {
            Self::Structural => vec![
                Correction::new("width", "100%", "Major layout difference"),
                Correction::new("max-width", "1200px", "Constrain width"),
            ],
            Self::SpacingAlignment => vec![Correction::new("margin", "0 auto", "Center alignment")],
            Self::BoxModel => vec![Correction::new(
                "box-sizing",
                "border-box",
                "Box model adjustment",
            )],
            Self::ManualReview => Vec::new(),
        }
    }
}

/// Result of applying corrections to stylesheet text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppliedPatch {
    /// The stylesheet after every applicable correction.
    pub stylesheet_text: String,
    /// Corrections that changed the root rule, in order.
    pub applied: Vec<Correction>,
    /// Corrections that had no rule to land in.
    pub skipped: Vec<Correction>,
}

impl AppliedPatch {
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }
}

/// The selector of a component's root rule block.
pub fn root_selector(component_id: &str) -> String {
    format!(".{component_id}")
}

/// Maps difference ratios to corrections and merges them into a stylesheet.
///
/// Holds no state between calls: the same ratio always yields the same list,
/// whatever was tried before.
#[derive(Clone, Copy, Debug, Default)]
pub struct PatchAdvisor;

impl PatchAdvisor {
    pub fn propose(&self, diff_ratio: f64) -> Vec<Correction> {
        let tier = PatchTier::for_ratio(diff_ratio);
        let corrections = tier.corrections();
        if corrections.is_empty() {
            info!(
                "no automatic corrections for {:.2}% difference, manual review recommended",
                diff_ratio * 100.0
            );
        } else {
            info!(
                "{tier:?} tier selected for {:.2}% difference",
                diff_ratio * 100.0
            );
        }
        corrections
    }

    /// Merge `corrections` into the rule for `selector`.
    ///
    /// Existing properties keep their position and take the new value; new
    /// ones are appended to the block. Nothing outside that block changes. If
    /// the block does not exist every correction is skipped, since a block is
    /// never created.
    pub fn apply(&self, corrections: &[Correction], selector: &str, css: &str) -> AppliedPatch {
        let mut sheet = Stylesheet::parse(css);
        let mut applied = Vec::new();
        let mut skipped = Vec::new();
        for correction in corrections {
            let Some(rule) = sheet.rule_mut(selector) else {
                warn!("no `{selector}` block, skipping {correction}");
                skipped.push(correction.clone());
                continue;
            };
            match rule.set_property(&correction.property_name, &correction.property_value) {
                PropertyChange::Replaced { previous } => info!(
                    "{selector}: {} {previous} -> {}",
                    correction.property_name, correction.property_value
                ),
                PropertyChange::Inserted => info!("{selector}: added {correction}"),
            }
            applied.push(correction.clone());
        }
        AppliedPatch {
            stylesheet_text: sheet.to_css(),
            applied,
            skipped,
        }
    }

    /// Propose for `diff_ratio` and apply in one step.
    ///
    /// # Errors
    ///
    /// Returns `PatchError::NoCorrections` when the ratio falls in the manual
    /// review band and `PatchError::RootBlockMissing` when nothing could be
    /// applied.
    pub fn patch(&self, diff_ratio: f64, selector: &str, css: &str) -> Result<AppliedPatch, PatchError> {
        let corrections = self.propose(diff_ratio);
        if corrections.is_empty() {
            return Err(PatchError::NoCorrections { diff_ratio });
        }
        let patch = self.apply(&corrections, selector, css);
        if patch.is_empty() {
            return Err(PatchError::RootBlockMissing {
                selector: selector.to_owned(),
            });
        }
        Ok(patch)
    }
}
