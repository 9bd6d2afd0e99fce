//! Confidence, size and bounds filtering of raw candidates.

use crate::detect::types::Candidate;

/// Thresholds applied by the candidate filter.
///
/// The confidence threshold is tuned independently per execution context
/// (batch vs streaming); the area floor rejects spurious tiny boxes.
#[derive(Debug, Clone, Copy)]
pub struct FilterThresholds {
    /// Minimum combined confidence, exclusive.
    pub confidence: f32,
    /// Minimum box area as a fraction of the image, exclusive.
    pub min_area_fraction: f32,
}

/// Keep only candidates whose predicted class is `target_class` and that
/// meet the confidence, size and bounds criteria.
///
/// Total function: non-conforming candidates are simply omitted, never an
/// error. The output is always a subset of the input.
pub fn filter_candidates(
    candidates: Vec<Candidate>,
    target_class: usize,
    thresholds: FilterThresholds,
) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter(|c| {
            c.class_index == target_class
                && c.confidence > thresholds.confidence
                && c.bbox.area() > thresholds.min_area_fraction
                && c.bbox.within_bounds()
        })
        .collect()
}
