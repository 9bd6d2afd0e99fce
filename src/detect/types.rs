//! Detection result types shared across the pipeline.

use crate::constants::{detection, model};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box normalized to image dimensions.
///
/// `(x, y)` is the top-left corner; all values live in `[0, 1]`. A box that
/// has passed the candidate filter additionally satisfies `x + width <= 1`,
/// `y + height <= 1` and has positive width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBox {
    /// Left edge, relative to image width.
    pub x: f32,
    /// Top edge, relative to image height.
    pub y: f32,
    /// Width, relative to image width.
    pub width: f32,
    /// Height, relative to image height.
    pub height: f32,
}

impl NormalizedBox {
    /// Box covering the whole image.
    pub const FULL: Self = Self {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };

    /// Box area as a fraction of the image area.
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Whether the box lies fully inside the unit square.
    pub fn within_bounds(&self) -> bool {
        self.x >= 0.0 && self.y >= 0.0 && self.x + self.width <= 1.0 && self.y + self.height <= 1.0
    }
}

/// A raw detection candidate produced by the output decoder.
///
/// Candidates are short-lived: the filter consumes them and the suppressor
/// discards the redundant ones before species resolution.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Proposed bounding box.
    pub bbox: NormalizedBox,
    /// Model-estimated probability that the box contains any object,
    /// clamped to `[0, 1]`.
    pub objectness: f32,
    /// Index of the highest-probability class.
    pub class_index: usize,
    /// Probability of that class after normalization.
    pub class_probability: f32,
    /// Combined score: `clamp01(target_class_probability * objectness)`.
    pub confidence: f32,
}

/// Metadata attached to every detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionMetadata {
    /// Version of the model that produced the detection.
    pub model_version: String,
    /// Confidence of the species assignment.
    pub species_confidence: f32,
    /// Timestamp of the detection.
    pub detection_time: DateTime<Utc>,
    /// Raw class label the model emitted.
    pub original_class: String,
}

/// An externally visible detection result. Immutable once constructed; the
/// streaming controller produces smoothed copies rather than mutating these.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    /// Resolved species display name.
    pub species: String,
    /// Detection confidence in `[0, 1]`.
    pub confidence: f32,
    /// Bounding box in normalized coordinates.
    pub bounding_box: NormalizedBox,
    /// Additional metadata.
    pub metadata: DetectionMetadata,
}

impl Detection {
    /// Sentinel detection returned by the batch path when nothing survives
    /// filtering. Downstream consumers always expect at least one result.
    pub fn unknown() -> Self {
        Self {
            species: detection::UNKNOWN_SPECIES.to_string(),
            confidence: 0.0,
            bounding_box: NormalizedBox::FULL,
            metadata: DetectionMetadata {
                model_version: model::SENTINEL_VERSION.to_string(),
                species_confidence: 0.0,
                detection_time: Utc::now(),
                original_class: "unknown".to_string(),
            },
        }
    }

    /// Whether this is the sentinel "nothing found" detection.
    pub fn is_unknown(&self) -> bool {
        self.confidence == 0.0 && self.species == detection::UNKNOWN_SPECIES
    }
}

/// Clamp a score to the valid confidence range.
pub(crate) fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}
