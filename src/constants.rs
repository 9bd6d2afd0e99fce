//! Application-wide constants.
//!
//! All magic numbers and strings are defined here to ensure consistency
//! and make changes easy to track.

/// Application name used for config directories and user-facing messages.
pub const APP_NAME: &str = "avistar";

/// Model input/output contract constants.
pub mod model {
    /// Square input size required by the detection model.
    pub const INPUT_SIZE: u32 = 640;

    /// Number of input channels (RGB).
    pub const CHANNELS: usize = 3;

    /// Number of classes in the COCO-style vocabulary.
    pub const NUM_CLASSES: usize = 80;

    /// Index of the "bird" class in the COCO vocabulary.
    pub const BIRD_CLASS_INDEX: usize = 14;

    /// Attributes per box (x, y, w, h).
    pub const BOX_ATTRS: usize = 4;

    /// Model version string recorded in detection metadata.
    pub const VERSION: &str = "1.0.0-yolov8-coco";

    /// Model version string recorded on the sentinel detection.
    pub const SENTINEL_VERSION: &str = "1.0.0-yolov8";
}

/// Detection pipeline thresholds.
pub mod detection {
    /// Default confidence threshold for the batch path.
    pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.30;

    /// Default confidence threshold for the streaming path.
    ///
    /// Observed deployments vary between 0.25 and 0.50; this sits in the
    /// middle and is configurable.
    pub const STREAM_CONFIDENCE_THRESHOLD: f32 = 0.35;

    /// IoU threshold above which overlapping boxes are suppressed.
    pub const NMS_IOU_THRESHOLD: f32 = 0.45;

    /// Minimum box area as a fraction of the image (1%).
    pub const MIN_AREA_FRACTION: f32 = 0.01;

    /// Species name used for the sentinel "nothing found" detection.
    pub const UNKNOWN_SPECIES: &str = "Desconhecido";

    /// Display name for a confirmed bird with no species-level match.
    pub const GENERIC_BIRD_NAME: &str = "Ave";

    /// Bird-class probability above which per-candidate debug logging fires.
    pub const DEBUG_LOG_PROBABILITY: f32 = 0.2;
}

/// Species resolver scoring weights.
pub mod species {
    /// Sentinel returned when no species entry matches a label.
    pub const UNKNOWN: &str = "Espécie Desconhecida";

    /// Score for a scientific-name substring match.
    pub const SCIENTIFIC_NAME_SCORE: u32 = 5;

    /// Score for each common-name substring match.
    pub const COMMON_NAME_SCORE: u32 = 3;

    /// Score for each keyword substring match.
    pub const KEYWORD_SCORE: u32 = 1;
}

/// Streaming controller timing and smoothing.
pub mod stream {
    /// Minimum interval between processed frames in milliseconds (~2 fps cap).
    pub const MIN_PROCESS_INTERVAL_MS: u64 = 500;

    /// Cooldown between auto-captures in milliseconds.
    pub const CAPTURE_COOLDOWN_MS: u64 = 10_000;

    /// Confidence required to trigger an auto-capture.
    pub const CAPTURE_CONFIDENCE: f32 = 0.5;

    /// Exponential moving average factor applied to new box coordinates.
    pub const SMOOTHING_FACTOR: f32 = 0.2;

    /// Confidence jump over the prior detection that replaces it outright.
    pub const REPLACE_CONFIDENCE_DELTA: f32 = 0.2;

    /// Below this confidence a new detection never displaces the prior one.
    pub const HOLD_CONFIDENCE: f32 = 0.5;

    /// Interval between scheduler ticks in milliseconds.
    ///
    /// Stands in for a display-refresh callback; the effective processing
    /// rate is governed by `MIN_PROCESS_INTERVAL_MS`, not this value.
    pub const TICK_INTERVAL_MS: u64 = 33;

    /// Default directory for auto-captured frames.
    pub const DEFAULT_CAPTURES_DIR: &str = "captures";
}

/// Extension appended to analyzed images for JSON result files.
pub const RESULTS_EXTENSION: &str = ".avistar.json";

/// Image file extensions accepted as batch inputs.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];
