//! Configuration type definitions.

use crate::constants::{detection, model, stream};
use crate::detect::{BoxConvention, DetectorConfig, OutputLayout};
use crate::error::{Error, Result};
use crate::stream::StreamConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Detection model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Detection pipeline settings.
    #[serde(default)]
    pub detection: DetectionConfig,

    /// Streaming settings.
    #[serde(default)]
    pub stream: StreamSettings,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Detection model settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the ONNX model file.
    pub path: Option<PathBuf>,

    /// Memory layout of the model output tensor.
    pub output_layout: OutputLayout,

    /// Interpretation of the raw box coordinates.
    pub box_convention: BoxConvention,
}

/// Detection pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Confidence threshold for batch analysis, exclusive.
    pub confidence_threshold: f32,

    /// Minimum box area as a fraction of the image, exclusive.
    pub min_area_fraction: f32,

    /// IoU threshold for non-maximum suppression.
    pub iou_threshold: f32,

    /// Apply the contrast/brightness lift before inference.
    pub enhance: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: detection::DEFAULT_CONFIDENCE_THRESHOLD,
            min_area_fraction: detection::MIN_AREA_FRACTION,
            iou_threshold: detection::NMS_IOU_THRESHOLD,
            enhance: false,
        }
    }
}

/// Streaming settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    /// Confidence threshold for the streaming path, exclusive.
    pub confidence_threshold: f32,

    /// Minimum interval between processed frames in milliseconds.
    pub min_process_interval_ms: u64,

    /// Cooldown between auto-captures in milliseconds.
    pub capture_cooldown_ms: u64,

    /// Displayed confidence required to trigger an auto-capture.
    pub capture_confidence: f32,

    /// EMA factor applied to new values when smoothing.
    pub smoothing_factor: f32,

    /// Confidence jump over the displayed detection that replaces it.
    pub replace_confidence_delta: f32,

    /// Displayed detections at or above this survive empty frames.
    pub hold_confidence: f32,

    /// Directory auto-captured frames are written to.
    pub captures_dir: PathBuf,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: detection::STREAM_CONFIDENCE_THRESHOLD,
            min_process_interval_ms: stream::MIN_PROCESS_INTERVAL_MS,
            capture_cooldown_ms: stream::CAPTURE_COOLDOWN_MS,
            capture_confidence: stream::CAPTURE_CONFIDENCE,
            smoothing_factor: stream::SMOOTHING_FACTOR,
            replace_confidence_delta: stream::REPLACE_CONFIDENCE_DELTA,
            hold_confidence: stream::HOLD_CONFIDENCE,
            captures_dir: PathBuf::from(stream::DEFAULT_CAPTURES_DIR),
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print JSON result files.
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl Config {
    /// Build a detector configuration, resolving the model path from the
    /// CLI override or the config file.
    pub fn detector_config(&self, model_override: Option<&PathBuf>) -> Result<DetectorConfig> {
        let model_path = model_override
            .or(self.model.path.as_ref())
            .cloned()
            .ok_or_else(|| Error::ConfigValidation {
                message: "no model path configured; pass --model or set model.path".to_string(),
            })?;

        Ok(DetectorConfig {
            model_path,
            input_size: model::INPUT_SIZE,
            num_classes: model::NUM_CLASSES,
            target_class: model::BIRD_CLASS_INDEX,
            confidence_threshold: self.detection.confidence_threshold,
            min_area_fraction: self.detection.min_area_fraction,
            iou_threshold: self.detection.iou_threshold,
            layout: self.model.output_layout,
            box_convention: self.model.box_convention,
            enhance: self.detection.enhance,
        })
    }

    /// Build a streaming configuration from the stream settings.
    pub fn stream_config(&self) -> StreamConfig {
        StreamConfig {
            confidence_threshold: self.stream.confidence_threshold,
            min_process_interval_ms: self.stream.min_process_interval_ms,
            capture_cooldown_ms: self.stream.capture_cooldown_ms,
            capture_confidence: self.stream.capture_confidence,
            smoothing_factor: self.stream.smoothing_factor,
            replace_confidence_delta: self.stream.replace_confidence_delta,
            hold_confidence: self.stream.hold_confidence,
        }
    }
}
