//! Bird detection pipeline: preprocess, infer, decode, filter, suppress,
//! resolve.

mod decode;
mod filter;
mod labels;
mod nms;
mod types;

pub use decode::{BoxConvention, OutputLayout, decode_output, validate_output_shape};
pub use filter::{FilterThresholds, filter_candidates};
pub use labels::{COCO_LABELS, class_name};
pub use nms::{iou, suppress};
pub use types::{Candidate, Detection, DetectionMetadata, NormalizedBox};

use crate::constants::{detection, model, species};
use crate::error::Result;
use crate::image::preprocess_image;
use crate::inference::{InferenceBackend, OrtEngine};
use crate::species::resolve_species;
use chrono::Utc;
use image::DynamicImage;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::{debug, info, warn};

/// Configuration for a [`BirdDetector`].
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Path to the ONNX model file.
    pub model_path: PathBuf,
    /// Square model input size in pixels.
    pub input_size: u32,
    /// Number of classes in the model vocabulary.
    pub num_classes: usize,
    /// Class index the pipeline detects.
    pub target_class: usize,
    /// Batch confidence threshold, exclusive.
    pub confidence_threshold: f32,
    /// Minimum box area as a fraction of the image, exclusive.
    pub min_area_fraction: f32,
    /// IoU threshold for non-maximum suppression.
    pub iou_threshold: f32,
    /// Memory layout of the model output tensor.
    pub layout: OutputLayout,
    /// Interpretation of the raw box coordinates.
    pub box_convention: BoxConvention,
    /// Apply the contrast/brightness lift before inference.
    pub enhance: bool,
}

impl DetectorConfig {
    /// Defaults for everything except the model path.
    pub fn new(model_path: PathBuf) -> Self {
        Self {
            model_path,
            input_size: model::INPUT_SIZE,
            num_classes: model::NUM_CLASSES,
            target_class: model::BIRD_CLASS_INDEX,
            confidence_threshold: detection::DEFAULT_CONFIDENCE_THRESHOLD,
            min_area_fraction: detection::MIN_AREA_FRACTION,
            iou_threshold: detection::NMS_IOU_THRESHOLD,
            layout: OutputLayout::default(),
            box_convention: BoxConvention::default(),
            enhance: false,
        }
    }
}

/// Bird detector running the full image-to-detections pipeline.
pub struct BirdDetector {
    backend: Box<dyn InferenceBackend>,
    config: DetectorConfig,
}

impl BirdDetector {
    /// Create a detector backed by the ONNX runtime.
    pub fn new(config: DetectorConfig) -> Result<Self> {
        let engine = OrtEngine::load(&config.model_path)?;
        Ok(Self {
            backend: Box::new(engine),
            config,
        })
    }

    /// Create a detector with an arbitrary backend.
    pub fn with_backend(backend: Box<dyn InferenceBackend>, config: DetectorConfig) -> Self {
        Self { backend, config }
    }

    /// Active configuration.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Detect birds in a single frame.
    ///
    /// Returns detections ordered by descending confidence; the list may be
    /// empty. `threshold` overrides the configured confidence floor, letting
    /// the streaming path run with a different sensitivity than batch jobs.
    pub fn detect_frame(&self, image: &DynamicImage, threshold: f32) -> Result<Vec<Detection>> {
        let tensor = preprocess_image(image, self.config.input_size, self.config.enhance);
        let output = self.backend.run(&tensor)?;

        let candidates = decode_output(
            &output,
            self.config.layout,
            self.config.box_convention,
            self.config.num_classes,
            self.config.target_class,
        )?;
        let decoded = candidates.len();

        let filtered = filter_candidates(
            candidates,
            self.config.target_class,
            FilterThresholds {
                confidence: threshold,
                min_area_fraction: self.config.min_area_fraction,
            },
        );
        let passed = filtered.len();

        let kept = suppress(filtered, self.config.iou_threshold);
        debug!(
            "pipeline: {decoded} decoded, {passed} passed filter, {} after suppression",
            kept.len()
        );

        if kept.is_empty() {
            info!(
                "no candidate met the criteria: confidence > {:.2}, area > {:.1}% of image, box within bounds",
                threshold,
                self.config.min_area_fraction * 100.0
            );
        }

        Ok(kept.into_iter().map(|c| self.to_detection(&c)).collect())
    }

    /// Detect birds in a single image, always returning at least one result.
    ///
    /// When nothing passes the pipeline the list holds the unknown-species
    /// sentinel. An uninterpretable output tensor also degrades to the
    /// sentinel rather than failing the whole batch; genuine inference
    /// failures propagate.
    pub fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>> {
        let detections = match self.detect_frame(image, self.config.confidence_threshold) {
            Ok(detections) => detections,
            Err(e @ crate::error::Error::InvalidOutputShape { .. }) => {
                warn!("{e}; reporting unknown species");
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        if detections.is_empty() {
            Ok(vec![Detection::unknown()])
        } else {
            Ok(detections)
        }
    }

    fn to_detection(&self, candidate: &Candidate) -> Detection {
        let label = class_name(candidate.class_index);
        let resolved = resolve_species(label);
        // The class vocabulary only knows the generic class, so the resolver
        // usually has nothing to go on; fall back to the generic display name
        // for a real detection instead of the unknown sentinel.
        let species_name = if resolved == species::UNKNOWN {
            detection::GENERIC_BIRD_NAME
        } else {
            resolved
        };

        Detection {
            species: species_name.to_string(),
            confidence: candidate.confidence,
            bounding_box: candidate.bbox,
            metadata: DetectionMetadata {
                model_version: model::VERSION.to_string(),
                species_confidence: candidate.class_probability,
                detection_time: Utc::now(),
                original_class: label.to_string(),
            },
        }
    }
}

static SHARED: OnceLock<Arc<BirdDetector>> = OnceLock::new();
static SHARED_INIT: Mutex<()> = Mutex::new(());

/// Process-wide detector handle, loading the model exactly once.
///
/// Later calls return the existing instance regardless of `config`; the
/// model stays resident for the lifetime of the process.
pub fn shared_detector(config: &DetectorConfig) -> Result<Arc<BirdDetector>> {
    if let Some(detector) = SHARED.get() {
        return Ok(Arc::clone(detector));
    }

    let _guard = SHARED_INIT.lock().map_err(|_| crate::error::Error::Internal {
        message: "detector init mutex poisoned".to_string(),
    })?;

    // Re-check under the lock so concurrent first calls load the model once.
    if let Some(detector) = SHARED.get() {
        return Ok(Arc::clone(detector));
    }

    let detector = Arc::new(BirdDetector::new(config.clone())?);
    Ok(Arc::clone(SHARED.get_or_init(|| detector)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::image::ImageTensor;
    use crate::inference::RawOutput;

    /// Backend returning a fixed tensor, bypassing any model file.
    struct FixedBackend {
        output: RawOutput,
    }

    impl InferenceBackend for FixedBackend {
        fn run(&self, _input: &ImageTensor) -> Result<RawOutput> {
            Ok(self.output.clone())
        }
    }

    fn test_config() -> DetectorConfig {
        DetectorConfig {
            input_size: 8,
            ..DetectorConfig::new(PathBuf::from("unused.onnx"))
        }
    }

    fn test_image() -> DynamicImage {
        DynamicImage::ImageRgb8(image::RgbImage::new(8, 8))
    }

    /// Box-major output with one strong bird box and all other rows empty.
    fn bird_output(confidence_logit: f32) -> RawOutput {
        let row_len = model::BOX_ATTRS + 1 + model::NUM_CLASSES;
        let mut data = vec![0.0f32; 2 * row_len];
        // Row 0: bird at (0.2, 0.2) size 0.4x0.4, objectness 1.0.
        data[0] = 0.2;
        data[1] = 0.2;
        data[2] = 0.4;
        data[3] = 0.4;
        data[4] = 1.0;
        for c in 0..model::NUM_CLASSES {
            data[model::BOX_ATTRS + 1 + c] = -10.0;
        }
        data[model::BOX_ATTRS + 1 + model::BIRD_CLASS_INDEX] = confidence_logit;
        // Row 1: all zeros; softmax spreads it flat and it fails the filter.
        RawOutput {
            data,
            shape: vec![1, 2, row_len as i64],
        }
    }

    #[test]
    fn test_detect_frame_finds_bird() {
        let detector = BirdDetector::with_backend(
            Box::new(FixedBackend {
                output: bird_output(10.0),
            }),
            test_config(),
        );

        let detections = detector.detect_frame(&test_image(), 0.30).unwrap();
        assert_eq!(detections.len(), 1);
        let d = &detections[0];
        assert_eq!(d.species, detection::GENERIC_BIRD_NAME);
        assert_eq!(d.metadata.original_class, "bird");
        assert_eq!(d.metadata.model_version, model::VERSION);
        assert!(d.confidence > 0.9);
        assert!((d.bounding_box.x - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_detect_frame_may_be_empty() {
        // Flat logits never clear the confidence floor.
        let row_len = (model::BOX_ATTRS + 1 + model::NUM_CLASSES) as i64;
        let detector = BirdDetector::with_backend(
            Box::new(FixedBackend {
                output: RawOutput {
                    data: vec![0.0; row_len as usize],
                    shape: vec![1, 1, row_len],
                },
            }),
            test_config(),
        );

        let detections = detector.detect_frame(&test_image(), 0.30).unwrap();
        assert!(detections.is_empty());
    }

    #[test]
    fn test_detect_substitutes_sentinel() {
        let row_len = (model::BOX_ATTRS + 1 + model::NUM_CLASSES) as i64;
        let detector = BirdDetector::with_backend(
            Box::new(FixedBackend {
                output: RawOutput {
                    data: vec![0.0; row_len as usize],
                    shape: vec![1, 1, row_len],
                },
            }),
            test_config(),
        );

        let detections = detector.detect(&test_image()).unwrap();
        assert_eq!(detections.len(), 1);
        assert!(detections[0].is_unknown());
    }

    #[test]
    fn test_detect_degrades_on_bad_shape() {
        let detector = BirdDetector::with_backend(
            Box::new(FixedBackend {
                output: RawOutput {
                    data: vec![0.0; 10],
                    shape: vec![1, 10],
                },
            }),
            test_config(),
        );

        let detections = detector.detect(&test_image()).unwrap();
        assert_eq!(detections.len(), 1);
        assert!(detections[0].is_unknown());
    }

    #[test]
    fn test_detect_frame_rejects_bad_shape() {
        let detector = BirdDetector::with_backend(
            Box::new(FixedBackend {
                output: RawOutput {
                    data: vec![0.0; 10],
                    shape: vec![1, 10],
                },
            }),
            test_config(),
        );

        let err = detector.detect_frame(&test_image(), 0.30).unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::InvalidOutputShape { .. }
        ));
    }
}
