//! ONNX Runtime inference engine.

use crate::error::{Error, Result};
use crate::image::ImageTensor;
use crate::inference::{InferenceBackend, RawOutput};
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::Tensor;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

/// Output tensor names probed in order; different model exports disagree.
const OUTPUT_NAMES: &[&str] = &["output0", "output"];

/// ONNX Runtime backend for the detection model.
///
/// `Session::run` needs `&mut self`, so the session sits behind a mutex and
/// the engine itself can be shared across threads.
pub struct OrtEngine {
    session: Mutex<Session>,
    model_path: PathBuf,
}

impl OrtEngine {
    /// Load the ONNX model from disk.
    pub fn load(model_path: &Path) -> Result<Self> {
        if !model_path.is_file() {
            return Err(Error::ModelFileNotFound {
                path: model_path.to_path_buf(),
            });
        }

        info!("Loading detection model from {}", model_path.display());

        let session = build_session(model_path).map_err(|e| Error::ModelLoad {
            reason: e.to_string(),
        })?;

        debug!("Model session ready");

        Ok(Self {
            session: Mutex::new(session),
            model_path: model_path.to_path_buf(),
        })
    }

    /// Path the model was loaded from.
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

impl InferenceBackend for OrtEngine {
    fn run(&self, input: &ImageTensor) -> Result<RawOutput> {
        let tensor = Tensor::from_array((input.shape, input.data.clone().into_boxed_slice()))
            .map_err(|e| Error::Inference {
                reason: format!("failed to build input tensor: {e}"),
            })?;

        let mut session = self.session.lock().map_err(|_| Error::Internal {
            message: "inference session mutex poisoned".to_string(),
        })?;

        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| Error::Inference {
                reason: e.to_string(),
            })?;

        let extract_err = |e: ort::Error| Error::Inference {
            reason: format!("failed to extract output tensor: {e}"),
        };

        // Try the usual export names first, then fall back to whatever the
        // model calls its sole output.
        match OUTPUT_NAMES.iter().find_map(|name| outputs.get(*name)) {
            Some(value) => {
                let (shape, data) = value.try_extract_tensor::<f32>().map_err(extract_err)?;
                Ok(RawOutput {
                    data: data.to_vec(),
                    shape: shape.to_vec(),
                })
            }
            None => {
                let (_, value) = outputs.iter().next().ok_or_else(|| Error::Inference {
                    reason: "model produced no outputs".to_string(),
                })?;
                let (shape, data) = value.try_extract_tensor::<f32>().map_err(extract_err)?;
                Ok(RawOutput {
                    data: data.to_vec(),
                    shape: shape.to_vec(),
                })
            }
        }
    }
}

fn build_session(model_path: &Path) -> ort::Result<Session> {
    Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(4)?
        .commit_from_file(model_path)
}
