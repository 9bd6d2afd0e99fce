//! Model inference backends.

mod engine;

pub use engine::OrtEngine;

use crate::error::Result;
use crate::image::ImageTensor;

/// Raw tensor produced by a model run, before any decoding.
#[derive(Debug, Clone)]
pub struct RawOutput {
    /// Flat output buffer.
    pub data: Vec<f32>,
    /// Output shape as reported by the runtime.
    pub shape: Vec<i64>,
}

/// A backend that can turn a preprocessed image tensor into raw model output.
///
/// The production implementation is [`OrtEngine`]; tests substitute a fake
/// that returns hand-built tensors.
pub trait InferenceBackend: Send + Sync {
    /// Run a single forward pass.
    fn run(&self, input: &ImageTensor) -> Result<RawOutput>;
}
