//! Image-to-tensor preprocessing for the detection model.

use crate::constants::model::CHANNELS;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage, imageops};

/// A planar float tensor ready for inference.
///
/// Shape is `[1, 3, S, S]` (channel-major), samples normalized to `[0, 1]`.
/// Owned by the pipeline stage that produced it; stages never mutate a
/// tensor across boundaries.
#[derive(Debug, Clone)]
pub struct ImageTensor {
    /// Flat buffer, channel-major.
    pub data: Vec<f32>,
    /// Tensor shape: `[1, channels, height, width]`.
    pub shape: [usize; 4],
}

/// Convert an arbitrary image into the model's fixed input tensor.
///
/// Letterboxes to `input_size` preserving aspect ratio with black padding,
/// drops any alpha channel, converts interleaved RGB to planar channel-major
/// and normalizes by 255. When `enhance` is set, a mild contrast/brightness
/// lift is applied first; it is a quality heuristic, not required for
/// correctness.
pub fn preprocess_image(image: &DynamicImage, input_size: u32, enhance: bool) -> ImageTensor {
    let prepared = if enhance {
        enhance_image(image)
    } else {
        image.clone()
    };

    let letterboxed = letterbox(&prepared, input_size);
    to_planar_tensor(&letterboxed)
}

/// Mild contrast and brightness lift to help edge response on dull frames.
fn enhance_image(image: &DynamicImage) -> DynamicImage {
    image.adjust_contrast(10.0).brighten(12)
}

/// Resize preserving aspect ratio, then center on a black square canvas.
fn letterbox(image: &DynamicImage, size: u32) -> RgbImage {
    // DynamicImage::resize fits within the bounds while keeping aspect.
    let resized = image.resize(size, size, FilterType::Triangle).to_rgb8();

    let mut canvas = RgbImage::new(size, size);
    let offset_x = i64::from((size - resized.width()) / 2);
    let offset_y = i64::from((size - resized.height()) / 2);
    imageops::overlay(&mut canvas, &resized, offset_x, offset_y);
    canvas
}

/// Interleaved RGB bytes to planar channel-major floats in `[0, 1]`.
fn to_planar_tensor(image: &RgbImage) -> ImageTensor {
    let (width, height) = (image.width() as usize, image.height() as usize);
    let plane = width * height;
    let raw = image.as_raw();

    let mut data = vec![0.0f32; CHANNELS * plane];
    for idx in 0..plane {
        for c in 0..CHANNELS {
            data[c * plane + idx] = f32::from(raw[idx * CHANNELS + c]) / 255.0;
        }
    }

    ImageTensor {
        data,
        shape: [1, CHANNELS, height, width],
    }
}
