//! Raw model-output decoding into detection candidates.
//!
//! The model family ships in two export variants: a box-major layout
//! `[1, N, 4+1+C]` where each box row carries bbox, objectness and C class
//! logits, and a channel-major layout `[1, 4+C, N]` where every attribute
//! forms a contiguous run of length N and objectness is implicit. The shape
//! is validated against the configured contract before any value is read.

use crate::constants::detection::DEBUG_LOG_PROBABILITY;
use crate::constants::model::BOX_ATTRS;
use crate::detect::labels::class_name;
use crate::detect::types::{Candidate, NormalizedBox, clamp01};
use crate::error::{Error, Result};
use crate::inference::RawOutput;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Memory layout of the model output tensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputLayout {
    /// `[1, N, 4+1+C]`: each box is a contiguous attribute row.
    #[default]
    BoxMajor,
    /// `[1, 4+C, N]`: each attribute is a contiguous run across boxes.
    /// No objectness row; objectness is treated as 1.0.
    ChannelMajor,
}

impl std::fmt::Display for OutputLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BoxMajor => write!(f, "box-major"),
            Self::ChannelMajor => write!(f, "channel-major"),
        }
    }
}

impl std::str::FromStr for OutputLayout {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "box-major" | "boxmajor" => Ok(Self::BoxMajor),
            "channel-major" | "channelmajor" => Ok(Self::ChannelMajor),
            other => Err(format!("unknown output layout: {other}")),
        }
    }
}

/// Interpretation of the 4 raw box values.
///
/// The convention is not documented in every model export, so it is a
/// configuration knob rather than a constant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoxConvention {
    /// `(x, y)` is the top-left corner.
    #[default]
    TopLeft,
    /// `(x, y)` is the box center.
    Center,
}

impl std::str::FromStr for BoxConvention {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "top-left" | "topleft" | "corner" => Ok(Self::TopLeft),
            "center" | "centre" => Ok(Self::Center),
            other => Err(format!("unknown box convention: {other}")),
        }
    }
}

/// Validate an output tensor shape against the configured layout.
///
/// Returns the number of boxes. Fails fast with `InvalidOutputShape` rather
/// than silently misinterpreting data.
pub fn validate_output_shape(
    shape: &[i64],
    layout: OutputLayout,
    num_classes: usize,
) -> Result<usize> {
    let expected = match layout {
        OutputLayout::BoxMajor => format!("[1, N, {}]", BOX_ATTRS + 1 + num_classes),
        OutputLayout::ChannelMajor => format!("[1, {}, N]", BOX_ATTRS + num_classes),
    };
    let mismatch = || Error::InvalidOutputShape {
        expected: expected.clone(),
        got: format!("{shape:?}"),
    };

    if shape.len() != 3 || shape[0] != 1 || shape.iter().any(|&d| d <= 0) {
        return Err(mismatch());
    }

    #[allow(clippy::cast_sign_loss)]
    let (dim1, dim2) = (shape[1] as usize, shape[2] as usize);

    match layout {
        OutputLayout::BoxMajor if dim2 == BOX_ATTRS + 1 + num_classes => Ok(dim1),
        OutputLayout::ChannelMajor if dim1 == BOX_ATTRS + num_classes => Ok(dim2),
        _ => Err(mismatch()),
    }
}

/// Decode a raw output tensor into candidates, in box-index order.
pub fn decode_output(
    output: &RawOutput,
    layout: OutputLayout,
    convention: BoxConvention,
    num_classes: usize,
    target_class: usize,
) -> Result<Vec<Candidate>> {
    let num_boxes = validate_output_shape(&output.shape, layout, num_classes)?;

    let expected_len = match layout {
        OutputLayout::BoxMajor => num_boxes * (BOX_ATTRS + 1 + num_classes),
        OutputLayout::ChannelMajor => num_boxes * (BOX_ATTRS + num_classes),
    };
    if output.data.len() != expected_len {
        return Err(Error::InvalidOutputShape {
            expected: format!("{expected_len} elements"),
            got: format!("{} elements", output.data.len()),
        });
    }

    let mut candidates = Vec::with_capacity(num_boxes.min(1024));
    let mut scores = vec![0.0f32; num_classes];

    for i in 0..num_boxes {
        let (raw_box, objectness) = match layout {
            OutputLayout::BoxMajor => {
                let offset = i * (BOX_ATTRS + 1 + num_classes);
                let raw: [f32; 4] = [
                    output.data[offset],
                    output.data[offset + 1],
                    output.data[offset + 2],
                    output.data[offset + 3],
                ];
                scores.copy_from_slice(
                    &output.data[offset + BOX_ATTRS + 1..offset + BOX_ATTRS + 1 + num_classes],
                );
                (raw, clamp01(output.data[offset + BOX_ATTRS]))
            }
            OutputLayout::ChannelMajor => {
                let raw: [f32; 4] = [
                    output.data[i],
                    output.data[num_boxes + i],
                    output.data[2 * num_boxes + i],
                    output.data[3 * num_boxes + i],
                ];
                for (c, slot) in scores.iter_mut().enumerate() {
                    *slot = output.data[(BOX_ATTRS + c) * num_boxes + i];
                }
                (raw, 1.0)
            }
        };

        normalize_scores(&mut scores);

        let (class_index, class_probability) = argmax(&scores);
        let target_probability = scores.get(target_class).copied().unwrap_or(0.0);
        let confidence = clamp01(target_probability * objectness);

        if target_probability > DEBUG_LOG_PROBABILITY {
            log_top_classes(&scores, objectness);
        }

        candidates.push(Candidate {
            bbox: to_normalized_box(raw_box, convention),
            objectness,
            class_index,
            class_probability,
            confidence,
        });
    }

    Ok(candidates)
}

fn to_normalized_box(raw: [f32; 4], convention: BoxConvention) -> NormalizedBox {
    let [a, b, w, h] = raw;
    let (x, y) = match convention {
        BoxConvention::TopLeft => (a, b),
        BoxConvention::Center => (a - w / 2.0, b - h / 2.0),
    };
    NormalizedBox {
        x,
        y,
        width: w,
        height: h,
    }
}

/// Convert raw class scores to probabilities in place.
///
/// Logit outputs go through a numerically stable softmax; scores that
/// already form a probability distribution are left untouched.
pub fn normalize_scores(scores: &mut [f32]) {
    if scores.is_empty() || is_probability_distribution(scores) {
        return;
    }
    softmax(scores);
}

fn is_probability_distribution(scores: &[f32]) -> bool {
    let sum: f32 = scores.iter().sum();
    scores.iter().all(|&s| (0.0..=1.0).contains(&s)) && (sum - 1.0).abs() < 1e-3
}

/// Numerically stable softmax: subtract the max before exponentiating.
pub fn softmax(scores: &mut [f32]) {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0f32;
    for s in scores.iter_mut() {
        *s = (*s - max).exp();
        sum += *s;
    }
    if sum > 0.0 {
        for s in scores.iter_mut() {
            *s /= sum;
        }
    }
}

fn argmax(scores: &[f32]) -> (usize, f32) {
    scores
        .iter()
        .copied()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, s)| {
            if s > best.1 { (i, s) } else { best }
        })
}

/// Log the three most probable classes for a promising candidate.
fn log_top_classes(scores: &[f32], objectness: f32) {
    let mut indexed: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| b.1.total_cmp(&a.1));
    let top: Vec<String> = indexed
        .iter()
        .take(3)
        .map(|(i, p)| format!("{} ({:.1}%)", class_name(*i), p * 100.0))
        .collect();
    debug!(
        "candidate: {} [obj: {:.1}%]",
        top.join(", "),
        objectness * 100.0
    );
}
