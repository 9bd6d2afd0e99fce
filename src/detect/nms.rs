//! Greedy Non-Maximum Suppression over filtered candidates.

use crate::detect::types::{Candidate, NormalizedBox};

/// Intersection-over-union of two normalized boxes.
///
/// Returns 0 when the boxes do not overlap.
pub fn iou(a: &NormalizedBox, b: &NormalizedBox) -> f32 {
    let x1 = a.x.max(b.x);
    let y1 = a.y.max(b.y);
    let x2 = (a.x + a.width).min(b.x + b.width);
    let y2 = (a.y + a.height).min(b.y + b.height);

    if x2 <= x1 || y2 <= y1 {
        return 0.0;
    }

    let intersection = (x2 - x1) * (y2 - y1);
    let union = a.area() + b.area() - intersection;

    if union > 0.0 { intersection / union } else { 0.0 }
}

/// Suppress redundant overlapping candidates.
///
/// Sorts descending by confidence, then keeps a candidate only if its IoU
/// against every already-kept candidate stays at or below `iou_threshold`.
/// O(k²) in surviving candidates, which is small after filtering.
pub fn suppress(mut candidates: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let overlaps = kept
            .iter()
            .any(|k| iou(&candidate.bbox, &k.bbox) > iou_threshold);
        if !overlaps {
            kept.push(candidate);
        }
    }
    kept
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn boxed(x: f32, y: f32, w: f32, h: f32) -> NormalizedBox {
        NormalizedBox {
            x,
            y,
            width: w,
            height: h,
        }
    }

    fn candidate(bbox: NormalizedBox, confidence: f32) -> Candidate {
        Candidate {
            bbox,
            objectness: confidence,
            class_index: 14,
            class_probability: 1.0,
            confidence,
        }
    }

    #[test]
    fn test_iou_symmetric() {
        let a = boxed(0.1, 0.1, 0.3, 0.3);
        let b = boxed(0.2, 0.2, 0.3, 0.3);
        assert_eq!(iou(&a, &b), iou(&b, &a));
    }

    #[test]
    fn test_iou_identity() {
        let a = boxed(0.25, 0.25, 0.5, 0.5);
        assert!((iou(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_disjoint_is_zero() {
        let a = boxed(0.0, 0.0, 0.2, 0.2);
        let b = boxed(0.8, 0.8, 0.2, 0.2);
        assert_eq!(iou(&a, &b), 0.0);
    }

    #[test]
    fn test_iou_touching_edges_is_zero() {
        let a = boxed(0.0, 0.0, 0.5, 0.5);
        let b = boxed(0.5, 0.0, 0.5, 0.5);
        assert_eq!(iou(&a, &b), 0.0);
    }

    #[test]
    fn test_suppress_keeps_highest_confidence() {
        // Two heavily overlapping boxes; the 0.9 one must win.
        let first = candidate(boxed(0.1, 0.1, 0.3, 0.3), 0.9);
        let second = candidate(boxed(0.12, 0.11, 0.3, 0.3), 0.6);
        assert!(iou(&first.bbox, &second.bbox) > 0.45);

        let kept = suppress(vec![second, first], 0.45);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].confidence, 0.9);
    }

    #[test]
    fn test_suppress_keeps_disjoint_boxes() {
        let a = candidate(boxed(0.0, 0.0, 0.2, 0.2), 0.9);
        let b = candidate(boxed(0.7, 0.7, 0.2, 0.2), 0.8);
        let kept = suppress(vec![a, b], 0.45);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_suppress_output_pairwise_below_threshold() {
        let input = vec![
            candidate(boxed(0.1, 0.1, 0.3, 0.3), 0.9),
            candidate(boxed(0.15, 0.1, 0.3, 0.3), 0.8),
            candidate(boxed(0.6, 0.6, 0.2, 0.2), 0.7),
            candidate(boxed(0.62, 0.61, 0.2, 0.2), 0.5),
        ];
        let kept = suppress(input, 0.45);
        for (i, a) in kept.iter().enumerate() {
            for b in kept.iter().skip(i + 1) {
                assert!(iou(&a.bbox, &b.bbox) <= 0.45);
            }
        }
    }

    #[test]
    fn test_suppress_idempotent() {
        let input = vec![
            candidate(boxed(0.1, 0.1, 0.3, 0.3), 0.9),
            candidate(boxed(0.12, 0.11, 0.3, 0.3), 0.6),
            candidate(boxed(0.6, 0.6, 0.2, 0.2), 0.7),
        ];
        let once = suppress(input, 0.45);
        let twice = suppress(once.clone(), 0.45);
        assert_eq!(once.len(), twice.len());
        for (a, b) in once.iter().zip(twice.iter()) {
            assert_eq!(a.confidence, b.confidence);
            assert_eq!(a.bbox, b.bbox);
        }
    }

    #[test]
    fn test_suppress_empty_input() {
        assert!(suppress(Vec::new(), 0.45).is_empty());
    }
}
