//! Choosing one subject among the detector's boxes.

use gimbal_control_model::{BoundingBox, Centroid, FrameGeometry, SelectionPolicy};
use serde::{Deserialize, Serialize};

/// Where a frame's centroid came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CentroidOrigin {
    /// Derived from a detection; `candidates` is how many boxes were seen.
    Detected { candidates: usize },
    /// Nothing detected; the frame center was used.
    Fallback,
}

/// Pick the box the policy prefers. `None` only when `boxes` is empty.
pub fn select_target(boxes: &[BoundingBox], policy: SelectionPolicy) -> Option<&BoundingBox> {
    match policy {
        SelectionPolicy::First => boxes.first(),
        SelectionPolicy::LargestArea => boxes.iter().fold(None, |best, candidate| match best {
            Some(best) if best.area() >= candidate.area() => Some(best),
            _ => Some(candidate),
        }),
    }
}

/// Centroid for a frame: the selected box's center shifted by
/// `vertical_offset`, or the frame center when nothing was detected.
pub fn resolve_centroid(
    boxes: &[BoundingBox],
    policy: SelectionPolicy,
    geometry: &FrameGeometry,
    vertical_offset: f64,
) -> (Centroid, CentroidOrigin) {
    match select_target(boxes, policy) {
        Some(target) => (
            target.center(vertical_offset),
            CentroidOrigin::Detected {
                candidates: boxes.len(),
            },
        ),
        None => (geometry.center(), CentroidOrigin::Fallback),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxes() -> Vec<BoundingBox> {
        vec![
            BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            BoundingBox::new(100.0, 100.0, 40.0, 50.0),
            BoundingBox::new(500.0, 500.0, 50.0, 40.0),
        ]
    }

    #[test]
    fn test_first_policy() {
        let boxes = boxes();
        assert_eq!(select_target(&boxes, SelectionPolicy::First), Some(&boxes[0]));
    }

    #[test]
    fn test_largest_area_prefers_earliest_on_tie() {
        let boxes = boxes();
        assert_eq!(
            select_target(&boxes, SelectionPolicy::LargestArea),
            Some(&boxes[1])
        );
    }

    #[test]
    fn test_empty_selects_nothing() {
        assert!(select_target(&[], SelectionPolicy::LargestArea).is_none());
    }

    #[test]
    fn test_fallback_is_frame_center() {
        let (centroid, origin) = resolve_centroid(
            &[],
            SelectionPolicy::LargestArea,
            &FrameGeometry::FULL_HD,
            -25.0,
        );
        assert_eq!(centroid, Centroid::new(960.0, 540.0));
        assert_eq!(origin, CentroidOrigin::Fallback);
    }

    #[test]
    fn test_detected_centroid_applies_offset() {
        let (centroid, origin) = resolve_centroid(
            &boxes(),
            SelectionPolicy::LargestArea,
            &FrameGeometry::FULL_HD,
            -25.0,
        );
        assert_eq!(centroid, Centroid::new(120.0, 100.0));
        assert_eq!(origin, CentroidOrigin::Detected { candidates: 3 });
    }
}
