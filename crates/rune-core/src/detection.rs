//! Per-frame keypoint detection types.
//!
//! A [`BladeDetection`] is produced once per frame by an external
//! detector/classifier and is read-only to the estimation pipeline. There is
//! no guarantee that the point count matches the template; the pose solver
//! treats a short detection as "no pose", not as an error.

use serde::{Deserialize, Serialize};

use crate::math::Pt2;

/// Discriminant label attached by the detector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BladeKind {
    /// The blade currently designated as the hit target.
    Target,
    /// A lit blade that is not the target.
    Lit,
    /// An unlit blade.
    Unlit,
}

/// One detected blade: ordered sub-pixel keypoints plus a planar centroid.
///
/// `points` follow [`crate::BladeSlot`] order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BladeDetection {
    /// Ordered 2D keypoints in pixel coordinates.
    pub points: Vec<Pt2>,
    /// Detector classification of this blade.
    pub kind: BladeKind,
    /// Planar centroid of the detected blade, in pixels.
    pub centroid: Pt2,
}

impl BladeDetection {
    pub fn new(points: Vec<Pt2>, kind: BladeKind, centroid: Pt2) -> Self {
        Self {
            points,
            kind,
            centroid,
        }
    }

    /// Number of detected keypoints.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true when the detector found no keypoints.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_serde_roundtrip() {
        let det = BladeDetection::new(
            vec![Pt2::new(100.5, 200.25), Pt2::new(300.0, 220.0)],
            BladeKind::Target,
            Pt2::new(200.0, 210.0),
        );
        let json = serde_json::to_string(&det).unwrap();
        let restored: BladeDetection = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.kind, BladeKind::Target);
    }
}
