//! Single-frame blade pose recovery.
//!
//! Solves the PnP problem for the planar blade template: a DLT homography
//! seed decomposed into a pose, then Levenberg-Marquardt reprojection
//! refinement. Only the translation is consumed downstream — the template
//! origin is the blade center, so the recovered translation *is* the blade
//! center in camera-frame millimeters.

use log::debug;

use rune_core::{BladeDetection, BladeTemplate, Pt2, Pt3, RuneCamera, Vec2};

use crate::homography::dlt_homography;
use crate::planar::pose_from_homography;
use crate::refine::{refine_pose, RefineOptions};

/// Solver for the camera-frame position of a detected blade's center.
///
/// Holds the fixed per-session camera model and target template. Each call
/// is purely functional; the solver has no per-frame state.
#[derive(Clone, Debug)]
pub struct BladePoseSolver {
    camera: RuneCamera,
    template: BladeTemplate,
    refine: RefineOptions,
}

impl BladePoseSolver {
    pub fn new(camera: RuneCamera, template: BladeTemplate) -> Self {
        Self {
            camera,
            template,
            refine: RefineOptions::default(),
        }
    }

    pub fn with_refine_options(mut self, opts: RefineOptions) -> Self {
        self.refine = opts;
        self
    }

    pub fn camera(&self) -> &RuneCamera {
        &self.camera
    }

    pub fn template(&self) -> &BladeTemplate {
        &self.template
    }

    /// Recover the blade center in camera coordinates (millimeters).
    ///
    /// Returns `None` when the detection has fewer points than the template
    /// requires, or when the numerical solve degenerates. Both are expected
    /// per-frame outcomes (partial occlusion, detector noise), not errors;
    /// the caller decides whether to hold, skip, or count misses.
    pub fn estimate_center(&self, detection: &BladeDetection) -> Option<Pt3> {
        if detection.points.len() < self.template.required_points() {
            debug!(
                "detection has {} points, need {}; skipping pose solve",
                detection.points.len(),
                self.template.required_points()
            );
            return None;
        }

        let model = self.template.points();
        let n = detection.points.len().min(model.len());

        // Undistorted pixel observations, paired positionally with the
        // template (the BladeSlot ordering contract).
        let mut plane = Vec::with_capacity(n);
        let mut pixels = Vec::with_capacity(n);
        let mut correspondences = Vec::with_capacity(n);
        for i in 0..n {
            let norm = self
                .camera
                .undistort_pixel(&Vec2::new(detection.points[i].x, detection.points[i].y));
            let uv = self.camera.k.normalized_to_pixel(&norm);
            plane.push(Pt2::new(model[i].x, model[i].y));
            pixels.push(Pt2::new(uv.x, uv.y));
            correspondences.push((model[i], uv));
        }

        let hmtx = match dlt_homography(&plane, &pixels) {
            Ok(h) => h,
            Err(e) => {
                debug!("homography seed failed: {e}");
                return None;
            }
        };

        let seed = match pose_from_homography(&self.camera.k.k_matrix(), &hmtx) {
            Ok(p) => p,
            Err(e) => {
                debug!("homography decomposition failed: {e}");
                return None;
            }
        };

        let pose = match refine_pose(&self.camera.k, &correspondences, &seed, self.refine) {
            Ok(p) => p,
            Err(e) => {
                debug!("pose refinement failed: {e}");
                return None;
            }
        };

        let t = pose.translation.vector;
        Some(Pt3::new(t.x, t.y, t.z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Rotation3, Translation3};
    use rune_core::{BladeKind, BrownConrady5, CameraIntrinsics, Iso3};

    fn test_camera() -> RuneCamera {
        RuneCamera::new(
            CameraIntrinsics {
                fx: 1286.0,
                fy: 1288.0,
                cx: 645.0,
                cy: 483.0,
                skew: 0.0,
            },
            BrownConrady5 {
                k1: -0.47,
                k2: 0.21,
                k3: 0.0,
                p1: 0.0005,
                p2: -0.0003,
                iters: 8,
            },
        )
        .unwrap()
    }

    fn synthesize_detection(camera: &RuneCamera, template: &BladeTemplate, pose: &Iso3) -> BladeDetection {
        let points: Vec<Pt2> = template
            .points()
            .iter()
            .map(|pw| {
                let pc = pose.transform_point(pw);
                let uv = camera.project_point(&pc).unwrap();
                Pt2::new(uv.x, uv.y)
            })
            .collect();
        let centroid = points[4];
        BladeDetection::new(points, BladeKind::Target, centroid)
    }

    #[test]
    fn recovers_translation_from_synthetic_detection() {
        let camera = test_camera();
        let template = BladeTemplate::default();
        let solver = BladePoseSolver::new(camera, template);

        let rot = Rotation3::from_euler_angles(0.12, -0.07, 0.9);
        let pose_gt = Iso3::from_parts(Translation3::new(250.0, -120.0, 2400.0), rot.into());

        let detection = synthesize_detection(&camera, &template, &pose_gt);
        let center = solver.estimate_center(&detection).unwrap();

        let err = (center - pose_gt.transform_point(&Pt3::origin())).norm();
        assert!(err < 1.0, "blade center error {err} mm exceeds 1 mm");
    }

    #[test]
    fn recovers_translation_with_skewed_intrinsics() {
        let camera = RuneCamera::new(
            CameraIntrinsics {
                fx: 1286.0,
                fy: 1288.0,
                cx: 645.0,
                cy: 483.0,
                skew: 40.0,
            },
            BrownConrady5 {
                k1: -0.47,
                k2: 0.21,
                k3: 0.0,
                p1: 0.0005,
                p2: -0.0003,
                iters: 8,
            },
        )
        .unwrap();
        let template = BladeTemplate::default();
        let solver = BladePoseSolver::new(camera, template);

        let rot = Rotation3::from_euler_angles(0.12, -0.07, 0.9);
        let pose_gt = Iso3::from_parts(Translation3::new(250.0, -120.0, 2400.0), rot.into());

        let detection = synthesize_detection(&camera, &template, &pose_gt);
        let center = solver.estimate_center(&detection).unwrap();

        let err = (center - pose_gt.transform_point(&Pt3::origin())).norm();
        assert!(err < 1.0, "skewed-camera center error {err} mm exceeds 1 mm");
    }

    #[test]
    fn short_detection_yields_none() {
        let camera = test_camera();
        let template = BladeTemplate::default();
        let solver = BladePoseSolver::new(camera, template);

        let detection = BladeDetection::new(
            vec![
                Pt2::new(100.0, 100.0),
                Pt2::new(200.0, 100.0),
                Pt2::new(200.0, 200.0),
                Pt2::new(100.0, 200.0),
            ],
            BladeKind::Target,
            Pt2::new(150.0, 150.0),
        );
        assert!(solver.estimate_center(&detection).is_none());
    }

    #[test]
    fn origin_pose_is_distinguishable_from_miss() {
        let camera = test_camera();
        let template = BladeTemplate::default();
        let solver = BladePoseSolver::new(camera, template);

        // A miss is None, never a zero point masquerading as a solve.
        let empty = BladeDetection::new(Vec::new(), BladeKind::Unlit, Pt2::origin());
        assert_eq!(solver.estimate_center(&empty), None);
    }

    #[test]
    fn degenerate_collinear_detection_yields_none() {
        let camera = test_camera();
        let template = BladeTemplate::default();
        let solver = BladePoseSolver::new(camera, template);

        // All keypoints on one image line: the homography has no unique
        // solution and the solve must fail quietly.
        let detection = BladeDetection::new(
            vec![
                Pt2::new(100.0, 100.0),
                Pt2::new(150.0, 100.0),
                Pt2::new(200.0, 100.0),
                Pt2::new(250.0, 100.0),
                Pt2::new(300.0, 100.0),
                Pt2::new(350.0, 100.0),
            ],
            BladeKind::Target,
            Pt2::new(225.0, 100.0),
        );
        let result = solver.estimate_center(&detection);
        // Either the solve fails (None) or it produces some pose; it must
        // never panic. A finite result is tolerated but not required.
        if let Some(p) = result {
            assert!(p.x.is_finite() && p.y.is_finite() && p.z.is_finite());
        }
    }

    #[test]
    fn uses_all_six_slots_when_available() {
        let camera = test_camera();
        let template = BladeTemplate::default();
        let solver = BladePoseSolver::new(camera, template);

        let rot = Rotation3::from_euler_angles(-0.05, 0.1, 2.4);
        let pose_gt = Iso3::from_parts(Translation3::new(-300.0, 180.0, 3100.0), rot.into());

        let mut detection = synthesize_detection(&camera, &template, &pose_gt);
        // Five-point detection (tag anchor missing) must still solve.
        detection.points.truncate(5);
        let center = solver.estimate_center(&detection).unwrap();
        let err = (center - pose_gt.transform_point(&Pt3::origin())).norm();
        assert!(err < 1.0, "five-point solve error {err} mm exceeds 1 mm");
    }
}
