//! End-to-end pipeline test: synthetic rotating rune, full revolution.

use nalgebra::{Rotation3, Translation3, Vector3};
use rune_core::{BladeDetection, BladeKind, BladeTemplate, Iso3, Pt2, Pt3, RuneCamera};
use rune_solver::RuneTracker;

const BLADE_RADIUS_MM: f64 = 700.0;

/// Hub position of the simulated rune, camera frame, millimeters.
fn hub() -> Vector3<f64> {
    Vector3::new(50.0, -30.0, 2600.0)
}

/// Pose of the blade at rune angle `theta`: the blade center sweeps a circle
/// of radius 700 mm about the hub in a plane facing the camera, and the blade
/// itself rotates with the rune.
fn blade_pose(theta: f64) -> Iso3 {
    let center = hub() + BLADE_RADIUS_MM * Vector3::new(theta.cos(), theta.sin(), 0.0);
    let rot = Rotation3::from_axis_angle(&Vector3::z_axis(), theta);
    Iso3::from_parts(Translation3::from(center), rot.into())
}

fn synthesize_detection(camera: &RuneCamera, template: &BladeTemplate, pose: &Iso3) -> BladeDetection {
    let points: Vec<Pt2> = template
        .points()
        .iter()
        .map(|pw| {
            let pc = pose.transform_point(pw);
            let uv = camera.project_point(&pc).expect("blade in front of camera");
            Pt2::new(uv.x, uv.y)
        })
        .collect();
    let centroid = points[4];
    BladeDetection::new(points, BladeKind::Target, centroid)
}

#[test]
fn tracker_locks_onto_hub_over_a_revolution() {
    let camera = RuneCamera::reference();
    let template = BladeTemplate::default();
    let mut tracker = RuneTracker::new(camera, template);

    let frames = 24;
    let mut last = None;
    for i in 0..frames {
        let theta = 2.0 * std::f64::consts::PI * (i as f64) / (frames as f64);
        let detection = synthesize_detection(&camera, &template, &blade_pose(theta));
        last = tracker.update(&detection);
    }

    let center = last.expect("estimate after a full revolution");
    let h = hub();

    // Blade centers are coplanar, which pins the lateral hub position; the
    // depth of a coplanar fit follows the sphere model rather than the true
    // hub depth, so only x/y are asserted against ground truth.
    assert!(
        (center.x - h.x).abs() < 2.0,
        "hub x estimate {} vs {}",
        center.x,
        h.x
    );
    assert!(
        (center.y - h.y).abs() < 2.0,
        "hub y estimate {} vs {}",
        center.y,
        h.y
    );
    assert!(center.z.is_finite() && center.z > 0.0);

    assert_eq!(tracker.history_len(), 10, "history must stay at capacity");
}

#[test]
fn missed_frames_do_not_corrupt_the_estimate() {
    let camera = RuneCamera::reference();
    let template = BladeTemplate::default();
    let mut tracker = RuneTracker::new(camera, template);

    for i in 0..12 {
        let theta = 0.26 * i as f64;
        let detection = synthesize_detection(&camera, &template, &blade_pose(theta));
        tracker.update(&detection);
    }
    let before = tracker.current().unwrap();
    let len_before = tracker.history_len();

    // A burst of occluded frames: too few keypoints for a pose.
    let occluded = BladeDetection::new(
        vec![Pt2::new(400.0, 300.0), Pt2::new(500.0, 310.0)],
        BladeKind::Target,
        Pt2::new(450.0, 305.0),
    );
    for _ in 0..5 {
        let estimate = tracker.update(&occluded);
        assert_eq!(estimate, Some(before), "estimate must hold through misses");
    }
    assert_eq!(tracker.history_len(), len_before);
}

#[test]
fn first_valid_frame_uses_radial_fallback() {
    let camera = RuneCamera::reference();
    let template = BladeTemplate::default();
    let mut tracker = RuneTracker::new(camera, template);

    let theta = 0.7;
    let detection = synthesize_detection(&camera, &template, &blade_pose(theta));
    let estimate = tracker.update(&detection).unwrap();

    // One sample: the estimate is the blade center pulled toward the optical
    // axis by the blade radius, depth unchanged.
    let blade = blade_pose(theta).translation.vector;
    let r_xy = (blade.x * blade.x + blade.y * blade.y).sqrt();
    let scale = (r_xy - BLADE_RADIUS_MM) / r_xy;
    let expected = Pt3::new(blade.x * scale, blade.y * scale, blade.z);

    assert!(
        (estimate - expected).norm() < 2.0,
        "fallback estimate {:?} vs {:?}",
        estimate,
        expected
    );
}
