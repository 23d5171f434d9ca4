//! Levenberg-Marquardt pose refinement built on tiny-solver.
//!
//! The intrinsics are fixed for the session, so the only optimized variable
//! is the 7D SE(3) pose block. Each correspondence contributes a two-residual
//! reprojection block on undistorted pixel coordinates.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, ensure, Result};
use nalgebra::{DVector, DVectorView, Quaternion, RealField, UnitQuaternion, Vector2, Vector3};
use serde::{Deserialize, Serialize};
use tiny_solver::factors::Factor;
use tiny_solver::manifold::se3::{SE3Manifold, SE3};
use tiny_solver::optimizer::{Optimizer, OptimizerOptions};
use tiny_solver::problem::Problem;
use tiny_solver::LevenbergMarquardtOptimizer;

use rune_core::{CameraIntrinsics, Iso3, Pt3, Real, Vec2};

/// Epsilon added to depth for numerical stability.
const PROJECTION_EPS: f64 = 1.0e-9;

/// Solver options mapped onto tiny-solver's optimizer settings.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RefineOptions {
    pub max_iters: usize,
    pub verbosity: usize,
}

impl Default for RefineOptions {
    fn default() -> Self {
        let defaults = OptimizerOptions::default();
        Self {
            max_iters: defaults.max_iteration,
            verbosity: 0,
        }
    }
}

impl RefineOptions {
    fn to_optimizer_options(self) -> OptimizerOptions {
        let mut opts = OptimizerOptions::default();
        opts.max_iteration = self.max_iters;
        opts.verbosity_level = self.verbosity;
        opts
    }
}

/// Convert an `Iso3` into a 7D SE(3) parameter vector `[qx, qy, qz, qw, tx, ty, tz]`.
fn iso3_to_se3_dvec(pose: &Iso3) -> DVector<f64> {
    let q = pose.rotation.into_inner();
    let t = pose.translation.vector;
    nalgebra::dvector![
        q.coords[0],
        q.coords[1],
        q.coords[2],
        q.coords[3],
        t.x,
        t.y,
        t.z
    ]
}

/// Convert a 7D SE(3) vector `[qx, qy, qz, qw, tx, ty, tz]` into an `Iso3`.
fn se3_dvec_to_iso3(v: DVectorView<'_, f64>) -> Result<Iso3> {
    ensure!(
        v.len() == 7,
        "expected se3 vector of length 7, got {}",
        v.len()
    );
    let quat = Quaternion::new(v[3], v[0], v[1], v[2]);
    let rot = UnitQuaternion::from_quaternion(quat);
    let trans = Vector3::new(v[4], v[5], v[6]);
    Ok(Iso3::from_parts(trans.into(), rot))
}

/// Single-point reprojection residual with fixed intrinsics.
#[derive(Debug, Clone)]
struct PoseReprojFactor {
    /// Template point in blade-local coordinates.
    pw: Pt3,
    /// Measured (undistorted) pixel position.
    uv: Vec2,
    fx: Real,
    fy: Real,
    cx: Real,
    cy: Real,
    skew: Real,
}

impl PoseReprojFactor {
    fn residual_generic<T: RealField>(&self, pose: &DVector<T>) -> DVector<T> {
        debug_assert!(pose.len() == 7, "pose must have 7 params");

        let se3 = SE3::<T>::from_vec(pose.as_view());
        let pw_t = Vector3::new(
            T::from_f64(self.pw.x).unwrap(),
            T::from_f64(self.pw.y).unwrap(),
            T::from_f64(self.pw.z).unwrap(),
        );
        let pc = se3 * pw_t.as_view();

        let eps = T::from_f64(PROJECTION_EPS).unwrap();
        let z = pc.z.clone() + eps;
        let x = pc.x.clone() / z.clone();
        let y = pc.y.clone() / z;
        let proj = Vector2::new(
            T::from_f64(self.fx).unwrap() * x
                + T::from_f64(self.skew).unwrap() * y.clone()
                + T::from_f64(self.cx).unwrap(),
            T::from_f64(self.fy).unwrap() * y + T::from_f64(self.cy).unwrap(),
        );

        let ru = T::from_f64(self.uv.x).unwrap() - proj.x.clone();
        let rv = T::from_f64(self.uv.y).unwrap() - proj.y.clone();
        nalgebra::dvector![ru, rv]
    }
}

impl<T: RealField> Factor<T> for PoseReprojFactor {
    fn residual_func(&self, params: &[DVector<T>]) -> DVector<T> {
        debug_assert_eq!(params.len(), 1, "expected [pose] parameter block");
        self.residual_generic(&params[0])
    }
}

/// Refine a pose seed by minimizing pixel reprojection error.
///
/// `correspondences` pairs blade-local template points with undistorted pixel
/// observations; the residual uses the full intrinsics, skew included.
pub fn refine_pose(
    k: &CameraIntrinsics,
    correspondences: &[(Pt3, Vec2)],
    seed: &Iso3,
    opts: RefineOptions,
) -> Result<Iso3> {
    ensure!(
        correspondences.len() >= 4,
        "need at least 4 correspondences for pose refinement, got {}",
        correspondences.len()
    );

    let mut problem = Problem::new();
    let mut initial: HashMap<String, DVector<f64>> = HashMap::new();
    initial.insert("pose".to_string(), iso3_to_se3_dvec(seed));
    problem.set_variable_manifold("pose", Arc::new(SE3Manifold));

    for (pw, uv) in correspondences {
        let factor = PoseReprojFactor {
            pw: *pw,
            uv: *uv,
            fx: k.fx,
            fy: k.fy,
            cx: k.cx,
            cy: k.cy,
            skew: k.skew,
        };
        problem.add_residual_block(2, &["pose"], Box::new(factor), None);
    }

    let optimizer = LevenbergMarquardtOptimizer::default();
    let solution = optimizer
        .optimize(&problem, &initial, Some(opts.to_optimizer_options()))
        .ok_or_else(|| anyhow!("pose refinement failed to converge"))?;

    let pose_vec = solution
        .get("pose")
        .ok_or_else(|| anyhow!("missing pose in solution"))?;
    se3_dvec_to_iso3(pose_vec.as_view())
}
