//! Rotation-center estimation from recovered blade centers.
//!
//! As the rune spins, successive blade centers sweep a circle about the hub.
//! With two or more samples the hub is recovered by an algebraic
//! least-squares sphere fit; with a single sample it is extrapolated along
//! the radial direction using the known hub-to-blade distance.
//!
//! The sphere fit is unconstrained: physically the samples lie near a plane
//! orthogonal to the rotation axis, and a circle-in-plane fit would be more
//! accurate. Kept as-is deliberately; see DESIGN.md.

use anyhow::{ensure, Result};
use nalgebra::{DMatrix, DVector};
use rune_core::{Pt3, Real};

/// Hub-to-blade-center distance of the reference target, in millimeters.
pub const DEFAULT_BLADE_RADIUS_MM: Real = 700.0;

/// Radial distances below this are treated as "on the optical axis".
const RADIAL_EPS: Real = 1e-6;

/// Least-squares estimator of the hub rotation center.
#[derive(Clone, Copy, Debug)]
pub struct RotationCenterSolver {
    blade_radius: Real,
}

impl Default for RotationCenterSolver {
    fn default() -> Self {
        Self {
            blade_radius: DEFAULT_BLADE_RADIUS_MM,
        }
    }
}

impl RotationCenterSolver {
    /// Construct a solver for a target with the given hub-to-blade distance
    /// (millimeters, must be positive).
    pub fn new(blade_radius: Real) -> Result<Self> {
        ensure!(
            blade_radius > 0.0,
            "blade radius must be positive, got {}",
            blade_radius
        );
        Ok(Self { blade_radius })
    }

    pub fn blade_radius(&self) -> Real {
        self.blade_radius
    }

    /// Estimate the rotation center from blade-center samples, oldest first.
    ///
    /// - empty input: the origin (degenerate default; callers polling through
    ///   [`crate::RuneTracker`] never observe it),
    /// - one sample: radial extrapolation by the configured blade radius,
    /// - two or more: algebraic sphere fit.
    ///
    /// Never fails; ill-conditioned fits produce unclamped output and it is
    /// the consumer's job to treat wildly out-of-range centers as suspect.
    pub fn estimate(&self, samples: &[Pt3]) -> Pt3 {
        match samples {
            [] => Pt3::origin(),
            [single] => self.from_single_sample(single),
            _ => self.sphere_fit(samples),
        }
    }

    /// Single-sample fallback: the hub lies along the ray from the optical
    /// axis through the sample, `blade_radius` closer to the axis, at the
    /// same depth.
    fn from_single_sample(&self, p: &Pt3) -> Pt3 {
        let r_xy = (p.x * p.x + p.y * p.y).sqrt();
        if r_xy < RADIAL_EPS {
            // Numerically on the optical axis; no radial direction to scale.
            return Pt3::new(0.0, 0.0, p.z);
        }
        let scale = (r_xy - self.blade_radius) / r_xy;
        Pt3::new(p.x * scale, p.y * scale, p.z)
    }

    /// Algebraic sphere fit: each sample contributes the linear equation
    /// `2x·cx + 2y·cy + 2z·cz = x² + y² + z²` (the radius eliminated by
    /// differencing against the squared norm), solved by SVD least squares.
    fn sphere_fit(&self, samples: &[Pt3]) -> Pt3 {
        let n = samples.len();
        let mut a = DMatrix::<Real>::zeros(n, 3);
        let mut b = DVector::<Real>::zeros(n);

        for (i, p) in samples.iter().enumerate() {
            a[(i, 0)] = 2.0 * p.x;
            a[(i, 1)] = 2.0 * p.y;
            a[(i, 2)] = 2.0 * p.z;
            b[i] = p.x * p.x + p.y * p.y + p.z * p.z;
        }

        let svd = a.svd(true, true);
        match svd.solve(&b, Real::EPSILON) {
            Ok(c) => Pt3::new(c[0], c[1], c[2]),
            // Singular system: all samples coincident or collinear through
            // the origin. Fall back to the degenerate default.
            Err(_) => Pt3::origin(),
        }
    }
}
