//! Session camera model: pinhole intrinsics plus Brown-Conrady distortion.
//!
//! Projection pipeline: `pixel = K(distort(pinhole(p_cam)))`. Backprojection
//! inverts the pipeline up to the normalized `z = 1` plane; depth cannot be
//! recovered from a single pixel.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use crate::math::{Mat3, Pt3, Real, Vec2};

/// Standard pinhole intrinsics with optional skew.
///
/// Fixed for a session: set once from an external calibration source and
/// never mutated afterwards.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    /// Focal length in pixels along X.
    pub fx: Real,
    /// Focal length in pixels along Y.
    pub fy: Real,
    /// Principal point X coordinate in pixels.
    pub cx: Real,
    /// Principal point Y coordinate in pixels.
    pub cy: Real,
    /// Skew term (typically 0).
    pub skew: Real,
}

impl CameraIntrinsics {
    /// Return the 3x3 camera intrinsics matrix K.
    pub fn k_matrix(&self) -> Mat3 {
        Mat3::new(
            self.fx, self.skew, self.cx, 0.0, self.fy, self.cy, 0.0, 0.0, 1.0,
        )
    }

    /// Map normalized coordinates (on the `z = 1` plane) to pixels.
    pub fn normalized_to_pixel(&self, n: &Vec2) -> Vec2 {
        let u = self.fx * n.x + self.skew * n.y + self.cx;
        let v = self.fy * n.y + self.cy;
        Vec2::new(u, v)
    }

    /// Map a pixel coordinate back to the normalized `z = 1` plane.
    pub fn pixel_to_normalized(&self, pixel: &Vec2) -> Vec2 {
        let ny = (pixel.y - self.cy) / self.fy;
        let nx = (pixel.x - self.cx - self.skew * ny) / self.fx;
        Vec2::new(nx, ny)
    }
}

/// Brown-Conrady distortion with three radial and two tangential terms.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct BrownConrady5 {
    pub k1: Real,
    pub k2: Real,
    pub k3: Real,
    pub p1: Real,
    pub p2: Real,
    /// Fixed-point iterations for `undistort` (0 selects the default of 8).
    pub iters: u32,
}

impl BrownConrady5 {
    fn distort_impl(&self, x: Real, y: Real) -> (Real, Real) {
        let r2 = x * x + y * y;
        let r4 = r2 * r2;
        let r6 = r4 * r2;

        let radial = 1.0 + self.k1 * r2 + self.k2 * r4 + self.k3 * r6;

        let x_tan = 2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x);
        let y_tan = self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y;

        (x * radial + x_tan, y * radial + y_tan)
    }

    /// Apply distortion to undistorted normalized coordinates.
    pub fn distort(&self, n_undist: &Vec2) -> Vec2 {
        let (xd, yd) = self.distort_impl(n_undist.x, n_undist.y);
        Vec2::new(xd, yd)
    }

    /// Invert distortion by fixed-point iteration.
    pub fn undistort(&self, n_dist: &Vec2) -> Vec2 {
        let mut x = n_dist.x;
        let mut y = n_dist.y;

        let iters = if self.iters == 0 { 8 } else { self.iters };
        for _ in 0..iters {
            let (xd, yd) = self.distort_impl(x, y);
            x -= xd - n_dist.x;
            y -= yd - n_dist.y;
        }
        Vec2::new(x, y)
    }
}

/// Full camera model for a capture session: intrinsics plus distortion.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RuneCamera {
    pub k: CameraIntrinsics,
    pub dist: BrownConrady5,
}

impl RuneCamera {
    /// Construct a camera model, validating that the intrinsics are usable.
    pub fn new(k: CameraIntrinsics, dist: BrownConrady5) -> Result<Self> {
        ensure!(
            k.fx > 0.0 && k.fy > 0.0,
            "focal lengths must be positive: fx={}, fy={}",
            k.fx,
            k.fy
        );
        Ok(Self { k, dist })
    }

    /// Calibration of the reference capture rig.
    pub fn reference() -> Self {
        Self {
            k: CameraIntrinsics {
                fx: 1286.307063384126,
                fy: 1288.1400736562441,
                cx: 645.34450819155256,
                cy: 483.6163720308021,
                skew: 0.0,
            },
            dist: BrownConrady5 {
                k1: -0.47562935060124745,
                k2: 0.21831745829617311,
                k3: 0.0,
                p1: 0.0004957613589406044,
                p2: -0.00034617769548693592,
                iters: 8,
            },
        }
    }

    /// Project a camera-frame 3D point to a pixel coordinate.
    ///
    /// Returns `None` for points at or behind the camera plane.
    pub fn project_point(&self, p_c: &Pt3) -> Option<Vec2> {
        if p_c.z <= 0.0 {
            return None;
        }
        let n_u = Vec2::new(p_c.x / p_c.z, p_c.y / p_c.z);
        let n_d = self.dist.distort(&n_u);
        Some(self.k.normalized_to_pixel(&n_d))
    }

    /// Undistort a pixel coordinate to the normalized `z = 1` plane.
    pub fn undistort_pixel(&self, pixel: &Vec2) -> Vec2 {
        let n_d = self.k.pixel_to_normalized(pixel);
        self.dist.undistort(&n_d)
    }
}
