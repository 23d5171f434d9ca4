//! Decomposition of a plane-induced homography into a rigid pose.
//!
//! Classic decomposition of `H = K [r1 r2 t]` for a target on its own
//! `z = 0` plane. The recovered pose maps blade-local coordinates into the
//! camera frame.

use anyhow::{anyhow, Result};
use nalgebra::{Rotation3, Translation3, UnitQuaternion, Vector3};
use rune_core::{Iso3, Mat3, Real};

/// Decompose a homography into a pose `T_C_B` given intrinsics `K`.
///
/// The translation sign is chosen so the target lies in front of the camera
/// (positive z).
pub fn pose_from_homography(kmtx: &Mat3, hmtx: &Mat3) -> Result<Iso3> {
    let k_inv = kmtx
        .try_inverse()
        .ok_or_else(|| anyhow!("intrinsics matrix is not invertible"))?;

    let h1 = hmtx.column(0);
    let h2 = hmtx.column(1);
    let h3 = hmtx.column(2).into_owned();

    let k_inv_h1 = k_inv * h1;
    let k_inv_h2 = k_inv * h2;
    let k_inv_h3 = k_inv * h3;

    // Scale factor λ: normalize first two columns (average for robustness)
    let norm1 = k_inv_h1.norm();
    let norm2 = k_inv_h2.norm();
    let denom = (norm1 + norm2) * 0.5;
    if denom <= Real::EPSILON {
        return Err(anyhow!("degenerate homography: vanishing rotation columns"));
    }
    let mut lambda = 1.0 / denom;

    // Place the target in front of the camera.
    if (lambda * k_inv_h3).z < 0.0 {
        lambda = -lambda;
    }

    let r1 = (lambda * k_inv_h1).into_owned();
    let r2 = (lambda * k_inv_h2).into_owned();
    let r3 = r1.cross(&r2);

    let mut r_mat = Mat3::zeros();
    r_mat.set_column(0, &r1);
    r_mat.set_column(1, &r2);
    r_mat.set_column(2, &r3);

    // Project onto SO(3) (polar decomposition via SVD)
    let svd = r_mat.svd(true, true);
    let u = svd.u.ok_or_else(|| anyhow!("svd failed in pose decomposition"))?;
    let v_t = svd
        .v_t
        .ok_or_else(|| anyhow!("svd failed in pose decomposition"))?;
    let mut r_orth = u * v_t;

    // Ensure det(R) > 0
    if r_orth.determinant() < 0.0 {
        let mut u_flipped = u;
        u_flipped.column_mut(2).neg_mut();
        r_orth = u_flipped * v_t;
    }

    let t_vec: Vector3<Real> = lambda * k_inv_h3;
    let rot = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(r_orth));
    Ok(Iso3::from_parts(Translation3::from(t_vec), rot))
}
