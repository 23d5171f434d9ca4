//! DLT homography estimation between the blade plane and the image.
//!
//! The null vector of the 2n×9 DLT system is taken from the eigenvector of
//! the 9×9 normal matrix `AᵀA` with the smallest eigenvalue. Accumulating
//! `AᵀA` row by row keeps every problem size, including the minimal four
//! correspondences, in a fixed-size symmetric eigenproblem. Both point sets
//! are normalized to zero mean and √2 average radius before the solve, and
//! the similarity transforms are undone afterwards.

use nalgebra::{SMatrix, SVector};
use rune_core::{Mat3, Pt2, Real};
use thiserror::Error;

type Mat9 = SMatrix<Real, 9, 9>;
type Row9 = SVector<Real, 9>;

#[derive(Debug, Error)]
pub enum HomographyError {
    #[error("need at least 4 point correspondences, got {0}")]
    NotEnoughPoints(usize),
    #[error("degenerate point configuration")]
    Degenerate,
}

/// Similarity transform taking `pts` to zero mean and √2 average radius.
fn normalizing_transform(pts: &[Pt2]) -> Result<Mat3, HomographyError> {
    let n = pts.len() as Real;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for p in pts {
        cx += p.x;
        cy += p.y;
    }
    cx /= n;
    cy /= n;

    let mut mean_dist = 0.0;
    for p in pts {
        mean_dist += ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt();
    }
    mean_dist /= n;
    if mean_dist <= Real::EPSILON {
        return Err(HomographyError::Degenerate);
    }

    let s = std::f64::consts::SQRT_2 / mean_dist;
    Ok(Mat3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0))
}

fn apply_similarity(t: &Mat3, p: &Pt2) -> (Real, Real) {
    (t[(0, 0)] * p.x + t[(0, 2)], t[(1, 1)] * p.y + t[(1, 2)])
}

/// Estimate H such that x' ~ H x using DLT.
///
/// `plane` are blade-local coordinates on the template plane and `image` are
/// the corresponding (undistorted) pixel positions. Four correspondences are
/// the minimum; all supplied points enter the least-squares system.
pub fn dlt_homography(plane: &[Pt2], image: &[Pt2]) -> Result<Mat3, HomographyError> {
    let n = plane.len();
    if n < 4 || image.len() != n {
        return Err(HomographyError::NotEnoughPoints(n));
    }

    let t_plane = normalizing_transform(plane)?;
    let t_image = normalizing_transform(image)?;

    let mut ata = Mat9::zeros();
    for (pw, pi) in plane.iter().zip(image.iter()) {
        let (x, y) = apply_similarity(&t_plane, pw);
        let (u, v) = apply_similarity(&t_image, pi);

        let r0 = Row9::from_column_slice(&[-x, -y, -1.0, 0.0, 0.0, 0.0, u * x, u * y, u]);
        let r1 = Row9::from_column_slice(&[0.0, 0.0, 0.0, -x, -y, -1.0, v * x, v * y, v]);

        ata += r0 * r0.transpose();
        ata += r1 * r1.transpose();
    }

    // Null vector of the stacked system = eigenvector of AᵀA with the
    // smallest eigenvalue.
    let eig = ata.symmetric_eigen();
    let mut min_idx = 0;
    for i in 1..9 {
        if eig.eigenvalues[i] < eig.eigenvalues[min_idx] {
            min_idx = i;
        }
    }
    let h = eig.eigenvectors.column(min_idx);

    let mut h_norm = Mat3::zeros();
    for r in 0..3 {
        for c in 0..3 {
            h_norm[(r, c)] = h[3 * r + c];
        }
    }

    // Undo the normalization: H = T_image⁻¹ · H_norm · T_plane.
    let t_image_inv = t_image.try_inverse().ok_or(HomographyError::Degenerate)?;
    let mut h_mat = t_image_inv * h_norm * t_plane;

    // normalise such that H[2,2] = 1
    let scale = h_mat[(2, 2)];
    if scale.abs() > Real::EPSILON {
        h_mat /= scale;
    }

    Ok(h_mat)
}
