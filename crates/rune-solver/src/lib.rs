//! Estimators for the rune target: single-frame blade pose recovery and
//! multi-frame rotation-center fitting.
//!
//! Per-frame data flow:
//!
//! `BladeDetection` (external detector) → [`BladePoseSolver::estimate_center`]
//! → [`CenterHistory::push`] → [`RotationCenterSolver::estimate`] → consumer.
//!
//! [`RuneTracker`] wires the three stages together for callers that do not
//! need to drive them individually. Everything except the history buffer is
//! stateless per call; nothing here performs I/O or blocks.

/// Rotation-center estimation from recovered blade centers.
pub mod center;
/// Bounded FIFO history of blade center estimates.
pub mod history;
/// DLT homography estimation.
pub mod homography;
/// Plane-induced homography decomposition into a pose.
pub mod planar;
/// Single-frame blade pose recovery (PnP).
pub mod pose;
/// Levenberg-Marquardt pose refinement on tiny-solver.
pub mod refine;
/// Per-frame pipeline wiring.
pub mod tracker;

pub use center::*;
pub use history::*;
pub use pose::*;
pub use tracker::*;
