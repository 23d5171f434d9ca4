//! Core math and geometry primitives for `rune-vision`.
//!
//! This crate contains:
//! - linear algebra type aliases (`Real`, `Vec2`, `Pt3`, ...),
//! - the session camera model (pinhole intrinsics + Brown-Conrady distortion),
//! - the fixed 3D blade target template with named correspondence slots,
//! - per-frame detection types produced by an external keypoint detector.
//!
//! No solver logic lives here; see the `rune-solver` crate.

/// Linear algebra type aliases and helpers.
pub mod math;
/// Camera intrinsics and lens distortion.
pub mod camera;
/// Per-frame keypoint detection types.
pub mod detection;
/// The fixed 3D blade target template.
pub mod target;

pub use camera::*;
pub use detection::*;
pub use math::*;
pub use target::*;
