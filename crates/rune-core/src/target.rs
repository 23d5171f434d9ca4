//! Fixed 3D template of the rune blade target.
//!
//! The template lives in the blade's local frame: origin at the blade center,
//! z = 0 plane, millimeter units. The detector emits keypoints in
//! [`BladeSlot`] order; the i-th detected point corresponds to the i-th
//! template point. That ordering is a hard contract — the pose solve is
//! meaningless if the detector reorders its output.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use crate::math::{Pt3, Real};

/// Named correspondence slots, in detector emission order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BladeSlot {
    TopLeftCorner,
    TopRightCorner,
    BottomRightCorner,
    BottomLeftCorner,
    BladeCenter,
    TagAnchor,
}

impl BladeSlot {
    /// All slots in template/detector order.
    pub const ALL: [BladeSlot; 6] = [
        BladeSlot::TopLeftCorner,
        BladeSlot::TopRightCorner,
        BladeSlot::BottomRightCorner,
        BladeSlot::BottomLeftCorner,
        BladeSlot::BladeCenter,
        BladeSlot::TagAnchor,
    ];

    /// Position of this slot in the ordered template.
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Physical blade dimensions, in millimeters.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct BladeTemplate {
    /// Half of the blade plate width.
    pub half_width: Real,
    /// Half of the blade plate height.
    pub half_height: Real,
    /// Distance from the blade center to the tag anchor, along local -y.
    pub tag_offset: Real,
}

impl Default for BladeTemplate {
    /// Dimensions of the reference target.
    fn default() -> Self {
        Self {
            half_width: 160.0,
            half_height: 150.0,
            tag_offset: 50.0,
        }
    }
}

impl BladeTemplate {
    /// Construct a template with explicit dimensions.
    pub fn new(half_width: Real, half_height: Real, tag_offset: Real) -> Result<Self> {
        ensure!(
            half_width > 0.0 && half_height > 0.0,
            "blade dimensions must be positive: half_width={}, half_height={}",
            half_width,
            half_height
        );
        Ok(Self {
            half_width,
            half_height,
            tag_offset,
        })
    }

    /// The local-frame 3D point for one correspondence slot.
    pub fn point(&self, slot: BladeSlot) -> Pt3 {
        let (w, h) = (self.half_width, self.half_height);
        match slot {
            BladeSlot::TopLeftCorner => Pt3::new(-w, -h, 0.0),
            BladeSlot::TopRightCorner => Pt3::new(w, -h, 0.0),
            BladeSlot::BottomRightCorner => Pt3::new(w, h, 0.0),
            BladeSlot::BottomLeftCorner => Pt3::new(-w, h, 0.0),
            BladeSlot::BladeCenter => Pt3::new(0.0, 0.0, 0.0),
            BladeSlot::TagAnchor => Pt3::new(0.0, -self.tag_offset, 0.0),
        }
    }

    /// All template points in slot order.
    pub fn points(&self) -> Vec<Pt3> {
        BladeSlot::ALL.iter().map(|&s| self.point(s)).collect()
    }

    /// Number of template points.
    pub fn len(&self) -> usize {
        BladeSlot::ALL.len()
    }

    /// Always false; the template is never empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Minimum detected points for a meaningful pose solve
    /// (the four corners plus the blade center).
    pub fn required_points(&self) -> usize {
        5
    }
}
