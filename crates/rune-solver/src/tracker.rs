//! Per-frame pipeline: pose solve → history push → rotation-center fit.

use log::debug;

use rune_core::{BladeDetection, BladeTemplate, Pt3, RuneCamera};

use crate::center::RotationCenterSolver;
use crate::history::CenterHistory;
use crate::pose::BladePoseSolver;

/// Owns the three pipeline stages and drives them once per frame.
///
/// The enclosing loop owns scheduling, timeouts, and what to do on a missed
/// frame; the tracker only folds detections into the smoothed hub estimate.
/// Single-threaded: the history buffer is not synchronized.
#[derive(Clone, Debug)]
pub struct RuneTracker {
    pose: BladePoseSolver,
    history: CenterHistory,
    center: RotationCenterSolver,
}

impl RuneTracker {
    pub fn new(camera: RuneCamera, template: BladeTemplate) -> Self {
        Self {
            pose: BladePoseSolver::new(camera, template),
            history: CenterHistory::default(),
            center: RotationCenterSolver::default(),
        }
    }

    /// Replace the default stages, e.g. for a custom history capacity or
    /// blade radius.
    pub fn from_parts(
        pose: BladePoseSolver,
        history: CenterHistory,
        center: RotationCenterSolver,
    ) -> Self {
        Self {
            pose,
            history,
            center,
        }
    }

    /// Fold one frame's detection into the estimate.
    ///
    /// Returns the current hub rotation-center estimate in camera-frame
    /// millimeters, or `None` while no valid pose has ever been recovered.
    /// A frame whose pose solve fails keeps the previous history intact, so
    /// the returned estimate degrades gracefully instead of dropping out.
    pub fn update(&mut self, detection: &BladeDetection) -> Option<Pt3> {
        let estimate = self.pose.estimate_center(detection);
        if let Some(p) = estimate {
            debug!("blade center: ({:.1}, {:.1}, {:.1}) mm", p.x, p.y, p.z);
        }
        self.history.push(estimate);

        if self.history.is_empty() {
            return None;
        }
        Some(self.center.estimate(&self.history.snapshot()))
    }

    /// Latest estimate without consuming a new frame.
    pub fn current(&self) -> Option<Pt3> {
        if self.history.is_empty() {
            return None;
        }
        Some(self.center.estimate(&self.history.snapshot()))
    }

    /// Number of blade centers currently smoothed over.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Drop accumulated history, e.g. when the target resets between runs.
    pub fn reset(&mut self) {
        self.history.clear();
    }
}
