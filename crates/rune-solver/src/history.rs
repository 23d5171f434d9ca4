//! Bounded FIFO history of recovered blade centers.

use std::collections::VecDeque;

use anyhow::{ensure, Result};
use rune_core::Pt3;

/// Default number of blade centers retained for smoothing.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Bounded FIFO of recent blade-center estimates, oldest first.
///
/// This is the only mutable state in the estimation core. It is owned by a
/// single estimator instance and is not synchronized; concurrent push and
/// snapshot require external locking.
#[derive(Clone, Debug)]
pub struct CenterHistory {
    buf: VecDeque<Pt3>,
    capacity: usize,
}

impl Default for CenterHistory {
    fn default() -> Self {
        Self {
            buf: VecDeque::with_capacity(DEFAULT_HISTORY_CAPACITY),
            capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl CenterHistory {
    /// Construct a history with an explicit capacity (must be at least 1).
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        ensure!(capacity >= 1, "history capacity must be at least 1");
        Ok(Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    /// Record a per-frame estimate.
    ///
    /// A `Some` estimate is appended, evicting the oldest entry once the
    /// buffer is full. A `None` estimate is a strict no-op: a missed
    /// detection must not shrink or reorder the useful history.
    pub fn push(&mut self, estimate: Option<Pt3>) {
        let Some(center) = estimate else {
            return;
        };
        if self.buf.len() == self.capacity {
            self.buf.pop_front();
        }
        self.buf.push_back(center);
    }

    /// The current contents, oldest first, as one consistent read.
    pub fn snapshot(&self) -> Vec<Pt3> {
        self.buf.iter().copied().collect()
    }

    /// Number of retained estimates.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Maximum number of retained estimates.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all retained estimates. Never called implicitly.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}
