use std::collections::BTreeSet;

use crate::DownloadOutcome;

/// Item indices the user asked for within one collection. Iterates ascending.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionSet {
    indices: BTreeSet<usize>,
}

impl SelectionSet {
    pub fn seed(indices: impl IntoIterator<Item = usize>) -> Self {
        Self {
            indices: indices.into_iter().collect(),
        }
    }

    /// Returns whether the index was present.
    pub fn remove(&mut self, index: usize) -> bool {
        self.indices.remove(&index)
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<usize> {
        self.iter().collect()
    }
}

/// Tracks which selected items still have something to merge and how many
/// attempts failed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionReconciler {
    selection: SelectionSet,
    failures: usize,
    succeeded: usize,
}

impl SelectionReconciler {
    pub fn new(selected: impl IntoIterator<Item = usize>) -> Self {
        Self {
            selection: SelectionSet::seed(selected),
            failures: 0,
            succeeded: 0,
        }
    }

    pub fn record(&mut self, index: usize, outcome: &DownloadOutcome) {
        match outcome {
            DownloadOutcome::Success { .. } => self.succeeded += 1,
            DownloadOutcome::NoLinkFound => {
                self.selection.remove(index);
            }
            DownloadOutcome::QuotaExceeded | DownloadOutcome::TransportError(_) => {
                self.failures += 1;
            }
        }
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }
}

/// Fraction of one item's progress unit already handed to the renderer.
///
/// Ticks past a full unit are clamped so a body longer than its declared
/// length never overshoots.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ItemProgress {
    reported: f64,
}

impl ItemProgress {
    /// Accepts a raw fraction and returns the delta that may be rendered.
    pub fn advance(&mut self, fraction: f64) -> f64 {
        if !fraction.is_finite() || fraction <= 0.0 {
            return 0.0;
        }
        let next = (self.reported + fraction).min(1.0);
        let delta = next - self.reported;
        self.reported = next;
        delta
    }

    pub fn reported(&self) -> f64 {
        self.reported
    }
}
