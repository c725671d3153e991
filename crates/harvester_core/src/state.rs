use std::collections::BTreeSet;

use crate::view_model::CollectionView;
use crate::{DownloadOutcome, SelectionReconciler};

/// Per-collection run state. Mutated only through [`crate::update`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CollectionState {
    title: String,
    selected: usize,
    pending: BTreeSet<usize>,
    reconciler: SelectionReconciler,
    aborted: Option<String>,
    finished: bool,
}

impl CollectionState {
    pub fn new(title: impl Into<String>, selected: impl IntoIterator<Item = usize>) -> Self {
        let pending: BTreeSet<usize> = selected.into_iter().collect();
        Self {
            title: title.into(),
            selected: pending.len(),
            reconciler: SelectionReconciler::new(pending.iter().copied()),
            pending,
            aborted: None,
            finished: false,
        }
    }

    pub fn view(&self) -> CollectionView {
        CollectionView {
            title: self.title.clone(),
            selected: self.selected,
            attempted: self.selected - self.pending.len(),
            downloaded: self.reconciler.succeeded(),
            failures: self.reconciler.failures(),
            mergeable: self.reconciler.selection().to_vec(),
            aborted: self.aborted.clone(),
            finished: self.finished,
        }
    }

    /// Indices still waiting for an attempt, ascending.
    pub fn pending(&self) -> impl Iterator<Item = usize> + '_ {
        self.pending.iter().copied()
    }

    pub fn is_accepting(&self) -> bool {
        !self.finished && self.aborted.is_none()
    }

    /// Returns false when the index was not pending; the outcome is then dropped.
    pub(crate) fn record(&mut self, index: usize, outcome: &DownloadOutcome) -> bool {
        if !self.is_accepting() || !self.pending.remove(&index) {
            return false;
        }
        self.reconciler.record(index, outcome);
        true
    }

    pub(crate) fn abort(&mut self, reason: String) {
        if self.is_accepting() {
            self.aborted = Some(reason);
        }
    }

    /// Returns false if already finished.
    pub(crate) fn finish(&mut self) -> bool {
        !std::mem::replace(&mut self.finished, true)
    }
}
