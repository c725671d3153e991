#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionSummary {
    NothingSelected,
    Complete {
        downloaded: usize,
    },
    Partial {
        downloaded: usize,
        failures: usize,
    },
    Aborted {
        downloaded: usize,
        failures: usize,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CollectionView {
    pub title: String,
    pub selected: usize,
    pub attempted: usize,
    pub downloaded: usize,
    pub failures: usize,
    /// Reconciled indices, ascending.
    pub mergeable: Vec<usize>,
    pub aborted: Option<String>,
    pub finished: bool,
}

impl CollectionView {
    pub fn summary(&self) -> CollectionSummary {
        if self.selected == 0 {
            return CollectionSummary::NothingSelected;
        }
        if let Some(reason) = &self.aborted {
            return CollectionSummary::Aborted {
                downloaded: self.downloaded,
                failures: self.failures,
                reason: reason.clone(),
            };
        }
        if self.failures == 0 {
            CollectionSummary::Complete {
                downloaded: self.downloaded,
            }
        } else {
            CollectionSummary::Partial {
                downloaded: self.downloaded,
                failures: self.failures,
            }
        }
    }

    /// Merge confirmation defaults to "yes" only for a clean collection.
    pub fn merge_default(&self) -> bool {
        self.failures == 0 && self.aborted.is_none() && !self.mergeable.is_empty()
    }
}
