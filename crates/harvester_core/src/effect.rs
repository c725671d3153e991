use crate::{CollectionSummary, DownloadOutcome};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Move the progress renderer forward by a fraction of one item.
    AdvanceProgress { fraction: f64 },
    ReportItemFailure { index: usize, outcome: DownloadOutcome },
    ReportSummary(CollectionSummary),
    /// Ask whether to merge the reconciled indices.
    OfferMerge { indices: Vec<usize>, default_yes: bool },
}
