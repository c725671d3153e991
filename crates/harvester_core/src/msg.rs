use crate::DownloadOutcome;

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// An item attempt finished.
    ItemDone {
        index: usize,
        outcome: DownloadOutcome,
        /// Fraction of the item's progress unit already rendered while streaming.
        progress_reported: f64,
    },
    /// A remote call the collection loop depends on failed; no further items run.
    SourceFailed { reason: String },
    /// All attempts are in (or the loop was aborted).
    CollectionFinished,
}
