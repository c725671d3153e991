use std::fmt;

/// A named, ordered grouping of items as listed by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub id: String,
    pub title: String,
    /// Approximate item count as advertised by the listing; may be stale.
    pub item_count: u32,
}

impl Collection {
    pub fn new(id: impl Into<String>, title: impl Into<String>, item_count: u32) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            item_count,
        }
    }
}

/// One entry of a collection's item listing, before its detail is fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSummary {
    pub id: String,
    pub title: String,
}

impl ItemSummary {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// Per-item metadata returned by the catalog's detail call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDetail {
    pub id: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: String,
    pub title: String,
    /// 0-based index within the listing that produced this item.
    pub position: usize,
    pub description: Option<String>,
}

impl Item {
    pub fn from_summary(position: usize, summary: ItemSummary) -> Self {
        Self {
            id: summary.id,
            title: summary.title,
            position,
            description: None,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Description split into lines; empty when the description is absent.
    pub fn description_lines(&self) -> Vec<&str> {
        self.description
            .as_deref()
            .map(|text| text.lines().collect())
            .unwrap_or_default()
    }
}

/// A document reference derived from an item's description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLink {
    pub url: String,
    pub item_position: usize,
}

/// Terminal result of one attempted item. Exactly one per attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Success { bytes_written: u64 },
    /// The item carries no document reference. Not a failure.
    NoLinkFound,
    /// The host substituted a markup interstitial for the document.
    QuotaExceeded,
    TransportError(String),
}

impl DownloadOutcome {
    /// Whether this outcome counts against the collection's failure tally.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            DownloadOutcome::QuotaExceeded | DownloadOutcome::TransportError(_)
        )
    }
}

impl fmt::Display for DownloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadOutcome::Success { bytes_written } => write!(f, "downloaded {bytes_written} bytes"),
            DownloadOutcome::NoLinkFound => write!(f, "no document link"),
            DownloadOutcome::QuotaExceeded => write!(f, "download quota exceeded"),
            DownloadOutcome::TransportError(cause) => write!(f, "transport error: {cause}"),
        }
    }
}
