use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Opaque cursor handed out by a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContinuationToken(String);

impl ContinuationToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContinuationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where to resume a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cursor {
    Start,
    Continue(ContinuationToken),
}

/// One page of a listing. `continuation` is `Some` while more pages exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub entries: Vec<T>,
    pub continuation: Option<ContinuationToken>,
}

impl<T> Page<T> {
    pub fn new(entries: Vec<T>, continuation: Option<ContinuationToken>) -> Self {
        Self {
            entries,
            continuation,
        }
    }

    pub fn has_more(&self) -> bool {
        self.continuation.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("invalid catalog url: {0}")]
    InvalidUrl(String),
    #[error("catalog returned http status {status} for {url}")]
    HttpStatus { status: u16, url: String },
    #[error("catalog request timed out: {0}")]
    Timeout(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed catalog payload: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListError {
    /// A page request failed; nothing from the listing is returned.
    #[error("source unavailable while fetching page {page}: {source}")]
    SourceUnavailable {
        page: usize,
        #[source]
        source: CatalogError,
    },
}

/// Raised by the interactive selection collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("prompt failed: {0}")]
pub struct PromptError(pub String);

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("nothing to merge")]
    Empty,
    /// The file holds a stored quota interstitial instead of a document.
    #[error("{} is a quota interstitial page, not a document; inspect the downloaded files", path.display())]
    QuotaCorruption { path: PathBuf },
    #[error("{} is not a readable document: {reason}", path.display())]
    InvalidDocument { path: PathBuf, reason: String },
    #[error("failed to write merged document: {0}")]
    Write(String),
    #[error("persist error: {0}")]
    Persist(#[from] crate::PersistError),
}

/// Run-level failures that stop the whole run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    SourceUnavailable(#[from] ListError),
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error("cannot prepare output folder: {0}")]
    OutputDir(#[from] crate::PersistError),
}
