//! Harvester engine: catalog access, link extraction, streaming downloads,
//! document merging and the run orchestrator.
mod catalog;
mod download;
mod layout;
mod links;
mod merge;
mod orchestrator;
mod pagination;
mod persist;
mod signature;
mod types;

pub use catalog::{CatalogSettings, CatalogSource, HttpCatalog};
pub use download::{DownloadSettings, Downloader, NullProgressSink, ProgressSink, StreamDownloader};
pub use layout::{sanitize_title, OutputLayout, DEFAULT_EXTENSION};
pub use links::{LinkExtractor, DEFAULT_MARKER, DEFAULT_URL_TEMPLATE};
pub use merge::{DocumentMerger, MergeSummary};
pub use orchestrator::{
    Collaborators, CollectionReport, MergeStatus, Orchestrator, ProgressRenderer, RunReport,
    RunSettings, SelectionPrompt, StatusEvent, StatusReporter,
};
pub use pagination::{CollectionPages, ItemPages, PageSource, PaginatedLister};
pub use persist::{ensure_output_dir, PartialFile, PersistError};
pub use signature::{has_document_header, looks_like_markup, ContentSniffer, ContentVerdict};
pub use types::{
    CatalogError, ContinuationToken, Cursor, ListError, MergeError, Page, PromptError, RunError,
};
