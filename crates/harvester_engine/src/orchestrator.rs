use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use harvest_logging::{harvest_error, harvest_info, harvest_warn};
use harvester_core::{
    match_selection, update, Collection, CollectionState, CollectionSummary, CollectionView,
    DownloadOutcome, Effect, Item, ItemProgress, ItemSummary, Msg,
};

use crate::download::{Downloader, ProgressSink};
use crate::merge::{DocumentMerger, MergeSummary};
use crate::pagination::{CollectionPages, ItemPages, PaginatedLister};
use crate::signature::has_document_header;
use crate::{
    ensure_output_dir, CatalogSource, LinkExtractor, MergeError, OutputLayout, PromptError,
    RunError,
};

/// Interactive multi-select and yes/no prompts.
pub trait SelectionPrompt: Send + Sync {
    /// Returns the chosen display names; an empty list when the user skips.
    fn select(&self, message: &str, choices: &[String]) -> Result<Vec<String>, PromptError>;
    fn confirm(&self, message: &str, default: bool) -> Result<bool, PromptError>;
}

/// Progress display measured in items; advanced in fractions of an item.
pub trait ProgressRenderer: Send + Sync {
    fn start(&self, label: &str, total_units: u64);
    fn advance(&self, fraction: f64);
    fn finish(&self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    NoCollections,
    CollectionsSelected {
        count: usize,
        approx_items: u64,
    },
    CollectionStarted {
        title: String,
        selected: usize,
    },
    ItemFailed {
        position: usize,
        title: String,
        outcome: DownloadOutcome,
    },
    CollectionFinished {
        title: String,
        summary: CollectionSummary,
    },
    Merged {
        title: String,
        summary: MergeSummary,
    },
    MergeFailed {
        title: String,
        quota_corruption: bool,
        reason: String,
    },
}

/// User-facing status lines.
pub trait StatusReporter: Send + Sync {
    fn report(&self, event: StatusEvent);
}

/// The outside world the run talks to.
pub struct Collaborators<'a> {
    pub catalog: &'a dyn CatalogSource,
    pub downloader: &'a dyn Downloader,
    pub prompt: &'a dyn SelectionPrompt,
    pub progress: &'a dyn ProgressRenderer,
    pub status: &'a dyn StatusReporter,
}

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub channel_id: String,
    /// Reuse an item file from an earlier run when it carries a document header.
    pub skip_existing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeStatus {
    NotOffered,
    Declined,
    Merged(MergeSummary),
    Failed {
        quota_corruption: bool,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionReport {
    pub title: String,
    pub view: CollectionView,
    pub merge: MergeStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunReport {
    pub collections: Vec<CollectionReport>,
}

impl RunReport {
    /// True when every collection completed and no merge failed.
    pub fn is_clean(&self) -> bool {
        self.collections.iter().all(|report| {
            matches!(
                report.view.summary(),
                CollectionSummary::Complete { .. } | CollectionSummary::NothingSelected
            ) && !matches!(report.merge, MergeStatus::Failed { .. })
        })
    }
}

/// Sequences listing, selection, download and merge. One collection and one
/// item at a time, in listing order.
pub struct Orchestrator<'a> {
    io: Collaborators<'a>,
    extractor: LinkExtractor,
    layout: OutputLayout,
    merger: DocumentMerger,
    settings: RunSettings,
}

struct CollectionContext<'c> {
    collection: &'c Collection,
    folder: PathBuf,
    items: &'c [Item],
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        io: Collaborators<'a>,
        extractor: LinkExtractor,
        layout: OutputLayout,
        settings: RunSettings,
    ) -> Self {
        Self {
            io,
            extractor,
            merger: DocumentMerger::new(layout.clone()),
            layout,
            settings,
        }
    }

    pub async fn run(&self) -> Result<RunReport, RunError> {
        let collections: Vec<Collection> =
            PaginatedLister::new(CollectionPages::new(self.io.catalog, &self.settings.channel_id))
                .collect::<Collection>()
                .await?;
        harvest_info!(
            "Channel {} lists {} collections",
            self.settings.channel_id,
            collections.len()
        );

        let mut report = RunReport::default();
        if collections.is_empty() {
            self.io.status.report(StatusEvent::NoCollections);
            return Ok(report);
        }

        let titles: Vec<String> = collections.iter().map(|c| c.title.clone()).collect();
        let chosen = self
            .io
            .prompt
            .select("Select one or more collection(s)", &titles)?;
        let selected = match_selection(&collections, &chosen);
        self.io.status.report(StatusEvent::CollectionsSelected {
            count: selected.len(),
            approx_items: selected
                .iter()
                .map(|&index| u64::from(collections[index].item_count))
                .sum(),
        });

        for index in selected {
            report
                .collections
                .push(self.process_collection(&collections[index]).await?);
        }
        Ok(report)
    }

    async fn process_collection(
        &self,
        collection: &Collection,
    ) -> Result<CollectionReport, RunError> {
        let items: Vec<Item> = PaginatedLister::new(ItemPages::new(self.io.catalog, &collection.id))
            .keep_duplicates()
            .collect::<ItemSummary>()
            .await?
            .into_iter()
            .enumerate()
            .map(|(position, summary)| Item::from_summary(position, summary))
            .collect();

        let selected = if items.is_empty() {
            harvest_warn!("Collection {} has no items", collection.title);
            Vec::new()
        } else {
            let choices: Vec<String> = items.iter().map(|item| item.title.clone()).collect();
            let chosen = self.io.prompt.select(
                &format!("Select items from {}", collection.title),
                &choices,
            )?;
            match_selection(&items, &chosen)
        };

        let ctx = CollectionContext {
            collection,
            folder: self.layout.collection_dir(&collection.title),
            items: &items,
        };
        let mut merge = MergeStatus::NotOffered;
        let mut state = CollectionState::new(collection.title.clone(), selected.iter().copied());

        if !selected.is_empty() {
            ensure_output_dir(&ctx.folder)?;
            self.io.status.report(StatusEvent::CollectionStarted {
                title: collection.title.clone(),
                selected: selected.len(),
            });
            self.io
                .progress
                .start(&collection.title, selected.len() as u64);

            for index in selected {
                let item = &items[index];
                let detail = match self.io.catalog.item_detail(&item.id).await {
                    Ok(detail) => detail,
                    Err(err) => {
                        harvest_error!("Detail for item {} failed: {}", item.id, err);
                        let msg = Msg::SourceFailed {
                            reason: format!("could not fetch details for \"{}\": {err}", item.title),
                        };
                        state = self.step(state, msg, &ctx, &mut merge)?;
                        break;
                    }
                };

                let item = item.clone().with_description(detail.description);
                let sink = RendererSink::new(self.io.progress);
                let outcome = self.attempt(&item, &ctx.folder, &sink).await;
                harvest_info!("Item {} ({}): {}", item.position + 1, item.title, outcome);
                let msg = Msg::ItemDone {
                    index,
                    outcome,
                    progress_reported: sink.reported(),
                };
                state = self.step(state, msg, &ctx, &mut merge)?;
            }
            self.io.progress.finish();
        }

        let state = self.step(state, Msg::CollectionFinished, &ctx, &mut merge)?;
        Ok(CollectionReport {
            title: collection.title.clone(),
            view: state.view(),
            merge,
        })
    }

    async fn attempt(&self, item: &Item, folder: &Path, sink: &dyn ProgressSink) -> DownloadOutcome {
        let Some(link) = self.extractor.extract(item) else {
            return DownloadOutcome::NoLinkFound;
        };
        let destination = self.layout.item_path(folder, item.position);
        if self.settings.skip_existing {
            if let Some(bytes_written) = existing_document_len(&destination) {
                harvest_info!("Reusing {:?} from an earlier run", destination);
                return DownloadOutcome::Success { bytes_written };
            }
        }
        self.io.downloader.download(&link.url, &destination, sink).await
    }

    fn step(
        &self,
        state: CollectionState,
        msg: Msg,
        ctx: &CollectionContext<'_>,
        merge: &mut MergeStatus,
    ) -> Result<CollectionState, RunError> {
        let (state, effects) = update(state, msg);
        for effect in effects {
            self.apply(effect, ctx, merge)?;
        }
        Ok(state)
    }

    fn apply(
        &self,
        effect: Effect,
        ctx: &CollectionContext<'_>,
        merge: &mut MergeStatus,
    ) -> Result<(), RunError> {
        let title = &ctx.collection.title;
        match effect {
            Effect::AdvanceProgress { fraction } => self.io.progress.advance(fraction),
            Effect::ReportItemFailure { index, outcome } => {
                self.io.status.report(StatusEvent::ItemFailed {
                    position: index,
                    title: ctx.items[index].title.clone(),
                    outcome,
                });
            }
            Effect::ReportSummary(summary) => {
                self.io.status.report(StatusEvent::CollectionFinished {
                    title: title.clone(),
                    summary,
                });
            }
            Effect::OfferMerge {
                indices,
                default_yes,
            } => {
                let question = format!("Merge the documents of {title} into one?");
                if !self.io.prompt.confirm(&question, default_yes)? {
                    harvest_info!("Merge of {} declined", title);
                    *merge = MergeStatus::Declined;
                    return Ok(());
                }
                *merge = match self.merger.merge(title, &ctx.folder, &indices) {
                    Ok(summary) => {
                        self.io.status.report(StatusEvent::Merged {
                            title: title.clone(),
                            summary: summary.clone(),
                        });
                        MergeStatus::Merged(summary)
                    }
                    Err(err) => {
                        harvest_error!("Merge of {} failed: {}", title, err);
                        let quota_corruption = matches!(err, MergeError::QuotaCorruption { .. });
                        self.io.status.report(StatusEvent::MergeFailed {
                            title: title.clone(),
                            quota_corruption,
                            reason: err.to_string(),
                        });
                        MergeStatus::Failed {
                            quota_corruption,
                            reason: err.to_string(),
                        }
                    }
                };
            }
        }
        Ok(())
    }
}

/// Forwards clamped per-chunk fractions to the renderer and remembers how
/// much of the item's unit was shown.
struct RendererSink<'r> {
    renderer: &'r dyn ProgressRenderer,
    progress: Mutex<ItemProgress>,
}

impl<'r> RendererSink<'r> {
    fn new(renderer: &'r dyn ProgressRenderer) -> Self {
        Self {
            renderer,
            progress: Mutex::new(ItemProgress::default()),
        }
    }

    fn reported(&self) -> f64 {
        self.progress
            .lock()
            .map(|progress| progress.reported())
            .unwrap_or(0.0)
    }
}

impl ProgressSink for RendererSink<'_> {
    fn advance(&self, fraction: f64) {
        let delta = match self.progress.lock() {
            Ok(mut progress) => progress.advance(fraction),
            Err(_) => return,
        };
        if delta > 0.0 {
            self.renderer.advance(delta);
        }
    }
}

/// Size of a file that already holds a document, if any.
fn existing_document_len(path: &Path) -> Option<u64> {
    let mut head = [0u8; 8];
    let mut file = fs::File::open(path).ok()?;
    let read = file.read(&mut head).ok()?;
    if !has_document_header(&head[..read]) {
        return None;
    }
    file.metadata().ok().map(|meta| meta.len())
}
