//! Harvester core: pure domain model, selection bookkeeping and the
//! per-collection state machine.
mod effect;
mod model;
mod msg;
mod selection;
mod state;
mod title;
mod update;
mod view_model;

pub use effect::Effect;
pub use model::{Collection, DocumentLink, DownloadOutcome, Item, ItemDetail, ItemSummary};
pub use msg::Msg;
pub use selection::{ItemProgress, SelectionReconciler, SelectionSet};
pub use state::CollectionState;
pub use title::{dedupe_by_title, match_selection, TitleKey, Titled};
pub use update::update;
pub use view_model::{CollectionSummary, CollectionView};
