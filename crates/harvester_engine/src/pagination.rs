use std::collections::HashSet;
use std::pin::pin;

use futures_util::stream::{self, Stream};
use futures_util::StreamExt;
use harvest_logging::{harvest_debug, harvest_warn};
use harvester_core::{dedupe_by_title, Collection, ItemSummary, Titled};

use crate::{CatalogError, CatalogSource, ContinuationToken, Cursor, ListError, Page};

/// A listing that can be read page by page from a cursor.
#[async_trait::async_trait]
pub trait PageSource<T>: Send + Sync {
    async fn fetch(&self, cursor: &Cursor) -> Result<Page<T>, CatalogError>;
}

/// A channel's collections.
pub struct CollectionPages<'a> {
    catalog: &'a dyn CatalogSource,
    channel_id: String,
}

impl<'a> CollectionPages<'a> {
    pub fn new(catalog: &'a dyn CatalogSource, channel_id: impl Into<String>) -> Self {
        Self {
            catalog,
            channel_id: channel_id.into(),
        }
    }
}

#[async_trait::async_trait]
impl<'a> PageSource<Collection> for CollectionPages<'a> {
    async fn fetch(&self, cursor: &Cursor) -> Result<Page<Collection>, CatalogError> {
        match cursor {
            Cursor::Start => self.catalog.collections(&self.channel_id).await,
            Cursor::Continue(token) => self.catalog.collections_page(token).await,
        }
    }
}

/// A collection's items.
pub struct ItemPages<'a> {
    catalog: &'a dyn CatalogSource,
    collection_id: String,
}

impl<'a> ItemPages<'a> {
    pub fn new(catalog: &'a dyn CatalogSource, collection_id: impl Into<String>) -> Self {
        Self {
            catalog,
            collection_id: collection_id.into(),
        }
    }
}

#[async_trait::async_trait]
impl<'a> PageSource<ItemSummary> for ItemPages<'a> {
    async fn fetch(&self, cursor: &Cursor) -> Result<Page<ItemSummary>, CatalogError> {
        match cursor {
            Cursor::Start => self.catalog.items(&self.collection_id).await,
            Cursor::Continue(token) => self.catalog.items_page(token).await,
        }
    }
}

/// Position of a page walk and the tokens it has already followed.
struct Walk {
    cursor: Cursor,
    page_number: usize,
    seen: HashSet<ContinuationToken>,
}

/// Drains a paginated listing into one ordered sequence.
///
/// Pages are requested while the previous page carries a continuation token.
/// Any failing page aborts the whole listing. By default entries with an
/// equivalent title collapse to the first one seen.
pub struct PaginatedLister<S> {
    source: S,
    dedupe: bool,
}

impl<S> PaginatedLister<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            dedupe: true,
        }
    }

    /// Keeps entries with repeated titles.
    pub fn keep_duplicates(mut self) -> Self {
        self.dedupe = false;
        self
    }

    /// Lazy page stream. Ends after the last page, right after the first
    /// error, or when a continuation token comes back a second time.
    pub fn pages<T>(&self) -> impl Stream<Item = Result<Page<T>, ListError>> + '_
    where
        S: PageSource<T>,
        T: Send + 'static,
    {
        let source = &self.source;
        let start = Walk {
            cursor: Cursor::Start,
            page_number: 0,
            seen: HashSet::new(),
        };
        stream::unfold(Some(start), move |state| async move {
            let Some(mut walk) = state else {
                return None;
            };
            match source.fetch(&walk.cursor).await {
                Ok(page) => {
                    harvest_debug!(
                        "Fetched page {} ({} entries, more={})",
                        walk.page_number,
                        page.entries.len(),
                        page.has_more()
                    );
                    let next = match page.continuation.clone() {
                        None => None,
                        Some(token) => {
                            if walk.seen.insert(token.clone()) {
                                Some(Walk {
                                    cursor: Cursor::Continue(token),
                                    page_number: walk.page_number + 1,
                                    seen: walk.seen,
                                })
                            } else {
                                harvest_warn!(
                                    "Listing repeated continuation token {}; stopping",
                                    token
                                );
                                None
                            }
                        }
                    };
                    Some((Ok(page), next))
                }
                Err(source_err) => Some((
                    Err(ListError::SourceUnavailable {
                        page: walk.page_number,
                        source: source_err,
                    }),
                    None,
                )),
            }
        })
    }

    /// Materializes every page. The caller needs the full count before selection.
    pub async fn collect<T>(&self) -> Result<Vec<T>, ListError>
    where
        S: PageSource<T>,
        T: Titled + Send + 'static,
    {
        let mut entries = Vec::new();
        let mut pages = pin!(self.pages::<T>());
        while let Some(page) = pages.next().await {
            entries.extend(page?.entries);
        }
        if self.dedupe {
            let before = entries.len();
            entries = dedupe_by_title(entries);
            if entries.len() != before {
                harvest_debug!("Dropped {} entries with duplicate titles", before - entries.len());
            }
        }
        Ok(entries)
    }
}
