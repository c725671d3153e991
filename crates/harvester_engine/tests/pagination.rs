use std::sync::{Arc, Mutex};

use futures_util::StreamExt;
use harvester_core::Collection;
use harvester_engine::{
    CatalogError, ContinuationToken, Cursor, ListError, Page, PageSource, PaginatedLister,
};
use pretty_assertions::assert_eq;

/// Serves pre-built pages; page `n` is reached with token `p{n}`.
struct ScriptedPages {
    pages: Vec<Vec<&'static str>>,
    fail_at: Option<usize>,
    /// Overrides which page each page's token points to.
    links: Option<Vec<usize>>,
    requested: Arc<Mutex<Vec<Cursor>>>,
}

impl ScriptedPages {
    fn new(pages: Vec<Vec<&'static str>>) -> Self {
        Self {
            pages,
            fail_at: None,
            links: None,
            requested: Arc::default(),
        }
    }
}

#[async_trait::async_trait]
impl PageSource<Collection> for ScriptedPages {
    async fn fetch(&self, cursor: &Cursor) -> Result<Page<Collection>, CatalogError> {
        self.requested.lock().unwrap().push(cursor.clone());
        let number = match cursor {
            Cursor::Start => 0,
            Cursor::Continue(token) => token.as_str()[1..].parse::<usize>().unwrap(),
        };
        if self.fail_at == Some(number) {
            return Err(CatalogError::Network("connection reset".into()));
        }
        let entries = self.pages[number]
            .iter()
            .enumerate()
            .map(|(i, title)| Collection::new(format!("{number}-{i}"), *title, 1))
            .collect();
        let continuation = match &self.links {
            Some(links) => Some(ContinuationToken::new(format!("p{}", links[number]))),
            None => (number + 1 < self.pages.len())
                .then(|| ContinuationToken::new(format!("p{}", number + 1))),
        };
        Ok(Page::new(entries, continuation))
    }
}

fn titles(entries: &[Collection]) -> Vec<&str> {
    entries.iter().map(|c| c.title.as_str()).collect()
}

#[tokio::test]
async fn drains_all_pages_in_fetch_order_and_dedupes() {
    let source = ScriptedPages::new(vec![
        vec!["Intro", "Calculus"],
        vec!["Physics", "intro"],
        vec!["CALCULUS", "Chemistry"],
    ]);
    let lister = PaginatedLister::new(source);

    let entries = lister.collect::<Collection>().await.unwrap();

    assert_eq!(titles(&entries), vec!["Intro", "Calculus", "Physics", "Chemistry"]);
    assert_eq!(entries[0].id, "0-0");
}

#[tokio::test]
async fn keep_duplicates_returns_plain_concatenation() {
    let source = ScriptedPages::new(vec![vec!["Lecture"], vec!["Lecture", "Quiz"]]);
    let entries = PaginatedLister::new(source)
        .keep_duplicates()
        .collect::<Collection>()
        .await
        .unwrap();
    assert_eq!(titles(&entries), vec!["Lecture", "Lecture", "Quiz"]);
}

#[tokio::test]
async fn output_count_matches_distinct_titles() {
    let cases: Vec<Vec<Vec<&'static str>>> = vec![
        vec![vec![]],
        vec![vec!["a", "b", "c"]],
        vec![vec!["a", "b"], vec!["c", "d"], vec!["e"]],
        vec![vec!["a", "A"], vec!["a "], vec!["b"]],
        vec![vec!["x"], vec![], vec!["X", "y"]],
    ];
    for pages in cases {
        let total: usize = pages.iter().map(Vec::len).sum();
        let mut distinct: Vec<String> = pages
            .iter()
            .flatten()
            .map(|t| t.to_lowercase())
            .collect();
        distinct.sort();
        distinct.dedup();

        let entries = PaginatedLister::new(ScriptedPages::new(pages))
            .collect::<Collection>()
            .await
            .unwrap();

        assert!(entries.len() <= total);
        assert_eq!(entries.len(), distinct.len());
        assert_eq!(entries.len() == total, distinct.len() == total);
    }
}

#[tokio::test]
async fn failing_page_aborts_whole_listing() {
    let mut source = ScriptedPages::new(vec![vec!["a"], vec!["b"], vec!["c"]]);
    source.fail_at = Some(1);
    let lister = PaginatedLister::new(source);

    let err = lister.collect::<Collection>().await.unwrap_err();

    assert_eq!(
        err,
        ListError::SourceUnavailable {
            page: 1,
            source: CatalogError::Network("connection reset".into()),
        }
    );
}

#[tokio::test]
async fn page_stream_is_lazy_and_follows_tokens() {
    let source = ScriptedPages::new(vec![vec!["a"], vec!["b"], vec!["c"]]);
    let lister = PaginatedLister::new(source);

    let first: Vec<_> = lister.pages::<Collection>().take(1).collect().await;
    assert_eq!(first.len(), 1);

    let all: Vec<_> = lister.pages::<Collection>().collect().await;
    assert_eq!(all.len(), 3);
    assert!(all.iter().all(Result::is_ok));
}

#[tokio::test]
async fn repeated_token_ends_listing() {
    let mut source = ScriptedPages::new(vec![vec!["a"], vec!["b"], vec!["c"]]);
    source.links = Some(vec![1, 1, 2]);
    let lister = PaginatedLister::new(source);

    let entries = lister.collect::<Collection>().await.unwrap();

    // Start -> p1, then p1 hands out p1 again.
    assert_eq!(titles(&entries), vec!["a", "b"]);
}

#[tokio::test]
async fn token_cycle_ends_listing() {
    let mut source = ScriptedPages::new(vec![vec!["a"], vec!["b"], vec!["c"]]);
    // p1 -> p2 -> p1
    source.links = Some(vec![1, 2, 1]);
    let requested = Arc::clone(&source.requested);
    let lister = PaginatedLister::new(source);

    let entries = lister.collect::<Collection>().await.unwrap();

    assert_eq!(titles(&entries), vec!["a", "b", "c"]);
    assert_eq!(requested.lock().unwrap().len(), 3);
}
