#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use harvester_core::{Collection, ItemDetail, ItemSummary};
use harvester_engine::{
    CatalogError, CatalogSource, ContinuationToken, Page, ProgressRenderer, ProgressSink,
    PromptError, SelectionPrompt, StatusEvent, StatusReporter,
};
use lopdf::{Dictionary, Document, Object, Stream};

/// A PDF whose pages are told apart by their MediaBox width.
pub fn pdf_with_pages(widths: &[i64]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut font = Dictionary::new();
    font.set("Type", Object::Name(b"Font".to_vec()));
    font.set("Subtype", Object::Name(b"Type1".to_vec()));
    font.set("BaseFont", Object::Name(b"Courier".to_vec()));
    let font_id = doc.add_object(Object::Dictionary(font));
    let mut fonts = Dictionary::new();
    fonts.set("F1", Object::Reference(font_id));
    let mut resources = Dictionary::new();
    resources.set("Font", Object::Dictionary(fonts));
    let resources_id = doc.add_object(Object::Dictionary(resources));

    let mut kids = Vec::new();
    for width in widths {
        let content = format!("BT /F1 24 Tf 20 100 Td (page {width}) Tj ET");
        let content_id = doc.add_object(Object::Stream(Stream::new(
            Dictionary::new(),
            content.into_bytes(),
        )));
        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(pages_id));
        page.set("Contents", Object::Reference(content_id));
        page.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(*width),
                Object::Integer(200),
            ]),
        );
        kids.push(Object::Reference(doc.add_object(Object::Dictionary(page))));
    }

    let mut pages = Dictionary::new();
    pages.set("Type", Object::Name(b"Pages".to_vec()));
    pages.set("Count", Object::Integer(widths.len() as i64));
    pages.set("Kids", Object::Array(kids));
    // Inherited by every page.
    pages.set("Resources", Object::Reference(resources_id));
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(Object::Dictionary(catalog));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// MediaBox widths of every page, in page order.
pub fn page_widths(path: &Path) -> Vec<i64> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .values()
        .map(|page_id| {
            let page = doc.get_object(*page_id).unwrap().as_dict().unwrap();
            page.get(b"MediaBox").unwrap().as_array().unwrap()[2]
                .as_i64()
                .unwrap()
        })
        .collect()
}

/// Whether every page carries its own Resources entry.
pub fn pages_carry_resources(path: &Path) -> bool {
    let doc = Document::load(path).unwrap();
    doc.get_pages().values().all(|page_id| {
        doc.get_object(*page_id)
            .unwrap()
            .as_dict()
            .unwrap()
            .get(b"Resources")
            .is_ok()
    })
}

pub const QUOTA_PAGE: &str = "<!DOCTYPE html><html><head><title>Google Drive - Quota exceeded</title></head><body>Too many users have viewed or downloaded this file recently.</body></html>";

#[derive(Default)]
pub struct RecordingSink {
    pub fractions: Mutex<Vec<f64>>,
}

impl RecordingSink {
    pub fn total(&self) -> f64 {
        self.fractions.lock().unwrap().iter().sum()
    }
}

impl ProgressSink for RecordingSink {
    fn advance(&self, fraction: f64) {
        self.fractions.lock().unwrap().push(fraction);
    }
}

/// In-memory catalog. Listings are split into pages of `page_size`.
#[derive(Default)]
pub struct FakeCatalog {
    pub collections: Vec<Collection>,
    pub items: HashMap<String, Vec<ItemSummary>>,
    pub descriptions: HashMap<String, Option<String>>,
    pub failing_details: Vec<String>,
    pub page_size: usize,
    pub detail_calls: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            ..Self::default()
        }
    }

    pub fn with_collection(mut self, id: &str, title: &str, items: &[(&str, &str, Option<&str>)]) -> Self {
        self.collections
            .push(Collection::new(id, title, items.len() as u32));
        self.items.insert(
            id.to_string(),
            items
                .iter()
                .map(|(item_id, item_title, _)| ItemSummary::new(*item_id, *item_title))
                .collect(),
        );
        for (item_id, _, description) in items {
            self.descriptions
                .insert(item_id.to_string(), description.map(str::to_string));
        }
        self
    }

    fn page_of<T: Clone>(&self, kind: &str, key: &str, entries: &[T], start: usize) -> Page<T> {
        let end = (start + self.page_size).min(entries.len());
        let continuation = (end < entries.len())
            .then(|| ContinuationToken::new(format!("{kind}|{key}|{end}")));
        Page::new(entries[start..end].to_vec(), continuation)
    }

    fn parse_token(token: &ContinuationToken) -> (String, String, usize) {
        let mut parts = token.as_str().split('|');
        let kind = parts.next().unwrap().to_string();
        let key = parts.next().unwrap().to_string();
        let start = parts.next().unwrap().parse().unwrap();
        (kind, key, start)
    }
}

#[async_trait::async_trait]
impl CatalogSource for FakeCatalog {
    async fn collections(&self, channel_id: &str) -> Result<Page<Collection>, CatalogError> {
        Ok(self.page_of("collections", channel_id, &self.collections, 0))
    }

    async fn collections_page(
        &self,
        token: &ContinuationToken,
    ) -> Result<Page<Collection>, CatalogError> {
        let (_, key, start) = Self::parse_token(token);
        Ok(self.page_of("collections", &key, &self.collections, start))
    }

    async fn items(&self, collection_id: &str) -> Result<Page<ItemSummary>, CatalogError> {
        let items = self.items.get(collection_id).cloned().unwrap_or_default();
        Ok(self.page_of("items", collection_id, &items, 0))
    }

    async fn items_page(
        &self,
        token: &ContinuationToken,
    ) -> Result<Page<ItemSummary>, CatalogError> {
        let (_, key, start) = Self::parse_token(token);
        let items = self.items.get(&key).cloned().unwrap_or_default();
        Ok(self.page_of("items", &key, &items, start))
    }

    async fn item_detail(&self, item_id: &str) -> Result<ItemDetail, CatalogError> {
        self.detail_calls.lock().unwrap().push(item_id.to_string());
        if self.failing_details.iter().any(|id| id == item_id) {
            return Err(CatalogError::HttpStatus {
                status: 503,
                url: format!("fake://items/{item_id}"),
            });
        }
        Ok(ItemDetail {
            id: item_id.to_string(),
            description: self.descriptions.get(item_id).cloned().flatten(),
        })
    }
}

/// Selects everything offered and answers confirmations with their default,
/// unless told otherwise.
#[derive(Default)]
pub struct ScriptedPrompt {
    pub confirm_answer: Option<bool>,
    pub item_filter: Option<Vec<String>>,
    pub selections: Mutex<Vec<(String, Vec<String>)>>,
    pub confirmations: Mutex<Vec<(String, bool)>>,
}

impl SelectionPrompt for ScriptedPrompt {
    fn select(&self, message: &str, choices: &[String]) -> Result<Vec<String>, PromptError> {
        self.selections
            .lock()
            .unwrap()
            .push((message.to_string(), choices.to_vec()));
        let chosen = match (&self.item_filter, message.starts_with("Select items")) {
            (Some(filter), true) => choices
                .iter()
                .filter(|choice| filter.contains(choice))
                .cloned()
                .collect(),
            _ => choices.to_vec(),
        };
        Ok(chosen)
    }

    fn confirm(&self, message: &str, default: bool) -> Result<bool, PromptError> {
        self.confirmations
            .lock()
            .unwrap()
            .push((message.to_string(), default));
        Ok(self.confirm_answer.unwrap_or(default))
    }
}

#[derive(Default)]
pub struct RecordingProgress {
    pub started: Mutex<Vec<(String, u64)>>,
    pub advanced: Mutex<f64>,
    pub finished: Mutex<usize>,
}

impl ProgressRenderer for RecordingProgress {
    fn start(&self, label: &str, total_units: u64) {
        self.started
            .lock()
            .unwrap()
            .push((label.to_string(), total_units));
    }

    fn advance(&self, fraction: f64) {
        *self.advanced.lock().unwrap() += fraction;
    }

    fn finish(&self) {
        *self.finished.lock().unwrap() += 1;
    }
}

#[derive(Default)]
pub struct RecordingStatus {
    pub events: Mutex<Vec<StatusEvent>>,
}

impl StatusReporter for RecordingStatus {
    fn report(&self, event: StatusEvent) {
        self.events.lock().unwrap().push(event);
    }
}
