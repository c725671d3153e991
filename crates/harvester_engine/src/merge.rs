use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use harvest_logging::{harvest_debug, harvest_info, harvest_warn};
use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::persist::PartialFile;
use crate::signature::{has_document_header, looks_like_markup};
use crate::{MergeError, OutputLayout};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: &[&[u8]] = &[b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

const SNIFF_LEN: u64 = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSummary {
    pub output_path: PathBuf,
    pub page_count: usize,
    /// Indices whose files went into the output, in output order.
    pub merged: Vec<usize>,
    /// Indices skipped because no file exists for them.
    pub missing: Vec<usize>,
}

/// Concatenates a collection's downloaded documents into one.
#[derive(Debug, Clone)]
pub struct DocumentMerger {
    layout: OutputLayout,
}

impl DocumentMerger {
    pub fn new(layout: OutputLayout) -> Self {
        Self { layout }
    }

    /// Merges the files for `indices` (ascending) from `collection_dir`.
    ///
    /// Indices without a file were attempted but produced nothing and are
    /// skipped. A file that exists but is not a readable document aborts the
    /// merge before anything is written. Source files are never modified.
    pub fn merge(
        &self,
        collection_title: &str,
        collection_dir: &Path,
        indices: &[usize],
    ) -> Result<MergeSummary, MergeError> {
        let mut ordered = indices.to_vec();
        ordered.sort_unstable();
        ordered.dedup();

        let mut documents = Vec::with_capacity(ordered.len());
        let mut merged = Vec::with_capacity(ordered.len());
        let mut missing = Vec::new();
        for index in ordered {
            let path = self.layout.item_path(collection_dir, index);
            if !path.is_file() {
                harvest_warn!("No file for item {} at {:?}; skipping", index + 1, path);
                missing.push(index);
                continue;
            }
            documents.push(load_document(&path)?);
            merged.push(index);
        }

        if documents.is_empty() {
            return Err(MergeError::Empty);
        }

        let (mut combined, page_count) = combine(documents)?;
        let output_path = self.layout.merged_path(collection_title);
        let mut partial = PartialFile::create(&output_path)?;
        combined
            .save_to(partial.file_mut())
            .map_err(|err| MergeError::Write(err.to_string()))?;
        let output_path = partial.commit()?;

        harvest_info!(
            "Merged {} documents ({} pages) into {:?}",
            merged.len(),
            page_count,
            output_path
        );
        Ok(MergeSummary {
            output_path,
            page_count,
            merged,
            missing,
        })
    }
}

fn load_document(path: &Path) -> Result<Document, MergeError> {
    let head = read_head(path).map_err(|err| MergeError::InvalidDocument {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    if !has_document_header(&head) {
        return Err(classify_unreadable(path, &head, "missing document header"));
    }
    let document = Document::load(path)
        .map_err(|err| classify_unreadable(path, &head, &err.to_string()))?;
    if document.get_pages().is_empty() {
        return Err(MergeError::InvalidDocument {
            path: path.to_path_buf(),
            reason: "document has no pages".into(),
        });
    }
    harvest_debug!("Loaded {:?} ({} pages)", path, document.get_pages().len());
    Ok(document)
}

fn read_head(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut head = Vec::new();
    fs::File::open(path)?.take(SNIFF_LEN).read_to_end(&mut head)?;
    Ok(head)
}

fn classify_unreadable(path: &Path, head: &[u8], reason: &str) -> MergeError {
    if looks_like_markup(head) {
        MergeError::QuotaCorruption {
            path: path.to_path_buf(),
        }
    } else {
        MergeError::InvalidDocument {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// Builds one document holding every page of `documents`, in order.
fn combine(documents: Vec<Document>) -> Result<(Document, usize), MergeError> {
    let mut max_id = 1;
    let mut pages: Vec<(ObjectId, Dictionary)> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for mut document in documents {
        document.renumber_objects_with(max_id);
        max_id = document.max_id + 1;

        for page_id in document.get_pages().into_values() {
            let page = flattened_page(&document, page_id).ok_or_else(|| {
                MergeError::Write(format!("page object {page_id:?} is not a dictionary"))
            })?;
            pages.push((page_id, page));
        }
        objects.extend(document.objects);
    }

    let mut combined = Document::with_version("1.5");
    let mut catalog: Option<(ObjectId, Dictionary)> = None;
    let mut pages_root: Option<(ObjectId, Dictionary)> = None;

    for (id, object) in objects {
        match type_name(&object) {
            Some(b"Catalog") => {
                if catalog.is_none() {
                    catalog = object.as_dict().ok().map(|dict| (id, dict.clone()));
                }
            }
            Some(b"Pages") => {
                if pages_root.is_none() {
                    pages_root = object.as_dict().ok().map(|dict| (id, dict.clone()));
                }
            }
            // Pages are re-inserted below; outlines would point at dropped trees.
            Some(b"Page") | Some(b"Outlines") | Some(b"Outline") => {}
            _ => {
                combined.objects.insert(id, object);
            }
        }
    }

    let (pages_id, mut pages_dict) =
        pages_root.ok_or_else(|| MergeError::Write("no page tree root found".into()))?;
    let (catalog_id, mut catalog_dict) =
        catalog.ok_or_else(|| MergeError::Write("no document catalog found".into()))?;

    let page_count = pages.len();
    let kids: Vec<Object> = pages.iter().map(|(id, _)| Object::Reference(*id)).collect();
    for (id, mut page) in pages {
        page.set("Parent", Object::Reference(pages_id));
        combined.objects.insert(id, Object::Dictionary(page));
    }

    pages_dict.set("Kids", Object::Array(kids));
    pages_dict.set("Count", Object::Integer(page_count as i64));
    pages_dict.remove(b"Parent");
    combined
        .objects
        .insert(pages_id, Object::Dictionary(pages_dict));

    catalog_dict.set("Pages", Object::Reference(pages_id));
    catalog_dict.remove(b"Outlines");
    combined
        .objects
        .insert(catalog_id, Object::Dictionary(catalog_dict));

    combined.trailer.set("Root", Object::Reference(catalog_id));
    combined.max_id = combined.objects.keys().map(|(id, _)| *id).max().unwrap_or(0);
    combined.renumber_objects();
    combined.compress();
    Ok((combined, page_count))
}

/// Page dictionary with inherited attributes copied in, since intermediate
/// page tree nodes are dropped when re-parenting.
fn flattened_page(document: &Document, page_id: ObjectId) -> Option<Dictionary> {
    let mut page = document.get_object(page_id).ok()?.as_dict().ok()?.clone();
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;
    while let Some(parent_id) = parent {
        depth += 1;
        if depth > 64 {
            break;
        }
        let Some(node) = document
            .get_object(parent_id)
            .ok()
            .and_then(|object| object.as_dict().ok())
        else {
            break;
        };
        for key in INHERITABLE {
            if page.get(key).is_err() {
                if let Ok(value) = node.get(key) {
                    page.set(key.to_vec(), value.clone());
                }
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    Some(page)
}

fn type_name(object: &Object) -> Option<&[u8]> {
    object
        .as_dict()
        .ok()?
        .get(b"Type")
        .and_then(Object::as_name)
        .ok()
}
