use harvester_core::{DocumentLink, Item};
use url::Url;

pub const DEFAULT_MARKER: &str = "PDF";
pub const DEFAULT_URL_TEMPLATE: &str = "https://drive.google.com/uc?id={id}&export=download";

const ID_PLACEHOLDER: &str = "{id}";

/// Finds a document reference in free-text descriptions.
///
/// The first line containing the marker (case-sensitive) announces the
/// document; the line after it is read as a slash-delimited share link whose
/// second-to-last segment is the host's object id. The id is substituted into
/// the URL template. Anything that does not fit that shape yields no link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkExtractor {
    marker: String,
    url_template: String,
}

impl LinkExtractor {
    pub fn new(marker: impl Into<String>, url_template: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            url_template: url_template.into(),
        }
    }

    pub fn extract(&self, item: &Item) -> Option<DocumentLink> {
        let url = self.extract_from_lines(&item.description_lines())?;
        Some(DocumentLink {
            url,
            item_position: item.position,
        })
    }

    pub fn extract_from_lines(&self, lines: &[&str]) -> Option<String> {
        if self.marker.is_empty() {
            return None;
        }
        let marker_line = lines.iter().position(|line| line.contains(&self.marker))?;
        let path_line = lines.get(marker_line + 1)?;
        let object_id = object_id_from_path(path_line)?;
        self.compose(object_id)
    }

    fn compose(&self, object_id: &str) -> Option<String> {
        if !self.url_template.contains(ID_PLACEHOLDER) {
            return None;
        }
        let encoded: String = url::form_urlencoded::byte_serialize(object_id.as_bytes()).collect();
        let candidate = self.url_template.replace(ID_PLACEHOLDER, &encoded);
        Url::parse(&candidate).ok().map(String::from)
    }
}

impl Default for LinkExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER, DEFAULT_URL_TEMPLATE)
    }
}

fn object_id_from_path(line: &str) -> Option<&str> {
    let segments: Vec<&str> = line.trim().split('/').collect();
    if segments.len() < 2 {
        return None;
    }
    let id = segments[segments.len() - 2].trim();
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}
