use std::path::{Path, PathBuf};

pub const DEFAULT_EXTENSION: &str = "pdf";

const MAX_NAME_CHARS: usize = 200;

/// Deterministic on-disk naming for a run:
///
/// - `{root}/{sanitized collection title}/` per collection,
/// - `{folder}/{position + 1}.{ext}` per item,
/// - `{root}/{sanitized collection title}.{ext}` for the merged document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
    extension: String,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        Self {
            root: root.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn collection_dir(&self, title: &str) -> PathBuf {
        self.root.join(sanitize_title(title))
    }

    pub fn item_path(&self, collection_dir: &Path, position: usize) -> PathBuf {
        collection_dir.join(format!("{}.{}", position + 1, self.extension))
    }

    /// Sits next to the collection folder, not inside it.
    pub fn merged_path(&self, title: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", sanitize_title(title), self.extension))
    }
}

impl Default for OutputLayout {
    fn default() -> Self {
        Self::new(".", DEFAULT_EXTENSION)
    }
}

/// Strips characters that are illegal in file names on common platforms.
pub fn sanitize_title(input: &str) -> String {
    let cleaned: String = input.chars().filter(|c| !is_forbidden(*c)).collect();
    let mut name = cleaned.trim_matches(&[' ', '.'][..]).to_string();
    if let Some((cut, _)) = name.char_indices().nth(MAX_NAME_CHARS) {
        name.truncate(cut);
        name = name.trim_end_matches(&[' ', '.'][..]).to_string();
    }
    if name.is_empty() {
        name = "untitled".to_string();
    }
    if is_reserved_windows_name(&name) {
        name.push('_');
    }
    name
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}' | '\u{7F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    let stem = name.split('.').next().unwrap_or(name);
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(stem))
}
