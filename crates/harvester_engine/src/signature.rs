//! Content signature checks.
//!
//! Throttled hosts answer a document request with an HTML interstitial and a
//! success status, so the bytes themselves have to be inspected.

/// Markers of an HTML document, matched ASCII case-insensitively.
const MARKUP_MARKERS: &[&[u8]] = &[b"<!doctype html", b"<html"];

/// Leading bytes of every PDF file.
pub const DOCUMENT_HEADER: &[u8] = b"%PDF-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentVerdict {
    Document,
    MarkupInterstitial,
}

pub fn looks_like_markup(bytes: &[u8]) -> bool {
    MARKUP_MARKERS
        .iter()
        .any(|marker| contains_ignore_ascii_case(bytes, marker))
}

pub fn has_document_header(bytes: &[u8]) -> bool {
    bytes.starts_with(DOCUMENT_HEADER)
}

/// Streaming markup detector.
///
/// Keeps the tail of the previous chunk so a marker split across a chunk
/// boundary is still found.
#[derive(Debug, Default)]
pub struct ContentSniffer {
    carry: Vec<u8>,
}

impl ContentSniffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inspect(&mut self, chunk: &[u8]) -> ContentVerdict {
        let mut window = std::mem::take(&mut self.carry);
        window.extend_from_slice(chunk);
        let verdict = if looks_like_markup(&window) {
            ContentVerdict::MarkupInterstitial
        } else {
            ContentVerdict::Document
        };
        let keep = longest_marker().saturating_sub(1).min(window.len());
        self.carry = window.split_off(window.len() - keep);
        verdict
    }
}

fn longest_marker() -> usize {
    MARKUP_MARKERS.iter().map(|m| m.len()).max().unwrap_or(0)
}

fn contains_ignore_ascii_case(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() || haystack.len() < needle.len() {
        return false;
    }
    haystack
        .windows(needle.len())
        .any(|window| window.eq_ignore_ascii_case(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_markup_regardless_of_case() {
        assert!(looks_like_markup(b"<!DOCTYPE html><html><body>Quota exceeded</body></html>"));
        assert!(looks_like_markup(b"\n\n<HTML lang=\"en\">"));
        assert!(!looks_like_markup(b"%PDF-1.7\n1 0 obj"));
    }

    #[test]
    fn marker_split_across_chunks_is_detected() {
        let mut sniffer = ContentSniffer::new();
        assert_eq!(sniffer.inspect(b"garbage <!DOCTY"), ContentVerdict::Document);
        assert_eq!(sniffer.inspect(b"PE html>"), ContentVerdict::MarkupInterstitial);
    }

    #[test]
    fn document_chunks_pass() {
        let mut sniffer = ContentSniffer::new();
        assert_eq!(sniffer.inspect(b"%PDF-1.5\n"), ContentVerdict::Document);
        assert_eq!(sniffer.inspect(&[0u8; 4096]), ContentVerdict::Document);
        assert_eq!(sniffer.inspect(b""), ContentVerdict::Document);
    }

    #[test]
    fn header_check_is_exact_prefix() {
        assert!(has_document_header(b"%PDF-1.4 rest"));
        assert!(!has_document_header(b" %PDF-1.4"));
        assert!(!has_document_header(b"<html>"));
    }
}
