use std::collections::HashSet;

use unicode_normalization::UnicodeNormalization;

use crate::{Collection, Item, ItemSummary};

/// Anything listed under a display title.
pub trait Titled {
    fn title(&self) -> &str;
}

impl Titled for Collection {
    fn title(&self) -> &str {
        &self.title
    }
}

impl Titled for ItemSummary {
    fn title(&self) -> &str {
        &self.title
    }
}

impl Titled for Item {
    fn title(&self) -> &str {
        &self.title
    }
}

/// Comparison key for display titles: case-insensitive and canonically
/// normalized (NFC), so composed and decomposed accents compare equal.
/// Whitespace is significant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TitleKey(String);

impl TitleKey {
    pub fn new(title: &str) -> Self {
        Self(title.to_lowercase().nfc().collect())
    }
}

/// Drops entries whose title is equivalent to an earlier one. First seen wins,
/// relative order is preserved.
pub fn dedupe_by_title<T: Titled>(entries: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| seen.insert(TitleKey::new(entry.title())))
        .collect()
}

/// Maps the names returned by a selection prompt back to listing indices.
///
/// Result is ascending and follows listing order, not the order of `chosen`.
/// Names that match nothing are ignored.
pub fn match_selection<T: Titled>(entries: &[T], chosen: &[String]) -> Vec<usize> {
    let wanted: HashSet<TitleKey> = chosen.iter().map(|name| TitleKey::new(name)).collect();
    entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| wanted.contains(&TitleKey::new(entry.title())))
        .map(|(index, _)| index)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn collections(titles: &[&str]) -> Vec<Collection> {
        titles
            .iter()
            .enumerate()
            .map(|(i, title)| Collection::new(format!("c{i}"), *title, 1))
            .collect()
    }

    #[test]
    fn title_key_ignores_case() {
        assert_eq!(TitleKey::new("Linear Algebra"), TitleKey::new("linear ALGEBRA"));
        assert_eq!(TitleKey::new("ÉTUDE"), TitleKey::new("étude"));
        assert_ne!(TitleKey::new("Algebra I"), TitleKey::new("Algebra II"));
    }

    #[test]
    fn spacing_is_significant() {
        assert_ne!(TitleKey::new("Intro A"), TitleKey::new("Intro  A"));
        assert_ne!(TitleKey::new("Intro"), TitleKey::new("Intro "));
        let deduped = dedupe_by_title(collections(&["Intro A", "Intro  A"]));
        assert_eq!(deduped.len(), 2);
    }

    #[test]
    fn composed_and_decomposed_accents_are_equal() {
        assert_eq!(TitleKey::new("Caf\u{e9}"), TitleKey::new("Cafe\u{301}"));
        assert_eq!(TitleKey::new("CAF\u{c9}"), TitleKey::new("cafe\u{301}"));
        let deduped = dedupe_by_title(collections(&["Caf\u{e9}", "Cafe\u{301}"]));
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].id, "c0");
    }

    #[test]
    fn dedupe_keeps_first_seen() {
        let deduped = dedupe_by_title(collections(&["Intro", "Calculus", "INTRO", "CALCULUS", "Physics"]));
        let ids: Vec<_> = deduped.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c0", "c1", "c4"]);
    }

    #[test]
    fn selection_matches_back_in_listing_order() {
        let entries = collections(&["Intro", "Calculus", "Physics"]);
        let chosen = vec!["physics".to_string(), "INTRO".to_string(), "Unknown".to_string()];
        assert_eq!(match_selection(&entries, &chosen), vec![0, 2]);
    }

    #[test]
    fn empty_selection_matches_nothing() {
        let entries = collections(&["Intro"]);
        assert!(match_selection(&entries, &[]).is_empty());
    }
}
