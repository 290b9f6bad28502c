//! Format-independent card list accumulator

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Free-text metadata carried alongside a card list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMetadata {
    /// Deck or set name
    pub title: String,
    /// Author
    pub author: String,
    /// Description, if the source had one
    pub description: Option<String>,
}

/// Key of a holder entry: raw card name and optional raw expansion name
///
/// `None` means the printing wasn't specified, which is different from an
/// expansion name that later fails to resolve.
pub type EntryKey = (String, Option<String>);

/// A line a parser couldn't make sense of
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalformedLine {
    /// 1-based line number in the fed input (0 when not line-based)
    pub line: usize,
    /// The offending text
    pub text: String,
    /// What was wrong with it
    pub reason: String,
}

/// Card names, expansion names and counts as read from a file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardListHolder {
    /// Deck or set name
    pub title: String,
    /// Author
    pub author: String,
    /// Description
    pub description: Option<String>,
    entries: BTreeMap<EntryKey, u32>,
    malformed: Vec<MalformedLine>,
}

impl CardListHolder {
    /// Create a new empty holder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` copies of a card; repeated pairs accumulate
    ///
    /// Counts saturate at `u32::MAX`, so hostile input can't overflow them.
    pub fn add_card(&mut self, name: &str, expansion: Option<&str>, count: u32) {
        let name = name.trim();
        if name.is_empty() || count == 0 {
            return;
        }
        let expansion = expansion
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string);
        let total = self.entries.entry((name.to_string(), expansion)).or_insert(0);
        *total = total.saturating_add(count);
    }

    /// Record a line that was skipped
    pub fn record_malformed(&mut self, line: usize, text: &str, reason: impl Into<String>) {
        let reason = reason.into();
        log::debug!("skipping line {}: {} ({:?})", line, reason, text);
        self.malformed.push(MalformedLine {
            line,
            text: text.to_string(),
            reason,
        });
    }

    /// Entries keyed by (card name, expansion name)
    pub fn entries(&self) -> &BTreeMap<EntryKey, u32> {
        &self.entries
    }

    /// Count for a specific (card, expansion) pair
    pub fn count(&self, name: &str, expansion: Option<&str>) -> u32 {
        self.entries
            .get(&(name.to_string(), expansion.map(str::to_string)))
            .copied()
            .unwrap_or(0)
    }

    /// Total number of cards across all entries
    pub fn total_cards(&self) -> u32 {
        self.entries.values().fold(0u32, |sum, n| sum.saturating_add(*n))
    }

    /// Number of distinct (card, expansion) pairs
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Lines skipped while parsing
    pub fn malformed(&self) -> &[MalformedLine] {
        &self.malformed
    }

    /// True when nothing useful was read: no cards and no title
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.title.is_empty()
    }

    /// Distinct raw card names
    pub fn card_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(|(n, _)| n.as_str()).collect();
        names.dedup();
        names
    }

    /// Distinct raw expansion names (unspecified printings excluded)
    pub fn expansion_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .entries
            .keys()
            .filter_map(|(_, e)| e.as_deref())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Copy of the list metadata
    pub fn metadata(&self) -> ListMetadata {
        ListMetadata {
            title: self.title.clone(),
            author: self.author.clone(),
            description: self.description.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulates_same_pair() {
        let mut holder = CardListHolder::new();
        holder.add_card(".44 Magnum", Some("Jyhad"), 2);
        holder.add_card(".44 Magnum", Some("Jyhad"), 3);

        assert_eq!(holder.entry_count(), 1);
        assert_eq!(holder.count(".44 Magnum", Some("Jyhad")), 5);
    }

    #[test]
    fn test_unspecified_expansion_is_distinct() {
        let mut holder = CardListHolder::new();
        holder.add_card("AK-47", None, 1);
        holder.add_card("AK-47", Some("LotN"), 1);
        holder.add_card("AK-47", Some("  "), 2);

        assert_eq!(holder.entry_count(), 2);
        assert_eq!(holder.count("AK-47", None), 3);
        assert_eq!(holder.count("AK-47", Some("LotN")), 1);
        assert_eq!(holder.total_cards(), 4);
    }

    #[test]
    fn test_ignores_empty_and_zero() {
        let mut holder = CardListHolder::new();
        holder.add_card("   ", None, 3);
        holder.add_card("Abbot", None, 0);

        assert!(holder.is_empty());
        assert_eq!(holder.entry_count(), 0);
    }

    #[test]
    fn test_names() {
        let mut holder = CardListHolder::new();
        holder.add_card("Abbot", Some("Third Edition"), 1);
        holder.add_card("Abbot", None, 1);
        holder.add_card("Abebe", Some("Legacy of Blood"), 1);

        assert_eq!(holder.card_names(), vec!["Abbot", "Abebe"]);
        assert_eq!(holder.expansion_names(), vec!["Legacy of Blood", "Third Edition"]);
    }

    #[test]
    fn test_counts_saturate() {
        let mut holder = CardListHolder::new();
        holder.add_card("Abbot", None, u32::MAX);
        holder.add_card("Abbot", None, 1);
        holder.add_card("Abebe", None, 5);

        assert_eq!(holder.count("Abbot", None), u32::MAX);
        assert_eq!(holder.total_cards(), u32::MAX);
    }

    #[test]
    fn test_malformed_recorded() {
        let mut holder = CardListHolder::new();
        holder.record_malformed(3, "???", "no count");

        assert_eq!(holder.malformed().len(), 1);
        assert_eq!(holder.malformed()[0].line, 3);
    }
}
