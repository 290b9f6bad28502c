//! Parsers and writers for the individual dialects
//!
//! Helpers shared by more than one dialect live here: the advanced-vampire
//! markers each format spells differently, and the crypt figures that several
//! writers print.

pub mod ardb_text;
pub mod ardb_xml;
pub mod csv_file;
pub mod eldb;
pub mod eldb_html;
pub mod jol;
pub mod lackey;
pub mod secret_library;
pub mod sutekh;
pub mod xml;

use crate::catalog::Card;
use crate::error::WriterError;
use crate::resolver::ResolvedCardList;
use csv::{ReaderBuilder, StringRecord, Trim};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

/// Suffix the catalog uses for advanced vampires
pub const ADVANCED_SUFFIX: &str = " (Advanced)";

/// Replace a dialect-specific advanced marker with the catalog suffix
///
/// The marker is matched case-insensitively at the end of the name.
pub(crate) fn canonical_advanced(name: &str, marker: &str) -> String {
    let name = name.trim();
    if name.len() > marker.len()
        && name.is_char_boundary(name.len() - marker.len())
        && name[name.len() - marker.len()..].eq_ignore_ascii_case(marker)
    {
        let base = name[..name.len() - marker.len()].trim_end();
        return format!("{}{}", base, ADVANCED_SUFFIX);
    }
    name.to_string()
}

/// Compile a built-in pattern once
///
/// # Panics
///
/// Only if `source` is not a valid pattern, which is a programming error.
pub(crate) fn pattern(cell: &'static OnceLock<Regex>, source: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(source).expect("built-in pattern must compile"))
}

/// Split "3x Name", "3 x Name", "3 Name" and "3<TAB>Name" into count and name
pub(crate) fn split_count(line: &str) -> Option<(u32, &str)> {
    static COUNT_LINE: OnceLock<Regex> = OnceLock::new();
    let caps = pattern(&COUNT_LINE, r"^\s*(\d+)\s*[xX]?\s+(\S.*?)\s*$").captures(line)?;
    let count = caps.get(1)?.as_str().parse().ok()?;
    Some((count, caps.get(2)?.as_str()))
}

/// Splits single lines into CSV fields
///
/// The reader configuration and the record are kept between lines; each line
/// only gets a reader with a buffer sized to it.
pub(crate) struct LineSplitter {
    builder: ReaderBuilder,
    record: StringRecord,
}

impl LineSplitter {
    pub fn new() -> Self {
        let mut builder = ReaderBuilder::new();
        builder.has_headers(false).flexible(true).trim(Trim::All);
        Self {
            builder,
            record: StringRecord::new(),
        }
    }

    /// Fields of one line, or `None` if it holds no record
    pub fn split(&mut self, line: &str) -> Option<&StringRecord> {
        let mut reader = self
            .builder
            .buffer_capacity(line.len() + 1)
            .from_reader(line.as_bytes());
        match reader.read_record(&mut self.record) {
            Ok(true) => Some(&self.record),
            _ => None,
        }
    }
}

/// Card name with the catalog suffix swapped for a dialect marker
pub(crate) fn dialect_name(card: &Card, marker: &str) -> String {
    if card.is_advanced() {
        format!("{}{}", card.base_name(), marker)
    } else {
        card.name.clone()
    }
}

/// Crypt figures derived from the capacities of the crypt cards
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct CryptStats {
    pub size: u32,
    pub min: u32,
    pub max: u32,
    pub avg: f64,
}

impl CryptStats {
    /// Compute the figures; every crypt card needs a capacity
    pub fn compute(list: &ResolvedCardList, dialect: &'static str) -> Result<Self, WriterError> {
        let mut stats = CryptStats {
            size: 0,
            min: 0,
            max: 0,
            avg: 0.0,
        };
        let mut total = 0u64;
        for (card, count) in list.per_card() {
            if !card.is_crypt() {
                continue;
            }
            let capacity = require_capacity(&card, dialect)?;
            if stats.size == 0 || capacity < stats.min {
                stats.min = capacity;
            }
            stats.max = stats.max.max(capacity);
            stats.size = stats.size.saturating_add(count);
            total = total.saturating_add(u64::from(capacity) * u64::from(count));
        }
        if stats.size > 0 {
            stats.avg = total as f64 / f64::from(stats.size);
        }
        Ok(stats)
    }

    /// Average rounded the way the deck builders print it
    pub fn avg_text(&self) -> String {
        format!("{:.2}", self.avg)
    }
}

pub(crate) fn require_capacity(card: &Card, dialect: &'static str) -> Result<u32, WriterError> {
    card.capacity.ok_or_else(|| WriterError::MissingAttribute {
        dialect,
        card: card.name.clone(),
        attribute: "capacity",
    })
}

/// Number of cards in a section, saturating
pub(crate) fn section_size(cards: &[(Arc<Card>, u32)]) -> u32 {
    cards.iter().fold(0u32, |sum, (_, n)| sum.saturating_add(*n))
}

/// Per-card totals split into crypt and library, each sorted by name
pub(crate) fn split_crypt_library(list: &ResolvedCardList) -> (Vec<(Arc<Card>, u32)>, Vec<(Arc<Card>, u32)>) {
    list.per_card().into_iter().partition(|(card, _)| card.is_crypt())
}

/// Library cards grouped by their first card type, groups sorted by type
pub(crate) fn library_by_type(list: &ResolvedCardList) -> BTreeMap<String, Vec<(Arc<Card>, u32)>> {
    let mut groups: BTreeMap<String, Vec<(Arc<Card>, u32)>> = BTreeMap::new();
    for (card, count) in list.per_card() {
        if card.is_crypt() {
            continue;
        }
        groups
            .entry(card.primary_type().to_string())
            .or_default()
            .push((card, count));
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CanonicalCatalog, Lookup};
    use crate::testdata::sample_catalog;

    fn card(name: &str) -> Arc<Card> {
        match sample_catalog().lookup_card(&crate::normalize::canonical_key(name)) {
            Lookup::Found(card) => card,
            other => panic!("{name} not in sample catalog: {other:?}"),
        }
    }

    #[test]
    fn test_canonical_advanced() {
        assert_eq!(
            canonical_advanced("Alan Sovereign (ADV)", " (ADV)"),
            "Alan Sovereign (Advanced)"
        );
        assert_eq!(
            canonical_advanced("Alan Sovereign (adv) ", "(adv)"),
            "Alan Sovereign (Advanced)"
        );
        assert_eq!(canonical_advanced("Alan Sovereign Adv", " Adv"), "Alan Sovereign (Advanced)");
        assert_eq!(canonical_advanced("Abbot", " Adv"), "Abbot");
        assert_eq!(canonical_advanced("Adv", " Adv"), "Adv");
    }

    #[test]
    fn test_split_count() {
        assert_eq!(split_count("3x .44 Magnum"), Some((3, ".44 Magnum")));
        assert_eq!(split_count("  2 x AK-47 "), Some((2, "AK-47")));
        assert_eq!(split_count("1 Xaviar"), Some((1, "Xaviar")));
        assert_eq!(split_count("4\tAbbot"), Some((4, "Abbot")));
        assert_eq!(split_count(".44 Magnum"), None);
        assert_eq!(split_count("3x"), None);
        assert_eq!(split_count("99999999999x Abbot"), None);
    }

    #[test]
    fn test_line_splitter() {
        let mut splitter = LineSplitter::new();
        let record = splitter.split(r#""Inez ""Nurse216"" Villagrande", 3"#).unwrap();
        assert_eq!(record.len(), 2);
        assert_eq!(&record[0], r#"Inez "Nurse216" Villagrande"#);
        assert_eq!(&record[1], "3");

        let record = splitter.split(" Abbot , Jyhad , 1 ").unwrap();
        assert_eq!(record.iter().collect::<Vec<_>>(), vec!["Abbot", "Jyhad", "1"]);
        assert!(splitter.split("").is_none());
    }

    #[test]
    fn test_dialect_name() {
        assert_eq!(
            dialect_name(&card("Alan Sovereign (Advanced)"), " (ADV)"),
            "Alan Sovereign (ADV)"
        );
        assert_eq!(dialect_name(&card("Abbot"), " (ADV)"), "Abbot");
    }

    #[test]
    fn test_crypt_stats() {
        let mut list = ResolvedCardList::default();
        list.add(card("Alan Sovereign"), None, 2);
        list.add(card("Anastasz di Zagreb"), None, 1);
        list.add(card("Abbot"), None, 4);

        let stats = CryptStats::compute(&list, "test").unwrap();
        assert_eq!(stats.size, 3);
        assert_eq!(stats.min, 6);
        assert_eq!(stats.max, 11);
        assert_eq!(stats.avg_text(), "7.67");
    }

    #[test]
    fn test_crypt_stats_empty() {
        let stats = CryptStats::compute(&ResolvedCardList::default(), "test").unwrap();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.avg_text(), "0.00");
    }

    #[test]
    fn test_crypt_stats_needs_capacity() {
        let mut vampire = Card::new("Nameless", &["Vampire"]);
        vampire.id = 99;
        let mut list = ResolvedCardList::default();
        list.add(Arc::new(vampire), None, 1);

        let err = CryptStats::compute(&list, "test").unwrap_err();
        assert!(matches!(
            err,
            WriterError::MissingAttribute { attribute: "capacity", .. }
        ));
    }
}
