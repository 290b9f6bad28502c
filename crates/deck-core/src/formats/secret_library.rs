//! Secret Library deck and inventory text formats
//!
//! Both are divided by `***SL***NAME***` marker lines. Decks list "N Name"
//! per card; inventories list "have;want;Name".

use super::{canonical_advanced, dialect_name, split_count, split_crypt_library};
use crate::dialect::{Dialect, FormatDescriptor, FormatParser, FormatWriter};
use crate::error::WriterError;
use crate::holder::{CardListHolder, ListMetadata};
use crate::resolver::ResolvedCardList;
use chrono::{Local, NaiveDate};
use std::fmt::Write;

const ADV_MARKER: &str = " (ADV)";

pub static DECK: FormatDescriptor = FormatDescriptor {
    dialect: Dialect::SecretLibraryDeck,
    name: "Secret Library deck",
    extensions: &["txt"],
    content_hint: "***SL***TITLE*** ... ***SL***ENDDECK*** markers, \"N Name\" lines",
    priority: 100,
    carries_expansions: false,
    writable: true,
};

pub static INVENTORY: FormatDescriptor = FormatDescriptor {
    dialect: Dialect::SecretLibraryInventory,
    name: "Secret Library inventory",
    extensions: &["txt"],
    content_hint: "***SL***CRYPT*** ... ***SL***ENDINVENTORY*** markers, \"have;want;Name\" lines",
    priority: 110,
    carries_expansions: false,
    writable: false,
};

/// The marker name if `line` is a `***SL***NAME***` line
fn marker(line: &str) -> Option<&str> {
    line.trim()
        .strip_prefix("***SL***")?
        .strip_suffix("***")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeckSection {
    None,
    Title,
    Author,
    Created,
    Description,
    Crypt,
    Library,
    Done,
}

/// Parser for Secret Library decks
pub struct SlDeckParser {
    holder: CardListHolder,
    section: DeckSection,
    line_no: usize,
    description: Vec<String>,
    saw_cards: bool,
}

impl SlDeckParser {
    pub fn new() -> Self {
        Self {
            holder: CardListHolder::new(),
            section: DeckSection::None,
            line_no: 0,
            description: Vec::new(),
            saw_cards: false,
        }
    }
}

impl Default for SlDeckParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatParser for SlDeckParser {
    fn descriptor(&self) -> &'static FormatDescriptor {
        &DECK
    }

    fn feed(&mut self, line: &str) {
        self.line_no += 1;
        if let Some(name) = marker(line) {
            self.section = match name {
                "TITLE" => DeckSection::Title,
                "AUTHOR" => DeckSection::Author,
                "CREATED" => DeckSection::Created,
                "DESCRIPTION" => DeckSection::Description,
                "CRYPT" => DeckSection::Crypt,
                "LIBRARY" => DeckSection::Library,
                "ENDDECK" => DeckSection::Done,
                _ => {
                    self.holder
                        .record_malformed(self.line_no, line, "unknown section marker");
                    self.section
                }
            };
            if matches!(self.section, DeckSection::Crypt | DeckSection::Library) {
                self.saw_cards = true;
            }
            return;
        }

        let text = line.trim();
        match self.section {
            DeckSection::Title if !text.is_empty() => self.holder.title = text.to_string(),
            DeckSection::Author if !text.is_empty() => self.holder.author = text.to_string(),
            DeckSection::Description => self.description.push(line.trim_end().to_string()),
            DeckSection::Crypt | DeckSection::Library if !text.is_empty() => {
                match split_count(text) {
                    Some((count, name)) if self.section == DeckSection::Crypt => {
                        self.holder
                            .add_card(&canonical_advanced(name, ADV_MARKER), None, count)
                    }
                    Some((count, name)) => self.holder.add_card(name, None, count),
                    None => self
                        .holder
                        .record_malformed(self.line_no, line, "expected \"N Name\""),
                }
            }
            DeckSection::None | DeckSection::Done if !text.is_empty() => {
                self.holder
                    .record_malformed(self.line_no, line, "text outside a section")
            }
            _ => {}
        }
    }

    fn finalize(&mut self) -> CardListHolder {
        let description = self.description.join("\n");
        let description = description.trim();
        if !description.is_empty() {
            self.holder.description = Some(description.to_string());
        }
        std::mem::take(&mut self.holder)
    }

    fn validate(&self, holder: &CardListHolder) -> bool {
        self.saw_cards && self.section == DeckSection::Done && holder.malformed().is_empty()
    }
}

/// Writer for Secret Library decks
#[derive(Debug, Clone, Copy)]
pub struct SlDeckWriter {
    created: NaiveDate,
}

impl SlDeckWriter {
    /// Writer stamping today's date as the creation date
    pub fn new() -> Self {
        Self::with_date(Local::now().date_naive())
    }

    pub fn with_date(created: NaiveDate) -> Self {
        Self { created }
    }
}

impl Default for SlDeckWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatWriter for SlDeckWriter {
    fn descriptor(&self) -> &'static FormatDescriptor {
        &DECK
    }

    fn write(&self, list: &ResolvedCardList, metadata: &ListMetadata) -> Result<String, WriterError> {
        let (crypt, library) = split_crypt_library(list);

        let mut out = String::new();
        writeln!(out, "***SL***TITLE***\n{}", metadata.title)?;
        writeln!(out, "***SL***AUTHOR***\n{}", metadata.author)?;
        writeln!(out, "***SL***CREATED***\n{}", self.created.format("%Y-%m-%d"))?;
        writeln!(out, "***SL***DESCRIPTION***")?;
        if let Some(description) = &metadata.description {
            writeln!(out, "{}", description)?;
        }
        writeln!(out, "***SL***CRYPT***")?;
        for (card, count) in &crypt {
            writeln!(out, "{} {}", count, dialect_name(card, ADV_MARKER))?;
        }
        writeln!(out, "***SL***LIBRARY***")?;
        for (card, count) in &library {
            writeln!(out, "{} {}", count, card.name)?;
        }
        writeln!(out, "***SL***ENDDECK***")?;
        Ok(out)
    }
}

/// Parser for Secret Library inventories
pub struct SlInventoryParser {
    holder: CardListHolder,
    line_no: usize,
    in_cards: bool,
    finished: bool,
}

impl SlInventoryParser {
    pub fn new() -> Self {
        Self {
            holder: CardListHolder::new(),
            line_no: 0,
            in_cards: false,
            finished: false,
        }
    }

    fn feed_card(&mut self, line: &str) {
        let mut fields = line.splitn(3, ';');
        let (Some(have), Some(_want), Some(name)) = (fields.next(), fields.next(), fields.next())
        else {
            self.holder
                .record_malformed(self.line_no, line, "expected have;want;name");
            return;
        };
        match have.trim().parse::<u32>() {
            Ok(have) => self
                .holder
                .add_card(&canonical_advanced(name, ADV_MARKER), None, have),
            Err(_) => self
                .holder
                .record_malformed(self.line_no, line, "count is not a number"),
        }
    }
}

impl Default for SlInventoryParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatParser for SlInventoryParser {
    fn descriptor(&self) -> &'static FormatDescriptor {
        &INVENTORY
    }

    fn feed(&mut self, line: &str) {
        self.line_no += 1;
        match marker(line) {
            Some("CRYPT") | Some("LIBRARY") => self.in_cards = true,
            Some("ENDINVENTORY") => {
                self.in_cards = false;
                self.finished = true;
            }
            Some(_) => self
                .holder
                .record_malformed(self.line_no, line, "unknown section marker"),
            None if line.trim().is_empty() => {}
            None if self.in_cards => self.feed_card(line.trim()),
            None => self
                .holder
                .record_malformed(self.line_no, line, "text outside a section"),
        }
    }

    fn finalize(&mut self) -> CardListHolder {
        std::mem::take(&mut self.holder)
    }

    fn validate(&self, holder: &CardListHolder) -> bool {
        self.finished && holder.malformed().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::parse_text;
    use crate::testdata::{resolve_strict, sample_catalog, SL_DECK_EXAMPLE, SL_INV_EXAMPLE};

    #[test]
    fn test_marker() {
        assert_eq!(marker("***SL***CRYPT***"), Some("CRYPT"));
        assert_eq!(marker("  ***SL***ENDDECK***  "), Some("ENDDECK"));
        assert_eq!(marker("***CRYPT***"), None);
    }

    #[test]
    fn test_parse_deck() {
        let mut parser = SlDeckParser::new();
        let holder = parse_text(&mut parser, SL_DECK_EXAMPLE);

        assert!(parser.validate(&holder));
        assert_eq!(holder.title, "Test Deck");
        assert_eq!(holder.author, "Anon Y Mous");
        assert_eq!(holder.description.as_deref(), Some("Simple test deck."));
        assert_eq!(holder.count("Alan Sovereign (Advanced)", None), 1);
        assert_eq!(holder.count("Anastasz di Zagreb", None), 2);
        assert_eq!(holder.count(".44 Magnum", None), 3);
    }

    #[test]
    fn test_parse_inventory() {
        let mut parser = SlInventoryParser::new();
        let holder = parse_text(&mut parser, SL_INV_EXAMPLE);

        assert!(parser.validate(&holder));
        assert_eq!(holder.count("Alan Sovereign (Advanced)", None), 1);
        assert_eq!(holder.count("Abebe", None), 2);
        assert_eq!(holder.count(".44 Magnum", None), 4);
        assert_eq!(holder.count("AK-47", None), 0);
    }

    #[test]
    fn test_inventory_is_not_a_deck() {
        let mut parser = SlDeckParser::new();
        let holder = parse_text(&mut parser, SL_INV_EXAMPLE);
        assert!(!parser.validate(&holder));
    }

    #[test]
    fn test_deck_round_trip() {
        let catalog = sample_catalog();
        let list = resolve_strict(&catalog, Dialect::SecretLibraryDeck, SL_DECK_EXAMPLE);
        let writer = SlDeckWriter::with_date(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());
        let text = writer.write(&list, &list.metadata).unwrap();
        assert!(text.contains("***SL***CREATED***\n2026-10-16\n"));
        assert!(text.contains("1 Alan Sovereign (ADV)\n"));

        let again = resolve_strict(&catalog, Dialect::SecretLibraryDeck, &text);
        assert_eq!(again.card_counts(), list.card_counts());
        assert_eq!(again.metadata, list.metadata);
    }
}
