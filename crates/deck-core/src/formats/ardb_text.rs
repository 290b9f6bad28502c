//! ARDB plain-text deck export
//!
//! ```text
//! Deck Name : My Deck
//! Author : Me
//! Description :
//! Some text
//!
//! Crypt [3 vampires] Capacity min: 6 max: 11 average: 7.67
//! ------------------------------------------------------------
//! 2x Alan Sovereign          6   AUS DOM for PRE  Ventrue:3
//! 1x Anastasz di Zagreb      11  ...              Tremere:2
//!
//! Library [4 cards]
//! Master [1]
//!   1x The Path of Blood
//! ```
//!
//! Crypt lines end the name at the first run of two spaces or a tab.

use super::{
    canonical_advanced, dialect_name, library_by_type, pattern, require_capacity,
    section_size, split_count, split_crypt_library, CryptStats,
};
use crate::dialect::{Dialect, FormatDescriptor, FormatParser, FormatWriter};
use crate::error::WriterError;
use crate::holder::{CardListHolder, ListMetadata};
use crate::resolver::ResolvedCardList;
use regex::Regex;
use std::fmt::Write;
use std::sync::OnceLock;

const ADV_MARKER: &str = " (ADV)";
const RULE: &str = "------------------------------------------------------------";

pub static DESCRIPTOR: FormatDescriptor = FormatDescriptor {
    dialect: Dialect::ArdbText,
    name: "ARDB text deck",
    extensions: &["txt"],
    content_hint: "\"Crypt [N vampires]\" and \"Library [N cards]\" sections",
    priority: 60,
    carries_expansions: false,
    writable: true,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    Description,
    Crypt,
    Library,
}

/// Parser for ARDB text decks
pub struct ArdbTextParser {
    holder: CardListHolder,
    section: Section,
    line_no: usize,
    description: Vec<String>,
    saw_section: bool,
}

impl ArdbTextParser {
    pub fn new() -> Self {
        Self {
            holder: CardListHolder::new(),
            section: Section::Header,
            line_no: 0,
            description: Vec::new(),
            saw_section: false,
        }
    }

    fn header_field<'a>(line: &'a str, key: &str) -> Option<&'a str> {
        let rest = line.strip_prefix(key)?;
        let rest = rest.trim_start().strip_prefix(':')?;
        Some(rest.trim())
    }

    /// Crypt line name: up to the first double space or tab
    fn crypt_name(rest: &str) -> &str {
        static CRYPT_NAME: OnceLock<Regex> = OnceLock::new();
        let re = pattern(&CRYPT_NAME, r"\s{2,}|\t");
        match re.find(rest) {
            Some(m) => rest[..m.start()].trim(),
            None => rest.trim(),
        }
    }

    fn feed_card(&mut self, line: &str) {
        let Some((count, rest)) = split_count(line) else {
            self.holder
                .record_malformed(self.line_no, line, "expected a card line");
            return;
        };
        let name = match self.section {
            Section::Crypt => canonical_advanced(Self::crypt_name(rest), ADV_MARKER),
            _ => rest.to_string(),
        };
        self.holder.add_card(&name, None, count);
    }
}

impl Default for ArdbTextParser {
    fn default() -> Self {
        Self::new()
    }
}

fn is_crypt_header(line: &str) -> bool {
    static CRYPT_HEADER: OnceLock<Regex> = OnceLock::new();
    pattern(&CRYPT_HEADER, r"^Crypt \[\d+ (vampires?|cards?)\]").is_match(line)
}

fn is_library_header(line: &str) -> bool {
    static LIBRARY_HEADER: OnceLock<Regex> = OnceLock::new();
    pattern(&LIBRARY_HEADER, r"^Library \[\d+ cards?\]").is_match(line)
}

fn is_type_header(line: &str) -> bool {
    static TYPE_HEADER: OnceLock<Regex> = OnceLock::new();
    pattern(&TYPE_HEADER, r"^[^\d\s].*\[\d+\]\s*$").is_match(line)
}

impl FormatParser for ArdbTextParser {
    fn descriptor(&self) -> &'static FormatDescriptor {
        &DESCRIPTOR
    }

    fn feed(&mut self, line: &str) {
        self.line_no += 1;
        let line = line.trim_end();

        if is_crypt_header(line) {
            self.section = Section::Crypt;
            self.saw_section = true;
            return;
        }
        if is_library_header(line) {
            self.section = Section::Library;
            self.saw_section = true;
            return;
        }

        match self.section {
            Section::Header | Section::Description => {
                if let Some(title) = Self::header_field(line, "Deck Name") {
                    self.holder.title = title.to_string();
                } else if let Some(author) = Self::header_field(line, "Author") {
                    self.holder.author = author.to_string();
                } else if let Some(first) = Self::header_field(line, "Description") {
                    self.section = Section::Description;
                    if !first.is_empty() {
                        self.description.push(first.to_string());
                    }
                } else if self.section == Section::Description {
                    self.description.push(line.to_string());
                }
                // anything else before the first section is ARDB chatter
            }
            Section::Crypt => {
                if line.trim().is_empty() || line.starts_with("---") {
                    return;
                }
                self.feed_card(line);
            }
            Section::Library => {
                if line.trim().is_empty() || is_type_header(line) {
                    return;
                }
                self.feed_card(line);
            }
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
        self.saw_section && !holder.is_empty()
    }
}

/// Writer for ARDB text decks
#[derive(Debug, Clone, Copy, Default)]
pub struct ArdbTextWriter;

impl FormatWriter for ArdbTextWriter {
    fn descriptor(&self) -> &'static FormatDescriptor {
        &DESCRIPTOR
    }

    fn write(&self, list: &ResolvedCardList, metadata: &ListMetadata) -> Result<String, WriterError> {
        let stats = CryptStats::compute(list, DESCRIPTOR.name)?;
        let (crypt, library) = split_crypt_library(list);
        let library_size = section_size(&library);

        let mut out = String::new();
        writeln!(out, "Deck Name : {}", metadata.title)?;
        writeln!(out, "Author : {}", metadata.author)?;
        writeln!(out, "Description :")?;
        if let Some(description) = &metadata.description {
            writeln!(out, "{}", description)?;
        }
        out.push('\n');

        writeln!(
            out,
            "Crypt [{} vampires] Capacity min: {} max: {} average: {}",
            stats.size,
            stats.min,
            stats.max,
            stats.avg_text()
        )?;
        writeln!(out, "{}", RULE)?;

        let names: Vec<String> = crypt.iter().map(|(c, _)| dialect_name(c, ADV_MARKER)).collect();
        let disciplines: Vec<String> = crypt.iter().map(|(c, _)| c.disciplines.join(" ")).collect();
        let name_width = names.iter().map(|n| n.chars().count()).max().unwrap_or(0);
        let disc_width = disciplines.iter().map(|d| d.len()).max().unwrap_or(0);

        for (((card, count), name), disc) in crypt.iter().zip(&names).zip(&disciplines) {
            let capacity = require_capacity(card, DESCRIPTOR.name)?;
            let clan = card.clans.first().map(String::as_str).unwrap_or("");
            let group = card.group.as_deref().unwrap_or("");
            let line = format!(
                "{}x {:<name_width$}  {:<2}  {:<disc_width$}  {}:{}",
                count, name, capacity, disc, clan, group
            );
            writeln!(out, "{}", line.trim_end())?;
        }
        out.push('\n');

        writeln!(out, "Library [{} cards]", library_size)?;
        for (card_type, cards) in library_by_type(list) {
            let total = section_size(&cards);
            writeln!(out, "{} [{}]", card_type, total)?;
            for (card, count) in &cards {
                writeln!(out, "  {}x {}", count, card.name)?;
            }
            out.push('\n');
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::parse_text;
    use crate::testdata::{resolve_strict, sample_catalog, ARDB_TEXT_EXAMPLE};

    #[test]
    fn test_parse_example() {
        let mut parser = ArdbTextParser::new();
        let holder = parse_text(&mut parser, ARDB_TEXT_EXAMPLE);

        assert!(parser.validate(&holder));
        assert_eq!(holder.title, "Test Deck");
        assert_eq!(holder.author, "Anon Y Mous");
        assert_eq!(
            holder.description.as_deref(),
            Some("Simple test deck.\n\nhttp://www.example.com/")
        );
        assert_eq!(holder.count("Alan Sovereign (Advanced)", None), 1);
        assert_eq!(holder.count("Alan Sovereign", None), 1);
        assert_eq!(holder.count("Anastasz di Zagreb", None), 2);
        assert_eq!(holder.count(".44 Magnum", None), 4);
        assert_eq!(holder.count("The Path of Blood", None), 1);
        assert!(holder.malformed().is_empty());
    }

    #[test]
    fn test_unsectioned_text_rejected() {
        let mut parser = ArdbTextParser::new();
        let holder = parse_text(&mut parser, "3x .44 Magnum\n1x Abbot\n");
        assert!(!parser.validate(&holder));
    }

    #[test]
    fn test_crypt_name_stops_at_columns() {
        assert_eq!(
            ArdbTextParser::crypt_name("Anastasz di Zagreb  11  ANI AUS  Tremere:2"),
            "Anastasz di Zagreb"
        );
        assert_eq!(ArdbTextParser::crypt_name("Abebe\t4"), "Abebe");
        assert_eq!(ArdbTextParser::crypt_name("Abebe"), "Abebe");
    }

    #[test]
    fn test_writer_layout() {
        let catalog = sample_catalog();
        let list = resolve_strict(&catalog, Dialect::ArdbText, ARDB_TEXT_EXAMPLE);
        let text = ArdbTextWriter.write(&list, &list.metadata).unwrap();

        assert!(text.starts_with("Deck Name : Test Deck\nAuthor : Anon Y Mous\n"));
        assert!(text.contains("Crypt [4 vampires] Capacity min: 6 max: 11 average: 8.50\n"));
        assert!(text.contains("1x Alan Sovereign (ADV)  6 "));
        assert!(text.contains("Library [5 cards]\n"));
        assert!(text.contains("Equipment [4]\n  4x .44 Magnum\n"));
        assert!(text.contains("Master [1]\n  1x The Path of Blood\n"));
    }

    #[test]
    fn test_round_trip() {
        let catalog = sample_catalog();
        let list = resolve_strict(&catalog, Dialect::ArdbText, ARDB_TEXT_EXAMPLE);
        let text = ArdbTextWriter.write(&list, &list.metadata).unwrap();

        let again = resolve_strict(&catalog, Dialect::ArdbText, &text);
        assert_eq!(again.card_counts(), list.card_counts());
        assert_eq!(again.metadata, list.metadata);
    }
}
