//! Dialect registry
//!
//! Every supported file format is one [`Dialect`] variant with a static
//! [`FormatDescriptor`]. The guesser and the front ends only ever go through
//! this table; adding a format means adding a variant, its descriptor and its
//! parser/writer, never touching the dispatch code.

use crate::error::{Error, WriterError};
use crate::formats::{
    ardb_text, ardb_xml, csv_file, eldb, eldb_html, jol, lackey, secret_library, sutekh,
};
use crate::holder::{CardListHolder, ListMetadata};
use crate::resolver::ResolvedCardList;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A supported deck or inventory file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dialect {
    SutekhCardSet,
    SutekhAbstractSet,
    SutekhCardList,
    ArdbXmlDeck,
    ArdbXmlInventory,
    ArdbText,
    EldbInventory,
    EldbDeck,
    EldbHtml,
    SecretLibraryDeck,
    SecretLibraryInventory,
    Csv,
    Lackey,
    Jol,
}

/// Static description of a dialect
#[derive(Debug)]
pub struct FormatDescriptor {
    pub dialect: Dialect,
    /// Human readable name
    pub name: &'static str,
    /// File extensions, without the dot; the first one is used for output
    pub extensions: &'static [&'static str],
    /// Short note on what the content looks like
    pub content_hint: &'static str,
    /// Position in the guess order; lower is tried first
    pub priority: u8,
    /// Whether the dialect records which expansion each card came from
    pub carries_expansions: bool,
    /// Whether a writer exists
    pub writable: bool,
}

/// Incremental, line-fed parser for one dialect
///
/// A parser is used for exactly one input: feed every line, then call
/// [`finalize`](FormatParser::finalize) once.
pub trait FormatParser {
    fn descriptor(&self) -> &'static FormatDescriptor;

    /// Consume one line of input, without its line terminator
    fn feed(&mut self, line: &str);

    /// Finish parsing and hand over the accumulated holder
    fn finalize(&mut self) -> CardListHolder;

    /// Whether the finalized holder looks like this dialect
    fn validate(&self, holder: &CardListHolder) -> bool;
}

/// Serializer for one dialect
pub trait FormatWriter {
    fn descriptor(&self) -> &'static FormatDescriptor;

    /// Render a resolved list; derived figures are computed here, every time
    fn write(&self, list: &ResolvedCardList, metadata: &ListMetadata) -> Result<String, WriterError>;
}

impl Dialect {
    /// Every dialect, in declaration order
    pub const ALL: [Dialect; 14] = [
        Dialect::SutekhCardSet,
        Dialect::SutekhAbstractSet,
        Dialect::SutekhCardList,
        Dialect::ArdbXmlDeck,
        Dialect::ArdbXmlInventory,
        Dialect::ArdbText,
        Dialect::EldbInventory,
        Dialect::EldbDeck,
        Dialect::EldbHtml,
        Dialect::SecretLibraryDeck,
        Dialect::SecretLibraryInventory,
        Dialect::Csv,
        Dialect::Lackey,
        Dialect::Jol,
    ];

    pub fn descriptor(self) -> &'static FormatDescriptor {
        match self {
            Dialect::SutekhCardSet => &sutekh::CARD_SET,
            Dialect::SutekhAbstractSet => &sutekh::ABSTRACT_SET,
            Dialect::SutekhCardList => &sutekh::CARD_LIST,
            Dialect::ArdbXmlDeck => &ardb_xml::DECK,
            Dialect::ArdbXmlInventory => &ardb_xml::INVENTORY,
            Dialect::ArdbText => &ardb_text::DESCRIPTOR,
            Dialect::EldbInventory => &eldb::INVENTORY,
            Dialect::EldbDeck => &eldb::DECK,
            Dialect::EldbHtml => &eldb_html::DESCRIPTOR,
            Dialect::SecretLibraryDeck => &secret_library::DECK,
            Dialect::SecretLibraryInventory => &secret_library::INVENTORY,
            Dialect::Csv => &csv_file::DESCRIPTOR,
            Dialect::Lackey => &lackey::DESCRIPTOR,
            Dialect::Jol => &jol::DESCRIPTOR,
        }
    }

    /// A fresh parser for this dialect
    pub fn parser(self) -> Box<dyn FormatParser> {
        match self {
            Dialect::SutekhCardSet => Box::new(sutekh::SutekhXmlParser::card_set()),
            Dialect::SutekhAbstractSet => Box::new(sutekh::SutekhXmlParser::abstract_set()),
            Dialect::SutekhCardList => Box::new(sutekh::SutekhXmlParser::card_list()),
            Dialect::ArdbXmlDeck => Box::new(ardb_xml::ArdbXmlParser::deck()),
            Dialect::ArdbXmlInventory => Box::new(ardb_xml::ArdbXmlParser::inventory()),
            Dialect::ArdbText => Box::new(ardb_text::ArdbTextParser::new()),
            Dialect::EldbInventory => Box::new(eldb::EldbInventoryParser::new()),
            Dialect::EldbDeck => Box::new(eldb::EldbDeckParser::new()),
            Dialect::EldbHtml => Box::new(eldb_html::EldbHtmlParser::new()),
            Dialect::SecretLibraryDeck => Box::new(secret_library::SlDeckParser::new()),
            Dialect::SecretLibraryInventory => Box::new(secret_library::SlInventoryParser::new()),
            Dialect::Csv => Box::new(csv_file::CsvParser::new()),
            Dialect::Lackey => Box::new(lackey::LackeyParser::new()),
            Dialect::Jol => Box::new(jol::JolParser::new()),
        }
    }

    /// The writer for this dialect, if it can be written
    pub fn writer(self) -> Option<Box<dyn FormatWriter>> {
        let writer: Box<dyn FormatWriter> = match self {
            Dialect::SutekhCardSet => Box::new(sutekh::SutekhCardSetWriter),
            Dialect::ArdbXmlDeck => Box::new(ardb_xml::ArdbXmlDeckWriter::new()),
            Dialect::ArdbXmlInventory => Box::new(ardb_xml::ArdbXmlInventoryWriter::new()),
            Dialect::ArdbText => Box::new(ardb_text::ArdbTextWriter),
            Dialect::EldbInventory => Box::new(eldb::EldbInventoryWriter),
            Dialect::EldbDeck => Box::new(eldb::EldbDeckWriter),
            Dialect::SecretLibraryDeck => Box::new(secret_library::SlDeckWriter::new()),
            Dialect::Csv => Box::new(csv_file::CsvWriter::default()),
            Dialect::Lackey => Box::new(lackey::LackeyWriter),
            Dialect::Jol => Box::new(jol::JolWriter),
            Dialect::SutekhAbstractSet
            | Dialect::SutekhCardList
            | Dialect::EldbHtml
            | Dialect::SecretLibraryInventory => return None,
        };
        Some(writer)
    }

    /// Like [`writer`](Dialect::writer), but an error for read-only dialects
    pub fn require_writer(self) -> crate::Result<Box<dyn FormatWriter>> {
        self.writer()
            .ok_or_else(|| Error::NoWriter(self.name().to_string()))
    }

    /// Stable identifier, as used in config files and on the command line
    pub fn name(self) -> &'static str {
        match self {
            Dialect::SutekhCardSet => "sutekh-card-set",
            Dialect::SutekhAbstractSet => "sutekh-abstract-set",
            Dialect::SutekhCardList => "sutekh-card-list",
            Dialect::ArdbXmlDeck => "ardb-xml-deck",
            Dialect::ArdbXmlInventory => "ardb-xml-inventory",
            Dialect::ArdbText => "ardb-text",
            Dialect::EldbInventory => "eldb-inventory",
            Dialect::EldbDeck => "eldb-deck",
            Dialect::EldbHtml => "eldb-html",
            Dialect::SecretLibraryDeck => "secret-library-deck",
            Dialect::SecretLibraryInventory => "secret-library-inventory",
            Dialect::Csv => "csv",
            Dialect::Lackey => "lackey",
            Dialect::Jol => "jol",
        }
    }

    /// Extension used when writing this dialect
    pub fn output_extension(self) -> &'static str {
        self.descriptor().extensions.first().copied().unwrap_or("txt")
    }

    /// Dialects that use the given file extension
    pub fn for_extension(ext: &str) -> Vec<Dialect> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        guess_order()
            .into_iter()
            .filter(|d| d.descriptor().extensions.contains(&ext.as_str()))
            .collect()
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Dialect::ALL
            .into_iter()
            .find(|d| d.name() == wanted)
            .ok_or_else(|| Error::UnknownDialect(s.to_string()))
    }
}

/// Default trial order: most constrained dialects first, most permissive last
pub fn guess_order() -> Vec<Dialect> {
    let mut order = Dialect::ALL.to_vec();
    order.sort_by_key(|d| d.descriptor().priority);
    order
}

/// Feed a whole text to a parser and finalize it
pub fn parse_text(parser: &mut dyn FormatParser, text: &str) -> CardListHolder {
    for line in text.lines() {
        parser.feed(line);
    }
    parser.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptors_match_variants() {
        for dialect in Dialect::ALL {
            assert_eq!(dialect.descriptor().dialect, dialect);
            assert_eq!(dialect.parser().descriptor().dialect, dialect);
            if let Some(writer) = dialect.writer() {
                assert_eq!(writer.descriptor().dialect, dialect);
                assert!(dialect.descriptor().writable);
            } else {
                assert!(!dialect.descriptor().writable);
            }
        }
    }

    #[test]
    fn test_guess_order() {
        let order = guess_order();
        assert_eq!(order.len(), Dialect::ALL.len());
        assert_eq!(order.first(), Some(&Dialect::SutekhCardSet));
        // The most permissive dialect goes last
        assert_eq!(order.last(), Some(&Dialect::Jol));

        let mut priorities: Vec<u8> = order.iter().map(|d| d.descriptor().priority).collect();
        priorities.dedup();
        assert_eq!(priorities.len(), order.len(), "priorities must be unique");
    }

    #[test]
    fn test_from_str() {
        assert_eq!("ardb-text".parse::<Dialect>().unwrap(), Dialect::ArdbText);
        assert_eq!("ARDB_XML_DECK".parse::<Dialect>().unwrap(), Dialect::ArdbXmlDeck);
        assert!(matches!(
            "word".parse::<Dialect>(),
            Err(Error::UnknownDialect(_))
        ));
        for dialect in Dialect::ALL {
            assert_eq!(dialect.to_string().parse::<Dialect>().unwrap(), dialect);
        }
    }

    #[test]
    fn test_serde_names_match_display() {
        for dialect in Dialect::ALL {
            let json = serde_json::to_string(&dialect).unwrap();
            assert_eq!(json, format!("\"{}\"", dialect.name()));
        }
    }

    #[test]
    fn test_for_extension() {
        assert_eq!(Dialect::for_extension(".eld"), vec![Dialect::EldbDeck]);
        assert!(Dialect::for_extension("XML").contains(&Dialect::ArdbXmlDeck));
        assert!(Dialect::for_extension("exe").is_empty());
    }

    #[test]
    fn test_read_only_dialects() {
        assert!(matches!(
            Dialect::EldbHtml.require_writer(),
            Err(Error::NoWriter(_))
        ));
        assert!(Dialect::Jol.require_writer().is_ok());
    }
}
