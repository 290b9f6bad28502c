//! FELDB inventories and ELDB deck files
//!
//! ELDB writes apostrophes as backticks and marks advanced vampires with
//! "(ADV)". The inventory is one CSV record per card after a fixed header
//! line; the deck file is a list of quoted strings, one per card copy, after
//! the title, author, description and the crypt and library sizes.

use super::{
    canonical_advanced, dialect_name, pattern, section_size, split_crypt_library, LineSplitter,
};
use crate::catalog::Card;
use crate::dialect::{Dialect, FormatDescriptor, FormatParser, FormatWriter};
use crate::error::WriterError;
use crate::holder::{CardListHolder, ListMetadata};
use crate::resolver::ResolvedCardList;
use regex::Regex;
use std::fmt::Write;
use std::sync::OnceLock;

const ADV_MARKER: &str = " (ADV)";
const INVENTORY_HEADER: &str = "\"ELDB - Inventory\"";

pub static INVENTORY: FormatDescriptor = FormatDescriptor {
    dialect: Dialect::EldbInventory,
    name: "FELDB inventory",
    extensions: &["csv"],
    content_hint: "\"ELDB - Inventory\" header, then \"Name\",have,want,\"\",\"Crypt|Library\"",
    priority: 70,
    carries_expansions: false,
    writable: true,
};

pub static DECK: FormatDescriptor = FormatDescriptor {
    dialect: Dialect::EldbDeck,
    name: "ELDB deck file",
    extensions: &["eld"],
    content_hint: "quoted title, author and description, two counts, one quoted name per card",
    priority: 80,
    carries_expansions: false,
    writable: true,
};

fn from_eldb_name(raw: &str) -> String {
    canonical_advanced(&raw.replace('`', "'"), ADV_MARKER)
}

fn to_eldb_name(card: &Card) -> String {
    dialect_name(card, ADV_MARKER).replace('\'', "`")
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

/// Contents of a line that is exactly one quoted string
fn unquote(line: &str) -> Option<String> {
    static QUOTED: OnceLock<Regex> = OnceLock::new();
    let caps = pattern(&QUOTED, r#"^"((?:[^"]|"")*)"$"#).captures(line.trim())?;
    Some(caps.get(1)?.as_str().replace("\"\"", "\""))
}

/// Parser for FELDB inventory files
pub struct EldbInventoryParser {
    holder: CardListHolder,
    line_no: usize,
    splitter: LineSplitter,
    saw_header: bool,
}

impl EldbInventoryParser {
    pub fn new() -> Self {
        Self {
            holder: CardListHolder::new(),
            line_no: 0,
            splitter: LineSplitter::new(),
            saw_header: false,
        }
    }
}

impl Default for EldbInventoryParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatParser for EldbInventoryParser {
    fn descriptor(&self) -> &'static FormatDescriptor {
        &INVENTORY
    }

    fn feed(&mut self, line: &str) {
        self.line_no += 1;
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        if !self.saw_header {
            if line == INVENTORY_HEADER {
                self.saw_header = true;
            } else {
                self.holder
                    .record_malformed(self.line_no, line, "missing inventory header");
            }
            return;
        }

        let Some(record) = self.splitter.split(line).filter(|r| r.len() >= 2) else {
            self.holder
                .record_malformed(self.line_no, line, "expected name and count");
            return;
        };
        let name = from_eldb_name(&record[0]);
        match record[1].parse::<u32>() {
            Ok(have) => self.holder.add_card(&name, None, have),
            Err(_) => self
                .holder
                .record_malformed(self.line_no, line, "count is not a number"),
        }
    }

    fn finalize(&mut self) -> CardListHolder {
        std::mem::take(&mut self.holder)
    }

    fn validate(&self, holder: &CardListHolder) -> bool {
        self.saw_header && holder.malformed().is_empty() && holder.entry_count() > 0
    }
}

/// Writer for FELDB inventory files
#[derive(Debug, Clone, Copy, Default)]
pub struct EldbInventoryWriter;

impl FormatWriter for EldbInventoryWriter {
    fn descriptor(&self) -> &'static FormatDescriptor {
        &INVENTORY
    }

    fn write(&self, list: &ResolvedCardList, _metadata: &ListMetadata) -> Result<String, WriterError> {
        let mut out = String::new();
        writeln!(out, "{}", INVENTORY_HEADER)?;
        for (card, count) in list.per_card() {
            let section = if card.is_crypt() { "Crypt" } else { "Library" };
            writeln!(
                out,
                "{},{},0,\"\",\"{}\"",
                quote(&to_eldb_name(&card)),
                count,
                section
            )?;
        }
        Ok(out)
    }
}

/// Parser for ELDB deck files
pub struct EldbDeckParser {
    holder: CardListHolder,
    line_no: usize,
    /// Non-blank lines seen so far
    position: usize,
    crypt_size: Option<u32>,
    library_size: Option<u32>,
    broken: bool,
}

impl EldbDeckParser {
    pub fn new() -> Self {
        Self {
            holder: CardListHolder::new(),
            line_no: 0,
            position: 0,
            crypt_size: None,
            library_size: None,
            broken: false,
        }
    }

    fn reject(&mut self, line: &str, reason: &str) {
        self.broken = true;
        self.holder.record_malformed(self.line_no, line, reason);
    }
}

impl Default for EldbDeckParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatParser for EldbDeckParser {
    fn descriptor(&self) -> &'static FormatDescriptor {
        &DECK
    }

    fn feed(&mut self, line: &str) {
        self.line_no += 1;
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        let position = self.position;
        self.position += 1;

        match position {
            0..=2 => {
                let Some(text) = unquote(line) else {
                    return self.reject(line, "expected a quoted header field");
                };
                match position {
                    0 => self.holder.title = text,
                    1 => self.holder.author = text,
                    _ if !text.is_empty() => self.holder.description = Some(text),
                    _ => {}
                }
            }
            3 | 4 => {
                let Ok(size) = line.parse::<u32>() else {
                    return self.reject(line, "expected a section size");
                };
                if position == 3 {
                    self.crypt_size = Some(size);
                } else {
                    self.library_size = Some(size);
                }
            }
            _ => match unquote(line) {
                Some(name) => self.holder.add_card(&from_eldb_name(&name), None, 1),
                None => self.reject(line, "expected a quoted card name"),
            },
        }
    }

    fn finalize(&mut self) -> CardListHolder {
        std::mem::take(&mut self.holder)
    }

    fn validate(&self, holder: &CardListHolder) -> bool {
        match (self.crypt_size, self.library_size) {
            (Some(crypt), Some(library)) => {
                !self.broken && crypt.checked_add(library) == Some(holder.total_cards())
            }
            _ => false,
        }
    }
}

/// Writer for ELDB deck files
#[derive(Debug, Clone, Copy, Default)]
pub struct EldbDeckWriter;

impl FormatWriter for EldbDeckWriter {
    fn descriptor(&self) -> &'static FormatDescriptor {
        &DECK
    }

    fn write(&self, list: &ResolvedCardList, metadata: &ListMetadata) -> Result<String, WriterError> {
        let (crypt, library) = split_crypt_library(list);
        let crypt_size = section_size(&crypt);
        let library_size = section_size(&library);
        let description = metadata
            .description
            .as_deref()
            .unwrap_or("")
            .replace(['\r', '\n'], " ");

        let mut out = String::new();
        writeln!(out, "{}", quote(&metadata.title))?;
        writeln!(out, "{}", quote(&metadata.author))?;
        writeln!(out, "{}", quote(&description))?;
        writeln!(out, "{}", crypt_size)?;
        writeln!(out, "{}", library_size)?;
        for (card, count) in crypt.iter().chain(library.iter()) {
            let name = quote(&to_eldb_name(card));
            for _ in 0..*count {
                writeln!(out, "{}", name)?;
            }
        }
        Ok(out)
    }
}
