//! Comma separated card lists
//!
//! The written shape is fixed: every field but the count is quoted, fields
//! are separated by ", ", and rows are sorted by card name then expansion.
//! Without the expansion column, counts are summed per card. Cards with no
//! specific printing are written under "Unknown Expansion".
//!
//! Reading is more forgiving: an optional header line, two columns
//! (name, count) or three (name, expansion, count), quoted or not.

use super::LineSplitter;
use crate::dialect::{Dialect, FormatDescriptor, FormatParser, FormatWriter};
use crate::error::WriterError;
use crate::holder::{CardListHolder, ListMetadata};
use crate::resolver::ResolvedCardList;
use std::fmt::Write;

/// Expansion column value for cards with no specific printing
pub const UNKNOWN_EXPANSION: &str = "Unknown Expansion";

pub static DESCRIPTOR: FormatDescriptor = FormatDescriptor {
    dialect: Dialect::Csv,
    name: "CSV card list",
    extensions: &["csv"],
    content_hint: "\"Card Name\", \"Expansion\", \"Number\" rows",
    priority: 120,
    carries_expansions: true,
    writable: true,
};

/// Strip the quotes the csv reader leaves on fields like ` "Jyhad"`
fn clean_field(field: &str) -> String {
    let field = field.trim();
    match field.strip_prefix('"').and_then(|f| f.strip_suffix('"')) {
        Some(inner) => inner.replace("\"\"", "\""),
        None => field.to_string(),
    }
}

/// Parser for CSV card lists
pub struct CsvParser {
    holder: CardListHolder,
    line_no: usize,
    splitter: LineSplitter,
    rows: usize,
}

impl CsvParser {
    pub fn new() -> Self {
        Self {
            holder: CardListHolder::new(),
            line_no: 0,
            splitter: LineSplitter::new(),
            rows: 0,
        }
    }
}

impl Default for CsvParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatParser for CsvParser {
    fn descriptor(&self) -> &'static FormatDescriptor {
        &DESCRIPTOR
    }

    fn feed(&mut self, line: &str) {
        self.line_no += 1;
        if line.trim().is_empty() {
            return;
        }
        let fields: Vec<String> = match self.splitter.split(line) {
            Some(record) => record.iter().map(clean_field).collect(),
            None => Vec::new(),
        };

        let first_row = self.rows == 0;
        self.rows += 1;

        let (name, expansion, count) = match fields.as_slice() {
            [name, count] => (name, None, count),
            [name, expansion, count] => (name, Some(expansion), count),
            _ => {
                self.holder
                    .record_malformed(self.line_no, line, "expected 2 or 3 columns");
                return;
            }
        };
        match count.parse::<u32>() {
            Ok(count) => {
                let expansion = expansion
                    .map(String::as_str)
                    .filter(|e| *e != UNKNOWN_EXPANSION);
                self.holder.add_card(name, expansion, count);
            }
            // a header row names its columns instead
            Err(_) if first_row => {}
            Err(_) => self
                .holder
                .record_malformed(self.line_no, line, "count is not a number"),
        }
    }

    fn finalize(&mut self) -> CardListHolder {
        std::mem::take(&mut self.holder)
    }

    fn validate(&self, holder: &CardListHolder) -> bool {
        holder.entry_count() > 0 && holder.malformed().is_empty()
    }
}

/// Writer for CSV card lists
#[derive(Debug, Clone, Copy)]
pub struct CsvWriter {
    /// Write the "Card Name", ... header line
    pub header: bool,
    /// Write the expansion column
    pub expansions: bool,
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self {
            header: true,
            expansions: true,
        }
    }
}

impl CsvWriter {
    pub fn new(header: bool, expansions: bool) -> Self {
        Self { header, expansions }
    }
}

fn quoted(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

impl FormatWriter for CsvWriter {
    fn descriptor(&self) -> &'static FormatDescriptor {
        &DESCRIPTOR
    }

    fn write(&self, list: &ResolvedCardList, _metadata: &ListMetadata) -> Result<String, WriterError> {
        let mut out = String::new();

        if self.expansions {
            if self.header {
                out.push_str("\"Card Name\", \"Expansion\", \"Number\"\n");
            }
            let mut rows: Vec<(&str, &str, u32)> = list
                .entries
                .iter()
                .map(|e| {
                    (
                        e.card.name.as_str(),
                        e.expansion_name().unwrap_or(UNKNOWN_EXPANSION),
                        e.count,
                    )
                })
                .collect();
            rows.sort();
            for (name, expansion, count) in rows {
                writeln!(out, "{}, {}, {}", quoted(name), quoted(expansion), count)?;
            }
        } else {
            if self.header {
                out.push_str("\"Card Name\", \"Number\"\n");
            }
            for (card, count) in list.per_card() {
                writeln!(out, "{}, {}", quoted(&card.name), count)?;
            }
        }

        Ok(out)
    }
}
