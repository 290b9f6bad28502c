//! LackeyCCG deck files
//!
//! Library cards come first as "N<TAB>Name" lines, then a "Crypt:" line and
//! the crypt in the same shape. Lackey only knows ASCII names and spells
//! advanced vampires as "Name Adv".

use super::{canonical_advanced, dialect_name, pattern, split_crypt_library};
use crate::dialect::{Dialect, FormatDescriptor, FormatParser, FormatWriter};
use crate::error::WriterError;
use crate::holder::{CardListHolder, ListMetadata};
use crate::resolver::ResolvedCardList;
use deunicode::deunicode;
use regex::Regex;
use std::fmt::Write;
use std::sync::OnceLock;

const ADV_MARKER: &str = " Adv";
const CRYPT_MARKER: &str = "Crypt:";

pub static DESCRIPTOR: FormatDescriptor = FormatDescriptor {
    dialect: Dialect::Lackey,
    name: "LackeyCCG deck",
    extensions: &["txt", "dek"],
    content_hint: "\"N<TAB>Name\" lines with a \"Crypt:\" separator",
    priority: 130,
    carries_expansions: false,
    writable: true,
};

fn tab_line(line: &str) -> Option<(u32, &str)> {
    static TAB_LINE: OnceLock<Regex> = OnceLock::new();
    let caps = pattern(&TAB_LINE, r"^(\d+)\t+(\S.*?)\s*$").captures(line)?;
    let count = caps.get(1)?.as_str().parse().ok()?;
    Some((count, caps.get(2)?.as_str()))
}

/// Parser for Lackey deck files
pub struct LackeyParser {
    holder: CardListHolder,
    line_no: usize,
    in_crypt: bool,
}

impl LackeyParser {
    pub fn new() -> Self {
        Self {
            holder: CardListHolder::new(),
            line_no: 0,
            in_crypt: false,
        }
    }
}

impl Default for LackeyParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatParser for LackeyParser {
    fn descriptor(&self) -> &'static FormatDescriptor {
        &DESCRIPTOR
    }

    fn feed(&mut self, line: &str) {
        self.line_no += 1;
        if line.trim().is_empty() {
            return;
        }
        if line.trim() == CRYPT_MARKER {
            self.in_crypt = true;
            return;
        }
        match tab_line(line) {
            Some((count, name)) if self.in_crypt => {
                self.holder
                    .add_card(&canonical_advanced(name, ADV_MARKER), None, count)
            }
            Some((count, name)) => self.holder.add_card(name, None, count),
            None => self
                .holder
                .record_malformed(self.line_no, line, "expected \"N<TAB>Name\""),
        }
    }

    fn finalize(&mut self) -> CardListHolder {
        std::mem::take(&mut self.holder)
    }

    fn validate(&self, holder: &CardListHolder) -> bool {
        self.in_crypt && holder.malformed().is_empty()
    }
}

/// Writer for Lackey deck files
#[derive(Debug, Clone, Copy, Default)]
pub struct LackeyWriter;

impl FormatWriter for LackeyWriter {
    fn descriptor(&self) -> &'static FormatDescriptor {
        &DESCRIPTOR
    }

    fn write(&self, list: &ResolvedCardList, _metadata: &ListMetadata) -> Result<String, WriterError> {
        let (crypt, library) = split_crypt_library(list);

        let mut out = String::new();
        for (card, count) in &library {
            writeln!(out, "{}\t{}", count, deunicode(&card.name))?;
        }
        writeln!(out, "{}", CRYPT_MARKER)?;
        for (card, count) in &crypt {
            writeln!(out, "{}\t{}", count, deunicode(&dialect_name(card, ADV_MARKER)))?;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Card, MemoryCatalog};
    use crate::dialect::parse_text;
    use crate::testdata::{resolve_strict, sample_catalog, LACKEY_EXAMPLE};

    #[test]
    fn test_parse_example() {
        let mut parser = LackeyParser::new();
        let holder = parse_text(&mut parser, LACKEY_EXAMPLE);

        assert!(parser.validate(&holder));
        assert_eq!(holder.count(".44 Magnum", None), 4);
        assert_eq!(holder.count("Aaron's Feeding Razor", None), 1);
        assert_eq!(holder.count("Alan Sovereign (Advanced)", None), 1);
        assert_eq!(holder.count("Anastasz di Zagreb", None), 2);
        assert_eq!(holder.title, "");
    }

    #[test]
    fn test_missing_crypt_marker_rejected() {
        let mut parser = LackeyParser::new();
        let holder = parse_text(&mut parser, "4\t.44 Magnum\n");
        assert!(!parser.validate(&holder));
    }

    #[test]
    fn test_space_separated_rejected() {
        let mut parser = LackeyParser::new();
        let holder = parse_text(&mut parser, "4 .44 Magnum\nCrypt:\n2 Abebe\n");
        assert!(!parser.validate(&holder));
        assert_eq!(holder.malformed().len(), 2);
    }

    #[test]
    fn test_writer_ascii_names() {
        let mut catalog = MemoryCatalog::new();
        let card = catalog.add_card(Card::new("Ankara Citadel, Turkey", &["Master"]));
        let accented = catalog.add_card(Card::new("Rötschreck", &["Vampire"]));

        let mut list = ResolvedCardList::default();
        list.add(card, None, 1);
        list.add(accented, None, 1);

        let text = LackeyWriter.write(&list, &list.metadata).unwrap();
        assert_eq!(text, "1\tAnkara Citadel, Turkey\nCrypt:\n1\tRotschreck\n");
    }

    #[test]
    fn test_round_trip() {
        let catalog = sample_catalog();
        let list = resolve_strict(&catalog, Dialect::Lackey, LACKEY_EXAMPLE);
        let text = LackeyWriter.write(&list, &list.metadata).unwrap();
        assert!(text.contains("Crypt:\n1\tAlan Sovereign Adv\n"));

        let again = resolve_strict(&catalog, Dialect::Lackey, &text);
        assert_eq!(again.card_counts(), list.card_counts());
    }
}
