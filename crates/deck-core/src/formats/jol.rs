//! JOL deck lists
//!
//! The loosest dialect: one card per line, either "Nx Name" or a bare name
//! for a single copy. Advanced vampires carry "(adv)". Since almost any text
//! passes for a JOL list, it is tried last when guessing.

use super::{dialect_name, pattern, split_count, split_crypt_library, ADVANCED_SUFFIX};
use crate::dialect::{Dialect, FormatDescriptor, FormatParser, FormatWriter};
use crate::error::WriterError;
use crate::holder::{CardListHolder, ListMetadata};
use crate::resolver::ResolvedCardList;
use regex::Regex;
use std::fmt::Write;
use std::sync::OnceLock;

const ADV_MARKER: &str = " (adv)";

pub static DESCRIPTOR: FormatDescriptor = FormatDescriptor {
    dialect: Dialect::Jol,
    name: "JOL deck",
    extensions: &["txt"],
    content_hint: "\"Nx Name\" or bare \"Name\" lines",
    priority: 140,
    carries_expansions: false,
    writable: true,
};

/// Card name with any "(adv)" marker moved to the catalog suffix
fn jol_name(raw: &str) -> String {
    static ADV: OnceLock<Regex> = OnceLock::new();
    let re = pattern(&ADV, r"(?i)\s*\(adv\)");
    if re.is_match(raw) {
        let base = re.replace_all(raw, "");
        format!("{}{}", base.trim(), ADVANCED_SUFFIX)
    } else {
        raw.trim().to_string()
    }
}

/// Parser for JOL deck lists
pub struct JolParser {
    holder: CardListHolder,
    line_no: usize,
}

impl JolParser {
    pub fn new() -> Self {
        Self {
            holder: CardListHolder::new(),
            line_no: 0,
        }
    }
}

impl Default for JolParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatParser for JolParser {
    fn descriptor(&self) -> &'static FormatDescriptor {
        &DESCRIPTOR
    }

    fn feed(&mut self, line: &str) {
        self.line_no += 1;
        let text = line.trim();
        if text.is_empty() {
            return;
        }
        if text.contains(['<', '>']) {
            self.holder
                .record_malformed(self.line_no, line, "markup in a card line");
            return;
        }
        let (count, name) = split_count(text).unwrap_or((1, text));
        self.holder.add_card(&jol_name(name), None, count);
    }

    fn finalize(&mut self) -> CardListHolder {
        std::mem::take(&mut self.holder)
    }

    fn validate(&self, holder: &CardListHolder) -> bool {
        !holder.is_empty() && holder.malformed().is_empty()
    }
}

/// Writer for JOL deck lists
#[derive(Debug, Clone, Copy, Default)]
pub struct JolWriter;

impl FormatWriter for JolWriter {
    fn descriptor(&self) -> &'static FormatDescriptor {
        &DESCRIPTOR
    }

    fn write(&self, list: &ResolvedCardList, _metadata: &ListMetadata) -> Result<String, WriterError> {
        let (crypt, library) = split_crypt_library(list);

        let mut out = String::new();
        for (card, count) in &crypt {
            writeln!(out, "{}x {}", count, dialect_name(card, ADV_MARKER))?;
        }
        if !crypt.is_empty() && !library.is_empty() {
            out.push('\n');
        }
        for (card, count) in &library {
            writeln!(out, "{}x {}", count, card.name)?;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::parse_text;
    use crate::testdata::{resolve_strict, sample_catalog, JOL_EXAMPLE};

    #[test]
    fn test_jol_name() {
        assert_eq!(jol_name("Alan Sovereign (adv)"), "Alan Sovereign (Advanced)");
        assert_eq!(jol_name("Alan Sovereign (ADV) "), "Alan Sovereign (Advanced)");
        assert_eq!(jol_name("Abebe"), "Abebe");
    }

    #[test]
    fn test_parse_example() {
        let mut parser = JolParser::new();
        let holder = parse_text(&mut parser, JOL_EXAMPLE);

        assert!(parser.validate(&holder));
        assert_eq!(holder.count("Alan Sovereign (Advanced)", None), 1);
        assert_eq!(holder.count("Anastasz di Zagreb", None), 2);
        assert_eq!(holder.count("Abebe", None), 1);
        assert_eq!(holder.count(".44 Magnum", None), 4);
        assert_eq!(holder.count("The Path of Blood", None), 1);
    }

    #[test]
    fn test_markup_rejected() {
        let mut parser = JolParser::new();
        let holder = parse_text(&mut parser, "<deck>\n2x Abebe\n</deck>\n");
        assert!(!parser.validate(&holder));
    }

    #[test]
    fn test_empty_rejected() {
        let mut parser = JolParser::new();
        let holder = parse_text(&mut parser, "\n   \n");
        assert!(!parser.validate(&holder));
    }

    #[test]
    fn test_round_trip() {
        let catalog = sample_catalog();
        let list = resolve_strict(&catalog, Dialect::Jol, JOL_EXAMPLE);
        let text = JolWriter.write(&list, &list.metadata).unwrap();
        assert!(text.starts_with("1x Abebe\n1x Alan Sovereign (adv)\n2x Anastasz di Zagreb\n\n"));

        let again = resolve_strict(&catalog, Dialect::Jol, &text);
        assert_eq!(again.card_counts(), list.card_counts());
    }
}
