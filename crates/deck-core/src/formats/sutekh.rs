//! Sutekh XML card sets and card lists

use super::xml::{Element, XmlBuffer, XmlOut};
use crate::dialect::{Dialect, FormatDescriptor, FormatParser, FormatWriter};
use crate::error::WriterError;
use crate::holder::{CardListHolder, ListMetadata};
use crate::resolver::ResolvedCardList;

/// Expansion attribute value for cards with no specific printing
pub const NO_EXPANSION: &str = "None Specified";

const CARD_SET_VERSION: &str = "1.3";

pub static CARD_SET: FormatDescriptor = FormatDescriptor {
    dialect: Dialect::SutekhCardSet,
    name: "Sutekh card set (XML)",
    extensions: &["xml"],
    content_hint: "<physicalcardset> root with <card name count expansion/> entries",
    priority: 10,
    carries_expansions: true,
    writable: true,
};

pub static ABSTRACT_SET: FormatDescriptor = FormatDescriptor {
    dialect: Dialect::SutekhAbstractSet,
    name: "Sutekh abstract card set (legacy XML)",
    extensions: &["xml"],
    content_hint: "<abstractcardset> root, cards without printings",
    priority: 20,
    carries_expansions: false,
    writable: false,
};

pub static CARD_LIST: FormatDescriptor = FormatDescriptor {
    dialect: Dialect::SutekhCardList,
    name: "Sutekh card collection (legacy XML)",
    extensions: &["xml"],
    content_hint: "<cards> root with <card name count expansion/> entries",
    priority: 30,
    carries_expansions: true,
    writable: false,
};

/// Parser for the three Sutekh XML documents; they differ only in the root
pub struct SutekhXmlParser {
    descriptor: &'static FormatDescriptor,
    root: &'static str,
    buffer: XmlBuffer,
    root_matched: bool,
    error: Option<String>,
}

impl SutekhXmlParser {
    fn with_root(descriptor: &'static FormatDescriptor, root: &'static str) -> Self {
        Self {
            descriptor,
            root,
            buffer: XmlBuffer::default(),
            root_matched: false,
            error: None,
        }
    }

    pub fn card_set() -> Self {
        Self::with_root(&CARD_SET, "physicalcardset")
    }

    pub fn abstract_set() -> Self {
        Self::with_root(&ABSTRACT_SET, "abstractcardset")
    }

    pub fn card_list() -> Self {
        Self::with_root(&CARD_LIST, "cards")
    }

    fn read(&mut self, root: &Element, holder: &mut CardListHolder) {
        if root.name != self.root {
            return;
        }
        self.root_matched = true;

        if let Some(name) = root.attr("name") {
            holder.title = name.to_string();
        }
        if let Some(author) = root.attr("author") {
            holder.author = author.to_string();
        }
        if let Some(comment) = root.child_text("comment").filter(|c| !c.is_empty()) {
            holder.description = Some(comment.to_string());
        }

        for (idx, card) in root.children_named("card").enumerate() {
            let Some(name) = card.attr("name") else {
                holder.record_malformed(idx + 1, &card.name, "card without a name");
                continue;
            };
            let count = match card.attr("count").map(str::parse::<u32>) {
                None => 1,
                Some(Ok(count)) => count,
                Some(Err(_)) => {
                    holder.record_malformed(idx + 1, name, "count is not a number");
                    continue;
                }
            };
            let expansion = card.attr("expansion").filter(|e| *e != NO_EXPANSION);
            holder.add_card(name, expansion, count);
        }
    }
}

impl FormatParser for SutekhXmlParser {
    fn descriptor(&self) -> &'static FormatDescriptor {
        self.descriptor
    }

    fn feed(&mut self, line: &str) {
        self.buffer.push_line(line);
    }

    fn finalize(&mut self) -> CardListHolder {
        let mut holder = CardListHolder::new();
        match self.buffer.take_document() {
            Ok(root) => self.read(&root, &mut holder),
            Err(e) => {
                holder.record_malformed(0, "", e.clone());
                self.error = Some(e);
            }
        }
        holder
    }

    fn validate(&self, _holder: &CardListHolder) -> bool {
        self.root_matched && self.error.is_none()
    }
}

/// Writer for Sutekh card-set XML
#[derive(Debug, Clone, Copy, Default)]
pub struct SutekhCardSetWriter;

impl FormatWriter for SutekhCardSetWriter {
    fn descriptor(&self) -> &'static FormatDescriptor {
        &CARD_SET
    }

    fn write(&self, list: &ResolvedCardList, metadata: &ListMetadata) -> Result<String, WriterError> {
        let mut out = XmlOut::new()?;
        out.start(
            "physicalcardset",
            &[
                ("sutekh_xml_version", CARD_SET_VERSION),
                ("name", metadata.title.as_str()),
                ("author", metadata.author.as_str()),
                ("inuse", "No"),
            ],
        )?;
        if let Some(description) = &metadata.description {
            out.text_element("comment", description)?;
        }
        for entry in &list.entries {
            let count = entry.count.to_string();
            out.empty(
                "card",
                &[
                    ("count", count.as_str()),
                    ("expansion", entry.expansion_name().unwrap_or(NO_EXPANSION)),
                    ("name", entry.card.name.as_str()),
                ],
            )?;
        }
        out.end("physicalcardset")?;
        out.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::parse_text;
    use crate::testdata::{resolve_strict, sample_catalog, ABSTRACT_SET_EXAMPLE, CARD_LIST_EXAMPLE, CARD_SET_EXAMPLE};

    #[test]
    fn test_parse_card_set() {
        let mut parser = SutekhXmlParser::card_set();
        let holder = parse_text(&mut parser, CARD_SET_EXAMPLE);

        assert!(parser.validate(&holder));
        assert_eq!(holder.title, "Test Set 1");
        assert_eq!(holder.author, "A test author");
        assert_eq!(holder.description.as_deref(), Some("A test comment"));
        assert_eq!(holder.count(".44 Magnum", Some("Jyhad")), 1);
        assert_eq!(holder.count(".44 Magnum", None), 3);
        assert_eq!(holder.count("AK-47", Some("LotN")), 1);
    }

    #[test]
    fn test_parse_abstract_set() {
        let mut parser = SutekhXmlParser::abstract_set();
        let holder = parse_text(&mut parser, ABSTRACT_SET_EXAMPLE);

        assert!(parser.validate(&holder));
        assert_eq!(holder.title, "Abstract Set");
        assert_eq!(holder.count("Abbot", None), 2);
        assert_eq!(holder.count("The Path of Blood", None), 1);
    }

    #[test]
    fn test_parse_card_list() {
        let mut parser = SutekhXmlParser::card_list();
        let holder = parse_text(&mut parser, CARD_LIST_EXAMPLE);

        assert!(parser.validate(&holder));
        assert_eq!(holder.count("Abombwe", Some("Legacy of Blood")), 1);
        assert_eq!(holder.count("Abebe", None), 1);
    }

    #[test]
    fn test_wrong_root_rejected() {
        let mut parser = SutekhXmlParser::abstract_set();
        let holder = parse_text(&mut parser, CARD_SET_EXAMPLE);
        assert!(!parser.validate(&holder));
        assert!(holder.is_empty());
    }

    #[test]
    fn test_bad_count_is_skipped() {
        let mut parser = SutekhXmlParser::card_set();
        let holder = parse_text(
            &mut parser,
            r#"<physicalcardset name="x"><card name="Abbot" count="many"/><card name="AK-47" count="2"/></physicalcardset>"#,
        );
        assert!(parser.validate(&holder));
        assert_eq!(holder.malformed().len(), 1);
        assert_eq!(holder.count("AK-47", None), 2);
    }

    #[test]
    fn test_round_trip() {
        let catalog = sample_catalog();
        let list = resolve_strict(&catalog, Dialect::SutekhCardSet, CARD_SET_EXAMPLE);

        let text = SutekhCardSetWriter.write(&list, &list.metadata).unwrap();
        assert!(text.contains("expansion=\"None Specified\""));

        let again = resolve_strict(&catalog, Dialect::SutekhCardSet, &text);
        assert_eq!(again.counts(), list.counts());
        assert_eq!(again.metadata, list.metadata);
    }
}
