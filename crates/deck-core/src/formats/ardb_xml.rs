//! Anarch Revolt Deck Builder XML decks and inventories
//!
//! Both documents list crypt cards as `<vampire>` elements and library cards
//! as `<card>` elements. Advanced vampires carry their marker in a separate
//! `<adv>` element, and the name itself is written without it. Decks count
//! cards with a `count` attribute; inventories use `have`/`need`/`spare`, and
//! only `have` is read back.

use super::xml::{Element, XmlBuffer, XmlOut};
use super::{require_capacity, section_size, split_crypt_library, CryptStats, ADVANCED_SUFFIX};
use crate::catalog::Card;
use crate::dialect::{Dialect, FormatDescriptor, FormatParser, FormatWriter};
use crate::error::WriterError;
use crate::holder::{CardListHolder, ListMetadata};
use crate::resolver::ResolvedCardList;
use chrono::{Local, NaiveDate};

const GENERATOR: &str = "deck-interchange";
const FORMAT_VERSION: &str = "-TODO-1.0";
const ADV_MARKER: &str = "(Advanced)";

pub static DECK: FormatDescriptor = FormatDescriptor {
    dialect: Dialect::ArdbXmlDeck,
    name: "ARDB deck (XML)",
    extensions: &["xml"],
    content_hint: "<deck> root with <crypt> and <library> sections",
    priority: 40,
    carries_expansions: false,
    writable: true,
};

pub static INVENTORY: FormatDescriptor = FormatDescriptor {
    dialect: Dialect::ArdbXmlInventory,
    name: "ARDB inventory (XML)",
    extensions: &["xml"],
    content_hint: "<inventory> root, cards with have/need/spare attributes",
    priority: 50,
    carries_expansions: false,
    writable: true,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Deck,
    Inventory,
}

/// Parser for ARDB XML decks and inventories
pub struct ArdbXmlParser {
    kind: Kind,
    buffer: XmlBuffer,
    root_matched: bool,
    error: Option<String>,
}

impl ArdbXmlParser {
    fn new(kind: Kind) -> Self {
        Self {
            kind,
            buffer: XmlBuffer::default(),
            root_matched: false,
            error: None,
        }
    }

    pub fn deck() -> Self {
        Self::new(Kind::Deck)
    }

    pub fn inventory() -> Self {
        Self::new(Kind::Inventory)
    }

    fn root_name(&self) -> &'static str {
        match self.kind {
            Kind::Deck => "deck",
            Kind::Inventory => "inventory",
        }
    }

    fn count_attribute(&self) -> &'static str {
        match self.kind {
            Kind::Deck => "count",
            Kind::Inventory => "have",
        }
    }

    fn read(&mut self, root: &Element, holder: &mut CardListHolder) {
        if root.name != self.root_name() {
            return;
        }
        self.root_matched = true;

        if self.kind == Kind::Deck {
            holder.title = root.child_text("name").unwrap_or_default().to_string();
            holder.author = root.child_text("author").unwrap_or_default().to_string();
            holder.description = root
                .child_text("description")
                .filter(|d| !d.is_empty())
                .map(str::to_string);
        }

        let mut position = 0;
        for (section, tag) in [("crypt", "vampire"), ("library", "card")] {
            let Some(section) = root.child(section) else {
                continue;
            };
            for card in section.children_named(tag) {
                position += 1;
                self.read_card(card, position, holder);
            }
        }
    }

    fn read_card(&self, card: &Element, position: usize, holder: &mut CardListHolder) {
        let Some(name) = card.child_text("name").filter(|n| !n.is_empty()) else {
            holder.record_malformed(position, &card.name, "card without a name");
            return;
        };
        let count = match card.attr(self.count_attribute()).map(str::parse::<u32>) {
            Some(Ok(count)) => count,
            Some(Err(_)) => {
                holder.record_malformed(position, name, "count is not a number");
                return;
            }
            None if self.kind == Kind::Deck => 1,
            None => 0,
        };
        let advanced = card
            .child_text("adv")
            .is_some_and(|a| a.eq_ignore_ascii_case(ADV_MARKER));
        if advanced {
            holder.add_card(&format!("{}{}", name, ADVANCED_SUFFIX), None, count);
        } else {
            holder.add_card(name, None, count);
        }
    }
}

impl FormatParser for ArdbXmlParser {
    fn descriptor(&self) -> &'static FormatDescriptor {
        match self.kind {
            Kind::Deck => &DECK,
            Kind::Inventory => &INVENTORY,
        }
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

fn database_id(card: &Card) -> String {
    card.id.to_string()
}

/// Write the elements shared by deck and inventory vampires
fn write_vampire_body(out: &mut XmlOut, card: &Card, dialect: &'static str) -> Result<(), WriterError> {
    let capacity = require_capacity(card, dialect)?;
    out.text_element("adv", if card.is_advanced() { ADV_MARKER } else { "" })?;
    out.text_element("name", card.base_name())?;
    out.text_element("set", &card.printings.join(", "))?;
    out.text_element("disciplines", &card.disciplines.join(" "))?;
    out.text_element("clan", card.clans.first().map(String::as_str).unwrap_or(""))?;
    out.text_element("capacity", &capacity.to_string())?;
    out.text_element("group", card.group.as_deref().unwrap_or(""))?;
    out.text_element("text", &card.text)?;
    Ok(())
}

fn write_library_body(out: &mut XmlOut, card: &Card) -> Result<(), WriterError> {
    out.text_element("name", &card.name)?;
    out.text_element("set", &card.printings.join(", "))?;
    if let Some(cost) = &card.cost {
        out.text_element("cost", cost)?;
    }
    if !card.clans.is_empty() {
        out.text_element("requirement", &card.clans.join("/"))?;
    }
    out.text_element("type", &card.card_types.join("/"))?;
    if !card.disciplines.is_empty() {
        out.text_element("disciplines", &card.disciplines.join("/"))?;
    }
    out.text_element("text", &card.text)?;
    Ok(())
}

/// Writer for ARDB XML decks
#[derive(Debug, Clone, Copy)]
pub struct ArdbXmlDeckWriter {
    date: NaiveDate,
}

impl ArdbXmlDeckWriter {
    /// Writer stamping today's date
    pub fn new() -> Self {
        Self::with_date(Local::now().date_naive())
    }

    pub fn with_date(date: NaiveDate) -> Self {
        Self { date }
    }
}

impl Default for ArdbXmlDeckWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatWriter for ArdbXmlDeckWriter {
    fn descriptor(&self) -> &'static FormatDescriptor {
        &DECK
    }

    fn write(&self, list: &ResolvedCardList, metadata: &ListMetadata) -> Result<String, WriterError> {
        let stats = CryptStats::compute(list, DECK.name)?;
        let (crypt, library) = split_crypt_library(list);
        let library_size = section_size(&library);

        let mut out = XmlOut::new()?;
        out.start(
            "deck",
            &[
                ("generator", GENERATOR),
                ("formatVersion", FORMAT_VERSION),
            ],
        )?;
        out.text_element("name", &metadata.title)?;
        out.text_element("author", &metadata.author)?;
        out.text_element("description", metadata.description.as_deref().unwrap_or(""))?;
        out.text_element("date", &self.date.format("%Y-%m-%d").to_string())?;

        let (size, min, max, avg) = (
            stats.size.to_string(),
            stats.min.to_string(),
            stats.max.to_string(),
            stats.avg_text(),
        );
        out.start(
            "crypt",
            &[
                ("size", size.as_str()),
                ("min", min.as_str()),
                ("max", max.as_str()),
                ("avg", avg.as_str()),
            ],
        )?;
        for (card, count) in &crypt {
            let (id, count) = (database_id(card), count.to_string());
            out.start("vampire", &[("databaseID", id.as_str()), ("count", count.as_str())])?;
            write_vampire_body(&mut out, card, DECK.name)?;
            out.end("vampire")?;
        }
        out.end("crypt")?;

        let library_size = library_size.to_string();
        out.start("library", &[("size", library_size.as_str())])?;
        for (card, count) in &library {
            let (id, count) = (database_id(card), count.to_string());
            out.start("card", &[("databaseID", id.as_str()), ("count", count.as_str())])?;
            write_library_body(&mut out, card)?;
            out.end("card")?;
        }
        out.end("library")?;

        out.end("deck")?;
        out.finish()
    }
}

/// Writer for ARDB XML inventories
#[derive(Debug, Clone, Copy)]
pub struct ArdbXmlInventoryWriter {
    date: NaiveDate,
}

impl ArdbXmlInventoryWriter {
    pub fn new() -> Self {
        Self::with_date(Local::now().date_naive())
    }

    pub fn with_date(date: NaiveDate) -> Self {
        Self { date }
    }
}

impl Default for ArdbXmlInventoryWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatWriter for ArdbXmlInventoryWriter {
    fn descriptor(&self) -> &'static FormatDescriptor {
        &INVENTORY
    }

    fn write(&self, list: &ResolvedCardList, _metadata: &ListMetadata) -> Result<String, WriterError> {
        let (crypt, library) = split_crypt_library(list);
        let crypt_size = section_size(&crypt);
        let library_size = section_size(&library);

        let mut out = XmlOut::new()?;
        out.start(
            "inventory",
            &[
                ("generator", GENERATOR),
                ("formatVersion", FORMAT_VERSION),
            ],
        )?;
        out.text_element("date", &self.date.format("%Y-%m-%d").to_string())?;

        let crypt_size = crypt_size.to_string();
        out.start("crypt", &[("size", crypt_size.as_str())])?;
        for (card, count) in &crypt {
            let (id, have) = (database_id(card), count.to_string());
            out.start(
                "vampire",
                &[
                    ("databaseID", id.as_str()),
                    ("have", have.as_str()),
                    ("spare", "0"),
                    ("need", "0"),
                ],
            )?;
            write_vampire_body(&mut out, card, INVENTORY.name)?;
            out.end("vampire")?;
        }
        out.end("crypt")?;

        let library_size = library_size.to_string();
        out.start("library", &[("size", library_size.as_str())])?;
        for (card, count) in &library {
            let (id, have) = (database_id(card), count.to_string());
            out.start(
                "card",
                &[
                    ("databaseID", id.as_str()),
                    ("have", have.as_str()),
                    ("spare", "0"),
                    ("need", "0"),
                ],
            )?;
            write_library_body(&mut out, card)?;
            out.end("card")?;
        }
        out.end("library")?;

        out.end("inventory")?;
        out.finish()
    }
}
