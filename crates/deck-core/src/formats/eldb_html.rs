//! ELDB HTML deck export (read only)
//!
//! The page is parsed with an HTML5 parser, which also decodes entities. The
//! title comes from `<title>`; paragraphs, headings and list items are then
//! read in document order: "Author:" and "Description:" lines, the
//! "Crypt"/"Library" headings and "Nx Name" entries.

use super::{canonical_advanced, split_count};
use crate::dialect::{Dialect, FormatDescriptor, FormatParser};
use crate::holder::CardListHolder;
use scraper::{ElementRef, Html, Selector};

const ADV_MARKER: &str = " (ADV)";

/// Elements whose text carries the deck
const BLOCKS: &str = "p, h1, h2, h3, h4, h5, h6, li";

pub static DESCRIPTOR: FormatDescriptor = FormatDescriptor {
    dialect: Dialect::EldbHtml,
    name: "ELDB HTML deck",
    extensions: &["html", "htm"],
    content_hint: "HTML page with Crypt and Library headings and \"Nx Name\" items",
    priority: 90,
    carries_expansions: false,
    writable: false,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Crypt,
    Library,
}

/// Text of an element with whitespace runs collapsed
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parser for ELDB HTML exports
pub struct EldbHtmlParser {
    text: String,
    saw_html: bool,
    saw_section: bool,
}

impl EldbHtmlParser {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            saw_html: false,
            saw_section: false,
        }
    }

    fn read(&mut self, holder: &mut CardListHolder) {
        let text = std::mem::take(&mut self.text);
        // html5ever invents an <html> root for any input, so look at the source
        self.saw_html = text.to_ascii_lowercase().contains("<html");
        if !self.saw_html {
            return;
        }

        let (Ok(title), Ok(blocks)) = (Selector::parse("title"), Selector::parse(BLOCKS)) else {
            holder.record_malformed(0, BLOCKS, "selector did not parse");
            return;
        };
        let document = Html::parse_document(&text);

        if let Some(title) = document.select(&title).next() {
            holder.title = element_text(title);
        }

        let mut section = Section::None;
        for (i, block) in document.select(&blocks).enumerate() {
            self.read_block(&element_text(block), &mut section, i + 1, holder);
        }
    }

    fn read_block(
        &mut self,
        text: &str,
        section: &mut Section,
        position: usize,
        holder: &mut CardListHolder,
    ) {
        if text.is_empty() {
            return;
        }
        if let Some(author) = text.strip_prefix("Author:") {
            holder.author = author.trim().to_string();
            return;
        }
        if let Some(description) = text.strip_prefix("Description:") {
            holder.description = Some(description.trim().to_string());
            return;
        }
        if text.starts_with("Crypt") {
            *section = Section::Crypt;
            self.saw_section = true;
            return;
        }
        if text.starts_with("Library") {
            *section = Section::Library;
            self.saw_section = true;
            return;
        }

        match (*section, split_count(text)) {
            (Section::None, _) => {}
            (Section::Crypt, Some((count, name))) => {
                holder.add_card(&canonical_advanced(name, ADV_MARKER), None, count)
            }
            (Section::Library, Some((count, name))) => holder.add_card(name, None, count),
            // card type headings such as "Master [2]"
            (_, None) if text.ends_with(']') => {}
            (_, None) => holder.record_malformed(position, text, "expected \"Nx Name\""),
        }
    }
}

impl Default for EldbHtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatParser for EldbHtmlParser {
    fn descriptor(&self) -> &'static FormatDescriptor {
        &DESCRIPTOR
    }

    fn feed(&mut self, line: &str) {
        self.text.push_str(line);
        self.text.push('\n');
    }

    fn finalize(&mut self) -> CardListHolder {
        let mut holder = CardListHolder::new();
        self.read(&mut holder);
        holder
    }

    fn validate(&self, holder: &CardListHolder) -> bool {
        self.saw_html && self.saw_section && !holder.is_empty()
    }
}
