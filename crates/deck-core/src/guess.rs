//! Blind format detection
//!
//! Each candidate dialect gets a fresh parser and the whole input. The first
//! one whose result validates wins; the trial order is a fixed table (see
//! [`guess_order`]) so permissive dialects never shadow strict ones.

use crate::catalog::CanonicalCatalog;
use crate::config::ImportConfig;
use crate::dialect::{guess_order, parse_text, Dialect};
use crate::error::{Error, Result};
use crate::holder::CardListHolder;
use crate::policy::ResolutionPolicy;
use crate::resolver::{EntityResolver, ResolvedCardList};
use encoding_rs::{Encoding, WINDOWS_1252};
use log::{debug, info};

/// Where a guesser is in its probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessState {
    Idle,
    Probing(Dialect),
    Resolved(Dialect),
    Exhausted,
}

/// Tries dialects in order until one accepts the input
#[derive(Debug, Clone)]
pub struct FormatGuesser {
    order: Vec<Dialect>,
    state: GuessState,
}

impl FormatGuesser {
    /// Guesser using the default trial order
    pub fn new() -> Self {
        Self::with_order(guess_order())
    }

    /// Guesser using a custom trial order
    pub fn with_order(order: Vec<Dialect>) -> Self {
        Self {
            order,
            state: GuessState::Idle,
        }
    }

    pub fn state(&self) -> GuessState {
        self.state
    }

    pub fn order(&self) -> &[Dialect] {
        &self.order
    }

    /// Find the first dialect that accepts `text` and return its holder
    pub fn guess(&mut self, text: &str) -> Result<(Dialect, CardListHolder)> {
        for &dialect in &self.order {
            self.state = GuessState::Probing(dialect);

            let mut parser = dialect.parser();
            let holder = parse_text(parser.as_mut(), text);
            if parser.validate(&holder) {
                self.state = GuessState::Resolved(dialect);
                info!(
                    "Input recognized as {} ({} entries)",
                    dialect.descriptor().name,
                    holder.entry_count()
                );
                return Ok((dialect, holder));
            }
            debug!(
                "{} rejected the input ({} malformed lines)",
                dialect,
                holder.malformed().len()
            );
        }

        self.state = GuessState::Exhausted;
        Err(Error::FormatNotRecognized {
            tried: self.order.iter().map(|d| d.name().to_string()).collect(),
        })
    }
}

impl Default for FormatGuesser {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode raw file contents
///
/// A byte order mark selects the encoding; otherwise UTF-8 is tried and
/// Windows-1252 is the fallback, which is what older deck tools wrote.
pub fn decode_input(raw: &[u8]) -> String {
    if let Some((encoding, bom_len)) = Encoding::for_bom(raw) {
        let (text, _) = encoding.decode_without_bom_handling(&raw[bom_len..]);
        return text.into_owned();
    }
    match std::str::from_utf8(raw) {
        Ok(text) => text.to_string(),
        Err(_) => {
            debug!("Input is not UTF-8, decoding as Windows-1252");
            let (text, _) = WINDOWS_1252.decode_without_bom_handling(raw);
            text.into_owned()
        }
    }
}

/// Guess the dialect of `raw`, parse it and resolve it against `catalog`
pub fn guess_and_parse(
    raw: &[u8],
    catalog: &dyn CanonicalCatalog,
    policy: &mut dyn ResolutionPolicy,
    config: &ImportConfig,
) -> Result<ResolvedCardList> {
    let (_, list) = guess_and_resolve(raw, catalog, policy, config)?;
    Ok(list)
}

/// Like [`guess_and_parse`], also reporting the detected dialect
pub fn guess_and_resolve(
    raw: &[u8],
    catalog: &dyn CanonicalCatalog,
    policy: &mut dyn ResolutionPolicy,
    config: &ImportConfig,
) -> Result<(Dialect, ResolvedCardList)> {
    let text = decode_input(raw);
    let (dialect, holder) = FormatGuesser::with_order(config.guess_order()).guess(&text)?;

    let list = EntityResolver::new(catalog)
        .with_config(config.resolver_config())
        .resolve(&holder, policy)?;
    Ok((dialect, list))
}
