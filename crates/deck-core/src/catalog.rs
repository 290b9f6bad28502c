//! Canonical catalog of known cards and expansions
//!
//! The interchange code only ever reads from a catalog. Lookups are keyed by
//! [`canonical_key`], and a key that maps to more than one entity is reported
//! as [`Lookup::Ambiguous`] instead of silently picking one.

use crate::error::{Error, Result};
use crate::normalize::{canonical_key, guess_distance};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// A card in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    /// Catalog identifier, assigned when the card is added
    #[serde(default)]
    pub id: u32,
    /// Display name, e.g. "Alan Sovereign (Advanced)"
    pub name: String,
    /// Card types, e.g. ["Vampire"] or ["Action", "Reaction"]
    #[serde(default)]
    pub card_types: Vec<String>,
    /// Capacity (vampires) or life (imbued)
    #[serde(default)]
    pub capacity: Option<u32>,
    /// Crypt group
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub clans: Vec<String>,
    /// Disciplines, superior ones in upper case
    #[serde(default)]
    pub disciplines: Vec<String>,
    /// Cost with its type, e.g. "2 pool"
    #[serde(default)]
    pub cost: Option<String>,
    #[serde(default)]
    pub text: String,
    /// Names of the expansions this card was printed in
    #[serde(default)]
    pub printings: Vec<String>,
    /// Alternate names that should resolve to this card
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl Card {
    /// Create a card with just a name and types
    pub fn new(name: impl Into<String>, card_types: &[&str]) -> Self {
        Self {
            id: 0,
            name: name.into(),
            card_types: card_types.iter().map(|t| t.to_string()).collect(),
            capacity: None,
            group: None,
            clans: Vec::new(),
            disciplines: Vec::new(),
            cost: None,
            text: String::new(),
            printings: Vec::new(),
            aliases: Vec::new(),
        }
    }

    /// Crypt cards (vampires and imbued) as opposed to library cards
    pub fn is_crypt(&self) -> bool {
        self.card_types
            .iter()
            .any(|t| t == "Vampire" || t == "Imbued")
    }

    /// Advanced vampires carry an "(Advanced)" suffix
    pub fn is_advanced(&self) -> bool {
        self.name.ends_with(" (Advanced)")
    }

    /// Name without the advanced marker
    pub fn base_name(&self) -> &str {
        self.name.strip_suffix(" (Advanced)").unwrap_or(&self.name)
    }

    /// First card type, used for grouping library cards
    pub fn primary_type(&self) -> &str {
        self.card_types.first().map(String::as_str).unwrap_or("Unknown")
    }
}

impl PartialEq for Card {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Card {}

/// An expansion (printing) in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expansion {
    #[serde(default)]
    pub id: u32,
    /// Full name, e.g. "Lords of the Night"
    pub name: String,
    /// Short name, e.g. "LotN"
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl Expansion {
    /// Create an expansion with an optional short name
    pub fn new(name: impl Into<String>, short_name: Option<&str>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            short_name: short_name.map(str::to_string),
            aliases: Vec::new(),
        }
    }
}

impl PartialEq for Expansion {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Expansion {}

/// Result of a catalog lookup
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    /// Exactly one entity has this key
    Found(T),
    /// Several distinct entities share this key
    Ambiguous(Vec<T>),
    /// Nothing has this key
    Missing,
}

/// Read-only lookup surface over cards and expansions
pub trait CanonicalCatalog {
    /// Look up a card by canonical key
    fn lookup_card(&self, key: &str) -> Lookup<Arc<Card>>;

    /// Look up an expansion by canonical key
    fn lookup_expansion(&self, key: &str) -> Lookup<Arc<Expansion>>;

    /// Every card, for best-guess matching
    fn all_cards(&self) -> Vec<Arc<Card>>;

    /// Every expansion, for disambiguation choices
    fn all_expansions(&self) -> Vec<Arc<Expansion>>;

    /// Expansions a card was printed in
    fn printings_of(&self, card: &Card) -> Vec<Arc<Expansion>> {
        card.printings
            .iter()
            .filter_map(|p| match self.lookup_expansion(&canonical_key(p)) {
                Lookup::Found(exp) => Some(exp),
                _ => None,
            })
            .collect()
    }
}

/// Cards closest to `raw`, best first, at most `limit` of them
pub fn suggest_cards(
    catalog: &dyn CanonicalCatalog,
    raw: &str,
    limit: usize,
) -> Vec<(usize, Arc<Card>)> {
    rank(catalog.all_cards(), raw, limit, |c| c.name.as_str())
}

/// Expansions closest to `raw`, best first, at most `limit` of them
pub fn suggest_expansions(
    catalog: &dyn CanonicalCatalog,
    raw: &str,
    limit: usize,
) -> Vec<(usize, Arc<Expansion>)> {
    let mut ranked = Vec::new();
    for exp in catalog.all_expansions() {
        let mut best = guess_distance(raw, &exp.name);
        if let Some(short) = &exp.short_name {
            best = best.min(guess_distance(raw, short));
        }
        ranked.push((best, exp));
    }
    ranked.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.name.cmp(&b.1.name)));
    ranked.truncate(limit);
    ranked
}

fn rank<T>(
    items: Vec<Arc<T>>,
    raw: &str,
    limit: usize,
    name: impl Fn(&T) -> &str,
) -> Vec<(usize, Arc<T>)> {
    let mut ranked: Vec<(usize, Arc<T>)> = items
        .into_iter()
        .map(|item| (guess_distance(raw, name(&*item)), item))
        .collect();
    ranked.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| name(&*a.1).cmp(name(&*b.1))));
    ranked.truncate(limit);
    ranked
}

/// On-disk catalog document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub expansions: Vec<Expansion>,
    #[serde(default)]
    pub cards: Vec<Card>,
}

/// In-memory catalog, usually loaded from a JSON file
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    cards: Vec<Arc<Card>>,
    expansions: Vec<Arc<Expansion>>,
    card_index: HashMap<String, Vec<usize>>,
    expansion_index: HashMap<String, Vec<usize>>,
}

impl MemoryCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let file: CatalogFile = serde_json::from_str(&content).map_err(|e| Error::Catalog {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let catalog = Self::from_file(file);
        log::info!(
            "loaded catalog {}: {} cards, {} expansions",
            path.display(),
            catalog.cards.len(),
            catalog.expansions.len()
        );
        Ok(catalog)
    }

    /// Build a catalog from a parsed catalog document
    pub fn from_file(file: CatalogFile) -> Self {
        let mut catalog = Self::new();
        for exp in file.expansions {
            catalog.add_expansion(exp);
        }
        for card in file.cards {
            catalog.add_card(card);
        }
        catalog
    }

    /// Add an expansion, assigning its id
    pub fn add_expansion(&mut self, mut exp: Expansion) -> Arc<Expansion> {
        let idx = self.expansions.len();
        exp.id = idx as u32 + 1;
        let mut names = vec![exp.name.clone()];
        names.extend(exp.short_name.iter().cloned());
        names.extend(exp.aliases.iter().cloned());
        index_names(&mut self.expansion_index, &names, idx);

        let exp = Arc::new(exp);
        self.expansions.push(Arc::clone(&exp));
        exp
    }

    /// Add a card, assigning its id
    pub fn add_card(&mut self, mut card: Card) -> Arc<Card> {
        let idx = self.cards.len();
        card.id = idx as u32 + 1;
        let mut names = vec![card.name.clone()];
        names.extend(card.aliases.iter().cloned());
        index_names(&mut self.card_index, &names, idx);

        let card = Arc::new(card);
        self.cards.push(Arc::clone(&card));
        card
    }

    /// Number of cards
    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    /// Number of expansions
    pub fn expansion_count(&self) -> usize {
        self.expansions.len()
    }
}

fn index_names(index: &mut HashMap<String, Vec<usize>>, names: &[String], idx: usize) {
    for name in names {
        let key = canonical_key(name);
        if key.is_empty() {
            continue;
        }
        let slot = index.entry(key).or_default();
        if !slot.contains(&idx) {
            slot.push(idx);
        }
    }
}

fn lookup_in<T>(index: &HashMap<String, Vec<usize>>, items: &[Arc<T>], key: &str) -> Lookup<Arc<T>> {
    match index.get(key).map(Vec::as_slice) {
        None | Some([]) => Lookup::Missing,
        Some([idx]) => Lookup::Found(Arc::clone(&items[*idx])),
        Some(many) => Lookup::Ambiguous(many.iter().map(|i| Arc::clone(&items[*i])).collect()),
    }
}

impl CanonicalCatalog for MemoryCatalog {
    fn lookup_card(&self, key: &str) -> Lookup<Arc<Card>> {
        lookup_in(&self.card_index, &self.cards, key)
    }

    fn lookup_expansion(&self, key: &str) -> Lookup<Arc<Expansion>> {
        lookup_in(&self.expansion_index, &self.expansions, key)
    }

    fn all_cards(&self) -> Vec<Arc<Card>> {
        self.cards.clone()
    }

    fn all_expansions(&self) -> Vec<Arc<Expansion>> {
        self.expansions.clone()
    }
}
