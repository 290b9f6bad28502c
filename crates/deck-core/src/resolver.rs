//! Entity resolution: raw names in a holder to catalog entities
//!
//! Resolution runs in three passes:
//! 1. Look up every distinct card and expansion name. Nothing is asked yet.
//! 2. Hand the unknown and ambiguous names to the policy, one batch per kind.
//! 3. Build the entries, checking that each requested printing exists and
//!    asking the policy once more about those that don't.
//!
//! Any abort from the policy ends the resolution with no card list at all.

use crate::catalog::{CanonicalCatalog, Card, Expansion, Lookup};
use crate::error::{Report, ResolveError};
use crate::holder::{CardListHolder, ListMetadata};
use crate::normalize::canonical_key;
use crate::policy::{AmbiguousName, Answers, Choice, PrintingConflict, ResolutionPolicy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// One resolved (card, printing, count) entry
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEntry {
    pub card: Arc<Card>,
    /// `None` when the printing is unspecified
    pub expansion: Option<Arc<Expansion>>,
    pub count: u32,
}

impl ResolvedEntry {
    /// Expansion name, if any
    pub fn expansion_name(&self) -> Option<&str> {
        self.expansion.as_ref().map(|e| e.name.as_str())
    }
}

/// Why a name couldn't be resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedReason {
    UnknownCard,
    AmbiguousCard(Vec<String>),
    UnknownExpansion,
    AmbiguousExpansion(Vec<String>),
    NotPrintedIn(String),
}

impl UnresolvedReason {
    /// True for the reasons caused by a key matching several entities
    pub fn is_ambiguity(&self) -> bool {
        matches!(
            self,
            UnresolvedReason::AmbiguousCard(_) | UnresolvedReason::AmbiguousExpansion(_)
        )
    }
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::UnknownCard => write!(f, "unknown card"),
            UnresolvedReason::AmbiguousCard(c) => write!(f, "ambiguous card: {}", c.join(" / ")),
            UnresolvedReason::UnknownExpansion => write!(f, "unknown expansion"),
            UnresolvedReason::AmbiguousExpansion(c) => {
                write!(f, "ambiguous expansion: {}", c.join(" / "))
            }
            UnresolvedReason::NotPrintedIn(e) => write!(f, "not printed in {}", e),
        }
    }
}

/// A raw name left unresolved, with its reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unresolved {
    pub raw_name: String,
    pub reason: UnresolvedReason,
}

/// A fully resolved card list
#[derive(Debug, Clone, Default)]
pub struct ResolvedCardList {
    pub metadata: ListMetadata,
    /// Entries sorted by card name, then expansion name
    pub entries: Vec<ResolvedEntry>,
    /// Only filled in when partial results are allowed
    pub unresolved: Vec<Unresolved>,
}

impl ResolvedCardList {
    /// Create an empty list with the given metadata
    pub fn new(metadata: ListMetadata) -> Self {
        Self {
            metadata,
            entries: Vec::new(),
            unresolved: Vec::new(),
        }
    }

    /// Add copies of a card; the same (card, printing) pair accumulates
    pub fn add(&mut self, card: Arc<Card>, expansion: Option<Arc<Expansion>>, count: u32) {
        if count == 0 {
            return;
        }
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.card == card && e.expansion == expansion)
        {
            entry.count = entry.count.saturating_add(count);
        } else {
            self.entries.push(ResolvedEntry {
                card,
                expansion,
                count,
            });
        }
    }

    /// Sort entries by card name, then expansion (unspecified first)
    pub fn sort(&mut self) {
        self.entries.sort_by(|a, b| {
            a.card
                .name
                .cmp(&b.card.name)
                .then_with(|| a.expansion_name().cmp(&b.expansion_name()))
        });
    }

    /// Total number of cards
    pub fn total_cards(&self) -> u32 {
        self.entries.iter().fold(0u32, |sum, e| sum.saturating_add(e.count))
    }

    /// Crypt entries (vampires and imbued)
    pub fn crypt(&self) -> impl Iterator<Item = &ResolvedEntry> {
        self.entries.iter().filter(|e| e.card.is_crypt())
    }

    /// Library entries
    pub fn library(&self) -> impl Iterator<Item = &ResolvedEntry> {
        self.entries.iter().filter(|e| !e.card.is_crypt())
    }

    /// Counts keyed by (card id, expansion id)
    pub fn counts(&self) -> BTreeMap<(u32, Option<u32>), u32> {
        let mut counts = BTreeMap::new();
        for e in &self.entries {
            let n = counts
                .entry((e.card.id, e.expansion.as_ref().map(|x| x.id)))
                .or_insert(0u32);
            *n = n.saturating_add(e.count);
        }
        counts
    }

    /// Counts keyed by card, ignoring printings
    pub fn card_counts(&self) -> BTreeMap<u32, u32> {
        let mut counts = BTreeMap::new();
        for e in &self.entries {
            let n = counts.entry(e.card.id).or_insert(0u32);
            *n = n.saturating_add(e.count);
        }
        counts
    }

    /// Entries aggregated per card, ignoring printings, sorted by name
    pub fn per_card(&self) -> Vec<(Arc<Card>, u32)> {
        let mut merged: BTreeMap<String, (Arc<Card>, u32)> = BTreeMap::new();
        for e in &self.entries {
            let (_, n) = merged
                .entry(e.card.name.clone())
                .or_insert_with(|| (Arc::clone(&e.card), 0));
            *n = n.saturating_add(e.count);
        }
        merged.into_values().collect()
    }
}

/// Resolver configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Collect declined names into `unresolved` instead of failing
    #[serde(default)]
    pub allow_partial: bool,
}

enum Outcome<T> {
    Bound(T),
    Skipped,
    Failed(UnresolvedReason),
}

/// Resolves holders against a catalog
pub struct EntityResolver<'a> {
    catalog: &'a dyn CanonicalCatalog,
    config: ResolverConfig,
}

impl<'a> EntityResolver<'a> {
    /// Create a resolver over a catalog
    pub fn new(catalog: &'a dyn CanonicalCatalog) -> Self {
        Self {
            catalog,
            config: ResolverConfig::default(),
        }
    }

    /// Use the given configuration
    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Resolve every name in the holder
    pub fn resolve(
        &self,
        holder: &CardListHolder,
        policy: &mut dyn ResolutionPolicy,
    ) -> Result<ResolvedCardList, ResolveError> {
        // Pass 1: plain lookups
        let mut cards: BTreeMap<String, Outcome<Arc<Card>>> = BTreeMap::new();
        let mut unknown_cards = Vec::new();
        let mut ambiguous_cards = Vec::new();
        for name in holder.card_names() {
            match self.catalog.lookup_card(&canonical_key(name)) {
                Lookup::Found(card) => {
                    cards.insert(name.to_string(), Outcome::Bound(card));
                }
                Lookup::Ambiguous(candidates) => ambiguous_cards.push(AmbiguousName {
                    raw_name: name.to_string(),
                    candidates,
                }),
                Lookup::Missing => unknown_cards.push(name.to_string()),
            }
        }

        let mut expansions: BTreeMap<String, Outcome<Arc<Expansion>>> = BTreeMap::new();
        let mut unknown_exps = Vec::new();
        let mut ambiguous_exps = Vec::new();
        for name in holder.expansion_names() {
            match self.catalog.lookup_expansion(&canonical_key(name)) {
                Lookup::Found(exp) => {
                    expansions.insert(name.to_string(), Outcome::Bound(exp));
                }
                Lookup::Ambiguous(candidates) => ambiguous_exps.push(AmbiguousName {
                    raw_name: name.to_string(),
                    candidates,
                }),
                Lookup::Missing => unknown_exps.push(name.to_string()),
            }
        }

        // Pass 2: batched policy decisions
        if !unknown_cards.is_empty() {
            let answers = policy.resolve_unknown_cards(self.catalog, &unknown_cards);
            apply(&mut cards, &unknown_cards, answers, |_| UnresolvedReason::UnknownCard)?;
        }
        if !ambiguous_cards.is_empty() {
            let names: Vec<String> = ambiguous_cards.iter().map(|a| a.raw_name.clone()).collect();
            let answers = policy.resolve_ambiguous_cards(self.catalog, &ambiguous_cards);
            apply(&mut cards, &names, answers, |n| {
                candidate_names(&ambiguous_cards, n, |c| c.name.clone())
                    .map(UnresolvedReason::AmbiguousCard)
                    .unwrap_or(UnresolvedReason::UnknownCard)
            })?;
        }
        if !unknown_exps.is_empty() {
            let answers = policy.resolve_unknown_expansions(self.catalog, &unknown_exps);
            apply(&mut expansions, &unknown_exps, answers, |_| {
                UnresolvedReason::UnknownExpansion
            })?;
        }
        if !ambiguous_exps.is_empty() {
            let names: Vec<String> = ambiguous_exps.iter().map(|a| a.raw_name.clone()).collect();
            let answers = policy.resolve_ambiguous_expansions(self.catalog, &ambiguous_exps);
            apply(&mut expansions, &names, answers, |n| {
                candidate_names(&ambiguous_exps, n, |e| e.name.clone())
                    .map(UnresolvedReason::AmbiguousExpansion)
                    .unwrap_or(UnresolvedReason::UnknownExpansion)
            })?;
        }

        let mut failures: Vec<Unresolved> = Vec::new();
        for (name, outcome) in &cards {
            if let Outcome::Failed(reason) = outcome {
                failures.push(Unresolved {
                    raw_name: name.clone(),
                    reason: reason.clone(),
                });
            }
        }
        for (name, outcome) in &expansions {
            if let Outcome::Failed(reason) = outcome {
                failures.push(Unresolved {
                    raw_name: name.clone(),
                    reason: reason.clone(),
                });
            }
        }

        // Pass 3: build entries
        let mut list = ResolvedCardList::new(holder.metadata());
        let mut conflicts: Vec<(PrintingConflict, u32)> = Vec::new();
        for ((name, raw_exp), &count) in holder.entries() {
            let card = match cards.get(name) {
                Some(Outcome::Bound(card)) => Arc::clone(card),
                _ => continue,
            };
            let expansion = match raw_exp {
                None => None,
                Some(raw) => match expansions.get(raw) {
                    Some(Outcome::Bound(exp)) => Some(Arc::clone(exp)),
                    Some(Outcome::Skipped) => None,
                    _ => continue,
                },
            };

            if let (Some(exp), Some(raw)) = (&expansion, raw_exp) {
                let printings = self.catalog.printings_of(&card);
                if !card.printings.is_empty() && !printings.contains(exp) {
                    conflicts.push((
                        PrintingConflict {
                            card: Arc::clone(&card),
                            raw_expansion: raw.clone(),
                            candidates: printings,
                        },
                        count,
                    ));
                    continue;
                }
            }
            list.add(card, expansion, count);
        }

        if !conflicts.is_empty() {
            let batch: Vec<PrintingConflict> = conflicts.iter().map(|(c, _)| c.clone()).collect();
            let mut answers = policy
                .resolve_ambiguous_physical_cards(self.catalog, &batch)
                .map_err(|_| ResolveError::Aborted)?;
            for (conflict, count) in conflicts {
                let key = conflict.key();
                match answers.remove(&key).unwrap_or(Choice::Decline) {
                    Choice::Use(exp) => list.add(conflict.card, Some(exp), count),
                    Choice::Skip => list.add(conflict.card, None, count),
                    Choice::Decline => failures.push(Unresolved {
                        raw_name: key,
                        reason: UnresolvedReason::NotPrintedIn(conflict.raw_expansion),
                    }),
                }
            }
        }

        if !failures.is_empty() {
            if !self.config.allow_partial {
                let ambiguous_only = failures.iter().all(|f| f.reason.is_ambiguity());
                let report = Report(failures);
                return Err(if ambiguous_only {
                    ResolveError::AmbiguousEntity(report)
                } else {
                    ResolveError::UnresolvedEntity(report)
                });
            }
            for failure in &failures {
                log::warn!("unresolved '{}': {}", failure.raw_name, failure.reason);
            }
            list.unresolved = failures;
        }

        list.sort();
        log::info!(
            "resolved {} entries ({} cards), {} unresolved",
            list.entries.len(),
            list.total_cards(),
            list.unresolved.len()
        );
        Ok(list)
    }
}

fn apply<T>(
    outcomes: &mut BTreeMap<String, Outcome<T>>,
    names: &[String],
    answers: Answers<T>,
    reason: impl Fn(&str) -> UnresolvedReason,
) -> Result<(), ResolveError> {
    let mut answers = answers.map_err(|_| ResolveError::Aborted)?;
    for name in names {
        let outcome = match answers.remove(name).unwrap_or(Choice::Decline) {
            Choice::Use(entity) => Outcome::Bound(entity),
            Choice::Skip => Outcome::Skipped,
            Choice::Decline => Outcome::Failed(reason(name)),
        };
        outcomes.insert(name.clone(), outcome);
    }
    Ok(())
}

fn candidate_names<T>(
    ambiguous: &[AmbiguousName<Arc<T>>],
    raw: &str,
    name: impl Fn(&T) -> String,
) -> Option<Vec<String>> {
    ambiguous
        .iter()
        .find(|a| a.raw_name == raw)
        .map(|a| a.candidates.iter().map(|c| name(&**c)).collect())
}
