//! Remembered resolution decisions
//!
//! Stores what the user (or a heuristic) decided for names the catalog didn't
//! know, so the same deck file imported twice doesn't ask twice.

use crate::catalog::{CanonicalCatalog, Card, Expansion, Lookup};
use crate::error::{Error, Result};
use crate::normalize::canonical_key;
use crate::policy::{AmbiguousName, Answers, Choice, PrintingConflict, ResolutionPolicy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// A remembered decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// When the decision was recorded
    pub timestamp: DateTime<Utc>,
    /// Catalog name the raw name maps to; `None` means "ignore this name"
    pub target: Option<String>,
}

/// Decisions keyed by the canonical key of the raw name
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LookupCache {
    #[serde(default)]
    pub cards: HashMap<String, CacheEntry>,
    #[serde(default)]
    pub expansions: HashMap<String, CacheEntry>,
}

impl LookupCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the cache from a file, or create empty if not exists
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save the cache to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Remember a card decision
    pub fn remember_card(&mut self, raw: &str, target: Option<&str>) {
        self.cards.insert(canonical_key(raw), new_entry(target));
    }

    /// Remember an expansion decision
    pub fn remember_expansion(&mut self, raw: &str, target: Option<&str>) {
        self.expansions.insert(canonical_key(raw), new_entry(target));
    }

    /// Decision recorded for a raw card name
    pub fn card_decision(&self, raw: &str) -> Option<&CacheEntry> {
        self.cards.get(&canonical_key(raw))
    }

    /// Decision recorded for a raw expansion name
    pub fn expansion_decision(&self, raw: &str) -> Option<&CacheEntry> {
        self.expansions.get(&canonical_key(raw))
    }

    /// Drop everything recorded before `cutoff`
    pub fn prune_before(&mut self, cutoff: DateTime<Utc>) {
        self.cards.retain(|_, e| e.timestamp >= cutoff);
        self.expansions.retain(|_, e| e.timestamp >= cutoff);
    }

    /// Get total number of entries
    pub fn total_entries(&self) -> usize {
        self.cards.len() + self.expansions.len()
    }
}

fn new_entry(target: Option<&str>) -> CacheEntry {
    CacheEntry {
        timestamp: Utc::now(),
        target: target.map(str::to_string),
    }
}

/// Policy decorator that answers from a [`LookupCache`] first
///
/// Names the cache can't answer go to the inner policy, and its `Use` and
/// `Skip` answers are recorded. Ambiguity and printing questions are always
/// forwarded.
pub struct CachedPolicy<P> {
    inner: P,
    cache: LookupCache,
}

impl<P: ResolutionPolicy> CachedPolicy<P> {
    /// Wrap a policy with a cache
    pub fn new(inner: P, cache: LookupCache) -> Self {
        Self { inner, cache }
    }

    /// The cache, including anything recorded so far
    pub fn cache(&self) -> &LookupCache {
        &self.cache
    }

    /// Give back the cache
    pub fn into_cache(self) -> LookupCache {
        self.cache
    }
}

/// Split names into cached answers and names still to ask about
fn split_cached<T>(
    names: &[String],
    decision: impl Fn(&str) -> Option<Option<String>>,
    lookup: impl Fn(&str) -> Lookup<T>,
) -> (BTreeMap<String, Choice<T>>, Vec<String>) {
    let mut answered = BTreeMap::new();
    let mut remaining = Vec::new();
    for name in names {
        match decision(name) {
            Some(None) => {
                answered.insert(name.clone(), Choice::Skip);
            }
            Some(Some(target)) => match lookup(&canonical_key(&target)) {
                Lookup::Found(entity) => {
                    answered.insert(name.clone(), Choice::Use(entity));
                }
                _ => remaining.push(name.clone()),
            },
            None => remaining.push(name.clone()),
        }
    }
    (answered, remaining)
}

impl<P: ResolutionPolicy> ResolutionPolicy for CachedPolicy<P> {
    fn resolve_unknown_cards(
        &mut self,
        catalog: &dyn CanonicalCatalog,
        names: &[String],
    ) -> Answers<Arc<Card>> {
        let cache = &self.cache;
        let (mut answered, remaining) = split_cached(
            names,
            |n| cache.card_decision(n).map(|e| e.target.clone()),
            |k| catalog.lookup_card(k),
        );
        if !remaining.is_empty() {
            let fresh = self.inner.resolve_unknown_cards(catalog, &remaining)?;
            for (name, choice) in fresh {
                match &choice {
                    Choice::Use(card) => self.cache.remember_card(&name, Some(&card.name)),
                    Choice::Skip => self.cache.remember_card(&name, None),
                    Choice::Decline => {}
                }
                answered.insert(name, choice);
            }
        }
        Ok(answered)
    }

    fn resolve_ambiguous_cards(
        &mut self,
        catalog: &dyn CanonicalCatalog,
        names: &[AmbiguousName<Arc<Card>>],
    ) -> Answers<Arc<Card>> {
        self.inner.resolve_ambiguous_cards(catalog, names)
    }

    fn resolve_unknown_expansions(
        &mut self,
        catalog: &dyn CanonicalCatalog,
        names: &[String],
    ) -> Answers<Arc<Expansion>> {
        let cache = &self.cache;
        let (mut answered, remaining) = split_cached(
            names,
            |n| cache.expansion_decision(n).map(|e| e.target.clone()),
            |k| catalog.lookup_expansion(k),
        );
        if !remaining.is_empty() {
            let fresh = self.inner.resolve_unknown_expansions(catalog, &remaining)?;
            for (name, choice) in fresh {
                match &choice {
                    Choice::Use(exp) => self.cache.remember_expansion(&name, Some(&exp.name)),
                    Choice::Skip => self.cache.remember_expansion(&name, None),
                    Choice::Decline => {}
                }
                answered.insert(name, choice);
            }
        }
        Ok(answered)
    }

    fn resolve_ambiguous_expansions(
        &mut self,
        catalog: &dyn CanonicalCatalog,
        names: &[AmbiguousName<Arc<Expansion>>],
    ) -> Answers<Arc<Expansion>> {
        self.inner.resolve_ambiguous_expansions(catalog, names)
    }

    fn resolve_ambiguous_physical_cards(
        &mut self,
        catalog: &dyn CanonicalCatalog,
        conflicts: &[PrintingConflict],
    ) -> Answers<Arc<Expansion>> {
        self.inner.resolve_ambiguous_physical_cards(catalog, conflicts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{BestGuessPolicy, StrictPolicy};
    use crate::testdata::sample_catalog;
    use chrono::Duration;

    #[test]
    fn test_cache_add_and_get() {
        let mut cache = LookupCache::new();
        cache.remember_card("Abbat", Some("Abbot"));
        cache.remember_expansion("Jyhadd", None);

        assert_eq!(cache.total_entries(), 2);
        assert_eq!(
            cache.card_decision("ABBAT").and_then(|e| e.target.clone()),
            Some("Abbot".to_string())
        );
        assert!(cache.expansion_decision("jyhadd").unwrap().target.is_none());
    }

    #[test]
    fn test_cache_serialization() {
        let mut cache = LookupCache::new();
        cache.remember_card("Abbat", Some("Abbot"));

        let json = serde_json::to_string_pretty(&cache).unwrap();
        let loaded: LookupCache = serde_json::from_str(&json).unwrap();

        assert_eq!(loaded.total_entries(), 1);
        assert!(loaded.card_decision("Abbat").is_some());
    }

    #[test]
    fn test_prune() {
        let mut cache = LookupCache::new();
        cache.remember_card("Abbat", Some("Abbot"));
        cache.prune_before(Utc::now() + Duration::hours(1));
        assert_eq!(cache.total_entries(), 0);
    }

    #[test]
    fn test_cached_policy_records_and_replays() {
        let catalog = sample_catalog();
        let names = vec!["Abbat".to_string()];

        let mut policy = CachedPolicy::new(BestGuessPolicy::default(), LookupCache::new());
        let answers = policy.resolve_unknown_cards(&catalog, &names).unwrap();
        assert!(matches!(answers["Abbat"], Choice::Use(_)));

        // A strict policy would decline, but the cache already knows
        let mut replay = CachedPolicy::new(StrictPolicy, policy.into_cache());
        let answers = replay.resolve_unknown_cards(&catalog, &names).unwrap();
        match &answers["Abbat"] {
            Choice::Use(card) => assert_eq!(card.name, "Abbot"),
            other => panic!("expected cached answer, got {other:?}"),
        }
    }

    #[test]
    fn test_declines_are_not_cached() {
        let catalog = sample_catalog();
        let names = vec!["Zzzz Qqqq".to_string()];

        let mut policy = CachedPolicy::new(StrictPolicy, LookupCache::new());
        policy.resolve_unknown_cards(&catalog, &names).unwrap();
        assert_eq!(policy.cache().total_entries(), 0);
    }
}
