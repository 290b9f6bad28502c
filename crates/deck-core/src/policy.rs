//! Resolution policies
//!
//! The resolver hands every batch of names it couldn't settle on its own to
//! a [`ResolutionPolicy`]. A policy answers each name with a [`Choice`], or
//! aborts the whole import. Policies are called synchronously; an
//! interactive front end can block inside a call until the user answers.

use crate::catalog::{suggest_cards, suggest_expansions, CanonicalCatalog, Card, Expansion};
use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

/// Number of suggestions offered per unknown name
pub const SUGGESTION_LIMIT: usize = 5;

/// Answer for a single name
#[derive(Debug, Clone, PartialEq)]
pub enum Choice<T> {
    /// Bind the name to this entity
    Use(T),
    /// Leave the name out (for expansions: treat the printing as unspecified)
    Skip,
    /// Don't resolve; the name is reported as unresolved
    Decline,
}

/// The policy cancelled the import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aborted;

/// Answers for a batch, keyed by the raw name; missing names count as declined
pub type Answers<T> = std::result::Result<BTreeMap<String, Choice<T>>, Aborted>;

/// A name that matched several catalog entities
#[derive(Debug, Clone)]
pub struct AmbiguousName<T> {
    pub raw_name: String,
    pub candidates: Vec<T>,
}

/// A card requested in an expansion it was never printed in
#[derive(Debug, Clone)]
pub struct PrintingConflict {
    pub card: Arc<Card>,
    pub raw_expansion: String,
    /// Expansions the card does exist in
    pub candidates: Vec<Arc<Expansion>>,
}

impl PrintingConflict {
    /// Key used in the answers map, "Card Name [Expansion]"
    pub fn key(&self) -> String {
        format!("{} [{}]", self.card.name, self.raw_expansion)
    }
}

/// Caller-supplied strategy for names the catalog can't settle
///
/// Every method defaults to declining everything, so a policy only overrides
/// the cases it handles.
pub trait ResolutionPolicy {
    /// Names with no catalog match
    fn resolve_unknown_cards(
        &mut self,
        _catalog: &dyn CanonicalCatalog,
        names: &[String],
    ) -> Answers<Arc<Card>> {
        Ok(decline_all(names.iter()))
    }

    /// Names matching more than one card
    fn resolve_ambiguous_cards(
        &mut self,
        _catalog: &dyn CanonicalCatalog,
        names: &[AmbiguousName<Arc<Card>>],
    ) -> Answers<Arc<Card>> {
        Ok(decline_all(names.iter().map(|n| &n.raw_name)))
    }

    /// Expansion names with no catalog match
    fn resolve_unknown_expansions(
        &mut self,
        _catalog: &dyn CanonicalCatalog,
        names: &[String],
    ) -> Answers<Arc<Expansion>> {
        Ok(decline_all(names.iter()))
    }

    /// Expansion names matching more than one expansion
    fn resolve_ambiguous_expansions(
        &mut self,
        _catalog: &dyn CanonicalCatalog,
        names: &[AmbiguousName<Arc<Expansion>>],
    ) -> Answers<Arc<Expansion>> {
        Ok(decline_all(names.iter().map(|n| &n.raw_name)))
    }

    /// Cards asked for in a printing that doesn't exist, keyed by
    /// [`PrintingConflict::key`]
    fn resolve_ambiguous_physical_cards(
        &mut self,
        _catalog: &dyn CanonicalCatalog,
        conflicts: &[PrintingConflict],
    ) -> Answers<Arc<Expansion>> {
        Ok(conflicts.iter().map(|c| (c.key(), Choice::Decline)).collect())
    }
}

fn decline_all<'a, T>(names: impl Iterator<Item = &'a String>) -> BTreeMap<String, Choice<T>> {
    names.map(|n| (n.clone(), Choice::Decline)).collect()
}

fn skip_all<'a, T>(names: impl Iterator<Item = &'a String>) -> BTreeMap<String, Choice<T>> {
    names.map(|n| (n.clone(), Choice::Skip)).collect()
}

macro_rules! forward_policy {
    ($($target:ty),*) => {$(
        impl<P: ResolutionPolicy + ?Sized> ResolutionPolicy for $target {
            fn resolve_unknown_cards(
                &mut self,
                catalog: &dyn CanonicalCatalog,
                names: &[String],
            ) -> Answers<Arc<Card>> {
                (**self).resolve_unknown_cards(catalog, names)
            }

            fn resolve_ambiguous_cards(
                &mut self,
                catalog: &dyn CanonicalCatalog,
                names: &[AmbiguousName<Arc<Card>>],
            ) -> Answers<Arc<Card>> {
                (**self).resolve_ambiguous_cards(catalog, names)
            }

            fn resolve_unknown_expansions(
                &mut self,
                catalog: &dyn CanonicalCatalog,
                names: &[String],
            ) -> Answers<Arc<Expansion>> {
                (**self).resolve_unknown_expansions(catalog, names)
            }

            fn resolve_ambiguous_expansions(
                &mut self,
                catalog: &dyn CanonicalCatalog,
                names: &[AmbiguousName<Arc<Expansion>>],
            ) -> Answers<Arc<Expansion>> {
                (**self).resolve_ambiguous_expansions(catalog, names)
            }

            fn resolve_ambiguous_physical_cards(
                &mut self,
                catalog: &dyn CanonicalCatalog,
                conflicts: &[PrintingConflict],
            ) -> Answers<Arc<Expansion>> {
                (**self).resolve_ambiguous_physical_cards(catalog, conflicts)
            }
        }
    )*};
}

forward_policy!(&mut P, Box<P>);

/// Headless policy: anything not found exactly is unresolved
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictPolicy;

impl ResolutionPolicy for StrictPolicy {}

/// Policy that drops unknown names ("ignore all")
///
/// Ambiguous names are still declined.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipUnknownPolicy;

impl ResolutionPolicy for SkipUnknownPolicy {
    fn resolve_unknown_cards(
        &mut self,
        _catalog: &dyn CanonicalCatalog,
        names: &[String],
    ) -> Answers<Arc<Card>> {
        Ok(skip_all(names.iter()))
    }

    fn resolve_unknown_expansions(
        &mut self,
        _catalog: &dyn CanonicalCatalog,
        names: &[String],
    ) -> Answers<Arc<Expansion>> {
        Ok(skip_all(names.iter()))
    }

    fn resolve_ambiguous_physical_cards(
        &mut self,
        _catalog: &dyn CanonicalCatalog,
        conflicts: &[PrintingConflict],
    ) -> Answers<Arc<Expansion>> {
        Ok(conflicts.iter().map(|c| (c.key(), Choice::Skip)).collect())
    }
}

/// Automatic policy that binds unknown names to a clear best suggestion
///
/// A suggestion is taken only when it's within `max_distance` and strictly
/// better than the runner-up. Ambiguous names are never guessed.
#[derive(Debug, Clone, Copy)]
pub struct BestGuessPolicy {
    pub max_distance: usize,
}

impl Default for BestGuessPolicy {
    fn default() -> Self {
        Self { max_distance: 2 }
    }
}

impl BestGuessPolicy {
    fn pick<T: Clone>(&self, ranked: &[(usize, T)]) -> Choice<T> {
        match ranked {
            [(best, item)] if *best <= self.max_distance => Choice::Use(item.clone()),
            [(best, item), (next, _), ..] if *best <= self.max_distance && best < next => {
                Choice::Use(item.clone())
            }
            _ => Choice::Decline,
        }
    }
}

impl ResolutionPolicy for BestGuessPolicy {
    fn resolve_unknown_cards(
        &mut self,
        catalog: &dyn CanonicalCatalog,
        names: &[String],
    ) -> Answers<Arc<Card>> {
        let mut answers = BTreeMap::new();
        for name in names {
            let choice = self.pick(&suggest_cards(catalog, name, 2));
            if let Choice::Use(card) = &choice {
                log::info!("guessed '{}' for '{}'", card.name, name);
            }
            answers.insert(name.clone(), choice);
        }
        Ok(answers)
    }

    fn resolve_unknown_expansions(
        &mut self,
        catalog: &dyn CanonicalCatalog,
        names: &[String],
    ) -> Answers<Arc<Expansion>> {
        let mut answers = BTreeMap::new();
        for name in names {
            let choice = match self.pick(&suggest_expansions(catalog, name, 2)) {
                Choice::Use(exp) => {
                    log::info!("guessed expansion '{}' for '{}'", exp.name, name);
                    Choice::Use(exp)
                }
                // Unknown printings fall back to unspecified
                _ => Choice::Skip,
            };
            answers.insert(name.clone(), choice);
        }
        Ok(answers)
    }

    fn resolve_ambiguous_physical_cards(
        &mut self,
        _catalog: &dyn CanonicalCatalog,
        conflicts: &[PrintingConflict],
    ) -> Answers<Arc<Expansion>> {
        Ok(conflicts.iter().map(|c| (c.key(), Choice::Skip)).collect())
    }
}

/// A batch forwarded to whoever answers a [`ChannelPolicy`]
#[derive(Debug, Clone)]
pub enum ResolutionRequest {
    UnknownCards {
        names: Vec<String>,
        suggestions: BTreeMap<String, Vec<Arc<Card>>>,
    },
    AmbiguousCards(Vec<AmbiguousName<Arc<Card>>>),
    UnknownExpansions {
        names: Vec<String>,
        suggestions: BTreeMap<String, Vec<Arc<Expansion>>>,
    },
    AmbiguousExpansions(Vec<AmbiguousName<Arc<Expansion>>>),
    AmbiguousPrintings(Vec<PrintingConflict>),
}

/// Reply to a [`ResolutionRequest`]
#[derive(Debug, Clone)]
pub enum ResolutionReply {
    Cards(Answers<Arc<Card>>),
    Expansions(Answers<Arc<Expansion>>),
}

/// Policy that forwards each batch over a channel and blocks on the reply
///
/// Lets a GUI or other thread drive the decisions. A dropped responder or a
/// reply of the wrong kind aborts the import.
pub struct ChannelPolicy {
    requests: Sender<ResolutionRequest>,
    replies: Receiver<ResolutionReply>,
}

/// The answering end of a [`ChannelPolicy`]
pub struct PolicyResponder {
    requests: Receiver<ResolutionRequest>,
    replies: Sender<ResolutionReply>,
}

impl ChannelPolicy {
    /// Create a connected policy/responder pair
    pub fn new() -> (ChannelPolicy, PolicyResponder) {
        let (req_tx, req_rx) = mpsc::channel();
        let (rep_tx, rep_rx) = mpsc::channel();
        (
            ChannelPolicy {
                requests: req_tx,
                replies: rep_rx,
            },
            PolicyResponder {
                requests: req_rx,
                replies: rep_tx,
            },
        )
    }

    fn ask(&self, request: ResolutionRequest) -> Option<ResolutionReply> {
        self.requests.send(request).ok()?;
        self.replies.recv().ok()
    }

    fn ask_cards(&self, request: ResolutionRequest) -> Answers<Arc<Card>> {
        match self.ask(request) {
            Some(ResolutionReply::Cards(answers)) => answers,
            Some(_) => {
                log::warn!("responder answered a card request with expansions");
                Err(Aborted)
            }
            None => Err(Aborted),
        }
    }

    fn ask_expansions(&self, request: ResolutionRequest) -> Answers<Arc<Expansion>> {
        match self.ask(request) {
            Some(ResolutionReply::Expansions(answers)) => answers,
            Some(_) => {
                log::warn!("responder answered an expansion request with cards");
                Err(Aborted)
            }
            None => Err(Aborted),
        }
    }
}

impl PolicyResponder {
    /// Wait for the next request; `None` once the policy is dropped
    pub fn next_request(&self) -> Option<ResolutionRequest> {
        self.requests.recv().ok()
    }

    /// Send the answer for the last request
    pub fn reply(&self, reply: ResolutionReply) -> bool {
        self.replies.send(reply).is_ok()
    }
}

impl ResolutionPolicy for ChannelPolicy {
    fn resolve_unknown_cards(
        &mut self,
        catalog: &dyn CanonicalCatalog,
        names: &[String],
    ) -> Answers<Arc<Card>> {
        let suggestions = names
            .iter()
            .map(|n| {
                let ranked = suggest_cards(catalog, n, SUGGESTION_LIMIT);
                (n.clone(), ranked.into_iter().map(|(_, c)| c).collect())
            })
            .collect();
        self.ask_cards(ResolutionRequest::UnknownCards {
            names: names.to_vec(),
            suggestions,
        })
    }

    fn resolve_ambiguous_cards(
        &mut self,
        _catalog: &dyn CanonicalCatalog,
        names: &[AmbiguousName<Arc<Card>>],
    ) -> Answers<Arc<Card>> {
        self.ask_cards(ResolutionRequest::AmbiguousCards(names.to_vec()))
    }

    fn resolve_unknown_expansions(
        &mut self,
        catalog: &dyn CanonicalCatalog,
        names: &[String],
    ) -> Answers<Arc<Expansion>> {
        let suggestions = names
            .iter()
            .map(|n| {
                let ranked = suggest_expansions(catalog, n, SUGGESTION_LIMIT);
                (n.clone(), ranked.into_iter().map(|(_, e)| e).collect())
            })
            .collect();
        self.ask_expansions(ResolutionRequest::UnknownExpansions {
            names: names.to_vec(),
            suggestions,
        })
    }

    fn resolve_ambiguous_expansions(
        &mut self,
        _catalog: &dyn CanonicalCatalog,
        names: &[AmbiguousName<Arc<Expansion>>],
    ) -> Answers<Arc<Expansion>> {
        self.ask_expansions(ResolutionRequest::AmbiguousExpansions(names.to_vec()))
    }

    fn resolve_ambiguous_physical_cards(
        &mut self,
        _catalog: &dyn CanonicalCatalog,
        conflicts: &[PrintingConflict],
    ) -> Answers<Arc<Expansion>> {
        self.ask_expansions(ResolutionRequest::AmbiguousPrintings(conflicts.to_vec()))
    }
}
