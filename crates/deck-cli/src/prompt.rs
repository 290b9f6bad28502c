//! Interactive resolution on the terminal
//!
//! Each batch of unresolved names is shown at once. For every name the user
//! picks a numbered suggestion, skips it, skips everything left in the batch,
//! or aborts the import.

use deck_core::catalog::{suggest_cards, suggest_expansions};
use deck_core::policy::{Aborted, AmbiguousName, Answers, PrintingConflict, SUGGESTION_LIMIT};
use deck_core::{CanonicalCatalog, Card, Choice, Expansion, ResolutionPolicy};
use std::collections::BTreeMap;
use std::io::{self, BufRead, StdinLock, Stdout, Write};
use std::sync::Arc;

/// One question: a raw name and what it could be
struct Question<T> {
    name: String,
    candidates: Vec<T>,
}

enum Reply {
    Pick(usize),
    Skip,
    SkipRest,
    Leave,
    Abort,
}

fn parse_reply(line: &str, choices: usize) -> Option<Reply> {
    match line.trim() {
        "" => Some(Reply::Leave),
        "s" => Some(Reply::Skip),
        "S" => Some(Reply::SkipRest),
        "a" | "A" => Some(Reply::Abort),
        other => match other.parse::<usize>() {
            Ok(n) if (1..=choices).contains(&n) => Some(Reply::Pick(n - 1)),
            _ => None,
        },
    }
}

/// Policy that asks on a terminal
pub struct PromptPolicy<R, W> {
    input: R,
    output: W,
}

impl PromptPolicy<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> PromptPolicy<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn read_line(&mut self) -> Option<String> {
        let _ = self.output.flush();
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line),
        }
    }

    fn ask<T: Clone>(
        &mut self,
        heading: &str,
        questions: Vec<Question<T>>,
        label: impl Fn(&T) -> String,
    ) -> Answers<T> {
        let mut answers = BTreeMap::new();
        let _ = writeln!(self.output, "\n{} ({}):", heading, questions.len());

        let mut skip_rest = false;
        for question in questions {
            if skip_rest {
                answers.insert(question.name, Choice::Skip);
                continue;
            }

            let _ = writeln!(self.output, "\n  '{}'", question.name);
            for (i, candidate) in question.candidates.iter().enumerate() {
                let _ = writeln!(self.output, "    {}) {}", i + 1, label(candidate));
            }

            let choice = loop {
                let _ = write!(
                    self.output,
                    "  Choice [number, s=skip, S=skip all, a=abort, Enter=leave unresolved]: "
                );
                // end of input leaves nobody to answer
                let line = self.read_line().ok_or(Aborted)?;
                match parse_reply(&line, question.candidates.len()) {
                    Some(Reply::Pick(i)) => break Choice::Use(question.candidates[i].clone()),
                    Some(Reply::Skip) => break Choice::Skip,
                    Some(Reply::SkipRest) => {
                        skip_rest = true;
                        break Choice::Skip;
                    }
                    Some(Reply::Leave) => break Choice::Decline,
                    Some(Reply::Abort) => return Err(Aborted),
                    None => {
                        let _ = writeln!(self.output, "  Invalid choice");
                    }
                }
            };
            answers.insert(question.name, choice);
        }

        Ok(answers)
    }
}

fn card_label(card: &Arc<Card>) -> String {
    match card.card_types.first() {
        Some(kind) => format!("{} [{}]", card.name, kind),
        None => card.name.clone(),
    }
}

fn expansion_label(exp: &Arc<Expansion>) -> String {
    match &exp.short_name {
        Some(short) => format!("{} ({})", exp.name, short),
        None => exp.name.clone(),
    }
}

fn ambiguous<T>(names: &[AmbiguousName<T>]) -> Vec<Question<T>>
where
    T: Clone,
{
    names
        .iter()
        .map(|n| Question {
            name: n.raw_name.clone(),
            candidates: n.candidates.clone(),
        })
        .collect()
}

impl<R: BufRead, W: Write> ResolutionPolicy for PromptPolicy<R, W> {
    fn resolve_unknown_cards(
        &mut self,
        catalog: &dyn CanonicalCatalog,
        names: &[String],
    ) -> Answers<Arc<Card>> {
        let questions = names
            .iter()
            .map(|n| Question {
                name: n.clone(),
                candidates: suggest_cards(catalog, n, SUGGESTION_LIMIT)
                    .into_iter()
                    .map(|(_, c)| c)
                    .collect(),
            })
            .collect();
        self.ask("Unknown cards", questions, card_label)
    }

    fn resolve_ambiguous_cards(
        &mut self,
        _catalog: &dyn CanonicalCatalog,
        names: &[AmbiguousName<Arc<Card>>],
    ) -> Answers<Arc<Card>> {
        self.ask("Ambiguous cards", ambiguous(names), card_label)
    }

    fn resolve_unknown_expansions(
        &mut self,
        catalog: &dyn CanonicalCatalog,
        names: &[String],
    ) -> Answers<Arc<Expansion>> {
        let questions = names
            .iter()
            .map(|n| Question {
                name: n.clone(),
                candidates: suggest_expansions(catalog, n, SUGGESTION_LIMIT)
                    .into_iter()
                    .map(|(_, e)| e)
                    .collect(),
            })
            .collect();
        self.ask("Unknown expansions", questions, expansion_label)
    }

    fn resolve_ambiguous_expansions(
        &mut self,
        _catalog: &dyn CanonicalCatalog,
        names: &[AmbiguousName<Arc<Expansion>>],
    ) -> Answers<Arc<Expansion>> {
        self.ask("Ambiguous expansions", ambiguous(names), expansion_label)
    }

    fn resolve_ambiguous_physical_cards(
        &mut self,
        _catalog: &dyn CanonicalCatalog,
        conflicts: &[PrintingConflict],
    ) -> Answers<Arc<Expansion>> {
        let questions = conflicts
            .iter()
            .map(|c| Question {
                name: c.key(),
                candidates: c.candidates.clone(),
            })
            .collect();
        self.ask(
            "Cards not printed in the given expansion (s = any printing)",
            questions,
            expansion_label,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::MemoryCatalog;

    fn catalog() -> MemoryCatalog {
        let mut catalog = MemoryCatalog::new();
        catalog.add_card(Card::new("Abbot", &["Action"]));
        catalog.add_card(Card::new("Abebe", &["Vampire"]));
        catalog.add_expansion(Expansion::new("Lords of the Night", Some("LotN")));
        catalog
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_reply() {
        assert!(matches!(parse_reply("2\n", 3), Some(Reply::Pick(1))));
        assert!(matches!(parse_reply("4", 3), None));
        assert!(matches!(parse_reply("0", 3), None));
        assert!(matches!(parse_reply("s", 0), Some(Reply::Skip)));
        assert!(matches!(parse_reply("S", 0), Some(Reply::SkipRest)));
        assert!(matches!(parse_reply("", 0), Some(Reply::Leave)));
        assert!(matches!(parse_reply("a", 0), Some(Reply::Abort)));
    }

    #[test]
    fn test_pick_and_skip() {
        let catalog = catalog();
        let mut out = Vec::new();
        let mut policy = PromptPolicy::new(&b"1\ns\n"[..], &mut out);

        let answers = policy
            .resolve_unknown_cards(&catalog, &names(&["Abbat", "Zzz"]))
            .unwrap();
        match &answers["Abbat"] {
            Choice::Use(card) => assert_eq!(card.name, "Abbot"),
            other => panic!("expected a pick, got {other:?}"),
        }
        assert_eq!(answers["Zzz"], Choice::Skip);

        let shown = String::from_utf8(out).unwrap();
        assert!(shown.contains("Unknown cards (2)"));
        assert!(shown.contains("1) Abbot [Action]"));
    }

    #[test]
    fn test_invalid_then_valid() {
        let catalog = catalog();
        let mut out = Vec::new();
        let mut policy = PromptPolicy::new(&b"x\n\n"[..], &mut out);

        let answers = policy
            .resolve_unknown_cards(&catalog, &names(&["Abbat"]))
            .unwrap();
        assert_eq!(answers["Abbat"], Choice::Decline);
        assert!(String::from_utf8(out).unwrap().contains("Invalid choice"));
    }

    #[test]
    fn test_skip_rest() {
        let catalog = catalog();
        let mut policy = PromptPolicy::new(&b"S\n"[..], Vec::new());

        let answers = policy
            .resolve_unknown_expansions(&catalog, &names(&["LotM", "Jyhad", "Sabbat"]))
            .unwrap();
        assert_eq!(answers.len(), 3);
        assert!(answers.values().all(|c| *c == Choice::Skip));
    }

    #[test]
    fn test_abort_and_eof() {
        let catalog = catalog();
        let mut policy = PromptPolicy::new(&b"a\n"[..], Vec::new());
        assert_eq!(
            policy.resolve_unknown_cards(&catalog, &names(&["Abbat"])),
            Err(Aborted)
        );

        let mut policy = PromptPolicy::new(&b""[..], Vec::new());
        assert!(policy
            .resolve_unknown_cards(&catalog, &names(&["Abbat"]))
            .is_err());
    }
}
