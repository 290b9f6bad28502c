//! JSON configuration documents: import settings and conversion batches

use crate::dialect::{guess_order, Dialect};
use crate::error::{Error, Result};
use crate::policy::{BestGuessPolicy, ResolutionPolicy, SkipUnknownPolicy, StrictPolicy};
use crate::resolver::ResolverConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which resolution policy an import uses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    /// Unknown or ambiguous names fail the import
    #[default]
    Strict,
    /// Take a clear fuzzy match, fail otherwise
    BestGuess,
    /// Drop unknown names
    SkipUnknown,
    /// Ask the user; only front ends with a terminal or GUI can build this
    Prompt,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 4] = [
        PolicyKind::Strict,
        PolicyKind::BestGuess,
        PolicyKind::SkipUnknown,
        PolicyKind::Prompt,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PolicyKind::Strict => "strict",
            PolicyKind::BestGuess => "best-guess",
            PolicyKind::SkipUnknown => "skip-unknown",
            PolicyKind::Prompt => "prompt",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        PolicyKind::ALL
            .into_iter()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| format!("unknown policy '{}'", s))
    }
}

fn default_guess_distance() -> usize {
    2
}

/// Settings for one import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportConfig {
    #[serde(default)]
    pub policy: PolicyKind,
    /// Collect unresolved names instead of failing
    #[serde(default)]
    pub allow_partial: bool,
    /// Largest edit distance the best-guess policy accepts
    #[serde(default = "default_guess_distance")]
    pub max_guess_distance: usize,
    /// Where remembered decisions are kept, if anywhere
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup_cache: Option<PathBuf>,
    /// Replaces the default dialect trial order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guess_order: Option<Vec<Dialect>>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::default(),
            allow_partial: false,
            max_guess_distance: default_guess_distance(),
            lookup_cache: None,
            guess_order: None,
        }
    }
}

impl ImportConfig {
    /// Load import settings from JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save import settings to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            allow_partial: self.allow_partial,
        }
    }

    /// Dialect trial order for guessing
    pub fn guess_order(&self) -> Vec<Dialect> {
        self.guess_order.clone().unwrap_or_else(guess_order)
    }

    /// Build the configured headless policy
    ///
    /// Returns `None` for [`PolicyKind::Prompt`], which the caller has to
    /// supply itself.
    pub fn make_policy(&self) -> Option<Box<dyn ResolutionPolicy>> {
        match self.policy {
            PolicyKind::Strict => Some(Box::new(StrictPolicy)),
            PolicyKind::BestGuess => Some(Box::new(BestGuessPolicy {
                max_distance: self.max_guess_distance,
            })),
            PolicyKind::SkipUnknown => Some(Box::new(SkipUnknownPolicy)),
            PolicyKind::Prompt => None,
        }
    }
}

/// A set of deck files to convert in one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionBatch {
    /// Catalog JSON file
    pub catalog: PathBuf,
    /// Input files and directories
    pub inputs: Vec<PathBuf>,
    /// Output directory
    pub output_dir: PathBuf,
    /// Dialect every input is written as
    pub output_dialect: Dialect,
    #[serde(default)]
    pub import: ImportConfig,
}

impl ConversionBatch {
    /// Load a batch file from JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save the batch file to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_config_defaults() {
        let config: ImportConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ImportConfig::default());
        assert_eq!(config.policy, PolicyKind::Strict);
        assert_eq!(config.max_guess_distance, 2);
        assert_eq!(config.guess_order(), guess_order());
        assert!(!config.resolver_config().allow_partial);
    }

    #[test]
    fn test_policy_names() {
        let config: ImportConfig =
            serde_json::from_str(r#"{"policy": "skip-unknown", "allow_partial": true}"#).unwrap();
        assert_eq!(config.policy, PolicyKind::SkipUnknown);
        assert!(config.resolver_config().allow_partial);

        for kind in PolicyKind::ALL {
            assert_eq!(kind.name().parse::<PolicyKind>(), Ok(kind));
        }
        assert_eq!("BEST_GUESS".parse::<PolicyKind>(), Ok(PolicyKind::BestGuess));
        assert!("lenient".parse::<PolicyKind>().is_err());
    }

    #[test]
    fn test_make_policy() {
        let mut config = ImportConfig::default();
        assert!(config.make_policy().is_some());
        config.policy = PolicyKind::Prompt;
        assert!(config.make_policy().is_none());
    }

    #[test]
    fn test_batch_serialization() {
        let batch = ConversionBatch {
            catalog: PathBuf::from("cards.json"),
            inputs: vec![PathBuf::from("decks")],
            output_dir: PathBuf::from("out"),
            output_dialect: Dialect::ArdbText,
            import: ImportConfig {
                policy: PolicyKind::BestGuess,
                guess_order: Some(vec![Dialect::Jol]),
                ..ImportConfig::default()
            },
        };

        let json = serde_json::to_string_pretty(&batch).unwrap();
        assert!(json.contains("\"ardb-text\""));
        assert!(json.contains("\"best-guess\""));

        let loaded: ConversionBatch = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, batch);
        assert_eq!(loaded.import.guess_order(), vec![Dialect::Jol]);
    }
}
