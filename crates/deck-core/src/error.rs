//! Error types for deck-core

use crate::resolver::Unresolved;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in deck-core
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Every candidate dialect rejected the input
    #[error("format not recognized (tried: {})", tried.join(", "))]
    FormatNotRecognized { tried: Vec<String> },

    /// A dialect name that doesn't match any known dialect
    #[error("unknown dialect: {0}")]
    UnknownDialect(String),

    /// The dialect can be read but not written
    #[error("dialect '{0}' has no writer")]
    NoWriter(String),

    /// The catalog file is unusable
    #[error("invalid catalog '{path}': {message}")]
    Catalog { path: PathBuf, message: String },

    /// Name resolution failed
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// A writer rejected the card list
    #[error(transparent)]
    Writer(#[from] WriterError),

    /// CSV error from the csv crate
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why an import could not be turned into a resolved card list
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The policy cancelled the import
    #[error("resolution aborted")]
    Aborted,

    /// Names the policy declined to resolve
    #[error("unresolved entities: {0}")]
    UnresolvedEntity(Report),

    /// Names that map to more than one catalog entity and were not settled
    #[error("ambiguous entities: {0}")]
    AmbiguousEntity(Report),
}

impl ResolveError {
    /// The batched report, if there is one
    pub fn report(&self) -> Option<&Report> {
        match self {
            ResolveError::Aborted => None,
            ResolveError::UnresolvedEntity(r) | ResolveError::AmbiguousEntity(r) => Some(r),
        }
    }
}

/// A batch of unresolved names with their reasons
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report(pub Vec<Unresolved>);

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|u| format!("'{}' ({})", u.raw_name, u.reason))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Errors raised while serializing a resolved card list
#[derive(Debug, Error)]
pub enum WriterError {
    /// The dialect needs an attribute the card doesn't have
    #[error("{dialect} cannot represent '{card}': missing {attribute}")]
    MissingAttribute {
        dialect: &'static str,
        card: String,
        attribute: &'static str,
    },

    /// XML serialization error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Text formatting error
    #[error("formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// Output wasn't valid UTF-8
    #[error("invalid UTF-8 in output: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
