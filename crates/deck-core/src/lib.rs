//! deck-core: Core library for reading, resolving and writing card lists
//!
//! This library provides functionality to:
//! - Parse deck and inventory files in a range of third-party dialects
//! - Detect the dialect of an unknown file
//! - Resolve the names in a file against a catalog of known cards, with a
//!   pluggable policy for names the catalog doesn't know
//! - Write resolved lists back out in any writable dialect
//! - Convert whole directories of files in one batch

pub mod catalog;
pub mod config;
pub mod convert;
pub mod dialect;
pub mod error;
pub mod formats;
pub mod guess;
pub mod holder;
pub mod lookup_cache;
pub mod normalize;
pub mod policy;
pub mod resolver;
pub mod scanner;

#[cfg(test)]
mod testdata;

pub use catalog::{CanonicalCatalog, Card, CatalogFile, Expansion, Lookup, MemoryCatalog};
pub use config::{ConversionBatch, ImportConfig, PolicyKind};
pub use convert::{convert_file, import_bytes, import_file, run_batch, write_list, BatchResult};
pub use dialect::{guess_order, Dialect, FormatDescriptor, FormatParser, FormatWriter};
pub use error::{Error, Report, ResolveError, Result, WriterError};
pub use guess::{decode_input, guess_and_parse, guess_and_resolve, FormatGuesser, GuessState};
pub use holder::{CardListHolder, ListMetadata, MalformedLine};
pub use lookup_cache::{CachedPolicy, LookupCache};
pub use normalize::{canonical_key, fuzzy_key};
pub use policy::{
    BestGuessPolicy, ChannelPolicy, Choice, PolicyResponder, ResolutionPolicy, ResolutionReply,
    ResolutionRequest, SkipUnknownPolicy, StrictPolicy,
};
pub use resolver::{EntityResolver, ResolvedCardList, ResolvedEntry, ResolverConfig, Unresolved};
pub use scanner::{scan_inputs, DeckFile, ScanResult};
