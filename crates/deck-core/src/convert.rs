//! Import, write and convert entry points used by the front ends

use crate::catalog::{CanonicalCatalog, MemoryCatalog};
use crate::config::{ConversionBatch, ImportConfig};
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::guess::guess_and_resolve;
use crate::lookup_cache::{CachedPolicy, LookupCache};
use crate::policy::ResolutionPolicy;
use crate::resolver::ResolvedCardList;
use crate::scanner::scan_inputs;
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Guess, parse and resolve raw file contents
///
/// With a lookup cache configured, the policy is wrapped so remembered
/// decisions are replayed. New decisions are written back only when the
/// import succeeds.
pub fn import_bytes(
    raw: &[u8],
    catalog: &dyn CanonicalCatalog,
    policy: &mut dyn ResolutionPolicy,
    config: &ImportConfig,
) -> Result<(Dialect, ResolvedCardList)> {
    let Some(cache_path) = &config.lookup_cache else {
        return guess_and_resolve(raw, catalog, policy, config);
    };

    let mut cached = CachedPolicy::new(policy, LookupCache::load(cache_path)?);
    let result = guess_and_resolve(raw, catalog, &mut cached, config)?;
    cached.into_cache().save(cache_path)?;
    Ok(result)
}

/// Import a file from disk
pub fn import_file<P: AsRef<Path>>(
    path: P,
    catalog: &dyn CanonicalCatalog,
    policy: &mut dyn ResolutionPolicy,
    config: &ImportConfig,
) -> Result<(Dialect, ResolvedCardList)> {
    let path = path.as_ref();
    let raw = fs::read(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let (dialect, list) = import_bytes(&raw, catalog, policy, config)?;
    info!(
        "Imported {} as {}: {} cards, {} unresolved",
        path.display(),
        dialect,
        list.total_cards(),
        list.unresolved.len()
    );
    for missing in &list.unresolved {
        warn!("{}: '{}' left out ({})", path.display(), missing.raw_name, missing.reason);
    }
    Ok((dialect, list))
}

/// Render a resolved list in the given dialect
pub fn write_list(list: &ResolvedCardList, dialect: Dialect) -> Result<String> {
    let writer = dialect.require_writer()?;
    Ok(writer.write(list, &list.metadata)?)
}

/// Output path for `input` written as `dialect` into `output_dir`
pub fn output_path(input: &Path, output_dir: &Path, dialect: Dialect) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("deck");
    output_dir.join(format!("{}.{}", stem, dialect.output_extension()))
}

/// Import one file and write it out in another dialect
///
/// Returns the path written.
pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output_dir: Q,
    dialect: Dialect,
    catalog: &dyn CanonicalCatalog,
    policy: &mut dyn ResolutionPolicy,
    config: &ImportConfig,
) -> Result<PathBuf> {
    let input = input.as_ref();
    let output_dir = output_dir.as_ref();
    // Fail before importing, which may prompt
    dialect.require_writer()?;

    let (_, list) = import_file(input, catalog, policy, config)?;
    let text = write_list(&list, dialect)?;

    fs::create_dir_all(output_dir)?;
    let output = output_path(input, output_dir, dialect);
    fs::write(&output, text)?;
    Ok(output)
}

/// Result of a batch run
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    /// Files written
    pub files_written: Vec<PathBuf>,
    /// Inputs that failed, with the reason
    pub errors: Vec<(PathBuf, String)>,
    /// Files seen in input directories but not converted
    pub skipped: usize,
}

/// Convert every input of a batch
///
/// A failing file is recorded and the batch moves on. Only an unreadable
/// catalog or input list fails the whole run.
pub fn run_batch(batch: &ConversionBatch, policy: &mut dyn ResolutionPolicy) -> Result<BatchResult> {
    batch.output_dialect.require_writer()?;
    let catalog = MemoryCatalog::load(&batch.catalog)?;
    let scan = scan_inputs(&batch.inputs)?;

    let mut result = BatchResult {
        skipped: scan.skipped(),
        ..BatchResult::default()
    };

    for file in &scan.files {
        let target = output_path(&file.path, &batch.output_dir, batch.output_dialect);
        if result.files_written.contains(&target) {
            let reason = format!("output {} already written by this batch", target.display());
            warn!("{}: {}", file.path.display(), reason);
            result.errors.push((file.path.clone(), reason));
            continue;
        }

        match convert_file(
            &file.path,
            &batch.output_dir,
            batch.output_dialect,
            &catalog,
            policy,
            &batch.import,
        ) {
            Ok(output) => result.files_written.push(output),
            Err(e) => {
                warn!("{}: {}", file.path.display(), e);
                result.errors.push((file.path.clone(), e.to_string()));
            }
        }
    }

    info!(
        "Batch done: {} written, {} failed, {} skipped",
        result.files_written.len(),
        result.errors.len(),
        result.skipped
    );
    Ok(result)
}
