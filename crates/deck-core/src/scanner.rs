//! Input discovery for batch conversion

use crate::dialect::Dialect;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A deck or inventory file found by a scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckFile {
    /// Full path to the file
    pub path: PathBuf,
    /// Dialects that use this file's extension, in guess order
    pub hints: Vec<Dialect>,
}

/// Result of scanning inputs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// Files and directories that were scanned
    pub roots: Vec<PathBuf>,
    /// Files to convert, sorted by path
    pub files: Vec<DeckFile>,
    /// Total number of files seen, including skipped ones
    pub total_files: usize,
}

impl ScanResult {
    /// Paths of every file to convert
    pub fn paths(&self) -> Vec<&Path> {
        self.files.iter().map(|f| f.path.as_path()).collect()
    }

    /// Number of files seen but not picked up
    pub fn skipped(&self) -> usize {
        self.total_files - self.files.len()
    }
}

/// Dialects that use the extension of `path`
pub fn extension_hints(path: &Path) -> Vec<Dialect> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(Dialect::for_extension)
        .unwrap_or_default()
}

/// Collect the files under the given inputs
///
/// Files named directly are always taken. Inside directories only files
/// whose extension belongs to some dialect are.
pub fn scan_inputs<P: AsRef<Path>>(inputs: &[P]) -> Result<ScanResult> {
    let mut found: BTreeMap<PathBuf, Vec<Dialect>> = BTreeMap::new();
    let mut total_files = 0;

    for input in inputs {
        let input = input.as_ref();
        let meta = fs::metadata(input).map_err(|e| Error::FileRead {
            path: input.to_path_buf(),
            source: e,
        })?;

        if meta.is_file() {
            total_files += 1;
            found.insert(input.to_path_buf(), extension_hints(input));
            continue;
        }

        for entry in WalkDir::new(input)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            total_files += 1;

            let hints = extension_hints(entry.path());
            if hints.is_empty() {
                log::debug!("Skipping {}: unknown extension", entry.path().display());
                continue;
            }
            found.insert(entry.path().to_path_buf(), hints);
        }
    }

    Ok(ScanResult {
        roots: inputs.iter().map(|r| r.as_ref().to_path_buf()).collect(),
        files: found
            .into_iter()
            .map(|(path, hints)| DeckFile { path, hints })
            .collect(),
        total_files,
    })
}
