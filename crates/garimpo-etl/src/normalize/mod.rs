//! Normalization stage (bronze → silver)
//!
//! Full-rebuild semantics: every run reprocesses all bronze files present at
//! call time and overwrites the source's snapshot wholesale. There is no
//! incremental merge, which is what makes re-running always safe.

pub mod cnpj;
pub mod cvm;

use crate::error::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Recursively collect files with the given extension, sorted by path so
/// concatenation (and keep-first dedup) order is deterministic.
pub(crate) fn files_with_extension(root: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !root.exists() {
        return Ok(files);
    }
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .map(|e| e.eq_ignore_ascii_case(ext))
            .unwrap_or(false);
        if matches {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}
