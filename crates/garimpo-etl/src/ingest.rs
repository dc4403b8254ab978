//! Ingest stage (raw → bronze)
//!
//! Runs a ledger discovery pass over the raw directory, then extracts each
//! ZIP archive into its own bronze subdirectory. Safe to re-run: discovery
//! is first-seen-wins and extraction just overwrites bronze contents.

use crate::archive;
use crate::config::{EtlConfig, Source};
use crate::error::Result;
use crate::ledger::IngestLedger;
use std::path::PathBuf;
use tracing::info;

pub async fn run(config: &EtlConfig, source: Source) -> Result<()> {
    let raw_dir = config.raw_dir(source);
    let bronze_dir = config.bronze_dir(source);
    std::fs::create_dir_all(&bronze_dir)?;

    let ledger = IngestLedger::connect(&config.warehouse_path).await?;
    let inserted = ledger.discover(source, &[raw_dir.clone()]).await?;

    let mut extracted = 0usize;
    for zip_path in zip_files(&raw_dir)? {
        let stem = zip_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "archive".to_string());
        archive::extract_zip(&zip_path, &bronze_dir.join(stem))?;
        extracted += 1;
    }

    info!(
        source = %source,
        newly_logged = inserted,
        archives = extracted,
        bronze = %bronze_dir.display(),
        "Ingest complete"
    );
    Ok(())
}

/// Top-level `*.zip` files in a directory, sorted for deterministic order.
fn zip_files(dir: &PathBuf) -> Result<Vec<PathBuf>> {
    let mut zips = Vec::new();
    if !dir.exists() {
        return Ok(zips);
    }
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_zip = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("zip"))
            .unwrap_or(false);
        if path.is_file() && is_zip {
            zips.push(path);
        }
    }
    zips.sort();
    Ok(zips)
}
