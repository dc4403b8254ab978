//! ZIP archive extraction (raw → bronze)

use crate::error::Result;
use std::path::Path;
use tracing::info;

/// Extract a ZIP archive into `dest`, creating it if needed.
///
/// Returns the number of entries extracted.
pub fn extract_zip(src: &Path, dest: &Path) -> Result<usize> {
    std::fs::create_dir_all(dest)?;
    info!(src = %src.display(), dest = %dest.display(), "Extracting archive");

    let file = std::fs::File::open(src)?;
    let mut archive = zip::ZipArchive::new(file)?;
    let entries = archive.len();
    archive.extract(dest)?;

    info!(src = %src.display(), entries, "Extraction complete");
    Ok(entries)
}
