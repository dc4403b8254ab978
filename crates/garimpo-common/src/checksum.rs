//! Content digests for raw-file tracking
//!
//! The ingest ledger keys change detection on a SHA-256 digest of each raw
//! file. Files can be multi-gigabyte Receita archives, so digests are folded
//! in fixed-size blocks rather than reading whole files into memory.

use crate::error::Result;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

/// Block size used when streaming file contents into the hash state (1 MiB).
pub const BLOCK_SIZE: usize = 1 << 20;

/// Compute the SHA-256 digest of a file as a lowercase hex string.
///
/// Reads the file in [`BLOCK_SIZE`] chunks; I/O errors propagate to the
/// caller untouched.
pub fn sha256_file(path: impl AsRef<Path>) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    sha256_reader(&mut file)
}

/// Compute the SHA-256 digest of any readable source.
pub fn sha256_reader<R: Read>(reader: &mut R) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; BLOCK_SIZE];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}
