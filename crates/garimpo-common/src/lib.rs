//! Garimpo Common Library
//!
//! Shared utilities for the garimpo ETL workspace.
//!
//! # Overview
//!
//! This crate provides functionality used across all garimpo workspace members:
//!
//! - **Error Handling**: base error and result types
//! - **Checksums**: streamed SHA-256 digests for raw-file tracking
//! - **Logging**: tracing subscriber setup shared by every binary
//!
//! # Example
//!
//! ```no_run
//! use garimpo_common::{checksum, Result};
//!
//! fn fingerprint(path: &str) -> Result<()> {
//!     let digest = checksum::sha256_file(path)?;
//!     println!("sha256 = {}", digest);
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod checksum;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{GarimpoError, Result};
