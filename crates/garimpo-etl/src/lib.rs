//! Garimpo ETL Library
//!
//! Local ETL pipeline for Brazilian public datasets (Receita Federal CNPJ
//! registry, CVM financial disclosures). Data moves through four layers:
//!
//! - **raw**: downloaded ZIP archives, exactly as served
//! - **bronze**: extracted archive contents
//! - **silver**: normalized, deduplicated parquet snapshots
//! - **warehouse**: queryable SQLite tables rebuilt from silver
//!
//! Every stage is idempotent: downloads reconcile against remote sizes,
//! ingest discovery is first-seen-wins, normalization rebuilds snapshots
//! wholesale, and warehouse loads replace table contents in one transaction.
//!
//! # Example
//!
//! ```no_run
//! use garimpo_etl::{config::{EtlConfig, Source}, ingest};
//!
//! #[tokio::main]
//! async fn main() -> garimpo_etl::Result<()> {
//!     let config = EtlConfig::from_env();
//!     ingest::run(&config, Source::Cnpj).await?;
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod config;
pub mod download;
pub mod error;
pub mod ingest;
pub mod ledger;
pub mod mapping;
pub mod normalize;
pub mod remote;
pub mod silver;
pub mod warehouse;

// Re-export commonly used types
pub use config::{EtlConfig, Source};
pub use error::{EtlError, Result};
