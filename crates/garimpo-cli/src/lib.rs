//! Garimpo CLI
//!
//! Command-line surface for the local ETL pipeline:
//!
//! - `garimpo download cnpj|cvm` — raw ZIP archives, size-reconciled
//! - `garimpo ingest cnpj|cvm` — ledger discovery plus bronze extraction
//! - `garimpo normalize cnpj|cvm` — silver snapshot rebuild
//! - `garimpo load` — warehouse replace-load from silver

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Garimpo — Brazilian public-data ETL
#[derive(Parser, Debug)]
#[command(name = "garimpo")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download raw datasets
    Download {
        #[command(subcommand)]
        command: DownloadCommand,
    },

    /// Ingest raw files into bronze (ledger discovery + extraction)
    Ingest {
        #[command(subcommand)]
        command: IngestCommand,
    },

    /// Normalize bronze into silver snapshots
    Normalize {
        #[command(subcommand)]
        command: NormalizeCommand,
    },

    /// Load silver snapshots into the warehouse
    Load {
        /// Warehouse SQLite path (defaults to data/warehouse.sqlite)
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
}

/// Download subcommands
#[derive(Subcommand, Debug)]
pub enum DownloadCommand {
    /// Receita Federal CNPJ archives
    Cnpj {
        /// Target YYYY-MM directory; defaults to the most recent available
        #[arg(short, long)]
        month: Option<String>,

        /// Shell-glob pattern(s) to filter remote filenames (repeatable)
        #[arg(short, long = "pattern")]
        pattern: Vec<String>,

        /// Maximum number of files to download after filtering
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Re-download files even if they already exist locally
        #[arg(long)]
        overwrite: bool,
    },

    /// CVM open-data archives
    Cvm {
        /// Which CVM document set to pull (itr, dfp, ...)
        #[arg(short, long, default_value = "itr")]
        doc: String,

        /// Shell-glob pattern(s) to filter remote filenames (repeatable)
        #[arg(short, long = "pattern")]
        pattern: Vec<String>,

        /// Maximum number of files to download after filtering
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Re-download files even if they already exist locally
        #[arg(long)]
        overwrite: bool,
    },
}

/// Ingest subcommands
#[derive(Subcommand, Debug)]
pub enum IngestCommand {
    /// Discover and extract raw CNPJ archives
    Cnpj,
    /// Discover and extract raw CVM archives
    Cvm,
}

/// Normalize subcommands
#[derive(Subcommand, Debug)]
pub enum NormalizeCommand {
    /// Rebuild the CNPJ firmographics snapshot
    Cnpj,
    /// Rebuild the CVM facts snapshot
    Cvm,
}
