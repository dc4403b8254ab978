//! Garimpo CLI - main entry point

use clap::Parser;
use garimpo_cli::{Cli, Commands, DownloadCommand, IngestCommand, NormalizeCommand};
use garimpo_common::logging::{init_logging, LogLevel};
use garimpo_etl::warehouse::Warehouse;
use garimpo_etl::{download, ingest, normalize, EtlConfig, Source};
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    // CLI should keep working even if a subscriber is already installed.
    let _ = init_logging(level);

    if let Err(e) = execute_command(&cli).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn execute_command(cli: &Cli) -> garimpo_etl::Result<()> {
    let config = EtlConfig::from_env();

    match &cli.command {
        Commands::Download { command } => match command {
            DownloadCommand::Cnpj {
                month,
                pattern,
                limit,
                overwrite,
            } => {
                download::download_cnpj(&config, month.as_deref(), pattern, *limit, *overwrite)
                    .await?;
            }
            DownloadCommand::Cvm {
                doc,
                pattern,
                limit,
                overwrite,
            } => {
                download::download_cvm(&config, doc, pattern, *limit, *overwrite).await?;
            }
        },

        Commands::Ingest { command } => match command {
            IngestCommand::Cnpj => ingest::run(&config, Source::Cnpj).await?,
            IngestCommand::Cvm => ingest::run(&config, Source::Cvm).await?,
        },

        Commands::Normalize { command } => match command {
            NormalizeCommand::Cnpj => {
                normalize::cnpj::run(&config)?;
            }
            NormalizeCommand::Cvm => {
                normalize::cvm::run(&config)?;
            }
        },

        Commands::Load { db_path } => {
            let mut config = config;
            if let Some(path) = db_path {
                config.warehouse_path = path.clone();
            }
            let warehouse = Warehouse::connect(&config.warehouse_path).await?;
            warehouse.load(&config).await?;
        }
    }

    Ok(())
}
