//! Command implementations for the orgpush CLI

pub mod deploy;
pub mod ingest;
pub mod package;
pub mod status;
pub mod types;

use crate::config::Config;
use crate::error::{CliError, Result};
use crate::{Cli, Commands, StatusCommand};
use orgpush_core::MetadataDocument;
use std::path::Path;

/// Execute one parsed command
pub async fn execute(cli: &Cli, command: &Commands) -> Result<()> {
    let config = Config::from_args(&cli.org)?;

    match command {
        Commands::Deploy { file } => deploy::run(&config, file, cli.json).await,
        Commands::Package { file, output } => package::run(&config, file, output, cli.json),
        Commands::Ingest { file, object } => ingest::run(&config, file, object, cli.json).await,
        Commands::Status { command } => match command {
            StatusCommand::Deploy { job_id } => status::deploy(&config, job_id, cli.json).await,
            StatusCommand::Ingest { job_id } => status::ingest(&config, job_id, cli.json).await,
        },
        Commands::Types => types::run(&config, cli.json),
    }
}

/// Read and parse a metadata document from disk
pub(crate) fn read_document(path: &Path) -> Result<MetadataDocument> {
    if !path.exists() {
        return Err(CliError::FileNotFound(path.display().to_string()));
    }
    let body = std::fs::read_to_string(path)?;
    Ok(MetadataDocument::parse(body)?)
}
