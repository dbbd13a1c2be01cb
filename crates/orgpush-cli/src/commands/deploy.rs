//! `orgpush deploy` command implementation
//!
//! Packages one metadata document, deploys it and waits for the outcome.

use crate::commands::read_document;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::print_deploy_result;
use crate::progress::maybe_spinner;
use orgpush_core::MetadataDeployer;
use std::path::Path;
use tracing::info;

pub async fn run(config: &Config, file: &Path, json: bool) -> Result<()> {
    let document = read_document(file)?;
    let table = config.manifest_table()?;
    let client = config.client()?;

    info!(
        type_name = document.type_name(),
        full_name = document.full_name(),
        "Deploying metadata document"
    );

    let spinner = maybe_spinner(
        &format!("Deploying {} '{}'", document.type_name(), document.full_name()),
        json,
    );
    let result = MetadataDeployer::new(&client, &table, config.poll)
        .deploy(&document)
        .await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let result = result?;
    print_deploy_result(&result, json)?;

    if result.success {
        Ok(())
    } else {
        Err(CliError::job_failed(format!(
            "Deployment of '{}' did not succeed",
            document.full_name()
        )))
    }
}
