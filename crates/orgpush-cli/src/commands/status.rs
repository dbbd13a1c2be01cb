//! `orgpush status` command implementation
//!
//! One status fetch for a deploy or ingest job. No waiting.

use crate::config::Config;
use crate::error::Result;
use crate::output::print_json;
use colored::Colorize;
use orgpush_core::{DeploySubmitter, IngestJobManager, JobStatus, Progress};

pub async fn deploy(config: &Config, job_id: &str, json: bool) -> Result<()> {
    let client = config.client()?;
    let status = DeploySubmitter::new(&client).deploy_status(job_id).await?;

    if json {
        return print_json(&status);
    }

    println!("{} {}", "Deploy job".cyan().bold(), job_id);
    println!("  Status:    {}", status.status);
    println!("  Progress:  {}", describe(status.progress()));
    println!("  Deployed:  {}", status.number_components_deployed);
    println!("  Errors:    {}", status.number_component_errors);
    if let Some(message) = &status.error_message {
        println!("  Message:   {}", message);
    }
    Ok(())
}

pub async fn ingest(config: &Config, job_id: &str, json: bool) -> Result<()> {
    let client = config.client()?;
    let info = IngestJobManager::new(&client, config.poll)
        .job_status(job_id)
        .await?;

    if json {
        return print_json(&info);
    }

    println!("{} {}", "Ingest job".cyan().bold(), job_id);
    println!("  State:     {}", info.state);
    println!("  Progress:  {}", describe(info.progress()));
    if let Some(object) = &info.object {
        println!("  Object:    {}", object);
    }
    if let Some(processed) = info.number_records_processed {
        println!("  Processed: {}", processed);
    }
    if let Some(failed) = info.number_records_failed {
        println!("  Failed:    {}", failed);
    }
    if let Some(message) = &info.error_message {
        println!("  Message:   {}", message);
    }
    Ok(())
}

fn describe(progress: Progress) -> String {
    match progress {
        Progress::Pending => "running".yellow().to_string(),
        Progress::Succeeded => "finished".green().to_string(),
        Progress::Failed => "failed".red().to_string(),
    }
}
