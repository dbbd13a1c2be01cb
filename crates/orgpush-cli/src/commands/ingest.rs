//! `orgpush ingest` command implementation
//!
//! Reads records from a CSV file (header row required) or a JSON array of
//! objects, inserts them through a bulk ingest job and waits for the outcome.

use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::print_ingest_result;
use crate::progress::maybe_spinner;
use orgpush_core::{IngestJobManager, IngestRecord, IngestState};
use serde_json::Value;
use std::path::Path;
use tracing::info;

pub async fn run(config: &Config, file: &Path, object: &str, json: bool) -> Result<()> {
    let records = read_records(file)?;
    let client = config.client()?;

    info!(object, records = records.len(), file = %file.display(), "Ingesting records");

    let spinner = maybe_spinner(&format!("Inserting {} records into {}", records.len(), object), json);
    let result = IngestJobManager::new(&client, config.poll)
        .run_ingest(&records, object)
        .await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let result = result?;
    print_ingest_result(&result, json)?;

    match result.state {
        IngestState::NoRecords => Err(CliError::job_failed(format!(
            "No records found in {}",
            file.display()
        ))),
        _ if !result.success => Err(CliError::job_failed(format!(
            "{} of {} records failed",
            result.failed, result.total_records
        ))),
        _ => Ok(()),
    }
}

/// Load records from `.json` (array of objects) or CSV (anything else)
pub fn read_records(path: &Path) -> Result<Vec<IngestRecord>> {
    if !path.exists() {
        return Err(CliError::FileNotFound(path.display().to_string()));
    }

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        read_json_records(path)
    } else {
        read_csv_records(path)
    }
}

fn read_csv_records(path: &Path) -> Result<Vec<IngestRecord>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let record: IngestRecord = headers
            .iter()
            .zip(row.iter())
            .map(|(name, value)| (name.trim(), value))
            .collect();
        if !record.is_empty() {
            records.push(record);
        }
    }
    Ok(records)
}

fn read_json_records(path: &Path) -> Result<Vec<IngestRecord>> {
    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)?;
    let Value::Array(items) = value else {
        return Err(CliError::invalid_input(
            path.display().to_string(),
            "expected a JSON array of objects",
        ));
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(object) => Ok(IngestRecord::from_json(object)),
            _ => Err(CliError::invalid_input(
                path.display().to_string(),
                format!("element {} is not an object", i),
            )),
        })
        .collect()
}
