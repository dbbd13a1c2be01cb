//! Result rendering
//!
//! Human output is a short colored summary plus a table of the first
//! failures. With `--json` the result struct is printed as-is.

use crate::error::Result;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use orgpush_core::{DeploymentResult, IngestResult, ItemFailure, RunFailure};
use serde::Serialize;

/// Failures listed in the human summary; the rest are counted
pub const MAX_FAILURES_SHOWN: usize = 10;

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_deploy_result(result: &DeploymentResult, json: bool) -> Result<()> {
    if json {
        return print_json(result);
    }
    println!("{}", render_deploy_summary(result));
    Ok(())
}

pub fn print_ingest_result(result: &IngestResult, json: bool) -> Result<()> {
    if json {
        return print_json(result);
    }
    println!("{}", render_ingest_summary(result));
    Ok(())
}

pub fn render_deploy_summary(result: &DeploymentResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", "=== Deployment Summary ===".cyan().bold()));
    out.push_str(&format!(
        "Job:        {}\n",
        result.job_id.as_deref().unwrap_or("-")
    ));
    out.push_str(&format!("Status:     {}\n", result.status));
    out.push_str(&format!("Deployed:   {}\n", result.components_deployed));
    out.push_str(&format!("Errors:     {}\n", result.component_errors));
    out.push_str(&format!("Result:     {}\n", verdict(result.success)));
    push_run_failure(&mut out, result.error.as_ref());
    push_failures(&mut out, &result.failures);
    out
}

pub fn render_ingest_summary(result: &IngestResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", "=== Ingest Summary ===".cyan().bold()));
    out.push_str(&format!(
        "Job:        {}\n",
        result.job_id.as_deref().unwrap_or("-")
    ));
    out.push_str(&format!("Object:     {}\n", result.object));
    out.push_str(&format!("State:      {}\n", result.state));
    out.push_str(&format!("Total:      {}\n", result.total_records));
    out.push_str(&format!("Successful: {}\n", result.successful));
    out.push_str(&format!("Failed:     {}\n", result.failed));
    out.push_str(&format!("Result:     {}\n", verdict(result.success)));
    push_run_failure(&mut out, result.error.as_ref());
    push_failures(&mut out, &result.failures);
    out
}

fn verdict(success: bool) -> String {
    if success {
        "succeeded".green().bold().to_string()
    } else {
        "failed".red().bold().to_string()
    }
}

fn push_run_failure(out: &mut String, failure: Option<&RunFailure>) {
    if let Some(failure) = failure {
        out.push_str(&format!(
            "{} {} ({:?}): {}\n",
            "Stopped at".yellow(),
            failure.step,
            failure.kind,
            failure.message
        ));
    }
}

fn push_failures(out: &mut String, failures: &[ItemFailure]) {
    if failures.is_empty() {
        return;
    }

    out.push('\n');
    out.push_str(&failure_table(failures).to_string());
    out.push('\n');
    if failures.len() > MAX_FAILURES_SHOWN {
        out.push_str(&format!(
            "... and {} more\n",
            failures.len() - MAX_FAILURES_SHOWN
        ));
    }
}

fn failure_table(failures: &[ItemFailure]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["Item", "Problem", "Type", "File"]);

    for failure in failures.iter().take(MAX_FAILURES_SHOWN) {
        table.add_row(vec![
            failure.identifier.as_str(),
            failure.problem.as_str(),
            failure.problem_type.as_deref().unwrap_or(""),
            failure.file_name.as_deref().unwrap_or(""),
        ]);
    }

    table
}
