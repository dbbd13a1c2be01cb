//! `orgpush package` command implementation
//!
//! Builds the deploy archive for a document and writes it to disk. Nothing is
//! sent to the org, so no credentials are needed.

use crate::commands::read_document;
use crate::config::Config;
use crate::error::Result;
use crate::output::print_json;
use crate::progress::format_bytes;
use colored::Colorize;
use orgpush_core::PackageBuilder;
use serde_json::json;
use std::path::Path;

pub fn run(config: &Config, file: &Path, output: &Path, json: bool) -> Result<()> {
    let document = read_document(file)?;
    let table = config.manifest_table()?;
    let archive = PackageBuilder::new(&table).build(&document, &config.api_version)?;

    let entries = archive.entry_names().map(str::to_string);
    let manifest = archive.manifest().clone();
    let size = archive.len() as u64;
    std::fs::write(output, archive.into_bytes())?;

    if json {
        return print_json(&json!({
            "output": output.display().to_string(),
            "bytes": size,
            "entries": entries,
            "category": manifest.type_category_name,
            "member": manifest.member_name,
            "api_version": manifest.api_version,
        }));
    }

    println!(
        "{} {} ({})",
        "Wrote".green().bold(),
        output.display(),
        format_bytes(size)
    );
    for entry in &entries {
        println!("  {}", entry);
    }
    println!(
        "Member {} of {} at API version {}",
        manifest.member_name.cyan(),
        manifest.type_category_name.cyan(),
        manifest.api_version
    );
    Ok(())
}
