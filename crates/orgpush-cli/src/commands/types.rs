//! `orgpush types` command implementation

use crate::config::Config;
use crate::error::Result;
use crate::output::print_json;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use serde_json::json;

/// List every type in the active metadata type table
pub fn run(config: &Config, json: bool) -> Result<()> {
    let table = config.manifest_table()?;

    let mut rows = Vec::with_capacity(table.len());
    for type_name in table.types() {
        let entry = table.resolve(type_name)?;
        rows.push((type_name.to_string(), entry.folder_name, entry.file_extension));
    }

    if json {
        let items: Vec<_> = rows
            .iter()
            .map(|(type_name, folder, extension)| {
                json!({"type": type_name, "folder": folder, "extension": extension})
            })
            .collect();
        return print_json(&items);
    }

    let mut output = Table::new();
    output
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["Type", "Folder", "Extension"]);
    for (type_name, folder, extension) in &rows {
        output.add_row(vec![type_name, folder, extension]);
    }

    println!("{}", output);
    println!("{} types", rows.len());
    Ok(())
}
