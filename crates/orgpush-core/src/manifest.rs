//! Metadata type table
//!
//! Maps a metadata type name (`RemoteSiteSetting`, `CustomObject`, ...) to the
//! folder and file extension it must use inside a deploy archive. The bundled
//! table is compiled in and parsed once per process; operators can supply their
//! own table with [`ManifestTable::load`].

use crate::error::{CoreError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

const BUNDLED_TABLE: &str = include_str!("../resources/metadata_map.yml");

/// Folder whose types are listed under the `Settings` category in `package.xml`
pub const SETTINGS_FOLDER: &str = "settings";

static BUNDLED: OnceLock<ManifestTable> = OnceLock::new();

/// Where a metadata type lives inside the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub folder_name: String,
    pub file_extension: String,
}

impl ManifestEntry {
    pub fn is_settings(&self) -> bool {
        self.folder_name == SETTINGS_FOLDER
    }
}

#[derive(Debug, Clone, Deserialize)]
struct TypeConfig {
    #[serde(rename = "type")]
    type_name: String,
    extension: String,
}

/// Read-only type table, keyed by folder
#[derive(Debug, Clone)]
pub struct ManifestTable {
    folders: BTreeMap<String, Vec<TypeConfig>>,
}

impl ManifestTable {
    /// Parse a table in the `folder: [{type, extension}]` YAML shape
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let folders: BTreeMap<String, Vec<TypeConfig>> = serde_yaml::from_str(content)
            .map_err(|e| CoreError::configuration(format!("invalid metadata type table: {}", e)))?;

        if folders.values().all(Vec::is_empty) {
            return Err(CoreError::configuration("metadata type table is empty"));
        }

        Ok(Self { folders })
    }

    /// Load an operator-supplied table from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CoreError::configuration(format!(
                "metadata type table not found at {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let table = Self::from_yaml_str(&content)?;
        debug!(path = %path.display(), types = table.len(), "Loaded metadata type table");
        Ok(table)
    }

    /// The table shipped with the crate, parsed on first use
    pub fn bundled() -> Result<&'static Self> {
        if let Some(table) = BUNDLED.get() {
            return Ok(table);
        }
        let table = Self::from_yaml_str(BUNDLED_TABLE)?;
        Ok(BUNDLED.get_or_init(|| table))
    }

    /// Find the single folder/extension pair configured for `type_name`
    pub fn resolve(&self, type_name: &str) -> Result<ManifestEntry> {
        let mut matches = self.folders.iter().flat_map(|(folder, configs)| {
            configs
                .iter()
                .filter(move |c| c.type_name == type_name)
                .map(move |c| (folder, c))
        });

        let Some((folder, config)) = matches.next() else {
            return Err(CoreError::configuration(format!(
                "no metadata type configuration for '{}'",
                type_name
            )));
        };

        let others: Vec<&String> = matches.map(|(f, _)| f).collect();
        if !others.is_empty() {
            return Err(CoreError::configuration(format!(
                "metadata type '{}' is configured more than once (folders: {}, {})",
                type_name,
                folder,
                others
                    .iter()
                    .map(|f| f.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }

        Ok(ManifestEntry {
            folder_name: folder.clone(),
            file_extension: config.extension.clone(),
        })
    }

    /// Every configured type name, sorted
    pub fn types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self
            .folders
            .values()
            .flatten()
            .map(|c| c.type_name.as_str())
            .collect();
        types.sort_unstable();
        types
    }

    pub fn len(&self) -> usize {
        self.folders.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
