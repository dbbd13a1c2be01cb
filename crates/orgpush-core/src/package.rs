//! Deploy package assembly
//!
//! Turns one [`MetadataDocument`] into the zip the deploy endpoint expects:
//!
//! ```text
//! {folder}/{file name}-meta.xml   <- the document, byte for byte
//! package.xml                     <- generated manifest
//! ```
//!
//! No network access happens here.

use crate::document::MetadataDocument;
use crate::error::Result;
use crate::manifest::{ManifestEntry, ManifestTable};
use orgpush_common::ApiVersion;
use quick_xml::escape::escape;
use std::io::{Cursor, Write};
use tracing::{debug, instrument};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Every metadata file name in the archive ends with this
pub const META_SUFFIX: &str = "-meta.xml";

/// Name of the manifest entry at the archive root
pub const PACKAGE_MANIFEST_NAME: &str = "package.xml";

/// `package.xml` category used for every type in the settings folder
pub const SETTINGS_CATEGORY: &str = "Settings";

const METADATA_NAMESPACE: &str = "http://soap.sforce.com/2006/04/metadata";

// ============================================================================
// File name rules
// ============================================================================

/// How the metadata file name is derived for a given type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileNameRule {
    /// `{fullName}.{ext}`
    FullName,
    /// `{label without spaces}__c.{ext}`, falling back to `{fullName}.{ext}`
    CustomObjectLabel,
    /// `{fullName without spaces}.{ext}`
    StripSpaces,
    /// A constant stem: `{stem}.{ext}`
    Fixed(&'static str),
}

/// Types whose file name does not follow [`FileNameRule::FullName`]
const FILE_NAME_RULES: &[(&str, FileNameRule)] = &[
    ("CustomObject", FileNameRule::CustomObjectLabel),
    ("RemoteSiteSetting", FileNameRule::StripSpaces),
    ("SurveySettings", FileNameRule::Fixed("Survey")),
];

impl FileNameRule {
    pub fn for_type(type_name: &str) -> Self {
        FILE_NAME_RULES
            .iter()
            .find(|(name, _)| *name == type_name)
            .map(|(_, rule)| *rule)
            .unwrap_or(FileNameRule::FullName)
    }

    /// File name for `document` with the given extension, `-meta.xml` included
    pub fn file_name(self, document: &MetadataDocument, extension: &str) -> String {
        let mut name = match self {
            FileNameRule::FullName => format!("{}.{}", document.full_name(), extension),
            FileNameRule::CustomObjectLabel => match document.label() {
                Some(label) => format!("{}__c.{}", strip_spaces(label), extension),
                None => format!("{}.{}", document.full_name(), extension),
            },
            FileNameRule::StripSpaces => {
                format!("{}.{}", strip_spaces(document.full_name()), extension)
            },
            FileNameRule::Fixed(stem) => format!("{}.{}", stem, extension),
        };

        if !name.ends_with(META_SUFFIX) {
            name.push_str(META_SUFFIX);
        }
        name
    }
}

fn strip_spaces(value: &str) -> String {
    value.chars().filter(|c| *c != ' ').collect()
}

// ============================================================================
// package.xml
// ============================================================================

/// The `package.xml` listing for a single-member deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageManifest {
    pub type_category_name: String,
    pub member_name: String,
    pub api_version: ApiVersion,
}

impl PackageManifest {
    pub fn for_document(
        document: &MetadataDocument,
        entry: &ManifestEntry,
        api_version: &ApiVersion,
    ) -> Self {
        let type_category_name = if entry.is_settings() {
            SETTINGS_CATEGORY.to_string()
        } else {
            document.type_name().to_string()
        };

        Self {
            type_category_name,
            member_name: document.full_name().to_string(),
            api_version: api_version.clone(),
        }
    }

    pub fn render(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<Package xmlns="{ns}">
    <types>
        <members>{member}</members>
        <name>{name}</name>
    </types>
    <version>{version}</version>
</Package>
"#,
            ns = METADATA_NAMESPACE,
            member = escape(self.member_name.as_str()),
            name = escape(self.type_category_name.as_str()),
            version = self.api_version,
        )
    }
}

// ============================================================================
// Archive
// ============================================================================

/// A finished, immutable deploy archive
#[derive(Debug, Clone)]
pub struct Archive {
    bytes: Vec<u8>,
    metadata_path: String,
    manifest: PackageManifest,
}

impl Archive {
    /// Path of the metadata entry, e.g. `remoteSiteSettings/MySite.remoteSite-meta.xml`
    pub fn metadata_path(&self) -> &str {
        &self.metadata_path
    }

    pub fn manifest(&self) -> &PackageManifest {
        &self.manifest
    }

    /// Entry names in archive order
    pub fn entry_names(&self) -> [&str; 2] {
        [self.metadata_path.as_str(), PACKAGE_MANIFEST_NAME]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Builds deploy archives against a metadata type table
#[derive(Debug, Clone, Copy)]
pub struct PackageBuilder<'t> {
    table: &'t ManifestTable,
}

impl<'t> PackageBuilder<'t> {
    pub fn new(table: &'t ManifestTable) -> Self {
        Self { table }
    }

    #[instrument(skip_all, fields(type_name = document.type_name(), full_name = document.full_name()))]
    pub fn build(&self, document: &MetadataDocument, api_version: &ApiVersion) -> Result<Archive> {
        let entry = self.table.resolve(document.type_name())?;
        let file_name =
            FileNameRule::for_type(document.type_name()).file_name(document, &entry.file_extension);
        let metadata_path = format!("{}/{}", entry.folder_name, file_name);
        let manifest = PackageManifest::for_document(document, &entry, api_version);

        debug!(
            path = %metadata_path,
            category = %manifest.type_category_name,
            member = %manifest.member_name,
            "Assembling deploy archive"
        );

        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        writer.start_file(metadata_path.as_str(), options)?;
        writer.write_all(document.body().as_bytes())?;

        writer.start_file(PACKAGE_MANIFEST_NAME, options)?;
        writer.write_all(manifest.render().as_bytes())?;

        let bytes = writer.finish()?.into_inner();
        debug!(bytes = bytes.len(), "Deploy archive ready");

        Ok(Archive {
            bytes,
            metadata_path,
            manifest,
        })
    }
}
