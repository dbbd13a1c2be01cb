//! Wire types for the deploy and bulk ingest REST endpoints
//!
//! Field names follow the platform's camelCase JSON. Response types are
//! lenient: anything the pipelines do not strictly need is optional or
//! defaulted.

use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Metadata deploy
// ============================================================================

/// `json` part of the deploy multipart body
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest {
    pub deploy_options: DeployOptions,
}

/// Deploy toggles sent with every archive
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeployOptions {
    pub allow_missing_files: bool,
    pub auto_update_package: bool,
    pub check_only: bool,
    pub ignore_warnings: bool,
    pub perform_retrieve: bool,
    pub purge_on_delete: bool,
    pub rollback_on_error: bool,
    pub run_tests: Vec<String>,
    pub single_package: bool,
    pub test_level: String,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            allow_missing_files: false,
            auto_update_package: false,
            check_only: false,
            ignore_warnings: false,
            perform_retrieve: false,
            purge_on_delete: false,
            rollback_on_error: true,
            run_tests: Vec::new(),
            single_package: true,
            test_level: "NoTestRun".to_string(),
        }
    }
}

/// Response to a deploy submission or job creation
#[derive(Debug, Clone, Deserialize)]
pub struct JobCreated {
    pub id: String,
    /// Present on ingest job creation (`Open`)
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployStatusResponse {
    pub deploy_result: DeployStatus,
}

/// `deployResult` as returned by the status endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct DeployStatus {
    pub id: String,
    pub status: String,
    pub done: bool,
    pub success: bool,
    pub number_components_deployed: u32,
    pub number_component_errors: u32,
    pub number_components_total: u32,
    pub error_message: Option<String>,
    pub details: Option<DeployDetails>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct DeployDetails {
    #[serde(deserialize_with = "one_or_many")]
    pub component_failures: Vec<ComponentMessage>,
    #[serde(deserialize_with = "one_or_many")]
    pub all_component_messages: Vec<ComponentMessage>,
}

/// One entry of `componentFailures` / `allComponentMessages`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ComponentMessage {
    pub full_name: Option<String>,
    pub component_type: Option<String>,
    pub file_name: Option<String>,
    pub problem: Option<String>,
    pub problem_type: Option<String>,
    pub success: Option<bool>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

/// The platform sends a bare object when a list has a single element
fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(
        match Option::<OneOrMany<T>>::deserialize(deserializer)? {
            Some(OneOrMany::Many(items)) => items,
            Some(OneOrMany::One(item)) => vec![item],
            None => Vec::new(),
        },
    )
}

// ============================================================================
// Bulk ingest
// ============================================================================

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateIngestJob<'a> {
    pub object: &'a str,
    pub operation: &'static str,
    pub content_type: &'static str,
    pub line_ending: &'static str,
}

impl<'a> CreateIngestJob<'a> {
    pub fn insert(object: &'a str) -> Self {
        Self {
            object,
            operation: "insert",
            content_type: "CSV",
            line_ending: "LF",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UpdateIngestJobState {
    pub state: &'static str,
}

impl UpdateIngestJobState {
    pub fn upload_complete() -> Self {
        Self {
            state: "UploadComplete",
        }
    }
}

/// Job info returned by create and status calls
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct IngestJobInfo {
    pub id: String,
    pub state: String,
    pub object: Option<String>,
    pub operation: Option<String>,
    pub number_records_processed: Option<u64>,
    pub number_records_failed: Option<u64>,
    pub error_message: Option<String>,
}
