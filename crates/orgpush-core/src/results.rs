//! Normalized pipeline results
//!
//! Both pipelines end in one of the result types below, built once when the
//! run is over. Remote problems never surface as `Err`; they are recorded in
//! the result, either per item ([`ItemFailure`]) or for the run as a whole
//! ([`RunFailure`]).

use crate::api::client::ensure_success;
use crate::api::endpoints;
use crate::api::types::{ComponentMessage, DeployStatus};
use crate::api::OrgClient;
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

const ID_COLUMN: &str = "sf__Id";
const ERROR_COLUMN: &str = "sf__Error";
const UNKNOWN_RECORD: &str = "Unknown";
const UNKNOWN_ERROR: &str = "Unknown error";

// ============================================================================
// Failure descriptors
// ============================================================================

/// Pipeline phase a run-level failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStep {
    SubmitDeploy,
    CreateJob,
    UploadData,
    CloseJob,
    PollStatus,
    JobProcessing,
}

impl std::fmt::Display for FailureStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FailureStep::SubmitDeploy => "submit_deploy",
            FailureStep::CreateJob => "create_job",
            FailureStep::UploadData => "upload_data",
            FailureStep::CloseJob => "close_job",
            FailureStep::PollStatus => "poll_status",
            FailureStep::JobProcessing => "job_processing",
        };
        f.write_str(name)
    }
}

/// Why a run ended early
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A request was rejected or could not be sent
    Submission,
    /// We stopped waiting; the remote job may still be running
    Timeout,
    /// The platform reported the job as failed
    RemoteJob,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFailure {
    pub step: FailureStep,
    pub kind: FailureKind,
    pub message: String,
}

impl RunFailure {
    pub fn new(step: FailureStep, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            step,
            kind,
            message: message.into(),
        }
    }

    /// Classify an error raised while running `step`
    pub fn from_error(step: FailureStep, error: &CoreError) -> Self {
        let kind = match error {
            CoreError::PollTimeout { .. } => FailureKind::Timeout,
            CoreError::RemoteJobFailure { .. } => FailureKind::RemoteJob,
            _ => FailureKind::Submission,
        };
        Self::new(step, kind, error.to_string())
    }
}

/// One component or record the platform refused
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub identifier: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl ItemFailure {
    pub fn new(identifier: impl Into<String>, problem: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            problem: problem.into(),
            problem_type: None,
            file_name: None,
        }
    }

    fn from_component(message: &ComponentMessage) -> Self {
        Self {
            identifier: message
                .full_name
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            problem: message
                .problem
                .clone()
                .unwrap_or_else(|| "Unknown problem".to_string()),
            problem_type: message.problem_type.clone(),
            file_name: message.file_name.clone(),
        }
    }
}

// ============================================================================
// Deploy
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentResult {
    pub job_id: Option<String>,
    pub status: String,
    pub success: bool,
    pub components_deployed: u32,
    pub component_errors: u32,
    pub failures: Vec<ItemFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RunFailure>,
}

impl DeploymentResult {
    /// A run that ended before the deploy reached a terminal status
    pub fn aborted(job_id: Option<String>, failure: RunFailure) -> Self {
        Self {
            job_id,
            status: "NotCompleted".to_string(),
            success: false,
            components_deployed: 0,
            component_errors: 0,
            failures: Vec::new(),
            error: Some(failure),
        }
    }
}

/// Turn a terminal deploy status into a result.
///
/// `member` names the deployed component and is used when a failed deploy
/// carries no component details.
pub fn collect_deploy_result(status: &DeployStatus, member: Option<&str>) -> DeploymentResult {
    let failures = if status.success {
        Vec::new()
    } else {
        deploy_failures(status, member)
    };

    DeploymentResult {
        job_id: Some(status.id.clone()),
        status: status.status.clone(),
        success: status.success,
        components_deployed: status.number_components_deployed,
        component_errors: status.number_component_errors,
        failures,
        error: None,
    }
}

fn deploy_failures(status: &DeployStatus, member: Option<&str>) -> Vec<ItemFailure> {
    let mut failures: Vec<ItemFailure> = Vec::new();

    if let Some(details) = &status.details {
        failures.extend(details.component_failures.iter().map(ItemFailure::from_component));

        for message in &details.all_component_messages {
            if message.success != Some(false) {
                continue;
            }
            let failure = ItemFailure::from_component(message);
            let already_reported = failures
                .iter()
                .any(|f| f.identifier == failure.identifier && f.problem == failure.problem);
            if !already_reported {
                failures.push(failure);
            }
        }
    }

    if failures.is_empty() {
        let problem = match &status.error_message {
            Some(message) => format!(
                "Deployment failed without component details (status: {}): {}",
                status.status, message
            ),
            None => format!(
                "Deployment failed without component details (status: {})",
                status.status
            ),
        };
        failures.push(ItemFailure::new(member.unwrap_or("unknown"), problem));
    }

    failures
}

// ============================================================================
// Ingest
// ============================================================================

/// Where an ingest run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IngestState {
    /// Nothing left to send after cleaning; no job was created
    NoRecords,
    /// The job never reached a terminal state (submission error or timeout)
    NotCompleted,
    JobComplete,
    Failed,
    Aborted,
}

impl std::fmt::Display for IngestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            IngestState::NoRecords => "NoRecords",
            IngestState::NotCompleted => "NotCompleted",
            IngestState::JobComplete => "JobComplete",
            IngestState::Failed => "Failed",
            IngestState::Aborted => "Aborted",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestResult {
    pub job_id: Option<String>,
    pub object: String,
    pub state: IngestState,
    pub success: bool,
    pub total_records: usize,
    pub successful: usize,
    pub failed: usize,
    pub created_ids: Vec<String>,
    pub failures: Vec<ItemFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RunFailure>,
}

impl IngestResult {
    pub fn no_records(object: impl Into<String>) -> Self {
        Self {
            job_id: None,
            object: object.into(),
            state: IngestState::NoRecords,
            success: false,
            total_records: 0,
            successful: 0,
            failed: 0,
            created_ids: Vec::new(),
            failures: Vec::new(),
            error: None,
        }
    }

    /// A run stopped at `failure.step`; every record counts as failed
    pub fn aborted(
        job_id: Option<String>,
        object: impl Into<String>,
        state: IngestState,
        total_records: usize,
        failure: RunFailure,
    ) -> Self {
        Self {
            job_id,
            object: object.into(),
            state,
            success: false,
            total_records,
            successful: 0,
            failed: total_records,
            created_ids: Vec::new(),
            failures: Vec::new(),
            error: Some(failure),
        }
    }
}

/// Per-row outcome of a finished ingest job
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowOutcomes {
    pub successful: usize,
    pub created_ids: Vec<String>,
    pub failed: usize,
    pub failures: Vec<ItemFailure>,
}

/// Best-effort fetch of a finished job's successful and failed rows.
///
/// A failing fetch is logged and leaves its half of the outcome empty.
pub async fn collect_ingest_rows(client: &OrgClient, job_id: &str) -> RowOutcomes {
    let mut outcome = RowOutcomes::default();
    let base = client.base_url();

    match fetch_rows(client, &endpoints::successful_results_url(base, job_id)).await {
        Ok(rows) => {
            outcome.successful = rows.len();
            outcome.created_ids = rows
                .iter()
                .filter_map(|row| row.get(ID_COLUMN))
                .filter(|id| !id.is_empty())
                .cloned()
                .collect();
            debug!(job_id, successful = outcome.successful, "Fetched successful rows");
        },
        Err(e) => warn!(job_id, error = %e, "Could not retrieve successful results"),
    }

    match fetch_rows(client, &endpoints::failed_results_url(base, job_id)).await {
        Ok(rows) => {
            outcome.failed = rows.len();
            outcome.failures = rows.iter().map(failed_row).collect();
            debug!(job_id, failed = outcome.failed, "Fetched failed rows");
        },
        Err(e) => warn!(job_id, error = %e, "Could not retrieve failed results"),
    }

    outcome
}

fn failed_row(row: &HashMap<String, String>) -> ItemFailure {
    let identifier = row
        .get(ID_COLUMN)
        .filter(|id| !id.is_empty())
        .map(String::as_str)
        .unwrap_or(UNKNOWN_RECORD);
    let problem = row
        .get(ERROR_COLUMN)
        .filter(|e| !e.is_empty())
        .map(String::as_str)
        .unwrap_or(UNKNOWN_ERROR);
    ItemFailure::new(identifier, problem)
}

async fn fetch_rows(client: &OrgClient, url: &str) -> Result<Vec<HashMap<String, String>>> {
    let response = ensure_success(client.get(url).send().await?).await?;
    let body = response.text().await?;
    parse_result_csv(&body)
}

/// Parse a results CSV into header-keyed rows
pub fn parse_result_csv(body: &str) -> Result<Vec<HashMap<String, String>>> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(body.as_bytes());
    let rows = reader
        .deserialize::<HashMap<String, String>>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::api::types::DeployStatusResponse;
    use serde_json::json;

    fn status(value: serde_json::Value) -> DeployStatus {
        serde_json::from_value::<DeployStatusResponse>(json!({ "deployResult": value }))
            .unwrap()
            .deploy_result
    }

    #[test]
    fn test_successful_deploy() {
        let result = collect_deploy_result(
            &status(json!({"id": "0Af1", "status": "Succeeded", "done": true, "success": true,
                           "numberComponentsDeployed": 1})),
            Some("MySite"),
        );
        assert!(result.success);
        assert_eq!(result.components_deployed, 1);
        assert!(result.failures.is_empty());
        assert_eq!(result.job_id.as_deref(), Some("0Af1"));
    }

    #[test]
    fn test_component_failures_then_unreported_messages() {
        let result = collect_deploy_result(
            &status(json!({
                "id": "0Af1", "status": "Failed", "done": true, "success": false,
                "numberComponentErrors": 2,
                "details": {
                    "componentFailures": [
                        {"fullName": "X", "problem": "required field missing",
                         "problemType": "Error", "fileName": "objects/X.object"}
                    ],
                    "allComponentMessages": [
                        {"fullName": "X", "problem": "required field missing", "success": false},
                        {"fullName": "package.xml", "success": true},
                        {"fullName": "Y", "problem": "bad reference", "success": false}
                    ]
                }
            })),
            None,
        );

        assert!(!result.success);
        assert_eq!(result.component_errors, 2);
        assert_eq!(result.failures.len(), 2);
        assert_eq!(result.failures[0].identifier, "X");
        assert_eq!(result.failures[0].problem_type.as_deref(), Some("Error"));
        assert_eq!(result.failures[0].file_name.as_deref(), Some("objects/X.object"));
        assert_eq!(result.failures[1].identifier, "Y");
    }

    #[test]
    fn test_failed_deploy_without_details_gets_generic_entry() {
        let result = collect_deploy_result(
            &status(json!({"id": "0Af1", "status": "Failed", "done": true, "success": false})),
            Some("MySite"),
        );

        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].identifier, "MySite");
        assert_eq!(
            result.failures[0].problem,
            "Deployment failed without component details (status: Failed)"
        );

        let anonymous = collect_deploy_result(
            &status(json!({"id": "0Af1", "status": "Canceled", "done": true, "success": false,
                           "errorMessage": "canceled by admin", "details": {}})),
            None,
        );
        assert_eq!(anonymous.failures[0].identifier, "unknown");
        assert!(anonymous.failures[0].problem.contains("canceled by admin"));
    }

    #[test]
    fn test_parse_result_csv() {
        let rows = parse_result_csv("\"sf__Id\",\"sf__Created\",Name\n001xx,true,Acme\n").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("sf__Id").map(String::as_str), Some("001xx"));

        assert!(parse_result_csv("").unwrap().is_empty());
        assert!(parse_result_csv("sf__Id,sf__Error\n").unwrap().is_empty());
    }

    #[test]
    fn test_failed_row_defaults() {
        let rows = parse_result_csv("sf__Id,sf__Error,Name\n,REQUIRED_FIELD_MISSING,Acme\n").unwrap();
        let failure = failed_row(&rows[0]);
        assert_eq!(failure.identifier, "Unknown");
        assert_eq!(failure.problem, "REQUIRED_FIELD_MISSING");

        let bare = failed_row(&HashMap::new());
        assert_eq!(bare.problem, "Unknown error");
    }

    #[test]
    fn test_run_failure_classification() {
        let timeout = RunFailure::from_error(
            FailureStep::PollStatus,
            &CoreError::PollTimeout {
                job_id: "750x".to_string(),
                waited: std::time::Duration::from_secs(300),
            },
        );
        assert_eq!(timeout.kind, FailureKind::Timeout);

        let rejected = RunFailure::from_error(
            FailureStep::CreateJob,
            &CoreError::Submission {
                status: 400,
                body: "bad object".to_string(),
            },
        );
        assert_eq!(rejected.kind, FailureKind::Submission);
        assert_eq!(rejected.step.to_string(), "create_job");
    }

    #[test]
    fn test_ingest_result_serializes_snake_case() {
        let result = IngestResult::aborted(
            Some("750x".to_string()),
            "Account",
            IngestState::NotCompleted,
            3,
            RunFailure::new(FailureStep::UploadData, FailureKind::Submission, "HTTP 400"),
        );
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["failed"], 3);
        assert_eq!(value["created_ids"], json!([]));
        assert_eq!(value["state"], "NotCompleted");
        assert_eq!(value["error"]["step"], "upload_data");
        assert_eq!(value["error"]["kind"], "submission");
    }
}
