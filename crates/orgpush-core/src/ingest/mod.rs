//! Bulk record ingestion
//!
//! A run is four dependent calls: create the job, upload the CSV, close the
//! job, then poll it. Each call only happens if the previous one succeeded,
//! and a failure ends the run with a result tagged by the failing step.

pub mod records;

pub use records::IngestRecord;

use crate::api::client::{ensure_success, UPLOAD_TIMEOUT_SECS};
use crate::api::endpoints;
use crate::api::types::{CreateIngestJob, IngestJobInfo, JobCreated, UpdateIngestJobState};
use crate::api::OrgClient;
use crate::error::{CoreError, Result};
use crate::poller::{
    JobPoller, JobStatus, PollConfig, PollOutcome, Progress, Sleeper, StatusSource, TokioSleeper,
};
use crate::results::{collect_ingest_rows, FailureStep, IngestResult, IngestState, RunFailure};
use async_trait::async_trait;
use orgpush_common::{Job, JobKind};
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ============================================================================
// Job states
// ============================================================================

/// Bulk ingest job state as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestJobState {
    Open,
    UploadComplete,
    InProgress,
    JobComplete,
    Failed,
    Aborted,
    /// Any state this client does not know yet; treated as still running
    Unrecognized(String),
}

impl IngestJobState {
    pub fn parse(state: &str) -> Self {
        match state {
            "Open" => Self::Open,
            "UploadComplete" => Self::UploadComplete,
            "InProgress" => Self::InProgress,
            "JobComplete" => Self::JobComplete,
            "Failed" => Self::Failed,
            "Aborted" => Self::Aborted,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    pub fn progress(&self) -> Progress {
        match self {
            Self::JobComplete => Progress::Succeeded,
            Self::Failed | Self::Aborted => Progress::Failed,
            Self::Open | Self::UploadComplete | Self::InProgress | Self::Unrecognized(_) => {
                Progress::Pending
            },
        }
    }
}

impl JobStatus for IngestJobInfo {
    fn progress(&self) -> Progress {
        let state = IngestJobState::parse(&self.state);
        if let IngestJobState::Unrecognized(raw) = &state {
            info!(job_id = %self.id, state = %raw, "Unrecognized ingest job state, still waiting");
        }
        state.progress()
    }

    fn state(&self) -> &str {
        &self.state
    }
}

// ============================================================================
// Manager
// ============================================================================

/// Runs bulk insert jobs against one org
pub struct IngestJobManager<'c, Z = TokioSleeper> {
    client: &'c OrgClient,
    poller: JobPoller<Z>,
}

impl<'c> IngestJobManager<'c, TokioSleeper> {
    pub fn new(client: &'c OrgClient, poll: PollConfig) -> Self {
        Self {
            client,
            poller: JobPoller::new(poll),
        }
    }
}

impl<'c, Z: Sleeper> IngestJobManager<'c, Z> {
    pub fn with_poller(client: &'c OrgClient, poller: JobPoller<Z>) -> Self {
        Self { client, poller }
    }

    /// Create an insert job for `object`
    pub async fn create_job(&self, object: &str) -> Result<Job> {
        let url = endpoints::ingest_jobs_url(self.client.base_url());
        let response = self
            .client
            .post(&url)
            .json(&CreateIngestJob::insert(object))
            .send()
            .await?;
        let created: JobCreated = ensure_success(response).await?.json().await?;

        let job = Job::new(created.id, JobKind::BulkIngest).with_state(created.state);
        info!(
            job_id = %job.id,
            object,
            state = job.state.as_deref().unwrap_or("unknown"),
            created_at = %job.created_at,
            "Created ingest job"
        );
        Ok(job)
    }

    /// PUT the CSV body to the job's batch endpoint
    pub async fn upload(&self, job_id: &str, csv: String) -> Result<()> {
        let url = endpoints::ingest_batches_url(self.client.base_url(), job_id);
        let bytes = csv.len();
        let response = self
            .client
            .put(&url)
            .header(CONTENT_TYPE, "text/csv")
            .timeout(Duration::from_secs(UPLOAD_TIMEOUT_SECS))
            .body(csv)
            .send()
            .await?;
        ensure_success(response).await?;

        debug!(job_id, bytes, "Uploaded CSV data");
        Ok(())
    }

    /// Mark the upload complete, handing the job to the platform
    pub async fn close_job(&self, job_id: &str) -> Result<()> {
        let url = endpoints::ingest_job_url(self.client.base_url(), job_id);
        let response = self
            .client
            .patch(&url)
            .json(&UpdateIngestJobState::upload_complete())
            .send()
            .await?;
        ensure_success(response).await?;

        debug!(job_id, "Closed ingest job");
        Ok(())
    }

    /// One status fetch, no polling
    pub async fn job_status(&self, job_id: &str) -> Result<IngestJobInfo> {
        let url = endpoints::ingest_job_url(self.client.base_url(), job_id);
        let response = ensure_success(self.client.get(&url).send().await?).await?;
        Ok(response.json().await?)
    }

    /// Insert `records` into `object_name` and wait for the outcome.
    ///
    /// Records are cleaned first; if none remain the run ends with
    /// [`IngestState::NoRecords`] before any request is made. Remote failures
    /// are reported in the returned result. `Err` means the call itself was
    /// invalid.
    #[instrument(
        skip(self, records),
        fields(run_id = %Uuid::new_v4(), records = records.len())
    )]
    pub async fn run_ingest(
        &self,
        records: &[IngestRecord],
        object_name: &str,
    ) -> Result<IngestResult> {
        let object_name = object_name.trim();
        if object_name.is_empty() {
            return Err(CoreError::invalid_input("object name must not be empty"));
        }

        let rows = records::with_header_values(&records::non_empty(records));
        if rows.is_empty() {
            info!("No records left after dropping empty values, nothing to ingest");
            return Ok(IngestResult::no_records(object_name));
        }
        let total = rows.len();
        let csv = records::to_csv(&rows)?;
        self.client.ensure_token_valid()?;

        let abort = |job_id: Option<&str>, state: IngestState, step: FailureStep, e: &CoreError| {
            warn!(step = %step, error = %e, "Ingest run stopped");
            IngestResult::aborted(
                job_id.map(str::to_string),
                object_name,
                state,
                total,
                RunFailure::from_error(step, e),
            )
        };

        let job = match self.create_job(object_name).await {
            Ok(job) => job,
            Err(e) => {
                return Ok(abort(None, IngestState::NotCompleted, FailureStep::CreateJob, &e))
            },
        };

        if let Err(e) = self.upload(&job.id, csv).await {
            return Ok(abort(Some(job.id.as_str()), IngestState::NotCompleted, FailureStep::UploadData, &e));
        }

        if let Err(e) = self.close_job(&job.id).await {
            return Ok(abort(Some(job.id.as_str()), IngestState::NotCompleted, FailureStep::CloseJob, &e));
        }

        let info = match self.poller.poll_until_terminal(&job.id, self).await {
            Ok(PollOutcome::Succeeded(info)) => info,
            Ok(PollOutcome::Failed(info)) => {
                let state = match IngestJobState::parse(&info.state) {
                    IngestJobState::Aborted => IngestState::Aborted,
                    _ => IngestState::Failed,
                };
                let failure = CoreError::RemoteJobFailure {
                    job_id: job.id.clone(),
                    state: info.state.clone(),
                    message: info
                        .error_message
                        .clone()
                        .unwrap_or_else(|| "Unknown error".to_string()),
                };
                return Ok(abort(Some(job.id.as_str()), state, FailureStep::JobProcessing, &failure));
            },
            Err(e) => {
                return Ok(abort(Some(job.id.as_str()), IngestState::NotCompleted, FailureStep::PollStatus, &e))
            },
        };

        debug!(job_id = %job.id, state = %info.state, "Collecting row results");
        let rows = collect_ingest_rows(self.client, &job.id).await;
        let result = IngestResult {
            job_id: Some(job.id.clone()),
            object: object_name.to_string(),
            state: IngestState::JobComplete,
            success: rows.failed == 0,
            total_records: total,
            successful: rows.successful,
            failed: rows.failed,
            created_ids: rows.created_ids,
            failures: rows.failures,
            error: None,
        };

        info!(
            job_id = %job.id,
            successful = result.successful,
            failed = result.failed,
            "Ingest run finished"
        );
        Ok(result)
    }
}

#[async_trait]
impl<Z: Sleeper> StatusSource for IngestJobManager<'_, Z> {
    type Status = IngestJobInfo;

    async fn fetch_status(&self, job_id: &str) -> Result<IngestJobInfo> {
        self.job_status(job_id).await
    }
}
