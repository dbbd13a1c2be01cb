//! Metadata deployment
//!
//! [`DeploySubmitter`] sends one archive to the deploy endpoint and returns a
//! job handle. [`MetadataDeployer`] runs the whole pipeline for a document:
//! package, submit, poll, collect.

use crate::api::client::ensure_success;
use crate::api::endpoints;
use crate::api::types::{DeployOptions, DeployRequest, DeployStatus, DeployStatusResponse, JobCreated};
use crate::api::OrgClient;
use crate::document::MetadataDocument;
use crate::error::Result;
use crate::manifest::ManifestTable;
use crate::package::{Archive, PackageBuilder};
use crate::poller::{
    JobPoller, JobStatus, PollConfig, Progress, Sleeper, StatusSource, TokioSleeper,
};
use crate::results::{collect_deploy_result, DeploymentResult, FailureStep, RunFailure};
use async_trait::async_trait;
use orgpush_common::{Job, JobKind};
use reqwest::multipart::{Form, Part};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// File name of the archive part in the multipart body
pub const ARCHIVE_FILE_NAME: &str = "metadata.zip";

impl JobStatus for DeployStatus {
    fn progress(&self) -> Progress {
        match (self.done, self.success) {
            (false, _) => Progress::Pending,
            (true, true) => Progress::Succeeded,
            (true, false) => Progress::Failed,
        }
    }

    fn state(&self) -> &str {
        &self.status
    }
}

/// A submitted deploy job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub job: Job,
    /// Component that was deployed, `fullName` of the document
    pub member: String,
}

impl JobHandle {
    pub fn id(&self) -> &str {
        &self.job.id
    }
}

/// Submits deploy archives and reads deploy status
#[derive(Debug, Clone)]
pub struct DeploySubmitter<'c> {
    client: &'c OrgClient,
    options: DeployOptions,
}

impl<'c> DeploySubmitter<'c> {
    pub fn new(client: &'c OrgClient) -> Self {
        Self {
            client,
            options: DeployOptions::default(),
        }
    }

    /// POST the archive as a new deploy request. No retries.
    #[instrument(skip_all, fields(path = archive.metadata_path(), bytes = archive.len()))]
    pub async fn submit(&self, archive: Archive) -> Result<JobHandle> {
        let member = archive.manifest().member_name.clone();
        let url = endpoints::deploy_request_url(self.client.base_url());

        let options = serde_json::to_string(&DeployRequest {
            deploy_options: self.options.clone(),
        })?;
        let form = Form::new()
            .part(
                "json",
                Part::text(options).mime_str("application/json")?,
            )
            .part(
                "file",
                Part::bytes(archive.into_bytes())
                    .file_name(ARCHIVE_FILE_NAME)
                    .mime_str("application/zip")?,
            );

        let response = self.client.post(&url).multipart(form).send().await?;
        let created: JobCreated = ensure_success(response).await?.json().await?;

        let job = Job::new(created.id, JobKind::MetadataDeploy);
        info!(job_id = %job.id, member = %member, "Submitted deploy request");
        Ok(JobHandle { job, member })
    }

    /// One status fetch with component details, no polling
    pub async fn deploy_status(&self, job_id: &str) -> Result<DeployStatus> {
        let url = endpoints::deploy_status_url(self.client.base_url(), job_id);
        let response = ensure_success(self.client.get(&url).send().await?).await?;
        let body: DeployStatusResponse = response.json().await?;
        Ok(body.deploy_result)
    }
}

#[async_trait]
impl StatusSource for DeploySubmitter<'_> {
    type Status = DeployStatus;

    async fn fetch_status(&self, job_id: &str) -> Result<DeployStatus> {
        self.deploy_status(job_id).await
    }
}

/// Package, submit, poll and collect one metadata document
pub struct MetadataDeployer<'c, Z = TokioSleeper> {
    table: &'c ManifestTable,
    submitter: DeploySubmitter<'c>,
    poller: JobPoller<Z>,
}

impl<'c> MetadataDeployer<'c, TokioSleeper> {
    pub fn new(client: &'c OrgClient, table: &'c ManifestTable, poll: PollConfig) -> Self {
        Self::with_poller(client, table, JobPoller::new(poll))
    }
}

impl<'c, Z: Sleeper> MetadataDeployer<'c, Z> {
    pub fn with_poller(client: &'c OrgClient, table: &'c ManifestTable, poller: JobPoller<Z>) -> Self {
        Self {
            table,
            submitter: DeploySubmitter::new(client),
            poller,
        }
    }

    /// Deploy `document` and wait for the outcome.
    ///
    /// Only a bad document or a missing type configuration produce `Err`;
    /// everything that goes wrong remotely is reported in the result.
    #[instrument(
        skip_all,
        fields(run_id = %Uuid::new_v4(), type_name = document.type_name(), full_name = document.full_name())
    )]
    pub async fn deploy(&self, document: &MetadataDocument) -> Result<DeploymentResult> {
        let client = self.submitter.client;
        let archive = PackageBuilder::new(self.table).build(document, client.credentials().api_version())?;
        client.ensure_token_valid()?;

        let handle = match self.submitter.submit(archive).await {
            Ok(handle) => handle,
            Err(e) => {
                warn!(error = %e, "Deploy submission failed");
                return Ok(DeploymentResult::aborted(
                    None,
                    RunFailure::from_error(FailureStep::SubmitDeploy, &e),
                ));
            },
        };

        let status = match self.poller.poll_until_terminal(handle.id(), &self.submitter).await {
            Ok(outcome) => outcome.into_status(),
            Err(e) => {
                warn!(job_id = handle.id(), error = %e, "Stopped waiting for deploy");
                return Ok(DeploymentResult::aborted(
                    Some(handle.id().to_string()),
                    RunFailure::from_error(FailureStep::PollStatus, &e),
                ));
            },
        };

        let mut result = collect_deploy_result(&status, Some(&handle.member));
        if result.job_id.as_deref().map_or(true, str::is_empty) {
            result.job_id = Some(handle.id().to_string());
        }

        info!(
            job_id = handle.id(),
            status = %result.status,
            success = result.success,
            failures = result.failures.len(),
            "Deploy finished"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(done: bool, success: bool) -> DeployStatus {
        DeployStatus {
            id: "0Af1".to_string(),
            status: "InProgress".to_string(),
            done,
            success,
            ..Default::default()
        }
    }

    #[test]
    fn test_done_flag_decides_terminal() {
        assert_eq!(status(false, false).progress(), Progress::Pending);
        assert_eq!(status(false, true).progress(), Progress::Pending);
        assert_eq!(status(true, true).progress(), Progress::Succeeded);
        assert_eq!(status(true, false).progress(), Progress::Failed);
    }

    #[test]
    fn test_terminal_regardless_of_status_string() {
        let odd = DeployStatus {
            status: "SucceededPartial".to_string(),
            ..status(true, false)
        };
        assert!(odd.progress().is_terminal());
    }
}
