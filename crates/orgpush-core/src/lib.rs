//! orgpush deployment core
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Packages payloads for a job-based org API, submits them as asynchronous
//! jobs, polls the jobs under a bounded timeout and reconciles the per-item
//! outcome into one result.
//!
//! # Pipelines
//!
//! - **Metadata deploy**: [`MetadataDocument`] → [`PackageBuilder`] →
//!   [`DeploySubmitter`] → [`JobPoller`] → [`DeploymentResult`]
//! - **Bulk ingest**: [`IngestRecord`]s → [`IngestJobManager`] (create, upload,
//!   close) → [`JobPoller`] → [`IngestResult`]
//!
//! # Example
//!
//! ```no_run
//! use orgpush_common::{ApiVersion, OrgCredentials};
//! use orgpush_core::{IngestJobManager, IngestRecord, OrgClient, PollConfig};
//!
//! # async fn run() -> orgpush_core::Result<()> {
//! let creds = OrgCredentials::new(
//!     "https://example.my.salesforce.com",
//!     "00D...token",
//!     ApiVersion::default(),
//! )?;
//! let client = OrgClient::new(creds)?;
//!
//! let records = vec![IngestRecord::new().with("Name", "Acme")];
//! let result = IngestJobManager::new(&client, PollConfig::default())
//!     .run_ingest(&records, "Account")
//!     .await?;
//! println!("{} created", result.successful);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod deploy;
pub mod document;
pub mod error;
pub mod ingest;
pub mod manifest;
pub mod package;
pub mod poller;
pub mod results;

pub use api::OrgClient;
pub use deploy::{DeploySubmitter, JobHandle, MetadataDeployer};
pub use document::MetadataDocument;
pub use error::{CoreError, Result};
pub use ingest::{IngestJobManager, IngestJobState, IngestRecord};
pub use manifest::{ManifestEntry, ManifestTable};
pub use package::{Archive, PackageBuilder, PackageManifest};
pub use poller::{JobPoller, JobStatus, PollConfig, PollOutcome, Progress, Sleeper, StatusSource, TokioSleeper};
pub use results::{
    DeploymentResult, FailureKind, FailureStep, IngestResult, IngestState, ItemFailure, RunFailure,
};
