//! Error types for the deployment core
//!
//! Pipeline entry points (`MetadataDeployer::deploy`, `IngestJobManager::run_ingest`)
//! turn remote failures into structured results. Only the caller-fixable kinds
//! (`Configuration`, `InvalidDocument`, `InvalidInput`) escape them as `Err`.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    /// Missing or ambiguous metadata type configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Metadata payload could not be understood
    #[error("Invalid metadata document: {0}")]
    InvalidDocument(String),

    /// Caller passed arguments the pipeline cannot work with
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The platform answered a create/upload/close/deploy call with a non-2xx status
    #[error("Request rejected with HTTP {status}: {body}")]
    Submission { status: u16, body: String },

    /// Local give-up: the job was still running when `max_wait` ran out
    #[error("Job {job_id} did not reach a terminal state within {}s", waited.as_secs())]
    PollTimeout { job_id: String, waited: Duration },

    /// The platform reported the job as failed or aborted
    #[error("Job {job_id} ended in state {state}: {message}")]
    RemoteJobFailure {
        job_id: String,
        state: String,
        message: String,
    },

    /// Invalid credentials or API version
    #[error(transparent)]
    Common(#[from] orgpush_common::CommonError),

    #[error("Network request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to build archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Failed to parse metadata type table: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn invalid_document(msg: impl Into<String>) -> Self {
        Self::InvalidDocument(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Errors the caller has to fix; everything else is a remote or transport problem
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_)
                | Self::InvalidDocument(_)
                | Self::InvalidInput(_)
                | Self::Common(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_mentions_wait() {
        let err = CoreError::PollTimeout {
            job_id: "750x0001".to_string(),
            waited: Duration::from_secs(300),
        };
        assert_eq!(
            err.to_string(),
            "Job 750x0001 did not reach a terminal state within 300s"
        );
        assert!(!err.is_caller_error());
    }

    #[test]
    fn test_caller_errors() {
        assert!(CoreError::configuration("no entry").is_caller_error());
        assert!(CoreError::invalid_document("no fullName").is_caller_error());
        assert!(!CoreError::Submission {
            status: 400,
            body: "bad".to_string()
        }
        .is_caller_error());
    }
}
