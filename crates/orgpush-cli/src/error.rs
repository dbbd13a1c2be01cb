//! Error types for the orgpush CLI
//!
//! Messages are user-facing and say what to do next where there is something
//! to do.

use orgpush_common::CommonError;
use orgpush_core::CoreError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Pass it as a flag, set the environment variable, or add it to .env.")]
    Config(String),

    /// Required file is missing
    #[error("File not found: '{0}'. Verify the file path exists and you have read permissions.")]
    FileNotFound(String),

    /// Input file could not be turned into records or a document
    #[error("Invalid input file '{path}': {reason}")]
    InvalidInput { path: String, reason: String },

    /// The job ran but did not succeed; details were already printed
    #[error("{0}")]
    JobFailed(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Common(#[from] CommonError),

    /// File system operation failed
    #[error("File operation failed: {0}. Check file permissions and disk space.")]
    Io(#[from] std::io::Error),

    #[error("Failed to read CSV: {0}. Check that the file has a header row and consistent quoting.")]
    Csv(#[from] csv::Error),

    #[error("Failed to parse JSON: {0}. Expected an array of objects.")]
    JsonParse(#[from] serde_json::Error),
}

impl CliError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_input(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }
}
