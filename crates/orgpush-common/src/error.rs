//! Error types shared across orgpush crates

use thiserror::Error;

/// Result type alias for common operations
pub type Result<T> = std::result::Result<T, CommonError>;

/// Errors raised while building shared values (credentials, versions)
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("Missing required setting: {0}")]
    MissingSetting(String),

    #[error("Invalid instance URL '{url}': {reason}")]
    InvalidInstanceUrl { url: String, reason: String },

    #[error("Invalid API version '{0}': expected a value like '61.0'")]
    InvalidApiVersion(String),
}

impl CommonError {
    /// Create a missing setting error
    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingSetting(name.into())
    }
}
