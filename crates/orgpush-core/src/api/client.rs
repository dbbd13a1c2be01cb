//! HTTP client for the target org
//!
//! Wraps a `reqwest::Client` together with the org's credentials so every
//! request goes to the right versioned base URL with a bearer token.

use crate::error::{CoreError, Result};
use orgpush_common::OrgCredentials;
use reqwest::{Client, Method, RequestBuilder, Response};
use std::time::Duration;
use tracing::debug;

// ============================================================================
// Client Constants
// ============================================================================

/// Default timeout for a single request
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Timeout for the CSV upload, which can carry a large body
pub const UPLOAD_TIMEOUT_SECS: u64 = 60;

/// Authenticated client for one org
#[derive(Debug, Clone)]
pub struct OrgClient {
    http: Client,
    credentials: OrgCredentials,
    base_url: String,
}

impl OrgClient {
    /// Create a client with the default request timeout
    pub fn new(credentials: OrgCredentials) -> Result<Self> {
        Self::with_timeout(credentials, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(credentials: OrgCredentials, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("orgpush/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let base_url = credentials.data_base_url();

        Ok(Self {
            http,
            credentials,
            base_url,
        })
    }

    pub fn credentials(&self) -> &OrgCredentials {
        &self.credentials
    }

    /// `{instance}/services/data/v{version}`
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Refuse to start a run with a token that is known to be stale
    pub fn ensure_token_valid(&self) -> Result<()> {
        if self.credentials.is_expired() {
            return Err(CoreError::configuration(
                "access token has expired; obtain a new one before submitting",
            ));
        }
        Ok(())
    }

    /// Start a request with the bearer token attached
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        debug!(%method, url, "Sending request");
        self.http
            .request(method, url)
            .bearer_auth(self.credentials.access_token())
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    pub fn put(&self, url: &str) -> RequestBuilder {
        self.request(Method::PUT, url)
    }

    pub fn patch(&self, url: &str) -> RequestBuilder {
        self.request(Method::PATCH, url)
    }
}

/// Turn a non-2xx response into [`CoreError::Submission`], keeping the body
pub async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(CoreError::Submission {
        status: status.as_u16(),
        body,
    })
}
