//! Common types used across orgpush

use crate::error::{CommonError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// API version used when none is configured.
pub const DEFAULT_API_VERSION: &str = "61.0";

// ============================================================================
// API Version
// ============================================================================

/// Platform API version in `major.minor` form (e.g. `61.0`).
///
/// A leading `v` is accepted and dropped, so `v66.0` and `66.0` are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApiVersion(String);

impl ApiVersion {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ApiVersion {
    fn default() -> Self {
        Self(DEFAULT_API_VERSION.to_string())
    }
}

impl std::str::FromStr for ApiVersion {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let bare = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);

        let valid = match bare.split_once('.') {
            Some((major, minor)) => {
                !major.is_empty()
                    && !minor.is_empty()
                    && major.chars().all(|c| c.is_ascii_digit())
                    && minor.chars().all(|c| c.is_ascii_digit())
            },
            None => false,
        };

        if valid {
            Ok(Self(bare.to_string()))
        } else {
            Err(CommonError::InvalidApiVersion(s.to_string()))
        }
    }
}

impl TryFrom<String> for ApiVersion {
    type Error = CommonError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ApiVersion> for String {
    fn from(version: ApiVersion) -> Self {
        version.0
    }
}

impl std::fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// Connection details for one target org.
///
/// Token acquisition happens elsewhere; this only carries the result, built
/// once per process and handed to the client by reference. The `Debug` output
/// never includes the token.
#[derive(Clone)]
pub struct OrgCredentials {
    instance_url: String,
    access_token: String,
    api_version: ApiVersion,
    expires_at: Option<DateTime<Utc>>,
}

impl OrgCredentials {
    /// Build credentials, validating the instance URL.
    ///
    /// Trailing slashes are removed from the URL and a `Bearer ` prefix on the
    /// token is tolerated.
    pub fn new(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        api_version: ApiVersion,
    ) -> Result<Self> {
        let instance_url = instance_url.into();
        let parsed = Url::parse(instance_url.trim()).map_err(|e| {
            CommonError::InvalidInstanceUrl {
                url: instance_url.clone(),
                reason: e.to_string(),
            }
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CommonError::InvalidInstanceUrl {
                url: instance_url,
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let access_token = access_token.into();
        let token = access_token
            .trim()
            .strip_prefix("Bearer ")
            .unwrap_or(access_token.trim())
            .to_string();
        if token.is_empty() {
            return Err(CommonError::missing("access token"));
        }

        Ok(Self {
            instance_url: instance_url.trim().trim_end_matches('/').to_string(),
            access_token: token,
            api_version,
            expires_at: None,
        })
    }

    /// Record when the access token stops being valid
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn api_version(&self) -> &ApiVersion {
        &self.api_version
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Tokens without a recorded expiry never count as expired
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Utc::now())
    }

    /// Base of every versioned REST path: `{instance}/services/data/v{version}`
    pub fn data_base_url(&self) -> String {
        format!("{}/services/data/v{}", self.instance_url, self.api_version)
    }
}

impl std::fmt::Debug for OrgCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrgCredentials")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

// ============================================================================
// Jobs
// ============================================================================

/// Which remote job API a job belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    MetadataDeploy,
    BulkIngest,
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobKind::MetadataDeploy => write!(f, "metadata_deploy"),
            JobKind::BulkIngest => write!(f, "bulk_ingest"),
        }
    }
}

/// A remote job handle.
///
/// The platform owns the job's state; locally we only keep what is needed to
/// poll it, plus the state it reported when the job was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub kind: JobKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn new(id: impl Into<String>, kind: JobKind) -> Self {
        Self {
            id: id.into(),
            kind,
            state: None,
            created_at: Utc::now(),
        }
    }

    /// Record the state the platform reported alongside the job id
    pub fn with_state(mut self, state: Option<String>) -> Self {
        self.state = state.filter(|s| !s.is_empty());
        self
    }
}
