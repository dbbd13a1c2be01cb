//! Configuration management for the orgpush CLI
//!
//! Values come from CLI flags, which clap backs with environment variables;
//! `main` loads `.env` with `dotenvy` before parsing so `.env` entries count
//! as environment.

use crate::error::{CliError, Result};
use crate::OrgArgs;
use orgpush_common::{ApiVersion, OrgCredentials};
use orgpush_core::{ManifestTable, OrgClient, PollConfig};
use std::borrow::Cow;
use std::path::PathBuf;
use std::time::Duration;

/// Resolved CLI settings
#[derive(Debug, Clone)]
pub struct Config {
    pub instance_url: Option<String>,
    pub access_token: Option<String>,
    pub api_version: ApiVersion,
    pub poll: PollConfig,
    pub request_timeout: Duration,
    pub metadata_map: Option<PathBuf>,
}

impl Config {
    /// Validate the parsed flags
    pub fn from_args(args: &OrgArgs) -> Result<Self> {
        let api_version: ApiVersion = args.api_version.parse()?;
        let poll = PollConfig::new(
            Duration::from_secs(args.poll_interval),
            Duration::from_secs(args.max_wait),
        )
        .map_err(|e| CliError::config(e.to_string()))?;

        if args.request_timeout == 0 {
            return Err(CliError::config("request timeout must be at least 1 second"));
        }

        Ok(Self {
            instance_url: non_blank(args.instance_url.as_deref()),
            access_token: non_blank(args.access_token.as_deref()),
            api_version,
            poll,
            request_timeout: Duration::from_secs(args.request_timeout),
            metadata_map: args.metadata_map.clone(),
        })
    }

    /// Credentials for commands that talk to the org
    pub fn credentials(&self) -> Result<OrgCredentials> {
        let instance_url = self
            .instance_url
            .as_deref()
            .ok_or_else(|| CliError::config("ORG_INSTANCE_URL (--instance-url) is not set"))?;
        let access_token = self
            .access_token
            .as_deref()
            .ok_or_else(|| CliError::config("ORG_ACCESS_TOKEN (--access-token) is not set"))?;

        Ok(OrgCredentials::new(
            instance_url,
            access_token,
            self.api_version.clone(),
        )?)
    }

    pub fn client(&self) -> Result<OrgClient> {
        Ok(OrgClient::with_timeout(
            self.credentials()?,
            self.request_timeout,
        )?)
    }

    /// The override table when one is configured, the bundled table otherwise
    pub fn manifest_table(&self) -> Result<Cow<'static, ManifestTable>> {
        match &self.metadata_map {
            Some(path) => Ok(Cow::Owned(ManifestTable::load(path)?)),
            None => Ok(Cow::Borrowed(ManifestTable::bundled()?)),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
