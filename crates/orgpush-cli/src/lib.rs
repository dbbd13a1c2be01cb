//! orgpush CLI Library
//!
//! Command-line interface for pushing metadata and records into an org.
//!
//! # Overview
//!
//! - **Metadata Deploys**: Package and deploy one metadata document (`orgpush deploy`)
//! - **Dry Runs**: Build the deploy archive without sending it (`orgpush package`)
//! - **Bulk Inserts**: Insert CSV or JSON records into an object (`orgpush ingest`)
//! - **Job Status**: Check a deploy or ingest job once (`orgpush status`)
//! - **Type Table**: List supported metadata types (`orgpush types`)

pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use config::Config;
pub use error::{CliError, Result};

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// orgpush - deploy metadata and records to an org
#[derive(Parser, Debug)]
#[command(name = "orgpush")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Connection and polling settings
    #[command(flatten)]
    pub org: OrgArgs,

    /// Print results as JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print the CLI reference as markdown and exit
    #[arg(long, hide = true)]
    pub markdown_help: bool,
}

/// Settings shared by every command that talks to the org
#[derive(Args, Debug, Clone)]
pub struct OrgArgs {
    /// Org instance URL, e.g. https://example.my.salesforce.com
    #[arg(long, env = "ORG_INSTANCE_URL", global = true)]
    pub instance_url: Option<String>,

    /// OAuth access token for the org
    #[arg(long, env = "ORG_ACCESS_TOKEN", hide_env_values = true, global = true)]
    pub access_token: Option<String>,

    /// Platform API version
    #[arg(long, env = "ORG_API_VERSION", default_value = orgpush_common::types::DEFAULT_API_VERSION, global = true)]
    pub api_version: String,

    /// Seconds between two job status checks
    #[arg(long, env = "ORGPUSH_POLL_INTERVAL_SECS", default_value_t = 3, global = true)]
    pub poll_interval: u64,

    /// Seconds to wait for a job before giving up
    #[arg(long, env = "ORGPUSH_POLL_MAX_WAIT_SECS", default_value_t = 300, global = true)]
    pub max_wait: u64,

    /// Per-request HTTP timeout in seconds
    #[arg(long, env = "ORGPUSH_REQUEST_TIMEOUT_SECS", default_value_t = 30, global = true)]
    pub request_timeout: u64,

    /// Metadata type table to use instead of the bundled one
    #[arg(long, env = "ORGPUSH_METADATA_MAP", global = true)]
    pub metadata_map: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Package a metadata document, deploy it and wait for the result
    Deploy {
        /// Metadata XML document
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Build the deploy archive for a metadata document without sending it
    Package {
        /// Metadata XML document
        #[arg(short, long)]
        file: PathBuf,

        /// Where to write the zip archive
        #[arg(short, long, default_value = "metadata.zip")]
        output: PathBuf,
    },

    /// Insert records from a CSV or JSON file and wait for the result
    Ingest {
        /// CSV file with a header row, or a JSON array of objects
        #[arg(short, long)]
        file: PathBuf,

        /// Target object, e.g. Account
        #[arg(short, long)]
        object: String,
    },

    /// Check a job once, without waiting
    Status {
        #[command(subcommand)]
        command: StatusCommand,
    },

    /// List the metadata types the type table knows about
    Types,
}

/// Job status subcommands
#[derive(Subcommand, Debug)]
pub enum StatusCommand {
    /// Status of a metadata deploy job
    Deploy {
        /// Deploy job id
        job_id: String,
    },

    /// Status of a bulk ingest job
    Ingest {
        /// Ingest job id
        job_id: String,
    },
}
