//! orgpush Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, logging setup, and error handling for the orgpush workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`CommonError`] and the crate [`Result`] alias
//! - **Logging**: `tracing` subscriber configuration shared by every binary
//! - **Types**: org credentials, API versions, and job identity
//!
//! # Example
//!
//! ```no_run
//! use orgpush_common::types::{ApiVersion, OrgCredentials};
//!
//! fn connect() -> orgpush_common::Result<()> {
//!     let creds = OrgCredentials::new(
//!         "https://example.my.salesforce.com",
//!         "00D...token",
//!         ApiVersion::default(),
//!     )?;
//!     println!("Deploying to {}", creds.instance_url());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{CommonError, Result};
pub use types::{ApiVersion, Job, JobKind, OrgCredentials};
