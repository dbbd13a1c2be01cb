//! REST access to the target org
//!
//! - `client`: authenticated HTTP client shared by both pipelines
//! - `endpoints`: URL builders for the deploy and bulk ingest endpoints
//! - `types`: request and response bodies as they appear on the wire

pub mod client;
pub mod endpoints;
pub mod types;

pub use client::OrgClient;
