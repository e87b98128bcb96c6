//! Azure DevOps Boards provider implementation for boards-mcp.
//!
//! This crate talks to the work item tracking REST API (work items, WIQL,
//! comments) and to arbitrary attachment URLs using a personal access token.

mod client;
mod types;

pub use client::AzureDevOpsClient;
pub use types::*;
