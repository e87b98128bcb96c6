//! Core traits, types, and error handling for boards-mcp.
//!
//! This crate provides the foundational abstractions shared by the Azure DevOps
//! client, the output pipeline, and the MCP server.

pub mod config;
pub mod error;
pub mod provider;
pub mod types;

pub use config::{Config, Credentials};
pub use error::{Error, Result};
pub use provider::{WorkItemProvider, MAX_WORK_ITEMS_PER_REQUEST};
pub use types::{
    Attachment, Comment, CommentList, FetchedContent, Relation, WorkItem, ATTACHED_FILE_REL,
};
