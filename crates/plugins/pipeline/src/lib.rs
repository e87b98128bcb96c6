//! Output pipeline for tool results.
//!
//! This crate turns provider data into the text handed back to the agent:
//!
//! - **HTML**: Convert rich-text fields and comments to Markdown
//! - **Markdown**: Render work items, work item lists, and comments
//! - **JSON**: Serialize attachment lists
//!
//! # Example
//!
//! ```ignore
//! use boards_pipeline::markdown::work_item_to_markdown;
//!
//! let text = work_item_to_markdown(&work_item);
//! ```

pub mod html;
pub mod markdown;

pub use html::html_to_markdown;

use boards_core::{Attachment, Result};

/// Serialize attachments as a pretty-printed JSON array of `{name, url}`.
pub fn attachments_to_json(attachments: &[Attachment]) -> Result<String> {
    Ok(serde_json::to_string_pretty(attachments)?)
}
