//! Provider trait for work-item-tracking services.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Comment, CommentList, FetchedContent, WorkItem};

/// Maximum number of ids accepted by one batch work item request.
pub const MAX_WORK_ITEMS_PER_REQUEST: usize = 200;

/// Read access to a work-item-tracking service (Azure Boards).
#[async_trait]
pub trait WorkItemProvider: Send + Sync {
    /// Get the provider name (e.g., "azure-devops")
    fn provider_name(&self) -> &'static str;

    /// Get a single work item with its relations expanded.
    ///
    /// Returns `Ok(None)` when the work item does not exist.
    async fn get_work_item(&self, id: u64) -> Result<Option<WorkItem>>;

    /// Ids of work items assigned to the authenticated user in an active
    /// state, most recently changed first.
    async fn query_my_work_item_ids(&self) -> Result<Vec<u64>>;

    /// Fetch work items in one request, in the order of `ids`.
    ///
    /// Callers must not pass more than [`MAX_WORK_ITEMS_PER_REQUEST`] ids.
    async fn get_work_items(&self, ids: &[u64]) -> Result<Vec<WorkItem>>;

    /// Most recent comments of a work item, newest first.
    async fn get_comments(&self, project: &str, work_item_id: u64, top: u32)
        -> Result<CommentList>;

    /// A single comment of a work item.
    async fn get_comment(&self, project: &str, work_item_id: u64, comment_id: u64)
        -> Result<Comment>;

    /// Authenticated GET of an arbitrary URL, buffering the full body.
    async fn fetch(&self, url: &str) -> Result<FetchedContent>;
}
