//! Azure DevOps API response types.
//!
//! These types represent the raw JSON responses from the work item tracking
//! REST API. They are deserialized and then mapped to unified types.

use serde::{Deserialize, Serialize};

// =============================================================================
// Work items
// =============================================================================

/// Work item representation.
#[derive(Debug, Clone, Deserialize)]
pub struct AdoWorkItem {
    /// Work item ID
    pub id: u64,
    /// Field values, only the interpreted ones are kept
    #[serde(default)]
    pub fields: AdoWorkItemFields,
    /// Relations, present when requested with `$expand=relations`
    #[serde(default)]
    pub relations: Vec<AdoRelation>,
}

/// Work item fields read by the tools.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdoWorkItemFields {
    #[serde(default, rename = "System.Title")]
    pub title: Option<String>,
    #[serde(default, rename = "System.State")]
    pub state: Option<String>,
    #[serde(default, rename = "System.TeamProject")]
    pub team_project: Option<String>,
    #[serde(default, rename = "System.IterationPath")]
    pub iteration_path: Option<String>,
    /// HTML
    #[serde(default, rename = "System.Description")]
    pub description: Option<String>,
    /// HTML, process-specific custom field
    #[serde(default, rename = "Custom.UserStoryFormat")]
    pub user_story_format: Option<String>,
}

/// Work item relation.
#[derive(Debug, Clone, Deserialize)]
pub struct AdoRelation {
    /// Relation type (e.g., "AttachedFile", "System.LinkTypes.Related")
    pub rel: String,
    /// Target URL
    pub url: String,
    #[serde(default)]
    pub attributes: AdoRelationAttributes,
}

/// Relation attributes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdoRelationAttributes {
    /// File name for attachments, link name otherwise
    #[serde(default)]
    pub name: Option<String>,
}

/// Response of the batch work item endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AdoWorkItemList {
    #[serde(default)]
    pub count: Option<u32>,
    /// Requested work items in request order; `null` for omitted ids
    #[serde(default)]
    pub value: Vec<Option<AdoWorkItem>>,
}

// =============================================================================
// WIQL
// =============================================================================

/// WIQL query request body.
#[derive(Debug, Clone, Serialize)]
pub struct WiqlPayload {
    pub query: String,
}

/// WIQL query result (flat queries only).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WiqlResult {
    #[serde(default)]
    pub work_items: Vec<WorkItemReference>,
}

/// Reference to a work item returned by WIQL.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkItemReference {
    pub id: u64,
}

// =============================================================================
// Comments
// =============================================================================

/// Identity reference.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdoIdentityRef {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub unique_name: Option<String>,
}

/// Work item comment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdoComment {
    pub id: u64,
    /// HTML body
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub created_by: Option<AdoIdentityRef>,
    #[serde(default)]
    pub created_date: Option<String>,
    #[serde(default)]
    pub modified_date: Option<String>,
}

/// Comment list response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdoCommentList {
    /// Total comments on the work item, regardless of `$top`
    #[serde(default)]
    pub total_count: Option<u32>,
    /// Comments in this page
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub comments: Vec<AdoComment>,
}
