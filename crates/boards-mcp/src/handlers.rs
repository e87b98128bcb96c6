//! Tool handlers for MCP server.
//!
//! This module implements the tool execution logic: argument validation,
//! provider calls, and rendering through the pipeline.
//!
//! Every failure is reported inside the tool result (`isError: true`), never
//! as a JSON-RPC error. Expected absences (unknown work item, no comments,
//! a 404 from the comments endpoint) are plain text results.

use std::sync::Arc;

use base64::Engine;
use boards_core::types::file_name_from_url;
use boards_core::{Error, FetchedContent, Result, WorkItemProvider, MAX_WORK_ITEMS_PER_REQUEST};
use boards_pipeline::attachments_to_json;
use boards_pipeline::markdown::{
    comment_to_markdown, comments_to_markdown, work_item_list_to_markdown, work_item_to_markdown,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::protocol::{EmbeddedResource, ToolCallResult, ToolDefinition, ToolResultContent};

pub const GET_WORK_ITEM: &str = "get-work-item";
pub const LIST_MY_WORK_ITEMS: &str = "list-my-work-items";
pub const LIST_ATTACHMENTS: &str = "list-attachments";
pub const FETCH_URL: &str = "fetch-url";
pub const LIST_COMMENTS: &str = "list-comments";
pub const GET_COMMENT: &str = "get-comment";

/// Reply when the assignment query matches nothing.
pub const NO_WORK_ITEMS_MESSAGE: &str = "No work items assigned to you.";

const DEFAULT_COMMENT_LIMIT: u32 = 100;

/// Tool handler that executes tools using a work item provider.
pub struct ToolHandler {
    provider: Arc<dyn WorkItemProvider>,
}

impl ToolHandler {
    /// Create a new tool handler backed by `provider`.
    pub fn new(provider: Arc<dyn WorkItemProvider>) -> Self {
        Self { provider }
    }

    /// Name of the backing provider.
    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    /// Get available tool definitions.
    pub fn available_tools(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition {
                name: GET_WORK_ITEM.to_string(),
                description: "Get an Azure Boards work item as Markdown: title, state, \
                              user story, description, and attachments"
                    .to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "description": "Work item ID" }
                    },
                    "required": ["id"]
                }),
            },
            ToolDefinition {
                name: LIST_MY_WORK_ITEMS.to_string(),
                description: "List active work items assigned to you, most recently \
                              changed first"
                    .to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {}
                }),
            },
            ToolDefinition {
                name: LIST_ATTACHMENTS.to_string(),
                description: "List the attachments of a work item as JSON (name and \
                              download URL)"
                    .to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "description": "Work item ID" }
                    },
                    "required": ["id"]
                }),
            },
            ToolDefinition {
                name: FETCH_URL.to_string(),
                description: "Download a URL with Azure DevOps credentials (e.g. an \
                              attachment URL). Images and text are returned inline, \
                              other content as an embedded resource"
                    .to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "url": { "type": "string", "description": "URL to fetch" },
                        "name": {
                            "type": "string",
                            "description": "Display name (default: the URL's fileName parameter)"
                        }
                    },
                    "required": ["url"]
                }),
            },
            ToolDefinition {
                name: LIST_COMMENTS.to_string(),
                description: "List the most recent comments of a work item as Markdown"
                    .to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "ticket": { "type": "integer", "description": "Work item ID" },
                        "limit": {
                            "type": "integer",
                            "description": "Maximum number of comments (default: 100)",
                            "minimum": 1,
                            "default": DEFAULT_COMMENT_LIMIT
                        }
                    },
                    "required": ["ticket"]
                }),
            },
            ToolDefinition {
                name: GET_COMMENT.to_string(),
                description: "Get a single comment of a work item as Markdown".to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "comment_id": { "type": "integer", "description": "Comment ID" },
                        "ticket": { "type": "integer", "description": "Work item ID" }
                    },
                    "required": ["comment_id", "ticket"]
                }),
            },
        ]
    }

    /// Execute a tool by name with arguments.
    pub async fn execute(&self, name: &str, arguments: Option<Value>) -> ToolCallResult {
        let result = match name {
            GET_WORK_ITEM => match parse_args(arguments) {
                Ok(params) => self.get_work_item(params).await,
                Err(e) => Err(e),
            },
            LIST_MY_WORK_ITEMS => self.list_my_work_items().await,
            LIST_ATTACHMENTS => match parse_args(arguments) {
                Ok(params) => self.list_attachments(params).await,
                Err(e) => Err(e),
            },
            FETCH_URL => match parse_args(arguments) {
                Ok(params) => self.fetch_url(params).await,
                Err(e) => Err(e),
            },
            LIST_COMMENTS => match parse_args(arguments) {
                Ok(params) => self.list_comments(params).await,
                Err(e) => Err(e),
            },
            GET_COMMENT => match parse_args(arguments) {
                Ok(params) => self.get_comment(params).await,
                Err(e) => Err(e),
            },
            _ => return ToolCallResult::error(format!("Unknown tool: {}", name)),
        };

        result.unwrap_or_else(|e| {
            tracing::warn!(
                tool = name,
                provider = self.provider_name(),
                error = %e,
                "Tool call failed"
            );
            ToolCallResult::error(format!("{} failed: {}", name, e))
        })
    }

    /// Handle get-work-item tool call.
    async fn get_work_item(&self, params: WorkItemParams) -> Result<ToolCallResult> {
        let Some(item) = self.provider.get_work_item(params.id).await? else {
            return Ok(ToolCallResult::text(work_item_not_found(params.id)));
        };

        Ok(ToolCallResult::text(work_item_to_markdown(&item)))
    }

    /// Handle list-my-work-items tool call.
    ///
    /// Ids are fetched in sequential batches; output keeps the query order.
    async fn list_my_work_items(&self) -> Result<ToolCallResult> {
        let ids = self.provider.query_my_work_item_ids().await?;
        if ids.is_empty() {
            return Ok(ToolCallResult::text(NO_WORK_ITEMS_MESSAGE));
        }

        let mut items = Vec::with_capacity(ids.len());
        for batch in ids.chunks(MAX_WORK_ITEMS_PER_REQUEST) {
            items.extend(self.provider.get_work_items(batch).await?);
        }

        tracing::debug!(
            ids = ids.len(),
            items = items.len(),
            "Fetched assigned work items"
        );

        if items.is_empty() {
            return Ok(ToolCallResult::text(NO_WORK_ITEMS_MESSAGE));
        }

        Ok(ToolCallResult::text(work_item_list_to_markdown(&items)))
    }

    /// Handle list-attachments tool call.
    async fn list_attachments(&self, params: WorkItemParams) -> Result<ToolCallResult> {
        let attachments = self
            .provider
            .get_work_item(params.id)
            .await?
            .map(|item| item.attachments())
            .unwrap_or_default();

        Ok(ToolCallResult::text(attachments_to_json(&attachments)?))
    }

    /// Handle fetch-url tool call.
    async fn fetch_url(&self, params: FetchUrlParams) -> Result<ToolCallResult> {
        let name = params
            .name
            .filter(|n| !n.trim().is_empty())
            .or_else(|| file_name_from_url(&params.url));

        let content = self.provider.fetch(&params.url).await?;
        tracing::debug!(
            url = %params.url,
            bytes = content.body.len(),
            mime = %content.mime_type(),
            "Fetched URL"
        );

        Ok(ToolCallResult::content(fetched_to_content(content, name)))
    }

    /// Handle list-comments tool call.
    async fn list_comments(&self, params: ListCommentsParams) -> Result<ToolCallResult> {
        if params.limit == 0 {
            return Err(Error::InvalidArguments("limit must be at least 1".to_string()));
        }

        let project = match self.resolve_project(params.ticket).await? {
            ProjectLookup::Found(project) => project,
            ProjectLookup::Unresolved(message) => return Ok(ToolCallResult::text(message)),
        };

        match self
            .provider
            .get_comments(&project, params.ticket, params.limit)
            .await
        {
            Ok(list) if list.comments.is_empty() => Ok(ToolCallResult::text(format!(
                "No comments found for work item #{}.",
                params.ticket
            ))),
            Ok(list) => Ok(ToolCallResult::text(comments_to_markdown(
                params.ticket,
                &list,
                params.limit,
            ))),
            Err(e) if e.is_not_found() => Ok(ToolCallResult::text(format!(
                "No comments available for work item #{}.",
                params.ticket
            ))),
            Err(Error::Api { status, message }) => Ok(ToolCallResult::error(format!(
                "Failed to fetch comments for work item #{}: HTTP {} - {}",
                params.ticket, status, message
            ))),
            Err(e) => Err(e),
        }
    }

    /// Handle get-comment tool call.
    async fn get_comment(&self, params: GetCommentParams) -> Result<ToolCallResult> {
        let project = match self.resolve_project(params.ticket).await? {
            ProjectLookup::Found(project) => project,
            ProjectLookup::Unresolved(message) => return Ok(ToolCallResult::text(message)),
        };

        match self
            .provider
            .get_comment(&project, params.ticket, params.comment_id)
            .await
        {
            Ok(comment) => Ok(ToolCallResult::text(comment_to_markdown(&comment))),
            Err(e) if e.is_not_found() => Ok(ToolCallResult::text(format!(
                "Comment #{} not found on work item #{}.",
                params.comment_id, params.ticket
            ))),
            Err(Error::Api { status, message }) => Ok(ToolCallResult::error(format!(
                "Failed to fetch comment #{} on work item #{}: HTTP {} - {}",
                params.comment_id, params.ticket, status, message
            ))),
            Err(e) => Err(e),
        }
    }

    /// Find the team project a work item belongs to.
    async fn resolve_project(&self, work_item_id: u64) -> Result<ProjectLookup> {
        let Some(item) = self.provider.get_work_item(work_item_id).await? else {
            return Ok(ProjectLookup::Unresolved(work_item_not_found(work_item_id)));
        };

        Ok(match item.project.filter(|p| !p.is_empty()) {
            Some(project) => ProjectLookup::Found(project),
            None => ProjectLookup::Unresolved(format!(
                "Could not determine the project for work item #{}.",
                work_item_id
            )),
        })
    }
}

enum ProjectLookup {
    Found(String),
    /// Message explaining why the project is unknown
    Unresolved(String),
}

fn work_item_not_found(id: u64) -> String {
    format!("Work item #{} not found.", id)
}

/// Turn fetched bytes into a content block, routed by MIME type prefix:
/// `image/*`, then `text/*`, then anything else as a resource.
pub fn fetched_to_content(content: FetchedContent, name: Option<String>) -> ToolResultContent {
    let mime_type = content.mime_type();
    let encode = |body: &[u8]| base64::engine::general_purpose::STANDARD.encode(body);

    if mime_type.starts_with("image/") {
        ToolResultContent::Image {
            data: encode(&content.body),
            mime_type,
            name,
        }
    } else if mime_type.starts_with("text/") {
        ToolResultContent::Text {
            text: String::from_utf8_lossy(&content.body).into_owned(),
            name,
        }
    } else {
        ToolResultContent::Resource {
            resource: EmbeddedResource {
                blob: encode(&content.body),
                uri: content.url,
                mime_type,
            },
            name,
        }
    }
}

/// Deserialize tool arguments; a missing object is treated as `{}`.
fn parse_args<T: DeserializeOwned>(arguments: Option<Value>) -> Result<T> {
    let value = arguments.unwrap_or_else(|| Value::Object(Default::default()));
    serde_json::from_value(value).map_err(|e| Error::InvalidArguments(e.to_string()))
}

/// Parameters for get-work-item and list-attachments.
#[derive(Debug, Deserialize)]
struct WorkItemParams {
    id: u64,
}

/// Parameters for fetch-url.
#[derive(Debug, Deserialize)]
struct FetchUrlParams {
    url: String,
    #[serde(default)]
    name: Option<String>,
}

/// Parameters for list-comments.
#[derive(Debug, Deserialize)]
struct ListCommentsParams {
    ticket: u64,
    #[serde(default = "default_comment_limit")]
    limit: u32,
}

fn default_comment_limit() -> u32 {
    DEFAULT_COMMENT_LIMIT
}

/// Parameters for get-comment.
#[derive(Debug, Deserialize)]
struct GetCommentParams {
    comment_id: u64,
    ticket: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use boards_core::{Comment, CommentList, Relation, WorkItem, ATTACHED_FILE_REL};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory provider that records batch requests.
    #[derive(Default)]
    struct FakeProvider {
        work_items: HashMap<u64, WorkItem>,
        my_ids: Vec<u64>,
        comments: CommentList,
        /// Status returned by the comments endpoints instead of data
        comments_status: Option<u16>,
        fetched: Option<FetchedContent>,
        batch_calls: Mutex<Vec<Vec<u64>>>,
    }

    impl FakeProvider {
        fn with_work_item(mut self, item: WorkItem) -> Self {
            self.work_items.insert(item.id, item);
            self
        }

        fn batch_calls(&self) -> Vec<Vec<u64>> {
            self.batch_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WorkItemProvider for FakeProvider {
        fn provider_name(&self) -> &'static str {
            "fake"
        }

        async fn get_work_item(&self, id: u64) -> Result<Option<WorkItem>> {
            Ok(self.work_items.get(&id).cloned())
        }

        async fn query_my_work_item_ids(&self) -> Result<Vec<u64>> {
            Ok(self.my_ids.clone())
        }

        async fn get_work_items(&self, ids: &[u64]) -> Result<Vec<WorkItem>> {
            assert!(ids.len() <= MAX_WORK_ITEMS_PER_REQUEST);
            self.batch_calls.lock().unwrap().push(ids.to_vec());
            Ok(ids
                .iter()
                .map(|id| WorkItem {
                    id: *id,
                    title: Some(format!("Item {}", id)),
                    state: Some("New".to_string()),
                    ..Default::default()
                })
                .collect())
        }

        async fn get_comments(
            &self,
            _project: &str,
            _work_item_id: u64,
            top: u32,
        ) -> Result<CommentList> {
            if let Some(status) = self.comments_status {
                return Err(Error::from_status(status, "comments unavailable"));
            }
            let mut list = self.comments.clone();
            list.comments.truncate(top as usize);
            Ok(list)
        }

        async fn get_comment(
            &self,
            _project: &str,
            _work_item_id: u64,
            comment_id: u64,
        ) -> Result<Comment> {
            if let Some(status) = self.comments_status {
                return Err(Error::from_status(status, "comments unavailable"));
            }
            self.comments
                .comments
                .iter()
                .find(|c| c.id == comment_id)
                .cloned()
                .ok_or_else(|| Error::from_status(404, "comment not found"))
        }

        async fn fetch(&self, _url: &str) -> Result<FetchedContent> {
            self.fetched
                .clone()
                .ok_or_else(|| Error::Http("connection refused".to_string()))
        }
    }

    fn sample_work_item() -> WorkItem {
        WorkItem {
            id: 42,
            title: Some("Fix login".to_string()),
            state: Some("Development".to_string()),
            project: Some("Fabrikam".to_string()),
            sprint: Some("Fabrikam\\Sprint 5".to_string()),
            user_story_html: Some("<p>As a user</p>".to_string()),
            description_html: Some("<p>Broken</p>".to_string()),
            web_url: "https://dev.azure.com/contoso/Fabrikam/_workitems/edit/42".to_string(),
            relations: vec![
                Relation {
                    rel: ATTACHED_FILE_REL.to_string(),
                    url: "https://dev.azure.com/contoso/_apis/wit/attachments/a1".to_string(),
                    name: Some("screen shot.png".to_string()),
                },
                Relation {
                    rel: ATTACHED_FILE_REL.to_string(),
                    url: "https://dev.azure.com/contoso/_apis/wit/attachments/a2".to_string(),
                    name: Some("trace.log".to_string()),
                },
            ],
        }
    }

    fn sample_comments(total: usize) -> CommentList {
        CommentList {
            total_count: total,
            comments: (0..total as u64)
                .rev()
                .map(|id| Comment {
                    id: id + 1,
                    author: Some("Ada".to_string()),
                    created_date: Some("2024-03-01T10:00:00Z".to_string()),
                    modified_date: None,
                    text: Some(format!("<p>Comment {}</p>", id + 1)),
                })
                .collect(),
        }
    }

    fn handler(provider: FakeProvider) -> ToolHandler {
        ToolHandler::new(Arc::new(provider))
    }

    fn text_of(result: &ToolCallResult) -> &str {
        result.first_text().expect("text content")
    }

    #[test]
    fn test_provider_name() {
        assert_eq!(handler(FakeProvider::default()).provider_name(), "fake");
    }

    #[test]
    fn test_available_tools() {
        let tools = handler(FakeProvider::default()).available_tools();
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                GET_WORK_ITEM,
                LIST_MY_WORK_ITEMS,
                LIST_ATTACHMENTS,
                FETCH_URL,
                LIST_COMMENTS,
                GET_COMMENT
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let result = handler(FakeProvider::default())
            .execute("delete-work-item", None)
            .await;
        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).contains("Unknown tool"));
    }

    #[tokio::test]
    async fn test_invalid_arguments() {
        let handler = handler(FakeProvider::default());

        let result = handler.execute(GET_WORK_ITEM, None).await;
        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).contains("Invalid arguments"));

        let result = handler
            .execute(GET_WORK_ITEM, Some(serde_json::json!({ "id": "abc" })))
            .await;
        assert_eq!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn test_get_work_item_not_found() {
        let result = handler(FakeProvider::default())
            .execute(GET_WORK_ITEM, Some(serde_json::json!({ "id": 5 })))
            .await;

        assert!(result.is_error.is_none());
        assert_eq!(text_of(&result), "Work item #5 not found.");
    }

    #[tokio::test]
    async fn test_get_work_item() {
        let provider = FakeProvider::default().with_work_item(sample_work_item());
        let result = handler(provider)
            .execute(GET_WORK_ITEM, Some(serde_json::json!({ "id": 42 })))
            .await;

        assert!(result.is_error.is_none());
        let text = text_of(&result);
        assert!(text.starts_with(
            "# [Fix login](https://dev.azure.com/contoso/Fabrikam/_workitems/edit/42)"
        ));
        assert!(text.contains("## Attachments"));
        assert!(text.contains(
            "- [screen shot.png](https://dev.azure.com/contoso/_apis/wit/attachments/a1\
             ?fileName=screen+shot.png)"
        ));
    }

    #[tokio::test]
    async fn test_attachment_urls_match_between_tools() {
        let provider = FakeProvider::default().with_work_item(sample_work_item());
        let handler = handler(provider);
        let args = Some(serde_json::json!({ "id": 42 }));

        let markdown = handler.execute(GET_WORK_ITEM, args.clone()).await;
        let json = handler.execute(LIST_ATTACHMENTS, args).await;

        let attachments: Vec<boards_core::Attachment> =
            serde_json::from_str(text_of(&json)).unwrap();
        assert_eq!(attachments.len(), 2);
        for attachment in &attachments {
            assert!(text_of(&markdown).contains(&format!("]({})", attachment.url)));
        }
    }

    #[tokio::test]
    async fn test_list_attachments_missing_work_item() {
        let result = handler(FakeProvider::default())
            .execute(LIST_ATTACHMENTS, Some(serde_json::json!({ "id": 9 })))
            .await;
        assert_eq!(text_of(&result), "[]");
    }

    #[tokio::test]
    async fn test_list_my_work_items_empty() {
        let provider = Arc::new(FakeProvider::default());
        let handler = ToolHandler::new(provider.clone());

        let result = handler.execute(LIST_MY_WORK_ITEMS, None).await;

        assert_eq!(text_of(&result), NO_WORK_ITEMS_MESSAGE);
        assert!(provider.batch_calls().is_empty());
    }

    #[tokio::test]
    async fn test_list_my_work_items_batches_in_order() {
        // Descending ids so that any re-sorting would be visible
        let ids: Vec<u64> = (1..=450).rev().collect();
        let provider = Arc::new(FakeProvider {
            my_ids: ids.clone(),
            ..Default::default()
        });
        let handler = ToolHandler::new(provider.clone());

        let result = handler.execute(LIST_MY_WORK_ITEMS, None).await;

        let calls = provider.batch_calls();
        let sizes: Vec<usize> = calls.iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![200, 200, 50]);
        assert_eq!(calls.concat(), ids);

        let lines: Vec<&str> = text_of(&result).lines().collect();
        assert_eq!(lines.len(), 450);
        assert_eq!(lines[0], "- #450 – Item 450 (**New**) - <no sprint>");
        assert_eq!(lines[449], "- #1 – Item 1 (**New**) - <no sprint>");
    }

    #[tokio::test]
    async fn test_list_my_work_items_exact_batch() {
        let provider = Arc::new(FakeProvider {
            my_ids: (1..=200).collect(),
            ..Default::default()
        });
        let handler = ToolHandler::new(provider.clone());

        handler.execute(LIST_MY_WORK_ITEMS, None).await;
        assert_eq!(provider.batch_calls().len(), 1);
    }

    #[test]
    fn test_fetch_routing_is_exclusive() {
        let cases = [
            ("image/png", "image"),
            ("IMAGE/JPEG; q=1", "image"),
            ("text/plain; charset=utf-8", "text"),
            ("text/html", "text"),
            ("application/json", "resource"),
            ("application/octet-stream", "resource"),
            ("imagery/x", "resource"),
            ("", "resource"),
        ];

        for (content_type, expected) in cases {
            let content = FetchedContent {
                url: "https://x/file".to_string(),
                content_type: Some(content_type.to_string()),
                body: b"hi".to_vec(),
            };
            let kind = match fetched_to_content(content, None) {
                ToolResultContent::Image { .. } => "image",
                ToolResultContent::Text { .. } => "text",
                ToolResultContent::Resource { .. } => "resource",
            };
            assert_eq!(kind, expected, "content type {:?}", content_type);
        }
    }

    #[tokio::test]
    async fn test_fetch_url_image_uses_file_name_param() {
        let provider = FakeProvider {
            fetched: Some(FetchedContent {
                url: "https://x/a?fileName=shot%20one.png".to_string(),
                content_type: Some("image/png".to_string()),
                body: b"hi".to_vec(),
            }),
            ..Default::default()
        };
        let result = handler(provider)
            .execute(
                FETCH_URL,
                Some(serde_json::json!({ "url": "https://x/a?fileName=shot%20one.png" })),
            )
            .await;

        assert_eq!(
            result.content[0],
            ToolResultContent::Image {
                data: "aGk=".to_string(),
                mime_type: "image/png".to_string(),
                name: Some("shot one.png".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_url_form_encoded_file_name() {
        let url = "https://x/a?fileName=my+report.pdf";
        let provider = FakeProvider {
            fetched: Some(FetchedContent {
                url: url.to_string(),
                content_type: Some("application/pdf".to_string()),
                body: b"%PDF".to_vec(),
            }),
            ..Default::default()
        };
        let result = handler(provider)
            .execute(FETCH_URL, Some(serde_json::json!({ "url": url })))
            .await;

        match &result.content[0] {
            ToolResultContent::Resource { name, .. } => {
                assert_eq!(name.as_deref(), Some("my report.pdf"));
            }
            other => panic!("Expected resource, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_url_text_and_resource() {
        let text_provider = FakeProvider {
            fetched: Some(FetchedContent {
                url: "https://x/notes".to_string(),
                content_type: Some("text/plain".to_string()),
                body: "héllo".as_bytes().to_vec(),
            }),
            ..Default::default()
        };
        let result = handler(text_provider)
            .execute(
                FETCH_URL,
                Some(serde_json::json!({ "url": "https://x/notes", "name": "notes.txt" })),
            )
            .await;
        assert_eq!(
            result.content[0],
            ToolResultContent::Text {
                text: "héllo".to_string(),
                name: Some("notes.txt".to_string()),
            }
        );

        let zip_provider = FakeProvider {
            fetched: Some(FetchedContent {
                url: "https://x/a.zip".to_string(),
                content_type: Some("application/zip".to_string()),
                body: b"PK".to_vec(),
            }),
            ..Default::default()
        };
        let result = handler(zip_provider)
            .execute(FETCH_URL, Some(serde_json::json!({ "url": "https://x/a.zip" })))
            .await;
        assert_eq!(
            result.content[0],
            ToolResultContent::Resource {
                resource: EmbeddedResource {
                    uri: "https://x/a.zip".to_string(),
                    blob: "UEs=".to_string(),
                    mime_type: "application/zip".to_string(),
                },
                name: None,
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_url_transport_error() {
        let result = handler(FakeProvider::default())
            .execute(FETCH_URL, Some(serde_json::json!({ "url": "https://x" })))
            .await;
        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).contains("connection refused"));
    }

    fn comments_provider(total: usize) -> FakeProvider {
        FakeProvider {
            comments: sample_comments(total),
            ..Default::default()
        }
        .with_work_item(sample_work_item())
    }

    #[tokio::test]
    async fn test_list_comments_truncated() {
        let result = handler(comments_provider(5))
            .execute(
                LIST_COMMENTS,
                Some(serde_json::json!({ "ticket": 42, "limit": 2 })),
            )
            .await;

        let text = text_of(&result);
        assert!(text.contains("**Warning:**"));
        assert!(text.contains("2 most recent of 5 comments"));
        assert_eq!(text.matches("### Comment #").count(), 2);
    }

    #[tokio::test]
    async fn test_list_comments_default_limit() {
        let result = handler(comments_provider(5))
            .execute(LIST_COMMENTS, Some(serde_json::json!({ "ticket": 42 })))
            .await;

        let text = text_of(&result);
        assert!(text.contains("(5 total)"));
        assert!(!text.contains("Warning"));
        assert_eq!(text.matches("### Comment #").count(), 5);
    }

    #[tokio::test]
    async fn test_list_comments_empty() {
        let result = handler(comments_provider(0))
            .execute(LIST_COMMENTS, Some(serde_json::json!({ "ticket": 42 })))
            .await;
        assert!(result.is_error.is_none());
        assert_eq!(text_of(&result), "No comments found for work item #42.");
    }

    #[tokio::test]
    async fn test_list_comments_not_found_is_soft() {
        let provider = FakeProvider {
            comments_status: Some(404),
            ..comments_provider(0)
        };
        let result = handler(provider)
            .execute(LIST_COMMENTS, Some(serde_json::json!({ "ticket": 42 })))
            .await;

        assert!(result.is_error.is_none());
        assert_eq!(text_of(&result), "No comments available for work item #42.");
    }

    #[tokio::test]
    async fn test_list_comments_server_error() {
        let provider = FakeProvider {
            comments_status: Some(500),
            ..comments_provider(0)
        };
        let result = handler(provider)
            .execute(LIST_COMMENTS, Some(serde_json::json!({ "ticket": 42 })))
            .await;

        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).contains("HTTP 500 - comments unavailable"));
    }

    #[tokio::test]
    async fn test_list_comments_unresolvable_work_item() {
        let handler = handler(FakeProvider::default().with_work_item(WorkItem {
            id: 7,
            ..Default::default()
        }));

        let missing = handler
            .execute(LIST_COMMENTS, Some(serde_json::json!({ "ticket": 1 })))
            .await;
        assert_eq!(text_of(&missing), "Work item #1 not found.");

        let no_project = handler
            .execute(LIST_COMMENTS, Some(serde_json::json!({ "ticket": 7 })))
            .await;
        assert!(no_project.is_error.is_none());
        assert!(text_of(&no_project).contains("Could not determine the project"));
    }

    #[tokio::test]
    async fn test_list_comments_zero_limit() {
        let result = handler(comments_provider(1))
            .execute(
                LIST_COMMENTS,
                Some(serde_json::json!({ "ticket": 42, "limit": 0 })),
            )
            .await;
        assert_eq!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn test_get_comment() {
        let mut provider = comments_provider(2);
        provider.comments.comments[0].modified_date = Some("2024-03-05T09:00:00Z".to_string());
        let handler = handler(provider);

        // comments are newest first: index 0 is #2
        let edited = handler
            .execute(
                GET_COMMENT,
                Some(serde_json::json!({ "comment_id": 2, "ticket": 42 })),
            )
            .await;
        assert!(text_of(&edited).contains("### Comment #2"));
        assert!(text_of(&edited).contains("**Modified:** 2024-03-05 09:00 UTC"));

        let unedited = handler
            .execute(
                GET_COMMENT,
                Some(serde_json::json!({ "comment_id": 1, "ticket": 42 })),
            )
            .await;
        assert!(!text_of(&unedited).contains("Modified"));
    }

    #[tokio::test]
    async fn test_get_comment_not_found_is_soft() {
        let result = handler(comments_provider(1))
            .execute(
                GET_COMMENT,
                Some(serde_json::json!({ "comment_id": 99, "ticket": 42 })),
            )
            .await;

        assert!(result.is_error.is_none());
        assert_eq!(text_of(&result), "Comment #99 not found on work item #42.");
    }

    #[tokio::test]
    async fn test_get_comment_server_error() {
        let provider = FakeProvider {
            comments_status: Some(500),
            ..comments_provider(1)
        };
        let result = handler(provider)
            .execute(
                GET_COMMENT,
                Some(serde_json::json!({ "comment_id": 1, "ticket": 42 })),
            )
            .await;

        assert_eq!(result.is_error, Some(true));
        let text = text_of(&result);
        assert!(text.starts_with("Failed to fetch comment #1 on work item #42"));
        assert!(text.contains("HTTP 500 - comments unavailable"));
    }
}
