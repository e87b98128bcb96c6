//! Azure DevOps API client implementation.
//!
//! One client is one connection to an organization: it owns the personal
//! access token and a lazily built `reqwest::Client` that every request
//! reuses. Requests authenticate with HTTP Basic auth, empty username and the
//! token as password.

use async_trait::async_trait;
use boards_core::{
    Comment, CommentList, Error, FetchedContent, Relation, Result, WorkItem, WorkItemProvider,
    MAX_WORK_ITEMS_PER_REQUEST,
};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::types::{
    AdoComment, AdoCommentList, AdoWorkItem, AdoWorkItemList, WiqlPayload, WiqlResult,
};

/// API version for stable work item tracking endpoints.
const API_VERSION: &str = "7.1";

/// API version for the comments endpoints, which are only available as preview.
const COMMENTS_API_VERSION: &str = "7.1-preview.4";

/// Fields requested for list rendering.
const LIST_FIELDS: &str =
    "System.Id,System.Title,System.State,System.TeamProject,System.IterationPath";

/// Work items assigned to the caller in an active workflow state.
const MY_WORK_ITEMS_WIQL: &str = "SELECT [System.Id] FROM WorkItems \
WHERE [System.AssignedTo] = @Me \
AND [System.State] IN ('Development', 'In Review', 'Merged', 'New', 'Requirements') \
ORDER BY [System.ChangedDate] DESC";

/// Azure DevOps API client.
pub struct AzureDevOpsClient {
    organization_url: String,
    token: String,
    http: OnceCell<reqwest::Client>,
}

impl AzureDevOpsClient {
    /// Create a new client for an organization (e.g., `https://dev.azure.com/contoso`).
    ///
    /// Fails with [`Error::Config`] if either value is empty.
    pub fn new(organization_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let organization_url = organization_url.into().trim().trim_end_matches('/').to_string();
        let token = token.into().trim().to_string();

        if organization_url.is_empty() {
            return Err(Error::Config("Organization URL must not be empty".to_string()));
        }
        if token.is_empty() {
            return Err(Error::Config("Access token must not be empty".to_string()));
        }

        Ok(Self {
            organization_url,
            token,
            http: OnceCell::new(),
        })
    }

    /// Organization base URL without trailing slash.
    pub fn organization_url(&self) -> &str {
        &self.organization_url
    }

    /// Shared HTTP client, built on first use.
    ///
    /// Concurrent first callers wait for the same initialization.
    pub async fn http(&self) -> Result<&reqwest::Client> {
        self.http
            .get_or_try_init(|| async {
                debug!(org = %self.organization_url, "Creating Azure DevOps HTTP client");
                reqwest::Client::builder()
                    .user_agent("boards-mcp")
                    .build()
                    .map_err(|e| Error::Http(format!("Failed to create HTTP client: {}", e)))
            })
            .await
    }

    /// Build request with auth header.
    async fn request(&self, method: reqwest::Method, url: &str) -> Result<reqwest::RequestBuilder> {
        Ok(self
            .http()
            .await?
            .request(method, url)
            .basic_auth("", Some(&self.token)))
    }

    /// Make an authenticated GET request.
    async fn get<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(url = url, "Azure DevOps GET request");

        let response = self
            .request(reqwest::Method::GET, url)
            .await?
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Make an authenticated POST request.
    async fn post<T: serde::de::DeserializeOwned, B: serde::Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T> {
        debug!(url = url, "Azure DevOps POST request");

        let response = self
            .request(reqwest::Method::POST, url)
            .await?
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Handle response and map errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let status_code = status.as_u16();
            let message = response.text().await.unwrap_or_default();
            warn!(
                status = status_code,
                message = message,
                "Azure DevOps API error response"
            );
            return Err(Error::from_status(status_code, message));
        }

        response
            .json()
            .await
            .map_err(|e| Error::InvalidData(format!("Failed to parse response: {}", e)))
    }

    fn comments_base_url(&self, project: &str, work_item_id: u64) -> String {
        format!(
            "{}/{}/_apis/wit/workItems/{}/comments",
            self.organization_url,
            urlencoding::encode(project),
            work_item_id
        )
    }
}

// =============================================================================
// Mapping
// =============================================================================

/// Browser URL of the work item edit page.
fn edit_url(organization_url: &str, project: Option<&str>, id: u64) -> String {
    match project {
        Some(project) => format!(
            "{}/{}/_workitems/edit/{}",
            organization_url,
            urlencoding::encode(project),
            id
        ),
        None => format!("{}/_workitems/edit/{}", organization_url, id),
    }
}

fn map_work_item(item: AdoWorkItem, organization_url: &str) -> WorkItem {
    let fields = item.fields;
    WorkItem {
        id: item.id,
        web_url: edit_url(organization_url, fields.team_project.as_deref(), item.id),
        title: fields.title,
        state: fields.state,
        project: fields.team_project,
        sprint: fields.iteration_path,
        user_story_html: fields.user_story_format,
        description_html: fields.description,
        relations: item
            .relations
            .into_iter()
            .map(|r| Relation {
                rel: r.rel,
                url: r.url,
                name: r.attributes.name,
            })
            .collect(),
    }
}

fn map_comment(comment: AdoComment) -> Comment {
    Comment {
        id: comment.id,
        author: comment
            .created_by
            .and_then(|u| u.display_name.or(u.unique_name)),
        created_date: comment.created_date,
        modified_date: comment.modified_date,
        text: comment.text,
    }
}

fn map_comment_list(list: AdoCommentList) -> CommentList {
    let comments: Vec<Comment> = list.comments.into_iter().map(map_comment).collect();
    let total_count = list
        .total_count
        .map(|t| t as usize)
        .unwrap_or(comments.len())
        .max(comments.len());
    CommentList {
        total_count,
        comments,
    }
}

// =============================================================================
// Trait implementation
// =============================================================================

#[async_trait]
impl WorkItemProvider for AzureDevOpsClient {
    fn provider_name(&self) -> &'static str {
        "azure-devops"
    }

    async fn get_work_item(&self, id: u64) -> Result<Option<WorkItem>> {
        let url = format!(
            "{}/_apis/wit/workitems/{}?$expand=relations&api-version={}",
            self.organization_url, id, API_VERSION
        );

        match self.get::<AdoWorkItem>(&url).await {
            Ok(item) => Ok(Some(map_work_item(item, &self.organization_url))),
            Err(e) if e.is_not_found() => {
                debug!(id = id, "Work item not found");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn query_my_work_item_ids(&self) -> Result<Vec<u64>> {
        let url = format!(
            "{}/_apis/wit/wiql?api-version={}",
            self.organization_url, API_VERSION
        );
        let payload = WiqlPayload {
            query: MY_WORK_ITEMS_WIQL.to_string(),
        };

        let result: WiqlResult = self.post(&url, &payload).await?;
        let ids: Vec<u64> = result.work_items.into_iter().map(|r| r.id).collect();

        debug!(count = ids.len(), "WIQL query returned work item ids");
        Ok(ids)
    }

    async fn get_work_items(&self, ids: &[u64]) -> Result<Vec<WorkItem>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        if ids.len() > MAX_WORK_ITEMS_PER_REQUEST {
            return Err(Error::InvalidArguments(format!(
                "At most {} work items can be fetched per request, got {}",
                MAX_WORK_ITEMS_PER_REQUEST,
                ids.len()
            )));
        }

        let id_list = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let url = format!(
            "{}/_apis/wit/workitems?ids={}&fields={}&errorPolicy=omit&api-version={}",
            self.organization_url, id_list, LIST_FIELDS, API_VERSION
        );

        let list: AdoWorkItemList = self.get(&url).await?;
        debug!(
            requested = ids.len(),
            returned = list.count.unwrap_or(list.value.len() as u32),
            "Fetched work item batch"
        );

        // Omitted (deleted or inaccessible) ids come back as nulls
        Ok(list
            .value
            .into_iter()
            .flatten()
            .map(|item| map_work_item(item, &self.organization_url))
            .collect())
    }

    async fn get_comments(
        &self,
        project: &str,
        work_item_id: u64,
        top: u32,
    ) -> Result<CommentList> {
        let url = format!(
            "{}?$top={}&order=desc&api-version={}",
            self.comments_base_url(project, work_item_id),
            top,
            COMMENTS_API_VERSION
        );

        let list: AdoCommentList = self.get(&url).await?;
        Ok(map_comment_list(list))
    }

    async fn get_comment(
        &self,
        project: &str,
        work_item_id: u64,
        comment_id: u64,
    ) -> Result<Comment> {
        let url = format!(
            "{}/{}?api-version={}",
            self.comments_base_url(project, work_item_id),
            comment_id,
            COMMENTS_API_VERSION
        );

        let comment: AdoComment = self.get(&url).await?;
        Ok(map_comment(comment))
    }

    async fn fetch(&self, url: &str) -> Result<FetchedContent> {
        debug!(url = url, "Azure DevOps fetch");

        let response = self
            .request(reqwest::Method::GET, url)
            .await?
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), url = url, "Fetch returned non-success status");
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Http(format!("Failed to read response body: {}", e)))?;

        Ok(FetchedContent {
            url: url.to_string(),
            content_type,
            body: body.to_vec(),
        })
    }
}
