//! Domain types shared across the workspace.
//!
//! External payloads are loosely shaped, so most fields are optional. Every
//! optional field has an accessor returning a fixed placeholder, which lets
//! renderers stay total.

use serde::{Deserialize, Serialize};
use url::Url;

/// Relation kind used by Azure Boards for uploaded files.
pub const ATTACHED_FILE_REL: &str = "AttachedFile";

/// Query parameter carrying the attachment file name.
const FILE_NAME_PARAM: &str = "fileName";

pub const NO_TITLE: &str = "<no title>";
pub const NO_STATE: &str = "<no state>";
pub const NO_SPRINT: &str = "<no sprint>";
pub const UNNAMED_ATTACHMENT: &str = "<unnamed>";
pub const UNKNOWN_AUTHOR: &str = "<unknown author>";
pub const UNKNOWN_DATE: &str = "<unknown date>";

// =============================================================================
// Work items
// =============================================================================

/// A work item as seen by the tools.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkItem {
    pub id: u64,
    pub title: Option<String>,
    pub state: Option<String>,
    /// Team project name (`System.TeamProject`)
    pub project: Option<String>,
    /// Iteration path (`System.IterationPath`)
    pub sprint: Option<String>,
    /// User story format field, HTML
    pub user_story_html: Option<String>,
    /// Description field, HTML
    pub description_html: Option<String>,
    /// Browser URL of the work item edit page
    pub web_url: String,
    pub relations: Vec<Relation>,
}

/// A typed link from a work item to another entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub rel: String,
    pub url: String,
    /// `attributes.name`, present on attachment relations
    pub name: Option<String>,
}

/// An uploaded file derived from an `AttachedFile` relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub url: String,
}

impl WorkItem {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(NO_TITLE)
    }

    pub fn state(&self) -> &str {
        self.state.as_deref().unwrap_or(NO_STATE)
    }

    pub fn sprint(&self) -> &str {
        self.sprint.as_deref().unwrap_or(NO_SPRINT)
    }

    /// Attachments in relation order.
    pub fn attachments(&self) -> Vec<Attachment> {
        self.relations
            .iter()
            .filter(|r| r.rel == ATTACHED_FILE_REL)
            .map(Attachment::from_relation)
            .collect()
    }
}

impl Attachment {
    /// Derive an attachment from a relation.
    ///
    /// The relation URL gets a percent-encoded `fileName` parameter so that
    /// downloads keep the original name. Relations without a name keep their
    /// URL untouched.
    pub fn from_relation(relation: &Relation) -> Self {
        match relation.name.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => Self {
                name: name.to_string(),
                url: with_file_name(&relation.url, name),
            },
            None => Self {
                name: UNNAMED_ATTACHMENT.to_string(),
                url: relation.url.clone(),
            },
        }
    }
}

/// Set the `fileName` query parameter of a URL, replacing any existing one.
///
/// URLs that do not parse are returned unchanged.
pub fn with_file_name(url: &str, name: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| *key != FILE_NAME_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    parsed
        .query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(FILE_NAME_PARAM, name);

    parsed.into()
}

/// Read the `fileName` query parameter from a URL, decoded.
pub fn file_name_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let name = parsed
        .query_pairs()
        .find(|(key, _)| *key == FILE_NAME_PARAM)
        .map(|(_, value)| value.into_owned())?;

    (!name.is_empty()).then_some(name)
}

// =============================================================================
// Comments
// =============================================================================

/// A comment on a work item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Comment {
    pub id: u64,
    pub author: Option<String>,
    pub created_date: Option<String>,
    pub modified_date: Option<String>,
    /// Comment body, HTML
    pub text: Option<String>,
}

impl Comment {
    pub fn author(&self) -> &str {
        self.author.as_deref().unwrap_or(UNKNOWN_AUTHOR)
    }

    /// Modified date, only when it differs from the created date.
    pub fn distinct_modified_date(&self) -> Option<&str> {
        match (&self.modified_date, &self.created_date) {
            (Some(modified), Some(created)) if modified == created => None,
            (Some(modified), _) => Some(modified.as_str()),
            (None, _) => None,
        }
    }
}

/// A page of comments together with the total available.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentList {
    pub total_count: usize,
    pub comments: Vec<Comment>,
}

// =============================================================================
// Fetched content
// =============================================================================

/// Raw response of an authenticated GET to an arbitrary URL.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedContent {
    pub url: String,
    /// Raw `content-type` header value
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl FetchedContent {
    /// MIME type without parameters, lowercased.
    pub fn mime_type(&self) -> String {
        self.content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .map(|m| m.trim().to_ascii_lowercase())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "application/octet-stream".to_string())
    }
}
