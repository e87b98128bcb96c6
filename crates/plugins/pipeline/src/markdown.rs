//! Markdown rendering for tool output.
//!
//! Every renderer is total: missing fields are replaced with placeholders
//! from `boards_core::types`, so rendering never fails.

use boards_core::types::UNKNOWN_DATE;
use boards_core::{Comment, CommentList, WorkItem};
use chrono::{DateTime, Utc};

use crate::html::html_field_to_markdown;

const NO_USER_STORY: &str = "<no user story>";
const NO_DESCRIPTION: &str = "<no description>";
const EMPTY_COMMENT: &str = "<empty comment>";

/// Separator between comment sections.
const COMMENT_SEPARATOR: &str = "\n\n---\n\n";

// ============================================================================
// Work items
// ============================================================================

/// Render a work item as a Markdown document.
///
/// The "Attachments" section only appears when the work item has at least
/// one attached file.
pub fn work_item_to_markdown(item: &WorkItem) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "# [{}]({})\n\n",
        escape_link_text(item.title()),
        item.web_url
    ));
    output.push_str(&format!("**State:** {}\n\n", item.state()));

    output.push_str("## User Story\n\n");
    output.push_str(&html_field_to_markdown(
        item.user_story_html.as_deref(),
        NO_USER_STORY,
    ));
    output.push_str("\n\n");

    output.push_str("## Description\n\n");
    output.push_str(&html_field_to_markdown(
        item.description_html.as_deref(),
        NO_DESCRIPTION,
    ));
    output.push('\n');

    let attachments = item.attachments();
    if !attachments.is_empty() {
        output.push_str("\n## Attachments\n\n");
        for attachment in &attachments {
            output.push_str(&format!(
                "- [{}]({})\n",
                escape_link_text(&attachment.name),
                attachment.url
            ));
        }
    }

    output
}

/// Escape brackets so `text` cannot close a Markdown link label early.
fn escape_link_text(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]")
}

/// Render work items as one bullet per item, in the given order.
pub fn work_item_list_to_markdown(items: &[WorkItem]) -> String {
    items
        .iter()
        .map(|item| {
            format!(
                "- #{} – {} (**{}**) - {}",
                item.id,
                item.title(),
                item.state(),
                item.sprint()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Comments
// ============================================================================

/// Render a page of comments for a work item.
///
/// When the work item has more comments than `limit`, the header warns that
/// the list is truncated.
pub fn comments_to_markdown(work_item_id: u64, list: &CommentList, limit: u32) -> String {
    let mut output = String::new();

    if list.total_count > limit as usize {
        output.push_str(&format!("## Comments on work item #{}\n\n", work_item_id));
        output.push_str(&format!(
            "> **Warning:** showing the {} most recent of {} comments (limit: {}). \
             Increase `limit` to see more.\n\n",
            list.comments.len(),
            list.total_count,
            limit
        ));
    } else {
        output.push_str(&format!(
            "## Comments on work item #{} ({} total)\n\n",
            work_item_id, list.total_count
        ));
    }

    let sections: Vec<String> = list.comments.iter().map(comment_section).collect();
    output.push_str(&sections.join(COMMENT_SEPARATOR));
    output.push('\n');

    output
}

fn comment_section(comment: &Comment) -> String {
    format!(
        "### Comment #{}\n**Author:** {}\n**Date:** {}\n\n{}",
        comment.id,
        comment.author(),
        format_date(comment.created_date.as_deref()),
        html_field_to_markdown(comment.text.as_deref(), EMPTY_COMMENT)
    )
}

/// Render a single comment with created and (if distinct) modified dates.
pub fn comment_to_markdown(comment: &Comment) -> String {
    let mut output = String::new();

    output.push_str(&format!("### Comment #{}\n", comment.id));
    output.push_str(&format!("**Author:** {}\n", comment.author()));
    output.push_str(&format!(
        "**Created:** {}\n",
        format_date(comment.created_date.as_deref())
    ));
    if let Some(modified) = comment.distinct_modified_date() {
        output.push_str(&format!("**Modified:** {}\n", format_date(Some(modified))));
    }
    output.push('\n');
    output.push_str(&html_field_to_markdown(
        comment.text.as_deref(),
        EMPTY_COMMENT,
    ));
    output.push('\n');

    output
}

/// Format an API timestamp for display.
///
/// RFC 3339 values are shown in UTC; anything else is passed through.
pub fn format_date(raw: Option<&str>) -> String {
    match raw {
        Some(value) => DateTime::parse_from_rfc3339(value)
            .map(|dt| {
                dt.with_timezone(&Utc)
                    .format("%Y-%m-%d %H:%M UTC")
                    .to_string()
            })
            .unwrap_or_else(|_| value.to_string()),
        None => UNKNOWN_DATE.to_string(),
    }
}
