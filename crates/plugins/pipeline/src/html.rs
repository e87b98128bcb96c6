//! HTML to Markdown conversion.
//!
//! Azure Boards stores rich-text fields and comments as HTML fragments.

/// Convert an HTML fragment to Markdown.
pub fn html_to_markdown(html: &str) -> String {
    html2md::parse_html(html).trim().to_string()
}

/// Convert an optional HTML field, using `placeholder` when it is absent or
/// converts to nothing.
pub fn html_field_to_markdown(html: Option<&str>, placeholder: &str) -> String {
    html.map(html_to_markdown)
        .filter(|md| !md.is_empty())
        .unwrap_or_else(|| placeholder.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_paragraph() {
        assert_eq!(html_to_markdown("<p>Hello world</p>"), "Hello world");
    }

    #[test]
    fn test_inline_formatting() {
        let md = html_to_markdown(
            "<div>Login <b>fails</b> on <a href=\"https://x.test\">mobile</a></div>",
        );
        assert!(md.contains("**fails**"));
        assert!(md.contains("[mobile](https://x.test)"));
        assert!(!md.contains("<b>"));
    }

    #[test]
    fn test_field_placeholder() {
        assert_eq!(html_field_to_markdown(None, "<none>"), "<none>");
        assert_eq!(html_field_to_markdown(Some("   "), "<none>"), "<none>");
        assert_eq!(html_field_to_markdown(Some("<p>x</p>"), "<none>"), "x");
    }
}
