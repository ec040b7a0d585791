//! Structured field extraction for issue-tracker exports.
//!
//! Exports look like:
//!
//! ```text
//! # Crash when saving large files
//!
//! **Issue Number:** #42
//! **State:** open
//! **Author:** @octocat
//! **Labels:** `bug`, `team-engineering`
//!
//! ## Issue Description
//! ...
//! ```
//!
//! The bold suffix on field markers is optional.

use std::sync::LazyLock;

use orgingest_shared::{IngestError, IssueMetadata, Result};
use regex::Regex;

/// Heading where the issue body starts.
pub const ISSUE_DESCRIPTION_HEADING: &str = "## Issue Description";

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Issue Number:(?:\*\*)?[ \t]*#?(\d+)").expect("valid regex"));
static STATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"State:(?:\*\*)?[ \t]*(\w+)").expect("valid regex"));
static AUTHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Author:(?:\*\*)?[ \t]*@?([^\n]+)").expect("valid regex"));
static CREATED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Created:(?:\*\*)?[ \t]*([^\n]+)").expect("valid regex"));
static UPDATED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Updated:(?:\*\*)?[ \t]*([^\n]+)").expect("valid regex"));
static COMMENTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Total Comments:(?:\*\*)?[ \t]*(\d+)").expect("valid regex"));
static LABELS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Labels:(?:\*\*)?[ \t]*([^\n]+)").expect("valid regex"));
static LABEL_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("valid regex"));
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#[ \t]+(.+)$").expect("valid regex"));

/// Parse the fixed issue fields out of `text`.
///
/// Missing fields stay `None`. `labels` defaults to empty and `title` to
/// `fallback_title`. A numeric field that does not fit in `u64` is a
/// [`IngestError::Parse`].
pub fn parse_issue_metadata(text: &str, fallback_title: &str) -> Result<IssueMetadata> {
    let labels = capture(&LABELS_RE, text)
        .map(|line| {
            LABEL_TOKEN_RE
                .captures_iter(line)
                .map(|c| c[1].to_string())
                .collect()
        })
        .unwrap_or_default();

    Ok(IssueMetadata {
        issue_number: capture_number(&NUMBER_RE, text, "issue number")?,
        state: capture(&STATE_RE, text).map(str::to_string),
        author: capture_trimmed(&AUTHOR_RE, text),
        created_at: capture_trimmed(&CREATED_RE, text),
        updated_at: capture_trimmed(&UPDATED_RE, text),
        comment_count: capture_number(&COMMENTS_RE, text, "comment count")?,
        labels,
        title: capture_trimmed(&TITLE_RE, text).unwrap_or_else(|| fallback_title.to_string()),
    })
}

/// The issue body: from the description heading onward, or the whole text.
pub fn issue_body(text: &str) -> &str {
    match text.find(ISSUE_DESCRIPTION_HEADING) {
        Some(pos) => &text[pos..],
        None => text,
    }
}

fn capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

fn capture_trimmed(re: &Regex, text: &str) -> Option<String> {
    capture(re, text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn capture_number(re: &Regex, text: &str, field: &str) -> Result<Option<u64>> {
    capture(re, text)
        .map(|digits| {
            digits
                .parse::<u64>()
                .map_err(|e| IngestError::parse(format!("invalid {field} '{digits}': {e}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = "# Crash when saving large files\n\n\
        **Issue Number:** #42\n\
        **State:** open\n\
        **Author:** @octocat\n\
        **Created:** 2024-03-01T10:00:00Z\n\
        **Updated:** 2024-03-02T11:30:00Z\n\
        **Total Comments:** 7\n\
        **Labels:** `bug`, `team-engineering`, `bug`\n\n\
        ## Issue Description\n\n\
        Saving a 2GB file crashes the editor.\n";

    #[test]
    fn parses_all_fields() {
        let meta = parse_issue_metadata(EXPORT, "issue-42").expect("parse");
        assert_eq!(meta.issue_number, Some(42));
        assert_eq!(meta.state.as_deref(), Some("open"));
        assert_eq!(meta.author.as_deref(), Some("octocat"));
        assert_eq!(meta.created_at.as_deref(), Some("2024-03-01T10:00:00Z"));
        assert_eq!(meta.updated_at.as_deref(), Some("2024-03-02T11:30:00Z"));
        assert_eq!(meta.comment_count, Some(7));
        assert_eq!(meta.labels, ["bug", "team-engineering", "bug"]);
        assert_eq!(meta.title, "Crash when saving large files");
    }

    #[test]
    fn plain_markers_without_bold() {
        let meta = parse_issue_metadata("Issue Number: 7\nState: closed\n", "x").expect("parse");
        assert_eq!(meta.issue_number, Some(7));
        assert_eq!(meta.state.as_deref(), Some("closed"));
    }

    #[test]
    fn missing_fields_are_omitted() {
        let meta = parse_issue_metadata("Just some text.", "issue-9").expect("parse");
        assert_eq!(meta.issue_number, None);
        assert_eq!(meta.state, None);
        assert_eq!(meta.author, None);
        assert_eq!(meta.comment_count, None);
        assert!(meta.labels.is_empty());
        assert_eq!(meta.title, "issue-9");
    }

    #[test]
    fn second_level_heading_is_not_a_title() {
        let meta = parse_issue_metadata("## Issue Description\nbody", "fallback").expect("parse");
        assert_eq!(meta.title, "fallback");
    }

    #[test]
    fn overflowing_number_is_a_parse_error() {
        let err = parse_issue_metadata("Issue Number: 99999999999999999999999", "x").unwrap_err();
        assert!(matches!(err, IngestError::Parse { .. }));
    }

    #[test]
    fn labels_line_without_backticks_is_empty() {
        let meta = parse_issue_metadata("Labels: none\n", "x").expect("parse");
        assert!(meta.labels.is_empty());
    }

    #[test]
    fn body_starts_at_description() {
        assert!(issue_body(EXPORT).starts_with("## Issue Description"));
        assert_eq!(issue_body("no heading"), "no heading");
    }
}
