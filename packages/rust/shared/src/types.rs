//! Core domain types for the ingestion pipeline.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Fallback category when no configured category matches.
pub const CATEGORY_GENERAL_DOCS: &str = "general_docs";
/// Fallback category for paths/content that look like issue-tracker exports.
pub const CATEGORY_GITHUB_ISSUE: &str = "github_issue";
/// Category assigned to every document ingested via the issue path.
pub const CATEGORY_PRODUCT_FEEDBACK: &str = "product_feedback";

/// Team ownership value when no configured team matches.
pub const UNKNOWN_TEAM: &str = "unknown";

/// Chunk metadata: string keys to JSON scalars/lists.
///
/// Backed by a sorted map so serialized output is byte-stable across runs.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// Which processing path a document takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Documentation page (frontmatter + Markdown body).
    Doc,
    /// Issue-tracker export.
    Issue,
}

/// A raw document as read from its source. Transient: consumed in one pass.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub raw_text: String,
    pub source_kind: SourceKind,
}

impl Document {
    pub fn doc(path: impl Into<PathBuf>, raw_text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            raw_text: raw_text.into(),
            source_kind: SourceKind::Doc,
        }
    }

    pub fn issue(path: impl Into<PathBuf>, raw_text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            raw_text: raw_text.into(),
            source_kind: SourceKind::Issue,
        }
    }

    /// File name without extension, used as the fallback title.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Insight signals
// ---------------------------------------------------------------------------

/// Reading level inferred from keyword tiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityLevel {
    Beginner,
    Intermediate,
    Advanced,
    Technical,
    #[default]
    Unknown,
}

impl ComplexityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
            Self::Technical => "technical",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ComplexityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword-derived flags attached to every chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightSignals {
    pub has_pain_points: bool,
    pub has_value_proposition: bool,
    /// Configured team names mentioned, in configuration order.
    pub mentions_teams: Vec<String>,
    pub customer_context: bool,
    pub complexity_level: ComplexityLevel,
}

impl InsightSignals {
    /// Merge these signals into chunk metadata, overwriting same-named keys.
    pub fn merge_into(&self, metadata: &mut Metadata) {
        metadata.insert("has_pain_points".into(), self.has_pain_points.into());
        metadata.insert(
            "has_value_proposition".into(),
            self.has_value_proposition.into(),
        );
        metadata.insert(
            "mentions_teams".into(),
            serde_json::Value::from(self.mentions_teams.clone()),
        );
        metadata.insert("customer_context".into(), self.customer_context.into());
        metadata.insert(
            "complexity_level".into(),
            self.complexity_level.as_str().into(),
        );
    }
}

// ---------------------------------------------------------------------------
// Issue metadata
// ---------------------------------------------------------------------------

/// Structured fields extracted from an issue-tracker export.
///
/// Absent fields stay `None` and are omitted from chunk metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_count: Option<u64>,
    /// Back-tick delimited labels, in order, duplicates kept.
    #[serde(default)]
    pub labels: Vec<String>,
    pub title: String,
}

impl IssueMetadata {
    /// Merge the present fields into chunk metadata.
    pub fn merge_into(&self, metadata: &mut Metadata) {
        if let Some(n) = self.issue_number {
            metadata.insert("issue_number".into(), n.into());
        }
        if let Some(s) = &self.state {
            metadata.insert("state".into(), s.clone().into());
        }
        if let Some(a) = &self.author {
            metadata.insert("author".into(), a.clone().into());
        }
        if let Some(c) = &self.created_at {
            metadata.insert("created_at".into(), c.clone().into());
        }
        if let Some(u) = &self.updated_at {
            metadata.insert("updated_at".into(), u.clone().into());
        }
        if let Some(n) = self.comment_count {
            metadata.insert("comment_count".into(), n.into());
        }
        metadata.insert(
            "labels".into(),
            serde_json::Value::from(self.labels.clone()),
        );
        metadata.insert("title".into(), self.title.clone().into());
    }
}

// ---------------------------------------------------------------------------
// Chunk
// ---------------------------------------------------------------------------

/// A token-bounded slice of a document plus its merged metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub metadata: Metadata,
}

impl Chunk {
    fn usize_field(&self, key: &str) -> Option<usize> {
        self.metadata
            .get(key)
            .and_then(serde_json::Value::as_u64)
            .map(|v| v as usize)
    }

    pub fn chunk_index(&self) -> Option<usize> {
        self.usize_field("chunk_index")
    }

    pub fn total_chunks(&self) -> Option<usize> {
        self.usize_field("total_chunks")
    }

    pub fn token_count(&self) -> Option<usize> {
        self.usize_field("token_count")
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(serde_json::Value::as_str)
    }

    pub fn is_goal_relevant(&self) -> bool {
        self.metadata
            .get("is_goal_relevant")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complexity_serializes_lowercase() {
        let json = serde_json::to_string(&ComplexityLevel::Technical).expect("serialize");
        assert_eq!(json, r#""technical""#);
        assert_eq!(ComplexityLevel::default(), ComplexityLevel::Unknown);
    }

    #[test]
    fn insight_signals_merge() {
        let signals = InsightSignals {
            has_pain_points: true,
            mentions_teams: vec!["engineering".into()],
            complexity_level: ComplexityLevel::Beginner,
            ..Default::default()
        };
        let mut meta = Metadata::new();
        signals.merge_into(&mut meta);
        assert_eq!(meta["has_pain_points"], true);
        assert_eq!(meta["has_value_proposition"], false);
        assert_eq!(meta["mentions_teams"], serde_json::json!(["engineering"]));
        assert_eq!(meta["complexity_level"], "beginner");
    }

    #[test]
    fn issue_metadata_omits_missing_fields() {
        let issue = IssueMetadata {
            issue_number: Some(42),
            title: "Crash on save".into(),
            ..Default::default()
        };
        let mut meta = Metadata::new();
        issue.merge_into(&mut meta);
        assert_eq!(meta["issue_number"], 42);
        assert_eq!(meta["labels"], serde_json::json!([]));
        assert!(!meta.contains_key("state"));
        assert!(!meta.contains_key("comment_count"));
    }

    #[test]
    fn document_stem() {
        let doc = Document::doc("handbook/culture.md", "");
        assert_eq!(doc.stem(), "culture");
        assert_eq!(doc.source_kind, SourceKind::Doc);
    }

    #[test]
    fn chunk_accessors() {
        let mut meta = Metadata::new();
        meta.insert("chunk_index".into(), 2.into());
        meta.insert("total_chunks".into(), 3.into());
        meta.insert("is_goal_relevant".into(), true.into());
        let chunk = Chunk {
            content: "x".into(),
            metadata: meta,
        };
        assert_eq!(chunk.chunk_index(), Some(2));
        assert_eq!(chunk.total_chunks(), Some(3));
        assert_eq!(chunk.token_count(), None);
        assert!(chunk.is_goal_relevant());
    }
}
