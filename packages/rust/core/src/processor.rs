//! Per-document processing: raw text in, chunks with merged metadata out.
//!
//! [`DocumentProcessor`] is immutable after construction and shared across
//! worker tasks behind an `Arc`. It performs no I/O.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use orgingest_markdown::{markdown_to_text, split_frontmatter};
use orgingest_shared::{
    CATEGORY_PRODUCT_FEEDBACK, Chunk, Document, IngestError, Metadata, OrgConfig, Result,
    SourceKind,
};
use tracing::{debug, instrument};

use crate::chunker::{ChunkParams, Chunker};
use crate::classify::CategoryClassifier;
use crate::insights::InsightExtractor;
use crate::issue::{issue_body, parse_issue_metadata};
use crate::relevance::GoalRelevance;
use crate::teams::TeamAttributor;
use crate::tokenizer::{Cl100kTokenizer, Tokenizer};

/// `content_type` of documentation chunks.
pub const CONTENT_TYPE_DOCUMENTATION: &str = "documentation";
/// `content_type` of issue chunks.
pub const CONTENT_TYPE_GITHUB_ISSUE: &str = "github_issue";

/// Keys computed from the file itself. Frontmatter cannot override them.
const DERIVED_KEYS: &[&str] = &[
    "content_type",
    "content_category",
    "source_file",
    "file_path",
    "file_extension",
    "organization",
];

/// What happened to one document, reported back to the orchestrator.
#[derive(Debug)]
pub enum DocumentOutcome {
    Processed { path: PathBuf, chunks: Vec<Chunk> },
    Failed { path: PathBuf, error: IngestError },
}

impl DocumentOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Processed { path, .. } | Self::Failed { path, .. } => path,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DocumentProcessor {
    organization: String,
    base_path: PathBuf,
    classifier: CategoryClassifier,
    teams: TeamAttributor,
    relevance: GoalRelevance,
    chunker: Chunker,
}

impl DocumentProcessor {
    /// Build a processor using the `cl100k_base` tokenizer.
    pub fn from_config(config: &OrgConfig) -> Result<Self> {
        Self::new(config, Arc::new(Cl100kTokenizer::new()?))
    }

    pub fn new(config: &OrgConfig, tokenizer: Arc<dyn Tokenizer>) -> Result<Self> {
        let params = ChunkParams::try_from(config.processing)?;
        Ok(Self {
            organization: config.organization_name.clone(),
            base_path: config.documentation.base_path.clone(),
            classifier: CategoryClassifier::new(config.categories.clone()),
            teams: TeamAttributor::new(config.teams.clone()),
            relevance: GoalRelevance::new(config.focus_areas.clone()),
            chunker: Chunker::new(
                tokenizer,
                params,
                InsightExtractor::new(config.teams.clone()),
            ),
        })
    }

    /// Process one document into chunks.
    #[instrument(skip_all, fields(path = %doc.path.display(), kind = ?doc.source_kind))]
    pub fn process(&self, doc: &Document) -> Result<Vec<Chunk>> {
        let chunks = match doc.source_kind {
            SourceKind::Doc => self.process_doc(doc),
            SourceKind::Issue => self.process_issue(doc),
        }?;
        debug!(chunks = chunks.len(), "document processed");
        Ok(chunks)
    }

    /// Process one document, capturing failure as a value.
    pub fn outcome(&self, doc: &Document) -> DocumentOutcome {
        match self.process(doc) {
            Ok(chunks) => DocumentOutcome::Processed {
                path: doc.path.clone(),
                chunks,
            },
            Err(error) => DocumentOutcome::Failed {
                path: doc.path.clone(),
                error,
            },
        }
    }

    fn process_doc(&self, doc: &Document) -> Result<Vec<Chunk>> {
        let (frontmatter, body) = split_frontmatter(&doc.raw_text);
        let text = markdown_to_text(body);

        let source_file = self.relative_path(&doc.path);
        let category = self.classifier.classify(&source_file, &text);

        let mut metadata = Metadata::new();
        metadata.insert("content_type".into(), CONTENT_TYPE_DOCUMENTATION.into());
        metadata.insert("content_category".into(), category.clone().into());
        metadata.insert("source_file".into(), source_file.into());
        metadata.insert("file_path".into(), path_string(&doc.path).into());
        metadata.insert(
            "title".into(),
            frontmatter
                .get("title")
                .map(str::to_string)
                .unwrap_or_else(|| doc.stem())
                .into(),
        );
        metadata.insert("file_extension".into(), extension_of(&doc.path).into());
        metadata.insert("organization".into(), self.organization.clone().into());
        for (key, value) in frontmatter.iter() {
            if !DERIVED_KEYS.contains(&key) {
                metadata.insert(key.to_string(), value.into());
            }
        }

        self.teams.attribute(&text, &[]).merge_into(&mut metadata);
        metadata.insert(
            "is_goal_relevant".into(),
            self.relevance.is_relevant(&category, &text).into(),
        );

        self.chunker.chunk(&text, &metadata)
    }

    fn process_issue(&self, doc: &Document) -> Result<Vec<Chunk>> {
        let issue = parse_issue_metadata(&doc.raw_text, &doc.stem())?;
        let text = markdown_to_text(issue_body(&doc.raw_text));

        let file_name = doc
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut metadata = Metadata::new();
        metadata.insert("content_type".into(), CONTENT_TYPE_GITHUB_ISSUE.into());
        metadata.insert("content_category".into(), CATEGORY_PRODUCT_FEEDBACK.into());
        metadata.insert("source_file".into(), file_name.into());
        metadata.insert("file_path".into(), path_string(&doc.path).into());
        metadata.insert("organization".into(), self.organization.clone().into());
        issue.merge_into(&mut metadata);

        self.teams
            .attribute(&text, &issue.labels)
            .merge_into(&mut metadata);
        metadata.insert("is_goal_relevant".into(), true.into());

        self.chunker.chunk(&text, &metadata)
    }

    /// Path relative to the documentation base, with `/` separators.
    fn relative_path(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.base_path).unwrap_or(path);
        path_string(rel)
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
