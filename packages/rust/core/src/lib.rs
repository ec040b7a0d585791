//! Document processing and pipeline orchestration for orgingest.
//!
//! Raw documents go through frontmatter separation, normalization,
//! categorization, team attribution and token-window chunking
//! ([`DocumentProcessor`]). [`pipeline::run_ingest`] drives that over every
//! discovered file and feeds the resulting chunks to a sink.

pub mod chunker;
pub mod classify;
pub mod insights;
pub mod issue;
pub mod pipeline;
pub mod processor;
pub mod relevance;
pub mod teams;
pub mod tokenizer;

pub use chunker::{ChunkParams, Chunker, TokenWindow, TokenWindows};
pub use classify::CategoryClassifier;
pub use insights::InsightExtractor;
pub use issue::{issue_body, parse_issue_metadata};
pub use pipeline::{IngestReport, ProgressReporter, SilentProgress, run_ingest, run_ingest_with};
pub use processor::{DocumentOutcome, DocumentProcessor};
pub use relevance::GoalRelevance;
pub use teams::{TeamAttribution, TeamAttributor};
pub use tokenizer::{Cl100kTokenizer, Tokenizer};
