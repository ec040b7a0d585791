//! Shared types, error model, and configuration for orgingest.
//!
//! This crate is the foundation depended on by all other orgingest crates.
//! It provides:
//! - [`IngestError`], the unified error type
//! - Domain types ([`Document`], [`Chunk`], [`InsightSignals`], [`IssueMetadata`])
//! - Configuration ([`AppConfig`] raw schema, validated [`OrgConfig`], loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CONFIG_FILE_NAME, CategoryConfig, CategoryRule, DocumentationSource, OrgConfig,
    ProcessingParams, STARTER_CONFIG, TeamConfig, TeamProfile, config_dir, init_config,
    load_app_config_from, load_config_from, parse_app_config, resolve_config_path,
};
pub use error::{IngestError, Result};
pub use types::{
    CATEGORY_GENERAL_DOCS, CATEGORY_GITHUB_ISSUE, CATEGORY_PRODUCT_FEEDBACK, Chunk,
    ComplexityLevel, Document, InsightSignals, IssueMetadata, Metadata, SourceKind, UNKNOWN_TEAM,
};
