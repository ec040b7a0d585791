//! Configuration for orgingest.
//!
//! The TOML file is deserialized into [`AppConfig`] (the raw schema) and then
//! validated exactly once into an immutable [`OrgConfig`]. Everything the
//! pipeline consumes comes from `OrgConfig`; missing or inconsistent fields
//! surface as [`IngestError::Config`] at load time, never mid-run.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{IngestError, Result};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "orgingest.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".orgingest";

// ---------------------------------------------------------------------------
// Raw schema (matching orgingest.toml)
// ---------------------------------------------------------------------------

/// Top-level config file, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// `[organization]` section.
    #[serde(default)]
    pub organization: OrganizationConfig,

    /// `[data_sources]` section.
    #[serde(default)]
    pub data_sources: DataSourcesConfig,

    /// `[[content_categories]]` entries, in declaration order.
    #[serde(default)]
    pub content_categories: Vec<CategoryConfig>,

    /// `[[target_teams]]` entries, in declaration order.
    #[serde(default)]
    pub target_teams: Vec<TeamConfig>,

    /// `[rag_goals]` section.
    #[serde(default)]
    pub rag_goals: RagGoalsConfig,

    /// `[processing]` section.
    #[serde(default)]
    pub processing: ProcessingConfig,

    /// `[output]` section.
    #[serde(default)]
    pub output: OutputConfig,
}

/// `[organization]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizationConfig {
    /// Organization display name. Required.
    #[serde(default)]
    pub name: String,
}

/// `[data_sources]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSourcesConfig {
    #[serde(default)]
    pub documentation: DocumentationConfig,

    #[serde(default)]
    pub github: GithubConfig,
}

/// `[data_sources.documentation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentationConfig {
    /// Root of the documentation tree. Required.
    #[serde(default)]
    pub base_path: String,

    /// Sub-directories (relative to `base_path`) processed first.
    #[serde(default)]
    pub priority_paths: Vec<String>,

    /// File-name glob patterns, e.g. `*.md`.
    #[serde(default = "default_file_extensions")]
    pub file_extensions: Vec<String>,
}

impl Default for DocumentationConfig {
    fn default() -> Self {
        Self {
            base_path: String::new(),
            priority_paths: Vec::new(),
            file_extensions: default_file_extensions(),
        }
    }
}

fn default_file_extensions() -> Vec<String> {
    vec!["*.md".into()]
}

/// `[data_sources.github]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Whether exported issue files are ingested.
    #[serde(default)]
    pub enabled: bool,

    /// Directory holding one Markdown file per issue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues_path: Option<String>,
}

/// `[[content_categories]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// `[[target_teams]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamConfig {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// `[rag_goals]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagGoalsConfig {
    #[serde(default = "default_primary_purpose")]
    pub primary_purpose: String,

    #[serde(default)]
    pub focus_areas: Vec<String>,
}

impl Default for RagGoalsConfig {
    fn default() -> Self {
        Self {
            primary_purpose: default_primary_purpose(),
            focus_areas: Vec::new(),
        }
    }
}

fn default_primary_purpose() -> String {
    "knowledge_management".into()
}

/// `[processing]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Maximum tokens per chunk.
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,

    /// Tokens shared between consecutive chunks.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Chunks buffered before a sink flush.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Documents processed concurrently.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: default_max_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            batch_size: default_batch_size(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_max_chunk_size() -> usize {
    1000
}
fn default_chunk_overlap() -> usize {
    200
}
fn default_batch_size() -> usize {
    32
}
fn default_concurrency() -> usize {
    4
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default log filter when neither `RUST_LOG` nor `-v` is given.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log a progress line every N documents.
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,

    /// JSON-lines file receiving chunk records.
    #[serde(default = "default_chunks_path")]
    pub chunks_path: String,

    /// Base collection name; prefixed with the organization slug.
    #[serde(default = "default_collection_name")]
    pub collection_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            progress_interval: default_progress_interval(),
            chunks_path: default_chunks_path(),
            collection_name: default_collection_name(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}
fn default_progress_interval() -> usize {
    50
}
fn default_chunks_path() -> String {
    "chunks.jsonl".into()
}
fn default_collection_name() -> String {
    "knowledge_base".into()
}

// ---------------------------------------------------------------------------
// Validated configuration
// ---------------------------------------------------------------------------

/// A content category with its match keywords (lowercased).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRule {
    pub name: String,
    pub keywords: Vec<String>,
}

/// A configured team: name plus keywords and aliases (lowercased, keywords first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamProfile {
    pub name: String,
    pub keywords: Vec<String>,
}

impl TeamProfile {
    /// Metadata key of the per-team boolean flag, e.g. `relates_to_data_platform`.
    pub fn flag_key(&self) -> String {
        format!("relates_to_{}", self.name.replace('-', "_"))
    }
}

/// Where documentation files are discovered.
#[derive(Debug, Clone)]
pub struct DocumentationSource {
    pub base_path: PathBuf,
    pub priority_paths: Vec<PathBuf>,
    pub file_patterns: Vec<String>,
}

/// Chunking and batching parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingParams {
    pub max_chunk_size: usize,
    pub chunk_overlap: usize,
    pub batch_size: usize,
    pub concurrency: usize,
}

/// Immutable, validated configuration shared read-only by every worker.
#[derive(Debug, Clone)]
pub struct OrgConfig {
    pub organization_name: String,
    pub documentation: DocumentationSource,
    /// Issue export directory, present only when GitHub ingestion is enabled.
    pub issues_path: Option<PathBuf>,
    pub categories: Vec<CategoryRule>,
    pub teams: Vec<TeamProfile>,
    pub primary_purpose: String,
    pub focus_areas: Vec<String>,
    pub processing: ProcessingParams,
    pub output: OutputConfig,
}

impl OrgConfig {
    /// Validate a raw config into its immutable form.
    pub fn from_app_config(app: AppConfig) -> Result<Self> {
        let organization_name = app.organization.name.trim().to_string();
        if organization_name.is_empty() {
            return Err(IngestError::config("organization.name is required"));
        }

        let docs = app.data_sources.documentation;
        if docs.base_path.trim().is_empty() {
            return Err(IngestError::config(
                "data_sources.documentation.base_path is required",
            ));
        }
        if docs.file_extensions.is_empty() {
            return Err(IngestError::config(
                "data_sources.documentation.file_extensions must not be empty",
            ));
        }
        for pattern in &docs.file_extensions {
            glob::Pattern::new(pattern).map_err(|e| {
                IngestError::config(format!("invalid file_extensions pattern '{pattern}': {e}"))
            })?;
        }

        let issues_path = if app.data_sources.github.enabled {
            match app.data_sources.github.issues_path {
                Some(p) if !p.trim().is_empty() => Some(PathBuf::from(p)),
                _ => {
                    return Err(IngestError::config(
                        "data_sources.github.issues_path is required when github is enabled",
                    ));
                }
            }
        } else {
            None
        };

        let processing = validate_processing(&app.processing)?;

        let mut seen = HashSet::new();
        let mut categories = Vec::with_capacity(app.content_categories.len());
        for category in app.content_categories {
            let name = category.name.trim().to_string();
            if name.is_empty() {
                return Err(IngestError::config("content_categories entry has an empty name"));
            }
            if !seen.insert(name.clone()) {
                return Err(IngestError::config(format!("duplicate content category '{name}'")));
            }
            categories.push(CategoryRule {
                name,
                keywords: lowercase_all(category.keywords),
            });
        }

        let mut seen = HashSet::new();
        let mut teams = Vec::with_capacity(app.target_teams.len());
        for team in app.target_teams {
            let name = team.name.trim().to_string();
            if name.is_empty() {
                return Err(IngestError::config("target_teams entry has an empty name"));
            }
            if !seen.insert(name.clone()) {
                return Err(IngestError::config(format!("duplicate target team '{name}'")));
            }
            let mut keywords = lowercase_all(team.keywords);
            keywords.extend(lowercase_all(team.aliases));
            teams.push(TeamProfile { name, keywords });
        }

        Ok(Self {
            organization_name,
            documentation: DocumentationSource {
                base_path: PathBuf::from(docs.base_path),
                priority_paths: docs.priority_paths.into_iter().map(PathBuf::from).collect(),
                file_patterns: docs.file_extensions,
            },
            issues_path,
            categories,
            teams,
            primary_purpose: app.rag_goals.primary_purpose,
            focus_areas: app.rag_goals.focus_areas,
            processing,
            output: app.output,
        })
    }

    /// Organization name as an identifier: lowercased, spaces replaced by `_`.
    pub fn organization_slug(&self) -> String {
        self.organization_name.to_lowercase().replace(' ', "_")
    }

    /// Collection name handed to downstream stores, e.g. `acme_corp_knowledge_base`.
    pub fn collection_name(&self) -> String {
        format!("{}_{}", self.organization_slug(), self.output.collection_name)
    }
}

fn validate_processing(p: &ProcessingConfig) -> Result<ProcessingParams> {
    if p.max_chunk_size == 0 {
        return Err(IngestError::config("processing.max_chunk_size must be > 0"));
    }
    if p.chunk_overlap >= p.max_chunk_size {
        return Err(IngestError::config(format!(
            "processing.chunk_overlap ({}) must be smaller than max_chunk_size ({})",
            p.chunk_overlap, p.max_chunk_size
        )));
    }
    if p.batch_size == 0 {
        return Err(IngestError::config("processing.batch_size must be > 0"));
    }
    if p.concurrency == 0 {
        return Err(IngestError::config("processing.concurrency must be > 0"));
    }
    Ok(ProcessingParams {
        max_chunk_size: p.max_chunk_size,
        chunk_overlap: p.chunk_overlap,
        batch_size: p.batch_size,
        concurrency: p.concurrency,
    })
}

fn lowercase_all(words: Vec<String>) -> Vec<String> {
    words
        .into_iter()
        .map(|w| w.to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the user config directory (`~/.orgingest/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| IngestError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Resolve which config file to use.
///
/// An explicit path wins; otherwise `./orgingest.toml` if present, else
/// `~/.orgingest/orgingest.toml`.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Ok(local);
    }
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Parse a config file without validating it.
pub fn load_app_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::config(format!("config file not found: {}", path.display()))
        } else {
            IngestError::io(path, e)
        }
    })?;

    parse_app_config(&content)
        .map_err(|e| IngestError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Load and validate the config at `path`.
pub fn load_config_from(path: &Path) -> Result<OrgConfig> {
    let app = load_app_config_from(path)?;
    let config = OrgConfig::from_app_config(app)?;
    tracing::debug!(
        path = %path.display(),
        organization = %config.organization_name,
        categories = config.categories.len(),
        teams = config.teams.len(),
        "config loaded"
    );
    Ok(config)
}

/// Parse config text into the raw schema.
pub fn parse_app_config(content: &str) -> std::result::Result<AppConfig, toml::de::Error> {
    toml::from_str(content)
}

/// Write the starter config template to `path`. Refuses to overwrite.
pub fn init_config(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Err(IngestError::config(format!(
            "{} already exists; remove it first to re-initialize",
            path.display()
        )));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| IngestError::io(parent, e))?;
    }

    std::fs::write(path, STARTER_CONFIG).map_err(|e| IngestError::io(path, e))?;
    tracing::info!(path = %path.display(), "created starter config file");

    Ok(path.to_path_buf())
}

/// Commented starter template written by `orgingest config init`.
pub const STARTER_CONFIG: &str = r#"# orgingest configuration

[organization]
name = "Example Org"

[data_sources.documentation]
base_path = "docs"
# Sub-directories processed before the rest of the tree.
priority_paths = ["handbook"]
file_extensions = ["*.md"]

[data_sources.github]
enabled = false
# issues_path = "github-issues"

# Categories are tried in order; the first match wins.
[[content_categories]]
name = "company_culture"
keywords = ["culture", "values", "mission"]

[[content_categories]]
name = "team_documentation"
keywords = ["team", "onboarding"]

# Teams are tried in order; the first match owns the document.
[[target_teams]]
name = "engineering"
keywords = ["engineering", "backend", "infrastructure"]
aliases = ["eng"]

[rag_goals]
primary_purpose = "knowledge_management"
focus_areas = ["company_culture", "team_dynamics"]

[processing]
max_chunk_size = 1000
chunk_overlap = 200
batch_size = 32
concurrency = 4

[output]
log_level = "info"
progress_interval = 50
chunks_path = "chunks.jsonl"
collection_name = "knowledge_base"
"#;
