//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use orgingest_core::{DocumentProcessor, IngestReport, ProgressReporter, run_ingest};
use orgingest_shared::{
    CONFIG_FILE_NAME, Document, OrgConfig, init_config, load_app_config_from, load_config_from,
    resolve_config_path,
};
use orgingest_sink::{JsonlSink, RunManifest, manifest_path};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// orgingest: chunk organizational knowledge for retrieval.
#[derive(Parser)]
#[command(
    name = "orgingest",
    version,
    about = "Turn documentation trees and issue exports into token-bounded, metadata-rich chunks.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ./orgingest.toml, then ~/.orgingest/orgingest.toml).
    #[arg(short, long, global = true, env = "ORGINGEST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Ingest every configured source into a JSON-lines chunk file.
    Ingest {
        /// Output file (defaults to `[output] chunks_path`).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Process a single file and print its chunks.
    Inspect {
        /// File to process.
        file: PathBuf,

        /// Treat the file as an issue export.
        #[arg(long)]
        issue: bool,
    },

    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a commented starter config.
    Init {
        /// Where to write it (defaults to ./orgingest.toml).
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Show the resolved configuration as TOML.
    Show,
    /// Validate the configuration and summarize it.
    Validate,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
///
/// `RUST_LOG` wins, then `-v`, then `[output] log_level` from the config.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match cli.verbose {
        0 => configured_log_level(cli.config.as_deref()),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_filter(&level)));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

/// A bare level scopes to our crates; a directive list is used as written.
fn log_filter(level: &str) -> String {
    let level = level.trim();
    if level.contains('=') || level.contains(',') {
        level.to_string()
    } else {
        format!("orgingest={level}")
    }
}

/// `[output] log_level`, or `info` when no readable config exists yet.
fn configured_log_level(explicit: Option<&Path>) -> String {
    resolve_config_path(explicit)
        .ok()
        .and_then(|path| load_app_config_from(&path).ok())
        .map(|app| app.output.log_level)
        .unwrap_or_else(|| "info".to_string())
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = cli.config.as_deref();
    match cli.command {
        Command::Ingest { out } => cmd_ingest(config, out.as_deref()).await,
        Command::Inspect { file, issue } => cmd_inspect(config, &file, issue).await,
        Command::Config { action } => match action {
            ConfigAction::Init { path } => cmd_config_init(path.as_deref()),
            ConfigAction::Show => cmd_config_show(config),
            ConfigAction::Validate => cmd_config_validate(config),
        },
    }
}

fn load(explicit: Option<&Path>) -> Result<OrgConfig> {
    let path = resolve_config_path(explicit)?;
    Ok(load_config_from(&path)?)
}

// ---------------------------------------------------------------------------
// ingest
// ---------------------------------------------------------------------------

async fn cmd_ingest(config_path: Option<&Path>, out: Option<&Path>) -> Result<()> {
    let config = load(config_path)?;
    let out = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&config.output.chunks_path));

    info!(
        organization = %config.organization_name,
        out = %out.display(),
        "ingesting"
    );

    let mut manifest = RunManifest::start(
        &config.organization_name,
        config.collection_name(),
        env!("CARGO_PKG_VERSION"),
    );
    let mut sink = JsonlSink::create(&out, config.organization_slug())?;
    let reporter = CliProgress::new();

    let report = run_ingest(&config, &mut sink, &reporter).await?;

    manifest.finish(report.counts());
    let manifest_file = manifest_path(&out);
    manifest.write(&manifest_file)?;

    print_summary(&config, &report, &out, &manifest_file);

    if report.documents_processed == 0 && report.documents_failed > 0 {
        return Err(eyre!("every document failed to process"));
    }
    Ok(())
}

fn print_summary(config: &OrgConfig, report: &IngestReport, out: &Path, manifest: &Path) {
    println!();
    println!("  Ingest complete for {}", config.organization_name);
    println!("  Collection: {}", config.collection_name());
    println!(
        "  Documents:  {} processed, {} failed",
        report.documents_processed, report.documents_failed
    );
    println!(
        "  Chunks:     {} written, {} failed, {} goal-relevant",
        report.chunks_written, report.chunks_failed, report.goal_relevant_chunks
    );
    println!("  Output:     {}", out.display());
    println!("  Manifest:   {}", manifest.display());
    println!("  Time:       {:.1}s", report.elapsed.as_secs_f64());

    if !report.failures.is_empty() {
        println!();
        println!("  Failed documents:");
        for (path, cause) in &report.failures {
            println!("    {}: {cause}", path.display());
        }
    }
    println!();
}

// ---------------------------------------------------------------------------
// inspect
// ---------------------------------------------------------------------------

async fn cmd_inspect(config_path: Option<&Path>, file: &Path, issue: bool) -> Result<()> {
    let config = load(config_path)?;
    let processor = DocumentProcessor::from_config(&config)?;

    let raw_text = tokio::fs::read_to_string(file)
        .await
        .map_err(|e| eyre!("cannot read {}: {e}", file.display()))?;
    let doc = if issue {
        Document::issue(file, raw_text)
    } else {
        Document::doc(file, raw_text)
    };

    let chunks = tokio::task::spawn_blocking(move || processor.process(&doc)).await??;
    println!("{}", serde_json::to_string_pretty(&chunks)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config_init(path: Option<&Path>) -> Result<()> {
    let path = path.unwrap_or(Path::new(CONFIG_FILE_NAME));
    let written = init_config(path)?;
    println!("Config initialized at: {}", written.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let path = resolve_config_path(config_path)?;
    let app = load_app_config_from(&path)?;
    println!("# {}", path.display());
    println!("{}", toml::to_string_pretty(&app)?);
    Ok(())
}

fn cmd_config_validate(config_path: Option<&Path>) -> Result<()> {
    let path = resolve_config_path(config_path)?;
    let config = load_config_from(&path)?;

    if !config.documentation.base_path.is_dir() {
        warn!(
            path = %config.documentation.base_path.display(),
            "documentation base path does not exist yet"
        );
    }

    println!("{} is valid", path.display());
    println!("  Organization: {}", config.organization_name);
    println!("  Collection:   {}", config.collection_name());
    println!("  Categories:   {}", config.categories.len());
    println!("  Teams:        {}", config.teams.len());
    println!(
        "  Chunking:     {} tokens, {} overlap",
        config.processing.max_chunk_size, config.processing.chunk_overlap
    );
    match &config.issues_path {
        Some(issues) => println!("  Issues:       {}", issues.display()),
        None => println!("  Issues:       disabled"),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Progress bar over discovered documents.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
        bar.set_style(style);
        bar.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { bar }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.bar.set_message(name.to_string());
    }

    fn document_processed(&self, path: &Path, current: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(current as u64);
        if let Some(name) = path.file_name() {
            self.bar.set_message(name.to_string_lossy().into_owned());
        }
    }

    fn done(&self, _report: &IngestReport) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_level_is_scoped_to_orgingest() {
        assert_eq!(log_filter("debug"), "orgingest=debug");
        assert_eq!(log_filter(" warn "), "orgingest=warn");
    }

    #[test]
    fn directive_lists_pass_through() {
        assert_eq!(log_filter("warn,hyper=debug"), "warn,hyper=debug");
        assert_eq!(log_filter("orgingest_core=trace"), "orgingest_core=trace");
        assert!(tracing_subscriber::EnvFilter::try_new(log_filter("warn,hyper=debug")).is_ok());
    }
}
