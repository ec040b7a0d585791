//! End-to-end ingest run: discover → read → process → sink.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use orgingest_discovery::discover;
use orgingest_shared::{Chunk, Document, IngestError, OrgConfig, Result, SourceKind};
use orgingest_sink::{ChunkSink, RunCounts};
use tracing::{info, instrument, warn};

use crate::processor::{DocumentOutcome, DocumentProcessor};

/// Summary of an ingest run.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub documents_processed: usize,
    pub documents_failed: usize,
    pub chunks_written: usize,
    /// Chunks lost to failed sink batches.
    pub chunks_failed: usize,
    pub goal_relevant_chunks: usize,
    /// `(file, cause)` for every failed document.
    pub failures: Vec<(PathBuf, String)>,
    pub elapsed: Duration,
}

impl IngestReport {
    pub fn counts(&self) -> RunCounts {
        RunCounts {
            documents_processed: self.documents_processed,
            documents_failed: self.documents_failed,
            chunks_written: self.chunks_written,
            chunks_failed: self.chunks_failed,
            goal_relevant_chunks: self.goal_relevant_chunks,
        }
    }

    fn record_failure(&mut self, path: &Path, error: &IngestError) {
        warn!(path = %path.display(), error = %error, "document failed, skipping");
        self.documents_failed += 1;
        self.failures.push((path.to_path_buf(), error.to_string()));
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each document, successful or not.
    fn document_processed(&self, path: &Path, current: usize, total: usize);
    /// Called when the run completes.
    fn done(&self, report: &IngestReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn document_processed(&self, _path: &Path, _current: usize, _total: usize) {}
    fn done(&self, _report: &IngestReport) {}
}

/// Run a full ingest with the default tokenizer.
pub async fn run_ingest(
    config: &OrgConfig,
    sink: &mut dyn ChunkSink,
    progress: &dyn ProgressReporter,
) -> Result<IngestReport> {
    let processor = Arc::new(DocumentProcessor::from_config(config)?);
    run_ingest_with(config, processor, sink, progress).await
}

/// Run a full ingest with a prepared processor.
///
/// 1. Discover documentation and issue files
/// 2. Process documentation, then issues, `concurrency` files at a time
/// 3. Buffer chunks and hand them to `sink` in batches of `batch_size`
///
/// Results are consumed in discovery order, so sink output is reproducible.
/// Per-document failures are logged and counted. Discovery errors and a
/// failing [`ChunkSink::finish`] abort the run.
#[instrument(skip_all, fields(organization = %config.organization_name))]
pub async fn run_ingest_with(
    config: &OrgConfig,
    processor: Arc<DocumentProcessor>,
    sink: &mut dyn ChunkSink,
    progress: &dyn ProgressReporter,
) -> Result<IngestReport> {
    let start = Instant::now();
    info!(collection = %config.collection_name(), "starting ingest");

    progress.phase("Discovering files");
    let files = discover(&config.documentation, config.issues_path.as_deref())?;
    if files.total() == 0 {
        warn!("no documents found");
    }

    let mut run = Run {
        config,
        processor,
        sink,
        progress,
        report: IngestReport::default(),
        buffer: Vec::new(),
        seen: 0,
        total: files.total(),
    };

    progress.phase("Processing documentation");
    run.process_source(&files.docs, SourceKind::Doc).await;

    if !files.issues.is_empty() {
        progress.phase("Processing issues");
        run.process_source(&files.issues, SourceKind::Issue).await;
    }

    run.sink.finish()?;

    let mut report = run.report;
    report.elapsed = start.elapsed();
    progress.done(&report);

    info!(
        documents_processed = report.documents_processed,
        documents_failed = report.documents_failed,
        chunks_written = report.chunks_written,
        chunks_failed = report.chunks_failed,
        goal_relevant = report.goal_relevant_chunks,
        elapsed_ms = report.elapsed.as_millis(),
        "ingest complete"
    );

    Ok(report)
}

// ---------------------------------------------------------------------------
// Run state
// ---------------------------------------------------------------------------

struct Run<'a> {
    config: &'a OrgConfig,
    processor: Arc<DocumentProcessor>,
    sink: &'a mut dyn ChunkSink,
    progress: &'a dyn ProgressReporter,
    report: IngestReport,
    buffer: Vec<Chunk>,
    /// Documents handled so far across all sources.
    seen: usize,
    total: usize,
}

impl Run<'_> {
    async fn process_source(&mut self, files: &[PathBuf], kind: SourceKind) {
        let concurrency = self.config.processing.concurrency;

        for batch in files.chunks(concurrency) {
            let handles: Vec<_> = batch
                .iter()
                .map(|path| {
                    let processor = Arc::clone(&self.processor);
                    let path = path.clone();
                    (path.clone(), tokio::spawn(process_file(processor, path, kind)))
                })
                .collect();

            for (path, handle) in handles {
                let outcome = match handle.await {
                    Ok(outcome) => outcome,
                    Err(e) => DocumentOutcome::Failed {
                        path,
                        error: IngestError::validation(format!("worker task failed: {e}")),
                    },
                };
                self.accept(outcome);
            }
        }

        self.flush_all();
    }

    fn accept(&mut self, outcome: DocumentOutcome) {
        self.seen += 1;
        self.progress
            .document_processed(outcome.path(), self.seen, self.total);

        match outcome {
            DocumentOutcome::Processed { chunks, .. } => {
                self.report.documents_processed += 1;
                self.report.goal_relevant_chunks +=
                    chunks.iter().filter(|c| c.is_goal_relevant()).count();
                self.buffer.extend(chunks);
                self.flush_full_batches();
            }
            DocumentOutcome::Failed { path, error } => {
                self.report.record_failure(&path, &error);
            }
        }

        let interval = self.config.output.progress_interval;
        if interval > 0 && self.seen % interval == 0 {
            info!(
                processed = self.seen,
                total = self.total,
                chunks = self.report.chunks_written + self.buffer.len(),
                "progress"
            );
        }
    }

    fn flush_full_batches(&mut self) {
        let batch_size = self.config.processing.batch_size;
        while self.buffer.len() >= batch_size {
            let batch: Vec<Chunk> = self.buffer.drain(..batch_size).collect();
            self.write(&batch);
        }
    }

    fn flush_all(&mut self) {
        self.flush_full_batches();
        if !self.buffer.is_empty() {
            let batch = std::mem::take(&mut self.buffer);
            self.write(&batch);
        }
    }

    fn write(&mut self, batch: &[Chunk]) {
        match self.sink.write_batch(batch) {
            Ok(written) => self.report.chunks_written += written,
            Err(e) => {
                warn!(chunks = batch.len(), error = %e, "sink rejected batch");
                self.report.chunks_failed += batch.len();
            }
        }
    }
}

/// Read one file and process it on the blocking pool.
async fn process_file(
    processor: Arc<DocumentProcessor>,
    path: PathBuf,
    kind: SourceKind,
) -> DocumentOutcome {
    let raw_text = match tokio::fs::read_to_string(&path).await {
        Ok(text) => text,
        Err(e) => {
            let error = IngestError::io(&path, e);
            return DocumentOutcome::Failed { path, error };
        }
    };

    let doc = Document {
        path: path.clone(),
        raw_text,
        source_kind: kind,
    };
    match tokio::task::spawn_blocking(move || processor.outcome(&doc)).await {
        Ok(outcome) => outcome,
        Err(e) => DocumentOutcome::Failed {
            path,
            error: IngestError::validation(format!("processing task failed: {e}")),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::testing::{WordTokenizer, words};
    use orgingest_shared::{Metadata, parse_app_config};
    use orgingest_sink::MemorySink;
    use std::fs;

    fn config(root: &Path, issues: Option<&Path>, batch_size: usize) -> OrgConfig {
        let github = match issues {
            Some(dir) => format!("enabled = true\nissues_path = {:?}", dir.display().to_string()),
            None => "enabled = false".to_string(),
        };
        let toml = format!(
            r#"
[organization]
name = "Acme"

[data_sources.documentation]
base_path = {base:?}
priority_paths = ["handbook"]

[data_sources.github]
{github}

[[content_categories]]
name = "company_culture"
keywords = ["culture"]

[processing]
max_chunk_size = 20
chunk_overlap = 5
batch_size = {batch_size}
concurrency = 2

[output]
progress_interval = 1
"#,
            base = root.display().to_string(),
        );
        OrgConfig::from_app_config(parse_app_config(&toml).expect("parse")).expect("valid")
    }

    fn processor(config: &OrgConfig) -> Arc<DocumentProcessor> {
        Arc::new(DocumentProcessor::new(config, Arc::new(WordTokenizer::default())).expect("processor"))
    }

    fn write(root: &Path, rel: &str, text: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, text).expect("write");
    }

    fn source_files(sink: &MemorySink) -> Vec<String> {
        let mut files: Vec<String> = sink
            .chunks
            .iter()
            .filter_map(|c| c.str_field("source_file").map(str::to_string))
            .collect();
        files.dedup();
        files
    }

    struct FailingSink;

    impl ChunkSink for FailingSink {
        fn write_batch(&mut self, _chunks: &[Chunk]) -> Result<usize> {
            Err(IngestError::Sink("store offline".into()))
        }
        fn finish(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn processes_priority_docs_first_then_issues() {
        let docs = tempfile::tempdir().expect("tempdir");
        let issues = tempfile::tempdir().expect("tempdir");
        write(docs.path(), "a.md", "Alpha page");
        write(docs.path(), "handbook/culture.md", "# Culture\n\nWe value candor.");
        write(issues.path(), "issue-1.md", "# Bug\n\n**Issue Number:** #1\n\n## Issue Description\n\nBroken.");

        let cfg = config(docs.path(), Some(issues.path()), 100);
        let mut sink = MemorySink::new();
        let report = run_ingest_with(&cfg, processor(&cfg), &mut sink, &SilentProgress)
            .await
            .expect("run");

        assert_eq!(report.documents_processed, 3);
        assert_eq!(report.documents_failed, 0);
        assert_eq!(report.chunks_written, 3);
        assert_eq!(source_files(&sink), ["handbook/culture.md", "a.md", "issue-1.md"]);
        // culture doc and issue are goal relevant
        assert_eq!(report.goal_relevant_chunks, 2);
        assert!(sink.finished);
    }

    #[tokio::test]
    async fn batches_respect_batch_size_and_flush_per_source() {
        let docs = tempfile::tempdir().expect("tempdir");
        let issues = tempfile::tempdir().expect("tempdir");
        write(docs.path(), "long.md", &words(60));
        write(issues.path(), "i.md", "Issue Number: 3\n\nsmall");

        let cfg = config(docs.path(), Some(issues.path()), 2);
        let mut sink = MemorySink::new();
        let report = run_ingest_with(&cfg, processor(&cfg), &mut sink, &SilentProgress)
            .await
            .expect("run");

        // 60 tokens, window 20, overlap 5: starts 0, 15, 30, 45 -> 4 chunks.
        assert_eq!(report.chunks_written, 5);
        assert_eq!(sink.batches, [2, 2, 1]);
    }

    #[tokio::test]
    async fn failed_documents_are_reported_and_skipped() {
        let docs = tempfile::tempdir().expect("tempdir");
        let issues = tempfile::tempdir().expect("tempdir");
        write(docs.path(), "ok.md", "fine");
        fs::write(docs.path().join("binary.md"), [0xff, 0xfe, 0x00]).expect("write");
        write(issues.path(), "bad.md", "Issue Number: 999999999999999999999999");

        let cfg = config(docs.path(), Some(issues.path()), 10);
        let mut sink = MemorySink::new();
        let report = run_ingest_with(&cfg, processor(&cfg), &mut sink, &SilentProgress)
            .await
            .expect("run");

        assert_eq!(report.documents_processed, 1);
        assert_eq!(report.documents_failed, 2);
        let failed: Vec<_> = report
            .failures
            .iter()
            .map(|(p, _)| p.file_name().expect("name").to_string_lossy().into_owned())
            .collect();
        assert_eq!(failed, ["binary.md", "bad.md"]);
        assert!(report.failures[1].1.contains("parse error"));
    }

    #[tokio::test]
    async fn sink_failures_are_counted_not_fatal() {
        let docs = tempfile::tempdir().expect("tempdir");
        write(docs.path(), "a.md", "one");
        write(docs.path(), "b.md", "two");

        let cfg = config(docs.path(), None, 1);
        let report = run_ingest_with(&cfg, processor(&cfg), &mut FailingSink, &SilentProgress)
            .await
            .expect("run");
        assert_eq!(report.documents_processed, 2);
        assert_eq!(report.chunks_written, 0);
        assert_eq!(report.chunks_failed, 2);
    }

    #[tokio::test]
    async fn missing_base_path_aborts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = config(&dir.path().join("absent"), None, 10);
        let mut sink = MemorySink::new();
        let result = run_ingest_with(&cfg, processor(&cfg), &mut sink, &SilentProgress).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn reruns_are_identical() {
        let docs = tempfile::tempdir().expect("tempdir");
        for i in 0..5 {
            write(docs.path(), &format!("d{i}.md"), &words(30 + i));
        }
        let cfg = config(docs.path(), None, 3);
        let p = processor(&cfg);

        let mut first = MemorySink::new();
        run_ingest_with(&cfg, Arc::clone(&p), &mut first, &SilentProgress)
            .await
            .expect("run");
        let mut second = MemorySink::new();
        run_ingest_with(&cfg, p, &mut second, &SilentProgress)
            .await
            .expect("run");

        let strip = |s: &MemorySink| -> Vec<(String, Metadata)> {
            s.chunks
                .iter()
                .map(|c| (c.content.clone(), c.metadata.clone()))
                .collect()
        };
        assert_eq!(strip(&first), strip(&second));
    }
}
