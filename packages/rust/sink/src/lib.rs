//! Chunk sinks: where processed chunks go.
//!
//! The pipeline hands each sink ordered batches of [`Chunk`]s. [`JsonlSink`]
//! writes one JSON object per line with a stable id and flattened metadata,
//! ready for a downstream embedding job. [`MemorySink`] keeps chunks in
//! memory for tests.

mod manifest;
mod record;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use orgingest_shared::{Chunk, IngestError, Result};
use tracing::{debug, info, instrument};

pub use manifest::{RunCounts, RunManifest, manifest_path};
pub use record::{ChunkRecord, chunk_id, flatten_metadata};

/// Destination for processed chunks.
pub trait ChunkSink: Send {
    /// Persist one batch, returning how many chunks were written.
    fn write_batch(&mut self, chunks: &[Chunk]) -> Result<usize>;

    /// Flush and release resources. Called once at the end of a run.
    fn finish(&mut self) -> Result<()>;
}

// ---------------------------------------------------------------------------
// JSON lines
// ---------------------------------------------------------------------------

/// Appends `{ id, content, metadata }` lines to a file.
pub struct JsonlSink {
    path: PathBuf,
    org_slug: String,
    writer: BufWriter<File>,
    written: usize,
}

impl JsonlSink {
    /// Create (or truncate) the output file, creating parent directories.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn create(path: &Path, org_slug: impl Into<String>) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| IngestError::io(parent, e))?;
        }
        let file = File::create(path).map_err(|e| IngestError::io(path, e))?;
        debug!("opened chunk output");
        Ok(Self {
            path: path.to_path_buf(),
            org_slug: org_slug.into(),
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

impl ChunkSink for JsonlSink {
    /// Encodes the whole batch before writing, so a chunk that fails to
    /// encode leaves nothing from its batch in the file.
    fn write_batch(&mut self, chunks: &[Chunk]) -> Result<usize> {
        let lines = encode_batch(&self.org_slug, chunks)?;
        self.writer
            .write_all(&lines)
            .map_err(|e| IngestError::io(&self.path, e))?;
        self.written += chunks.len();
        debug!(batch = chunks.len(), total = self.written, "wrote chunk batch");
        Ok(chunks.len())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| IngestError::io(&self.path, e))?;
        info!(path = %self.path.display(), chunks = self.written, "chunk output complete");
        Ok(())
    }
}

/// One newline-terminated JSON record per chunk.
fn encode_batch(org_slug: &str, chunks: &[Chunk]) -> Result<Vec<u8>> {
    let mut lines = Vec::new();
    for chunk in chunks {
        let record = ChunkRecord::from_chunk(org_slug, chunk);
        serde_json::to_writer(&mut lines, &record)
            .map_err(|e| IngestError::Sink(format!("failed to encode chunk {}: {e}", record.id)))?;
        lines.push(b'\n');
    }
    Ok(lines)
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Collects every chunk it receives.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub chunks: Vec<Chunk>,
    /// Size of each batch received, in order.
    pub batches: Vec<usize>,
    pub finished: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChunkSink for MemorySink {
    fn write_batch(&mut self, chunks: &[Chunk]) -> Result<usize> {
        self.chunks.extend_from_slice(chunks);
        self.batches.push(chunks.len());
        Ok(chunks.len())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}
