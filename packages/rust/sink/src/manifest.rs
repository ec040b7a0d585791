//! Run manifest written next to the chunk output.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use orgingest_shared::{IngestError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Counts recorded for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounts {
    pub documents_processed: usize,
    pub documents_failed: usize,
    pub chunks_written: usize,
    pub chunks_failed: usize,
    pub goal_relevant_chunks: usize,
}

/// The `<stem>.manifest.json` structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    /// Time-sortable run identifier.
    pub run_id: Uuid,
    pub organization: String,
    pub collection_name: String,
    pub tool_version: String,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub counts: RunCounts,
}

impl RunManifest {
    /// Start a manifest for a run beginning now.
    pub fn start(
        organization: impl Into<String>,
        collection_name: impl Into<String>,
        tool_version: impl Into<String>,
    ) -> Self {
        Self {
            run_id: Uuid::now_v7(),
            organization: organization.into(),
            collection_name: collection_name.into(),
            tool_version: tool_version.into(),
            started_at: Utc::now(),
            finished_at: None,
            counts: RunCounts::default(),
        }
    }

    /// Stamp the end time and final counts.
    pub fn finish(&mut self, counts: RunCounts) {
        self.counts = counts;
        self.finished_at = Some(Utc::now());
    }

    /// Write pretty JSON to `path`.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| IngestError::Sink(format!("manifest serialization failed: {e}")))?;
        std::fs::write(path, json).map_err(|e| IngestError::io(path, e))?;
        debug!(path = %path.display(), "wrote run manifest");
        Ok(())
    }
}

/// `out/chunks.jsonl` -> `out/chunks.manifest.json`.
pub fn manifest_path(chunks_path: &Path) -> PathBuf {
    let stem = chunks_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "chunks".to_string());
    chunks_path.with_file_name(format!("{stem}.manifest.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_path_replaces_extension() {
        assert_eq!(
            manifest_path(Path::new("out/chunks.jsonl")),
            PathBuf::from("out/chunks.manifest.json")
        );
        assert_eq!(
            manifest_path(Path::new("data")),
            PathBuf::from("data.manifest.json")
        );
    }

    #[test]
    fn finish_records_counts_and_time() {
        let mut manifest = RunManifest::start("Acme", "acme_kb", "0.1.0");
        assert!(manifest.finished_at.is_none());
        manifest.finish(RunCounts {
            documents_processed: 3,
            chunks_written: 9,
            ..Default::default()
        });
        assert!(manifest.finished_at.expect("finished") >= manifest.started_at);
        assert_eq!(manifest.counts.chunks_written, 9);
    }

    #[test]
    fn write_and_read_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("chunks.manifest.json");
        let mut manifest = RunManifest::start("Acme", "acme_kb", "0.1.0");
        manifest.finish(RunCounts::default());
        manifest.write(&path).expect("write");

        let parsed: RunManifest =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("parse");
        assert_eq!(parsed.run_id, manifest.run_id);
        assert_eq!(parsed.collection_name, "acme_kb");
        assert_eq!(parsed.run_id.get_version_num(), 7);
    }
}
