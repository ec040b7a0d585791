//! Chunk records as written to persistent storage.

use orgingest_shared::{Chunk, Metadata};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Hex characters of the content hash kept in a chunk id.
const ID_HASH_LEN: usize = 16;

/// One output line: stable id, chunk text, flattened metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub id: String,
    pub content: String,
    pub metadata: Metadata,
}

impl ChunkRecord {
    pub fn from_chunk(org_slug: &str, chunk: &Chunk) -> Self {
        Self {
            id: chunk_id(org_slug, chunk),
            content: chunk.content.clone(),
            metadata: flatten_metadata(&chunk.metadata),
        }
    }
}

/// `<org slug>_<content_type>_<hash>`, where the hash covers the file path,
/// chunk index and content. Identical input always yields the same id.
pub fn chunk_id(org_slug: &str, chunk: &Chunk) -> String {
    let content_type = chunk.str_field("content_type").unwrap_or("unknown");
    let file_path = chunk.str_field("file_path").unwrap_or_default();
    let index = chunk.chunk_index().unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(file_path.as_bytes());
    hasher.update(b"\0");
    hasher.update(index.to_string().as_bytes());
    hasher.update(b"\0");
    hasher.update(chunk.content.as_bytes());
    let digest = format!("{:x}", hasher.finalize());

    format!("{org_slug}_{content_type}_{}", &digest[..ID_HASH_LEN])
}

/// Reduce metadata to scalars.
///
/// Lists become a `", "`-joined string, `null` becomes `""`, nested objects
/// are stringified as JSON. Strings, numbers and booleans pass through.
pub fn flatten_metadata(metadata: &Metadata) -> Metadata {
    metadata
        .iter()
        .map(|(key, value)| (key.clone(), flatten_value(value)))
        .collect()
}

fn flatten_value(value: &Value) -> Value {
    match value {
        Value::Null => Value::String(String::new()),
        Value::Array(items) => Value::String(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Value::Object(_) => Value::String(value.to_string()),
        scalar => scalar.clone(),
    }
}
