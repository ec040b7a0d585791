//! Error types for orgingest.
//!
//! Library crates use [`IngestError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all orgingest operations.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Missing or invalid configuration. Fatal: aborts before processing.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error (unreadable document, unwritable sink, ...).
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Tokenizer encode/decode failure.
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    /// Unparsable document content (e.g. an issue field).
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Chunk sink failure.
    #[error("sink error: {0}")]
    Sink(String),

    /// Data validation error.
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, IngestError>;

impl IngestError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error must abort the whole run.
    ///
    /// Everything except configuration errors is isolated to the document
    /// (or batch) that raised it.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}
