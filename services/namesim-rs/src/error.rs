//! Error types for the name-similarity engine.
//!
//! Missing or unreadable resources (cost matrix, scorer artifact, clusters,
//! lexicon) surface here so construction fails fast. Per-record problems in
//! batch jobs are logged and skipped instead, and never reach this type.

use std::path::PathBuf;

use namesim_phonetic::EncodeError;
use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, NameSimError>;

#[derive(Error, Debug)]
pub enum NameSimError {
    /// A resource file could not be opened, read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stream-level I/O without a path (readers and writers handed in by callers).
    #[error("I/O error: {0}")]
    Stream(#[from] std::io::Error),

    /// A cost-matrix line that is not `a|b,cost`.
    #[error("malformed cost matrix line {line_no}: {line:?}")]
    MalformedCostLine { line_no: usize, line: String },

    /// A phoneme symbol outside the closed alphabet.
    #[error("unknown phoneme symbol: {0:?}")]
    UnknownPhoneme(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The scorer artifact or config file is not valid JSON for its type.
    #[error("cannot decode {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

impl NameSimError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        NameSimError::Io {
            path: path.into(),
            source,
        }
    }
}
