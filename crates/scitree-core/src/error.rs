//! Error types for scitree.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level result type for scitree operations.
pub type Result<T> = std::result::Result<T, ScitreeError>;

/// Top-level error type for scitree.
#[derive(Debug, Error)]
pub enum ScitreeError {
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    #[error("temporal error: {0}")]
    Temporal(#[from] TemporalError),

    #[error("credential error: {0}")]
    Credential(String),

    #[error("retrieval error: {0}")]
    Retrieval(String),

    #[error("temporal analysis error: {0}")]
    TemporalAnalysis(String),

    #[error("generation API error: {0}")]
    GenerationApi(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ScitreeError {
    /// Whether this error comes from a missing or rejected credential.
    #[must_use]
    pub fn is_credential(&self) -> bool {
        matches!(self, Self::Credential(_))
    }
}

/// Errors raised while loading corpus artifacts. Always fatal at startup.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("missing corpus artifact: {}", path.display())]
    MissingArtifact { path: PathBuf },

    #[error("malformed corpus artifact {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("row {row} for '{doc_id}' ({section}) is out of bounds for a matrix with {rows} rows")]
    RowOutOfBounds {
        doc_id: String,
        section: String,
        row: usize,
        rows: usize,
    },

    #[error("index mapping references unknown document '{0}'")]
    UnknownDocument(String),

    #[error("duplicate document id '{0}'")]
    DuplicateDocument(String),

    #[error("embedding matrix holds {values} values, which is not {rows} rows of dimension {dim}")]
    ShapeMismatch {
        values: usize,
        rows: usize,
        dim: usize,
    },
}

/// Errors related to temporal values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("recency weight {0} is outside 0..=10")]
    RecencyOutOfRange(i64),

    #[error("cannot derive a publication date from '{0}'")]
    UnrecognizedIdentifier(String),
}
