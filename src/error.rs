//! Error types for the cleaning step.

use thiserror::Error;

/// Failures raised by the data layer and the artifact store.
#[derive(Error, Debug)]
pub enum CleaningError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("invalid artifact reference '{0}'")]
    InvalidReference(String),

    #[error("artifact '{0}' not found")]
    ArtifactNotFound(String),

    #[error("artifact store unavailable at {0}")]
    StoreUnavailable(String),
}

/// Result type alias for the data layer.
pub type Result<T> = std::result::Result<T, CleaningError>;
