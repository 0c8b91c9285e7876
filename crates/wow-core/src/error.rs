//! Core error types.

use thiserror::Error;

/// Result alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors produced by the core types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The host sent malformed or incomplete input.
    ///
    /// Per the error-handling policy this is a *soft* failure: callers emit
    /// a warning and pass the request through unchanged.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A required request field was empty or missing.
    #[error("missing field: {field}")]
    MissingField {
        /// Name of the absent field.
        field: String,
    },

    /// JSON parse or serialization failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error while scaffolding directories.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
