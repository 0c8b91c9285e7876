//! Session store error types.

use thiserror::Error;

/// Result alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors produced by the session store.
#[derive(Debug, Error)]
pub enum SessionError {
    /// `increment`/`decrement` was called on a non-numeric value.
    #[error("value for {key} is not numeric: {value}")]
    InvalidType {
        /// The offending key.
        key: String,
        /// The value that failed to parse.
        value: String,
    },

    /// State file IO failure.
    ///
    /// Callers in the pipeline log this at WARN and continue; persistence
    /// faults never change a security decision.
    #[error("state io error: {0}")]
    Io(#[from] std::io::Error),

    /// A state-file line had no `=` separator or invalid base-64.
    #[error("malformed state line {line_no}: {line}")]
    MalformedLine {
        /// 1-based line number in the state file.
        line_no: usize,
        /// The offending line (truncated).
        line: String,
    },
}
