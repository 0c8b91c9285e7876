//! Privilege error types.

use thiserror::Error;

/// Result alias for privilege operations.
pub type PrivilegeResult<T> = Result<T, PrivilegeError>;

/// Errors produced by the privilege manager.
#[derive(Debug, Error)]
pub enum PrivilegeError {
    /// Activation was attempted without an interactive terminal.
    #[error("activation requires an interactive terminal; stdin is not a TTY")]
    TtyRequired,

    /// Too many failed attempts; the mode is in a lockout window.
    #[error("too many failed attempts; retry in {wait_secs}s")]
    RateLimited {
        /// Seconds remaining in the lockout window.
        wait_secs: i64,
    },

    /// Passphrase mismatch or biometric rejection.
    #[error("authentication failed")]
    AuthFailed,

    /// No passphrase is configured and the biometric provider is
    /// unavailable, so there is nothing to authenticate against.
    #[error("no authentication method configured for {mode}")]
    NoAuthMethod {
        /// The mode that could not be activated.
        mode: String,
    },

    /// A token file was present but malformed.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// Filesystem failure on privilege state files.
    ///
    /// During activation this fails closed (mode stays locked); during
    /// deactivation it fails open (mode is treated as locked anyway).
    #[error("privilege io error: {0}")]
    Io(#[from] std::io::Error),
}
