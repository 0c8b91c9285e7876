//! Router error types.

use thiserror::Error;

/// Result alias for router operations.
pub type RouterResult<T> = Result<T, RouterError>;

/// Errors during router construction.
///
/// Once constructed, `handle` never fails: malformed input degrades to a
/// warned pass-through and auxiliary faults are swallowed.
#[derive(Debug, Error)]
pub enum RouterError {
    /// The wow home directory could not be resolved or created.
    #[error("home directory error: {0}")]
    Home(#[from] std::io::Error),

    /// The configuration failed to load or validate.
    #[error(transparent)]
    Config(#[from] wow_config::ConfigError),

    /// The custom rule file was unreadable.
    #[error(transparent)]
    Rules(#[from] wow_handlers::custom::RuleParseError),
}
