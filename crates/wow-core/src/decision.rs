//! Pipeline decisions and severity tags.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::request::ToolRequest;

/// The outcome of the decision pipeline for one tool request.
///
/// Encoded to process exit codes for the host: `0` pass-through, `2` block
/// (liftable by Bypass), `3` critical block (never liftable), `4` SuperAdmin
/// required.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Pass the request through, possibly mutated by a handler.
    Allow(ToolRequest),
    /// Reject the request. Bypass privilege lifts this class of block.
    Block {
        /// Human-readable reason, printed to stderr.
        reason: String,
    },
    /// Reject the request unconditionally. No privilege lifts this.
    CriticalBlock {
        /// Human-readable reason, printed to stderr.
        reason: String,
    },
    /// Reject until SuperAdmin privilege is activated.
    SuperAdminRequired {
        /// Human-readable reason, printed to stderr.
        reason: String,
    },
}

impl Decision {
    /// The process exit code communicated to the host.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Allow(_) => 0,
            Self::Block { .. } => 2,
            Self::CriticalBlock { .. } => 3,
            Self::SuperAdminRequired { .. } => 4,
        }
    }

    /// Whether the request proceeds.
    #[must_use]
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow(_))
    }

    /// The block reason, if this decision rejects the request.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Allow(_) => None,
            Self::Block { reason }
            | Self::CriticalBlock { reason }
            | Self::SuperAdminRequired { reason } => Some(reason),
        }
    }

    /// The severity tag used when printing the reason.
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::Allow(_) => Severity::Debug,
            Self::Block { .. } | Self::SuperAdminRequired { .. } => Severity::Blocked,
            Self::CriticalBlock { .. } => Severity::Critical,
        }
    }
}

/// Severity tags prefixed to human-readable stderr lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Diagnostic detail, hidden at default log levels.
    Debug,
    /// The request proceeds but a rule matched.
    Warn,
    /// The request was rejected.
    Blocked,
    /// The request was rejected and no privilege lifts the rejection.
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debug => write!(f, "DEBUG"),
            Self::Warn => write!(f, "WARN"),
            Self::Blocked => write!(f, "BLOCKED"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}
