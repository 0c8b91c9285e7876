//! Handler verdicts.

use wow_core::ToolRequest;

/// What a handler decided about one request.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerVerdict {
    /// Pass the request through unchanged.
    Allow,
    /// Pass through a rewritten request (e.g. the `git commit` fixer).
    Mutate(ToolRequest),
    /// Reject the request (exit 2; liftable by Bypass).
    Block {
        /// Human-readable reason with a remediation hint where one exists.
        reason: String,
    },
}

impl HandlerVerdict {
    /// Whether the verdict lets the request proceed.
    #[must_use]
    pub fn is_allow(&self) -> bool {
        !matches!(self, Self::Block { .. })
    }

    /// The block reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Block { reason } => Some(reason),
            _ => None,
        }
    }
}
