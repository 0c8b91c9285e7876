//! Grep handler.

use regex::Regex;
use std::sync::LazyLock;

use wow_core::ToolRequest;
use wow_policy::{FastPathResult, classify};

use crate::context::PolicyContext;
use crate::outcome::HandlerVerdict;
use crate::patterns::SYSTEM_DIRS;
use crate::{ToolHandler, note_operation, warn_or_block};

/// Search regexes that hunt for credentials or PII.
static SENSITIVE_SEARCHES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)passw(or)?d", "password hunt"),
        (r"(?i)api[_-]?key", "API key hunt"),
        (r"(?i)secret", "secret hunt"),
        (r"(?i)BEGIN.{0,10}PRIVATE KEY", "private key hunt"),
        (r"\\d\{3\}-\\d\{2\}-\\d\{4\}|\d{3}-\d{2}-\d{4}", "SSN-shaped search"),
        (r"(?i)credit.?card|\bcvv\b", "payment data hunt"),
    ]
    .iter()
    .map(|(p, label)| (Regex::new(p).expect("invalid regex"), *label))
    .collect()
});

/// The Grep tool handler.
pub struct GrepHandler;

impl ToolHandler for GrepHandler {
    fn tool(&self) -> &'static str {
        "Grep"
    }

    fn handle(&self, request: &ToolRequest, ctx: &mut dyn PolicyContext) -> HandlerVerdict {
        let pattern = request.field("pattern").unwrap_or_default();
        note_operation(ctx, self.tool(), pattern);

        if let Some(path) = request.non_empty_field("path") {
            // Cheap pre-filter first; an obviously-dangerous root is final.
            if ctx.config_bool("performance.fast_path_enabled", true) {
                if let FastPathResult::Block { reason } = classify(path, "search") {
                    return HandlerVerdict::Block { reason };
                }
            }
            if SYSTEM_DIRS.is_match(path) {
                return HandlerVerdict::Block {
                    reason: format!("search rooted in protected directory {path}"),
                };
            }
            if path.contains("..") {
                let verdict =
                    warn_or_block(ctx, self.tool(), &format!("search root traverses upward: {path}"));
                if !verdict.is_allow() {
                    return verdict;
                }
            }
        }

        for (sensitive, label) in SENSITIVE_SEARCHES.iter() {
            if sensitive.is_match(pattern) {
                let verdict =
                    warn_or_block(ctx, self.tool(), &format!("search pattern looks like a {label}"));
                if !verdict.is_allow() {
                    return verdict;
                }
                break;
            }
        }

        HandlerVerdict::Allow
    }
}
