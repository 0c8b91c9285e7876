//! Edit handler.

use regex::Regex;
use std::sync::LazyLock;

use wow_core::ToolRequest;

use crate::context::PolicyContext;
use crate::outcome::HandlerVerdict;
use crate::patterns::{self, PathCheck};
use crate::{ToolHandler, note_operation, warn_or_block};

/// Identifiers whose removal suggests security code is being edited away.
static SECURITY_IDENTIFIERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(validate_\w+|sanitize_\w+|authenticate\w*|authorize\w*)\b|return\s+1\b|exit\s+1\b")
        .expect("invalid regex")
});

/// Replacement content that must never be introduced by an edit.
static DANGEROUS_REPLACEMENTS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)\brm\s+-[a-z]*r[a-z]*f", "recursive delete"),
        (r"(?i)\bchmod\s+(-[a-z]+\s+)*777\b", "world-writable permissions"),
        (r"(?i)\bdd\b[^|\n]*\bof=/dev/", "raw device write"),
        (r":\(\)\s*\{\s*:\s*\|\s*:\s*&\s*\}\s*;\s*:", "fork bomb"),
        (r"\beval\s+\$", "eval over a variable"),
        (r"(?i)#\s*(bypass|backdoor)\s*$", "bypass/backdoor marker comment"),
    ]
    .iter()
    .map(|(p, label)| (Regex::new(p).expect("invalid regex"), *label))
    .collect()
});

/// The Edit tool handler.
pub struct EditHandler;

impl ToolHandler for EditHandler {
    fn tool(&self) -> &'static str {
        "Edit"
    }

    fn handle(&self, request: &ToolRequest, ctx: &mut dyn PolicyContext) -> HandlerVerdict {
        let path = request.field("file_path").unwrap_or_default();
        note_operation(ctx, self.tool(), path);

        if let PathCheck::Block(reason) = patterns::validate_write_path(path) {
            return HandlerVerdict::Block { reason };
        }

        let max = ctx.config_int("rules.max_file_operations", 0);
        let count = ctx.increment_metric("metrics:file_operations");
        if max > 0 && count > max {
            return HandlerVerdict::Block {
                reason: format!(
                    "session file-operation limit reached ({max}); raise rules.max_file_operations or start a new session"
                ),
            };
        }

        let old_string = request.field("old_string").unwrap_or_default();
        if old_string.is_empty() {
            return HandlerVerdict::Block {
                reason: "edit with an empty old_string replaces nothing deterministically"
                    .to_string(),
            };
        }

        let new_string = request.field("new_string").unwrap_or_default();
        for (pattern, label) in DANGEROUS_REPLACEMENTS.iter() {
            if pattern.is_match(new_string) {
                return HandlerVerdict::Block {
                    reason: format!("replacement introduces dangerous content: {label}"),
                };
            }
        }

        if SECURITY_IDENTIFIERS.is_match(old_string) {
            let verdict = warn_or_block(
                ctx,
                self.tool(),
                &format!("edit touches security-relevant code in {path}"),
            );
            if !verdict.is_allow() {
                return verdict;
            }
        }

        if !std::path::Path::new(path).exists() {
            let verdict =
                warn_or_block(ctx, self.tool(), &format!("edit target {path} does not exist"));
            if !verdict.is_allow() {
                return verdict;
            }
        }

        HandlerVerdict::Allow
    }
}
