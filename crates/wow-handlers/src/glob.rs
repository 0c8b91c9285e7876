//! Glob handler.

use regex::Regex;
use std::sync::LazyLock;

use wow_core::ToolRequest;

use crate::context::PolicyContext;
use crate::outcome::HandlerVerdict;
use crate::patterns::SYSTEM_DIRS;
use crate::{ToolHandler, note_operation, warn_or_block};

/// Patterns sweeping the filesystem from the root.
static OVERLY_BROAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/(\*\*|\*)(/\*+)*").expect("invalid regex"));

/// Globs that enumerate credential material.
static CREDENTIAL_GLOBS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\.env(\*|\b|$)",
        r"id_(rsa|dsa|ecdsa|ed25519)",
        r"\*\*?/\.(aws|ssh|gnupg)\b",
        r"credentials",
        r"\.(pem|key|p12)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid regex"))
    .collect()
});

/// The Glob tool handler.
pub struct GlobHandler;

impl ToolHandler for GlobHandler {
    fn tool(&self) -> &'static str {
        "Glob"
    }

    fn handle(&self, request: &ToolRequest, ctx: &mut dyn PolicyContext) -> HandlerVerdict {
        let pattern = request.field("pattern").unwrap_or_default();
        note_operation(ctx, self.tool(), pattern);

        if let Some(path) = request.non_empty_field("path") {
            if SYSTEM_DIRS.is_match(path) {
                return HandlerVerdict::Block {
                    reason: format!("glob rooted in protected directory {path}"),
                };
            }
            if path.contains("..") {
                let verdict =
                    warn_or_block(ctx, self.tool(), &format!("glob root traverses upward: {path}"));
                if !verdict.is_allow() {
                    return verdict;
                }
            }
        }

        if OVERLY_BROAD.is_match(pattern) {
            let verdict = warn_or_block(
                ctx,
                self.tool(),
                &format!("glob sweeps the filesystem root: {pattern}"),
            );
            if !verdict.is_allow() {
                return verdict;
            }
        }

        if CREDENTIAL_GLOBS.iter().any(|p| p.is_match(pattern)) {
            let verdict = warn_or_block(
                ctx,
                self.tool(),
                &format!("glob enumerates credential material: {pattern}"),
            );
            if !verdict.is_allow() {
                return verdict;
            }
        }

        if pattern.contains("..") {
            let verdict =
                warn_or_block(ctx, self.tool(), &format!("glob pattern traverses upward: {pattern}"));
            if !verdict.is_allow() {
                return verdict;
            }
        }

        HandlerVerdict::Allow
    }
}
