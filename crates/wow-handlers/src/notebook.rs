//! NotebookEdit handler: notebook path tiers and cell-source validation.

use regex::Regex;
use std::sync::LazyLock;

use wow_core::ToolRequest;

use crate::context::PolicyContext;
use crate::outcome::HandlerVerdict;
use crate::{ToolHandler, note_operation, warn_or_block};

/// Tier 1: system-owned notebooks are never edited.
static TIER1_PATHS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/(etc|usr|boot|bin|sbin|lib|opt/conda/share)(/|$)").expect("invalid regex")
});

/// Tier 2: privileged notebook locations warn.
static TIER2_PATHS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/root(/|$)|(^|/)\.(jupyter|ipython)(/|$)").expect("invalid regex")
});

/// Cell source that is rejected outright.
static BLOCKED_SOURCE: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?m)^\s*%%?bash\b", "bash cell magic"),
        (r"(?m)^\s*!\s*(rm|sudo)\b", "shell escape running rm/sudo"),
        (r"\b(curl|wget)\b[^\n|]*\|\s*(ba)?sh\b", "remote script piped to shell"),
        (r"\b(eval|exec|compile)\s*\(", "dynamic code execution"),
        (r"__import__\s*\(", "dynamic import"),
        (r"\bos\.system\s*\([^)]*\brm\b", "os.system removal"),
        (r"\bsubprocess\.\w+\s*\([^)]*\brm\b", "subprocess removal"),
    ]
    .iter()
    .map(|(p, label)| (Regex::new(p).expect("invalid regex"), *label))
    .collect()
});

/// Builtins that merit a look but not a block.
static SUSPICIOUS_SOURCE: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"\bgetattr\s*\(", "getattr"),
        (r"\bglobals\s*\(\s*\)", "globals()"),
        (r"\blocals\s*\(\s*\)", "locals()"),
        (r"\b__builtins__\b", "__builtins__"),
        (r"\bimportlib\b", "importlib"),
        (r"\bctypes\b", "ctypes"),
    ]
    .iter()
    .map(|(p, label)| (Regex::new(p).expect("invalid regex"), *label))
    .collect()
});

/// The NotebookEdit tool handler.
pub struct NotebookEditHandler;

impl ToolHandler for NotebookEditHandler {
    fn tool(&self) -> &'static str {
        "NotebookEdit"
    }

    fn handle(&self, request: &ToolRequest, ctx: &mut dyn PolicyContext) -> HandlerVerdict {
        let Some(path) = request.non_empty_field("notebook_path") else {
            return warn_or_block(ctx, self.tool(), "NotebookEdit request without a notebook path");
        };
        note_operation(ctx, self.tool(), path);

        if TIER1_PATHS.is_match(path) {
            return HandlerVerdict::Block {
                reason: format!("{path} is a system notebook location"),
            };
        }

        if TIER2_PATHS.is_match(path) {
            let verdict = warn_or_block(
                ctx,
                self.tool(),
                &format!("notebook in a privileged location: {path}"),
            );
            if !verdict.is_allow() {
                return verdict;
            }
        }

        let source = request.field("new_source").unwrap_or_default();
        for (pattern, label) in BLOCKED_SOURCE.iter() {
            if pattern.is_match(source) {
                return HandlerVerdict::Block {
                    reason: format!("cell source contains {label}"),
                };
            }
        }

        for (pattern, label) in SUSPICIOUS_SOURCE.iter() {
            if pattern.is_match(source) {
                let verdict = warn_or_block(
                    ctx,
                    self.tool(),
                    &format!("cell source uses suspicious builtin {label}"),
                );
                if !verdict.is_allow() {
                    return verdict;
                }
                break;
            }
        }

        HandlerVerdict::Allow
    }
}
