//! Per-tool deep validators for the wow-system core.
//!
//! Every handler implements [`ToolHandler`]: it receives the parsed
//! request plus a [`PolicyContext`] injected by the router, and returns a
//! [`HandlerVerdict`]: pass through, pass through mutated, or block.
//! Warnings are recorded on the context; "strict mode"
//! (`enforcement.strict_mode` or `enforcement.block_on_violation`)
//! escalates them to blocks through the shared
//! [`PolicyContext::should_block`] helper.
//!
//! The [`custom`] module is the user-loaded rule DSL evaluated before any
//! handler's built-in rules.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod context;
/// User-loaded declarative rules.
pub mod custom;
mod outcome;
/// Shared pattern tables (credentials, malicious content, system paths).
pub mod patterns;

mod edit;
mod glob;
mod grep;
mod notebook;
mod read;
mod shell;
mod task;
mod web_fetch;
mod web_search;
mod write;

pub use context::PolicyContext;
pub use custom::{CustomRuleEngine, RuleAction};
pub use outcome::HandlerVerdict;

pub use edit::EditHandler;
pub use glob::GlobHandler;
pub use grep::GrepHandler;
pub use notebook::NotebookEditHandler;
pub use read::ReadHandler;
pub use shell::ShellHandler;
pub use task::TaskHandler;
pub use web_fetch::WebFetchHandler;
pub use web_search::WebSearchHandler;
pub use write::WriteHandler;

use wow_core::ToolRequest;

/// A per-tool deep validator.
pub trait ToolHandler: Send + Sync {
    /// The tool name this handler owns (matches the request's `tool`
    /// field).
    fn tool(&self) -> &'static str;

    /// Validate (and possibly rewrite) one request.
    fn handle(&self, request: &ToolRequest, ctx: &mut dyn PolicyContext) -> HandlerVerdict;
}

/// All built-in handlers, one per supported tool.
#[must_use]
pub fn builtin_handlers() -> Vec<Box<dyn ToolHandler>> {
    vec![
        Box::new(ShellHandler),
        Box::new(WriteHandler),
        Box::new(EditHandler),
        Box::new(ReadHandler),
        Box::new(GlobHandler),
        Box::new(GrepHandler),
        Box::new(TaskHandler),
        Box::new(WebFetchHandler),
        Box::new(WebSearchHandler),
        Box::new(NotebookEditHandler),
    ]
}

/// Shared entry bookkeeping: bump the tool's operation metric and track
/// the session event.
fn note_operation(ctx: &mut dyn PolicyContext, tool: &str, operation: &str) {
    let metric = format!("metrics:{}_operations", tool.to_lowercase());
    ctx.increment_metric(&metric);
    ctx.track_event(&format!("{}_operation", tool.to_lowercase()), operation);
}

/// Shared warn-or-block: in strict mode the warning becomes a block.
fn warn_or_block(ctx: &mut dyn PolicyContext, tool: &str, message: &str) -> HandlerVerdict {
    use wow_core::Severity;
    if ctx.should_block(Severity::Warn) {
        HandlerVerdict::Block {
            reason: format!(
                "{message} (strict mode; set enforcement.strict_mode=false to allow with warnings)"
            ),
        }
    } else {
        ctx.record_warning(tool, message);
        HandlerVerdict::Allow
    }
}
