//! Task (sub-agent launcher) handler.

use chrono::Utc;
use regex::Regex;
use std::sync::LazyLock;

use wow_core::ToolRequest;

use crate::context::PolicyContext;
use crate::outcome::HandlerVerdict;
use crate::{ToolHandler, note_operation, warn_or_block};

/// Sub-agent launches allowed per minute.
const LAUNCHES_PER_MINUTE: usize = 5;
/// Sub-agent launches allowed per session.
const LAUNCHES_PER_SESSION: i64 = 20;

/// Prompt patterns that flag a launch for review.
static SUSPECT_PROMPTS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)(harvest|collect|gather|list)\b.{0,40}\b(password|credential|api.?key|token|secret)",
         "credential harvesting"),
        (r"(?i)(exfiltrate|upload|send|post)\b.{0,40}\b(file|data|content|secret)s?\b.{0,40}\b(to|at)\b",
         "data exfiltration"),
        (r"(?i)(port.?scan|nmap|masscan|enumerate\s+hosts)", "network scanning"),
        (r"(?i)(modify|edit|overwrite)\b.{0,30}/(etc|boot|bin)\b", "system modification"),
        (r"(?i)(loop\s+forever|infinitely|never\s+stop|while\s*\(?\s*true)", "unbounded loop"),
    ]
    .iter()
    .map(|(p, label)| (Regex::new(p).expect("invalid regex"), *label))
    .collect()
});

/// The Task tool handler.
pub struct TaskHandler;

impl ToolHandler for TaskHandler {
    fn tool(&self) -> &'static str {
        "Task"
    }

    fn handle(&self, request: &ToolRequest, ctx: &mut dyn PolicyContext) -> HandlerVerdict {
        let prompt = request.field("prompt").unwrap_or_default();
        note_operation(ctx, self.tool(), prompt);

        let launches = ctx.increment_metric("metrics:task_launches");
        if launches > LAUNCHES_PER_SESSION {
            return HandlerVerdict::Block {
                reason: format!(
                    "sub-agent launch limit reached ({LAUNCHES_PER_SESSION} per session)"
                ),
            };
        }

        if self.burst_exceeded(ctx) {
            return HandlerVerdict::Block {
                reason: format!("sub-agent launch burst ({LAUNCHES_PER_MINUTE} per minute)"),
            };
        }

        for (pattern, label) in SUSPECT_PROMPTS.iter() {
            if pattern.is_match(prompt) {
                let verdict =
                    warn_or_block(ctx, self.tool(), &format!("sub-agent prompt flags {label}"));
                if !verdict.is_allow() {
                    return verdict;
                }
                break;
            }
        }

        HandlerVerdict::Allow
    }
}

impl TaskHandler {
    /// Track launch timestamps in session state and enforce the per-minute
    /// ceiling.
    fn burst_exceeded(&self, ctx: &mut dyn PolicyContext) -> bool {
        let now = Utc::now().timestamp();
        let raw = ctx.session_get("session:task_launch_times").unwrap_or_default();
        let mut times: Vec<i64> = raw
            .split(',')
            .filter_map(|t| t.parse().ok())
            .filter(|t| now - t < 60)
            .collect();
        if times.len() >= LAUNCHES_PER_MINUTE {
            return true;
        }
        times.push(now);
        let encoded: Vec<String> = times.iter().map(ToString::to_string).collect();
        ctx.session_set("session:task_launch_times", &encoded.join(","));
        false
    }
}
