//! Shell (Bash) handler.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use wow_core::{ToolRequest, text};

use crate::context::PolicyContext;
use crate::outcome::HandlerVerdict;
use crate::{ToolHandler, note_operation, warn_or_block};

/// Catastrophic command patterns rejected outright by the handler.
///
/// The policy table already catches the critical tier; this catalogue is
/// the wider net of commands that are blockable (and therefore liftable by
/// Bypass).
static CATASTROPHIC: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)\brm\s+-[a-z]*r[a-z]*\s+/(etc|usr|var|bin|sbin|boot|home|lib)(/|\s|$)",
         "recursive removal of a system directory"),
        (r"(?i)\bsudo\s+rm\s+-[a-z]*r[a-z]*f?[a-z]*\b", "privileged recursive removal"),
        (r"(?i)\bdd\b[^|]*\bof=/dev/", "raw write to a device node"),
        (r"(?i)\bmkfs(\.[a-z0-9]+)?\b", "filesystem creation"),
        (r":\(\)\s*\{\s*:\s*\|\s*:\s*&\s*\}\s*;\s*:", "fork bomb"),
        (r"(?i)\bchmod\s+(-[a-z]+\s+)*777\s+/(\s|$)", "world-writable root"),
        (r"(^|\s)>{1,2}\s*/(etc|bin|sbin|boot|usr)/", "redirect into a system directory"),
        (r"\beval\s+\$", "eval over a variable"),
        (r"(?i)\bshutdown\b|\breboot\b|\bhalt\s+-f\b", "host power control"),
    ]
    .iter()
    .map(|(p, label)| (Regex::new(p).expect("invalid regex"), *label))
    .collect()
});

static GIT_COMMIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bgit\s+commit\b").expect("invalid regex"));
static HAS_AUTHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"--author(=|\s)").expect("invalid regex"));

/// Default full author identity appended to `git commit` when absent.
const DEFAULT_AUTHOR: &str = "WOW System <wow-system@localhost>";

/// The Bash tool handler.
pub struct ShellHandler;

impl ToolHandler for ShellHandler {
    fn tool(&self) -> &'static str {
        "Bash"
    }

    fn handle(&self, request: &ToolRequest, ctx: &mut dyn PolicyContext) -> HandlerVerdict {
        let Some(command) = request.non_empty_field("command") else {
            // Malformed input warns and passes through.
            return warn_or_block(ctx, self.tool(), "Bash request without a command");
        };
        note_operation(ctx, self.tool(), command);

        let max = ctx.config_int("rules.max_bash_commands", 0);
        let count = ctx.increment_metric("metrics:bash_commands");
        if max > 0 && count > max {
            return HandlerVerdict::Block {
                reason: format!(
                    "session shell-command limit reached ({max}); raise rules.max_bash_commands or start a new session"
                ),
            };
        }

        let normalized = text::normalize_command(command);
        for (pattern, label) in CATASTROPHIC.iter() {
            if pattern.is_match(&normalized) {
                return HandlerVerdict::Block { reason: format!("dangerous command: {label}") };
            }
        }

        if GIT_COMMIT.is_match(&normalized) {
            if let Some(fixed) = fix_git_commit(command, ctx) {
                debug!("git commit rewritten");
                ctx.track_event("bash_mutation", &fixed);
                return HandlerVerdict::Mutate(request.with_field("command", fixed));
            }
        }

        HandlerVerdict::Allow
    }
}

/// Strip the configured emoji set from the message and append
/// `--author` when absent. Returns `None` when nothing changed.
fn fix_git_commit(command: &str, ctx: &dyn PolicyContext) -> Option<String> {
    let mut fixed = strip_emoji(command, &ctx.config_array("rules.commit_emoji_strip"));
    let mut changed = fixed != command;

    if !HAS_AUTHOR.is_match(&fixed) {
        let author = ctx.config_str("git.author_full", DEFAULT_AUTHOR);
        fixed = format!("{} --author=\"{}\"", fixed.trim_end(), author);
        changed = true;
    }

    changed.then_some(fixed)
}

/// Remove emoji: the configured literals plus the common pictographic
/// blocks.
fn strip_emoji(input: &str, configured: &[String]) -> String {
    let mut out = input.to_string();
    for literal in configured {
        out = out.replace(literal.as_str(), "");
    }
    let cleaned: String = out.chars().filter(|c| !is_emoji(*c)).collect();
    text::collapse_whitespace(&cleaned)
}

fn is_emoji(c: char) -> bool {
    matches!(u32::from(c),
        0x1F300..=0x1F5FF   // symbols & pictographs
        | 0x1F600..=0x1F64F // emoticons
        | 0x1F680..=0x1F6FF // transport
        | 0x1F900..=0x1F9FF // supplemental symbols
        | 0x2600..=0x27BF   // misc symbols, dingbats
        | 0xFE0F..=0xFE0F   // variation selector
    )
}
