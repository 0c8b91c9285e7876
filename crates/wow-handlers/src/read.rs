//! Read handler: three-tier path classification.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use wow_core::ToolRequest;

use crate::context::PolicyContext;
use crate::outcome::HandlerVerdict;
use crate::patterns::TRAVERSAL_TARGETS;
use crate::{ToolHandler, note_operation, warn_or_block};

/// Tier 1: reads rejected outright.
static TIER1_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/etc/(shadow|gshadow|sudoers)(\.|/|$)").expect("invalid regex")
});

/// Tier 2: reads that warn (block in strict mode).
static TIER2_WARN: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"^/etc/passwd$", "system account list"),
        (r"^/root(/|$)", "root home directory"),
        (r"(^|/)\.ssh/(id_[a-z0-9]+|.*_key)$", "private SSH key"),
        (r"(^|/)\.aws/credentials$", "AWS credentials file"),
        (r"(^|/)(gcloud|\.config/gcloud)/.*credentials", "GCP credentials"),
        (r"(^|/)\.gnupg/", "GPG keyring"),
        (r"wallet\.(dat|json)$", "wallet file"),
        (r"^/proc/\d+/environ$", "process environment"),
        (r"(^|/)\.env(\.[A-Za-z0-9_.-]+)?$", "dotenv file"),
        (r"(^|/)secrets?\.[A-Za-z0-9]+$", "secrets file"),
        (r"(^|/)(Cookies|cookies\.sqlite|Login Data|logins\.json)$", "browser credential store"),
    ]
    .iter()
    .map(|(p, label)| (Regex::new(p).expect("invalid regex"), *label))
    .collect()
});

/// Tier 3: allowed but tracked.
static TIER3_TRACK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.(db|sqlite|sqlite3)$").expect("invalid regex"));

/// Reads per session above which the volume warning fires.
const READ_VOLUME_LIMIT: i64 = 50;

/// The Read tool handler.
pub struct ReadHandler;

impl ToolHandler for ReadHandler {
    fn tool(&self) -> &'static str {
        "Read"
    }

    fn handle(&self, request: &ToolRequest, ctx: &mut dyn PolicyContext) -> HandlerVerdict {
        let Some(path) = request.non_empty_field("file_path") else {
            return warn_or_block(ctx, self.tool(), "Read request without a file path");
        };
        note_operation(ctx, self.tool(), path);

        if TIER1_BLOCK.is_match(path) {
            return HandlerVerdict::Block {
                reason: format!("{path} holds system authentication data"),
            };
        }

        if path.contains("..") && TRAVERSAL_TARGETS.is_match(path) {
            return HandlerVerdict::Block {
                reason: format!("path traversal toward a sensitive target: {path}"),
            };
        }

        for (pattern, label) in TIER2_WARN.iter() {
            if pattern.is_match(path) {
                let verdict =
                    warn_or_block(ctx, self.tool(), &format!("read of sensitive file: {label}"));
                if !verdict.is_allow() {
                    return verdict;
                }
                break;
            }
        }

        if TIER3_TRACK.is_match(path) {
            debug!(path = %path, "database file read tracked");
            ctx.track_event("database_read", path);
        }

        let reads = ctx.increment_metric("metrics:read_operations");
        if reads > READ_VOLUME_LIMIT {
            let verdict = warn_or_block(
                ctx,
                self.tool(),
                &format!("high read volume this session ({reads} reads)"),
            );
            if !verdict.is_allow() {
                return verdict;
            }
        }

        HandlerVerdict::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::StubContext;
    use serde_json::json;

    fn request(path: &str) -> ToolRequest {
        ToolRequest::from_json(&json!({"tool": "Read", "file_path": path}).to_string()).unwrap()
    }

    #[test]
    fn test_ordinary_read_allows() {
        let mut ctx = StubContext::default();
        let verdict = ReadHandler.handle(&request("src/app.ts"), &mut ctx);
        assert_eq!(verdict, HandlerVerdict::Allow);
        assert!(ctx.warnings.is_empty());
    }

    #[test]
    fn test_tier1_blocks_even_outside_strict() {
        for path in ["/etc/shadow", "/etc/gshadow", "/etc/sudoers", "/etc/sudoers/extra"] {
            let mut ctx = StubContext::default();
            let verdict = ReadHandler.handle(&request(path), &mut ctx);
            assert!(matches!(verdict, HandlerVerdict::Block { .. }), "expected block: {path}");
        }
    }

    #[test]
    fn test_tier2_warns_by_default() {
        for path in [
            "/etc/passwd",
            "/root/notes.txt",
            "/home/user/.ssh/id_rsa",
            "/home/user/.aws/credentials",
            "/proc/1234/environ",
            "/work/project/.env.production",
            "/work/project/secrets.yaml",
            "/home/user/.config/wallet.json",
        ] {
            let mut ctx = StubContext::default();
            let verdict = ReadHandler.handle(&request(path), &mut ctx);
            assert_eq!(verdict, HandlerVerdict::Allow, "{path}");
            assert_eq!(ctx.warnings.len(), 1, "{path}");
        }
    }

    #[test]
    fn test_tier2_blocks_in_strict() {
        let mut ctx = StubContext::strict();
        let verdict = ReadHandler.handle(&request("/etc/passwd"), &mut ctx);
        assert!(matches!(verdict, HandlerVerdict::Block { .. }));
    }

    #[test]
    fn test_tier3_tracked_not_warned() {
        let mut ctx = StubContext::default();
        let verdict = ReadHandler.handle(&request("data/app.sqlite"), &mut ctx);
        assert_eq!(verdict, HandlerVerdict::Allow);
        assert!(ctx.warnings.is_empty());
        assert!(ctx.events.iter().any(|(t, d)| t == "database_read" && d == "data/app.sqlite"));
    }

    #[test]
    fn test_traversal_with_sensitive_target_blocks() {
        let mut ctx = StubContext::default();
        let verdict = ReadHandler.handle(&request("../../../etc/passwd"), &mut ctx);
        assert!(matches!(verdict, HandlerVerdict::Block { .. }));
    }

    #[test]
    fn test_read_volume_warning() {
        let mut ctx = StubContext::default();
        for i in 0..=READ_VOLUME_LIMIT {
            let verdict = ReadHandler.handle(&request(&format!("src/f{i}.rs")), &mut ctx);
            assert_eq!(verdict, HandlerVerdict::Allow);
        }
        assert!(ctx.warnings.iter().any(|w| w.contains("high read volume")));
    }

    #[test]
    fn test_env_sample_is_not_dotenv() {
        // `.env.sample` still matches the dotenv tier by suffix rules; a
        // plain `environment.ts` must not.
        let mut ctx = StubContext::default();
        let verdict = ReadHandler.handle(&request("src/environment.ts"), &mut ctx);
        assert_eq!(verdict, HandlerVerdict::Allow);
        assert!(ctx.warnings.is_empty());
    }
}
