//! Fast-path classifier: cheap allow/block/continue on paths.
//!
//! The classifier is a pure function over the request path. It resolves the
//! obvious cases in a handful of regex scans so the deep handlers only run
//! for the ambiguous middle; the router skips it entirely when
//! `performance.fast_path_enabled` is off.

use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use std::sync::LazyLock;

/// Ternary fast-path outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FastPathResult {
    /// Obviously safe; skip deep validation.
    Allow,
    /// Obviously dangerous; reject without deep validation.
    Block {
        /// Human-readable reason.
        reason: String,
    },
    /// Neither; run the full handler.
    Continue,
}

/// Absolute paths that are catastrophic to touch at all.
static CATASTROPHIC: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^/etc/shadow\b",
        r"^/etc/sudoers\b",
        r"^/etc/gshadow\b",
        r"^/sys/",
        r"^/boot/",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid regex"))
    .collect()
});

/// Traversal targets that make a `..` path dangerous.
static TRAVERSAL_TARGETS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(etc|root|shadow|passwd|sudoers|\.ssh|\.aws|\.gnupg)").expect("invalid regex")
});

/// Suspicious names that disqualify a relative path from the fast allow.
static SUSPICIOUS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\.env(\.|$)",
        r"(^|/)id_(rsa|dsa|ecdsa|ed25519)(\.|$)",
        r"credentials",
        r"secrets?\.",
        r"/proc/\d+/environ",
        r"wallet\.(dat|json)",
        r"\.(pem|key|p12|pfx)$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid regex"))
    .collect()
});

/// Extensions and file names that are safe to touch without deep checks.
static WHITELIST: LazyLock<GlobSet> = LazyLock::new(|| {
    let mut builder = GlobSetBuilder::new();
    for pattern in [
        "*.js", "*.jsx", "*.ts", "*.tsx", "*.py", "*.rs", "*.go", "*.java", "*.c", "*.h",
        "*.cpp", "*.hpp", "*.md", "*.markdown", "*.json", "*.yaml", "*.yml", "*.toml",
        "*.txt", "*.css", "*.scss", "*.html", "*.svg", "*.lock", "README*", "Makefile",
        "Dockerfile", "LICENSE*", "CHANGELOG*", ".gitignore",
    ] {
        builder.add(Glob::new(pattern).expect("invalid glob"));
    }
    builder.build().expect("invalid glob set")
});

/// Classify a path: obviously dangerous, obviously safe, or needs the deep
/// handlers.
///
/// `operation` names what the caller is about to do with the path (read,
/// write, glob, ...) and only flavours the block reason.
#[must_use]
pub fn classify(path: &str, operation: &str) -> FastPathResult {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return FastPathResult::Continue;
    }

    for pattern in CATASTROPHIC.iter() {
        if pattern.is_match(trimmed) {
            return FastPathResult::Block {
                reason: format!("{operation} of protected system path {trimmed}"),
            };
        }
    }

    if trimmed.contains("..") && TRAVERSAL_TARGETS.is_match(trimmed) {
        return FastPathResult::Block {
            reason: format!("{operation} traverses into a sensitive location: {trimmed}"),
        };
    }

    if !trimmed.starts_with('/') && !trimmed.contains("..") {
        let suspicious = SUSPICIOUS.iter().any(|p| p.is_match(trimmed));
        let name = trimmed.rsplit('/').next().unwrap_or(trimmed);
        if !suspicious && WHITELIST.is_match(name) {
            return FastPathResult::Allow;
        }
    }

    FastPathResult::Continue
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catastrophic_paths_block() {
        for path in ["/etc/shadow", "/etc/sudoers", "/etc/gshadow", "/sys/kernel/x", "/boot/vmlinuz"] {
            assert!(
                matches!(classify(path, "read"), FastPathResult::Block { .. }),
                "expected block: {path}"
            );
        }
    }

    #[test]
    fn test_traversal_into_sensitive_blocks() {
        assert!(matches!(
            classify("../../etc/passwd", "read"),
            FastPathResult::Block { .. }
        ));
        assert!(matches!(
            classify("../../../root/.ssh/id_rsa", "read"),
            FastPathResult::Block { .. }
        ));
    }

    #[test]
    fn test_benign_traversal_continues() {
        // Traversal without a sensitive target needs the deep handlers, not
        // an outright block.
        assert_eq!(classify("../sibling/src/main.c", "read"), FastPathResult::Continue);
    }

    #[test]
    fn test_relative_source_files_allow() {
        for path in ["src/app.ts", "README.md", "Cargo.toml", "Makefile", "docs/guide.md"] {
            assert_eq!(classify(path, "read"), FastPathResult::Allow, "expected allow: {path}");
        }
    }

    #[test]
    fn test_suspicious_relative_names_continue() {
        for path in [".env.local", "config/credentials.json", "deploy/secrets.yaml", "id_rsa.pub"] {
            assert_eq!(
                classify(path, "read"),
                FastPathResult::Continue,
                "expected continue: {path}"
            );
        }
    }

    #[test]
    fn test_absolute_paths_continue() {
        assert_eq!(classify("/home/user/notes.md", "read"), FastPathResult::Continue);
        assert_eq!(classify("/tmp/script.sh", "write"), FastPathResult::Continue);
    }

    #[test]
    fn test_unknown_extension_continues() {
        assert_eq!(classify("bin/tool.wasm", "read"), FastPathResult::Continue);
    }

    #[test]
    fn test_empty_path_continues() {
        assert_eq!(classify("  ", "read"), FastPathResult::Continue);
    }

    #[test]
    fn test_classifier_is_pure() {
        let a = classify("src/app.ts", "read");
        let b = classify("src/app.ts", "read");
        assert_eq!(a, b);
    }
}
