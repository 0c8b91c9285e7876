//! String transforms shared by the classifiers and handlers.
//!
//! Evasion checks repeatedly need the same few normalisations: collapse
//! runs of whitespace, remove escape backslashes, strip quoting, fold case.
//! Each transform is a standalone function so the heuristic sub-checks can
//! compose exactly the ones they need and test them independently.

/// Collapse runs of whitespace into single spaces and trim the ends.
#[must_use]
pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove escape backslashes (`r\m` -> `rm`).
///
/// A trailing lone backslash is dropped. Escaped backslashes (`\\`)
/// collapse to one.
#[must_use]
pub fn strip_backslashes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Remove all single and double quote characters (`r""m` -> `rm`).
#[must_use]
pub fn dequote(input: &str) -> String {
    input.chars().filter(|c| *c != '"' && *c != '\'').collect()
}

/// Lower-case the string for case-variation checks (`RM -RF` -> `rm -rf`).
#[must_use]
pub fn fold_case(input: &str) -> String {
    input.to_lowercase()
}

/// Fully normalise a shell command: backslash removal, whitespace collapse.
///
/// Quoting is deliberately preserved here; the obfuscation check compares
/// the dequoted form separately so that legitimate quoted arguments do not
/// trip the catastrophic-pattern scan.
#[must_use]
pub fn normalize_command(input: &str) -> String {
    collapse_whitespace(&strip_backslashes(input))
}

/// Count quote characters in the string.
#[must_use]
pub fn quote_count(input: &str) -> usize {
    input.chars().filter(|c| *c == '"' || *c == '\'').count()
}

/// Whether the content looks binary: NUL bytes or a known magic prefix
/// (ELF, MZ, PK).
#[must_use]
pub fn looks_binary(content: &str) -> bool {
    if content.contains('\0') || content.contains("\\x00") || content.contains("\\0") {
        return true;
    }
    let bytes = content.as_bytes();
    bytes.starts_with(b"\x7fELF") || bytes.starts_with(b"MZ") || bytes.starts_with(b"PK\x03\x04")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  rm   -rf\t /  "), "rm -rf /");
        assert_eq!(collapse_whitespace(""), "");
    }

    #[test]
    fn test_strip_backslashes() {
        assert_eq!(strip_backslashes(r"r\m -rf /"), "rm -rf /");
        assert_eq!(strip_backslashes(r"a\\b"), r"a\b");
        assert_eq!(strip_backslashes(r"trailing\"), "trailing");
    }

    #[test]
    fn test_dequote() {
        assert_eq!(dequote(r#"r""m -rf /"#), "rm -rf /");
        assert_eq!(dequote("r''m"), "rm");
        assert_eq!(dequote("plain"), "plain");
    }

    #[test]
    fn test_normalize_command() {
        assert_eq!(normalize_command("rm    -rf   /tmp/x"), "rm -rf /tmp/x");
        assert_eq!(normalize_command(r"su\do rm"), "sudo rm");
    }

    #[test]
    fn test_quote_count() {
        assert_eq!(quote_count(r#"e"c"h"o"#), 4);
        assert_eq!(quote_count("echo"), 0);
    }

    #[test]
    fn test_looks_binary() {
        assert!(looks_binary("\u{7f}ELF\u{1}\u{1}"));
        assert!(looks_binary("MZ\u{90}"));
        assert!(looks_binary("has\0nul"));
        assert!(!looks_binary("#!/bin/bash\necho hi"));
    }
}
