//! Heuristic evasion scoring.
//!
//! Five independent sub-checks, each contributing at most one signal:
//! encoding evasion, variable substitution, obfuscation, indirect
//! execution, network evasion. The scorer is pure (equal inputs produce
//! equal output) and runs in one regex pass per pattern.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use wow_core::text;

/// Category of an evasion signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalCategory {
    /// Encoded payload decoded into a shell.
    EncodingEvasion,
    /// `eval`/expansion tricks building a command from variables.
    VariableSubstitution,
    /// Quote insertion, backslash splitting, case games.
    Obfuscation,
    /// Execution through an interpreter or a staging directory.
    IndirectExecution,
    /// Remote content piped straight into a shell.
    NetworkEvasion,
}

impl fmt::Display for SignalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EncodingEvasion => write!(f, "encoding_evasion"),
            Self::VariableSubstitution => write!(f, "variable_substitution"),
            Self::Obfuscation => write!(f, "obfuscation"),
            Self::IndirectExecution => write!(f, "indirect_execution"),
            Self::NetworkEvasion => write!(f, "network_evasion"),
        }
    }
}

/// One evasion signal with its confidence (0..100).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeuristicSignal {
    /// The sub-check that fired.
    pub category: SignalCategory,
    /// Confidence that the operation is an evasion attempt.
    pub confidence: u8,
    /// Human-readable explanation.
    pub reason: String,
}

impl HeuristicSignal {
    fn new(category: SignalCategory, confidence: u8, reason: impl Into<String>) -> Self {
        Self { category, confidence, reason: reason.into() }
    }
}

macro_rules! patterns {
    ($name:ident, [$($pattern:expr),+ $(,)?]) => {
        static $name: LazyLock<Vec<Regex>> = LazyLock::new(|| {
            [$($pattern),+]
                .iter()
                .map(|p| Regex::new(p).expect("invalid regex"))
                .collect()
        });
    };
}

patterns!(DECODE_TO_SHELL, [
    r"base64\s+(-[dD]\b|--decode)[^|]*\|\s*(ba|z|da)?sh\b",
    r"\|\s*base64\s+(-[dD]\b|--decode)\s*\|\s*(ba|z|da)?sh\b",
    r"xxd\s+-r[^|]*\|\s*(ba|z|da)?sh\b",
]);

patterns!(ESCAPE_TO_SHELL, [
    r#"printf\s+['"](\\x[0-9a-fA-F]{2}|\\[0-7]{3})+"#,
    r#"echo\s+-e\s+['"]?(\\x[0-9a-fA-F]{2}|\\[0-7]{3})+"#,
]);

patterns!(EVAL_EXPANSION, [
    r#"\beval\s+["']?\$"#,
]);

patterns!(ARRAY_EXEC, [
    r#"^\s*"\$\{[A-Za-z_][A-Za-z0-9_]*\[@\]\}""#,
]);

patterns!(VARIABLE_BUILT, [
    r"\b[A-Za-z_][A-Za-z0-9_]*=[^;]*\b(rm|dd|mkfs|chmod|curl|wget)\b.*(;|&&)\s*\$[A-Za-z_{]",
]);

patterns!(SOURCED_FROM_STAGING, [
    r"(^|[;&|]\s*)(source|\.)\s+/(tmp|var/tmp|dev/shm)/",
]);

patterns!(SHELL_DASH_C, [
    r"\b(bash|sh|zsh|dash)\s+-c\b",
]);

patterns!(EVAL_WORD, [
    r"\beval\b",
]);

patterns!(CURL_PIPE_SHELL, [
    r"\b(curl|wget|fetch|aria2c)\b[^|;]*\|\s*(sudo\s+)?(ba|z|da)?sh\b",
    r"\bwget\s+(-\S+\s+)*-O\s*-\s[^|]*\|",
]);

patterns!(NUMERIC_IP_URL, [
    r"https?://0x[0-9a-fA-F]+",
    r"https?://\d{8,10}(/|\s|$)",
    r"https?://[^/\s]*%[0-9a-fA-F]{2}",
]);

/// Commands dangerous enough that hiding them is itself the signal.
// Case-sensitive on purpose: the case-variation check compares the raw
// string against its folded form, which a `(?i)` flag would defeat.
static DANGEROUS_CORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(rm\s+-[a-z]*[rf]|mkfs|dd\s+if=|chmod\s+(-[a-z]+\s+)*777|curl[^|]*\|\s*sh|shutdown|reboot)\b",
    )
    .expect("invalid regex")
});

/// Run every sub-check over one operation string.
///
/// Each category contributes at most one signal; the result is at most
/// five entries. Idempotent and side-effect free.
#[must_use]
pub fn detect(operation: &str) -> Vec<HeuristicSignal> {
    let mut signals = Vec::new();
    if let Some(s) = check_encoding(operation) {
        signals.push(s);
    }
    if let Some(s) = check_variable_substitution(operation) {
        signals.push(s);
    }
    if let Some(s) = check_obfuscation(operation) {
        signals.push(s);
    }
    if let Some(s) = check_indirect_execution(operation) {
        signals.push(s);
    }
    if let Some(s) = check_network_evasion(operation) {
        signals.push(s);
    }
    signals
}

/// The highest-confidence signal, if any fired.
#[must_use]
pub fn strongest(signals: &[HeuristicSignal]) -> Option<&HeuristicSignal> {
    signals.iter().max_by_key(|s| s.confidence)
}

fn check_encoding(op: &str) -> Option<HeuristicSignal> {
    if DECODE_TO_SHELL.iter().any(|p| p.is_match(op)) {
        return Some(HeuristicSignal::new(
            SignalCategory::EncodingEvasion,
            90,
            "encoded payload decoded and piped into a shell",
        ));
    }
    if ESCAPE_TO_SHELL.iter().any(|p| p.is_match(op)) && op.contains('|') {
        return Some(HeuristicSignal::new(
            SignalCategory::EncodingEvasion,
            80,
            "escape-sequence payload piped onward",
        ));
    }
    None
}

fn check_variable_substitution(op: &str) -> Option<HeuristicSignal> {
    if EVAL_EXPANSION.iter().any(|p| p.is_match(op)) {
        return Some(HeuristicSignal::new(
            SignalCategory::VariableSubstitution,
            85,
            "eval over a variable expansion",
        ));
    }
    if ARRAY_EXEC.iter().any(|p| p.is_match(op)) {
        return Some(HeuristicSignal::new(
            SignalCategory::VariableSubstitution,
            80,
            "array expansion used as the command",
        ));
    }
    if VARIABLE_BUILT.iter().any(|p| p.is_match(op)) {
        return Some(HeuristicSignal::new(
            SignalCategory::VariableSubstitution,
            75,
            "dangerous command assembled in a variable",
        ));
    }
    None
}

fn check_obfuscation(op: &str) -> Option<HeuristicSignal> {
    if op.contains("\\x00") || op.contains("\\0") || op.contains('\0') {
        return Some(HeuristicSignal::new(
            SignalCategory::Obfuscation,
            90,
            "null-byte escape in command",
        ));
    }

    let dequoted = text::collapse_whitespace(&text::dequote(op));
    if dequoted != text::collapse_whitespace(op) && DANGEROUS_CORE.is_match(&dequoted) {
        let confidence = if text::quote_count(op) > 6 { 75 } else { 85 };
        return Some(HeuristicSignal::new(
            SignalCategory::Obfuscation,
            confidence,
            "quote insertion hiding a dangerous command",
        ));
    }

    let destriped = text::normalize_command(op);
    if op.contains('\\') && destriped != text::collapse_whitespace(op)
        && DANGEROUS_CORE.is_match(&destriped)
    {
        return Some(HeuristicSignal::new(
            SignalCategory::Obfuscation,
            85,
            "backslash splitting hiding a dangerous command",
        ));
    }

    let folded = text::fold_case(op);
    if folded != op && !DANGEROUS_CORE.is_match(op) && DANGEROUS_CORE.is_match(&folded) {
        return Some(HeuristicSignal::new(
            SignalCategory::Obfuscation,
            70,
            "case variation hiding a dangerous command",
        ));
    }
    None
}

fn check_indirect_execution(op: &str) -> Option<HeuristicSignal> {
    if SOURCED_FROM_STAGING.iter().any(|p| p.is_match(op)) {
        return Some(HeuristicSignal::new(
            SignalCategory::IndirectExecution,
            85,
            "sourcing a script from a staging directory",
        ));
    }
    if op.trim_start().starts_with('`') {
        return Some(HeuristicSignal::new(
            SignalCategory::IndirectExecution,
            80,
            "backtick substitution as the root command",
        ));
    }
    if SHELL_DASH_C.iter().any(|p| p.is_match(op)) {
        return Some(HeuristicSignal::new(
            SignalCategory::IndirectExecution,
            75,
            "nested shell via -c",
        ));
    }
    if EVAL_WORD.iter().any(|p| p.is_match(op)) {
        return Some(HeuristicSignal::new(
            SignalCategory::IndirectExecution,
            70,
            "eval execution",
        ));
    }
    None
}

fn check_network_evasion(op: &str) -> Option<HeuristicSignal> {
    if CURL_PIPE_SHELL.iter().any(|p| p.is_match(op)) {
        return Some(HeuristicSignal::new(
            SignalCategory::NetworkEvasion,
            90,
            "remote content piped directly into a shell",
        ));
    }
    if NUMERIC_IP_URL.iter().any(|p| p.is_match(op)) {
        return Some(HeuristicSignal::new(
            SignalCategory::NetworkEvasion,
            75,
            "numerically-encoded host in URL",
        ));
    }
    None
}

#[cfg(test)]
#[path = "heuristic_tests.rs"]
mod tests;
