//! User-loaded declarative rules.
//!
//! The rule file (`custom-rules.conf`) is line-oriented:
//!
//! ```text
//! # name|pattern|tool_filter|action|severity|message
//! no-prod-deploys|deploy\s+--prod|Bash|block|high|production deploys go through CI
//! allow-docs-writes|^docs/|Write|allow|low|documentation tree is unrestricted
//! flag-force-push|push\s+--force|Bash|warn|medium|force push rewrites shared history
//! ```
//!
//! First matching rule wins. `tool_filter` is `*` or a comma-separated
//! tool list. Actions: `allow` short-circuits pass-through, `block`
//! short-circuits rejection, `warn` records the violation and continues
//! to the built-in handler.

use regex::Regex;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Action a custom rule applies on match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleAction {
    /// Pass the request through, skipping the built-in handler.
    Allow,
    /// Record a violation and continue to the built-in handler.
    Warn,
    /// Reject the request.
    Block,
}

/// One parsed rule.
#[derive(Debug, Clone)]
pub struct CustomRule {
    /// Rule name (used in messages and logs).
    pub name: String,
    /// Compiled operation pattern.
    pub pattern: Regex,
    /// Tools the rule applies to; empty means all.
    pub tools: Vec<String>,
    /// Action on match.
    pub action: RuleAction,
    /// Severity label carried into the violation record.
    pub severity: String,
    /// Message shown to the user.
    pub message: String,
}

impl CustomRule {
    fn applies_to(&self, tool: &str) -> bool {
        self.tools.is_empty() || self.tools.iter().any(|t| t == tool)
    }
}

/// Error from loading the rule file.
#[derive(Debug, Error)]
pub enum RuleParseError {
    /// The rule file exists but could not be read.
    #[error("failed to read rule file: {0}")]
    Io(#[from] std::io::Error),
}

/// The loaded rule set.
#[derive(Debug, Default)]
pub struct CustomRuleEngine {
    rules: Vec<CustomRule>,
}

impl CustomRuleEngine {
    /// Create an empty engine (no rule file).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load rules from `path`. A missing file yields an empty engine;
    /// malformed lines are skipped with a warning so one typo cannot
    /// disable the rest of the file.
    ///
    /// # Errors
    ///
    /// Returns [`RuleParseError::Io`] when the file exists but cannot be
    /// read.
    pub fn load(path: &Path) -> Result<Self, RuleParseError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let text = std::fs::read_to_string(path)?;
        let mut rules = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_line(line) {
                Some(rule) => rules.push(rule),
                None => {
                    warn!(line_no = idx + 1, "skipping malformed custom rule");
                },
            }
        }
        debug!(count = rules.len(), path = %path.display(), "custom rules loaded");
        Ok(Self { rules })
    }

    /// Evaluate the operation; first matching rule wins.
    #[must_use]
    pub fn evaluate(&self, tool: &str, operation: &str) -> Option<&CustomRule> {
        self.rules
            .iter()
            .find(|rule| rule.applies_to(tool) && rule.pattern.is_match(operation))
    }

    /// Number of loaded rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether any rules are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn parse_line(line: &str) -> Option<CustomRule> {
    let fields: Vec<&str> = line.split('|').collect();
    let [name, pattern, tool_filter, action, severity, message] = fields.as_slice() else {
        return None;
    };
    let pattern = Regex::new(pattern).ok()?;
    let action = match action.trim().to_lowercase().as_str() {
        "allow" => RuleAction::Allow,
        "warn" => RuleAction::Warn,
        "block" => RuleAction::Block,
        _ => return None,
    };
    let tools = if tool_filter.trim() == "*" {
        Vec::new()
    } else {
        tool_filter.split(',').map(|t| t.trim().to_string()).collect()
    };
    Some(CustomRule {
        name: name.trim().to_string(),
        pattern,
        tools,
        action,
        severity: severity.trim().to_string(),
        message: message.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const RULES: &str = "\
# comment line
no-prod-deploys|deploy\\s+--prod|Bash|block|high|production deploys go through CI
allow-docs|^docs/|Write|allow|low|docs tree is unrestricted
flag-force-push|push\\s+--force|Bash|warn|medium|force push rewrites history
broken line without enough fields
bad-action|x|Bash|explode|high|nope
";

    fn engine(tmp: &TempDir) -> CustomRuleEngine {
        let path = tmp.path().join("custom-rules.conf");
        std::fs::write(&path, RULES).unwrap();
        CustomRuleEngine::load(&path).unwrap()
    }

    #[test]
    fn test_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let engine = CustomRuleEngine::load(&tmp.path().join("absent.conf")).unwrap();
        assert!(engine.is_empty());
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let tmp = TempDir::new().unwrap();
        // Three well-formed rules survive; the broken line and the bad
        // action are dropped.
        assert_eq!(engine(&tmp).len(), 3);
    }

    #[test]
    fn test_block_rule_matches() {
        let tmp = TempDir::new().unwrap();
        let engine = engine(&tmp);
        let rule = engine.evaluate("Bash", "deploy --prod --force").unwrap();
        assert_eq!(rule.action, RuleAction::Block);
        assert_eq!(rule.name, "no-prod-deploys");
    }

    #[test]
    fn test_tool_filter() {
        let tmp = TempDir::new().unwrap();
        let engine = engine(&tmp);
        assert!(engine.evaluate("Write", "docs/guide.md").is_some());
        // Same operation under a different tool falls through.
        assert!(engine.evaluate("Read", "docs/guide.md").is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("rules.conf");
        std::fs::write(
            &path,
            "first|target|*|warn|low|first\nsecond|target|*|block|high|second\n",
        )
        .unwrap();
        let engine = CustomRuleEngine::load(&path).unwrap();
        let rule = engine.evaluate("Bash", "hit the target now").unwrap();
        assert_eq!(rule.name, "first");
        assert_eq!(rule.action, RuleAction::Warn);
    }

    #[test]
    fn test_no_match() {
        let tmp = TempDir::new().unwrap();
        assert!(engine(&tmp).evaluate("Bash", "cargo build").is_none());
    }
}
