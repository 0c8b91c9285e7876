//! The declarative policy table.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use tracing::trace;

/// Security tier of a policy rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Rejected unconditionally; no privilege lifts the rejection.
    Critical,
    /// Rejected unless SuperAdmin privilege is active.
    SuperAdmin,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Critical => write!(f, "critical"),
            Self::SuperAdmin => write!(f, "superadmin"),
        }
    }
}

/// One `(pattern, tier, reason)` entry, optionally scoped to a tool set.
///
/// An unscoped rule matches the operation string of every tool. Scoping is
/// what keeps "writes under `/etc/`" critical for `Write` without turning a
/// `Read` of `/etc/passwd` (a warn-tier concern) into a critical block.
#[derive(Debug, Clone)]
pub struct PolicyRule {
    /// Compiled operation pattern.
    pub pattern: Regex,
    /// Tier this rule enforces.
    pub tier: Tier,
    /// Human-readable reason reported on a match.
    pub reason: String,
    /// Tools this rule applies to; `None` means all tools.
    pub tools: Option<Vec<String>>,
}

impl PolicyRule {
    /// Build an unscoped rule.
    ///
    /// # Panics
    ///
    /// Panics if the pattern does not compile; the built-in catalogue is
    /// constructed once per process so a bad pattern fails fast at startup.
    #[must_use]
    pub fn new(pattern: &str, tier: Tier, reason: &str) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("invalid policy regex"),
            tier,
            reason: reason.to_string(),
            tools: None,
        }
    }

    /// Restrict the rule to the given tools.
    #[must_use]
    pub fn for_tools(mut self, tools: &[&str]) -> Self {
        self.tools = Some(tools.iter().map(ToString::to_string).collect());
        self
    }

    /// Whether the rule applies to `tool` and matches `operation`.
    #[must_use]
    pub fn matches(&self, tool: Option<&str>, operation: &str) -> bool {
        if let Some(scope) = &self.tools {
            match tool {
                Some(name) if scope.iter().any(|t| t == name) => {},
                _ => return false,
            }
        }
        self.pattern.is_match(operation)
    }
}

/// The single authoritative pattern -> tier registry.
///
/// Rules are grouped by tier internally so the two bulk lookups each scan
/// only their own group.
#[derive(Debug, Clone)]
pub struct PolicyTable {
    critical: Vec<PolicyRule>,
    superadmin: Vec<PolicyRule>,
}

impl PolicyTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self { critical: Vec::new(), superadmin: Vec::new() }
    }

    /// The built-in rule catalogue.
    ///
    /// Compiled once per process; cloning shares the compiled regexes.
    #[must_use]
    pub fn standard() -> Self {
        STANDARD.clone()
    }

    /// Add a rule to the table.
    pub fn push(&mut self, rule: PolicyRule) {
        match rule.tier {
            Tier::Critical => self.critical.push(rule),
            Tier::SuperAdmin => self.superadmin.push(rule),
        }
    }

    /// First critical rule matching the operation, if any.
    #[must_use]
    pub fn match_critical(&self, tool: Option<&str>, operation: &str) -> Option<&PolicyRule> {
        let hit = self.critical.iter().find(|rule| rule.matches(tool, operation));
        if let Some(rule) = hit {
            trace!(reason = %rule.reason, "critical policy match");
        }
        hit
    }

    /// First superadmin-tier rule matching the operation, if any.
    #[must_use]
    pub fn match_superadmin(&self, tool: Option<&str>, operation: &str) -> Option<&PolicyRule> {
        let hit = self.superadmin.iter().find(|rule| rule.matches(tool, operation));
        if let Some(rule) = hit {
            trace!(reason = %rule.reason, "superadmin policy match");
        }
        hit
    }

    /// Whether the operation matches a critical rule.
    #[must_use]
    pub fn check_critical(&self, tool: Option<&str>, operation: &str) -> bool {
        self.match_critical(tool, operation).is_some()
    }

    /// Whether the operation matches a superadmin-tier rule.
    #[must_use]
    pub fn check_superadmin(&self, tool: Option<&str>, operation: &str) -> bool {
        self.match_superadmin(tool, operation).is_some()
    }

    /// Whether any privilege state could unlock the operation.
    ///
    /// Critical matches are never unlockable.
    #[must_use]
    pub fn can_unlock(&self, tool: Option<&str>, operation: &str) -> bool {
        !self.check_critical(tool, operation)
    }

    /// Total number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.critical.len() + self.superadmin.len()
    }

    /// Whether the table holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.critical.is_empty() && self.superadmin.is_empty()
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Tools whose primary operation is a file path being written.
const WRITE_TOOLS: &[&str] = &["Write", "Edit", "NotebookEdit"];

static STANDARD: LazyLock<PolicyTable> = LazyLock::new(|| {
    let mut table = PolicyTable::new();

    // -- Critical: unconditionally rejected ---------------------------------
    table.push(PolicyRule::new(
        r"(?i)\brm\s+(-[a-z]*\s+)*-[a-z]*[rf][a-z]*\s+/+\s*(\*)?\s*$",
        Tier::Critical,
        "recursive removal of the filesystem root",
    ));
    table.push(PolicyRule::new(
        r"(?i)\bsudo\s+rm\s+-[a-z]*r[a-z]*\s+/(bin|boot|etc|lib|sbin|usr|var)\b",
        Tier::Critical,
        "privileged recursive removal of a system directory",
    ));
    table.push(PolicyRule::new(
        r":\(\)\s*\{\s*:\s*\|\s*:\s*&\s*\}\s*;\s*:",
        Tier::Critical,
        "fork bomb",
    ));
    table.push(PolicyRule::new(
        r"(?i)\bdd\b[^|]*\bof=/dev/(sd|hd|vd|nvme|mmcblk)",
        Tier::Critical,
        "raw write to a block device",
    ));
    table.push(PolicyRule::new(
        r"(?i)\bmkfs(\.[a-z0-9]+)?\b",
        Tier::Critical,
        "filesystem creation destroys the target device",
    ));
    table.push(PolicyRule::new(
        r"(?i)\bchmod\s+(-[a-z]+\s+)*777\s+/\s*$",
        Tier::Critical,
        "world-writable permissions on the filesystem root",
    ));
    table.push(
        PolicyRule::new(
            r"^/(etc|bin|sbin|boot|lib|lib64)(/|$)",
            Tier::Critical,
            "write into a system directory",
        )
        .for_tools(WRITE_TOOLS),
    );
    table.push(PolicyRule::new(
        r"(^|\s)>{1,2}\s*/(etc|bin|sbin|boot)/",
        Tier::Critical,
        "shell redirect into a system directory",
    ));

    // -- SuperAdmin: rejected unless tier-2 privilege is active -------------
    // Anchored to command position so an operation merely *mentioning* one
    // of these words (a path, a grep pattern) does not demand elevation.
    table.push(
        PolicyRule::new(
            r"(?i)^(sudo\s+)?systemctl\s+(stop|disable|mask|restart)\b",
            Tier::SuperAdmin,
            "service management requires SuperAdmin",
        )
        .for_tools(&["Bash"]),
    );
    table.push(
        PolicyRule::new(
            r"(?i)^(sudo\s+)?(iptables|nft|ufw|firewall-cmd)\b",
            Tier::SuperAdmin,
            "firewall changes require SuperAdmin",
        )
        .for_tools(&["Bash"]),
    );
    table.push(
        PolicyRule::new(
            r"(?i)^(sudo\s+)?(useradd|userdel|usermod|groupadd|passwd)\b",
            Tier::SuperAdmin,
            "account management requires SuperAdmin",
        )
        .for_tools(&["Bash"]),
    );
    table.push(
        PolicyRule::new(
            r"(?i)^(sudo\s+)?(insmod|rmmod|modprobe)\b",
            Tier::SuperAdmin,
            "kernel module changes require SuperAdmin",
        )
        .for_tools(&["Bash"]),
    );
    table.push(
        PolicyRule::new(
            r"(?i)^(sudo\s+)?(mount|umount)\s+/",
            Tier::SuperAdmin,
            "mount operations require SuperAdmin",
        )
        .for_tools(&["Bash"]),
    );
    table.push(
        PolicyRule::new(
            r"(?i)^(sudo\s+)?crontab\s+(-u\s+\S+\s+)?-[er]\b",
            Tier::SuperAdmin,
            "crontab editing requires SuperAdmin",
        )
        .for_tools(&["Bash"]),
    );

    table
});
