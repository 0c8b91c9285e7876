//! Cross-operation correlation: catching split attacks.
//!
//! A bounded FIFO of recent operations. Individually-benign steps become
//! dangerous in sequence: write a script then execute it, download then
//! run, build a command in pieces then `eval` it. [`CorrelationWindow::check`]
//! consults the window *before* the current operation is tracked, so an
//! operation never correlates with itself.

use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::LazyLock;
use tracing::debug;

/// Maximum number of records held in the window.
pub const WINDOW_CAPACITY: usize = 50;
/// Seconds after which a record is evicted.
pub const WINDOW_TTL_SECS: i64 = 1_800;

/// Length of the content prefix kept per record.
const PREFIX_LEN: usize = 120;

/// One tracked operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpRecord {
    tool: String,
    target: String,
    content_prefix: String,
    timestamp: i64,
}

/// Verdict from a correlation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrelationVerdict {
    /// No split-attack pattern involves the current operation.
    Safe,
    /// A pattern matched; risk is 0..100.
    Dangerous {
        /// Human-readable description of the matched pattern.
        reason: String,
        /// Risk score (>= 70 blocks, 40..70 warns).
        risk: u8,
    },
}

static EXEC_TARGET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[;&|]\s*)(?:bash|sh|zsh|dash|source|\.)\s+(\S+)").expect("invalid regex")
});
static DIRECT_EXEC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[;&|]\s*)((?:/|\./)\S+)").expect("invalid regex"));
static REDIRECT_TARGET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">{1,2}\s*(/\S+|\S+)").expect("invalid regex"));
static DOWNLOAD_TARGET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:curl|wget|fetch|aria2c)\b[^;|&]*?(?:-o|-O|--output)[=\s]+(\S+)")
        .expect("invalid regex")
});
static VAR_ASSIGN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[A-Za-z_][A-Za-z0-9_]*=").expect("invalid regex"));
static ARRAY_APPEND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[A-Za-z_][A-Za-z0-9_]*\+=\(").expect("invalid regex"));
static ARRAY_EXPANSION_EXEC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""\$\{[A-Za-z_][A-Za-z0-9_]*\[@\]\}""#).expect("invalid regex"));
static CONFIG_TARGET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\.bashrc|\.zshrc|\.profile|\.ssh/config|\.ssh/authorized_keys|\.gitconfig|\.npmrc|\.pypirc)$",
    )
    .expect("invalid regex")
});

/// Sliding window of recent operations.
#[derive(Debug, Default)]
pub struct CorrelationWindow {
    records: VecDeque<OpRecord>,
}

impl CorrelationWindow {
    /// Create an empty window.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an operation for future correlation.
    ///
    /// Shell commands containing a redirect (`> /path`) or a download with
    /// an output file are additionally recorded as implicit writes to that
    /// path, so `echo payload > /tmp/x.sh` correlates exactly like a
    /// `Write` request would.
    pub fn track(&mut self, tool: &str, target: &str, content_prefix: &str) {
        let now = Utc::now().timestamp();
        self.push(OpRecord {
            tool: tool.to_string(),
            target: target.to_string(),
            content_prefix: content_prefix.chars().take(PREFIX_LEN).collect(),
            timestamp: now,
        });

        if tool == "Bash" {
            if let Some(caps) = REDIRECT_TARGET.captures(target) {
                if let Some(path) = caps.get(1) {
                    self.push(OpRecord {
                        tool: "Write".to_string(),
                        target: path.as_str().to_string(),
                        content_prefix: String::new(),
                        timestamp: now,
                    });
                }
            }
            if let Some(caps) = DOWNLOAD_TARGET.captures(target) {
                if let Some(path) = caps.get(1) {
                    self.push(OpRecord {
                        tool: "Download".to_string(),
                        target: path.as_str().to_string(),
                        content_prefix: String::new(),
                        timestamp: now,
                    });
                }
            }
        }
        self.evict(now);
    }

    /// Check the current operation against the window.
    ///
    /// Call before [`CorrelationWindow::track`] for the same operation.
    #[must_use]
    pub fn check(&mut self, tool: &str, operation: &str) -> CorrelationVerdict {
        self.evict(Utc::now().timestamp());

        if tool == "Bash" {
            for target in executed_paths(operation) {
                if let Some(record) = self.find_prior("Download", &target) {
                    debug!(target = %record.target, "download-then-execute correlation");
                    return CorrelationVerdict::Dangerous {
                        reason: format!(
                            "Download-then-execute: {target} was fetched earlier in this session"
                        ),
                        risk: 95,
                    };
                }
                if let Some(record) = self.find_prior("Write", &target) {
                    debug!(target = %record.target, "write-then-execute correlation");
                    let staged = target.starts_with("/tmp/")
                        || target.starts_with("/var/tmp/")
                        || target.starts_with("/dev/shm/");
                    return CorrelationVerdict::Dangerous {
                        reason: format!(
                            "Write-then-execute: {target} was written earlier in this session"
                        ),
                        risk: if staged { 90 } else { 60 },
                    };
                }
            }

            if let Some(verdict) = self.check_staged_building(operation) {
                return verdict;
            }
        }

        if (tool == "Write" || tool == "Edit") && CONFIG_TARGET.is_match(operation) {
            return CorrelationVerdict::Dangerous {
                reason: format!("Config poisoning: {operation} alters shell or tool startup"),
                risk: 85,
            };
        }

        CorrelationVerdict::Safe
    }

    /// Number of records currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the window is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn check_staged_building(&self, operation: &str) -> Option<CorrelationVerdict> {
        let assignments = self
            .records
            .iter()
            .filter(|r| r.tool == "Bash" && VAR_ASSIGN.is_match(&r.target))
            .count();
        let appends = self
            .records
            .iter()
            .filter(|r| r.tool == "Bash" && ARRAY_APPEND.is_match(&r.target))
            .count();

        if appends >= 3 && ARRAY_EXPANSION_EXEC.is_match(operation) {
            return Some(CorrelationVerdict::Dangerous {
                reason: "Staged building: array assembled piecewise, now expanded as a command"
                    .to_string(),
                risk: 75,
            });
        }
        if assignments >= 3 && operation.contains("eval") {
            return Some(CorrelationVerdict::Dangerous {
                reason: "Staged building: variables assembled piecewise, now passed to eval"
                    .to_string(),
                risk: 75,
            });
        }
        None
    }

    fn find_prior(&self, tool: &str, target: &str) -> Option<&OpRecord> {
        self.records
            .iter()
            .rev()
            .find(|r| r.tool == tool && r.target == target)
    }

    fn push(&mut self, record: OpRecord) {
        self.records.push_back(record);
        while self.records.len() > WINDOW_CAPACITY {
            self.records.pop_front();
        }
    }

    fn evict(&mut self, now: i64) {
        while let Some(front) = self.records.front() {
            if now - front.timestamp > WINDOW_TTL_SECS {
                self.records.pop_front();
            } else {
                break;
            }
        }
    }

    /// Backdate every record by `secs`: TTL tests only.
    #[cfg(test)]
    fn backdate(&mut self, secs: i64) {
        for record in &mut self.records {
            record.timestamp -= secs;
        }
    }
}

/// Paths the command executes, directly or via an interpreter.
fn executed_paths(operation: &str) -> Vec<String> {
    let mut paths = Vec::new();
    for caps in EXEC_TARGET.captures_iter(operation) {
        if let Some(m) = caps.get(1) {
            paths.push(m.as_str().to_string());
        }
    }
    for caps in DIRECT_EXEC.captures_iter(operation) {
        if let Some(m) = caps.get(1) {
            paths.push(m.as_str().to_string());
        }
    }
    paths
}

#[cfg(test)]
#[path = "correlator_tests.rs"]
mod tests;
