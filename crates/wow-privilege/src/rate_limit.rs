//! Failed-attempt tracking and the lockout schedule.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use crate::error::PrivilegeResult;
use crate::mode::PrivilegeMode;
use crate::secret::write_private;

/// Persisted record of consecutive activation failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Consecutive failed attempts.
    pub count: u32,
    /// Unix second of the most recent failure.
    pub last_failure: i64,
}

impl FailureRecord {
    /// Load from `failures.json`; a missing or unreadable file counts as a
    /// clean record.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|err| {
                warn!(path = %path.display(), error = %err, "corrupt failures file, resetting");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Persist to `failures.json` (mode 600).
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be written.
    pub fn save(&self, path: &Path) -> PrivilegeResult<()> {
        let text = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());
        write_private(path, text.as_bytes())
    }

    /// Register one more failure at `now`.
    #[must_use]
    pub fn bump(self, now: i64) -> Self {
        Self { count: self.count.saturating_add(1), last_failure: now }
    }

    /// Seconds remaining before another attempt is allowed, per the mode's
    /// lockout schedule. Zero means an attempt may proceed.
    #[must_use]
    pub fn lockout_remaining(&self, mode: PrivilegeMode, now: i64) -> i64 {
        if self.count == 0 {
            return 0;
        }
        // The delay for the *next* attempt is scheduled off the attempts
        // already failed.
        let delay = mode.lockout_delay_secs(self.count.saturating_add(1));
        let elapsed = now.saturating_sub(self.last_failure);
        (delay - elapsed).max(0)
    }
}
