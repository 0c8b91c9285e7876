//! Privilege modes and their duration policies.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two escalation modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivilegeMode {
    /// Tier 3: lifts ordinary blocks.
    Bypass,
    /// Tier 2: unlocks superadmin-tier rules; implies bypass.
    SuperAdmin,
}

impl PrivilegeMode {
    /// Directory name under `data/` holding this mode's files.
    #[must_use]
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Bypass => "bypass",
            Self::SuperAdmin => "superadmin",
        }
    }

    /// Hard ceiling on token lifetime, in seconds.
    #[must_use]
    pub fn max_duration_secs(self) -> i64 {
        match self {
            Self::Bypass => 14_400,
            Self::SuperAdmin => 1_200,
        }
    }

    /// Inactivity dead-bolt: seconds without an allowed operation after
    /// which the mode locks regardless of token expiry.
    #[must_use]
    pub fn inactivity_timeout_secs(self) -> i64 {
        match self {
            Self::Bypass => 1_800,
            Self::SuperAdmin => 300,
        }
    }

    /// Lockout delay after `failures` consecutive failed attempts.
    ///
    /// Bypass: `1 -> 0s, 2 -> 60s, 3 -> 300s, 4 -> 900s, 5+ -> 3600s`.
    /// SuperAdmin runs the same schedule one step ahead.
    #[must_use]
    pub fn lockout_delay_secs(self, failures: u32) -> i64 {
        let effective = match self {
            Self::Bypass => failures,
            Self::SuperAdmin => failures.saturating_add(1),
        };
        match effective {
            0 | 1 => 0,
            2 => 60,
            3 => 300,
            4 => 900,
            _ => 3_600,
        }
    }
}

impl fmt::Display for PrivilegeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bypass => write!(f, "bypass"),
            Self::SuperAdmin => write!(f, "superadmin"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_policy() {
        assert_eq!(PrivilegeMode::Bypass.max_duration_secs(), 14_400);
        assert_eq!(PrivilegeMode::Bypass.inactivity_timeout_secs(), 1_800);
        assert_eq!(PrivilegeMode::SuperAdmin.max_duration_secs(), 1_200);
        assert_eq!(PrivilegeMode::SuperAdmin.inactivity_timeout_secs(), 300);
    }

    #[test]
    fn test_bypass_lockout_schedule() {
        let mode = PrivilegeMode::Bypass;
        assert_eq!(mode.lockout_delay_secs(1), 0);
        assert_eq!(mode.lockout_delay_secs(2), 60);
        assert_eq!(mode.lockout_delay_secs(3), 300);
        assert_eq!(mode.lockout_delay_secs(4), 900);
        assert_eq!(mode.lockout_delay_secs(5), 3_600);
        assert_eq!(mode.lockout_delay_secs(9), 3_600);
    }

    #[test]
    fn test_superadmin_lockout_is_stricter() {
        let mode = PrivilegeMode::SuperAdmin;
        assert_eq!(mode.lockout_delay_secs(1), 60);
        assert_eq!(mode.lockout_delay_secs(2), 300);
        assert_eq!(mode.lockout_delay_secs(4), 3_600);
    }
}
