//! Directory scaffolding for the wow-system home directory.
//!
//! All persistent state lives under a single root (`$WOW_HOME`, default
//! `~/.claude/wow-system`). Privilege material gets owner-only directory
//! permissions; the layout is:
//!
//! ```text
//! ~/.claude/wow-system/             (WowHome)
//! ├── logs/
//! │   └── wow.log                     (append-only text log)
//! ├── data/
//! │   ├── state/
//! │   │   ├── current-session.state   (key=b64(value) lines)
//! │   │   └── archive/<id>.state      (archived sessions)
//! │   ├── bypass/                     (0700)
//! │   │   ├── active.token            (0600)
//! │   │   ├── fallback.hash
//! │   │   ├── last_activity
//! │   │   └── failures.json
//! │   └── superadmin/                 (0700)
//! │       ├── active.token
//! │       ├── fallback.hash
//! │       ├── last_activity
//! │       ├── failures.json
//! │       └── .ephemeral_secret
//! ├── config/
//! │   └── wow-config.json             (nested configuration tree)
//! └── custom-rules.conf               (optional DSL rule file)
//! ```

use std::io;
use std::path::{Path, PathBuf};

/// The wow-system home directory (`$WOW_HOME` or `~/.claude/wow-system`).
#[derive(Debug, Clone)]
pub struct WowHome {
    root: PathBuf,
    log_dir: PathBuf,
    data_dir: PathBuf,
}

impl WowHome {
    /// Resolve the home directory from the environment.
    ///
    /// Checks `$WOW_HOME` first, then falls back to
    /// `$HOME/.claude/wow-system`. `$WOW_LOG_DIR` and `$WOW_DATA_DIR`
    /// override the log and data subtrees individually.
    ///
    /// # Errors
    ///
    /// Returns an error if neither `$WOW_HOME` nor `$HOME` is set.
    pub fn resolve() -> io::Result<Self> {
        let root = if let Ok(custom) = std::env::var("WOW_HOME") {
            PathBuf::from(custom)
        } else {
            let home = std::env::var("HOME").map_err(|_| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    "neither WOW_HOME nor HOME environment variable is set",
                )
            })?;
            PathBuf::from(home).join(".claude").join("wow-system")
        };

        let log_dir = std::env::var("WOW_LOG_DIR")
            .map_or_else(|_| root.join("logs"), PathBuf::from);
        let data_dir = std::env::var("WOW_DATA_DIR")
            .map_or_else(|_| root.join("data"), PathBuf::from);

        Ok(Self { root, log_dir, data_dir })
    }

    /// Create from an explicit path (useful for testing).
    #[must_use]
    pub fn from_path(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let log_dir = root.join("logs");
        let data_dir = root.join("data");
        Self { root, log_dir, data_dir }
    }

    /// Ensure the directory structure exists with secure permissions.
    ///
    /// The privilege directories are created `0o700` on Unix; everything
    /// else is left at the process umask.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation or permission setting fails.
    pub fn ensure(&self) -> io::Result<()> {
        std::fs::create_dir_all(self.log_dir())?;
        std::fs::create_dir_all(self.state_archive_dir())?;
        std::fs::create_dir_all(self.config_dir())?;
        std::fs::create_dir_all(self.bypass_dir())?;
        std::fs::create_dir_all(self.superadmin_dir())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o700);
            std::fs::set_permissions(self.bypass_dir(), perms.clone())?;
            std::fs::set_permissions(self.superadmin_dir(), perms)?;
        }
        Ok(())
    }

    /// Root directory path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Log directory (`logs/` or `$WOW_LOG_DIR`).
    #[must_use]
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// The append-only text log file.
    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join("wow.log")
    }

    /// Data directory (`data/` or `$WOW_DATA_DIR`).
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Session state directory (`data/state/`).
    #[must_use]
    pub fn state_dir(&self) -> PathBuf {
        self.data_dir.join("state")
    }

    /// The current session state file.
    #[must_use]
    pub fn session_state_file(&self) -> PathBuf {
        self.state_dir().join("current-session.state")
    }

    /// Archived session directory (`data/state/archive/`).
    #[must_use]
    pub fn state_archive_dir(&self) -> PathBuf {
        self.state_dir().join("archive")
    }

    /// Bypass privilege directory (`data/bypass/`, mode 700).
    #[must_use]
    pub fn bypass_dir(&self) -> PathBuf {
        self.data_dir.join("bypass")
    }

    /// SuperAdmin privilege directory (`data/superadmin/`, mode 700).
    #[must_use]
    pub fn superadmin_dir(&self) -> PathBuf {
        self.data_dir.join("superadmin")
    }

    /// Configuration directory (`config/`).
    #[must_use]
    pub fn config_dir(&self) -> PathBuf {
        self.root.join("config")
    }

    /// The nested configuration file (`config/wow-config.json`).
    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.config_dir().join("wow-config.json")
    }

    /// The optional custom rule DSL file (`custom-rules.conf`).
    #[must_use]
    pub fn custom_rules_file(&self) -> PathBuf {
        self.root.join("custom-rules.conf")
    }
}
