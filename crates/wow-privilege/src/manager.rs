//! The per-mode privilege state machine.

use chrono::Utc;
use std::io::IsTerminal as _;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use wow_core::WowHome;

use crate::biometric::{BiometricProvider, MockProvider, default_provider};
use crate::error::{PrivilegeError, PrivilegeResult};
use crate::mode::PrivilegeMode;
use crate::rate_limit::FailureRecord;
use crate::secret;
use crate::token::PrivilegeToken;

/// One privilege mode's state machine over its on-disk files.
///
/// The manager owns no in-memory token copy; every check re-reads the
/// files, so parallel invocations observe a consistent state and a stale
/// or tampered token fails closed everywhere at once.
pub struct PrivilegeManager {
    mode: PrivilegeMode,
    dir: PathBuf,
    /// Bypass directory, present when `mode` is SuperAdmin so activation
    /// and deactivation can be mirrored into the implied mode.
    companion_dir: Option<PathBuf>,
    provider: Option<Box<dyn BiometricProvider>>,
    require_tty: bool,
}

impl PrivilegeManager {
    /// Create the manager for `mode` rooted at the wow home.
    #[must_use]
    pub fn new(mode: PrivilegeMode, home: &WowHome) -> Self {
        let dir = match mode {
            PrivilegeMode::Bypass => home.bypass_dir(),
            PrivilegeMode::SuperAdmin => home.superadmin_dir(),
        };
        let companion_dir = match mode {
            PrivilegeMode::SuperAdmin => Some(home.bypass_dir()),
            PrivilegeMode::Bypass => None,
        };
        Self {
            mode,
            dir,
            companion_dir,
            provider: default_provider(),
            require_tty: !MockProvider::enabled(),
        }
    }

    /// Test constructor: explicit directory, no TTY requirement, no
    /// biometric provider.
    #[cfg(test)]
    pub(crate) fn insecure_for_tests(mode: PrivilegeMode, dir: &Path) -> Self {
        let companion_dir = match mode {
            PrivilegeMode::SuperAdmin => Some(dir.join(PrivilegeMode::Bypass.dir_name())),
            PrivilegeMode::Bypass => None,
        };
        Self {
            mode,
            dir: dir.join(mode.dir_name()),
            companion_dir,
            provider: None,
            require_tty: false,
        }
    }

    /// The mode this manager governs.
    #[must_use]
    pub fn mode(&self) -> PrivilegeMode {
        self.mode
    }

    /// Store a new passphrase hash for this mode.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the hash file cannot be written.
    pub fn set_passphrase(&self, passphrase: &str) -> PrivilegeResult<()> {
        secret::store_passphrase(&self.hash_file(), passphrase)
    }

    /// Activate interactively: TTY gate, rate limit, biometric or masked
    /// passphrase prompt, then token mint.
    ///
    /// # Errors
    ///
    /// - [`PrivilegeError::TtyRequired`] when stdin is a pipe
    /// - [`PrivilegeError::RateLimited`] inside a lockout window
    /// - [`PrivilegeError::AuthFailed`] on rejection (the failure is
    ///   recorded first)
    pub fn activate(&self) -> PrivilegeResult<()> {
        self.ensure_tty()?;
        self.check_rate_limit()?;

        let authed = match &self.provider {
            Some(provider) if provider.available() => {
                let reason = format!("wow-system {} activation", self.mode);
                match provider.authenticate(&reason) {
                    Ok(ok) => ok,
                    Err(err) => {
                        warn!(provider = provider.name(), error = %err,
                              "biometric provider failed, falling back to passphrase");
                        self.prompt_and_verify()?
                    },
                }
            },
            _ => self.prompt_and_verify()?,
        };

        self.finish_activation(authed)
    }

    /// Activate with a passphrase supplied by the caller (already read
    /// from the terminal).
    ///
    /// # Errors
    ///
    /// Same contract as [`PrivilegeManager::activate`].
    pub fn activate_with_passphrase(&self, passphrase: &str) -> PrivilegeResult<()> {
        self.ensure_tty()?;
        self.check_rate_limit()?;
        let authed = secret::verify_passphrase(&self.hash_file(), passphrase);
        self.finish_activation(authed)
    }

    /// Whether the mode is currently unlocked.
    ///
    /// Verifies the token file (HMAC, expiry) and the inactivity
    /// dead-bolt. Any failure auto-deactivates and reports locked.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active_at(Utc::now().timestamp())
    }

    /// Reset the inactivity dead-bolt; call on each allowed operation
    /// while the mode is active.
    pub fn update_activity(&self) {
        let now = Utc::now().timestamp().to_string();
        if let Err(err) = secret::write_private(&self.activity_file(), now.as_bytes()) {
            warn!(mode = %self.mode, error = %err, "failed to touch activity file");
        }
    }

    /// Lock the mode: remove the token, activity, and ephemeral secret
    /// files. Deactivating SuperAdmin also deactivates the implied bypass.
    ///
    /// Failures here fail open: a file that cannot be removed is already
    /// unusable as a token, so the mode is treated as locked regardless.
    pub fn deactivate(&self) {
        for path in [self.token_file(), self.activity_file(), self.ephemeral_file()] {
            if let Err(err) = std::fs::remove_file(&path) {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %err, "failed to remove privilege file");
                }
            }
        }
        if let Some(companion) = &self.companion_dir {
            for name in ["active.token", "last_activity", ".ephemeral_secret"] {
                let _ = std::fs::remove_file(companion.join(name));
            }
        }
        info!(mode = %self.mode, "privilege deactivated");
    }

    /// Record one failed activation attempt.
    pub fn record_failure(&self) {
        let record = FailureRecord::load(&self.failures_file()).bump(Utc::now().timestamp());
        if let Err(err) = record.save(&self.failures_file()) {
            warn!(mode = %self.mode, error = %err, "failed to persist failure record");
        }
    }

    /// Clear the failure record after a successful activation.
    pub fn reset_failures(&self) {
        if let Err(err) = FailureRecord::default().save(&self.failures_file()) {
            warn!(mode = %self.mode, error = %err, "failed to reset failure record");
        }
    }

    /// Seconds until the token expires, when active.
    #[must_use]
    pub fn remaining_secs(&self) -> Option<i64> {
        let now = Utc::now().timestamp();
        let token = self.read_token()?;
        if self.is_active_at(now) {
            Some(token.expires_unix.saturating_sub(now))
        } else {
            None
        }
    }

    // -- internals ----------------------------------------------------------

    fn is_active_at(&self, now: i64) -> bool {
        let Some(token) = self.read_token() else {
            return false;
        };

        let Ok(signing) = secret::signing_secret(&self.hash_file(), &self.ephemeral_file()) else {
            self.deactivate();
            return false;
        };
        if !token.verify(&signing) {
            warn!(mode = %self.mode, "token HMAC verification failed, locking");
            self.deactivate();
            return false;
        }
        if token.is_expired(now) {
            debug!(mode = %self.mode, "token expired, locking");
            self.deactivate();
            return false;
        }

        let last_activity = self.read_activity().unwrap_or(token.created_unix);
        if now.saturating_sub(last_activity) > self.mode.inactivity_timeout_secs() {
            info!(mode = %self.mode, "inactivity dead-bolt engaged, locking");
            self.deactivate();
            return false;
        }
        true
    }

    fn finish_activation(&self, authed: bool) -> PrivilegeResult<()> {
        if !authed {
            self.record_failure();
            return Err(PrivilegeError::AuthFailed);
        }
        self.reset_failures();

        let now = Utc::now().timestamp();
        self.mint_into(&self.dir, now)?;
        if let Some(companion) = &self.companion_dir {
            // SuperAdmin implies bypass; the implied token carries the
            // shorter SuperAdmin lifetime, not bypass's own 4 hours.
            self.mint_into(companion, now)?;
        }
        info!(mode = %self.mode, "privilege activated");
        Ok(())
    }

    fn mint_into(&self, dir: &Path, now: i64) -> PrivilegeResult<()> {
        let hash = dir.join("fallback.hash");
        let ephemeral = dir.join(".ephemeral_secret");
        let signing = secret::signing_secret(&hash, &ephemeral)?;
        let token = PrivilegeToken::mint(&signing, now, self.mode.max_duration_secs());
        secret::write_private(&dir.join("active.token"), token.encode().as_bytes())?;
        secret::write_private(&dir.join("last_activity"), now.to_string().as_bytes())?;
        Ok(())
    }

    fn prompt_and_verify(&self) -> PrivilegeResult<bool> {
        if !secret::has_passphrase(&self.hash_file()) {
            return Err(PrivilegeError::NoAuthMethod { mode: self.mode.to_string() });
        }
        let passphrase = dialoguer::Password::new()
            .with_prompt(format!("{} passphrase", self.mode))
            .allow_empty_password(false)
            .interact()
            .map_err(|err| PrivilegeError::Io(std::io::Error::other(err)))?;
        Ok(secret::verify_passphrase(&self.hash_file(), &passphrase))
    }

    fn ensure_tty(&self) -> PrivilegeResult<()> {
        if !self.require_tty {
            return Ok(());
        }
        if !std::io::stdin().is_terminal() {
            return Err(PrivilegeError::TtyRequired);
        }
        #[cfg(unix)]
        if std::fs::File::open("/dev/tty").is_err() {
            return Err(PrivilegeError::TtyRequired);
        }
        Ok(())
    }

    fn check_rate_limit(&self) -> PrivilegeResult<()> {
        let record = FailureRecord::load(&self.failures_file());
        let wait = record.lockout_remaining(self.mode, Utc::now().timestamp());
        if wait > 0 {
            return Err(PrivilegeError::RateLimited { wait_secs: wait });
        }
        Ok(())
    }

    fn read_token(&self) -> Option<PrivilegeToken> {
        let text = std::fs::read_to_string(self.token_file()).ok()?;
        match PrivilegeToken::parse(&text) {
            Ok(token) => Some(token),
            Err(err) => {
                warn!(mode = %self.mode, error = %err, "unreadable token treated as locked");
                self.deactivate();
                None
            },
        }
    }

    fn read_activity(&self) -> Option<i64> {
        std::fs::read_to_string(self.activity_file())
            .ok()?
            .trim()
            .parse()
            .ok()
    }

    fn token_file(&self) -> PathBuf {
        self.dir.join("active.token")
    }

    fn activity_file(&self) -> PathBuf {
        self.dir.join("last_activity")
    }

    fn hash_file(&self) -> PathBuf {
        self.dir.join("fallback.hash")
    }

    fn failures_file(&self) -> PathBuf {
        self.dir.join("failures.json")
    }

    fn ephemeral_file(&self) -> PathBuf {
        self.dir.join(".ephemeral_secret")
    }
}

impl std::fmt::Debug for PrivilegeManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivilegeManager")
            .field("mode", &self.mode)
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
