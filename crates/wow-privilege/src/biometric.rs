//! Platform biometric providers.
//!
//! Activation prefers a platform biometric prompt where one exists and
//! falls back to the passphrase otherwise. Each platform is one
//! implementation of [`BiometricProvider`]; the `SUPERADMIN_MOCK_AUTH=1`
//! environment switch substitutes the [`MockProvider`] so tests never hit
//! real hardware.

use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, warn};

use crate::error::{PrivilegeError, PrivilegeResult};

/// Environment switch that replaces real biometric checks in tests.
pub const MOCK_AUTH_ENV: &str = "SUPERADMIN_MOCK_AUTH";

/// A platform authentication prompt.
pub trait BiometricProvider: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &'static str;

    /// Whether this provider can run on the current machine.
    fn available(&self) -> bool;

    /// Prompt the user. `Ok(true)` on success, `Ok(false)` on rejection.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying platform tool cannot be
    /// invoked at all; callers fall back to the passphrase path.
    fn authenticate(&self, reason: &str) -> PrivilegeResult<bool>;
}

/// Linux fingerprint authentication via `fprintd-verify`.
pub struct FprintdProvider;

impl BiometricProvider for FprintdProvider {
    fn name(&self) -> &'static str {
        "fprintd"
    }

    fn available(&self) -> bool {
        cfg!(target_os = "linux")
            && Command::new("fprintd-verify")
                .arg("--help")
                .output()
                .is_ok()
    }

    fn authenticate(&self, reason: &str) -> PrivilegeResult<bool> {
        debug!(reason = %reason, "invoking fprintd-verify");
        let status = Command::new("fprintd-verify").status()?;
        Ok(status.success())
    }
}

/// macOS Touch ID via a system authentication prompt.
pub struct TouchIdProvider;

impl BiometricProvider for TouchIdProvider {
    fn name(&self) -> &'static str {
        "touch-id"
    }

    fn available(&self) -> bool {
        cfg!(target_os = "macos")
    }

    fn authenticate(&self, reason: &str) -> PrivilegeResult<bool> {
        // `osascript` drives the system dialog; Touch ID satisfies it on
        // machines that have the sensor, password otherwise.
        let script = format!(
            "do shell script \"true\" with prompt \"{reason}\" with administrator privileges"
        );
        let status = Command::new("osascript").args(["-e", &script]).status()?;
        Ok(status.success())
    }
}

/// Windows Hello via the bridge binary (WSL deployments).
pub struct WindowsHelloProvider {
    bridge: PathBuf,
}

impl WindowsHelloProvider {
    /// Create a provider invoking the given bridge binary.
    #[must_use]
    pub fn new(bridge: impl Into<PathBuf>) -> Self {
        Self { bridge: bridge.into() }
    }
}

impl BiometricProvider for WindowsHelloProvider {
    fn name(&self) -> &'static str {
        "windows-hello"
    }

    fn available(&self) -> bool {
        self.bridge.is_file()
    }

    fn authenticate(&self, reason: &str) -> PrivilegeResult<bool> {
        debug!(bridge = %self.bridge.display(), "invoking Windows Hello bridge");
        let status = Command::new(&self.bridge).arg(reason).status()?;
        Ok(status.success())
    }
}

/// Test provider honouring `SUPERADMIN_MOCK_AUTH=1`.
pub struct MockProvider;

impl MockProvider {
    /// Whether the mock switch is set in the environment.
    #[must_use]
    pub fn enabled() -> bool {
        std::env::var(MOCK_AUTH_ENV).is_ok_and(|v| v == "1")
    }
}

impl BiometricProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn available(&self) -> bool {
        Self::enabled()
    }

    fn authenticate(&self, _reason: &str) -> PrivilegeResult<bool> {
        if Self::enabled() {
            Ok(true)
        } else {
            Err(PrivilegeError::AuthFailed)
        }
    }
}

/// Pick the provider for this machine.
///
/// The mock wins whenever its environment switch is set; otherwise
/// detection is by platform, and `None` means passphrase-only
/// authentication.
#[must_use]
pub fn default_provider() -> Option<Box<dyn BiometricProvider>> {
    if MockProvider::enabled() {
        debug!("mock auth enabled, biometric checks disabled");
        return Some(Box::new(MockProvider));
    }

    let wsl_bridge = PathBuf::from("/mnt/c/Windows/System32/WindowsHelloBridge.exe");
    let candidates: Vec<Box<dyn BiometricProvider>> = vec![
        Box::new(FprintdProvider),
        Box::new(TouchIdProvider),
        Box::new(WindowsHelloProvider::new(wsl_bridge)),
    ];
    for provider in candidates {
        if provider.available() {
            debug!(provider = provider.name(), "biometric provider selected");
            return Some(provider);
        }
    }
    warn!("no biometric provider available, passphrase only");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_disabled_without_env() {
        // The test environment does not set the switch by default.
        if std::env::var(MOCK_AUTH_ENV).is_err() {
            assert!(!MockProvider::enabled());
            assert!(!MockProvider.available());
            assert!(MockProvider.authenticate("test").is_err());
        }
    }

    #[test]
    fn test_windows_hello_unavailable_without_bridge() {
        let provider = WindowsHelloProvider::new("/nonexistent/bridge.exe");
        assert!(!provider.available());
    }

    #[test]
    fn test_provider_names() {
        assert_eq!(FprintdProvider.name(), "fprintd");
        assert_eq!(TouchIdProvider.name(), "touch-id");
        assert_eq!(MockProvider.name(), "mock");
    }
}
