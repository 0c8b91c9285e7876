//! Privilege elevation for the wow-system core.
//!
//! Two escalation modes, each a small state machine over on-disk files:
//!
//! - **Bypass** (tier 3): lifts ordinary blocks. Max 4 h, 30 min
//!   inactivity dead-bolt.
//! - **SuperAdmin** (tier 2): unlocks superadmin-tier policy rules and
//!   implies bypass. Max 20 min, 5 min inactivity dead-bolt.
//!
//! State transitions: `LOCKED -> (activate: TTY + auth) -> UNLOCKED ->
//! (expire | inactivity | deactivate) -> LOCKED`.
//!
//! Activation requires an interactive terminal and either a passphrase
//! (salted SHA-512, constant-time compare) or a platform biometric prompt
//! behind the [`BiometricProvider`] trait. Successful activation mints an
//! HMAC-SHA-512 token bound to a stored or ephemeral secret; every file is
//! written `0600` inside a `0700` directory via write-temp-then-rename.
//!
//! Failure handling is fail-secure: an unreadable or unverifiable token
//! means `LOCKED`, and any `is_active` failure auto-deactivates.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod biometric;
mod error;
mod manager;
mod mode;
mod rate_limit;
mod secret;
mod token;

pub use biometric::{
    BiometricProvider, FprintdProvider, MOCK_AUTH_ENV, MockProvider, TouchIdProvider,
    WindowsHelloProvider, default_provider,
};
pub use error::{PrivilegeError, PrivilegeResult};
pub use manager::PrivilegeManager;
pub use mode::PrivilegeMode;
pub use rate_limit::FailureRecord;
pub use token::{PrivilegeToken, TOKEN_VERSION};
