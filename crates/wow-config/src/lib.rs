//! Configuration store for the wow-system core.
//!
//! Configuration is a nested JSON tree (`config/wow-config.json`) flattened
//! into a single dotted-key mapping. The typed accessors never fail: an
//! absent or ill-typed entry yields the caller's default, so a broken
//! config file degrades to built-in behaviour instead of taking the
//! security pipeline down.
//!
//! # Precedence
//!
//! Built-in defaults are loaded first; the on-disk file is merged on top
//! with last-writer-wins on leaf keys.
//!
//! # Example
//!
//! ```rust
//! use wow_config::ConfigStore;
//!
//! let config = ConfigStore::with_defaults();
//! assert!(config.get_bool("enforcement.enabled", false));
//! assert!(!config.get_bool("enforcement.strict_mode", false));
//! assert_eq!(config.get_int("rules.max_bash_commands", 0), 0);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod loader;
mod store;
mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::load;
pub use store::ConfigStore;
pub use validate::validate;
