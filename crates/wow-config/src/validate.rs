//! Configuration validation.

use serde_json::Value;

use crate::error::{ConfigError, ConfigResult};
use crate::store::ConfigStore;

/// Keys that must exist after defaults are applied.
const REQUIRED_KEYS: &[&str] = &[
    "enforcement.enabled",
    "performance.fast_path_enabled",
];

/// Validate a merged configuration.
///
/// Checks that required keys exist and that every leaf in the
/// `enforcement.*` subtree is boolean (or a boolean-looking string). The
/// enforcement flags gate blocking behaviour, so an ill-typed value there
/// must fail loudly rather than silently read as `false`.
///
/// # Errors
///
/// Returns [`ConfigError::Validation`] naming the offending key.
pub fn validate(store: &ConfigStore) -> ConfigResult<()> {
    for key in REQUIRED_KEYS {
        if !store.contains(key) {
            return Err(ConfigError::Validation(format!("missing required key {key}")));
        }
    }

    for (key, value) in store.iter() {
        if key.starts_with("enforcement.") && !is_boolean_like(value) {
            return Err(ConfigError::Validation(format!(
                "{key} must be boolean, got {value}"
            )));
        }
    }

    Ok(())
}

fn is_boolean_like(value: &Value) -> bool {
    match value {
        Value::Bool(_) => true,
        Value::String(s) => s == "true" || s == "false",
        _ => false,
    }
}
