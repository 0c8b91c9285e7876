//! Configuration file loading.

use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::store::ConfigStore;
use crate::validate;

/// Load configuration: built-in defaults with the given file merged on top.
///
/// A missing file is not an error; the defaults stand alone. A present but
/// malformed file *is* an error so a typo cannot silently disable
/// enforcement.
///
/// # Errors
///
/// Returns [`ConfigError::Read`] / [`ConfigError::Parse`] for an unreadable
/// or malformed file and [`ConfigError::Validation`] if the merged result
/// fails validation.
pub fn load(path: &Path) -> ConfigResult<ConfigStore> {
    let mut store = ConfigStore::with_defaults();

    if path.exists() {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let tree: Value = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        store.merge(&ConfigStore::from_tree(&tree));
        debug!(path = %path.display(), "config file merged");
    } else {
        warn!(path = %path.display(), "no config file, using built-in defaults");
    }

    validate::validate(&store)?;
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let store = load(&tmp.path().join("absent.json")).unwrap();
        assert!(store.get_bool("enforcement.enabled", false));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("wow-config.json");
        std::fs::write(&path, r#"{"enforcement":{"strict_mode":true}}"#).unwrap();
        let store = load(&path).unwrap();
        assert!(store.get_bool("enforcement.strict_mode", false));
        assert!(store.get_bool("enforcement.enabled", false));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("wow-config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_ill_typed_enforcement_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("wow-config.json");
        std::fs::write(&path, r#"{"enforcement":{"enabled":123}}"#).unwrap();
        assert!(matches!(load(&path), Err(ConfigError::Validation(_))));
    }
}
