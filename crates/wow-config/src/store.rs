//! Flattened dotted-key configuration store.

use serde_json::Value;
use std::collections::BTreeMap;
use tracing::trace;

/// Configuration store: nested JSON flattened to `section.key` entries.
///
/// Leaf values keep their JSON type; the typed accessors coerce on read and
/// fall back to the supplied default on absence or type mismatch.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    entries: BTreeMap<String, Value>,
}

impl ConfigStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the built-in defaults.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut store = Self::new();
        for (key, value) in defaults() {
            store.entries.insert(key.to_string(), value);
        }
        store
    }

    /// Build a store by flattening a nested JSON tree.
    ///
    /// Arrays are treated as leaves; objects recurse with a `.` separator.
    #[must_use]
    pub fn from_tree(tree: &Value) -> Self {
        let mut store = Self::new();
        flatten_into(&mut store.entries, "", tree);
        store
    }

    /// Set a leaf value.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }

    /// Raw leaf lookup.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Boolean accessor. Accepts JSON booleans and the strings
    /// `"true"`/`"false"`.
    #[must_use]
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.entries.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => match s.as_str() {
                "true" => true,
                "false" => false,
                _ => default,
            },
            _ => default,
        }
    }

    /// Integer accessor. Accepts JSON numbers and numeric strings.
    #[must_use]
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        match self.entries.get(key) {
            Some(Value::Number(n)) => n.as_i64().unwrap_or(default),
            Some(Value::String(s)) => s.parse().unwrap_or(default),
            _ => default,
        }
    }

    /// Float accessor. Accepts JSON numbers and numeric strings.
    #[must_use]
    pub fn get_float(&self, key: &str, default: f64) -> f64 {
        match self.entries.get(key) {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(default),
            Some(Value::String(s)) => s.parse().unwrap_or(default),
            _ => default,
        }
    }

    /// String accessor.
    #[must_use]
    pub fn get_str(&self, key: &str, default: &str) -> String {
        match self.entries.get(key) {
            Some(Value::String(s)) => s.clone(),
            _ => default.to_string(),
        }
    }

    /// Array accessor: string elements of a JSON array leaf.
    ///
    /// Non-string elements are skipped; a non-array leaf yields an empty
    /// vector.
    #[must_use]
    pub fn get_array(&self, key: &str) -> Vec<String> {
        match self.entries.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Merge another store into this one, last writer wins on leaf keys.
    pub fn merge(&mut self, other: &Self) {
        for (key, value) in &other.entries {
            trace!(key = %key, "config merge");
            self.entries.insert(key.clone(), value.clone());
        }
    }

    /// Iterate all `(key, value)` entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    /// Whether a leaf exists.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

fn flatten_into(out: &mut BTreeMap<String, Value>, prefix: &str, value: &Value) {
    match value {
        Value::Object(map) => {
            for (name, child) in map {
                let key = if prefix.is_empty() {
                    name.clone()
                } else {
                    format!("{prefix}.{name}")
                };
                flatten_into(out, &key, child);
            }
        },
        leaf => {
            if !prefix.is_empty() {
                out.insert(prefix.to_string(), leaf.clone());
            }
        },
    }
}

/// Built-in configuration defaults.
///
/// These are the recognised keys; the on-disk file overrides them leaf by
/// leaf.
fn defaults() -> Vec<(&'static str, Value)> {
    vec![
        ("enforcement.enabled", Value::Bool(true)),
        ("enforcement.strict_mode", Value::Bool(false)),
        ("enforcement.block_on_violation", Value::Bool(false)),
        ("scoring.threshold_warn", Value::from(50)),
        ("scoring.threshold_block", Value::from(80)),
        ("scoring.decay_rate", Value::from(0.95)),
        ("rules.max_file_operations", Value::from(0)),
        ("rules.max_bash_commands", Value::from(0)),
        ("rules.require_documentation", Value::Bool(true)),
        ("performance.fast_path_enabled", Value::Bool(true)),
        ("integrations.claude.hooks_enabled", Value::Bool(true)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_present() {
        let store = ConfigStore::with_defaults();
        assert!(store.get_bool("enforcement.enabled", false));
        assert!(!store.get_bool("enforcement.strict_mode", true));
        assert_eq!(store.get_int("scoring.threshold_block", 0), 80);
        assert!((store.get_float("scoring.decay_rate", 0.0) - 0.95).abs() < f64::EPSILON);
    }

    #[test]
    fn test_flatten_nested_tree() {
        let tree = json!({
            "enforcement": { "strict_mode": true },
            "rules": { "max_bash_commands": 10 }
        });
        let store = ConfigStore::from_tree(&tree);
        assert!(store.get_bool("enforcement.strict_mode", false));
        assert_eq!(store.get_int("rules.max_bash_commands", 0), 10);
    }

    #[test]
    fn test_ill_typed_returns_default() {
        let tree = json!({ "scoring": { "threshold_warn": "not a number" } });
        let store = ConfigStore::from_tree(&tree);
        assert_eq!(store.get_int("scoring.threshold_warn", 50), 50);
        assert!(!store.get_bool("scoring.threshold_warn", false));
    }

    #[test]
    fn test_string_coercion() {
        let tree = json!({ "enforcement": { "enabled": "true" }, "rules": { "max": "7" } });
        let store = ConfigStore::from_tree(&tree);
        assert!(store.get_bool("enforcement.enabled", false));
        assert_eq!(store.get_int("rules.max", 0), 7);
    }

    #[test]
    fn test_merge_last_writer_wins() {
        let mut base = ConfigStore::with_defaults();
        let over = ConfigStore::from_tree(&json!({
            "enforcement": { "strict_mode": true }
        }));
        base.merge(&over);
        assert!(base.get_bool("enforcement.strict_mode", false));
        // Untouched leaves survive.
        assert!(base.get_bool("enforcement.enabled", false));
    }

    #[test]
    fn test_get_array() {
        let tree = json!({ "rules": { "emoji_set": ["🎉", "✨"] } });
        let store = ConfigStore::from_tree(&tree);
        assert_eq!(store.get_array("rules.emoji_set"), vec!["🎉", "✨"]);
        assert!(store.get_array("rules.missing").is_empty());
    }

    #[test]
    fn test_arrays_are_leaves() {
        let tree = json!({ "a": [ { "b": 1 } ] });
        let store = ConfigStore::from_tree(&tree);
        assert!(store.contains("a"));
        assert!(!store.contains("a.b"));
    }
}
