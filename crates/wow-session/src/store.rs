//! The session store implementation.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use chrono::Utc;
use std::collections::BTreeMap;
use std::io::Write as _;
use std::path::Path;
use tracing::{debug, warn};
use uuid::Uuid;

use wow_core::Severity;

use crate::error::{SessionError, SessionResult};

/// Session-metadata keys that survive [`SessionStore::clear`] and are never
/// overwritten by [`SessionStore::load`].
const SESSION_ID_KEY: &str = "session:_session_id";
const STARTED_AT_KEY: &str = "session:_started_at";

/// Violation score weights per severity.
const WARN_WEIGHT: f64 = 10.0;
const BLOCK_WEIGHT: f64 = 25.0;
const CRITICAL_WEIGHT: f64 = 40.0;

/// Process-wide session state: metrics, event log, violation score.
#[derive(Debug, Clone)]
pub struct SessionStore {
    values: BTreeMap<String, String>,
}

impl SessionStore {
    /// Create a fresh session with a new id and start timestamp.
    #[must_use]
    pub fn new() -> Self {
        let mut store = Self { values: BTreeMap::new() };
        store.values.insert(SESSION_ID_KEY.to_string(), Uuid::new_v4().to_string());
        store
            .values
            .insert(STARTED_AT_KEY.to_string(), Utc::now().timestamp().to_string());
        store
    }

    /// Restore a session from its state file, adopting the saved identity.
    ///
    /// This is the fresh-process path: counters *and* `_session_id` /
    /// `_started_at` come from the file. A file missing its identity keys
    /// gets fresh ones. Contrast with [`SessionStore::load`], which merges
    /// into an already-initialized session and preserves the live
    /// identity.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Io`] if the file cannot be read.
    pub fn restore(path: &Path) -> SessionResult<Self> {
        let mut store = Self { values: BTreeMap::new() };
        store.load(path)?;
        if !store.values.contains_key(SESSION_ID_KEY) {
            store.values.insert(SESSION_ID_KEY.to_string(), Uuid::new_v4().to_string());
        }
        if !store.values.contains_key(STARTED_AT_KEY) {
            store
                .values
                .insert(STARTED_AT_KEY.to_string(), Utc::now().timestamp().to_string());
        }
        Ok(store)
    }

    /// The session id assigned at first initialization.
    #[must_use]
    pub fn session_id(&self) -> &str {
        self.values.get(SESSION_ID_KEY).map_or("", String::as_str)
    }

    /// Unix timestamp of first initialization.
    #[must_use]
    pub fn started_at(&self) -> i64 {
        self.values
            .get(STARTED_AT_KEY)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    /// Set a key to a value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Get a value, falling back to `default` when absent.
    #[must_use]
    pub fn get<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.values.get(key).map_or(default, String::as_str)
    }

    /// Whether a key exists.
    #[must_use]
    pub fn exists(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Remove a key. Returns whether it existed.
    pub fn delete(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    /// All keys, optionally filtered by prefix.
    #[must_use]
    pub fn keys(&self, prefix: &str) -> Vec<String> {
        self.values
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Add `amount` to a numeric value, treating an absent key as `0`.
    ///
    /// Returns the new value.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidType`] when the existing value does
    /// not parse as an integer.
    pub fn increment(&mut self, key: &str, amount: i64) -> SessionResult<i64> {
        let current = match self.values.get(key) {
            None => 0,
            Some(value) => value.parse::<i64>().map_err(|_| SessionError::InvalidType {
                key: key.to_string(),
                value: value.clone(),
            })?,
        };
        let next = current.saturating_add(amount);
        self.values.insert(key.to_string(), next.to_string());
        Ok(next)
    }

    /// Subtract `amount` from a numeric value.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidType`] when the existing value does
    /// not parse as an integer.
    pub fn decrement(&mut self, key: &str, amount: i64) -> SessionResult<i64> {
        self.increment(key, amount.saturating_neg())
    }

    /// Append a line to a value, separated by `\n`.
    pub fn append(&mut self, key: &str, line: &str) {
        match self.values.get_mut(key) {
            Some(existing) => {
                existing.push('\n');
                existing.push_str(line);
            },
            None => {
                self.values.insert(key.to_string(), line.to_string());
            },
        }
    }

    /// Remove everything except the session metadata.
    pub fn clear(&mut self) {
        self.values.retain(|key, _| key.starts_with("session:_"));
    }

    /// Record an event: bumps `metrics:event_count` and writes
    /// `events:<count>_<type> = timestamp|type|data`.
    ///
    /// Counters are zero-padded so the event log sorts by key.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidType`] if the event counter has been
    /// corrupted to a non-numeric value.
    pub fn track_event(&mut self, event_type: &str, data: &str) -> SessionResult<()> {
        let count = self.increment("metrics:event_count", 1)?;
        let key = format!("events:{count:06}_{event_type}");
        let value = format!("{}|{event_type}|{data}", Utc::now().timestamp());
        self.values.insert(key, value);
        Ok(())
    }

    /// Record a violation, weighted by severity, and stamp the decay clock.
    ///
    /// Returns the raw (undecayed) score.
    pub fn record_violation(&mut self, severity: Severity) -> f64 {
        let weight = match severity {
            Severity::Debug => 0.0,
            Severity::Warn => WARN_WEIGHT,
            Severity::Blocked => BLOCK_WEIGHT,
            Severity::Critical => CRITICAL_WEIGHT,
        };
        let score = self.raw_score() + weight;
        self.values
            .insert("metrics:violation_score".to_string(), format!("{score:.2}"));
        self.values.insert(
            "metrics:last_violation_at".to_string(),
            Utc::now().timestamp().to_string(),
        );
        score
    }

    /// The violation score with exponential decay applied.
    ///
    /// The stored score is multiplied by `decay_rate` for each whole minute
    /// elapsed since the last recorded violation.
    #[must_use]
    pub fn decayed_score(&self, decay_rate: f64) -> f64 {
        let score = self.raw_score();
        if score <= 0.0 {
            return 0.0;
        }
        let last = self
            .values
            .get("metrics:last_violation_at")
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or_else(|| Utc::now().timestamp());
        let minutes = (Utc::now().timestamp() - last).max(0) / 60;
        #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
        let factor = decay_rate.powi(minutes.min(i64::from(i32::MAX)) as i32);
        score * factor
    }

    fn raw_score(&self) -> f64 {
        self.values
            .get("metrics:violation_score")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.0)
    }

    /// Save the state atomically to `path` as `key=b64(value)` lines.
    ///
    /// Writes to `path.tmp.<pid>` then renames, so concurrent saves from
    /// parallel invocations cannot interleave; the last rename wins.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Io`] on filesystem failure. The temp file is
    /// unlinked before returning on the failure path.
    pub fn save(&self, path: &Path) -> SessionResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut tmp_name = path.file_name().map_or_else(
            || std::ffi::OsString::from("session.state"),
            std::ffi::OsStr::to_os_string,
        );
        tmp_name.push(format!(".tmp.{}", std::process::id()));
        let tmp = path.with_file_name(tmp_name);

        let result = (|| -> SessionResult<()> {
            let mut file = std::fs::File::create(&tmp)?;
            writeln!(file, "# wow-system session state")?;
            writeln!(file, "# saved {}", Utc::now().to_rfc3339())?;
            for (key, value) in &self.values {
                writeln!(file, "{key}={}", B64.encode(value))?;
            }
            file.sync_all()?;
            std::fs::rename(&tmp, path)?;
            Ok(())
        })();

        if result.is_err() {
            let _ = std::fs::remove_file(&tmp);
        } else {
            debug!(path = %path.display(), entries = self.values.len(), "session saved");
        }
        result
    }

    /// Load state from `path`, merging into this store.
    ///
    /// `# comment` lines and blank lines are skipped. The live session's
    /// `_session_id` / `_started_at` are preserved: restoring into an
    /// active session keeps its identity. Malformed lines are skipped with
    /// a warning rather than failing the load.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Io`] if the file cannot be read.
    pub fn load(&mut self, path: &Path) -> SessionResult<usize> {
        let text = std::fs::read_to_string(path)?;
        let mut loaded = 0;
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, encoded)) = line.split_once('=') else {
                warn!(line_no = idx + 1, "skipping state line without separator");
                continue;
            };
            let Ok(bytes) = B64.decode(encoded) else {
                warn!(line_no = idx + 1, key = %key, "skipping state line with bad base64");
                continue;
            };
            let value = String::from_utf8_lossy(&bytes).into_owned();
            if (key == SESSION_ID_KEY || key == STARTED_AT_KEY) && self.values.contains_key(key) {
                continue;
            }
            self.values.insert(key.to_string(), value);
            loaded += 1;
        }
        debug!(path = %path.display(), loaded, "session loaded");
        Ok(loaded)
    }

    /// Archive the state to `<archive_dir>/<session_id>.state`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Io`] on filesystem failure.
    pub fn archive(&self, archive_dir: &Path) -> SessionResult<std::path::PathBuf> {
        let path = archive_dir.join(format!("{}.state", self.session_id()));
        self.save(&path)?;
        Ok(path)
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the store holds no keys at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
