//! The context surface handlers receive from the router.

use serde_json::Value;
use wow_core::Severity;

/// Session, config, metric, and event access injected into every handler.
///
/// Handlers never touch the session store or event bus directly; the
/// router owns both and hands out this interface, which keeps the
/// dependency graph acyclic and the handlers testable against a stub.
pub trait PolicyContext {
    /// Whether warnings escalate to blocks
    /// (`enforcement.strict_mode || enforcement.block_on_violation`).
    fn strict_mode(&self) -> bool;

    /// Integer config accessor.
    fn config_int(&self, key: &str, default: i64) -> i64;

    /// Boolean config accessor.
    fn config_bool(&self, key: &str, default: bool) -> bool;

    /// String config accessor.
    fn config_str(&self, key: &str, default: &str) -> String;

    /// String-array config accessor.
    fn config_array(&self, key: &str) -> Vec<String>;

    /// Record a session event (`track_event` on the session store).
    fn track_event(&mut self, event_type: &str, data: &str);

    /// Bump a session metric, returning the new value.
    fn increment_metric(&mut self, key: &str) -> i64;

    /// Read a session metric (0 when absent or non-numeric).
    fn metric(&self, key: &str) -> i64;

    /// Read a raw session value.
    fn session_get(&self, key: &str) -> Option<String>;

    /// Write a raw session value.
    fn session_set(&mut self, key: &str, value: &str);

    /// Record a warning for the current request; the router prints it to
    /// stderr and feeds the violation score.
    fn record_warning(&mut self, tool: &str, message: &str);

    /// Publish an event on the bus (`version_bump`, …).
    fn publish(&mut self, topic: &str, data: Value);

    /// Whether a finding of `severity` must block.
    ///
    /// Blocks and criticals always block; warnings block only in strict
    /// mode; debug findings never do.
    fn should_block(&self, severity: Severity) -> bool {
        match severity {
            Severity::Critical | Severity::Blocked => true,
            Severity::Warn => self.strict_mode(),
            Severity::Debug => false,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! A stub context for handler unit tests.

    use super::PolicyContext;
    use serde_json::Value;
    use std::collections::BTreeMap;

    /// In-memory context: config map + captured warnings/events.
    #[derive(Debug, Default)]
    pub(crate) struct StubContext {
        pub(crate) strict: bool,
        pub(crate) config: BTreeMap<String, Value>,
        pub(crate) session: BTreeMap<String, String>,
        pub(crate) warnings: Vec<String>,
        pub(crate) events: Vec<(String, String)>,
        pub(crate) published: Vec<(String, Value)>,
    }

    impl StubContext {
        pub(crate) fn strict() -> Self {
            Self { strict: true, ..Self::default() }
        }
    }

    impl PolicyContext for StubContext {
        fn strict_mode(&self) -> bool {
            self.strict
        }

        fn config_int(&self, key: &str, default: i64) -> i64 {
            self.config.get(key).and_then(Value::as_i64).unwrap_or(default)
        }

        fn config_bool(&self, key: &str, default: bool) -> bool {
            self.config.get(key).and_then(Value::as_bool).unwrap_or(default)
        }

        fn config_str(&self, key: &str, default: &str) -> String {
            self.config
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or(default)
                .to_string()
        }

        fn config_array(&self, key: &str) -> Vec<String> {
            match self.config.get(key) {
                Some(Value::Array(items)) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
                _ => Vec::new(),
            }
        }

        fn track_event(&mut self, event_type: &str, data: &str) {
            self.events.push((event_type.to_string(), data.to_string()));
        }

        fn increment_metric(&mut self, key: &str) -> i64 {
            let next = self.metric(key) + 1;
            self.session.insert(key.to_string(), next.to_string());
            next
        }

        fn metric(&self, key: &str) -> i64 {
            self.session
                .get(key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(0)
        }

        fn session_get(&self, key: &str) -> Option<String> {
            self.session.get(key).cloned()
        }

        fn session_set(&mut self, key: &str, value: &str) {
            self.session.insert(key.to_string(), value.to_string());
        }

        fn record_warning(&mut self, _tool: &str, message: &str) {
            self.warnings.push(message.to_string());
        }

        fn publish(&mut self, topic: &str, data: Value) {
            self.published.push((topic.to_string(), data));
        }
    }
}
