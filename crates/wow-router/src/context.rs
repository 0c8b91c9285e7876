//! The core context: session, config, event bus, correlation window.

use serde_json::{Value, json};
use tracing::warn;

use wow_config::ConfigStore;
use wow_core::{Severity, WowHome};
use wow_detect::CorrelationWindow;
use wow_events::EventBus;
use wow_handlers::PolicyContext;
use wow_session::SessionStore;

/// Everything mutable the pipeline components share, owned in one place
/// and passed explicitly: there is no global state.
pub struct Core {
    home: WowHome,
    config: ConfigStore,
    session: SessionStore,
    bus: EventBus,
    window: CorrelationWindow,
    /// Warnings recorded while handling the current request.
    warnings: Vec<String>,
}

impl Core {
    /// Assemble a core context from its parts.
    #[must_use]
    pub fn new(home: WowHome, config: ConfigStore, session: SessionStore) -> Self {
        Self {
            home,
            config,
            session,
            bus: EventBus::new(),
            window: CorrelationWindow::new(),
            warnings: Vec::new(),
        }
    }

    /// The home directory layout.
    #[must_use]
    pub fn home(&self) -> &WowHome {
        &self.home
    }

    /// The configuration store.
    #[must_use]
    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    /// The session store.
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Mutable session access for the router's own bookkeeping.
    pub fn session_mut(&mut self) -> &mut SessionStore {
        &mut self.session
    }

    /// The event bus (subscribe/clear between invocations).
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// The correlation window.
    pub fn window_mut(&mut self) -> &mut CorrelationWindow {
        &mut self.window
    }

    /// Drain the warnings recorded for the current request.
    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    /// Record a violation of `severity`, feed the decay clock, and
    /// publish it on the bus.
    pub fn record_violation(&mut self, severity: Severity, reason: &str) {
        let score = self.session.record_violation(severity);
        self.bus.publish(
            "violation.recorded",
            &json!({ "severity": severity, "reason": reason, "score": score }),
        );
    }

    /// The violation score with decay applied.
    #[must_use]
    pub fn decayed_score(&self) -> f64 {
        let rate = self.config.get_float("scoring.decay_rate", 0.95);
        self.session.decayed_score(rate)
    }

    /// Persist the session to its state file; faults are logged, never
    /// propagated.
    pub fn save_session(&self) {
        let path = self.home.session_state_file();
        if let Err(err) = self.session.save(&path) {
            warn!(error = %err, "session save failed");
            return;
        }
        self.bus.publish("session.saved", &json!({ "path": path.display().to_string() }));
    }
}

impl PolicyContext for Core {
    fn strict_mode(&self) -> bool {
        self.config.get_bool("enforcement.strict_mode", false)
            || self.config.get_bool("enforcement.block_on_violation", false)
    }

    fn config_int(&self, key: &str, default: i64) -> i64 {
        self.config.get_int(key, default)
    }

    fn config_bool(&self, key: &str, default: bool) -> bool {
        self.config.get_bool(key, default)
    }

    fn config_str(&self, key: &str, default: &str) -> String {
        self.config.get_str(key, default)
    }

    fn config_array(&self, key: &str) -> Vec<String> {
        self.config.get_array(key)
    }

    fn track_event(&mut self, event_type: &str, data: &str) {
        if let Err(err) = self.session.track_event(event_type, data) {
            warn!(error = %err, event_type, "event tracking failed");
        }
    }

    fn increment_metric(&mut self, key: &str) -> i64 {
        match self.session.increment(key, 1) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, key, "metric update failed");
                0
            },
        }
    }

    fn metric(&self, key: &str) -> i64 {
        self.session.get(key, "0").parse().unwrap_or(0)
    }

    fn session_get(&self, key: &str) -> Option<String> {
        if self.session.exists(key) {
            Some(self.session.get(key, "").to_string())
        } else {
            None
        }
    }

    fn session_set(&mut self, key: &str, value: &str) {
        self.session.set(key, value);
    }

    fn record_warning(&mut self, tool: &str, message: &str) {
        self.warnings.push(message.to_string());
        let score = self.session.record_violation(Severity::Warn);
        self.bus.publish(
            "violation.recorded",
            &json!({ "severity": Severity::Warn, "tool": tool, "reason": message, "score": score }),
        );
    }

    fn publish(&mut self, topic: &str, data: Value) {
        self.bus.publish(topic, &data);
    }
}
