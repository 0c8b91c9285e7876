//! The decision pipeline.

use std::collections::HashMap;
use tracing::{debug, info};

use wow_core::{Decision, Severity, ToolRequest, WowHome};
use wow_detect::{BLOCK_THRESHOLD, CorrelationVerdict, WARN_THRESHOLD, heuristic};
use wow_handlers::{
    CustomRuleEngine, HandlerVerdict, PolicyContext as _, RuleAction, ToolHandler,
    builtin_handlers,
};
use wow_policy::{FastPathResult, PolicyTable, classify};
use wow_privilege::{PrivilegeManager, PrivilegeMode};
use wow_session::SessionStore;

use crate::context::Core;
use crate::error::RouterResult;
use crate::registry::ToolRegistry;
use crate::response::RouterResponse;

/// Orchestrates the pipeline for each tool request.
pub struct Router {
    core: Core,
    policy: PolicyTable,
    handlers: HashMap<&'static str, Box<dyn ToolHandler>>,
    custom: CustomRuleEngine,
    bypass: PrivilegeManager,
    superadmin: PrivilegeManager,
}

impl Router {
    /// Build a router rooted at `home`: load config, restore the session
    /// state file, compile the policy tables, load custom rules.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::RouterError`] when the home directory cannot be
    /// scaffolded, the config file is malformed, or the rule file is
    /// unreadable. A *missing* config or rule file is fine.
    pub fn new(home: WowHome) -> RouterResult<Self> {
        home.ensure()?;
        let config = wow_config::load(&home.config_file())?;
        let custom = CustomRuleEngine::load(&home.custom_rules_file())?;

        let state_file = home.session_state_file();
        let session = if state_file.exists() {
            SessionStore::restore(&state_file).unwrap_or_else(|err| {
                tracing::warn!(error = %err, "session restore failed, starting fresh");
                SessionStore::new()
            })
        } else {
            SessionStore::new()
        };

        let bypass = PrivilegeManager::new(PrivilegeMode::Bypass, &home);
        let superadmin = PrivilegeManager::new(PrivilegeMode::SuperAdmin, &home);

        let handlers = builtin_handlers()
            .into_iter()
            .map(|handler| (handler.tool(), handler))
            .collect();

        Ok(Self {
            core: Core::new(home, config, session),
            policy: PolicyTable::standard(),
            handlers,
            custom,
            bypass,
            superadmin,
        })
    }

    /// The core context (subscriber wiring, tests).
    #[must_use]
    pub fn core(&self) -> &Core {
        &self.core
    }

    /// Mutable core access (subscriber wiring, tests).
    pub fn core_mut(&mut self) -> &mut Core {
        &mut self.core
    }

    /// Run one tool request through the pipeline.
    ///
    /// Never fails: malformed input warns and passes through; every other
    /// outcome is a [`Decision`].
    pub fn handle(&mut self, input: &str) -> RouterResponse {
        let request = match ToolRequest::from_json(input) {
            Ok(request) => request,
            Err(err) => {
                // InvalidInput is a soft failure: warn, pass through.
                return RouterResponse::raw(
                    input,
                    vec![(Severity::Warn, format!("malformed tool request: {err}"))],
                );
            },
        };

        let decision = self.decide(&request);

        let mut messages: Vec<(Severity, String)> = self
            .core
            .take_warnings()
            .into_iter()
            .map(|warning| (Severity::Warn, warning))
            .collect();

        match &decision {
            Decision::Allow(_) => {},
            Decision::Block { reason } => {
                self.core.record_violation(Severity::Blocked, reason);
                self.core.track_event("blocked", reason);
                messages.push((Severity::Blocked, reason.clone()));
            },
            Decision::SuperAdminRequired { reason } => {
                self.core.record_violation(Severity::Blocked, reason);
                self.core.track_event("superadmin_required", reason);
                messages.push((Severity::Blocked, format!("{reason} (SuperAdmin required)")));
            },
            Decision::CriticalBlock { reason } => {
                self.core.record_violation(Severity::Critical, reason);
                self.core.track_event("critical_blocked", reason);
                messages.push((
                    Severity::Critical,
                    format!("{reason} (bypass will not lift this block)"),
                ));
            },
        }

        self.core.save_session();
        RouterResponse::new(decision, messages)
    }

    #[allow(clippy::too_many_lines)]
    fn decide(&mut self, request: &ToolRequest) -> Decision {
        // 1. A request without a tool name passes through unchanged.
        let Some(tool) = request.tool().map(str::to_string) else {
            debug!("request without tool name, passing through");
            return Decision::Allow(request.clone());
        };
        let tool = tool.as_str();

        if !self.core.config().get_bool("enforcement.enabled", true) {
            debug!("enforcement disabled, passing through");
            return Decision::Allow(request.clone());
        }

        // 2. The primary operation string drives every pattern layer.
        let operation = request.operation().unwrap_or_default().to_string();

        // 3. Critical policy gate, before any privilege consultation.
        if let Some(rule) = self.policy.match_critical(Some(tool), &operation) {
            return Decision::CriticalBlock { reason: rule.reason.clone() };
        }

        // 4. SuperAdmin policy gate.
        if let Some(rule) = self.policy.match_superadmin(Some(tool), &operation) {
            if self.superadmin.is_active() {
                self.superadmin.update_activity();
            } else {
                return Decision::SuperAdminRequired { reason: rule.reason.clone() };
            }
        }

        // 5. Bypass short-circuit: skip the deep handlers entirely.
        if self.bypass.is_active() {
            self.bypass.update_activity();
            info!(tool = %tool, "bypass active, skipping deep validation");
            self.core.track_event("bypassed", &operation);
            self.core.publish(
                "privilege.used",
                serde_json::json!({ "mode": "bypass", "tool": tool, "operation": operation }),
            );
            return Decision::Allow(request.clone());
        }

        // 6. Fast path: cheap resolution for reads.
        if tool == "Read"
            && self.core.config().get_bool("performance.fast_path_enabled", true)
        {
            if let Some(path) = request.non_empty_field("file_path") {
                match classify(path, "read") {
                    FastPathResult::Allow => {
                        debug!(path = %path, "fast-path allow");
                        return Decision::Allow(request.clone());
                    },
                    FastPathResult::Block { reason } => {
                        return Decision::Block { reason };
                    },
                    FastPathResult::Continue => {},
                }
            }
        }

        // 7. Heuristic evasion detector.
        let signals = heuristic::detect(&operation);
        if let Some(signal) = heuristic::strongest(&signals) {
            if signal.confidence >= BLOCK_THRESHOLD {
                return Decision::Block {
                    reason: format!(
                        "evasion heuristic ({}, confidence {}): {}",
                        signal.category, signal.confidence, signal.reason
                    ),
                };
            }
            if signal.confidence >= WARN_THRESHOLD {
                self.core
                    .record_warning(tool, &format!("evasion signal: {}", signal.reason));
            }
        }

        // 8. Correlator: check against prior operations, then record this
        //    one for the next.
        match self.core.window_mut().check(tool, &operation) {
            CorrelationVerdict::Dangerous { reason, risk } if risk >= BLOCK_THRESHOLD => {
                self.track_for_correlation(request, tool, &operation);
                return Decision::Block { reason: format!("{reason} (risk {risk})") };
            },
            CorrelationVerdict::Dangerous { reason, risk } if risk >= WARN_THRESHOLD => {
                self.core.record_warning(tool, &format!("{reason} (risk {risk})"));
            },
            _ => {},
        }
        self.track_for_correlation(request, tool, &operation);

        // Cumulative score escalation: repeat warn-band offenders block.
        let block_threshold =
            f64::from(u32::try_from(self.core.config().get_int("scoring.threshold_block", 80)).unwrap_or(80));
        if self.core.decayed_score() >= block_threshold {
            return Decision::Block {
                reason: format!(
                    "cumulative violation score exceeded {block_threshold}; session is rate-limited"
                ),
            };
        }

        // 9. Custom rules run before the built-in handler.
        if let Some(rule) = self.custom.evaluate(tool, &operation) {
            match rule.action {
                RuleAction::Block => {
                    return Decision::Block {
                        reason: format!("custom rule {}: {}", rule.name, rule.message),
                    };
                },
                RuleAction::Allow => {
                    debug!(rule = %rule.name, "custom rule allow short-circuit");
                    return Decision::Allow(request.clone());
                },
                RuleAction::Warn => {
                    let name = rule.name.clone();
                    let message = rule.message.clone();
                    self.core.record_warning(tool, &format!("custom rule {name}: {message}"));
                },
            }
        }

        // 10. Handler dispatch; unknown tools are tracked and passed
        //     through.
        let Some(handler) = self.handlers.get(tool) else {
            ToolRegistry::note(self.core.session_mut(), tool);
            return Decision::Allow(request.clone());
        };
        match handler.handle(request, &mut self.core) {
            HandlerVerdict::Allow => Decision::Allow(request.clone()),
            HandlerVerdict::Mutate(mutated) => Decision::Allow(mutated),
            HandlerVerdict::Block { reason } => Decision::Block { reason },
        }
    }

    /// Record the operation in the correlation window with the right
    /// target and content prefix for its tool.
    fn track_for_correlation(&mut self, request: &ToolRequest, tool: &str, operation: &str) {
        let content_prefix = request.field("content").unwrap_or_default();
        match tool {
            "Write" | "Edit" | "NotebookEdit" => {
                let target = request
                    .non_empty_field("file_path")
                    .or_else(|| request.non_empty_field("notebook_path"))
                    .unwrap_or(operation);
                self.core.window_mut().track("Write", target, content_prefix);
            },
            _ => {
                self.core.window_mut().track(tool, operation, content_prefix);
            },
        }
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("handlers", &self.handlers.len())
            .field("custom_rules", &self.custom.len())
            .finish_non_exhaustive()
    }
}
