//! The router's answer to the host.

use wow_core::{Decision, Severity};

/// Decision plus the human-readable lines that accompany it.
#[derive(Debug)]
pub struct RouterResponse {
    /// The pipeline decision.
    pub decision: Decision,
    /// Severity-tagged messages for stderr, in emission order.
    pub messages: Vec<(Severity, String)>,
    /// Raw pass-through text used when the input could not be parsed.
    raw_passthrough: Option<String>,
}

impl RouterResponse {
    pub(crate) fn new(decision: Decision, messages: Vec<(Severity, String)>) -> Self {
        Self { decision, messages, raw_passthrough: None }
    }

    pub(crate) fn raw(input: &str, messages: Vec<(Severity, String)>) -> Self {
        Self {
            decision: Decision::Allow(wow_core::ToolRequest::from_object(
                serde_json::Map::new(),
            )),
            messages,
            raw_passthrough: Some(input.to_string()),
        }
    }

    /// Exit code for the host (`0|2|3|4`).
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.decision.exit_code()
    }

    /// What to print on stdout: the (possibly mutated) request JSON on
    /// pass-through, nothing on a block.
    #[must_use]
    pub fn stdout(&self) -> Option<String> {
        if let Some(raw) = &self.raw_passthrough {
            return Some(raw.clone());
        }
        match &self.decision {
            Decision::Allow(request) => request.to_json().ok(),
            _ => None,
        }
    }

    /// Severity-tagged stderr lines (`TAG: message`).
    #[must_use]
    pub fn stderr_lines(&self) -> Vec<String> {
        self.messages
            .iter()
            .map(|(severity, message)| format!("{severity}: {message}"))
            .collect()
    }
}
