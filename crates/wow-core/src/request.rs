//! Tool request parsing and field access.
//!
//! The host serialises each pending tool invocation as a JSON object with a
//! `tool` field naming the tool and tool-specific string fields alongside it.
//! [`ToolRequest`] keeps the raw object intact so unknown fields survive a
//! pass-through unchanged; handlers that mutate a request (e.g. the shell
//! handler rewriting `git commit`) produce a new value via [`ToolRequest::with_field`].

use serde_json::{Map, Value};
use std::fmt;

use crate::error::{CoreError, CoreResult};

/// An immutable tool request parsed from host JSON.
///
/// The request is a thin view over the raw JSON object. Field accessors
/// return `None` for absent or non-string fields; mutation builds a new
/// request so the original stays available for auditing.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRequest {
    raw: Map<String, Value>,
}

impl ToolRequest {
    /// Parse a request from the host's JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Json`] if the text is not valid JSON and
    /// [`CoreError::InvalidInput`] if the top level is not an object.
    pub fn from_json(text: &str) -> CoreResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        match value {
            Value::Object(raw) => Ok(Self { raw }),
            other => Err(CoreError::InvalidInput(format!(
                "tool request must be a JSON object, got {}",
                type_name(&other)
            ))),
        }
    }

    /// Build a request directly from a JSON object.
    #[must_use]
    pub fn from_object(raw: Map<String, Value>) -> Self {
        Self { raw }
    }

    /// The tool name, if the `tool` field is present and a string.
    ///
    /// A request without a tool name is passed through unchanged by the
    /// router rather than rejected.
    #[must_use]
    pub fn tool(&self) -> Option<&str> {
        self.raw.get("tool").and_then(Value::as_str)
    }

    /// Read a string field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.raw.get(name).and_then(Value::as_str)
    }

    /// Read a string field, treating empty strings as absent.
    #[must_use]
    pub fn non_empty_field(&self, name: &str) -> Option<&str> {
        self.field(name).filter(|s| !s.trim().is_empty())
    }

    /// Read an array-of-strings field (e.g. `allowed_domains`).
    #[must_use]
    pub fn list_field(&self, name: &str) -> Vec<String> {
        match self.raw.get(name) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// The primary operation string for this request.
    ///
    /// This is the string the policy table, heuristic detector, and
    /// correlator score: the command for shell tools, the path for file
    /// tools, the pattern for search tools, the URL/query/prompt for the
    /// network and agent tools.
    #[must_use]
    pub fn operation(&self) -> Option<&str> {
        for name in [
            "command",
            "file_path",
            "notebook_path",
            "pattern",
            "url",
            "query",
            "prompt",
            "path",
        ] {
            if let Some(value) = self.non_empty_field(name) {
                return Some(value);
            }
        }
        None
    }

    /// Return a copy of this request with one string field replaced.
    #[must_use]
    pub fn with_field(&self, name: &str, value: impl Into<String>) -> Self {
        let mut raw = self.raw.clone();
        raw.insert(name.to_string(), Value::String(value.into()));
        Self { raw }
    }

    /// The underlying JSON object.
    #[must_use]
    pub fn as_object(&self) -> &Map<String, Value> {
        &self.raw
    }

    /// Serialise back to JSON text for the host.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Json`] if serialization fails.
    pub fn to_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string(&Value::Object(self.raw.clone()))?)
    }
}

impl fmt::Display for ToolRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tool = self.tool().unwrap_or("<unnamed>");
        let op = self.operation().unwrap_or("");
        write!(f, "{tool}: {op}")
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
