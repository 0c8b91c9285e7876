//! Unknown-tool observability registry.
//!
//! Tools without a handler still pass through, but they are counted with
//! first/last-seen timestamps in session state so operators can spot new
//! host tools that need a handler.

use chrono::Utc;
use tracing::info;

use wow_session::SessionStore;

/// Session-state backed registry of tools with no handler.
pub struct ToolRegistry;

impl ToolRegistry {
    /// Record one sighting of an unknown tool.
    ///
    /// Returns `true` on the first sighting in this session.
    pub fn note(session: &mut SessionStore, tool: &str) -> bool {
        let key = format!("unknown_tools:{tool}_count");
        let first = !session.exists(&key);
        let now = Utc::now().timestamp().to_string();
        let _ = session.increment(&key, 1);
        if first {
            session.set(format!("unknown_tools:{tool}_first_seen"), now.clone());
            info!(tool = %tool, "unknown tool observed, passing through");
        }
        session.set(format!("unknown_tools:{tool}_last_seen"), now);
        first
    }

    /// Tools recorded in this session.
    #[must_use]
    pub fn known(session: &SessionStore) -> Vec<String> {
        session
            .keys("unknown_tools:")
            .into_iter()
            .filter_map(|k| {
                k.strip_prefix("unknown_tools:")
                    .and_then(|rest| rest.strip_suffix("_count"))
                    .map(str::to_string)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sighting_flag() {
        let mut session = SessionStore::new();
        assert!(ToolRegistry::note(&mut session, "McpWidget"));
        assert!(!ToolRegistry::note(&mut session, "McpWidget"));
        assert_eq!(session.get("unknown_tools:McpWidget_count", "0"), "2");
    }

    #[test]
    fn test_timestamps_recorded() {
        let mut session = SessionStore::new();
        ToolRegistry::note(&mut session, "Other");
        assert!(session.exists("unknown_tools:Other_first_seen"));
        assert!(session.exists("unknown_tools:Other_last_seen"));
    }

    #[test]
    fn test_known_listing() {
        let mut session = SessionStore::new();
        ToolRegistry::note(&mut session, "A");
        ToolRegistry::note(&mut session, "B");
        let mut known = ToolRegistry::known(&session);
        known.sort();
        assert_eq!(known, vec!["A", "B"]);
    }
}
