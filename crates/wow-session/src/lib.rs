//! Session state store for the wow-system core.
//!
//! A process-wide mapping from namespaced string keys to string values:
//!
//! - `session:*`: session metadata (`session:_session_id`,
//!   `session:_started_at` are set once and survive [`SessionStore::clear`])
//! - `metrics:*`: counters and the violation score
//! - `events:*`: append-only event log entries, ordered by a monotonic
//!   counter
//! - `unknown_tools:*`: the unknown-tool observability registry
//!
//! Persistence is line-oriented (`key=b64(value)`), written atomically via
//! a `.tmp.<pid>` sibling and rename. Binary-unsafe values are what the
//! base-64 encoding is for; in memory everything is UTF-8 text.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod store;

pub use error::{SessionError, SessionResult};
pub use store::SessionStore;
