//! Decision pipeline orchestration for the wow-system core.
//!
//! The [`Router`] owns one [`Core`] context (session store, config, event
//! bus, correlation window) for the life of the process and runs each tool
//! request through the layered pipeline:
//!
//! 1. Parse; a request without a tool name passes through unchanged.
//! 2. Critical policy gate: rejects under every privilege state.
//! 3. SuperAdmin policy gate: rejects unless SuperAdmin is active.
//! 4. Bypass short-circuit: an active bypass touches activity and skips
//!    the deep handlers.
//! 5. Fast-path classifier for cheap read resolution.
//! 6. Heuristic evasion detector, then the cross-operation correlator.
//! 7. Custom rules, then the per-tool handler.
//!
//! Security decisions are terminal; auxiliary faults (event subscribers,
//! session persistence) are logged and never change the decision.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod context;
mod error;
mod registry;
mod response;
mod router;

pub use context::Core;
pub use error::{RouterError, RouterResult};
pub use registry::ToolRegistry;
pub use response::RouterResponse;
pub use router::Router;
