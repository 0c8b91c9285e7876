//! Policy table and fast-path classifier for the wow-system core.
//!
//! The [`PolicyTable`] is the single source of truth mapping operation
//! patterns to security tiers:
//!
//! - **Critical**: rejected unconditionally, under every privilege state
//! - **SuperAdmin**: rejected unless the SuperAdmin mode is active
//!
//! The router consults the table *before* the privilege manager, so a
//! critical rule rejects even while bypass is active.
//!
//! The [`fastpath`] module is the cheap pre-filter that resolves
//! obviously-safe and obviously-dangerous paths without running the deep
//! handlers.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

/// Cheap allow/block/continue pre-filter on paths.
pub mod fastpath;
mod table;

pub use fastpath::{FastPathResult, classify};
pub use table::{PolicyRule, PolicyTable, Tier};
