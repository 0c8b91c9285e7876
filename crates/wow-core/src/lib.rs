//! Core types for the wow-system security interception core.
//!
//! This crate provides:
//! - [`ToolRequest`]: the immutable tool-request input parsed from host JSON
//! - [`Decision`]: the outcome of the decision pipeline, mapped to exit codes
//! - [`Severity`]: stderr tag levels for human-readable reasons
//! - [`WowHome`]: `$WOW_HOME` directory scaffolding with secure permissions
//! - [`text`]: the shared string transforms used by classifiers and handlers
//!
//! # Architecture
//!
//! `wow-core` sits at the bottom of the workspace: every other crate depends
//! on it and it depends on no internal crate. Domain logic (policy tables,
//! privilege state, handlers) lives in the layers above.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod decision;
mod dirs;
mod error;
mod request;
/// Shared string transforms (whitespace collapse, dequoting, case folding).
pub mod text;

pub use decision::{Decision, Severity};
pub use dirs::WowHome;
pub use error::{CoreError, CoreResult};
pub use request::ToolRequest;
