//! Heuristic evasion detection and operation correlation.
//!
//! Two complementary detectors:
//!
//! - [`heuristic`]: a pure, side-effect-free scorer that flags evasion
//!   signals in a single operation string (encoded payloads, obfuscation,
//!   indirect execution, network piping).
//! - [`correlator`]: a bounded sliding window over *prior* operations that
//!   catches split attacks assembled from individually-benign steps
//!   (write-then-execute, download-then-execute, staged building, config
//!   poisoning).
//!
//! Confidence/risk scale is 0..100: `>= 70` blocks, `40..70` warns.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

/// Sliding-window split-attack correlation.
pub mod correlator;
/// Pure heuristic scoring of one operation string.
pub mod heuristic;

pub use correlator::{CorrelationVerdict, CorrelationWindow};
pub use heuristic::{HeuristicSignal, SignalCategory, detect, strongest};

/// Confidence / risk at or above which an operation is blocked.
pub const BLOCK_THRESHOLD: u8 = 70;
/// Confidence / risk at or above which a warning is recorded.
pub const WARN_THRESHOLD: u8 = 40;
