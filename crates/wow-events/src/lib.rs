//! Synchronous event bus for the wow-system core.
//!
//! This crate provides:
//! - Named topics holding ordered lists of subscribers
//! - Synchronous, in-order dispatch on the publishing thread
//! - Subscriber errors isolated and logged, never propagated
//!
//! # Architecture
//!
//! The core runs one decision pipeline per invocation on a single thread,
//! so the bus dispatches synchronously: `publish` walks the topic's
//! subscriber list in subscription order and calls each one before
//! returning. A subscriber may itself publish (re-entrant dispatch); nested
//! events are processed depth-first.
//!
//! # Example
//!
//! ```rust
//! use wow_events::{EventBus, EventSubscriber, EventError};
//! use serde_json::{Value, json};
//!
//! struct Counter;
//! impl EventSubscriber for Counter {
//!     fn on_event(&self, _topic: &str, _data: &Value) -> Result<(), EventError> {
//!         Ok(())
//!     }
//! }
//!
//! let bus = EventBus::new();
//! bus.subscribe("violation.recorded", "counter", std::sync::Arc::new(Counter));
//! let delivered = bus.publish("violation.recorded", &json!({"severity": "warn"}));
//! assert_eq!(delivered, 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod bus;

pub use bus::{EventBus, EventError, EventSubscriber};
