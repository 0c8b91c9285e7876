//! Named-topic publish/subscribe with synchronous dispatch.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{trace, warn};

/// Error returned by a subscriber callback.
///
/// Subscriber failures never propagate out of [`EventBus::publish`]; they
/// are logged and the remaining subscribers still run.
#[derive(Debug, Error)]
#[error("subscriber error: {0}")]
pub struct EventError(pub String);

impl EventError {
    /// Build an error from any displayable value.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A synchronous event subscriber, addressed by name within a topic.
pub trait EventSubscriber: Send + Sync {
    /// Handle one published event.
    ///
    /// # Errors
    ///
    /// Returning an error only logs a warning; it does not affect other
    /// subscribers or the publisher.
    fn on_event(&self, topic: &str, data: &Value) -> Result<(), EventError>;
}

/// Blanket impl so plain closures can subscribe.
impl<F> EventSubscriber for F
where
    F: Fn(&str, &Value) -> Result<(), EventError> + Send + Sync,
{
    fn on_event(&self, topic: &str, data: &Value) -> Result<(), EventError> {
        self(topic, data)
    }
}

type TopicList = Vec<(String, Arc<dyn EventSubscriber>)>;

/// Named-topic event bus with synchronous, in-order dispatch.
///
/// Subscribers are held behind a mutex so the bus can be shared immutably
/// from the core context; dispatch clones the topic's subscriber list
/// before calling out, which keeps re-entrant publishes (a handler
/// publishing another event) deadlock-free and depth-first.
#[derive(Default)]
pub struct EventBus {
    topics: Mutex<HashMap<String, TopicList>>,
}

impl EventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `subscriber` to `topic` under `name`.
    ///
    /// Re-subscribing an existing name on the same topic replaces the
    /// callback but keeps its position in the dispatch order.
    pub fn subscribe(
        &self,
        topic: impl Into<String>,
        name: impl Into<String>,
        subscriber: Arc<dyn EventSubscriber>,
    ) {
        let topic = topic.into();
        let name = name.into();
        let mut topics = self.topics.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let list = topics.entry(topic).or_default();
        if let Some(slot) = list.iter_mut().find(|(existing, _)| *existing == name) {
            slot.1 = subscriber;
        } else {
            list.push((name, subscriber));
        }
    }

    /// Remove one named subscriber from a topic.
    ///
    /// Returns whether a subscriber was removed.
    pub fn unsubscribe(&self, topic: &str, name: &str) -> bool {
        let mut topics = self.topics.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(list) = topics.get_mut(topic) {
            let before = list.len();
            list.retain(|(existing, _)| existing != name);
            return list.len() != before;
        }
        false
    }

    /// Remove every subscriber from every topic.
    ///
    /// Called between invocations so stale callbacks cannot observe a new
    /// session.
    pub fn clear_all(&self) {
        self.topics
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clear();
    }

    /// Publish `data` to every subscriber of `topic`, in subscription
    /// order, on the calling thread.
    ///
    /// Returns the number of subscribers that were invoked. Subscriber
    /// errors are logged and swallowed.
    pub fn publish(&self, topic: &str, data: &Value) -> usize {
        // Snapshot the list so a subscriber can publish (or re-subscribe)
        // without deadlocking on the topics lock.
        let snapshot: TopicList = {
            let topics = self.topics.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            topics.get(topic).cloned().unwrap_or_default()
        };

        trace!(topic = %topic, subscribers = snapshot.len(), "publishing event");

        for (name, subscriber) in &snapshot {
            if let Err(err) = subscriber.on_event(topic, data) {
                warn!(topic = %topic, subscriber = %name, error = %err, "subscriber failed");
            }
        }
        snapshot.len()
    }

    /// Number of subscribers currently attached to a topic.
    #[must_use]
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(topic)
            .map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let topics = self.topics.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        f.debug_struct("EventBus").field("topics", &topics.len()).finish()
    }
}
