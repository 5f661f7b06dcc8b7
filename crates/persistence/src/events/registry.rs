//! Subscriber registry.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info};

use super::event::LifecycleEvent;
use super::publisher::{EventPublisher, PublishError};

/// A consumer of lifecycle events.
#[async_trait]
pub trait EventSubscriber: Send + Sync {
    /// Returns a name used in logs and error messages.
    fn name(&self) -> &str;

    /// Returns `true` if the subscriber wants the event. Defaults to all events.
    fn accepts(&self, _event: &LifecycleEvent) -> bool {
        true
    }

    /// Handles an event.
    async fn handle(&self, event: &LifecycleEvent) -> Result<(), PublishError>;
}

/// Publisher that fans events out to registered subscribers.
///
/// Every accepting subscriber is invoked, in registration order, even when an
/// earlier one fails; the failures are reported together afterwards.
#[derive(Default)]
pub struct SubscriberRegistry {
    subscribers: RwLock<Vec<Arc<dyn EventSubscriber>>>,
}

impl SubscriberRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber.
    pub fn subscribe(&self, subscriber: Arc<dyn EventSubscriber>) {
        debug!(subscriber = subscriber.name(), "Registered event subscriber");
        self.subscribers.write().push(subscriber);
    }

    /// Removes every subscriber with the given name. Returns how many were removed.
    pub fn unsubscribe(&self, name: &str) -> usize {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|s| s.name() != name);
        before - subscribers.len()
    }

    /// Returns the number of registered subscribers.
    pub fn len(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Returns true if no subscriber is registered.
    pub fn is_empty(&self) -> bool {
        self.subscribers.read().is_empty()
    }
}

impl std::fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self
            .subscribers
            .read()
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        f.debug_struct("SubscriberRegistry")
            .field("subscribers", &names)
            .finish()
    }
}

#[async_trait]
impl EventPublisher for SubscriberRegistry {
    async fn publish(&self, event: &LifecycleEvent) -> Result<(), PublishError> {
        // Snapshot so no lock is held across subscriber calls.
        let subscribers: Vec<Arc<dyn EventSubscriber>> = self.subscribers.read().clone();

        let mut failures = Vec::new();
        for subscriber in subscribers.iter().filter(|s| s.accepts(event)) {
            if let Err(e) = subscriber.handle(event).await {
                failures.push(format!("{}: {}", subscriber.name(), e));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(PublishError::Delivery {
                topic: event.topic(),
                failures,
            })
        }
    }
}

/// Subscriber that logs every event at `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSubscriber;

#[async_trait]
impl EventSubscriber for LoggingSubscriber {
    fn name(&self) -> &str {
        "logging"
    }

    async fn handle(&self, event: &LifecycleEvent) -> Result<(), PublishError> {
        info!(
            topic = %event.topic(),
            event_id = %event.event_id,
            tenant = %event.tenant_id,
            document_id = event.document_id,
            correlation_id = event.correlation_id.as_deref().unwrap_or("-"),
            "Document lifecycle event"
        );
        Ok(())
    }
}
