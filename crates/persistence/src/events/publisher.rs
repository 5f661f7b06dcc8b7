//! Event publishers.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

use super::event::LifecycleEvent;

/// Errors raised while delivering an event.
///
/// Services log these and carry on; they never fail the operation that
/// raised the event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// A single subscriber rejected the event.
    #[error("subscriber '{subscriber}' failed: {message}")]
    Subscriber {
        /// Subscriber name.
        subscriber: String,
        /// Failure description.
        message: String,
    },

    /// One or more subscribers of a fan-out failed.
    #[error(
        "failed to deliver {topic} to {} subscriber(s): {}",
        .failures.len(),
        .failures.join("; ")
    )]
    Delivery {
        /// Event topic.
        topic: String,
        /// One message per failed subscriber.
        failures: Vec<String>,
    },
}

/// Receives lifecycle events after their writes commit.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Delivers an event.
    async fn publish(&self, event: &LifecycleEvent) -> Result<(), PublishError>;
}

/// Publisher that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

#[async_trait]
impl EventPublisher for NoopPublisher {
    async fn publish(&self, _event: &LifecycleEvent) -> Result<(), PublishError> {
        Ok(())
    }
}

/// Publisher that forwards events to a `tokio` broadcast channel.
///
/// Events published while nobody is subscribed are dropped. Slow receivers
/// that fall more than `capacity` events behind observe a lag error on their
/// side; the publisher never blocks.
#[derive(Debug, Clone)]
pub struct BroadcastPublisher {
    tx: broadcast::Sender<LifecycleEvent>,
}

impl BroadcastPublisher {
    /// Creates a publisher with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribes to published events.
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastPublisher {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl EventPublisher for BroadcastPublisher {
    async fn publish(&self, event: &LifecycleEvent) -> Result<(), PublishError> {
        if self.tx.send(event.clone()).is_err() {
            tracing::trace!(topic = %event.topic(), "No receivers for event");
        }
        Ok(())
    }
}
