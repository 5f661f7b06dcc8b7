//! Event subscribers used to observe lifecycle events in tests.

use async_trait::async_trait;
use parking_lot::Mutex;

use tally_persistence::events::{EventSubscriber, LifecycleEvent, PublishError};

/// Records every event it receives.
#[derive(Debug, Default)]
pub struct RecordingSubscriber {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl RecordingSubscriber {
    /// Returns a copy of the recorded events.
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events.lock().clone()
    }

    /// Returns the recorded topics in delivery order.
    pub fn topics(&self) -> Vec<String> {
        self.events.lock().iter().map(|e| e.topic()).collect()
    }

    /// Forgets every recorded event.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

#[async_trait]
impl EventSubscriber for RecordingSubscriber {
    fn name(&self) -> &str {
        "recording"
    }

    async fn handle(&self, event: &LifecycleEvent) -> Result<(), PublishError> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

/// Rejects every event.
#[derive(Debug, Default)]
pub struct FailingSubscriber;

#[async_trait]
impl EventSubscriber for FailingSubscriber {
    fn name(&self) -> &str {
        "failing"
    }

    async fn handle(&self, _event: &LifecycleEvent) -> Result<(), PublishError> {
        Err(PublishError::Subscriber {
            subscriber: "failing".to_string(),
            message: "downstream unavailable".to_string(),
        })
    }
}
