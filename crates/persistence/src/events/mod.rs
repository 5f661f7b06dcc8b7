//! Document lifecycle events.
//!
//! Services raise a [`LifecycleEvent`] after every committed create, edit,
//! delete and publish, and hand it to an injected [`EventPublisher`].
//! Delivery is best-effort: a failing publisher is logged and never affects
//! the committed write.
//!
//! Provided publishers:
//!
//! - [`SubscriberRegistry`] - in-process fan-out to [`EventSubscriber`]s
//! - [`BroadcastPublisher`] - a `tokio` broadcast channel
//! - [`NoopPublisher`] - drops everything

mod event;
mod publisher;
mod registry;

pub use event::{EventName, LifecycleEvent};
pub use publisher::{BroadcastPublisher, EventPublisher, NoopPublisher, PublishError};
pub use registry::{EventSubscriber, LoggingSubscriber, SubscriberRegistry};

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;

    use super::*;
    use crate::tenant::{TenantContext, TenantId, TenantPermissions};
    use crate::types::{Document, DocumentKind, DocumentStatus};

    fn document(kind: DocumentKind) -> Document {
        Document {
            id: 5,
            kind,
            number: Some("EST-5".to_string()),
            counterparty_id: 1,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            due_date: None,
            reference: None,
            note: None,
            amount: Decimal::ZERO,
            status: DocumentStatus::Draft,
            published_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            entries: Vec::new(),
            counterparty: None,
        }
    }

    fn tenant() -> TenantContext {
        TenantContext::new(TenantId::new("acme"), TenantPermissions::full_access())
            .with_correlation_id("req-9")
    }

    struct Counting {
        name: &'static str,
        calls: AtomicUsize,
        fail: bool,
    }

    impl Counting {
        fn new(name: &'static str, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                calls: AtomicUsize::new(0),
                fail,
            })
        }
    }

    #[async_trait]
    impl EventSubscriber for Counting {
        fn name(&self) -> &str {
            self.name
        }

        async fn handle(&self, _event: &LifecycleEvent) -> Result<(), PublishError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(PublishError::Subscriber {
                    subscriber: self.name.to_string(),
                    message: "boom".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_event_topic_and_payload() {
        let old = document(DocumentKind::SaleEstimate);
        let mut new = old.clone();
        new.status = DocumentStatus::Published;

        let event = LifecycleEvent::published(&tenant(), old, new);
        assert_eq!(event.topic(), "saleEstimate.onPublished");
        assert_eq!(event.document_id, 5);
        assert_eq!(event.correlation_id.as_deref(), Some("req-9"));
        assert_eq!(
            event.old_document.map(|d| d.status),
            Some(DocumentStatus::Draft)
        );

        let json = serde_json::to_value(LifecycleEvent::created(
            &tenant(),
            document(DocumentKind::Bill),
        ))
        .unwrap();
        assert_eq!(json["name"], "onCreated");
        assert_eq!(json["kind"], "bill");
        assert!(json.get("old_document").is_none());
    }

    #[tokio::test]
    async fn test_registry_delivers_to_all_despite_failure() {
        let registry = SubscriberRegistry::new();
        let failing = Counting::new("failing", true);
        let healthy = Counting::new("healthy", false);
        registry.subscribe(failing.clone());
        registry.subscribe(healthy.clone());
        registry.subscribe(Arc::new(LoggingSubscriber));

        let event = LifecycleEvent::deleted(&tenant(), document(DocumentKind::SaleInvoice));
        let err = registry.publish(&event).await.unwrap_err();

        assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
        assert_eq!(healthy.calls.load(Ordering::SeqCst), 1);
        match err {
            PublishError::Delivery { topic, failures } => {
                assert_eq!(topic, "saleInvoice.onDeleted");
                assert_eq!(failures.len(), 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert_eq!(registry.unsubscribe("failing"), 1);
        assert_eq!(registry.len(), 2);
        assert!(registry.publish(&event).await.is_ok());
    }

    #[tokio::test]
    async fn test_broadcast_publisher() {
        let publisher = BroadcastPublisher::new(8);
        let event = LifecycleEvent::created(&tenant(), document(DocumentKind::SaleReceipt));

        // No receivers yet.
        assert!(publisher.publish(&event).await.is_ok());

        let mut rx = publisher.subscribe();
        publisher.publish(&event).await.unwrap();
        let received = rx.recv().await.unwrap();
        assert_eq!(received.event_id, event.event_id);
    }

    #[tokio::test]
    async fn test_noop_publisher() {
        let event = LifecycleEvent::created(&tenant(), document(DocumentKind::Bill));
        assert!(NoopPublisher.publish(&event).await.is_ok());
    }
}
