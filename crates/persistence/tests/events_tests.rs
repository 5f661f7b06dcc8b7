//! Lifecycle event delivery tests.

#![cfg(feature = "sqlite")]

mod common;

use std::sync::Arc;

use common::*;

use tally_persistence::config::ListingConfig;
use tally_persistence::events::{BroadcastPublisher, EventName};
use tally_persistence::service::DocumentService;
use tally_persistence::tenant::RegisteredTenantResolver;
use tally_persistence::types::{DocumentKind, DocumentStatus};

#[tokio::test]
async fn test_events_follow_committed_writes() {
    let ledger = TestLedger::new().await;
    let acme = tenant(ACME).with_correlation_id("req-1");
    let catalog = ledger.seed_catalog(&acme).await;

    let dto = document(catalog.customer, "EST-1", vec![entry(catalog.both, "1", "10")]);
    let created = ledger.services.estimates.create(&acme, &dto).await.unwrap();
    ledger
        .services
        .estimates
        .edit(&acme, created.id, &document(catalog.customer, "EST-1", vec![entry(catalog.both, "2", "10")]))
        .await
        .unwrap();
    ledger
        .services
        .estimates
        .publish(&acme, created.id)
        .await
        .unwrap();
    ledger
        .services
        .estimates
        .delete(&acme, created.id)
        .await
        .unwrap();

    assert_eq!(
        ledger.recorder.topics(),
        vec![
            "saleEstimate.onCreated",
            "saleEstimate.onEdited",
            "saleEstimate.onPublished",
            "saleEstimate.onDeleted",
        ]
    );

    let events = ledger.recorder.events();
    assert!(events.iter().all(|e| e.document_id == created.id));
    assert!(events.iter().all(|e| e.tenant_id.as_str() == ACME));
    assert!(
        events
            .iter()
            .all(|e| e.correlation_id.as_deref() == Some("req-1"))
    );

    let edited = &events[1];
    assert_eq!(edited.name, EventName::Edited);
    assert_eq!(edited.old_document.as_ref().map(|d| d.amount), Some(dec("10")));
    assert_eq!(edited.document.amount, dec("20"));

    let published = &events[2];
    assert_eq!(
        published.old_document.as_ref().map(|d| d.status),
        Some(DocumentStatus::Draft)
    );
    assert_eq!(published.document.status, DocumentStatus::Published);

    let deleted = &events[3];
    assert_eq!(deleted.document.entries.len(), 1);
}

#[tokio::test]
async fn test_failed_writes_raise_no_events() {
    let ledger = TestLedger::new().await;
    let acme = tenant(ACME);
    let catalog = ledger.seed_catalog(&acme).await;

    let dto = document(catalog.customer, "INV-1", vec![entry(catalog.sellable, "1", "1")]);
    ledger.services.invoices.create(&acme, &dto).await.unwrap();
    ledger.recorder.clear();

    assert!(ledger.services.invoices.create(&acme, &dto).await.is_err());
    assert!(ledger.services.invoices.delete(&acme, 9999).await.is_err());
    assert!(
        ledger
            .services
            .invoices
            .create(&read_only(ACME), &dto)
            .await
            .is_err()
    );

    assert!(ledger.recorder.events().is_empty());
}

#[tokio::test]
async fn test_failing_subscriber_does_not_fail_write() {
    let ledger = TestLedger::new().await;
    ledger.registry.subscribe(Arc::new(FailingSubscriber));
    let acme = tenant(ACME);
    let catalog = ledger.seed_catalog(&acme).await;

    let dto = document(catalog.vendor, "B-1", vec![entry(catalog.purchasable, "1", "1")]);
    let bill = ledger.services.bills.create(&acme, &dto).await.unwrap();

    // The write is committed and other subscribers still heard about it.
    assert!(ledger.services.bills.get(&acme, bill.id).await.is_ok());
    assert_eq!(ledger.recorder.topics(), vec!["bill.onCreated"]);
}

#[tokio::test]
async fn test_broadcast_publisher_receives_events() {
    let ledger = TestLedger::new().await;
    let acme = tenant(ACME);
    let catalog = ledger.seed_catalog(&acme).await;

    let publisher = Arc::new(BroadcastPublisher::new(16));
    let mut rx = publisher.subscribe();
    let receipts = DocumentService::with_default_validators(
        DocumentKind::SaleReceipt,
        Arc::new(RegisteredTenantResolver::new(Arc::clone(&ledger.backend))),
        publisher,
        ListingConfig::default(),
    );

    let receipt = receipts
        .create(
            &acme,
            &document(catalog.customer, "RC-1", vec![entry(catalog.sellable, "3", "3")]),
        )
        .await
        .unwrap();

    let event = rx.recv().await.unwrap();
    assert_eq!(event.topic(), "saleReceipt.onCreated");
    assert_eq!(event.document.id, receipt.id);
    assert_eq!(event.document.amount, dec("9"));
}
