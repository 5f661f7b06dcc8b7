//! Dynamic list filter integration tests.
//!
//! These tests verify paging, sorting, keyword search and filter roles
//! against the SQLite backend.

#![cfg(feature = "sqlite")]

mod common;

use std::collections::HashSet;

use common::*;
use serde_json::json;

use tally_persistence::config::ListingConfig;
use tally_persistence::error::ErrorCode;
use tally_persistence::tenant::TenantContext;
use tally_persistence::types::{
    DocumentDto, FilterCondition, FilterRole, ListFilter, SortOrder,
};

/// Creates `count` invoices numbered `INV-001..` dated March 1st onwards with
/// amounts 1, 2, 3 and so on.
async fn seed_invoices(ledger: &TestLedger, tenant: &TenantContext, count: u32) -> Catalog {
    let catalog = ledger.seed_catalog(tenant).await;
    for i in 1..=count {
        let dto = DocumentDto::new(
            format!("2024-03-{:02}", i),
            catalog.customer,
            vec![entry(catalog.sellable, "1", &i.to_string())],
        )
        .with_number(format!("INV-{:03}", i))
        .with_reference(if i % 2 == 0 { "even" } else { "odd" });
        ledger.services.invoices.create(tenant, &dto).await.unwrap();
    }
    catalog
}

fn numbers(list: &tally_persistence::types::DocumentList) -> Vec<String> {
    list.results
        .iter()
        .map(|d| d.number.clone().unwrap_or_default())
        .collect()
}

// ============================================================================
// Paging and Sorting Tests
// ============================================================================

#[tokio::test]
async fn test_pages_partition_results() {
    let ledger = TestLedger::new().await;
    let acme = tenant(ACME);
    seed_invoices(&ledger, &acme, 25).await;

    let mut seen = HashSet::new();
    for page in 1..=3 {
        let filter = ListFilter::default()
            .with_sort("invoice_no", SortOrder::Asc)
            .with_page(page, 10);
        let list = ledger.services.invoices.list(&acme, &filter).await.unwrap();

        assert_eq!(list.pagination.page, page);
        assert_eq!(list.pagination.page_size, 10);
        assert_eq!(list.pagination.total, 25);
        assert_eq!(list.pagination.total_pages, 3);
        assert_eq!(list.results.len(), if page < 3 { 10 } else { 5 });

        for doc in &list.results {
            assert!(seen.insert(doc.id), "document {} listed twice", doc.id);
        }
    }
    assert_eq!(seen.len(), 25);

    let beyond = ListFilter::default().with_page(4, 10);
    let list = ledger.services.invoices.list(&acme, &beyond).await.unwrap();
    assert!(list.results.is_empty());
    assert_eq!(list.pagination.total, 25);
}

#[tokio::test]
async fn test_default_sort_is_date_descending() {
    let ledger = TestLedger::new().await;
    let acme = tenant(ACME);
    seed_invoices(&ledger, &acme, 3).await;

    let list = ledger
        .services
        .invoices
        .list(&acme, &ListFilter::default())
        .await
        .unwrap();

    assert_eq!(numbers(&list), vec!["INV-003", "INV-002", "INV-001"]);
    assert_eq!(list.filter_meta.sort_order, SortOrder::Desc);
}

#[tokio::test]
async fn test_sort_by_amount() {
    let ledger = TestLedger::new().await;
    let acme = tenant(ACME);
    seed_invoices(&ledger, &acme, 12).await;

    let filter = ListFilter::default()
        .with_sort("amount", SortOrder::Desc)
        .with_page(1, 3);
    let list = ledger.services.invoices.list(&acme, &filter).await.unwrap();

    // Numeric, not lexicographic, ordering.
    assert_eq!(numbers(&list), vec!["INV-012", "INV-011", "INV-010"]);
}

#[tokio::test]
async fn test_amounts_compare_exactly() {
    let ledger = TestLedger::new().await;
    let acme = tenant(ACME);
    let catalog = ledger.seed_catalog(&acme).await;

    // 2^53 + 1 and 2^53 are indistinguishable as f64.
    for (number, rate) in [("BIG-1", "9007199254740993"), ("BIG-2", "9007199254740992")] {
        let dto = document(catalog.customer, number, vec![entry(catalog.sellable, "1", rate)]);
        ledger.services.invoices.create(&acme, &dto).await.unwrap();
    }

    let equals = ListFilter::default().with_role(FilterRole::new(
        "amount",
        "equals",
        json!("9007199254740993"),
    ));
    let list = ledger.services.invoices.list(&acme, &equals).await.unwrap();
    assert_eq!(numbers(&list), vec!["BIG-1"]);

    let bigger = ListFilter::default().with_role(FilterRole::new(
        "amount",
        "bigger",
        json!(9007199254740992u64),
    ));
    let list = ledger.services.invoices.list(&acme, &bigger).await.unwrap();
    assert_eq!(numbers(&list), vec!["BIG-1"]);

    let sorted = ListFilter::default().with_sort("amount", SortOrder::Desc);
    let list = ledger.services.invoices.list(&acme, &sorted).await.unwrap();
    assert_eq!(numbers(&list), vec!["BIG-1", "BIG-2"]);

    let sorted = ListFilter::default().with_sort("amount", SortOrder::Asc);
    let list = ledger.services.invoices.list(&acme, &sorted).await.unwrap();
    assert_eq!(numbers(&list), vec!["BIG-2", "BIG-1"]);
}

#[tokio::test]
async fn test_page_size_is_clamped() {
    let listing = ListingConfig {
        default_page_size: 2,
        max_page_size: 4,
    };
    let ledger = TestLedger::with_listing(listing).await;
    let acme = tenant(ACME);
    seed_invoices(&ledger, &acme, 6).await;

    let list = ledger
        .services
        .invoices
        .list(&acme, &ListFilter::default())
        .await
        .unwrap();
    assert_eq!(list.results.len(), 2);

    let list = ledger
        .services
        .invoices
        .list(&acme, &ListFilter::default().with_page(1, 50))
        .await
        .unwrap();
    assert_eq!(list.pagination.page_size, 4);
    assert_eq!(list.results.len(), 4);
}

#[tokio::test]
async fn test_invalid_pagination_rejected() {
    let ledger = TestLedger::new().await;
    let acme = tenant(ACME);

    let err = ledger
        .services
        .invoices
        .list(&acme, &ListFilter::default().with_page(0, 10))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::ValidationError));

    let err = ledger
        .services
        .invoices
        .list(&acme, &ListFilter::default().with_page(1, 0))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::ValidationError));
}

// ============================================================================
// Filter Role Tests
// ============================================================================

#[tokio::test]
async fn test_number_and_date_roles() {
    let ledger = TestLedger::new().await;
    let acme = tenant(ACME);
    seed_invoices(&ledger, &acme, 10).await;

    let filter = ListFilter::default()
        .with_role(FilterRole::new("amount", "bigger", json!(6)))
        .with_role(FilterRole::new("invoice_date", "before", json!("2024-03-09")).with_index(1))
        .with_sort("invoice_no", SortOrder::Asc);
    let list = ledger.services.invoices.list(&acme, &filter).await.unwrap();

    assert_eq!(numbers(&list), vec!["INV-007", "INV-008"]);
    assert_eq!(list.filter_meta.filter_roles.len(), 2);
}

#[tokio::test]
async fn test_text_roles_and_keyword() {
    let ledger = TestLedger::new().await;
    let acme = tenant(ACME);
    seed_invoices(&ledger, &acme, 6).await;

    let filter = ListFilter::default()
        .with_role(FilterRole::new("reference", "equals", json!("even")))
        .with_sort("invoice_no", SortOrder::Asc);
    let list = ledger.services.invoices.list(&acme, &filter).await.unwrap();
    assert_eq!(numbers(&list), vec!["INV-002", "INV-004", "INV-006"]);

    let filter = ListFilter::default()
        .with_keyword("  inv-00  ")
        .with_role(FilterRole::new("invoice_no", "not_contain", json!("5")));
    let list = ledger.services.invoices.list(&acme, &filter).await.unwrap();
    assert_eq!(list.pagination.total, 5);
    assert_eq!(list.filter_meta.search_keyword.as_deref(), Some("inv-00"));
}

#[tokio::test]
async fn test_status_role() {
    let ledger = TestLedger::new().await;
    let acme = tenant(ACME);
    seed_invoices(&ledger, &acme, 4).await;

    let first = ledger
        .services
        .invoices
        .list(
            &acme,
            &ListFilter::default().with_sort("invoice_no", SortOrder::Asc),
        )
        .await
        .unwrap()
        .results[0]
        .id;
    ledger.services.invoices.publish(&acme, first).await.unwrap();

    let published = ListFilter::default()
        .with_role(FilterRole::new("status", "equals", json!("published")));
    let list = ledger.services.invoices.list(&acme, &published).await.unwrap();
    assert_eq!(list.results.len(), 1);
    assert_eq!(list.results[0].id, first);

    let drafts = ListFilter::default()
        .with_role(FilterRole::new("status", "not_equal", json!("published")));
    let list = ledger.services.invoices.list(&acme, &drafts).await.unwrap();
    assert_eq!(list.pagination.total, 3);
}

#[tokio::test]
async fn test_stringified_roles() {
    let ledger = TestLedger::new().await;
    let acme = tenant(ACME);
    seed_invoices(&ledger, &acme, 5).await;

    let filter = ListFilter {
        stringified_filter_roles: Some(
            r#"[{"field_key":"amount","comparator":"smaller_or_equal","value":2}]"#.to_string(),
        ),
        ..Default::default()
    };
    let list = ledger.services.invoices.list(&acme, &filter).await.unwrap();
    assert_eq!(list.pagination.total, 2);

    let broken = ListFilter {
        stringified_filter_roles: Some("[{".to_string()),
        ..Default::default()
    };
    let err = ledger
        .services
        .invoices
        .list(&acme, &broken)
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::ValidationError));
}

#[tokio::test]
async fn test_unknown_field_and_comparator_rejected() {
    let ledger = TestLedger::new().await;
    let acme = tenant(ACME);

    let unknown_field =
        ListFilter::default().with_role(FilterRole::new("tenant_id", "equals", json!("globex")));
    let err = ledger
        .services
        .invoices
        .list(&acme, &unknown_field)
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::ValidationError));

    let wrong_comparator =
        ListFilter::default().with_role(FilterRole::new("amount", "contain", json!("1")));
    let err = ledger
        .services
        .invoices
        .list(&acme, &wrong_comparator)
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::ValidationError));

    let unknown_sort = ListFilter::default().with_sort("tenant_id", SortOrder::Asc);
    let err = ledger
        .services
        .invoices
        .list(&acme, &unknown_sort)
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::ValidationError));
}

#[tokio::test]
async fn test_or_roles_stay_within_tenant() {
    let ledger = TestLedger::new().await;
    let acme = tenant(ACME);
    let globex = tenant(GLOBEX);
    seed_invoices(&ledger, &acme, 3).await;
    seed_invoices(&ledger, &globex, 3).await;

    let filter = ListFilter::default()
        .with_role(FilterRole::new("invoice_no", "equals", json!("INV-001")))
        .with_role(
            FilterRole::new("invoice_no", "not_empty", json!(null))
                .with_condition(FilterCondition::Or)
                .with_index(1),
        );
    let list = ledger.services.invoices.list(&acme, &filter).await.unwrap();

    assert_eq!(list.pagination.total, 3);
    let acme_ids: HashSet<i64> = list.results.iter().map(|d| d.id).collect();

    let globex_list = ledger
        .services
        .invoices
        .list(&globex, &filter)
        .await
        .unwrap();
    assert_eq!(globex_list.pagination.total, 3);
    assert!(globex_list.results.iter().all(|d| !acme_ids.contains(&d.id)));
}
