//! Entry validation against the catalog and the parent document.

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::debug;

use crate::core::{CatalogStorage, DocumentStorage};
use crate::error::{LedgerResult, ReferenceError};
use crate::tenant::TenantContext;
use crate::types::{DocumentKind, EntryDraft, EntryReference, Item};

/// Validates the line items of a document.
#[async_trait]
pub trait EntryValidator: Send + Sync {
    /// Checks that every referenced item exists in the tenant and returns the
    /// items found.
    ///
    /// # Errors
    ///
    /// * `ReferenceError::ItemsNotFound` - listing every missing id
    async fn validate_items_exist(
        &self,
        tenant: &TenantContext,
        catalog: &dyn CatalogStorage,
        entries: &[EntryDraft],
    ) -> LedgerResult<Vec<Item>>;

    /// Checks that every item may be used on the document kind.
    ///
    /// # Errors
    ///
    /// * `ReferenceError::IneligibleItems` - listing every offending id
    fn validate_items_eligible(&self, kind: DocumentKind, items: &[Item]) -> LedgerResult<()>;

    /// Checks that every entry id claimed by an edit belongs to the document.
    ///
    /// # Errors
    ///
    /// * `ReferenceError::EntriesNotFound` - listing every foreign or missing id
    async fn validate_entry_ids(
        &self,
        tenant: &TenantContext,
        documents: &dyn DocumentStorage,
        reference: &EntryReference,
        entries: &[EntryDraft],
    ) -> LedgerResult<()>;
}

/// Entry validator backed by the catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogEntryValidator;

impl CatalogEntryValidator {
    /// Creates a validator.
    pub fn new() -> Self {
        Self
    }
}

fn distinct_item_ids(entries: &[EntryDraft]) -> Vec<i64> {
    let mut seen = HashSet::new();
    entries
        .iter()
        .map(|e| e.item_id)
        .filter(|id| seen.insert(*id))
        .collect()
}

#[async_trait]
impl EntryValidator for CatalogEntryValidator {
    async fn validate_items_exist(
        &self,
        tenant: &TenantContext,
        catalog: &dyn CatalogStorage,
        entries: &[EntryDraft],
    ) -> LedgerResult<Vec<Item>> {
        let ids = distinct_item_ids(entries);
        let items = catalog.find_items(tenant, &ids).await?;

        let found: HashSet<i64> = items.iter().map(|i| i.id).collect();
        let missing: Vec<i64> = ids.into_iter().filter(|id| !found.contains(id)).collect();
        if !missing.is_empty() {
            debug!(tenant = %tenant.tenant_id(), ?missing, "Entries reference unknown items");
            return Err(ReferenceError::ItemsNotFound { ids: missing }.into());
        }

        Ok(items)
    }

    fn validate_items_eligible(&self, kind: DocumentKind, items: &[Item]) -> LedgerResult<()> {
        let eligibility = kind.item_eligibility();
        let ids: Vec<i64> = items
            .iter()
            .filter(|item| !eligibility.permits(item))
            .map(|item| item.id)
            .collect();

        if ids.is_empty() {
            Ok(())
        } else {
            Err(ReferenceError::IneligibleItems {
                kind,
                eligibility,
                ids,
            }
            .into())
        }
    }

    async fn validate_entry_ids(
        &self,
        tenant: &TenantContext,
        documents: &dyn DocumentStorage,
        reference: &EntryReference,
        entries: &[EntryDraft],
    ) -> LedgerResult<()> {
        let claimed: Vec<i64> = entries.iter().filter_map(|e| e.id).collect();
        if claimed.is_empty() {
            return Ok(());
        }

        let owned: HashSet<i64> = documents
            .read_entries(tenant, reference)
            .await?
            .into_iter()
            .map(|e| e.id)
            .collect();

        let ids: Vec<i64> = claimed
            .into_iter()
            .filter(|id| !owned.contains(id))
            .collect();
        if ids.is_empty() {
            Ok(())
        } else {
            Err(ReferenceError::EntriesNotFound {
                kind: reference.kind,
                document_id: reference.document_id,
                ids,
            }
            .into())
        }
    }
}
