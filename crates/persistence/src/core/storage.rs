//! Core storage traits.
//!
//! This module defines the read-side storage traits. All operations take a
//! [`TenantContext`] as their first parameter and only ever see rows belonging
//! to that tenant. Writes to documents and entries go through a
//! [`Transaction`](super::Transaction) instead.

use async_trait::async_trait;

use crate::error::LedgerResult;
use crate::tenant::{TenantContext, TenantId};
use crate::types::{
    Contact, ContactType, Document, DocumentKind, Entry, EntryReference, Item, NewContact,
    NewItem, TenantRecord,
};

/// Tenant registry.
///
/// This is the only storage trait not scoped by a [`TenantContext`]: it is
/// how tenants come to exist in the first place.
#[async_trait]
pub trait TenantStorage: Send + Sync {
    /// Registers a tenant.
    ///
    /// # Errors
    ///
    /// * `ResourceError::TenantAlreadyExists` - If the id is taken
    /// * `TenantError::InvalidTenant` - If the id is malformed
    async fn register_tenant(&self, id: &TenantId, name: &str) -> LedgerResult<TenantRecord>;

    /// Looks up a tenant by id.
    async fn find_tenant(&self, id: &TenantId) -> LedgerResult<Option<TenantRecord>>;

    /// Lists all registered tenants ordered by id.
    async fn list_tenants(&self) -> LedgerResult<Vec<TenantRecord>>;
}

/// Items and contacts referenced by documents.
#[async_trait]
pub trait CatalogStorage: Send + Sync {
    /// Creates an item.
    async fn create_item(&self, tenant: &TenantContext, item: &NewItem) -> LedgerResult<Item>;

    /// Creates a customer or vendor.
    async fn create_contact(
        &self,
        tenant: &TenantContext,
        contact: &NewContact,
    ) -> LedgerResult<Contact>;

    /// Returns the items with the given ids that exist in the tenant.
    ///
    /// Missing ids are silently skipped; callers compare the result with the
    /// requested set.
    async fn find_items(&self, tenant: &TenantContext, ids: &[i64]) -> LedgerResult<Vec<Item>>;

    /// Looks up a contact of the given type.
    async fn find_contact(
        &self,
        tenant: &TenantContext,
        id: i64,
        contact_type: ContactType,
    ) -> LedgerResult<Option<Contact>>;

    /// Returns the contacts with the given ids that exist in the tenant.
    async fn find_contacts(
        &self,
        tenant: &TenantContext,
        ids: &[i64],
    ) -> LedgerResult<Vec<Contact>>;
}

/// Read access to documents and their entries.
#[async_trait]
pub trait DocumentStorage: Send + Sync {
    /// Returns a human-readable name for this storage backend.
    fn backend_name(&self) -> &'static str;

    /// Reads a document with its entries and counterparty.
    ///
    /// Returns `Ok(None)` if no document of the kind has the id in the tenant.
    async fn read_document(
        &self,
        tenant: &TenantContext,
        kind: DocumentKind,
        id: i64,
    ) -> LedgerResult<Option<Document>>;

    /// Reads the entries pointing back at a document, ordered by index.
    async fn read_entries(
        &self,
        tenant: &TenantContext,
        reference: &EntryReference,
    ) -> LedgerResult<Vec<Entry>>;

    /// Returns `true` if a document of the kind already uses the number,
    /// ignoring the document with id `exclude_id`.
    async fn number_exists(
        &self,
        tenant: &TenantContext,
        kind: DocumentKind,
        number: &str,
        exclude_id: Option<i64>,
    ) -> LedgerResult<bool>;

    /// Counts documents of the kind in the tenant.
    async fn count_documents(&self, tenant: &TenantContext, kind: DocumentKind)
    -> LedgerResult<u64>;
}
