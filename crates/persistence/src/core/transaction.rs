//! Transaction traits for atomic document writes.
//!
//! Every multi-step write (a document plus its entries) runs inside one
//! [`Transaction`]. Nothing is visible to other callers until `commit()`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::LedgerResult;
use crate::tenant::TenantContext;
use crate::types::{Document, DocumentDraft, DocumentKind, DocumentStatus, EntryDraft, EntryReference};

use super::storage::DocumentStorage;

/// A database transaction.
///
/// This trait represents an active transaction that writes a document and its
/// entries atomically. Changes are only persisted when `commit()` is called; a
/// transaction dropped while still active is rolled back.
///
/// # Example
///
/// ```ignore
/// let mut tx = storage.begin_transaction(&tenant).await?;
/// let id = tx.insert_document(&draft).await?;
/// tx.insert_entries(&EntryReference::new(draft.kind, id), &entries).await?;
/// let created = tx.read_document(draft.kind, id).await?;
/// Box::new(tx).commit().await?;
/// ```
#[async_trait]
pub trait Transaction: Send + Sync {
    /// Inserts a document header and returns its id.
    async fn insert_document(&mut self, draft: &DocumentDraft) -> LedgerResult<i64>;

    /// Overwrites the header fields of an existing document.
    async fn update_document(&mut self, id: i64, draft: &DocumentDraft) -> LedgerResult<()>;

    /// Sets the status of an existing document.
    async fn set_status(
        &mut self,
        kind: DocumentKind,
        id: i64,
        status: DocumentStatus,
        published_at: Option<DateTime<Utc>>,
    ) -> LedgerResult<()>;

    /// Deletes a document header. Returns `false` if no row matched.
    ///
    /// Entries are not touched; delete them first with
    /// [`delete_all_entries`](Self::delete_all_entries).
    async fn delete_document(&mut self, kind: DocumentKind, id: i64) -> LedgerResult<bool>;

    /// Inserts entries for a document and returns their new ids in order.
    async fn insert_entries(
        &mut self,
        reference: &EntryReference,
        entries: &[EntryDraft],
    ) -> LedgerResult<Vec<i64>>;

    /// Updates an existing entry of a document in place.
    async fn update_entry(
        &mut self,
        reference: &EntryReference,
        entry_id: i64,
        entry: &EntryDraft,
    ) -> LedgerResult<()>;

    /// Deletes every entry of a document whose id is not in `keep`.
    /// Returns the number removed.
    async fn retain_entries(&mut self, reference: &EntryReference, keep: &[i64])
    -> LedgerResult<u64>;

    /// Deletes every entry of a document. Returns the number removed.
    async fn delete_all_entries(&mut self, reference: &EntryReference) -> LedgerResult<u64>;

    /// Reads a document within this transaction.
    ///
    /// This sees uncommitted changes made within this transaction.
    async fn read_document(
        &mut self,
        kind: DocumentKind,
        id: i64,
    ) -> LedgerResult<Option<Document>>;

    /// Commits the transaction, persisting all changes.
    ///
    /// After calling this, the transaction is consumed and cannot be used again.
    async fn commit(self: Box<Self>) -> LedgerResult<()>;

    /// Rolls back the transaction, discarding all changes.
    ///
    /// After calling this, the transaction is consumed and cannot be used again.
    async fn rollback(self: Box<Self>) -> LedgerResult<()>;

    /// Returns the tenant context for this transaction.
    fn tenant(&self) -> &TenantContext;

    /// Returns whether this transaction is still active.
    fn is_active(&self) -> bool;
}

/// Provider for transaction support.
#[async_trait]
pub trait TransactionProvider: DocumentStorage {
    /// The transaction type returned by this provider.
    type Transaction: Transaction + 'static;

    /// Begins a write transaction scoped to the tenant.
    ///
    /// The write lock is taken immediately, so writers queue at `begin`
    /// rather than failing at their first write.
    ///
    /// # Errors
    ///
    /// * `LedgerError::Transaction` - If the transaction cannot be started
    /// * `LedgerError::Backend` - If a connection cannot be acquired
    async fn begin_transaction(
        &self,
        tenant: &TenantContext,
    ) -> LedgerResult<Self::Transaction>;
}
