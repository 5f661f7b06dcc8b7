//! Transaction support for SQLite backend.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter};

use crate::core::{Transaction, TransactionProvider};
use crate::error::{
    LedgerError, LedgerResult, ReferenceError, ResourceError, TransactionError,
};
use crate::tenant::TenantContext;
use crate::types::{
    Document, DocumentDraft, DocumentKind, DocumentStatus, EntryDraft, EntryReference,
};

use super::SqliteBackend;
use super::rows::{
    amount_key, format_date, format_timestamp, internal_error, load_document, placeholders,
};

fn inactive() -> LedgerError {
    LedgerError::Transaction(TransactionError::InvalidTransaction)
}

/// Maps a write failure, recognising the document number unique index.
fn write_error(err: rusqlite::Error, draft: &DocumentDraft, context: &str) -> LedgerError {
    if let rusqlite::Error::SqliteFailure(e, Some(msg)) = &err {
        if e.code == rusqlite::ErrorCode::ConstraintViolation
            && msg.contains("documents.document_number")
        {
            return ResourceError::DuplicateNumber {
                kind: draft.kind,
                number: draft.number.clone().unwrap_or_default(),
            }
            .into();
        }
    }
    internal_error(format!("{}: {}", context, err))
}

/// A SQLite transaction.
///
/// Holds one pooled connection for its whole lifetime. A transaction that is
/// dropped without `commit()` or `rollback()` is rolled back.
pub struct SqliteTransaction {
    /// The connection used for this transaction.
    conn: Arc<Mutex<PooledConnection<SqliteConnectionManager>>>,
    /// Whether the transaction is still active.
    active: bool,
    /// The tenant context for this transaction.
    tenant: TenantContext,
}

impl std::fmt::Debug for SqliteTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteTransaction")
            .field("active", &self.active)
            .field("tenant", &self.tenant)
            .finish()
    }
}

impl SqliteTransaction {
    fn new(
        conn: PooledConnection<SqliteConnectionManager>,
        tenant: TenantContext,
    ) -> LedgerResult<Self> {
        conn.execute("BEGIN IMMEDIATE", []).map_err(|e| {
            LedgerError::Transaction(TransactionError::RolledBack {
                reason: format!("Failed to begin transaction: {}", e),
            })
        })?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            active: true,
            tenant,
        })
    }

    fn ensure_active(&self) -> LedgerResult<()> {
        if self.active { Ok(()) } else { Err(inactive()) }
    }
}

#[async_trait]
impl Transaction for SqliteTransaction {
    async fn insert_document(&mut self, draft: &DocumentDraft) -> LedgerResult<i64> {
        self.ensure_active()?;

        let conn = self.conn.lock();
        let tenant_id = self.tenant.tenant_id().as_str();
        let now = format_timestamp(&Utc::now());

        conn.execute(
            "INSERT INTO documents (tenant_id, document_type, document_number, counterparty_id,
                document_date, due_date, reference, note, amount, amount_key, status,
                published_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)",
            params![
                tenant_id,
                draft.kind.as_str(),
                draft.number,
                draft.counterparty_id,
                format_date(&draft.date),
                draft.due_date.as_ref().map(format_date),
                draft.reference,
                draft.note,
                draft.amount.to_string(),
                amount_key(&draft.amount),
                draft.status.as_str(),
                draft.published_at.as_ref().map(format_timestamp),
                now,
            ],
        )
        .map_err(|e| write_error(e, draft, "Failed to insert document"))?;

        let id = conn.last_insert_rowid();
        tracing::debug!(tenant = %tenant_id, kind = %draft.kind, id, "Inserted document");
        Ok(id)
    }

    async fn update_document(&mut self, id: i64, draft: &DocumentDraft) -> LedgerResult<()> {
        self.ensure_active()?;

        let conn = self.conn.lock();
        let tenant_id = self.tenant.tenant_id().as_str();

        let updated = conn
            .execute(
                "UPDATE documents SET document_number = ?1, counterparty_id = ?2,
                    document_date = ?3, due_date = ?4, reference = ?5, note = ?6, amount = ?7,
                    amount_key = ?8, status = ?9, published_at = ?10, updated_at = ?11
                 WHERE tenant_id = ?12 AND document_type = ?13 AND id = ?14",
                params![
                    draft.number,
                    draft.counterparty_id,
                    format_date(&draft.date),
                    draft.due_date.as_ref().map(format_date),
                    draft.reference,
                    draft.note,
                    draft.amount.to_string(),
                    amount_key(&draft.amount),
                    draft.status.as_str(),
                    draft.published_at.as_ref().map(format_timestamp),
                    format_timestamp(&Utc::now()),
                    tenant_id,
                    draft.kind.as_str(),
                    id,
                ],
            )
            .map_err(|e| write_error(e, draft, "Failed to update document"))?;

        if updated == 0 {
            return Err(ResourceError::DocumentNotFound {
                kind: draft.kind,
                id,
            }
            .into());
        }

        Ok(())
    }

    async fn set_status(
        &mut self,
        kind: DocumentKind,
        id: i64,
        status: DocumentStatus,
        published_at: Option<DateTime<Utc>>,
    ) -> LedgerResult<()> {
        self.ensure_active()?;

        let conn = self.conn.lock();
        let updated = conn
            .execute(
                "UPDATE documents SET status = ?1, published_at = ?2, updated_at = ?3
                 WHERE tenant_id = ?4 AND document_type = ?5 AND id = ?6",
                params![
                    status.as_str(),
                    published_at.as_ref().map(format_timestamp),
                    format_timestamp(&Utc::now()),
                    self.tenant.tenant_id().as_str(),
                    kind.as_str(),
                    id,
                ],
            )
            .map_err(|e| internal_error(format!("Failed to update status: {}", e)))?;

        if updated == 0 {
            return Err(ResourceError::DocumentNotFound { kind, id }.into());
        }

        Ok(())
    }

    async fn delete_document(&mut self, kind: DocumentKind, id: i64) -> LedgerResult<bool> {
        self.ensure_active()?;

        let conn = self.conn.lock();
        let deleted = conn
            .execute(
                "DELETE FROM documents WHERE tenant_id = ?1 AND document_type = ?2 AND id = ?3",
                params![self.tenant.tenant_id().as_str(), kind.as_str(), id],
            )
            .map_err(|e| internal_error(format!("Failed to delete document: {}", e)))?;

        Ok(deleted > 0)
    }

    async fn insert_entries(
        &mut self,
        reference: &EntryReference,
        entries: &[EntryDraft],
    ) -> LedgerResult<Vec<i64>> {
        self.ensure_active()?;

        let conn = self.conn.lock();
        let tenant_id = self.tenant.tenant_id().as_str();
        let mut stmt = conn
            .prepare_cached(
                "INSERT INTO item_entries (tenant_id, reference_type, reference_id, entry_index,
                    item_id, description, quantity, rate, discount, amount)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )
            .map_err(|e| internal_error(format!("Failed to prepare entry insert: {}", e)))?;

        let mut ids = Vec::with_capacity(entries.len());
        for entry in entries {
            stmt.execute(params![
                tenant_id,
                reference.reference_type(),
                reference.document_id,
                entry.index,
                entry.item_id,
                entry.description,
                entry.quantity.to_string(),
                entry.rate.to_string(),
                entry.discount.to_string(),
                entry.amount.to_string(),
            ])
            .map_err(|e| internal_error(format!("Failed to insert entry: {}", e)))?;
            ids.push(conn.last_insert_rowid());
        }

        Ok(ids)
    }

    async fn update_entry(
        &mut self,
        reference: &EntryReference,
        entry_id: i64,
        entry: &EntryDraft,
    ) -> LedgerResult<()> {
        self.ensure_active()?;

        let conn = self.conn.lock();
        let updated = conn
            .execute(
                "UPDATE item_entries SET entry_index = ?1, item_id = ?2, description = ?3,
                    quantity = ?4, rate = ?5, discount = ?6, amount = ?7
                 WHERE tenant_id = ?8 AND reference_type = ?9 AND reference_id = ?10 AND id = ?11",
                params![
                    entry.index,
                    entry.item_id,
                    entry.description,
                    entry.quantity.to_string(),
                    entry.rate.to_string(),
                    entry.discount.to_string(),
                    entry.amount.to_string(),
                    self.tenant.tenant_id().as_str(),
                    reference.reference_type(),
                    reference.document_id,
                    entry_id,
                ],
            )
            .map_err(|e| internal_error(format!("Failed to update entry: {}", e)))?;

        if updated == 0 {
            return Err(ReferenceError::EntriesNotFound {
                kind: reference.kind,
                document_id: reference.document_id,
                ids: vec![entry_id],
            }
            .into());
        }

        Ok(())
    }

    async fn retain_entries(
        &mut self,
        reference: &EntryReference,
        keep: &[i64],
    ) -> LedgerResult<u64> {
        self.ensure_active()?;
        if keep.is_empty() {
            return self.delete_all_entries(reference).await;
        }

        let conn = self.conn.lock();
        let sql = format!(
            "DELETE FROM item_entries
             WHERE tenant_id = ? AND reference_type = ? AND reference_id = ? AND id NOT IN ({})",
            placeholders(keep.len())
        );

        let mut values = vec![
            Value::Text(self.tenant.tenant_id().as_str().to_string()),
            Value::Text(reference.reference_type().to_string()),
            Value::Integer(reference.document_id),
        ];
        values.extend(keep.iter().map(|id| Value::Integer(*id)));

        let deleted = conn
            .execute(&sql, params_from_iter(values))
            .map_err(|e| internal_error(format!("Failed to delete entries: {}", e)))?;

        Ok(deleted as u64)
    }

    async fn delete_all_entries(&mut self, reference: &EntryReference) -> LedgerResult<u64> {
        self.ensure_active()?;

        let conn = self.conn.lock();
        let deleted = conn
            .execute(
                "DELETE FROM item_entries
                 WHERE tenant_id = ?1 AND reference_type = ?2 AND reference_id = ?3",
                params![
                    self.tenant.tenant_id().as_str(),
                    reference.reference_type(),
                    reference.document_id,
                ],
            )
            .map_err(|e| internal_error(format!("Failed to delete entries: {}", e)))?;

        Ok(deleted as u64)
    }

    async fn read_document(
        &mut self,
        kind: DocumentKind,
        id: i64,
    ) -> LedgerResult<Option<Document>> {
        self.ensure_active()?;

        let conn = self.conn.lock();
        load_document(&conn, self.tenant.tenant_id().as_str(), kind, id)
    }

    async fn commit(mut self: Box<Self>) -> LedgerResult<()> {
        self.ensure_active()?;

        let conn = self.conn.lock();
        let result = conn.execute("COMMIT", []);
        if let Err(e) = result {
            // A failed COMMIT can leave the transaction open.
            let _ = conn.execute("ROLLBACK", []);
            drop(conn);
            self.active = false;
            return Err(LedgerError::Transaction(TransactionError::RolledBack {
                reason: format!("Commit failed: {}", e),
            }));
        }

        drop(conn);
        self.active = false;
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> LedgerResult<()> {
        self.ensure_active()?;

        let conn = self.conn.lock();
        let result = conn.execute("ROLLBACK", []);
        drop(conn);
        self.active = false;

        result.map(|_| ()).map_err(|e| {
            LedgerError::Transaction(TransactionError::RolledBack {
                reason: format!("Rollback failed: {}", e),
            })
        })
    }

    fn tenant(&self) -> &TenantContext {
        &self.tenant
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

impl Drop for SqliteTransaction {
    fn drop(&mut self) {
        if self.active {
            let conn = self.conn.lock();
            if let Err(e) = conn.execute("ROLLBACK", []) {
                tracing::warn!(error = %e, "Failed to roll back abandoned transaction");
            }
        }
    }
}

#[async_trait]
impl TransactionProvider for SqliteBackend {
    type Transaction = SqliteTransaction;

    async fn begin_transaction(
        &self,
        tenant: &TenantContext,
    ) -> LedgerResult<Self::Transaction> {
        let conn = self.get_connection()?;
        SqliteTransaction::new(conn, tenant.clone())
    }
}
