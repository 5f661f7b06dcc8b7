//! The per-kind document service.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::ListingConfig;
use crate::core::{DocumentStorage, SearchProvider, Transaction, TransactionProvider};
use crate::error::{LedgerResult, ResourceError};
use crate::events::{EventPublisher, LifecycleEvent};
use crate::filter::DynamicListFilter;
use crate::tenant::{Operation, TenantContext, TenantResolver, TenantScope};
use crate::types::{
    Document, DocumentDto, DocumentKind, DocumentList, DocumentStatus, EntryReference, ListFilter,
    PaginationMeta,
};
use crate::validation::{
    CatalogEntryValidator, EntryValidator, NumberUniquenessValidator, UniquenessValidator,
    ValidatedDocument, WriteMode, ensure_counterparty, validate_document,
};

/// Lifecycle operations for one document kind.
///
/// Every operation resolves the tenant first, then checks the caller's
/// permission, then runs the validation gates, and only then opens a
/// transaction. Events are published after commit and their failures are
/// logged, never returned.
pub struct DocumentService<R: TenantResolver> {
    kind: DocumentKind,
    resolver: Arc<R>,
    entry_validator: Arc<dyn EntryValidator>,
    uniqueness: Arc<dyn UniquenessValidator>,
    publisher: Arc<dyn EventPublisher>,
    filter: DynamicListFilter,
}

impl<R: TenantResolver> std::fmt::Debug for DocumentService<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentService")
            .field("kind", &self.kind)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

impl<R: TenantResolver> DocumentService<R> {
    /// Creates a service with explicit collaborators.
    pub fn new(
        kind: DocumentKind,
        resolver: Arc<R>,
        entry_validator: Arc<dyn EntryValidator>,
        uniqueness: Arc<dyn UniquenessValidator>,
        publisher: Arc<dyn EventPublisher>,
        listing: ListingConfig,
    ) -> Self {
        Self {
            kind,
            resolver,
            entry_validator,
            uniqueness,
            publisher,
            filter: DynamicListFilter::new(kind, listing),
        }
    }

    /// Creates a service with the catalog-backed validators.
    pub fn with_default_validators(
        kind: DocumentKind,
        resolver: Arc<R>,
        publisher: Arc<dyn EventPublisher>,
        listing: ListingConfig,
    ) -> Self {
        Self::new(
            kind,
            resolver,
            Arc::new(CatalogEntryValidator::new()),
            Arc::new(NumberUniquenessValidator::new()),
            publisher,
            listing,
        )
    }

    /// Returns the document kind this service manages.
    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// Returns the tenant resolver.
    pub fn resolver(&self) -> &Arc<R> {
        &self.resolver
    }

    /// Creates a document with its entries.
    ///
    /// # Errors
    ///
    /// Gate failures, in order: unknown tenant, permission, payload
    /// validation, duplicate number, missing counterparty, missing items,
    /// ineligible items. Storage failures propagate unchanged.
    pub async fn create(&self, tenant: &TenantContext, dto: &DocumentDto) -> LedgerResult<Document> {
        let scope = self.resolver.resolve(tenant).await?;
        let ctx = scope.context();
        ctx.check_permission(Operation::Create, self.kind)?;
        if dto.publish {
            ctx.check_permission(Operation::Publish, self.kind)?;
        }

        let validated = validate_document(self.kind, dto, WriteMode::Create)?;
        self.check_references(&scope, &validated, None).await?;

        let (status, published_at) = if validated.publish {
            (DocumentStatus::Published, Some(Utc::now()))
        } else {
            (DocumentStatus::Draft, None)
        };
        let draft = validated.draft(self.kind, status, published_at);

        let mut tx = scope.store().begin_transaction(ctx).await?;
        let outcome = async {
            let id = tx.insert_document(&draft).await?;
            tx.insert_entries(&EntryReference::new(self.kind, id), &validated.entries)
                .await?;
            self.reload(&mut tx, id).await
        }
        .await;
        let document = finish(tx, outcome).await?;

        info!(
            tenant = %ctx.tenant_id(),
            kind = %self.kind,
            id = document.id,
            entries = document.entries.len(),
            amount = %document.amount,
            "Created document"
        );

        self.notify(LifecycleEvent::created(ctx, document.clone()))
            .await;
        Ok(document)
    }

    /// Replaces a document and its entries.
    ///
    /// Entries whose ids are absent from the payload are deleted, entries with
    /// ids are updated in place and entries without ids are inserted, all in
    /// one transaction.
    pub async fn edit(
        &self,
        tenant: &TenantContext,
        id: i64,
        dto: &DocumentDto,
    ) -> LedgerResult<Document> {
        let scope = self.resolver.resolve(tenant).await?;
        let ctx = scope.context();
        ctx.check_permission(Operation::Update, self.kind)?;

        let existing = self.load(&scope, id).await?;
        if dto.publish && !existing.is_published() {
            ctx.check_permission(Operation::Publish, self.kind)?;
        }

        let validated = validate_document(self.kind, dto, WriteMode::Edit)?;
        self.check_references(&scope, &validated, Some(id)).await?;
        let reference = existing.entry_reference();
        self.entry_validator
            .validate_entry_ids(ctx, scope.store(), &reference, &validated.entries)
            .await?;

        let (status, published_at) = if existing.is_published() {
            (DocumentStatus::Published, existing.published_at)
        } else if validated.publish {
            (DocumentStatus::Published, Some(Utc::now()))
        } else {
            (DocumentStatus::Draft, None)
        };
        let draft = validated.draft(self.kind, status, published_at);

        let kept = validated.claimed_entry_ids();
        let (updates, inserts): (Vec<_>, Vec<_>) =
            validated.entries.iter().partition(|e| e.id.is_some());

        let mut tx = scope.store().begin_transaction(ctx).await?;
        let outcome = async {
            // Every unclaimed entry goes, including any added after `existing` was read.
            let removed = tx.retain_entries(&reference, &kept).await?;
            debug!(
                kind = %self.kind,
                id,
                removed,
                updated = updates.len(),
                inserted = inserts.len(),
                "Replacing document entries"
            );
            tx.update_document(id, &draft).await?;
            for entry in &updates {
                if let Some(entry_id) = entry.id {
                    tx.update_entry(&reference, entry_id, entry).await?;
                }
            }
            let inserts: Vec<_> = inserts.iter().map(|e| (*e).clone()).collect();
            tx.insert_entries(&reference, &inserts).await?;
            self.reload(&mut tx, id).await
        }
        .await;
        let document = finish(tx, outcome).await?;

        info!(
            tenant = %ctx.tenant_id(),
            kind = %self.kind,
            id,
            entries = document.entries.len(),
            amount = %document.amount,
            "Edited document"
        );

        self.notify(LifecycleEvent::edited(ctx, existing, document.clone()))
            .await;
        Ok(document)
    }

    /// Deletes a document after deleting its entries.
    ///
    /// Returns the document as it was before deletion.
    pub async fn delete(&self, tenant: &TenantContext, id: i64) -> LedgerResult<Document> {
        let scope = self.resolver.resolve(tenant).await?;
        let ctx = scope.context();
        ctx.check_permission(Operation::Delete, self.kind)?;

        let existing = self.load(&scope, id).await?;
        let reference = existing.entry_reference();

        let mut tx = scope.store().begin_transaction(ctx).await?;
        let outcome = async {
            let entries = tx.delete_all_entries(&reference).await?;
            if !tx.delete_document(self.kind, id).await? {
                return Err(self.not_found(id));
            }
            Ok(entries)
        }
        .await;
        let entries = finish(tx, outcome).await?;

        info!(
            tenant = %ctx.tenant_id(),
            kind = %self.kind,
            id,
            entries,
            "Deleted document"
        );

        self.notify(LifecycleEvent::deleted(ctx, existing.clone()))
            .await;
        Ok(existing)
    }

    /// Reads a document with its entries and counterparty.
    pub async fn get(&self, tenant: &TenantContext, id: i64) -> LedgerResult<Document> {
        let scope = self.resolver.resolve(tenant).await?;
        scope
            .context()
            .check_permission(Operation::Read, self.kind)?;
        self.load(&scope, id).await
    }

    /// Lists documents matching a filter, one page at a time.
    pub async fn list(&self, tenant: &TenantContext, filter: &ListFilter) -> LedgerResult<DocumentList> {
        let scope = self.resolver.resolve(tenant).await?;
        let ctx = scope.context();
        ctx.check_permission(Operation::Search, self.kind)?;

        let query = self.filter.build(filter)?;
        let page = scope.store().search_documents(ctx, &query).await?;

        debug!(
            tenant = %ctx.tenant_id(),
            kind = %self.kind,
            total = page.total,
            returned = page.documents.len(),
            "Listed documents"
        );

        Ok(DocumentList {
            results: page.documents,
            pagination: PaginationMeta::new(query.page, page.total),
            filter_meta: query.meta(),
        })
    }

    /// Marks a draft document as published.
    pub async fn publish(&self, tenant: &TenantContext, id: i64) -> LedgerResult<Document> {
        let scope = self.resolver.resolve(tenant).await?;
        let ctx = scope.context();
        ctx.check_permission(Operation::Publish, self.kind)?;

        let existing = self.load(&scope, id).await?;
        if existing.is_published() {
            return Err(ResourceError::AlreadyPublished {
                kind: self.kind,
                id,
            }
            .into());
        }

        let mut tx = scope.store().begin_transaction(ctx).await?;
        let outcome = async {
            tx.set_status(self.kind, id, DocumentStatus::Published, Some(Utc::now()))
                .await?;
            self.reload(&mut tx, id).await
        }
        .await;
        let document = finish(tx, outcome).await?;

        info!(
            tenant = %ctx.tenant_id(),
            kind = %self.kind,
            id,
            "Published document"
        );

        self.notify(LifecycleEvent::published(ctx, existing, document.clone()))
            .await;
        Ok(document)
    }

    /// Runs the storage-backed gates shared by create and edit.
    async fn check_references(
        &self,
        scope: &TenantScope<R::Store>,
        validated: &ValidatedDocument,
        exclude_id: Option<i64>,
    ) -> LedgerResult<()> {
        let ctx = scope.context();
        let store = scope.store();

        self.uniqueness
            .ensure_unique(
                ctx,
                store,
                self.kind,
                validated.number.as_deref(),
                exclude_id,
            )
            .await?;
        ensure_counterparty(ctx, store, self.kind, validated.counterparty_id).await?;

        let items = self
            .entry_validator
            .validate_items_exist(ctx, store, &validated.entries)
            .await?;
        self.entry_validator
            .validate_items_eligible(self.kind, &items)?;

        Ok(())
    }

    async fn load(&self, scope: &TenantScope<R::Store>, id: i64) -> LedgerResult<Document> {
        scope
            .store()
            .read_document(scope.context(), self.kind, id)
            .await?
            .ok_or_else(|| self.not_found(id))
    }

    async fn reload<T: Transaction>(&self, tx: &mut T, id: i64) -> LedgerResult<Document> {
        tx.read_document(self.kind, id)
            .await?
            .ok_or_else(|| self.not_found(id))
    }

    fn not_found(&self, id: i64) -> crate::error::LedgerError {
        ResourceError::DocumentNotFound {
            kind: self.kind,
            id,
        }
        .into()
    }

    async fn notify(&self, event: LifecycleEvent) {
        if let Err(e) = self.publisher.publish(&event).await {
            warn!(
                topic = %event.topic(),
                document_id = event.document_id,
                error = %e,
                "Failed to publish lifecycle event"
            );
        }
    }
}

/// Commits on success; rolls back and returns the original error otherwise.
async fn finish<T, Tx>(tx: Tx, outcome: LedgerResult<T>) -> LedgerResult<T>
where
    Tx: Transaction + 'static,
{
    match outcome {
        Ok(value) => {
            Box::new(tx).commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_error) = Box::new(tx).rollback().await {
                warn!(error = %rollback_error, "Failed to roll back transaction");
            }
            Err(e)
        }
    }
}
