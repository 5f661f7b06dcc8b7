//! Storage trait implementations for SQLite.

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{OptionalExtension, params};

use crate::core::{CatalogStorage, DocumentStorage, TenantStorage};
use crate::error::{LedgerResult, ResourceError, ValidationError};
use crate::tenant::{TenantContext, TenantId};
use crate::types::{
    Contact, ContactType, Document, DocumentKind, Entry, EntryReference, Item, NewContact,
    NewItem, TenantRecord,
};

use super::SqliteBackend;
use super::rows::{
    format_timestamp, internal_error, load_contact, load_contacts, load_document, load_entries,
    load_items, parse_timestamp,
};

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn require_non_blank(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingRequiredField {
            field: field.to_string(),
        });
    }
    Ok(())
}

#[async_trait]
impl TenantStorage for SqliteBackend {
    async fn register_tenant(&self, id: &TenantId, name: &str) -> LedgerResult<TenantRecord> {
        id.validate()?;
        require_non_blank("name", name)?;

        let conn = self.get_connection()?;
        let now = Utc::now();

        conn.execute(
            "INSERT INTO tenants (id, name, created_at) VALUES (?1, ?2, ?3)",
            params![id.as_str(), name.trim(), format_timestamp(&now)],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                ResourceError::TenantAlreadyExists {
                    tenant_id: id.clone(),
                }
                .into()
            } else {
                internal_error(format!("Failed to insert tenant: {}", e))
            }
        })?;

        tracing::info!(tenant = %id, "Registered tenant");

        Ok(TenantRecord {
            id: id.clone(),
            name: name.trim().to_string(),
            created_at: now,
        })
    }

    async fn find_tenant(&self, id: &TenantId) -> LedgerResult<Option<TenantRecord>> {
        let conn = self.get_connection()?;

        let row = conn
            .query_row(
                "SELECT name, created_at FROM tenants WHERE id = ?1",
                params![id.as_str()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()
            .map_err(|e| internal_error(format!("Failed to read tenant: {}", e)))?;

        match row {
            Some((name, created_at)) => Ok(Some(TenantRecord {
                id: id.clone(),
                name,
                created_at: parse_timestamp(&created_at, "created_at")?,
            })),
            None => Ok(None),
        }
    }

    async fn list_tenants(&self) -> LedgerResult<Vec<TenantRecord>> {
        let conn = self.get_connection()?;
        let mut stmt = conn
            .prepare("SELECT id, name, created_at FROM tenants ORDER BY id")
            .map_err(|e| internal_error(format!("Failed to prepare tenant query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(|e| internal_error(format!("Failed to query tenants: {}", e)))?;

        let mut tenants = Vec::new();
        for row in rows {
            let (id, name, created_at) =
                row.map_err(|e| internal_error(format!("Failed to read tenant row: {}", e)))?;
            tenants.push(TenantRecord {
                id: TenantId::new(id),
                name,
                created_at: parse_timestamp(&created_at, "created_at")?,
            });
        }
        Ok(tenants)
    }
}

#[async_trait]
impl CatalogStorage for SqliteBackend {
    async fn create_item(&self, tenant: &TenantContext, item: &NewItem) -> LedgerResult<Item> {
        require_non_blank("name", &item.name)?;

        let conn = self.get_connection()?;
        let tenant_id = tenant.tenant_id().as_str();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO items (tenant_id, name, sellable, purchasable, sell_price, cost_price, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                tenant_id,
                item.name.trim(),
                item.sellable,
                item.purchasable,
                item.sell_price.map(|p| p.to_string()),
                item.cost_price.map(|p| p.to_string()),
                format_timestamp(&now),
            ],
        )
        .map_err(|e| internal_error(format!("Failed to insert item: {}", e)))?;

        let id = conn.last_insert_rowid();
        tracing::debug!(tenant = %tenant_id, item_id = id, "Created item");

        Ok(Item {
            id,
            name: item.name.trim().to_string(),
            sellable: item.sellable,
            purchasable: item.purchasable,
            sell_price: item.sell_price,
            cost_price: item.cost_price,
            created_at: now,
        })
    }

    async fn create_contact(
        &self,
        tenant: &TenantContext,
        contact: &NewContact,
    ) -> LedgerResult<Contact> {
        require_non_blank("display_name", &contact.display_name)?;

        let conn = self.get_connection()?;
        let tenant_id = tenant.tenant_id().as_str();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO contacts (tenant_id, contact_type, display_name, email, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                tenant_id,
                contact.contact_type.as_str(),
                contact.display_name.trim(),
                contact.email,
                format_timestamp(&now),
            ],
        )
        .map_err(|e| internal_error(format!("Failed to insert contact: {}", e)))?;

        let id = conn.last_insert_rowid();
        tracing::debug!(
            tenant = %tenant_id,
            contact_id = id,
            contact_type = %contact.contact_type,
            "Created contact"
        );

        Ok(Contact {
            id,
            contact_type: contact.contact_type,
            display_name: contact.display_name.trim().to_string(),
            email: contact.email.clone(),
            created_at: now,
        })
    }

    async fn find_items(&self, tenant: &TenantContext, ids: &[i64]) -> LedgerResult<Vec<Item>> {
        let conn = self.get_connection()?;
        load_items(&conn, tenant.tenant_id().as_str(), ids)
    }

    async fn find_contact(
        &self,
        tenant: &TenantContext,
        id: i64,
        contact_type: ContactType,
    ) -> LedgerResult<Option<Contact>> {
        let conn = self.get_connection()?;
        load_contact(&conn, tenant.tenant_id().as_str(), id, Some(contact_type))
    }

    async fn find_contacts(
        &self,
        tenant: &TenantContext,
        ids: &[i64],
    ) -> LedgerResult<Vec<Contact>> {
        let conn = self.get_connection()?;
        load_contacts(&conn, tenant.tenant_id().as_str(), ids)
    }
}

#[async_trait]
impl DocumentStorage for SqliteBackend {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn read_document(
        &self,
        tenant: &TenantContext,
        kind: DocumentKind,
        id: i64,
    ) -> LedgerResult<Option<Document>> {
        let conn = self.get_connection()?;
        load_document(&conn, tenant.tenant_id().as_str(), kind, id)
    }

    async fn read_entries(
        &self,
        tenant: &TenantContext,
        reference: &EntryReference,
    ) -> LedgerResult<Vec<Entry>> {
        let conn = self.get_connection()?;
        load_entries(&conn, tenant.tenant_id().as_str(), reference)
    }

    async fn number_exists(
        &self,
        tenant: &TenantContext,
        kind: DocumentKind,
        number: &str,
        exclude_id: Option<i64>,
    ) -> LedgerResult<bool> {
        let conn = self.get_connection()?;

        let found: Option<i64> = conn
            .query_row(
                "SELECT id FROM documents
                 WHERE tenant_id = ?1 AND document_type = ?2 AND document_number = ?3
                   AND (?4 IS NULL OR id <> ?4)
                 LIMIT 1",
                params![tenant.tenant_id().as_str(), kind.as_str(), number, exclude_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| internal_error(format!("Failed to check document number: {}", e)))?;

        Ok(found.is_some())
    }

    async fn count_documents(
        &self,
        tenant: &TenantContext,
        kind: DocumentKind,
    ) -> LedgerResult<u64> {
        let conn = self.get_connection()?;

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM documents WHERE tenant_id = ?1 AND document_type = ?2",
                params![tenant.tenant_id().as_str(), kind.as_str()],
                |row| row.get(0),
            )
            .map_err(|e| internal_error(format!("Failed to count documents: {}", e)))?;

        Ok(count.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorCode, LedgerError};
    use crate::tenant::TenantPermissions;

    fn create_test_backend() -> SqliteBackend {
        let backend = SqliteBackend::in_memory().expect("Failed to create SQLite backend");
        backend.init_schema().expect("Failed to initialize schema");
        backend
    }

    async fn create_test_tenant(backend: &SqliteBackend, id: &str) -> TenantContext {
        backend
            .register_tenant(&TenantId::new(id), id)
            .await
            .expect("Failed to register tenant");
        TenantContext::new(TenantId::new(id), TenantPermissions::full_access())
    }

    #[tokio::test]
    async fn test_register_tenant_twice() {
        let backend = create_test_backend();
        backend
            .register_tenant(&TenantId::new("acme"), "Acme")
            .await
            .unwrap();

        let err = backend
            .register_tenant(&TenantId::new("acme"), "Acme again")
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::TenantAlreadyExists));

        let tenants = backend.list_tenants().await.unwrap();
        assert_eq!(tenants.len(), 1);
        assert_eq!(tenants[0].name, "Acme");
    }

    #[tokio::test]
    async fn test_register_tenant_rejects_blank_name() {
        let backend = create_test_backend();
        let err = backend
            .register_tenant(&TenantId::new("acme"), "  ")
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[tokio::test]
    async fn test_find_items_skips_missing_and_foreign() {
        let backend = create_test_backend();
        let acme = create_test_tenant(&backend, "acme").await;
        let globex = create_test_tenant(&backend, "globex").await;

        let desk = backend.create_item(&acme, &NewItem::new("Desk")).await.unwrap();
        let chair = backend
            .create_item(&globex, &NewItem::new("Chair"))
            .await
            .unwrap();

        let found = backend
            .find_items(&acme, &[desk.id, chair.id, 9999])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Desk");
    }

    #[tokio::test]
    async fn test_find_contact_checks_type() {
        let backend = create_test_backend();
        let acme = create_test_tenant(&backend, "acme").await;

        let vendor = backend
            .create_contact(&acme, &NewContact::vendor("Supplies Inc"))
            .await
            .unwrap();

        assert!(
            backend
                .find_contact(&acme, vendor.id, ContactType::Vendor)
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            backend
                .find_contact(&acme, vendor.id, ContactType::Customer)
                .await
                .unwrap()
                .is_none()
        );

        let contacts = backend.find_contacts(&acme, &[vendor.id]).await.unwrap();
        assert_eq!(contacts[0].display_name, "Supplies Inc");
    }

    #[tokio::test]
    async fn test_empty_catalog_queries() {
        let backend = create_test_backend();
        let acme = create_test_tenant(&backend, "acme").await;

        assert!(backend.find_items(&acme, &[]).await.unwrap().is_empty());
        assert_eq!(
            backend
                .count_documents(&acme, DocumentKind::Bill)
                .await
                .unwrap(),
            0
        );
        assert!(
            backend
                .read_document(&acme, DocumentKind::Bill, 1)
                .await
                .unwrap()
                .is_none()
        );
    }
}
