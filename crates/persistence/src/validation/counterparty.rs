//! Counterparty checks: the contact must exist in the tenant with the right type.

use crate::core::CatalogStorage;
use crate::error::{LedgerResult, ResourceError};
use crate::tenant::TenantContext;
use crate::types::{Contact, DocumentKind};

/// Loads the counterparty of a document, checking it has the contact type the
/// kind requires (customers for sales documents, vendors for bills).
pub async fn ensure_counterparty(
    tenant: &TenantContext,
    catalog: &dyn CatalogStorage,
    kind: DocumentKind,
    id: i64,
) -> LedgerResult<Contact> {
    let contact_type = kind.counterparty_type();
    catalog
        .find_contact(tenant, id, contact_type)
        .await?
        .ok_or_else(|| ResourceError::CounterpartyNotFound { contact_type, id }.into())
}
