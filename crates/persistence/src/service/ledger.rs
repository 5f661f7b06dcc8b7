//! One service per document kind.

use std::sync::Arc;

use crate::config::ListingConfig;
use crate::events::EventPublisher;
use crate::tenant::TenantResolver;
use crate::types::DocumentKind;

use super::DocumentService;

/// The four document services sharing one resolver and publisher.
#[derive(Debug)]
pub struct LedgerServices<R: TenantResolver> {
    /// Sale estimates.
    pub estimates: DocumentService<R>,
    /// Sale invoices.
    pub invoices: DocumentService<R>,
    /// Sale receipts.
    pub receipts: DocumentService<R>,
    /// Purchase bills.
    pub bills: DocumentService<R>,
}

impl<R: TenantResolver> LedgerServices<R> {
    /// Builds every service with the default validators.
    pub fn new(
        resolver: Arc<R>,
        publisher: Arc<dyn EventPublisher>,
        listing: &ListingConfig,
    ) -> Self {
        let build = |kind| {
            DocumentService::with_default_validators(
                kind,
                Arc::clone(&resolver),
                Arc::clone(&publisher),
                *listing,
            )
        };

        Self {
            estimates: build(DocumentKind::SaleEstimate),
            invoices: build(DocumentKind::SaleInvoice),
            receipts: build(DocumentKind::SaleReceipt),
            bills: build(DocumentKind::Bill),
        }
    }

    /// Returns the service for a document kind.
    pub fn for_kind(&self, kind: DocumentKind) -> &DocumentService<R> {
        match kind {
            DocumentKind::SaleEstimate => &self.estimates,
            DocumentKind::SaleInvoice => &self.invoices,
            DocumentKind::SaleReceipt => &self.receipts,
            DocumentKind::Bill => &self.bills,
        }
    }
}
