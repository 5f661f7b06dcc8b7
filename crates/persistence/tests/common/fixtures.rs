//! Ledger fixtures: backend, tenants, catalog and payload builders.

use std::sync::Arc;

use rust_decimal::Decimal;

use tally_persistence::backends::sqlite::SqliteBackend;
use tally_persistence::config::ListingConfig;
use tally_persistence::core::{CatalogStorage, TenantStorage};
use tally_persistence::events::SubscriberRegistry;
use tally_persistence::service::{DocumentService, LedgerServices};
use tally_persistence::tenant::{RegisteredTenantResolver, TenantContext, TenantId, TenantPermissions};
use tally_persistence::types::{DocumentDto, DocumentKind, EntryDto, NewContact, NewItem};

use super::subscribers::RecordingSubscriber;

/// The resolver type used by every test ledger.
pub type TestResolver = RegisteredTenantResolver<SqliteBackend>;

/// Primary tenant.
pub const ACME: &str = "acme";

/// Secondary tenant used for isolation checks.
pub const GLOBEX: &str = "globex";

/// Ids of the catalog rows seeded for one tenant.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    /// Sellable, not purchasable.
    pub sellable: i64,
    /// Purchasable, not sellable.
    pub purchasable: i64,
    /// Sellable and purchasable.
    pub both: i64,
    /// A customer contact.
    pub customer: i64,
    /// A vendor contact.
    pub vendor: i64,
}

impl Catalog {
    /// Returns the contact id matching the kind's counterparty type.
    pub fn counterparty(&self, kind: DocumentKind) -> i64 {
        match kind {
            DocumentKind::Bill => self.vendor,
            _ => self.customer,
        }
    }
}

/// An in-memory ledger with two registered tenants.
pub struct TestLedger {
    pub backend: Arc<SqliteBackend>,
    pub services: LedgerServices<TestResolver>,
    pub registry: Arc<SubscriberRegistry>,
    pub recorder: Arc<RecordingSubscriber>,
}

impl TestLedger {
    /// Builds an in-memory ledger with the default listing configuration.
    pub async fn new() -> Self {
        Self::with_listing(ListingConfig::default()).await
    }

    /// Builds an in-memory ledger with the given listing configuration.
    pub async fn with_listing(listing: ListingConfig) -> Self {
        let backend = SqliteBackend::in_memory().expect("Failed to create SQLite backend");
        backend.init_schema().expect("Failed to initialize schema");
        Self::from_backend(Arc::new(backend), listing).await
    }

    /// Wires services over an existing backend and registers both tenants.
    pub async fn from_backend(backend: Arc<SqliteBackend>, listing: ListingConfig) -> Self {
        for (id, name) in [(ACME, "Acme Ltd"), (GLOBEX, "Globex Corp")] {
            if backend.find_tenant(&TenantId::new(id)).await.unwrap().is_none() {
                backend
                    .register_tenant(&TenantId::new(id), name)
                    .await
                    .expect("Failed to register tenant");
            }
        }

        let recorder = Arc::new(RecordingSubscriber::default());
        let registry = Arc::new(SubscriberRegistry::new());
        registry.subscribe(recorder.clone());

        let services = LedgerServices::new(
            Arc::new(RegisteredTenantResolver::new(Arc::clone(&backend))),
            registry.clone(),
            &listing,
        );

        Self {
            backend,
            services,
            registry,
            recorder,
        }
    }

    /// Returns the service for a kind.
    pub fn service(&self, kind: DocumentKind) -> &DocumentService<TestResolver> {
        self.services.for_kind(kind)
    }

    /// Seeds three items and two contacts for the tenant.
    pub async fn seed_catalog(&self, tenant: &TenantContext) -> Catalog {
        let item = |name: &str, sellable: bool, purchasable: bool| {
            NewItem::new(name)
                .sellable(sellable)
                .purchasable(purchasable)
        };

        let sellable = self
            .backend
            .create_item(tenant, &item("Consulting hour", true, false))
            .await
            .unwrap();
        let purchasable = self
            .backend
            .create_item(tenant, &item("Office paper", false, true))
            .await
            .unwrap();
        let both = self
            .backend
            .create_item(tenant, &item("Laptop", true, true))
            .await
            .unwrap();
        let customer = self
            .backend
            .create_contact(tenant, &NewContact::customer("Wile E. Coyote"))
            .await
            .unwrap();
        let vendor = self
            .backend
            .create_contact(tenant, &NewContact::vendor("Road Supplies Inc"))
            .await
            .unwrap();

        Catalog {
            sellable: sellable.id,
            purchasable: purchasable.id,
            both: both.id,
            customer: customer.id,
            vendor: vendor.id,
        }
    }
}

/// A full-access context for the tenant.
pub fn tenant(id: &str) -> TenantContext {
    TenantContext::new(TenantId::new(id), TenantPermissions::full_access())
}

/// A read-only context for the tenant.
pub fn read_only(id: &str) -> TenantContext {
    TenantContext::new(TenantId::new(id), TenantPermissions::read_only())
}

/// Parses a decimal literal.
pub fn dec(value: &str) -> Decimal {
    value.parse().expect("invalid decimal literal")
}

/// An entry with no discount.
pub fn entry(item_id: i64, quantity: &str, rate: &str) -> EntryDto {
    EntryDto::new(item_id, dec(quantity), dec(rate))
}

/// A payload dated 2024-03-01 with the given number and entries.
pub fn document(counterparty_id: i64, number: &str, entries: Vec<EntryDto>) -> DocumentDto {
    DocumentDto::new("2024-03-01", counterparty_id, entries).with_number(number)
}
