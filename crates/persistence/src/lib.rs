//! Tally Ledger Document Lifecycle
//!
//! This crate manages the lifecycle of accounting documents (sale estimates,
//! sale invoices, sale receipts and purchase bills) on behalf of many tenants
//! sharing one store. Every operation is scoped to a resolved tenant, gated by
//! validation, executed in a single transaction and announced to subscribers
//! after it commits.
//!
//! # Features
//!
//! - **Tenant isolation**: every read and write carries a [`TenantContext`](tenant::TenantContext)
//! - **Validation gates**: payload, number uniqueness, counterparty, items and entry ids
//! - **Atomic writes**: a document and its entries change together or not at all
//! - **Dynamic listing**: field/comparator filters, keyword search, sorting and paging
//! - **Lifecycle events**: best-effort delivery after commit
//!
//! # Backend Features
//!
//! - `sqlite` (default) - SQLite with in-memory and file modes
//!
//! # Architecture
//!
//! - [`tenant`] - Tenant identity, permissions and resolution
//! - [`types`] - Documents, entries, catalog records, filters and pages
//! - [`error`] - Tagged errors with stable codes
//! - [`core`] - Storage and transaction traits
//! - [`validation`] - Payload, uniqueness and entry validators
//! - [`filter`] - Translation of list filters into typed queries
//! - [`events`] - Lifecycle events and publishers
//! - [`service`] - The per-kind document services
//! - [`backends`] - Backend implementations
//! - [`config`] - Ledger configuration
//!
//! # Multitenancy
//!
//! All storage operations require a [`TenantContext`](tenant::TenantContext).
//! Permissions are checked per operation and document kind.
//!
//! ```
//! use tally_persistence::tenant::{Operation, TenantContext, TenantId, TenantPermissions};
//! use tally_persistence::types::DocumentKind;
//!
//! let clerk = TenantContext::new(TenantId::new("acme"), TenantPermissions::full_access());
//! let auditor = TenantContext::new(TenantId::new("acme"), TenantPermissions::read_only());
//!
//! assert!(clerk.check_permission(Operation::Create, DocumentKind::SaleInvoice).is_ok());
//! assert!(auditor.check_permission(Operation::Create, DocumentKind::SaleInvoice).is_err());
//! assert!(auditor.check_permission(Operation::Read, DocumentKind::Bill).is_ok());
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! # #[cfg(feature = "sqlite")]
//! # async fn run() -> tally_persistence::LedgerResult<()> {
//! use std::sync::Arc;
//!
//! use rust_decimal::Decimal;
//! use tally_persistence::backends::sqlite::SqliteBackend;
//! use tally_persistence::core::TenantStorage;
//! use tally_persistence::events::NoopPublisher;
//! use tally_persistence::service::LedgerServices;
//! use tally_persistence::tenant::{RegisteredTenantResolver, TenantContext, TenantId, TenantPermissions};
//! use tally_persistence::types::{DocumentDto, EntryDto};
//! use tally_persistence::config::ListingConfig;
//!
//! let backend = Arc::new(SqliteBackend::in_memory()?);
//! backend.init_schema()?;
//! backend.register_tenant(&TenantId::new("acme"), "Acme Ltd").await?;
//!
//! let services = LedgerServices::new(
//!     Arc::new(RegisteredTenantResolver::new(backend)),
//!     Arc::new(NoopPublisher),
//!     &ListingConfig::default(),
//! );
//!
//! let tenant = TenantContext::new(TenantId::new("acme"), TenantPermissions::full_access());
//! let dto = DocumentDto::new("2024-03-01", 1, vec![EntryDto::new(1, Decimal::from(2), Decimal::from(50))])
//!     .with_number("INV-0001");
//! let invoice = services.invoices.create(&tenant, &dto).await?;
//! assert_eq!(invoice.amount, Decimal::from(100));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod config;
pub mod core;
pub mod error;
pub mod events;
pub mod filter;
pub mod service;
pub mod tenant;
pub mod types;
pub mod validation;

// Re-export commonly used types at crate root
pub use config::{LedgerConfig, ListingConfig};
pub use error::{ErrorCode, ErrorKind, LedgerError, LedgerResult};
pub use tenant::{TenantContext, TenantId, TenantPermissions};
pub use types::{Document, DocumentDto, DocumentKind, DocumentList, EntryDto, ListFilter};

// Re-export core traits
pub use core::{
    CatalogStorage, DocumentStorage, LedgerStore, SearchProvider, TenantStorage, Transaction,
    TransactionProvider,
};

pub use events::{EventPublisher, LifecycleEvent};
pub use service::{DocumentService, LedgerServices};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
