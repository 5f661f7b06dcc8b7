//! Document lifecycle services.
//!
//! A [`DocumentService`] owns the create, edit, delete, get, list and publish
//! operations for one [`DocumentKind`](crate::types::DocumentKind). Its
//! collaborators are injected at construction:
//!
//! - a [`TenantResolver`](crate::tenant::TenantResolver) that yields the
//!   tenant-scoped store
//! - an [`EntryValidator`](crate::validation::EntryValidator) and a
//!   [`UniquenessValidator`](crate::validation::UniquenessValidator)
//! - an [`EventPublisher`](crate::events::EventPublisher)
//!
//! [`LedgerServices`] wires one service per document kind over a shared
//! resolver and publisher.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tally_persistence::service::LedgerServices;
//! use tally_persistence::tenant::RegisteredTenantResolver;
//! use tally_persistence::events::NoopPublisher;
//!
//! let resolver = Arc::new(RegisteredTenantResolver::new(backend));
//! let services = LedgerServices::new(resolver, Arc::new(NoopPublisher), &listing);
//! let invoice = services.invoices.create(&tenant, &dto).await?;
//! ```

mod document;
mod ledger;

pub use document::DocumentService;
pub use ledger::LedgerServices;
