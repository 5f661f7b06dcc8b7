//! Core storage traits and abstractions.
//!
//! This module provides the foundational traits for the persistence layer:
//!
//! - [`Backend`] - Database driver lifecycle
//! - [`TenantStorage`] - Tenant registry
//! - [`CatalogStorage`] - Items and contacts
//! - [`DocumentStorage`] - Document and entry reads
//! - [`SearchProvider`] - Filtered, sorted, paginated listing
//! - [`Transaction`] - Atomic document writes
//!
//! # Trait Hierarchy
//!
//! ```text
//! DocumentStorage
//!     ├── SearchProvider
//!     └── TransactionProvider
//!
//! LedgerStore = TenantStorage + CatalogStorage + SearchProvider + TransactionProvider
//! ```
//!
//! Services are generic over [`LedgerStore`], which is implemented
//! automatically for every type that implements all of the storage traits.

mod backend;
mod search;
mod storage;
mod transaction;

pub use backend::{Backend, BackendCapability, BackendKind};
pub use search::SearchProvider;
pub use storage::{CatalogStorage, DocumentStorage, TenantStorage};
pub use transaction::{Transaction, TransactionProvider};

/// Every storage capability a document service needs.
pub trait LedgerStore:
    TenantStorage + CatalogStorage + SearchProvider + TransactionProvider + 'static
{
}

impl<T> LedgerStore for T where
    T: TenantStorage + CatalogStorage + SearchProvider + TransactionProvider + 'static
{
}
