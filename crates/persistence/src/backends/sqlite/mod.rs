//! SQLite backend implementation.
//!
//! This module provides a complete SQLite implementation of all storage traits.
//! It supports both in-memory databases (great for testing) and file-based
//! databases (for development and small deployments).
//!
//! # Features
//!
//! - In-memory and file-based modes
//! - Tenant-scoped reads of documents, entries and catalog records
//! - Dynamic filters, keyword search, sorting and offset pagination
//! - Transaction support with ACID guarantees
//!
//! # Example
//!
//! ```no_run
//! use tally_persistence::backends::sqlite::SqliteBackend;
//! use tally_persistence::tenant::{TenantContext, TenantId, TenantPermissions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Create an in-memory database
//! let backend = SqliteBackend::in_memory()?;
//!
//! // Initialize the schema
//! backend.init_schema()?;
//!
//! // Create a tenant context
//! let tenant = TenantContext::new(
//!     TenantId::new("acme"),
//!     TenantPermissions::full_access(),
//! );
//! # Ok(())
//! # }
//! ```
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE documents (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     tenant_id TEXT NOT NULL,
//!     document_type TEXT NOT NULL,      -- sale_estimate, sale_invoice, ...
//!     document_number TEXT,             -- unique per (tenant_id, document_type)
//!     counterparty_id INTEGER NOT NULL,
//!     document_date TEXT NOT NULL,
//!     due_date TEXT,
//!     reference TEXT,
//!     note TEXT,
//!     amount TEXT NOT NULL,             -- decimal, stored as text
//!     status TEXT NOT NULL DEFAULT 'draft',
//!     published_at TEXT,
//!     created_at TEXT NOT NULL,
//!     updated_at TEXT NOT NULL
//! );
//!
//! CREATE TABLE item_entries (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     tenant_id TEXT NOT NULL,
//!     reference_type TEXT NOT NULL,     -- SaleEstimate, SaleInvoice, ...
//!     reference_id INTEGER NOT NULL,
//!     entry_index INTEGER NOT NULL,
//!     item_id INTEGER NOT NULL,
//!     ...
//! );
//! ```
//!
//! The in-memory pool holds a single connection. Never read through the
//! backend while a transaction from the same backend is open.

mod backend;
mod rows;
mod schema;
mod search;
mod storage;
mod transaction;

pub use backend::{SqliteBackend, SqliteBackendConfig};
pub use schema::SCHEMA_VERSION;
pub use transaction::SqliteTransaction;
