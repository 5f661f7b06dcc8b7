//! Tenant management for multi-tenant ledger storage.
//!
//! This module provides the core types for multi-tenant support. All service and
//! storage operations require a [`TenantContext`] to ensure proper tenant isolation.
//!
//! # Core Types
//!
//! - [`TenantId`] - Opaque tenant identifier
//! - [`TenantContext`] - Caller context required for all operations
//! - [`TenantPermissions`] - Defines what operations a context can perform
//! - [`TenantResolver`] - Verifies a context and hands out a [`TenantScope`]
//!
//! # Isolation
//!
//! All tenants share one schema; every row carries a `tenant_id` column and every
//! query filters on it before any caller-supplied condition. There is no way to
//! issue a storage call without a tenant context.
//!
//! # Examples
//!
//! ```
//! use tally_persistence::tenant::{Operation, TenantContext, TenantId, TenantPermissions};
//! use tally_persistence::types::DocumentKind;
//!
//! let ctx = TenantContext::new(
//!     TenantId::new("acme-corp"),
//!     TenantPermissions::read_only(),
//! );
//!
//! assert!(ctx.check_permission(Operation::Search, DocumentKind::SaleInvoice).is_ok());
//! assert!(ctx.check_permission(Operation::Create, DocumentKind::SaleInvoice).is_err());
//! ```

mod context;
mod id;
mod permissions;
mod resolver;

pub use context::TenantContext;
pub use id::{MAX_TENANT_ID_LEN, TenantId};
pub use permissions::{Operation, TenantPermissions, TenantPermissionsBuilder};
pub use resolver::{RegisteredTenantResolver, TenantResolver, TenantScope};
